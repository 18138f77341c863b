use std::sync::Arc;

use dashmap::DashMap;
use slog::{trace, Logger};

use crate::{
    actor::*,
    kernel::{kernel_ref::RunnableCell, start, ActorCellParts},
    system::{ActorSystem, SysActors, SystemMsg},
    validate::validate_name,
};

/// Creates actor cells and owns the registry of live ones. The registry's
/// `Arc<dyn RunnableCell>` is the sole *strong* owner of a cell's runtime —
/// `ActorCell`'s own `KernelRef` only holds a `Weak` to it, so unregistering
/// a terminated actor here is what actually frees its state.
#[derive(Clone)]
pub struct Provider {
    inner: Arc<ProviderInner>,
    log: Logger,
}

struct ProviderInner {
    cells: DashMap<ActorPath, Arc<dyn RunnableCell>>,
    id_gen: AtomicActorId,
}

impl Provider {
    pub fn new(log: Logger) -> Self {
        Provider {
            inner: Arc::new(ProviderInner {
                cells: DashMap::new(),
                id_gen: AtomicActorId::new(),
            }),
            log,
        }
    }

    pub fn create_actor<A>(
        &self,
        props: BoxActorProd<A>,
        name: &str,
        parent: &BasicActorRef,
        sys: &ActorSystem,
    ) -> Result<ActorRef<A::Msg>, CreateError>
    where
        A: Actor + 'static,
    {
        validate_name(name)?;

        let path = ActorPath::new(&format!("{}/{}", parent.path(), name));
        trace!(self.log, "Attempting to create actor at: {}", path);

        self.reserve(&path)?;

        let uri = ActorUri {
            uid: self.inner.id_gen.next(),
            name: Arc::new(name.to_string()),
            path: path.clone(),
            host: sys.host(),
        };

        let parts = ActorCellParts {
            uri,
            parent: Some(parent.clone()),
            is_user: parent.path().as_str().starts_with("/user"),
        };

        let (actor_ref, runtime) = start(props, parts, "default", sys)?;
        self.register(path, runtime);

        let child = BasicActorRef::from(actor_ref.clone());
        parent.cell.add_child(name.to_string(), child)?;
        actor_ref.sys_tell(SystemMsg::ActorInit);

        Ok(actor_ref)
    }

    fn reserve(&self, path: &ActorPath) -> Result<(), CreateError> {
        if self.inner.cells.contains_key(path) {
            Err(CreateError::AlreadyExists(path.clone()))
        } else {
            Ok(())
        }
    }

    pub(crate) fn next_id(&self) -> ActorId {
        self.inner.id_gen.next()
    }

    pub(crate) fn register(&self, path: ActorPath, runtime: Arc<dyn RunnableCell>) {
        self.inner.cells.insert(path, runtime);
    }

    pub fn is_registered(&self, path: &ActorPath) -> bool {
        self.inner.cells.contains_key(path)
    }

    pub fn unregister(&self, path: ActorPath) {
        self.inner.cells.remove(&path);
    }
}

/// Bootstraps `/root`, `/user`, `/system` and `/temp`. `/root` is its own
/// parent (the "big bang" cell): every actor needs one, including the root.
pub fn create_root(sys: &ActorSystem) -> SysActors {
    let root = root(sys);

    SysActors {
        user: guardian("user", &root, sys),
        sysm: guardian("system", &root, sys),
        temp: guardian("temp", &root, sys),
        root,
    }
}

fn root(sys: &ActorSystem) -> BasicActorRef {
    let path = ActorPath::new("/");
    let uri = ActorUri {
        uid: sys.provider().next_id(),
        name: Arc::new("root".to_string()),
        path: path.clone(),
        host: sys.host(),
    };

    let props: BoxActorProd<Guardian> = Props::new_args::<Guardian>(("root".to_string(), sys.log()));
    let parts = ActorCellParts {
        uri,
        parent: None,
        is_user: false,
    };

    let (actor_ref, runtime) = start(props, parts, "system", sys).expect("root guardian must start");
    sys.provider().register(path, runtime);
    BasicActorRef::from(actor_ref)
}

fn guardian(name: &str, root: &BasicActorRef, sys: &ActorSystem) -> BasicActorRef {
    let path = ActorPath::new(&format!("/{}", name));
    let uri = ActorUri {
        uid: sys.provider().next_id(),
        name: Arc::new(name.to_string()),
        path: path.clone(),
        host: sys.host(),
    };

    let props: BoxActorProd<Guardian> = Props::new_args::<Guardian>((name.to_string(), sys.log()));
    let parts = ActorCellParts {
        uri,
        parent: Some(root.clone()),
        is_user: name == "user",
    };

    let (actor_ref, runtime) = start(props, parts, "system", sys).expect("guardian must start");
    sys.provider().register(path, runtime);

    let actor = BasicActorRef::from(actor_ref);
    let _ = root.cell.add_child(name.to_string(), actor.clone());
    actor
}

struct Guardian {
    name: String,
    log: Logger,
}

impl ActorFactoryArgs for Guardian {
    type Args = (String, Logger);

    fn create_args((name, log): (String, Logger)) -> Self {
        Guardian { name, log }
    }
}

impl Actor for Guardian {
    type Msg = SystemMsg;

    fn recv(&mut self, _ctx: &Context<Self::Msg>, _msg: Self::Msg, _sender: Sender) {}

    fn post_stop(&mut self) {
        trace!(self.log, "{} guardian stopped", self.name);
    }
}
