pub(crate) mod dispatcher;
pub(crate) mod kernel_ref;
pub(crate) mod mailbox;
pub(crate) mod provider;
pub(crate) mod queue;

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, Weak};

use crate::{
    actor::actor_cell::{ActorCell, ExtendedCell},
    actor::*,
    kernel::{
        kernel_ref::{KernelRef, RunnableCell},
        mailbox::{mailbox, run_mailbox, Mailbox, MailboxSender, SysMailboxSender},
    },
    system::{ActorSystem, SystemMsg},
};

/// An actor's instance slot plus the pieces needed to (re)build it: the
/// `ExtendedCell` (identity, hierarchy, typed sender) and the `BoxActorProd`
/// the system replays on every restart. Lives inside a `CellRuntime`, which
/// is the thing a `Dispatcher` actually runs.
pub struct Dock<A: Actor> {
    pub actor: Mutex<Option<A>>,
    pub cell: ExtendedCell<A::Msg>,
    pub producer: BoxActorProd<A>,
}

struct CellRuntime<A: Actor> {
    dock: Dock<A>,
    mbox: Mailbox<A::Msg>,
    dispatcher_name: String,
}

impl<A: Actor> RunnableCell for CellRuntime<A> {
    fn run(self: Arc<Self>, throughput: u32) {
        let ctx = Context::new(
            self.dock.cell.myself(),
            self.dock.cell.system().clone(),
            self.dock.cell.kernel().clone(),
        );

        let _ = catch_unwind(AssertUnwindSafe(|| {
            run_mailbox(&self.mbox, ctx, &self.dock, throughput)
        }));
    }

    fn dispatcher_name(&self) -> &str {
        &self.dispatcher_name
    }
}

/// Build an actor's cell and hand it to a dispatcher. Constructs the actor
/// eagerly (inside a `catch_unwind`, as the stored `producer` will be
/// re-invoked on every restart) and binds the cell's `KernelRef` to a weak
/// handle on the runtime — the `Provider`'s registry is the sole strong
/// owner, so a terminated actor's runtime is freed once unregistered.
#[allow(clippy::too_many_arguments)]
pub fn start<A>(
    producer: BoxActorProd<A>,
    cell: ActorCellParts,
    dispatcher_name: &str,
    sys: &ActorSystem,
) -> Result<(ActorRef<A::Msg>, Arc<dyn RunnableCell>), CreateError>
where
    A: Actor + 'static,
{
    let (mbox_sender, sys_sender, mbox) = mailbox::<A::Msg>(sys.config().mailbox.user_queue_size);

    let actor_cell = ActorCell::new(
        cell.uri,
        cell.parent,
        cell.is_user,
        Arc::new(mbox_sender.clone()),
        sys_sender,
        sys.clone(),
    );

    let actor = catch_unwind(AssertUnwindSafe(|| producer.produce())).map_err(|_| CreateError::Panicked)?;

    let extended = ExtendedCell::new(actor_cell.clone(), mbox_sender);
    let actor_ref = ActorRef::new(extended.clone());

    let dock = Dock {
        actor: Mutex::new(Some(actor)),
        cell: extended,
        producer,
    };

    let runtime: Arc<CellRuntime<A>> = Arc::new(CellRuntime {
        dock,
        mbox,
        dispatcher_name: dispatcher_name.to_string(),
    });

    let weak: Weak<dyn RunnableCell> = Arc::downgrade(&runtime) as Weak<dyn RunnableCell>;
    actor_cell.bind_kernel(KernelRef::new(weak));

    Ok((actor_ref, runtime))
}

/// The pieces needed to place a new cell in the hierarchy, factored out of
/// `start`'s signature since `uri`/`parent`/`is_user` are computed by the
/// caller (`Provider::create_actor`, or the bootstrap in `provider::root`).
pub struct ActorCellParts {
    pub uri: ActorUri,
    pub parent: Option<BasicActorRef>,
    pub is_user: bool,
}
