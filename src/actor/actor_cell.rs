use std::collections::{HashMap, VecDeque};
use std::ops::Deref;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, RwLock};
use std::time::{Duration, Instant};

use crate::{
    actor::{
        ActorFactory, ActorFactoryArgs, ActorRef, ActorRefFactory, ActorReference,
        ActorSelection, ActorSelectionFactory, ActorUri, BasicActorRef, BoxActorProd,
        CreateError, Directive, Failure, MsgResult, Props, Sender, Strategy, StrategyKind,
        TmpActorRefFactory,
    },
    kernel::{
        kernel_ref::{dispatch, KernelRef},
        mailbox::{AnySender, MailboxSender, SysMailboxSender},
    },
    system::{ActorSystem, SystemMsg},
    validate::InvalidPath,
    AnyMessage, Envelope, Message,
};

/// The untyped, shared core of every actor's handle: identity, hierarchy,
/// the dispatcher hook, and type-erased sends. `ActorRef<Msg>`/`BasicActorRef`
/// are thin, cheaply-cloned wrappers around this (and `ExtendedCell<Msg>`).
#[derive(Clone)]
pub struct ActorCell {
    inner: Arc<Inner>,
}

struct Inner {
    uri: ActorUri,
    parent: Option<BasicActorRef>,
    is_user: bool,
    children: RwLock<HashMap<String, BasicActorRef>>,
    kernel: OnceLock<KernelRef>,
    any_sender: Arc<dyn AnySender>,
    sys_sender: SysMailboxSender<SystemMsg>,
    system: ActorSystem,
    restart_stats: std::sync::Mutex<HashMap<String, VecDeque<Instant>>>,
    // DeathWatch: who is watching this cell (§3 ActorCell.watchers). Plain
    // `Vec` + `PartialEq` rather than a hash set since `BasicActorRef` has
    // no `Hash` impl; watch/unwatch stay idempotent by checking membership
    // before inserting/removing.
    watchers: RwLock<Vec<BasicActorRef>>,
    terminated: AtomicBool,
}

impl ActorCell {
    pub(crate) fn new(
        uri: ActorUri,
        parent: Option<BasicActorRef>,
        is_user: bool,
        any_sender: Arc<dyn AnySender>,
        sys_sender: SysMailboxSender<SystemMsg>,
        system: ActorSystem,
    ) -> ActorCell {
        ActorCell {
            inner: Arc::new(Inner {
                uri,
                parent,
                is_user,
                children: RwLock::new(HashMap::new()),
                kernel: OnceLock::new(),
                any_sender,
                sys_sender,
                system,
                restart_stats: std::sync::Mutex::new(HashMap::new()),
                watchers: RwLock::new(Vec::new()),
                terminated: AtomicBool::new(false),
            }),
        }
    }

    pub(crate) fn bind_kernel(&self, kernel: KernelRef) {
        let _ = self.inner.kernel.set(kernel);
    }

    pub fn uri(&self) -> &ActorUri {
        &self.inner.uri
    }

    pub fn is_root(&self) -> bool {
        self.inner.parent.is_none()
    }

    pub fn is_user(&self) -> bool {
        self.inner.is_user
    }

    pub fn parent(&self) -> BasicActorRef {
        self.inner
            .parent
            .clone()
            .unwrap_or_else(|| self.myself_basic())
    }

    pub fn user_root(&self) -> BasicActorRef {
        self.inner.system.user_root().clone()
    }

    pub fn has_children(&self) -> bool {
        !self.inner.children.read().unwrap().is_empty()
    }

    pub fn is_child(&self, actor: &BasicActorRef) -> bool {
        self.inner
            .children
            .read()
            .unwrap()
            .values()
            .any(|c| c == actor)
    }

    pub fn children(&self) -> Box<dyn Iterator<Item = BasicActorRef>> {
        let snapshot: Vec<BasicActorRef> =
            self.inner.children.read().unwrap().values().cloned().collect();
        Box::new(snapshot.into_iter())
    }

    pub(crate) fn kernel(&self) -> &KernelRef {
        self.inner
            .kernel
            .get()
            .expect("actor cell's kernel is bound before any message can reach it")
    }

    pub(crate) fn system(&self) -> &ActorSystem {
        &self.inner.system
    }

    pub fn myself_basic(&self) -> BasicActorRef {
        BasicActorRef::new(self.clone())
    }

    pub(crate) fn add_child(&self, name: String, child: BasicActorRef) -> Result<(), CreateError> {
        let mut children = self.inner.children.write().unwrap();
        if children.contains_key(&name) {
            return Err(CreateError::AlreadyExists(child.path().clone()));
        }
        children.insert(name, child);
        Ok(())
    }

    pub(crate) fn remove_child(&self, name: &str) {
        self.inner.children.write().unwrap().remove(name);
    }

    pub fn send_any_msg(&self, msg: &mut AnyMessage, sender: Sender) -> Result<(), ()> {
        use crate::kernel::mailbox::AnyEnqueueError;

        match crate::kernel::kernel_ref::dispatch_any(
            msg,
            sender.clone(),
            &self.inner.any_sender,
            self.kernel(),
            &self.inner.system,
        ) {
            Ok(()) => Ok(()),
            Err(AnyEnqueueError::Downcast) => Err(()),
            Err(AnyEnqueueError::Rejected { reason, description }) => {
                crate::kernel::mailbox::reject_to_deadletter(
                    &self.inner.system,
                    self.myself_basic(),
                    sender,
                    description,
                    reason,
                );
                Err(())
            }
        }
    }

    pub fn send_sys_msg(&self, envelope: Envelope<SystemMsg>) -> Result<(), ()> {
        self.inner.sys_sender.enqueue(envelope);
        self.kernel().schedule(&self.inner.system);
        Ok(())
    }

    fn exceeded_retries(&self, key: &str, max_retries: u32, within: Duration) -> bool {
        let mut stats = self.inner.restart_stats.lock().unwrap();
        let times = stats.entry(key.to_string()).or_default();
        let now = Instant::now();
        times.push_back(now);
        while let Some(&front) = times.front() {
            if now.duration_since(front) > within {
                times.pop_front();
            } else {
                break;
            }
        }
        times.len() as u32 > max_retries
    }

    /// Apply a supervisor's decision to a failed child. Invoked on the
    /// *parent* cell, which is who receives `SystemMsg::Failed`.
    pub fn handle_failure(&self, failed: BasicActorRef, strategy: Strategy) {
        let failure = Failure {
            child: failed.path().clone(),
            cause: "actor panicked".to_string(),
        };
        let mut directive = (strategy.decider)(&failure);

        let key = match strategy.kind {
            StrategyKind::OneForOne => failed.path().as_str().to_string(),
            StrategyKind::AllForOne => "*".to_string(),
        };
        if self.exceeded_retries(&key, strategy.max_retries, strategy.within) {
            directive = Directive::Stop;
        }

        let targets: Vec<BasicActorRef> = match strategy.kind {
            StrategyKind::OneForOne => vec![failed],
            StrategyKind::AllForOne => self.children().collect(),
        };

        for target in targets {
            match directive {
                Directive::Resume => target.sys_tell(SystemMsg::Resume),
                Directive::Restart => target.sys_tell(SystemMsg::Restart),
                Directive::Stop => target.sys_tell(SystemMsg::Terminate),
                Directive::Escalate => self.parent().sys_tell(SystemMsg::Failed(self.myself_basic())),
            }
        }
    }

    /// Register `watcher` against this cell. Returns `true` if this cell
    /// has already terminated, in which case the caller must deliver
    /// `Terminated` immediately rather than registering (§7: a watcher
    /// subscribing after the stop still gets notified).
    pub(crate) fn add_watcher(&self, watcher: BasicActorRef) -> bool {
        if self.inner.terminated.load(Ordering::Acquire) {
            return true;
        }
        let mut watchers = self.inner.watchers.write().unwrap();
        if !watchers.iter().any(|w| w == &watcher) {
            watchers.push(watcher);
        }
        false
    }

    pub(crate) fn remove_watcher(&self, watcher: &BasicActorRef) {
        self.inner.watchers.write().unwrap().retain(|w| w != watcher);
    }

    /// Deliver `Terminated(self)` to every current watcher, exactly once,
    /// and mark the cell terminated so any watch registered afterwards is
    /// answered immediately instead of silently missing the notification.
    pub(crate) fn notify_watchers_terminated(&self) {
        self.inner.terminated.store(true, Ordering::Release);
        let watchers: Vec<BasicActorRef> = self.inner.watchers.write().unwrap().drain(..).collect();
        let me = self.myself_basic();
        for watcher in watchers {
            watcher.sys_tell(SystemMsg::Terminated(me.clone()));
        }
    }
}

impl PartialEq for ActorCell {
    fn eq(&self, other: &ActorCell) -> bool {
        self.uri().path == other.uri().path
    }
}

/// The typed half of an actor's cell: an `ActorCell` plus the bounded
/// mailbox sender for its concrete `Msg` type.
#[derive(Clone)]
pub struct ExtendedCell<Msg: Message> {
    cell: ActorCell,
    mailbox_sender: MailboxSender<Msg>,
}

impl<Msg: Message> ExtendedCell<Msg> {
    pub(crate) fn new(cell: ActorCell, mailbox_sender: MailboxSender<Msg>) -> ExtendedCell<Msg> {
        ExtendedCell { cell, mailbox_sender }
    }

    pub fn myself(&self) -> ActorRef<Msg> {
        ActorRef::new(self.clone())
    }

    pub fn send_msg(&self, envelope: Envelope<Msg>) -> MsgResult<Envelope<Msg>> {
        dispatch(envelope, &self.mailbox_sender, self.cell.kernel(), self.cell.system())
    }

    pub(crate) fn close_mailbox(&self) {
        self.mailbox_sender.close();
    }
}

impl<Msg: Message> Deref for ExtendedCell<Msg> {
    type Target = ActorCell;

    fn deref(&self) -> &ActorCell {
        &self.cell
    }
}

impl<Msg: Message> From<ExtendedCell<Msg>> for ActorCell {
    fn from(e: ExtendedCell<Msg>) -> ActorCell {
        e.cell
    }
}

/// Per-actor execution context: identity, a handle to the owning system,
/// and the dispatcher hook, handed to every `Actor` callback.
pub struct Context<Msg: Message> {
    myself: ActorRef<Msg>,
    pub system: ActorSystem,
    pub(crate) kernel: KernelRef,
}

impl<Msg: Message> Context<Msg> {
    pub(crate) fn new(myself: ActorRef<Msg>, system: ActorSystem, kernel: KernelRef) -> Context<Msg> {
        Context { myself, system, kernel }
    }

    pub fn myself(&self) -> &ActorRef<Msg> {
        &self.myself
    }

    /// Watch `actor`: delivered to `sys_recv` as `SystemMsg::Terminated(actor)`
    /// exactly once, when `actor` stops. Registration lives on `actor`'s own
    /// cell (§3 ActorCell.watchers), so only genuine watchers of `actor` are
    /// notified — not every watcher of every actor. If `actor` has already
    /// terminated, the notification is delivered immediately instead of
    /// being silently missed.
    pub fn watch(&self, actor: &BasicActorRef) {
        let watcher = BasicActorRef::from(self.myself.clone());
        if actor.cell.add_watcher(watcher.clone()) {
            watcher.sys_tell(SystemMsg::Terminated(actor.clone()));
        }
    }

    /// Set-operation unwatch: `watch(r); unwatch(r); watch(r)` leaves the
    /// same registration as a single `watch(r)`.
    pub fn unwatch(&self, actor: &BasicActorRef) {
        let watcher = BasicActorRef::from(self.myself.clone());
        actor.cell.remove_watcher(&watcher);
    }
}

impl<Msg: Message> ActorRefFactory for Context<Msg> {
    fn actor_of_props<A>(&self, props: BoxActorProd<A>, name: &str) -> Result<ActorRef<A::Msg>, CreateError>
    where
        A: crate::actor::Actor,
    {
        self.system
            .provider()
            .create_actor(props, name, &BasicActorRef::from(self.myself.clone()), &self.system)
    }

    fn actor_of<A>(&self, name: &str) -> Result<ActorRef<<A as crate::actor::Actor>::Msg>, CreateError>
    where
        A: ActorFactory + crate::actor::Actor,
    {
        self.actor_of_props(Props::new::<A>(), name)
    }

    fn actor_of_args<A>(&self, name: &str, args: A::Args) -> Result<ActorRef<<A as crate::actor::Actor>::Msg>, CreateError>
    where
        A: ActorFactoryArgs,
    {
        self.actor_of_props(Props::new_args::<A>(args), name)
    }

    fn stop(&self, actor: impl ActorReference) {
        actor.sys_tell(SystemMsg::Terminate);
    }
}

impl<Msg: Message> TmpActorRefFactory for Context<Msg> {
    fn tmp_actor_of_props<A>(&self, props: BoxActorProd<A>) -> Result<ActorRef<A::Msg>, CreateError>
    where
        A: crate::actor::Actor,
    {
        self.system.tmp_actor_of_props(props)
    }

    fn tmp_actor_of<A>(&self) -> Result<ActorRef<<A as crate::actor::Actor>::Msg>, CreateError>
    where
        A: ActorFactory + crate::actor::Actor,
    {
        self.system.tmp_actor_of::<A>()
    }

    fn tmp_actor_of_args<A>(&self, args: A::Args) -> Result<ActorRef<<A as crate::actor::Actor>::Msg>, CreateError>
    where
        A: ActorFactoryArgs,
    {
        self.system.tmp_actor_of_args::<A>(args)
    }
}

impl<Msg: Message> ActorSelectionFactory for Context<Msg> {
    fn select(&self, path: &str) -> Result<ActorSelection, InvalidPath> {
        ActorSelection::new(BasicActorRef::from(self.myself.clone()), path.to_string())
    }
}
