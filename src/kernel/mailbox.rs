use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use crate::{
    actor::actor_cell::ExtendedCell,
    actor::*,
    kernel::{
        queue::{
            queue, sys_queue, EnqueueResult, QueueEmpty, QueueReader, QueueWriter, SysQueueReader,
            SysQueueWriter,
        },
        Dock,
    },
    system::{ActorCreated, ActorRestarted, ActorSystem, ActorTerminated, SystemEvent, SystemMsg},
    AnyMessage, Envelope, Message,
};

pub trait MailboxSchedule {
    fn set_scheduled(&self, b: bool);
    fn is_scheduled(&self) -> bool;
}

/// Why a type-erased send failed. `Downcast` is a caller programming error
/// (wrong `Msg` type for the target) and is returned to the caller
/// synchronously, never dead-lettered. `Rejected` is a mailbox-capacity or
/// closed-mailbox rejection and is routed to dead letters by the caller.
#[derive(Debug)]
pub enum AnyEnqueueError {
    Downcast,
    Rejected { reason: &'static str, description: String },
}

pub trait AnySender: Send + Sync {
    fn try_any_enqueue(&self, msg: &mut AnyMessage, sender: Sender) -> Result<(), AnyEnqueueError>;
    fn set_sched(&self, b: bool);
    fn is_sched(&self) -> bool;
}

/// The user-facing, bounded side of a mailbox. A full or closed mailbox
/// rejects the send; the caller (typically `ExtendedCell::send_msg`) is
/// responsible for routing the rejected envelope to dead letters.
#[derive(Clone)]
pub struct MailboxSender<Msg: Message> {
    queue: QueueWriter<Msg>,
    scheduled: Arc<AtomicBool>,
    closed: Arc<AtomicBool>,
}

impl<Msg> MailboxSender<Msg>
where
    Msg: Message,
{
    pub fn try_enqueue(&self, msg: Envelope<Msg>) -> EnqueueResult<Msg> {
        if self.closed.load(Ordering::Acquire) {
            return Err(crate::kernel::queue::EnqueueError { msg, reason: "mailbox-closed" });
        }
        self.queue.try_enqueue(msg)
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}

impl<Msg> MailboxSchedule for MailboxSender<Msg>
where
    Msg: Message,
{
    fn set_scheduled(&self, b: bool) {
        self.scheduled.store(b, Ordering::Relaxed);
    }

    fn is_scheduled(&self) -> bool {
        self.scheduled.load(Ordering::Relaxed)
    }
}

impl<Msg> AnySender for MailboxSender<Msg>
where
    Msg: Message,
{
    fn try_any_enqueue(&self, msg: &mut AnyMessage, sender: Sender) -> Result<(), AnyEnqueueError> {
        let actual: Msg = msg.take().map_err(|_| AnyEnqueueError::Downcast)?;
        let description = format!("{:?}", actual);
        let envelope = Envelope::new(actual, sender);
        self.try_enqueue(envelope).map_err(|e| AnyEnqueueError::Rejected {
            reason: e.reason,
            description,
        })
    }

    fn set_sched(&self, b: bool) {
        self.set_scheduled(b)
    }

    fn is_sched(&self) -> bool {
        self.is_scheduled()
    }
}

unsafe impl<Msg: Message> Send for MailboxSender<Msg> {}
unsafe impl<Msg: Message> Sync for MailboxSender<Msg> {}

/// The unbounded system-message lane. Supervision/lifecycle traffic must
/// never be dropped, so sends are infallible.
#[derive(Clone)]
pub struct SysMailboxSender<Msg: Message> {
    queue: SysQueueWriter<Msg>,
    scheduled: Arc<AtomicBool>,
}

impl<Msg: Message> SysMailboxSender<Msg> {
    pub fn enqueue(&self, msg: Envelope<Msg>) {
        self.queue.enqueue(msg);
    }
}

impl<Msg: Message> MailboxSchedule for SysMailboxSender<Msg> {
    fn set_scheduled(&self, b: bool) {
        self.scheduled.store(b, Ordering::Relaxed);
    }

    fn is_scheduled(&self) -> bool {
        self.scheduled.load(Ordering::Relaxed)
    }
}

unsafe impl<Msg: Message> Send for SysMailboxSender<Msg> {}
unsafe impl<Msg: Message> Sync for SysMailboxSender<Msg> {}

#[derive(Clone)]
pub struct Mailbox<Msg: Message> {
    inner: Arc<MailboxInner<Msg>>,
}

pub struct MailboxInner<Msg: Message> {
    queue: QueueReader<Msg>,
    sys_queue: SysQueueReader<SystemMsg>,
    suspended: Arc<AtomicBool>,
    scheduled: Arc<AtomicBool>,
}

impl<Msg: Message> Mailbox<Msg> {
    pub fn try_dequeue(&self) -> Result<Envelope<Msg>, QueueEmpty> {
        self.inner.queue.try_dequeue()
    }

    pub fn sys_try_dequeue(&self) -> Result<Envelope<SystemMsg>, QueueEmpty> {
        self.inner.sys_queue.try_dequeue()
    }

    pub fn has_msgs(&self) -> bool {
        self.inner.queue.has_msgs()
    }

    pub fn has_sys_msgs(&self) -> bool {
        self.inner.sys_queue.has_msgs()
    }

    pub fn set_suspended(&self, b: bool) {
        self.inner.suspended.store(b, Ordering::Relaxed);
    }

    fn is_suspended(&self) -> bool {
        self.inner.suspended.load(Ordering::Relaxed)
    }
}

impl<Msg> MailboxSchedule for Mailbox<Msg>
where
    Msg: Message,
{
    fn set_scheduled(&self, b: bool) {
        self.inner.scheduled.store(b, Ordering::Relaxed);
    }

    fn is_scheduled(&self) -> bool {
        self.inner.scheduled.load(Ordering::Relaxed)
    }
}

/// Build a bounded user mailbox and its unbounded system-message sibling,
/// sharing one `scheduled` flag so either lane waking the cell results in
/// exactly one dispatch.
pub fn mailbox<Msg>(
    user_queue_size: usize,
) -> (MailboxSender<Msg>, SysMailboxSender<SystemMsg>, Mailbox<Msg>)
where
    Msg: Message,
{
    let (qw, qr) = queue::<Msg>(user_queue_size);
    let (sqw, sqr) = sys_queue::<SystemMsg>();

    let scheduled = Arc::new(AtomicBool::new(false));
    let closed = Arc::new(AtomicBool::new(false));

    let sender = MailboxSender {
        queue: qw,
        scheduled: scheduled.clone(),
        closed,
    };

    let sys_sender = SysMailboxSender {
        queue: sqw,
        scheduled: scheduled.clone(),
    };

    let mailbox = MailboxInner {
        queue: qr,
        sys_queue: sqr,
        suspended: Arc::new(AtomicBool::new(true)),
        scheduled,
    };

    (sender, sys_sender, Mailbox { inner: Arc::new(mailbox) })
}

/// One scheduling turn: drain system messages, process up to `throughput`
/// user messages (draining system messages between each, so a failure
/// detected mid-batch is handled immediately), drain system messages once
/// more, then reschedule if anything arrived while we were running.
pub fn run_mailbox<A>(mbox: &Mailbox<A::Msg>, ctx: Context<A::Msg>, dock: &Dock<A>, throughput: u32)
where
    A: Actor,
{
    let sen = Sentinel {
        actor: ctx.myself().clone().into(),
        parent: ctx.myself().parent(),
        mbox,
    };

    let mut actor = dock.actor.lock().unwrap().take();

    process_sys_msgs(sen.mbox, &ctx, dock, &mut actor);

    if actor.is_some() && !sen.mbox.is_suspended() {
        process_msgs(sen.mbox, &ctx, dock, &mut actor, throughput);
    }

    process_sys_msgs(sen.mbox, &ctx, dock, &mut actor);

    if actor.is_some() {
        *dock.actor.lock().unwrap() = actor;
    }

    sen.mbox.set_scheduled(false);

    let has_msgs = sen.mbox.has_msgs() || sen.mbox.has_sys_msgs();
    if has_msgs && !sen.mbox.is_scheduled() {
        sen.mbox.set_scheduled(true);
        ctx.kernel.schedule(&ctx.system);
    }
}

fn process_msgs<A>(
    mbox: &Mailbox<A::Msg>,
    ctx: &Context<A::Msg>,
    dock: &Dock<A>,
    actor: &mut Option<A>,
    throughput: u32,
) where
    A: Actor,
{
    let mut count = 0;

    loop {
        if count < throughput {
            match mbox.try_dequeue() {
                Ok(msg) => {
                    let (msg, sender) = (msg.msg, msg.sender);
                    actor.as_mut().unwrap().recv(ctx, msg, sender);
                    process_sys_msgs(mbox, ctx, dock, actor);
                    count += 1;
                }
                Err(_) => break,
            }
        } else {
            break;
        }
    }
}

fn process_sys_msgs<A>(mbox: &Mailbox<A::Msg>, ctx: &Context<A::Msg>, dock: &Dock<A>, actor: &mut Option<A>)
where
    A: Actor,
{
    // Drain into a Vec first: messages enqueued by handlers invoked below
    // (e.g. a restart triggered mid-drain) are picked up on the next turn,
    // not interleaved with this one.
    let mut sys_msgs: Vec<Envelope<SystemMsg>> = Vec::new();
    while let Ok(sys_msg) = mbox.sys_try_dequeue() {
        sys_msgs.push(sys_msg);
    }

    for msg in sys_msgs {
        match msg.msg {
            SystemMsg::ActorInit => handle_init(mbox, ctx, &dock.cell, actor),
            SystemMsg::Event(evt) => handle_evt(evt, ctx, actor),
            SystemMsg::Failed(failed) => handle_failed(failed, &dock.cell, actor),
            SystemMsg::Resume => mbox.set_suspended(false),
            SystemMsg::Restart => handle_restart(mbox, ctx, dock, actor),
            SystemMsg::Terminate => handle_terminate(mbox, ctx, dock, actor),
            SystemMsg::Terminated(who) => handle_terminated(who, ctx, actor),
        }
    }
}

fn handle_terminated<A>(who: BasicActorRef, ctx: &Context<A::Msg>, actor: &mut Option<A>)
where
    A: Actor,
{
    if let Some(a) = actor.as_mut() {
        a.sys_recv(ctx, SystemMsg::Terminated(who), None);
    }
}

fn handle_init<A>(
    mbox: &Mailbox<A::Msg>,
    ctx: &Context<A::Msg>,
    cell: &ExtendedCell<A::Msg>,
    actor: &mut Option<A>,
) where
    A: Actor,
{
    actor.as_mut().unwrap().pre_start(ctx);
    mbox.set_suspended(false);

    if cell.is_user() {
        ctx.system.publish_event(
            ActorCreated {
                actor: cell.myself().into(),
            }
            .into(),
        );
    }

    actor.as_mut().unwrap().post_start(ctx);
}

fn handle_failed<A>(failed: BasicActorRef, cell: &ExtendedCell<A::Msg>, actor: &mut Option<A>)
where
    A: Actor,
{
    let strategy = actor.as_ref().map(|a| a.supervisor_strategy()).unwrap_or_default();
    cell.handle_failure(failed, strategy)
}

fn handle_evt<A>(evt: SystemEvent, ctx: &Context<A::Msg>, actor: &mut Option<A>)
where
    A: Actor,
{
    if let Some(a) = actor.as_mut() {
        a.sys_recv(ctx, SystemMsg::Event(evt), None);
    }
}

/// Recreate the actor from its stored producer, discarding its prior state.
/// Invoked when a supervisor issues `Directive::Restart`.
fn handle_restart<A>(mbox: &Mailbox<A::Msg>, ctx: &Context<A::Msg>, dock: &Dock<A>, actor: &mut Option<A>)
where
    A: Actor,
{
    if let Some(mut old) = actor.take() {
        old.post_stop();
    }

    mbox.set_suspended(true);
    let mut fresh = dock.producer.produce();
    fresh.pre_start(ctx);
    mbox.set_suspended(false);
    fresh.post_start(ctx);
    *actor = Some(fresh);

    if dock.cell.is_user() {
        ctx.system.publish_event(
            ActorRestarted {
                actor: dock.cell.myself_basic(),
            }
            .into(),
        );
    }
}

/// Stop the actor permanently. Invoked when a supervisor issues
/// `Directive::Stop`, or directly via `ActorRefFactory::stop`.
fn handle_terminate<A>(mbox: &Mailbox<A::Msg>, ctx: &Context<A::Msg>, dock: &Dock<A>, actor: &mut Option<A>)
where
    A: Actor,
{
    if let Some(mut me) = actor.take() {
        me.post_stop();
    }

    mbox.set_suspended(true);
    dock.cell.close_mailbox();

    let myself = dock.cell.myself_basic();
    myself.parent().cell.remove_child(dock.cell.uri().name.as_str());
    ctx.system.provider().unregister(dock.cell.uri().path.clone());

    flush_to_deadletters(mbox, &myself, &ctx.system);
    dock.cell.notify_watchers_terminated();

    if dock.cell.is_user() {
        ctx.system
            .publish_event(ActorTerminated { actor: myself }.into());
    }
}

struct Sentinel<'a, Msg: Message> {
    parent: BasicActorRef,
    actor: BasicActorRef,
    mbox: &'a Mailbox<Msg>,
}

impl<'a, Msg> Drop for Sentinel<'a, Msg>
where
    Msg: Message,
{
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.mbox.set_suspended(true);
            self.mbox.set_scheduled(false);
            self.parent.sys_tell(SystemMsg::Failed(self.actor.clone()));
        }
    }
}

pub fn flush_to_deadletters<Msg>(mbox: &Mailbox<Msg>, actor: &BasicActorRef, sys: &ActorSystem)
where
    Msg: Message,
{
    while let Ok(Envelope { msg, sender, .. }) = mbox.try_dequeue() {
        reject_to_deadletter(sys, actor.clone(), sender, format!("{:?}", msg), "stale-ref");
    }
}

/// Publish a single rejected or undeliverable send to dead letters with a
/// reason code (error taxonomy: MailboxFull, MailboxClosed, StaleRef).
/// Used both by the drain-on-stop path above and by the `tell`/`try_tell`
/// send paths (`ActorRef::send_msg`, `ActorCell::send_any_msg`) when
/// `try_enqueue` rejects a message instead of silently discarding it.
pub fn reject_to_deadletter(
    sys: &ActorSystem,
    recipient: BasicActorRef,
    sender: Sender,
    msg: String,
    reason: &str,
) {
    let dl = DeadLetter {
        msg,
        sender,
        recipient,
        reason: reason.to_string(),
    };

    sys.dead_letters().tell(
        Publish {
            topic: "dead_letter".into(),
            msg: dl,
        },
        None,
    );
}
