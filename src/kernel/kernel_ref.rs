use std::sync::{Arc, Weak};

use crate::{
    actor::{MsgError, MsgResult},
    kernel::mailbox::{AnyEnqueueError, AnySender, MailboxSchedule, MailboxSender},
    system::ActorSystem,
    AnyMessage, Envelope, Message,
};

/// The dispatcher-facing hook every actor cell exposes: run one scheduling
/// turn (draining system messages, then up to `throughput` user messages,
/// then system messages again). Distinct from `ActorRef`/`BasicActorRef`:
/// this is plumbing never exposed to user code.
pub trait RunnableCell: Send + Sync {
    fn run(self: Arc<Self>, throughput: u32);
    fn dispatcher_name(&self) -> &str;
}

/// A weak handle an `ActorCell` uses to schedule itself onto its
/// dispatcher. Weak so the cell-hierarchy graph (cell -> kernel -> runtime
/// -> dock -> cell) doesn't keep itself alive by reference cycle; the
/// `Provider`'s registry is the strong owner of a cell's runtime for as
/// long as the actor is alive.
#[derive(Clone)]
pub struct KernelRef {
    runnable: Weak<dyn RunnableCell>,
}

impl KernelRef {
    pub fn new(runnable: Weak<dyn RunnableCell>) -> KernelRef {
        KernelRef { runnable }
    }

    pub(crate) fn schedule(&self, sys: &ActorSystem) {
        if let Some(runnable) = self.runnable.upgrade() {
            sys.dispatcher(runnable.dispatcher_name()).execute(runnable);
        }
    }

    pub(crate) fn sys_init(&self, sys: &ActorSystem) {
        self.schedule(sys);
    }
}

/// Enqueue a typed message and, if the mailbox was idle, hand the cell to
/// its dispatcher. The mailbox's own `scheduled` flag is the single source
/// of truth so a cell is never queued onto the dispatcher twice at once.
pub fn dispatch<Msg>(
    msg: Envelope<Msg>,
    mbox: &MailboxSender<Msg>,
    kernel: &KernelRef,
    sys: &ActorSystem,
) -> MsgResult<Envelope<Msg>>
where
    Msg: Message,
{
    match mbox.try_enqueue(msg) {
        Ok(_) => {
            if !mbox.is_scheduled() {
                mbox.set_scheduled(true);
                kernel.schedule(sys);
            }
            Ok(())
        }
        Err(e) => Err(MsgError::new(e.msg, e.reason)),
    }
}

pub fn dispatch_any(
    msg: &mut AnyMessage,
    sender: crate::actor::Sender,
    mbox: &Arc<dyn AnySender>,
    kernel: &KernelRef,
    sys: &ActorSystem,
) -> Result<(), AnyEnqueueError> {
    mbox.try_any_enqueue(msg, sender).map(|_| {
        if !mbox.is_sched() {
            mbox.set_sched(true);
            kernel.schedule(sys);
        }
    })
}
