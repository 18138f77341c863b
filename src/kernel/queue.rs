//! Synchronous mailbox queues. The user lane is a bounded lock-free ring
//! (`crossbeam::queue::ArrayQueue`); the system lane is unbounded
//! (`crossbeam::queue::SegQueue`) so supervision traffic can never be
//! starved by user-message backpressure.

use std::sync::Arc;

use crossbeam_queue::{ArrayQueue, SegQueue};

use crate::{Envelope, Message};

pub struct QueueEmpty;

#[derive(Clone, Debug)]
pub struct EnqueueError<T> {
    pub msg: T,
    pub reason: &'static str,
}

pub type EnqueueResult<Msg> = Result<(), EnqueueError<Envelope<Msg>>>;

pub fn queue<Msg: Message>(capacity: usize) -> (QueueWriter<Msg>, QueueReader<Msg>) {
    let inner = Arc::new(ArrayQueue::new(capacity.max(1)));
    (
        QueueWriter {
            inner: inner.clone(),
        },
        QueueReader { inner },
    )
}

#[derive(Clone)]
pub struct QueueWriter<Msg: Message> {
    inner: Arc<ArrayQueue<Envelope<Msg>>>,
}

impl<Msg: Message> QueueWriter<Msg> {
    pub fn try_enqueue(&self, msg: Envelope<Msg>) -> EnqueueResult<Msg> {
        self.inner
            .push(msg)
            .map_err(|msg| EnqueueError { msg, reason: "mailbox-full" })
    }
}

pub struct QueueReader<Msg: Message> {
    inner: Arc<ArrayQueue<Envelope<Msg>>>,
}

impl<Msg: Message> QueueReader<Msg> {
    pub fn try_dequeue(&self) -> Result<Envelope<Msg>, QueueEmpty> {
        self.inner.pop().ok_or(QueueEmpty)
    }

    pub fn has_msgs(&self) -> bool {
        !self.inner.is_empty()
    }
}

/// Unbounded queue used for the system-message lane.
pub fn sys_queue<Msg: Message>() -> (SysQueueWriter<Msg>, SysQueueReader<Msg>) {
    let inner = Arc::new(SegQueue::new());
    (
        SysQueueWriter {
            inner: inner.clone(),
        },
        SysQueueReader { inner },
    )
}

#[derive(Clone)]
pub struct SysQueueWriter<Msg: Message> {
    inner: Arc<SegQueue<Envelope<Msg>>>,
}

impl<Msg: Message> SysQueueWriter<Msg> {
    pub fn enqueue(&self, msg: Envelope<Msg>) {
        self.inner.push(msg);
    }
}

pub struct SysQueueReader<Msg: Message> {
    inner: Arc<SegQueue<Envelope<Msg>>>,
}

impl<Msg: Message> SysQueueReader<Msg> {
    pub fn try_dequeue(&self) -> Result<Envelope<Msg>, QueueEmpty> {
        self.inner.pop().ok_or(QueueEmpty)
    }

    pub fn has_msgs(&self) -> bool {
        !self.inner.is_empty()
    }
}
