//! A synchronous scheduler. One worker thread owns a min-heap of pending
//! jobs ordered by `send_at` and sleeps until the next one is due (or a new
//! job/cancel arrives), then delivers it with `try_tell_any`. Generalizes
//! the teacher's single-job `futures::channel::mpsc` timer into a proper
//! scheduler capable of holding many outstanding jobs at once, without
//! pulling in an async runtime for what is, underneath, a sleep loop.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::mpsc::{self, RecvTimeoutError, Sender as StdSender};
use std::thread;
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::{actor::Sender, config::Config, AnyMessage};

pub type ScheduleId = Uuid;

/// Schedules one-off and fixed-interval deliveries of a message to an actor.
/// Implemented by `ActorSystem`; see `system::ActorSystem::schedule`/
/// `schedule_once`/`cancel_schedule` for the user-facing API.
pub trait Timer {
    fn schedule<T, M>(
        &self,
        initial_delay: Duration,
        interval: Duration,
        receiver: crate::actor::ActorRef<M>,
        sender: Sender,
        msg: T,
    ) -> ScheduleId
    where
        T: crate::Message + Into<M>,
        M: crate::Message;

    fn schedule_once<T, M>(
        &self,
        delay: Duration,
        receiver: crate::actor::ActorRef<M>,
        sender: Sender,
        msg: T,
    ) -> ScheduleId
    where
        T: crate::Message + Into<M>,
        M: crate::Message;

    fn cancel_schedule(&self, id: ScheduleId);
}

pub(crate) struct OnceJob {
    pub id: ScheduleId,
    pub send_at: Instant,
    pub receiver: crate::actor::BasicActorRef,
    pub sender: Sender,
    pub msg: AnyMessage,
}

pub(crate) struct RepeatJob {
    pub id: ScheduleId,
    pub send_at: Instant,
    pub interval: Duration,
    pub receiver: crate::actor::BasicActorRef,
    pub sender: Sender,
    pub msg: AnyMessage,
}

pub(crate) enum Job {
    Once(OnceJob),
    Repeat(RepeatJob),
    Cancel(ScheduleId),
}

/// A job slot in the scheduler's heap. Wraps whichever variant is pending
/// so the heap can be ordered purely on `send_at`, soonest first.
enum Slot {
    Once(OnceJob),
    Repeat(RepeatJob),
}

impl Slot {
    fn id(&self) -> ScheduleId {
        match self {
            Slot::Once(j) => j.id,
            Slot::Repeat(j) => j.id,
        }
    }

    fn send_at(&self) -> Instant {
        match self {
            Slot::Once(j) => j.send_at,
            Slot::Repeat(j) => j.send_at,
        }
    }
}

impl PartialEq for Slot {
    fn eq(&self, other: &Self) -> bool {
        self.send_at() == other.send_at()
    }
}
impl Eq for Slot {}

impl PartialOrd for Slot {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Slot {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: `BinaryHeap` is a max-heap, and we want the soonest
        // `send_at` to pop first.
        other.send_at().cmp(&self.send_at())
    }
}

#[derive(Clone)]
pub(crate) struct TimerRef(StdSender<Job>);

impl TimerRef {
    pub(crate) fn send(&self, job: Job) -> Result<(), mpsc::SendError<Job>> {
        self.0.send(job)
    }
}

pub(crate) struct BasicTimer;

impl BasicTimer {
    pub(crate) fn start(cfg: &Config) -> TimerRef {
        let (tx, rx) = mpsc::channel::<Job>();
        let tick = cfg.scheduler.tick;

        thread::Builder::new()
            .name("swarmcore-scheduler".to_string())
            .spawn(move || run(rx, tick))
            .expect("failed to spawn scheduler thread");

        TimerRef(tx)
    }
}

fn run(rx: mpsc::Receiver<Job>, tick: Duration) {
    let mut heap: BinaryHeap<Slot> = BinaryHeap::new();

    loop {
        let timeout = heap
            .peek()
            .map(|s| s.send_at().saturating_duration_since(Instant::now()).max(tick))
            .unwrap_or(Duration::from_secs(3600));

        match rx.recv_timeout(timeout) {
            Ok(Job::Once(j)) => heap.push(Slot::Once(j)),
            Ok(Job::Repeat(j)) => heap.push(Slot::Repeat(j)),
            Ok(Job::Cancel(id)) => {
                let kept: Vec<Slot> = heap.into_vec().into_iter().filter(|s| s.id() != id).collect();
                heap = kept.into_iter().collect();
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => return,
        }

        let now = Instant::now();
        let mut due = Vec::new();
        while matches!(heap.peek(), Some(s) if s.send_at() <= now) {
            due.push(heap.pop().unwrap());
        }

        for slot in due {
            match slot {
                Slot::Once(mut j) => {
                    let _ = j.receiver.try_tell_any(&mut j.msg, j.sender.clone());
                }
                Slot::Repeat(mut j) => {
                    let _ = j.receiver.try_tell_any(&mut j.msg, j.sender.clone());
                    let next = RepeatJob {
                        id: j.id,
                        send_at: now + j.interval,
                        interval: j.interval,
                        receiver: j.receiver,
                        sender: j.sender,
                        msg: j.msg,
                    };
                    heap.push(Slot::Repeat(next));
                }
            }
        }
    }
}
