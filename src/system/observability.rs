//! `ObservabilitySink` (6.4): the core emits counters/gauges through this
//! trait and never picks a concrete metrics backend itself — metrics
//! sinks are an explicit Non-goal, handled as an external collaborator.
//! `NoopSink`/`LoggingSink` are the two trivial implementations every
//! embedder needs before wiring a real one; `MetricsCollector` is the
//! internal actor that turns the system event stream into sink calls,
//! grounded in `system::logger::DeadLetterLogger`'s
//! subscribe-in-`pre_start` shape.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use crate::{
    actor::{Actor, ActorFactoryArgs, ActorRef, All, BasicActorRef, ChannelMsg, Context, Sender, Subscribe, Tell},
    system::{SystemEvent, SystemMsg},
};

#[allow(unused_variables)]
pub trait ObservabilitySink: Send + Sync + 'static {
    fn incr_messages_enqueued(&self, n: u64) {}
    fn incr_messages_dropped(&self, n: u64) {}
    fn incr_messages_processed(&self, n: u64) {}
    fn incr_actor_failures(&self, n: u64) {}
    fn incr_restarts(&self, n: u64) {}
    fn incr_ask_timeouts(&self, n: u64) {}
    fn incr_shard_rebalance_count(&self, n: u64) {}
    fn gauge_mailbox_size(&self, path: &str, size: usize) {}
    fn gauge_active_actors(&self, n: i64) {}
    fn gauge_shard_local_count(&self, n: i64) {}
    fn gauge_shard_remote_count(&self, n: i64) {}
}

/// Discards everything. The default sink when nothing else is configured.
#[derive(Default)]
pub struct NoopSink;

impl ObservabilitySink for NoopSink {}

/// Logs every call at `debug` level through the system's own logger.
/// Useful for development; too noisy for anything resembling production
/// traffic, where a real counters/gauges backend belongs instead.
pub struct LoggingSink {
    log: slog::Logger,
}

impl LoggingSink {
    pub fn new(log: slog::Logger) -> Self {
        LoggingSink { log }
    }
}

impl ObservabilitySink for LoggingSink {
    fn incr_messages_enqueued(&self, n: u64) {
        slog::debug!(self.log, "messages_enqueued"; "n" => n);
    }
    fn incr_messages_dropped(&self, n: u64) {
        slog::debug!(self.log, "messages_dropped"; "n" => n);
    }
    fn incr_messages_processed(&self, n: u64) {
        slog::debug!(self.log, "messages_processed"; "n" => n);
    }
    fn incr_actor_failures(&self, n: u64) {
        slog::debug!(self.log, "actor_failures"; "n" => n);
    }
    fn incr_restarts(&self, n: u64) {
        slog::debug!(self.log, "restarts"; "n" => n);
    }
    fn incr_ask_timeouts(&self, n: u64) {
        slog::debug!(self.log, "ask_timeouts"; "n" => n);
    }
    fn incr_shard_rebalance_count(&self, n: u64) {
        slog::debug!(self.log, "shard_rebalance_count"; "n" => n);
    }
    fn gauge_mailbox_size(&self, path: &str, size: usize) {
        slog::debug!(self.log, "mailbox_size"; "path" => path, "size" => size);
    }
    fn gauge_active_actors(&self, n: i64) {
        slog::debug!(self.log, "active_actors"; "n" => n);
    }
    fn gauge_shard_local_count(&self, n: i64) {
        slog::debug!(self.log, "shard_local_count"; "n" => n);
    }
    fn gauge_shard_remote_count(&self, n: i64) {
        slog::debug!(self.log, "shard_remote_count"; "n" => n);
    }
}

/// Subscribes to every `SystemEvent` and forwards actor creation/restart/
/// termination into a `gauge_active_actors`/`incr_restarts` pair on the
/// configured sink. Runs as an ordinary system actor, same as
/// `DeadLetterLogger`.
pub struct MetricsCollector {
    sink: Arc<dyn ObservabilitySink>,
    active: AtomicI64,
}

impl ActorFactoryArgs for MetricsCollector {
    type Args = (ActorRef<ChannelMsg<SystemEvent>>, Arc<dyn ObservabilitySink>);

    fn create_args((_sys_events, sink): Self::Args) -> Self {
        MetricsCollector {
            sink,
            active: AtomicI64::new(0),
        }
    }
}

impl Actor for MetricsCollector {
    type Msg = SystemEvent;

    fn pre_start(&mut self, ctx: &Context<Self::Msg>) {
        let sub = Subscribe {
            topic: All.into(),
            actor: Box::new(BasicActorRef::from(ctx.myself().clone())),
        };
        ctx.system.sys_events().tell(ChannelMsg::Subscribe(sub), None);
    }

    // `sys_events` is an `EventsChannel`, which always delivers published
    // events as `SystemMsg::Event` via `sys_tell` (see `actor::channel`),
    // never through the typed mailbox — so only `sys_recv` ever fires.
    fn sys_recv(&mut self, _ctx: &Context<Self::Msg>, msg: SystemMsg, _sender: Sender) {
        if let SystemMsg::Event(evt) = msg {
            self.on_event(evt);
        }
    }

    fn recv(&mut self, _ctx: &Context<Self::Msg>, _msg: Self::Msg, _sender: Sender) {}
}

impl MetricsCollector {
    fn on_event(&self, evt: SystemEvent) {
        match evt {
            SystemEvent::ActorCreated(_) => {
                let n = self.active.fetch_add(1, Ordering::Relaxed) + 1;
                self.sink.gauge_active_actors(n);
            }
            SystemEvent::ActorRestarted(_) => {
                self.sink.incr_restarts(1);
            }
            SystemEvent::ActorTerminated(_) => {
                let n = self.active.fetch_sub(1, Ordering::Relaxed) - 1;
                self.sink.gauge_active_actors(n);
            }
        }
    }
}
