//! The system's ambient logger and its dead-letter sink. The teacher wired
//! its own actor-backed `log::Log` implementation; this generalizes to
//! plain `slog`, which the rest of the crate (`kernel::provider`, `kernel`,
//! `system`) already logs through directly.

use slog::{o, Drain, Logger};

use crate::{
    actor::{Actor, ActorRef, All, BasicActorRef, ChannelMsg, Context, DeadLetter, Sender, Subscribe, Tell},
    config::Config,
};

/// Builds the system's default logger: an async-buffered, level-filtered
/// terminal drain. `cfg.log.filter`, when set, restricts output to records
/// whose module path contains the given substring.
pub fn default_log(cfg: &Config) -> Logger {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();

    let filter = cfg.log.filter.clone();
    let drain = slog::Filter::new(drain, move |record| {
        filter
            .as_ref()
            .map(|f| record.module().contains(f.as_str()))
            .unwrap_or(true)
    })
    .fuse();

    Logger::root(drain, o!())
}

/// Subscribes to the dead letters channel and logs every message that
/// reaches it, at `warn` level, since a dead letter usually signals a
/// misdirected `tell` or a race with actor termination.
pub struct DeadLetterLogger {
    dl_chan: ActorRef<ChannelMsg<DeadLetter>>,
    log: slog::Logger,
}

impl DeadLetterLogger {
    pub(crate) fn new(dl_chan: ActorRef<ChannelMsg<DeadLetter>>, log: slog::Logger) -> Self {
        DeadLetterLogger { dl_chan, log }
    }
}

impl crate::actor::ActorFactoryArgs for DeadLetterLogger {
    type Args = ActorRef<ChannelMsg<DeadLetter>>;

    fn create_args(dl_chan: Self::Args) -> Self {
        let log = dl_chan
            .cell
            .system()
            .log();
        DeadLetterLogger::new(dl_chan, log)
    }
}

impl Actor for DeadLetterLogger {
    type Msg = DeadLetter;

    fn pre_start(&mut self, ctx: &Context<Self::Msg>) {
        let sub = Subscribe {
            topic: All.into(),
            actor: Box::new(BasicActorRef::from(ctx.myself().clone())),
        };
        self.dl_chan.tell(sub, None);
    }

    fn recv(&mut self, _ctx: &Context<Self::Msg>, msg: Self::Msg, _sender: Sender) {
        slog::warn!(
            self.log,
            "dead letter";
            "sender" => ?msg.sender,
            "recipient" => %msg.recipient.path(),
            "reason" => %msg.reason,
            "msg" => %msg.msg,
        );
    }
}
