//! `ask`: request/reply over `tell`. A temporary actor is created to
//! receive the reply and hand it back to the caller; the call blocks the
//! calling thread (not a dispatcher worker — callers are expected to be
//! outside the actor system, e.g. request handlers) for up to the
//! configured `ask` timeout. Grounded in `riker-patterns::ask`, adapted
//! from a `futures::oneshot`/`RemoteHandle` future to a blocking
//! `std::sync::mpsc` channel to match this runtime's synchronous dispatcher.

use std::sync::mpsc::{sync_channel, RecvTimeoutError, SyncSender};
use std::sync::Mutex;
use std::time::Duration;

use crate::{
    actor::{
        Actor, ActorFactoryArgs, ActorRefFactory, BasicActorRef, Context, Sender, Tell,
        TmpActorRefFactory,
    },
    error::AskTimeoutError,
    system::{ActorSystem, Timer},
    Message,
};

/// Send `msg` to `receiver` and block until it replies (by `tell`ing the
/// temporary sender `ask` supplies as the reply's sender), or the system's
/// configured ask timeout elapses. `ctx` supplies the temp-actor guardian
/// (an `ActorSystem` or `Context`); `receiver` is anything `Msg` can be
/// told to.
///
/// A watchdog, scheduled for `timeout` from now, stops the temporary reply
/// actor if no reply has arrived by then — so a `receiver` that never
/// replies (§4.9/scenario 2's "blackhole") doesn't leak the temp actor
/// forever, and a reply that arrives after the timeout is rejected by the
/// now-closed mailbox and falls through to dead letters instead of being
/// silently accepted by a live but abandoned actor.
pub fn ask<Ctx, T, Msg, R>(ctx: &Ctx, receiver: &T, msg: Msg) -> Result<R, AskTimeoutError>
where
    Ctx: TmpActorRefFactory + AskTimeout,
    T: Tell<Msg>,
    Msg: Message,
    R: Message,
{
    let timeout = ctx.ask_timeout();
    let (tx, rx) = sync_channel::<R>(1);
    let tx = Mutex::new(Some(tx));

    let actor = ctx
        .tmp_actor_of_args::<AskActor<R>>(tx)
        .expect("temp actor creation does not fail under normal operation");
    let target = BasicActorRef::from(actor);

    let watchdog = ctx
        .tmp_actor_of_args::<AskWatchdog>(target.clone())
        .expect("temp actor creation does not fail under normal operation");
    ctx.ask_system().schedule_once(timeout, watchdog, None, AskTimeoutTick);

    receiver.tell(msg, Some(target));

    rx.recv_timeout(timeout).map_err(|e| match e {
        RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected => AskTimeoutError { timeout },
    })
}

/// `ask`'s timeout is sourced from `ActorSystem::config().ask.timeout`; both
/// an `ActorSystem` and a `Context` can reach their owning system, including
/// for scheduling the timeout watchdog (`Timer` is only implemented on
/// `ActorSystem`, not `Context`).
pub trait AskTimeout {
    fn ask_timeout(&self) -> Duration;
    fn ask_system(&self) -> &ActorSystem;
}

impl AskTimeout for ActorSystem {
    fn ask_timeout(&self) -> Duration {
        self.config().ask.timeout
    }

    fn ask_system(&self) -> &ActorSystem {
        self
    }
}

impl<Msg: Message> AskTimeout for Context<Msg> {
    fn ask_timeout(&self) -> Duration {
        self.system.config().ask.timeout
    }

    fn ask_system(&self) -> &ActorSystem {
        &self.system
    }
}

struct AskActor<R: Message> {
    tx: Mutex<Option<SyncSender<R>>>,
}

impl<R: Message> ActorFactoryArgs for AskActor<R> {
    type Args = Mutex<Option<SyncSender<R>>>;

    fn create_args(tx: Self::Args) -> Self {
        AskActor { tx }
    }
}

impl<R: Message> Actor for AskActor<R> {
    type Msg = R;

    fn recv(&mut self, ctx: &Context<Self::Msg>, msg: Self::Msg, _sender: Sender) {
        if let Ok(mut tx) = self.tx.lock() {
            if let Some(tx) = tx.take() {
                let _ = tx.send(msg);
            }
        }
        ctx.system.stop(BasicActorRef::from(ctx.myself().clone()));
    }
}

#[derive(Clone, Debug)]
struct AskTimeoutTick;

/// Stops the ask actor it watches once `timeout` elapses with no reply.
struct AskWatchdog {
    target: BasicActorRef,
}

impl ActorFactoryArgs for AskWatchdog {
    type Args = BasicActorRef;

    fn create_args(target: BasicActorRef) -> Self {
        AskWatchdog { target }
    }
}

impl Actor for AskWatchdog {
    type Msg = AskTimeoutTick;

    fn recv(&mut self, ctx: &Context<Self::Msg>, _msg: Self::Msg, _sender: Sender) {
        ctx.system.stop(&self.target);
        ctx.system.stop(BasicActorRef::from(ctx.myself().clone()));
    }
}
