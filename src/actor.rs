#![allow(unused_variables)]
pub(crate) mod actor_cell;
pub(crate) mod actor_ref;
pub(crate) mod ask;
pub(crate) mod channel;
pub(crate) mod macros;
pub(crate) mod props;
pub(crate) mod selection;
pub(crate) mod uri;

use std::error::Error;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::validate::InvalidName;

// Public swarmcore::actor API (plus the pub data types in this file)
pub use self::{
    actor_cell::Context,
    actor_ref::{
        ActorRef, ActorRefFactory, ActorReference, BasicActorRef, BoxedTell, Sender, Tell,
        TmpActorRefFactory,
    },
    ask::{ask, AskTimeout},
    channel::{
        channel, All, Channel, ChannelMsg, ChannelRef, DLChannelMsg, DeadLetter, EventsChannel,
        Publish, Subscribe, SysTopic, Topic, Unsubscribe, UnsubscribeAll,
    },
    macros::{actor, dispatch},
    props::{ActorArgs, ActorFactory, ActorFactoryArgs, ActorProducer, BoxActorProd, Props},
    selection::{ActorSelection, ActorSelectionFactory},
    uri::{ActorId, ActorPath, ActorUri, AtomicActorId},
};

use crate::{system::SystemMsg, Message};

#[allow(unused)]
pub type MsgResult<T> = Result<(), MsgError<T>>;

/// Internal message error when a message can't be added to an actor's mailbox.
/// `reason` is the error-taxonomy code ("mailbox-full", "mailbox-closed")
/// the caller routes to dead letters alongside the message itself.
#[doc(hidden)]
#[derive(Clone)]
pub struct MsgError<T> {
    pub msg: T,
    pub reason: &'static str,
}

impl<T> MsgError<T> {
    pub fn new(msg: T, reason: &'static str) -> Self {
        MsgError { msg, reason }
    }
}

impl<T> Error for MsgError<T> {
    fn description(&self) -> &str {
        self.reason
    }
}

impl<T> fmt::Display for MsgError<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "message rejected by mailbox: {}", self.reason)
    }
}

impl<T> fmt::Debug for MsgError<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "MsgError {{ reason: {} }}", self.reason)
    }
}

/// Error type when an `try_tell` fails on `Option<ActorRef<Msg>>`
pub struct TryMsgError<T> {
    pub msg: T,
}

impl<T> TryMsgError<T> {
    pub fn new(msg: T) -> Self {
        TryMsgError { msg }
    }
}

impl<T> Error for TryMsgError<T> {
    fn description(&self) -> &str {
        "Option<ActorRef> is None"
    }
}

impl<T> fmt::Display for TryMsgError<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("Option<ActorRef> is None")
    }
}

impl<T> fmt::Debug for TryMsgError<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("Option<ActorRef> is None")
    }
}

/// Error type when an actor fails to start during `actor_of`.
pub enum CreateError {
    Panicked,
    System,
    InvalidName(String),
    AlreadyExists(ActorPath),
}

impl Error for CreateError {
    fn description(&self) -> &str {
        match *self {
            CreateError::Panicked => "Failed to create actor. Cause: Actor panicked while starting",
            CreateError::System => "Failed to create actor. Cause: System failure",
            CreateError::InvalidName(_) => "Failed to create actor. Cause: Invalid actor name",
            CreateError::AlreadyExists(_) => {
                "Failed to create actor. Cause: An actor at the same path already exists"
            }
        }
    }
}

impl fmt::Display for CreateError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            CreateError::Panicked => f.write_str(self.description()),
            CreateError::System => f.write_str(self.description()),
            CreateError::InvalidName(ref name) => {
                write!(f, "{} ({})", self.description(), name)
            }
            CreateError::AlreadyExists(ref path) => {
                write!(f, "{} ({})", self.description(), path)
            }
        }
    }
}

impl fmt::Debug for CreateError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl From<InvalidName> for CreateError {
    fn from(err: InvalidName) -> CreateError {
        CreateError::InvalidName(err.name)
    }
}

/// Error type when an actor fails to restart.
pub struct RestartError;

impl Error for RestartError {
    fn description(&self) -> &str {
        "Failed to restart actor. Cause: Actor panicked while starting"
    }
}

impl fmt::Display for RestartError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.description())
    }
}

impl fmt::Debug for RestartError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

/// A supervisor's verdict on a failed child, handed back by a `Decider`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Directive {
    /// Resume the child with its state intact, as if nothing happened.
    Resume,
    /// Stop and recreate the child, discarding its state.
    Restart,
    /// Stop the child permanently.
    Stop,
    /// Re-raise the failure to this actor's own supervisor.
    Escalate,
}

/// Describes a child failure passed to a `Decider`. `cause` is the
/// panic payload formatted as a string; Rust has no typed exception
/// hierarchy to dispatch on, so deciders match on this description.
#[derive(Clone, Debug)]
pub struct Failure {
    pub child: ActorPath,
    pub cause: String,
}

pub type Decider = Arc<dyn Fn(&Failure) -> Directive + Send + Sync>;

/// Whether a supervision decision applies only to the failed child
/// (`OneForOne`) or to every sibling under the same parent (`AllForOne`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StrategyKind {
    OneForOne,
    AllForOne,
}

/// A parent's policy for handling failed children: which siblings are
/// affected, how failures are classified into a `Directive`, and how many
/// restarts are tolerated within a sliding window before the directive is
/// forcibly escalated.
#[derive(Clone)]
pub struct Strategy {
    pub kind: StrategyKind,
    pub decider: Decider,
    pub max_retries: u32,
    pub within: Duration,
}

impl Strategy {
    pub fn one_for_one(decider: Decider) -> Strategy {
        Strategy {
            kind: StrategyKind::OneForOne,
            decider,
            max_retries: 3,
            within: Duration::from_secs(1),
        }
    }

    pub fn all_for_one(decider: Decider) -> Strategy {
        Strategy {
            kind: StrategyKind::AllForOne,
            decider,
            max_retries: 3,
            within: Duration::from_secs(1),
        }
    }

    pub fn with_retries(mut self, max_retries: u32, within: Duration) -> Strategy {
        self.max_retries = max_retries;
        self.within = within;
        self
    }
}

impl Default for Strategy {
    /// One-for-one, restart on any failure, at most 3 restarts per second.
    fn default() -> Self {
        Strategy::one_for_one(Arc::new(|_: &Failure| Directive::Restart))
    }
}

pub trait Actor: Send + 'static {
    type Msg: Message;

    /// Invoked when an actor is being started by the system.
    ///
    /// Any initialization inherent to the actor's role should be
    /// performed here.
    ///
    /// Panics in `pre_start` do not invoke the
    /// supervision strategy and the actor will be terminated.
    fn pre_start(&mut self, ctx: &Context<Self::Msg>) {}

    /// Invoked after an actor has started.
    ///
    /// Any post initialization can be performed here, such as writing
    /// to a log file, emitting metrics.
    ///
    /// Panics in `post_start` follow the supervision strategy.
    fn post_start(&mut self, ctx: &Context<Self::Msg>) {}

    /// Invoked after an actor has been stopped.
    fn post_stop(&mut self) {}

    /// Return a supervisor strategy that will be used when handling failed child actors.
    fn supervisor_strategy(&self) -> Strategy {
        Strategy::default()
    }

    /// Invoked when an actor receives a system message
    ///
    /// It is guaranteed that only one message in the actor's mailbox is processed
    /// at any one time, including `recv` and `sys_recv`.
    fn sys_recv(&mut self, ctx: &Context<Self::Msg>, msg: SystemMsg, sender: Sender) {}

    /// Invoked when an actor receives a message
    ///
    /// It is guaranteed that only one message in the actor's mailbox is processed
    /// at any one time, including `recv` and `sys_recv`.
    fn recv(&mut self, ctx: &Context<Self::Msg>, msg: Self::Msg, sender: Sender);
}

impl<A: Actor + ?Sized> Actor for Box<A> {
    type Msg = A::Msg;

    fn pre_start(&mut self, ctx: &Context<Self::Msg>) {
        (**self).pre_start(ctx);
    }

    fn post_start(&mut self, ctx: &Context<Self::Msg>) {
        (**self).post_start(ctx)
    }

    fn post_stop(&mut self) {
        (**self).post_stop()
    }

    fn sys_recv(&mut self, ctx: &Context<Self::Msg>, msg: SystemMsg, sender: Option<BasicActorRef>) {
        (**self).sys_recv(ctx, msg, sender)
    }

    fn supervisor_strategy(&self) -> Strategy {
        (**self).supervisor_strategy()
    }

    fn recv(&mut self, ctx: &Context<Self::Msg>, msg: Self::Msg, sender: Option<BasicActorRef>) {
        (**self).recv(ctx, msg, sender)
    }
}

/// Receive and handle a specific message type.
///
/// Used together with the `actor!` macro, which generates a `<Name>Msg`
/// envelope enum plus a `recv` that dispatches to the matching `Receive`
/// impl for each variant.
pub trait Receive<Msg: Message> {
    type Msg: Message;

    /// Invoked when an actor receives a message
    ///
    /// It is guaranteed that only one message in the actor's mailbox is processed
    /// at any one time, including `receive`, `other_receive` and `system_receive`.
    fn receive(&mut self, ctx: &Context<Self::Msg>, msg: Msg, sender: Option<BasicActorRef>);
}

/// The actor trait object
pub type BoxActor<Msg> = Box<dyn Actor<Msg = Msg> + Send>;
