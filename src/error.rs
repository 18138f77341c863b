//! Error taxonomy for the runtime, hand-rolled per domain rather than via
//! a derive macro, matching `validate.rs`'s style.

use std::fmt;
use std::time::Duration;

use crate::actor::ActorPath;

/// Raised when a mailbox is at capacity and cannot accept another message.
#[derive(Clone, Debug)]
pub struct MailboxFull;

impl fmt::Display for MailboxFull {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("mailbox is full")
    }
}

impl std::error::Error for MailboxFull {}

/// Raised when a mailbox belongs to an actor that has already stopped.
#[derive(Clone, Debug)]
pub struct MailboxClosed;

impl fmt::Display for MailboxClosed {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("mailbox is closed")
    }
}

impl std::error::Error for MailboxClosed {}

/// Either full or closed; the two ways a bounded mailbox can reject a send.
#[derive(Clone, Debug)]
pub enum Rejected {
    Full,
    Closed,
}

impl fmt::Display for Rejected {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Rejected::Full => f.write_str("mailbox full"),
            Rejected::Closed => f.write_str("mailbox closed"),
        }
    }
}

impl std::error::Error for Rejected {}

/// Raised by `ask` when no reply arrives within the configured timeout.
#[derive(Clone, Debug)]
pub struct AskTimeoutError {
    pub timeout: Duration,
}

impl fmt::Display for AskTimeoutError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ask timed out after {:?}", self.timeout)
    }
}

impl std::error::Error for AskTimeoutError {}

/// Raised when a remote transport fails to deliver an envelope to another node.
#[derive(Clone, Debug)]
pub struct RemoteDeliveryFailed {
    pub reason: String,
}

impl fmt::Display for RemoteDeliveryFailed {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "remote delivery failed: {}", self.reason)
    }
}

impl std::error::Error for RemoteDeliveryFailed {}

/// Raised when a message addressed to a shard arrives before the region has
/// finished allocating/spawning the entity; callers should retry.
#[derive(Clone, Debug)]
pub struct ShardNotReady {
    pub shard_id: u32,
}

impl fmt::Display for ShardNotReady {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "shard {} is not ready", self.shard_id)
    }
}

impl std::error::Error for ShardNotReady {}

/// Raised when an `ActorRef` is used after the actor it named has stopped
/// and the path has since been reused by a different incarnation.
#[derive(Clone, Debug)]
pub struct StaleRef {
    pub path: ActorPath,
}

impl fmt::Display for StaleRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "stale reference to {}", self.path)
    }
}

impl std::error::Error for StaleRef {}
