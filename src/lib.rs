#![crate_name = "swarmcore"]
#![deny(clippy::all)]
#![allow(clippy::new_ret_no_self)]
#![allow(clippy::large_enum_variant)]

pub(crate) mod validate;

pub mod actor;
pub mod config;
pub mod error;
pub mod kernel;
pub mod router;
pub mod system;
pub mod testkit;

pub mod cluster;

use std::any::Any;
use std::fmt::Debug;
use std::time::Instant;

use uuid::Uuid;

pub use crate::config::{load_config, Config};

use crate::actor::BasicActorRef;

/// Wraps a user message together with its sender and routing metadata.
/// `priority` is a small signed integer where a larger value is serviced
/// earlier (system messages travel on a separate, strictly-higher lane —
/// see `kernel::mailbox` — rather than through this field). `correlation_id`
/// and `route_key` are consumed by `ask` and the cluster shard router
/// respectively; plain `tell` leaves both unset.
#[derive(Debug, Clone)]
pub struct Envelope<T: Message> {
    pub msg: T,
    pub sender: Option<BasicActorRef>,
    pub priority: i32,
    pub enqueued_at: Instant,
    pub correlation_id: Option<Uuid>,
    pub route_key: Option<String>,
}

unsafe impl<T: Message> Send for Envelope<T> {}

impl<T: Message> Envelope<T> {
    pub fn new(msg: T, sender: Option<BasicActorRef>) -> Self {
        Envelope {
            msg,
            sender,
            priority: 0,
            enqueued_at: Instant::now(),
            correlation_id: None,
            route_key: None,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_correlation_id(mut self, id: Uuid) -> Self {
        self.correlation_id = Some(id);
        self
    }

    pub fn with_route_key(mut self, key: String) -> Self {
        self.route_key = Some(key);
        self
    }
}

pub trait Message: Debug + Clone + Send + 'static {}
impl<T: Debug + Clone + Send + 'static> Message for T {}

/// A type-erased message, used at the boundary where the concrete `Msg`
/// type of the recipient isn't known to the caller (`BasicActorRef::try_tell`,
/// scheduled timer jobs).
pub struct AnyMessage {
    pub one_time: bool,
    pub msg: Option<Box<dyn Any + Send>>,
}

pub struct DowncastAnyMessageError;

impl AnyMessage {
    pub fn new<T>(msg: T, one_time: bool) -> Self
    where
        T: Any + Message,
    {
        Self {
            one_time,
            msg: Some(Box::new(msg)),
        }
    }

    pub fn take<T>(&mut self) -> Result<T, DowncastAnyMessageError>
    where
        T: Any + Message,
    {
        let msg = self.msg.take().ok_or(DowncastAnyMessageError)?;
        match msg.downcast::<T>() {
            Ok(msg) => Ok(*msg),
            Err(msg) => {
                self.msg = Some(msg);
                Err(DowncastAnyMessageError)
            }
        }
    }
}
