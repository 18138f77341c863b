//! Clustering: sharding virtual actors across nodes by consistent hashing
//! (2, 4.8). None of this exists in the teacher — `riker-rs-riker` is a
//! single-process actor runtime — so this module tree is new, grounded in
//! this crate's own `router::HashRing` and `actor_ref`/`Tell` plumbing
//! plus the membership-contract shape found in `other_examples`.

pub mod membership;
pub mod remote;
pub mod shard;

pub use membership::{Member, MemberStatus, MembershipEvent, MembershipListener, MembershipProvider, NodeId, StaticMembership};
pub use remote::{InboundHandler, RemoteRef, RemoteTransport, TcpRemoteTransport, WireFrame};
pub use shard::{EntityFactory, EntityRef, ShardAllocator, ShardId, ShardRegion};
