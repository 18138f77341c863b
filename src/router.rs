//! Routers: a ref that fans a message out to a set of routees by one of a
//! small number of strategies. Grounded in the routee-management shape of
//! `kernel::provider`'s child bookkeeping (a router owns and supervises its
//! routees the same way any parent cell owns children) and in this crate's
//! own `actor_ref`/`Tell` plumbing rather than anything in the teacher,
//! which has no router of its own.
//!
//! The consistent-hash ring built here (`HashRing`) is reused by
//! `cluster::shard`'s allocator — both need "V virtual nodes per key,
//! minimal movement on membership change", so it's factored once.

use std::collections::BTreeMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};

use rand::Rng;

use crate::{
    actor::{Actor, ActorFactoryArgs, ActorRef, ActorReference, BasicActorRef, Context, Sender, Tell},
    system::SystemEvent,
    system::SystemMsg,
    Message,
};

/// A message-derived routing key, used by the consistent-hash strategy.
/// Every `Message` gets a usable default (its `Debug` rendering); message
/// types that carry a real entity/session id should override this with
/// that id so churn in unrelated fields doesn't reshuffle routing.
pub trait RouteKeyed: Message {
    fn route_key(&self) -> String {
        format!("{:?}", self)
    }
}

impl<T: Message> RouteKeyed for T {}

/// How a `Router` picks routees for an incoming message.
#[derive(Clone, Debug)]
pub enum RoutingStrategy {
    /// Atomic counter mod N; when a routee is removed the counter simply
    /// wraps over the remaining set.
    RoundRobin,
    /// Uniform random choice among current routees.
    Random,
    /// `route_key()` hashed onto a ring of `virtual_nodes` points per
    /// routee; routee churn moves only the keys whose nearest point
    /// changed.
    ConsistentHash { virtual_nodes: u32 },
    /// Send to every routee; delivery succeeds if at least one routee
    /// accepted the message.
    Broadcast,
}

/// A hash ring mapping keys to values of type `T` (here, routee indices)
/// via `virtual_nodes` synthetic points per value. Lookup is the first
/// point at or after the key's hash, wrapping around to the first point
/// on the ring if the key hashes past the last one.
pub struct HashRing<T: Clone> {
    points: BTreeMap<u64, T>,
}

impl<T: Clone> HashRing<T> {
    pub fn new() -> Self {
        HashRing { points: BTreeMap::new() }
    }

    pub fn build(entries: impl IntoIterator<Item = T>, virtual_nodes: u32, key_of: impl Fn(&T) -> String) -> Self {
        let mut points = BTreeMap::new();
        for entry in entries {
            let base = key_of(&entry);
            for v in 0..virtual_nodes.max(1) {
                let h = hash_str(&format!("{}#{}", base, v));
                points.insert(h, entry.clone());
            }
        }
        HashRing { points }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn locate(&self, key: &str) -> Option<&T> {
        if self.points.is_empty() {
            return None;
        }
        let h = hash_str(key);
        self.points
            .range(h..)
            .next()
            .or_else(|| self.points.iter().next())
            .map(|(_, v)| v)
    }
}

impl<T: Clone> Default for HashRing<T> {
    fn default() -> Self {
        HashRing::new()
    }
}

pub(crate) fn hash_str(s: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    s.hash(&mut hasher);
    hasher.finish()
}

/// An actor that fans `Msg` out to its `routees` by `strategy`. Routees are
/// managed: the router watches each one and prunes it from rotation on
/// `Terminated`, per 4.7/4.8's "a terminated routee is removed" rule.
pub struct Router<Msg: RouteKeyed> {
    routees: Vec<ActorRef<Msg>>,
    strategy: RoutingStrategy,
    next: AtomicUsize,
}

/// Constructor args for `Router<Msg>`: the strategy and the initial,
/// externally-supplied routee set.
pub struct RouterArgs<Msg: RouteKeyed> {
    pub strategy: RoutingStrategy,
    pub routees: Vec<ActorRef<Msg>>,
}

impl<Msg: RouteKeyed> ActorFactoryArgs for Router<Msg> {
    type Args = RouterArgs<Msg>;

    fn create_args(args: Self::Args) -> Self {
        Router {
            routees: args.routees,
            strategy: args.strategy,
            next: AtomicUsize::new(0),
        }
    }
}

impl<Msg: RouteKeyed> Router<Msg> {
    fn ring(&self) -> HashRing<usize> {
        HashRing::build(0..self.routees.len(), self.virtual_nodes(), |i| i.to_string())
    }

    fn virtual_nodes(&self) -> u32 {
        match self.strategy {
            RoutingStrategy::ConsistentHash { virtual_nodes } => virtual_nodes,
            _ => 100,
        }
    }

    fn remove_routee(&mut self, actor: &BasicActorRef) {
        self.routees.retain(|r| r.path() != actor.path());
    }
}

impl<Msg: RouteKeyed> Actor for Router<Msg> {
    type Msg = Msg;

    fn pre_start(&mut self, ctx: &Context<Self::Msg>) {
        for routee in &self.routees {
            ctx.watch(&BasicActorRef::from(routee.clone()));
        }
    }

    fn sys_recv(&mut self, _ctx: &Context<Self::Msg>, msg: SystemMsg, _sender: Sender) {
        if let SystemMsg::Event(SystemEvent::ActorTerminated(t)) = msg {
            self.remove_routee(&t.actor);
        }
    }

    fn recv(&mut self, _ctx: &Context<Self::Msg>, msg: Self::Msg, sender: Sender) {
        if self.routees.is_empty() {
            return;
        }
        match &self.strategy {
            RoutingStrategy::RoundRobin => {
                let i = self.next.fetch_add(1, Ordering::Relaxed) % self.routees.len();
                self.routees[i].tell(msg, sender);
            }
            RoutingStrategy::Random => {
                let i = rand::thread_rng().gen_range(0..self.routees.len());
                self.routees[i].tell(msg, sender);
            }
            RoutingStrategy::ConsistentHash { .. } => {
                let ring = self.ring();
                if let Some(&i) = ring.locate(&msg.route_key()) {
                    self.routees[i].tell(msg, sender);
                }
            }
            RoutingStrategy::Broadcast => {
                for routee in &self.routees {
                    routee.tell(msg.clone(), sender.clone());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_is_pure_function_of_its_inputs() {
        let a = HashRing::build(0..4usize, 100, |i| i.to_string());
        let b = HashRing::build(0..4usize, 100, |i| i.to_string());
        for key in ["alice", "bob", "carol", "dave", "eve"] {
            assert_eq!(a.locate(key), b.locate(key));
        }
    }

    #[test]
    fn ring_distributes_across_all_entries() {
        let ring = HashRing::build(0..4usize, 100, |i| i.to_string());
        let mut seen = std::collections::HashSet::new();
        for i in 0..1000 {
            if let Some(&v) = ring.locate(&format!("key-{}", i)) {
                seen.insert(v);
            }
        }
        assert_eq!(seen.len(), 4, "expected all 4 routees to receive some key");
    }

    #[test]
    fn empty_ring_locates_nothing() {
        let ring: HashRing<usize> = HashRing::new();
        assert!(ring.locate("anything").is_none());
    }
}
