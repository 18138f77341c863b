//! Virtual actors keyed by entity id (4.8). `ShardAllocator::allocate` is a
//! pure function of `(members, shard_count, virtual_nodes)` — testable
//! property 5 — built on the same `HashRing` the router's consistent-hash
//! strategy uses, per SPEC_FULL.md's instruction to cross-ground the
//! clustering layer rather than invent a second ring implementation.
//!
//! `ShardRegion` resolves `region.entity_ref(id)` synchronously rather than
//! as an actor message round-trip: spawning is just `ActorSystem::actor_of_props`,
//! callable from any thread, so no mailbox hop is needed to get a ref back.
//! A structural simplification from the literal `/user/<type>/<shard>/<entity>`
//! path: entities are spawned as flat, uniquely-named children of `/user`
//! (`<type>-<shard>-<entity>`) rather than nested under a live shard-region
//! guardian actor, since nothing in the spec requires the guardian itself to
//! process messages.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use dashmap::DashMap;

use crate::{
    actor::{ActorRef, BoxActor, Props},
    cluster::membership::{MemberStatus, MembershipProvider, NodeId},
    cluster::remote::RemoteRef,
    error::ShardNotReady,
    router::hash_str,
    router::HashRing,
    system::ActorSystem,
    Message,
};

pub type ShardId = u32;

pub fn shard_id_for(entity_id: &str, shard_count: u32) -> ShardId {
    (hash_str(entity_id) % shard_count.max(1) as u64) as ShardId
}

/// Per-shard-type constructor for entity actors, plus an optional eviction
/// hook. The core never migrates entity state (4.8.3) — `create_entity` is
/// expected to reconstruct it from an external store.
pub trait EntityFactory: Send + Sync + 'static {
    type Msg: Message;

    fn create_entity(&self, entity_id: &str) -> BoxActor<Self::Msg>;

    /// Invoked when the region drops a local entity, either by rebalance
    /// or by an implementation-defined passivation policy (idle-timeout,
    /// LRU cap) the region does not itself enforce.
    fn on_passivate(&self, _entity_id: &str) {}
}

/// Pure allocation of shards onto live members by consistent hashing.
/// Same inputs always produce the same map (property 5).
pub struct ShardAllocator;

impl ShardAllocator {
    pub fn allocate(
        members: &[crate::cluster::membership::Member],
        shard_count: u32,
        virtual_nodes: u32,
    ) -> HashMap<ShardId, NodeId> {
        let live: Vec<NodeId> = members
            .iter()
            .filter(|m| m.status == MemberStatus::Up)
            .map(|m| m.node_id)
            .collect();

        if live.is_empty() {
            return HashMap::new();
        }

        let ring = HashRing::build(live, virtual_nodes, |n| n.to_string());
        (0..shard_count)
            .filter_map(|shard| ring.locate(&shard.to_string()).map(|owner| (shard, *owner)))
            .collect()
    }
}

/// Either a local ref to an entity actor spawned on this node, or a
/// `RemoteRef` addressed to the owning node.
pub enum EntityRef<Msg: Message> {
    Local(ActorRef<Msg>),
    Remote(RemoteRef),
}

/// Manages the local entities of one `typeName` on this node: resolving
/// `region.entity_ref(entityId)`, lazily spawning on first local access,
/// and draining shards this node loses on rebalance.
pub struct ShardRegion<F: EntityFactory> {
    type_name: String,
    factory: Arc<F>,
    shard_count: u32,
    virtual_nodes: u32,
    membership: Arc<dyn MembershipProvider>,
    allocation: RwLock<HashMap<ShardId, NodeId>>,
    local: DashMap<String, ActorRef<F::Msg>>,
}

impl<F: EntityFactory> ShardRegion<F> {
    pub fn new(
        type_name: impl Into<String>,
        factory: F,
        membership: Arc<dyn MembershipProvider>,
        shard_count: u32,
        virtual_nodes: u32,
    ) -> Self {
        let allocation = ShardAllocator::allocate(&membership.current_members(), shard_count, virtual_nodes);
        ShardRegion {
            type_name: type_name.into(),
            factory: Arc::new(factory),
            shard_count,
            virtual_nodes,
            membership,
            allocation: RwLock::new(allocation),
            local: DashMap::new(),
        }
    }

    pub fn shard_id(&self, entity_id: &str) -> ShardId {
        shard_id_for(entity_id, self.shard_count)
    }

    fn owner(&self, shard: ShardId) -> Option<NodeId> {
        self.allocation.read().unwrap().get(&shard).copied()
    }

    /// Recompute the allocation table against the current member set and
    /// drain any shard this node no longer owns (4.8's rebalance).
    /// Entities on shards still owned, or newly gained, are left as-is —
    /// gained shards lazily spawn entities on first `entity_ref` call.
    pub fn rebalance(&self) {
        let members = self.membership.current_members();
        let new_alloc = ShardAllocator::allocate(&members, self.shard_count, self.virtual_nodes);
        let me = self.membership.current_node().node_id;

        let old_alloc = {
            let mut alloc = self.allocation.write().unwrap();
            std::mem::replace(&mut *alloc, new_alloc.clone())
        };

        for (shard, old_owner) in old_alloc.iter() {
            if *old_owner == me && new_alloc.get(shard) != Some(&me) {
                self.drain_shard(*shard);
            }
        }
    }

    fn drain_shard(&self, shard: ShardId) {
        let stale: Vec<String> = self
            .local
            .iter()
            .filter(|e| self.shard_id(e.key()) == shard)
            .map(|e| e.key().clone())
            .collect();
        for entity_id in stale {
            self.local.remove(&entity_id);
            self.factory.on_passivate(&entity_id);
        }
    }

    /// Resolve a ref to the given entity, spawning it locally if this node
    /// owns its shard and it isn't already running. `Err(ShardNotReady)`
    /// means the allocation table has no owner yet (a rebalance window);
    /// per 4.8/7 this is never surfaced to the end user — callers forward
    /// through the source region or retry.
    pub fn entity_ref(&self, sys: &ActorSystem, entity_id: &str) -> Result<EntityRef<F::Msg>, ShardNotReady> {
        let shard = self.shard_id(entity_id);
        let owner = self.owner(shard).ok_or(ShardNotReady { shard_id: shard })?;
        let me = self.membership.current_node().node_id;

        if owner != me {
            let path = format!("/user/{}/{}/{}", self.type_name, shard, entity_id);
            return Ok(EntityRef::Remote(RemoteRef::new(owner, path)));
        }

        if let Some(existing) = self.local.get(entity_id) {
            return Ok(EntityRef::Local(existing.clone()));
        }

        let factory = self.factory.clone();
        let eid = entity_id.to_string();
        let name = format!("{}-{}-{}", self.type_name, shard, entity_id);
        let props = Props::new_from_fn(move || factory.create_entity(&eid));
        let actor_ref = sys
            .actor_of_props(props, &name)
            .map_err(|_| ShardNotReady { shard_id: shard })?;
        self.local.insert(entity_id.to_string(), actor_ref.clone());
        Ok(EntityRef::Local(actor_ref))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::membership::Member;
    use uuid::Uuid;

    fn member(status: MemberStatus) -> Member {
        Member {
            node_id: Uuid::new_v4(),
            address: "node:0".into(),
            roles: vec![],
            status,
        }
    }

    #[test]
    fn allocation_is_pure() {
        let members = vec![member(MemberStatus::Up), member(MemberStatus::Up), member(MemberStatus::Up)];
        let a = ShardAllocator::allocate(&members, 8, 100);
        let b = ShardAllocator::allocate(&members, 8, 100);
        assert_eq!(a, b);
        assert_eq!(a.len(), 8);
    }

    #[test]
    fn unreachable_members_get_no_shards() {
        let up = member(MemberStatus::Up);
        let down = member(MemberStatus::Unreachable);
        let alloc = ShardAllocator::allocate(&[up.clone(), down.clone()], 8, 100);
        assert!(alloc.values().all(|owner| *owner == up.node_id));
    }

    #[test]
    fn empty_membership_allocates_nothing() {
        let alloc = ShardAllocator::allocate(&[], 8, 100);
        assert!(alloc.is_empty());
    }

    #[test]
    fn adding_a_node_moves_roughly_one_over_n_shards() {
        let a = member(MemberStatus::Up);
        let b = member(MemberStatus::Up);
        let c = member(MemberStatus::Up);
        let before = ShardAllocator::allocate(&[a.clone(), b.clone(), c.clone()], 128, 100);
        let d = member(MemberStatus::Up);
        let after = ShardAllocator::allocate(&[a, b, c, d], 128, 100);

        let moved = before.iter().filter(|(shard, owner)| after.get(shard) != Some(*owner)).count();
        // consistent hashing targets ~1/N movement; allow generous slack
        // since this is a coarse 128-shard/4-virtual-node sample, not a
        // tight statistical bound.
        assert!(moved < 128 / 2, "moved {} of 128 shards, expected far fewer than half", moved);
    }
}
