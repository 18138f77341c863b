//! Cluster membership: the core only consumes a live member set and a
//! subscription to its changes (4.8's `MembershipProvider`); it never runs
//! gossip or failure detection itself. Grounded conceptually on
//! `other_examples`'s cluster-membership contract (snapshot + event stream
//! + self-identity), simplified to the flatter `Member`/event shape
//! spec.md actually names rather than that file's richer revisioned API.

use std::sync::{Arc, Mutex};

use uuid::Uuid;

/// Stable per-process identity of a cluster node.
pub type NodeId = Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemberStatus {
    Up,
    Unreachable,
    Removed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Member {
    pub node_id: NodeId,
    pub address: String,
    pub roles: Vec<String>,
    pub status: MemberStatus,
}

impl Member {
    pub fn new(node_id: NodeId, address: impl Into<String>) -> Self {
        Member {
            node_id,
            address: address.into(),
            roles: Vec::new(),
            status: MemberStatus::Up,
        }
    }
}

#[derive(Clone, Debug)]
pub enum MembershipEvent {
    Joined(Member),
    Up(Member),
    Unreachable(Member),
    Removed(Member),
}

pub type MembershipListener = Arc<dyn Fn(MembershipEvent) + Send + Sync>;

/// Pluggable source of cluster membership. Embedders implement this over
/// whatever gossip/consensus protocol they run; `ShardAllocator` only
/// needs `current_members()` to recompute the allocation table.
pub trait MembershipProvider: Send + Sync {
    fn current_members(&self) -> Vec<Member>;
    fn subscribe(&self, listener: MembershipListener);
    fn current_node(&self) -> Member;
}

/// An in-memory `MembershipProvider` for single-process clusters and
/// tests: members are added/removed by direct calls rather than gossip,
/// and every change fans out synchronously to subscribed listeners.
pub struct StaticMembership {
    self_node: Member,
    members: Mutex<Vec<Member>>,
    listeners: Mutex<Vec<MembershipListener>>,
}

impl StaticMembership {
    pub fn new(self_node: Member) -> Self {
        let members = Mutex::new(vec![self_node.clone()]);
        StaticMembership {
            self_node,
            members,
            listeners: Mutex::new(Vec::new()),
        }
    }

    fn notify(&self, evt: MembershipEvent) {
        for listener in self.listeners.lock().unwrap().iter() {
            listener(evt.clone());
        }
    }

    pub fn join(&self, member: Member) {
        self.members.lock().unwrap().push(member.clone());
        self.notify(MembershipEvent::Joined(member.clone()));
        self.notify(MembershipEvent::Up(member));
    }

    pub fn mark_unreachable(&self, node_id: NodeId) {
        let mut members = self.members.lock().unwrap();
        if let Some(m) = members.iter_mut().find(|m| m.node_id == node_id) {
            m.status = MemberStatus::Unreachable;
            self.notify(MembershipEvent::Unreachable(m.clone()));
        }
    }

    pub fn remove(&self, node_id: NodeId) {
        let mut members = self.members.lock().unwrap();
        if let Some(pos) = members.iter().position(|m| m.node_id == node_id) {
            let mut m = members.remove(pos);
            m.status = MemberStatus::Removed;
            drop(members);
            self.notify(MembershipEvent::Removed(m));
        }
    }
}

impl MembershipProvider for StaticMembership {
    fn current_members(&self) -> Vec<Member> {
        self.members
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.status != MemberStatus::Removed)
            .cloned()
            .collect()
    }

    fn subscribe(&self, listener: MembershipListener) {
        self.listeners.lock().unwrap().push(listener);
    }

    fn current_node(&self) -> Member {
        self.self_node.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_notifies_up_after_joined() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let membership = StaticMembership::new(Member::new(Uuid::new_v4(), "node-a:7000"));
        let seen2 = seen.clone();
        membership.subscribe(Arc::new(move |evt| seen2.lock().unwrap().push(evt)));

        let joiner = Member::new(Uuid::new_v4(), "node-b:7000");
        membership.join(joiner.clone());

        let log = seen.lock().unwrap();
        assert_eq!(log.len(), 2);
        assert!(matches!(log[0], MembershipEvent::Joined(ref m) if m.node_id == joiner.node_id));
        assert!(matches!(log[1], MembershipEvent::Up(ref m) if m.node_id == joiner.node_id));
    }

    #[test]
    fn removed_members_are_excluded_from_current_members() {
        let membership = StaticMembership::new(Member::new(Uuid::new_v4(), "node-a:7000"));
        let joiner = Member::new(Uuid::new_v4(), "node-b:7000");
        membership.join(joiner.clone());
        assert_eq!(membership.current_members().len(), 2);

        membership.remove(joiner.node_id);
        assert_eq!(membership.current_members().len(), 1);
    }
}
