use std::sync::Arc;

use uuid::Uuid;

use swarmcore::actor::{Actor, ActorFactoryArgs, ActorReference, BoxActor, Context, Sender};
use swarmcore::cluster::{EntityFactory, Member, MembershipProvider, ShardRegion, StaticMembership};
use swarmcore::system::ActorSystem;

#[derive(Clone, Debug)]
struct Touch;

struct Account {
    id: String,
}

impl ActorFactoryArgs for Account {
    type Args = String;

    fn create_args(id: String) -> Self {
        Account { id }
    }
}

impl Actor for Account {
    type Msg = Touch;

    fn recv(&mut self, _ctx: &Context<Self::Msg>, _msg: Self::Msg, _sender: Sender) {}
}

struct AccountFactory;

impl EntityFactory for AccountFactory {
    type Msg = Touch;

    fn create_entity(&self, entity_id: &str) -> BoxActor<Self::Msg> {
        Box::new(Account {
            id: entity_id.to_string(),
        })
    }
}

#[test]
fn entity_ref_spawns_locally_owned_shards() {
    let sys = ActorSystem::new().unwrap();

    let membership: Arc<dyn MembershipProvider> =
        Arc::new(StaticMembership::new(Member::new(Uuid::new_v4(), "node-a:7000")));

    let region = ShardRegion::new("account", AccountFactory, membership, 8, 10);

    let first = region.entity_ref(&sys, "alice").unwrap();
    let second = region.entity_ref(&sys, "alice").unwrap();

    match (first, second) {
        (swarmcore::cluster::EntityRef::Local(a), swarmcore::cluster::EntityRef::Local(b)) => {
            assert_eq!(a.path(), b.path());
        }
        _ => panic!("single-node membership should resolve every entity locally"),
    }
}

#[test]
fn entity_ref_addresses_shards_owned_by_other_nodes() {
    let sys = ActorSystem::new().unwrap();

    let self_node = Member::new(Uuid::new_v4(), "node-a:7000");
    let membership = Arc::new(StaticMembership::new(self_node));
    let peer = Member::new(Uuid::new_v4(), "node-b:7000");
    membership.join(peer.clone());

    let provider: Arc<dyn MembershipProvider> = membership;
    let region = ShardRegion::new("account", AccountFactory, provider, 128, 50);

    // across 128 shards and two members some must land on the peer node
    let remote_found = (0..128)
        .map(|i| region.entity_ref(&sys, &format!("entity-{}", i)).unwrap())
        .any(|r| matches!(r, swarmcore::cluster::EntityRef::Remote(ref rr) if rr.node() == peer.node_id));

    assert!(remote_found, "expected at least one shard owned by the peer node");
}
