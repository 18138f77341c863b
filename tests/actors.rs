use swarmcore::actor::*;
use swarmcore::system::ActorSystem;
use swarmcore::{actor, dispatch, p_assert_eq};
use swarmcore::testkit::channel::{probe, ChannelProbe};
use swarmcore::testkit::{Probe, ProbeReceive};

#[derive(Clone, Debug)]
pub struct Add;

#[derive(Clone, Debug)]
pub struct TestProbe(ChannelProbe<(), ()>);

actor!(CounterMsg { TestProbe(TestProbe), Add(Add) });

struct Counter {
    probe: Option<TestProbe>,
    count: u32,
}

impl Counter {
    fn new() -> Self {
        Counter { probe: None, count: 0 }
    }
}

impl ActorFactory for Counter {
    fn create() -> Self {
        Counter::new()
    }
}

impl Actor for Counter {
    type Msg = CounterMsg;

    fn recv(&mut self, ctx: &Context<Self::Msg>, msg: Self::Msg, sender: Sender) {
        dispatch!(self, ctx, msg, sender, CounterMsg { TestProbe, Add });
    }
}

impl Receive<TestProbe> for Counter {
    type Msg = CounterMsg;

    fn receive(&mut self, _ctx: &Context<Self::Msg>, msg: TestProbe, _sender: Sender) {
        self.probe = Some(msg);
    }
}

impl Receive<Add> for Counter {
    type Msg = CounterMsg;

    fn receive(&mut self, _ctx: &Context<Self::Msg>, _msg: Add, _sender: Sender) {
        self.count += 1;
        if self.count == 100_000 {
            self.probe.as_ref().unwrap().0.event(());
        }
    }
}

#[test]
fn actor_create() {
    let sys = ActorSystem::new().unwrap();

    assert!(sys.actor_of::<Counter>("valid-name").is_ok());

    assert!(sys.actor_of::<Counter>("/").is_err());
    assert!(sys.actor_of::<Counter>("*").is_err());
    assert!(sys.actor_of::<Counter>("/a/b/c").is_err());
    assert!(sys.actor_of::<Counter>("@").is_err());
    assert!(sys.actor_of::<Counter>("#").is_err());
    assert!(sys.actor_of::<Counter>("abc*").is_err());
}

#[test]
fn actor_tell() {
    let sys = ActorSystem::new().unwrap();

    let actor = sys.actor_of::<Counter>("me").unwrap();

    let (probe, listen) = probe();
    actor.tell(TestProbe(probe), None);

    for _ in 0..100_000 {
        actor.tell(Add, None);
    }

    p_assert_eq!(listen, ());
}

#[test]
fn actor_try_tell() {
    let sys = ActorSystem::new().unwrap();

    let actor = sys.actor_of::<Counter>("me").unwrap();
    let actor: BasicActorRef = actor.into();

    let (probe, listen) = probe();
    actor.try_tell(CounterMsg::TestProbe(TestProbe(probe)), None).unwrap();

    assert!(actor.try_tell(CounterMsg::Add(Add), None).is_ok());
    assert!(actor.try_tell("invalid-type".to_string(), None).is_err());

    for _ in 0..100_000 {
        actor.try_tell(CounterMsg::Add(Add), None).unwrap();
    }

    p_assert_eq!(listen, ());
}

struct Child;

impl ActorFactory for Child {
    fn create() -> Self {
        Child
    }
}

impl Actor for Child {
    type Msg = ();

    fn recv(&mut self, _ctx: &Context<Self::Msg>, _msg: Self::Msg, _sender: Sender) {}
}

struct Parent {
    probe: Option<TestProbe>,
}

impl Parent {
    fn new() -> Self {
        Parent { probe: None }
    }
}

impl ActorFactory for Parent {
    fn create() -> Self {
        Parent::new()
    }
}

impl Actor for Parent {
    type Msg = TestProbe;

    fn pre_start(&mut self, ctx: &Context<Self::Msg>) {
        ctx.actor_of::<Child>("child_a").unwrap();
        ctx.actor_of::<Child>("child_b").unwrap();
        ctx.actor_of::<Child>("child_c").unwrap();
        ctx.actor_of::<Child>("child_d").unwrap();
    }

    fn post_stop(&mut self) {
        self.probe.as_ref().unwrap().0.event(());
    }

    fn recv(&mut self, _ctx: &Context<Self::Msg>, msg: Self::Msg, _sender: Sender) {
        self.probe = Some(msg);
    }
}

#[test]
fn actor_stop() {
    let sys = ActorSystem::new().unwrap();

    let parent = sys.actor_of::<Parent>("parent").unwrap();

    let (probe, listen) = probe();
    parent.tell(TestProbe(probe), None);

    sys.stop(&parent);
    p_assert_eq!(listen, ());
}
