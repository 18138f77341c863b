use std::sync::Arc;

use swarmcore::actor::*;
use swarmcore::system::ActorSystem;
use swarmcore::{actor, dispatch, p_assert_eq};
use swarmcore::testkit::channel::{probe, ChannelProbe};
use swarmcore::testkit::{Probe, ProbeReceive};

#[derive(Clone, Debug)]
pub struct Panic;

#[derive(Clone, Debug)]
pub struct TestProbe(ChannelProbe<(), ()>);

actor!(PanicActorMsg { TestProbe(TestProbe), Panic(Panic) });

struct PanicActor;

impl ActorFactory for PanicActor {
    fn create() -> Self {
        PanicActor
    }
}

impl Actor for PanicActor {
    type Msg = PanicActorMsg;

    fn recv(&mut self, ctx: &Context<Self::Msg>, msg: Self::Msg, sender: Sender) {
        dispatch!(self, ctx, msg, sender, PanicActorMsg { TestProbe, Panic });
    }
}

impl Receive<TestProbe> for PanicActor {
    type Msg = PanicActorMsg;

    fn receive(&mut self, _ctx: &Context<Self::Msg>, msg: TestProbe, _sender: Sender) {
        msg.0.event(());
    }
}

impl Receive<Panic> for PanicActor {
    type Msg = PanicActorMsg;

    fn receive(&mut self, _ctx: &Context<Self::Msg>, _msg: Panic, _sender: Sender) {
        panic!("// TEST PANIC // TEST PANIC // TEST PANIC //");
    }
}

// *** Restart strategy ***

actor!(RestartSupMsg { TestProbe(TestProbe), Panic(Panic) });

struct RestartSup {
    actor_to_fail: Option<ActorRef<PanicActorMsg>>,
}

impl ActorFactory for RestartSup {
    fn create() -> Self {
        RestartSup { actor_to_fail: None }
    }
}

impl Actor for RestartSup {
    type Msg = RestartSupMsg;

    fn pre_start(&mut self, ctx: &Context<Self::Msg>) {
        self.actor_to_fail = ctx.actor_of::<PanicActor>("actor-to-fail").ok();
    }

    fn recv(&mut self, ctx: &Context<Self::Msg>, msg: Self::Msg, sender: Sender) {
        dispatch!(self, ctx, msg, sender, RestartSupMsg { TestProbe, Panic });
    }

    fn supervisor_strategy(&self) -> Strategy {
        Strategy::one_for_one(Arc::new(|_: &Failure| Directive::Restart))
    }
}

impl Receive<TestProbe> for RestartSup {
    type Msg = RestartSupMsg;

    fn receive(&mut self, _ctx: &Context<Self::Msg>, msg: TestProbe, sender: Sender) {
        self.actor_to_fail.as_ref().unwrap().tell(msg, sender);
    }
}

impl Receive<Panic> for RestartSup {
    type Msg = RestartSupMsg;

    fn receive(&mut self, _ctx: &Context<Self::Msg>, _msg: Panic, _sender: Sender) {
        self.actor_to_fail.as_ref().unwrap().tell(Panic, None);
    }
}

#[test]
fn supervision_restart_failed_actor() {
    let sys = ActorSystem::new().unwrap();

    for i in 0..20 {
        let name = format!("supervisor_{}", i);
        let sup = sys.actor_of::<RestartSup>(&name).unwrap();

        // make the child panic; one-for-one + Restart should bring it back
        sup.tell(Panic, None);

        let (probe, listen) = probe::<()>();
        sup.tell(TestProbe(probe), None);
        p_assert_eq!(listen, ());
    }
}

// *** Escalate strategy ***

actor!(EscalateSupMsg { TestProbe(TestProbe), Panic(Panic) });

struct EscalateSup {
    actor_to_fail: Option<ActorRef<PanicActorMsg>>,
}

impl ActorFactory for EscalateSup {
    fn create() -> Self {
        EscalateSup { actor_to_fail: None }
    }
}

impl Actor for EscalateSup {
    type Msg = EscalateSupMsg;

    fn pre_start(&mut self, ctx: &Context<Self::Msg>) {
        self.actor_to_fail = ctx.actor_of::<PanicActor>("actor-to-fail").ok();
    }

    fn recv(&mut self, ctx: &Context<Self::Msg>, msg: Self::Msg, sender: Sender) {
        dispatch!(self, ctx, msg, sender, EscalateSupMsg { TestProbe, Panic });
    }

    fn supervisor_strategy(&self) -> Strategy {
        Strategy::one_for_one(Arc::new(|_: &Failure| Directive::Escalate))
    }
}

impl Receive<TestProbe> for EscalateSup {
    type Msg = EscalateSupMsg;

    fn receive(&mut self, _ctx: &Context<Self::Msg>, msg: TestProbe, sender: Sender) {
        self.actor_to_fail.as_ref().unwrap().tell(msg, sender);
    }
}

impl Receive<Panic> for EscalateSup {
    type Msg = EscalateSupMsg;

    fn receive(&mut self, _ctx: &Context<Self::Msg>, _msg: Panic, _sender: Sender) {
        self.actor_to_fail.as_ref().unwrap().tell(Panic, None);
    }
}

actor!(EscRestartSupMsg { TestProbe(TestProbe), Panic(Panic) });

struct EscRestartSup {
    escalator: Option<ActorRef<EscalateSupMsg>>,
}

impl ActorFactory for EscRestartSup {
    fn create() -> Self {
        EscRestartSup { escalator: None }
    }
}

impl Actor for EscRestartSup {
    type Msg = EscRestartSupMsg;

    fn pre_start(&mut self, ctx: &Context<Self::Msg>) {
        self.escalator = ctx.actor_of::<EscalateSup>("escalate-supervisor").ok();
    }

    fn recv(&mut self, ctx: &Context<Self::Msg>, msg: Self::Msg, sender: Sender) {
        dispatch!(self, ctx, msg, sender, EscRestartSupMsg { TestProbe, Panic });
    }

    // an escalated failure lands here as a child failure of its own,
    // so restarting at this level recovers the whole branch
    fn supervisor_strategy(&self) -> Strategy {
        Strategy::one_for_one(Arc::new(|_: &Failure| Directive::Restart))
    }
}

impl Receive<TestProbe> for EscRestartSup {
    type Msg = EscRestartSupMsg;

    fn receive(&mut self, _ctx: &Context<Self::Msg>, msg: TestProbe, sender: Sender) {
        self.escalator.as_ref().unwrap().tell(msg, sender);
    }
}

impl Receive<Panic> for EscRestartSup {
    type Msg = EscRestartSupMsg;

    fn receive(&mut self, _ctx: &Context<Self::Msg>, _msg: Panic, _sender: Sender) {
        self.escalator.as_ref().unwrap().tell(Panic, None);
    }
}

#[test]
fn supervision_escalate_failed_actor() {
    let sys = ActorSystem::new().unwrap();

    let sup = sys.actor_of::<EscRestartSup>("supervisor").unwrap();

    sup.tell(Panic, None);

    let (probe, listen) = probe::<()>();
    sup.tell(TestProbe(probe), None);
    p_assert_eq!(listen, ());
}
