use std::time::Duration;

use uuid::Uuid;

use swarmcore::actor::*;
use swarmcore::system::{ActorSystem, Timer};
use swarmcore::{actor, dispatch, p_assert_eq};
use swarmcore::testkit::channel::{probe, ChannelProbe};
use swarmcore::testkit::{Probe, ProbeReceive};

#[derive(Clone, Debug)]
pub struct TestProbe(ChannelProbe<(), ()>);

#[derive(Clone, Debug)]
pub struct SomeMessage;

actor!(ScheduleOnceMsg { TestProbe(TestProbe), SomeMessage(SomeMessage) });

struct ScheduleOnce {
    probe: Option<TestProbe>,
}

impl ActorFactory for ScheduleOnce {
    fn create() -> Self {
        ScheduleOnce { probe: None }
    }
}

impl Actor for ScheduleOnce {
    type Msg = ScheduleOnceMsg;

    fn recv(&mut self, ctx: &Context<Self::Msg>, msg: Self::Msg, sender: Sender) {
        dispatch!(self, ctx, msg, sender, ScheduleOnceMsg { TestProbe, SomeMessage });
    }
}

impl Receive<TestProbe> for ScheduleOnce {
    type Msg = ScheduleOnceMsg;

    fn receive(&mut self, ctx: &Context<Self::Msg>, msg: TestProbe, _sender: Sender) {
        self.probe = Some(msg);
        ctx.system
            .schedule_once(Duration::from_millis(50), ctx.myself(), None, SomeMessage);
    }
}

impl Receive<SomeMessage> for ScheduleOnce {
    type Msg = ScheduleOnceMsg;

    fn receive(&mut self, _ctx: &Context<Self::Msg>, _msg: SomeMessage, _sender: Sender) {
        self.probe.as_ref().unwrap().0.event(());
    }
}

#[test]
fn schedule_once() {
    let sys = ActorSystem::new().unwrap();

    let actor = sys.actor_of::<ScheduleOnce>("schedule-once").unwrap();

    let (probe, listen) = probe();

    sys.schedule_once(Duration::from_millis(50), actor, None, TestProbe(probe));
    p_assert_eq!(listen, ());
}

// *** Schedule repeat ***

actor!(ScheduleRepeatMsg { TestProbe(TestProbe), SomeMessage(SomeMessage) });

struct ScheduleRepeat {
    probe: Option<TestProbe>,
    counter: u32,
    schedule_id: Option<Uuid>,
}

impl ActorFactory for ScheduleRepeat {
    fn create() -> Self {
        ScheduleRepeat {
            probe: None,
            counter: 0,
            schedule_id: None,
        }
    }
}

impl Actor for ScheduleRepeat {
    type Msg = ScheduleRepeatMsg;

    fn recv(&mut self, ctx: &Context<Self::Msg>, msg: Self::Msg, sender: Sender) {
        dispatch!(self, ctx, msg, sender, ScheduleRepeatMsg { TestProbe, SomeMessage });
    }
}

impl Receive<TestProbe> for ScheduleRepeat {
    type Msg = ScheduleRepeatMsg;

    fn receive(&mut self, ctx: &Context<Self::Msg>, msg: TestProbe, _sender: Sender) {
        self.probe = Some(msg);
        let id = ctx.system.schedule(
            Duration::from_millis(50),
            Duration::from_millis(50),
            ctx.myself(),
            None,
            SomeMessage,
        );
        self.schedule_id = Some(id);
    }
}

impl Receive<SomeMessage> for ScheduleRepeat {
    type Msg = ScheduleRepeatMsg;

    fn receive(&mut self, ctx: &Context<Self::Msg>, _msg: SomeMessage, _sender: Sender) {
        if self.counter == 5 {
            ctx.system.cancel_schedule(self.schedule_id.unwrap());
            self.probe.as_ref().unwrap().0.event(());
        } else {
            self.counter += 1;
        }
    }
}

#[test]
fn schedule_repeat() {
    let sys = ActorSystem::new().unwrap();

    let actor = sys.actor_of::<ScheduleRepeat>("schedule-repeat").unwrap();

    let (probe, listen) = probe();

    actor.tell(TestProbe(probe), None);

    p_assert_eq!(listen, ());
}
