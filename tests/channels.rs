use swarmcore::actor::*;
use swarmcore::system::ActorSystem;
use swarmcore::{actor, dispatch, p_assert_eq};
use swarmcore::testkit::channel::{probe, ChannelProbe};
use swarmcore::testkit::{Probe, ProbeReceive};

#[derive(Clone, Debug)]
pub struct TestProbe(ChannelProbe<(), ()>);

#[derive(Clone, Debug)]
pub struct SomeMessage;

actor!(SubscriberMsg { TestProbe(TestProbe), SomeMessage(SomeMessage) });

struct Subscriber {
    probe: Option<TestProbe>,
    chan: ChannelRef<SomeMessage>,
    topic: Topic,
}

impl ActorFactoryArgs for Subscriber {
    type Args = (ChannelRef<SomeMessage>, Topic);

    fn create_args((chan, topic): Self::Args) -> Self {
        Subscriber {
            probe: None,
            chan,
            topic,
        }
    }
}

impl Actor for Subscriber {
    type Msg = SubscriberMsg;

    fn pre_start(&mut self, ctx: &Context<Self::Msg>) {
        let sub = Box::new(ctx.myself());
        self.chan.tell(
            Subscribe {
                actor: sub,
                topic: self.topic.clone(),
            },
            None,
        );
    }

    fn recv(&mut self, ctx: &Context<Self::Msg>, msg: Self::Msg, sender: Sender) {
        dispatch!(self, ctx, msg, sender, SubscriberMsg { TestProbe, SomeMessage });
    }
}

impl Receive<TestProbe> for Subscriber {
    type Msg = SubscriberMsg;

    fn receive(&mut self, _ctx: &Context<Self::Msg>, msg: TestProbe, _sender: Sender) {
        self.probe = Some(msg);
    }
}

impl Receive<SomeMessage> for Subscriber {
    type Msg = SubscriberMsg;

    fn receive(&mut self, _ctx: &Context<Self::Msg>, _msg: SomeMessage, _sender: Sender) {
        self.probe.as_ref().unwrap().0.event(());
    }
}

#[test]
fn channel_publish() {
    let sys = ActorSystem::new().unwrap();

    let chan: ChannelRef<SomeMessage> = channel("my-chan", &sys).unwrap();

    let topic = Topic::from("my-topic");
    let sub = sys
        .actor_of_args::<Subscriber>("sub-actor", (chan.clone(), topic.clone()))
        .unwrap();

    let (probe, listen) = probe();
    sub.tell(TestProbe(probe), None);

    chan.tell(
        Publish {
            topic,
            msg: SomeMessage,
        },
        None,
    );

    p_assert_eq!(listen, ());
}

#[test]
fn channel_publish_no_subscribers_for_topic() {
    let sys = ActorSystem::new().unwrap();

    let chan: ChannelRef<SomeMessage> = channel("my-chan-2", &sys).unwrap();

    let topic = Topic::from("subscribed-topic");
    let sub = sys
        .actor_of_args::<Subscriber>("sub-actor-2", (chan.clone(), topic))
        .unwrap();

    let (probe, listen) = probe();
    sub.tell(TestProbe(probe), None);

    // published to a different topic: the subscriber should not see it
    chan.tell(
        Publish {
            topic: Topic::from("unrelated-topic"),
            msg: SomeMessage,
        },
        None,
    );

    // prove the subscriber is otherwise alive by publishing on its topic
    chan.tell(
        Publish {
            topic: Topic::from("subscribed-topic"),
            msg: SomeMessage,
        },
        None,
    );

    p_assert_eq!(listen, ());
}

// *** System event stream ***

actor!(EventWatcherMsg { TestProbe(TestProbe) });

struct EventWatcher {
    probe: Option<TestProbe>,
    seen_created: std::sync::Arc<std::sync::atomic::AtomicBool>,
}

impl ActorFactoryArgs for EventWatcher {
    type Args = std::sync::Arc<std::sync::atomic::AtomicBool>;

    fn create_args(seen_created: Self::Args) -> Self {
        EventWatcher { probe: None, seen_created }
    }
}

impl Actor for EventWatcher {
    type Msg = EventWatcherMsg;

    fn pre_start(&mut self, ctx: &Context<Self::Msg>) {
        let sub = Subscribe {
            topic: All.into(),
            actor: Box::new(BasicActorRef::from(ctx.myself())),
        };
        ctx.system.sys_events().tell(ChannelMsg::Subscribe(sub), None);
    }

    fn sys_recv(&mut self, _ctx: &Context<Self::Msg>, msg: swarmcore::system::SystemMsg, _sender: Sender) {
        if let swarmcore::system::SystemMsg::Event(swarmcore::system::SystemEvent::ActorCreated(_)) = msg {
            self.seen_created.store(true, std::sync::atomic::Ordering::Relaxed);
            if let Some(probe) = &self.probe {
                probe.0.event(());
            }
        }
    }

    fn recv(&mut self, ctx: &Context<Self::Msg>, msg: Self::Msg, sender: Sender) {
        dispatch!(self, ctx, msg, sender, EventWatcherMsg { TestProbe });
    }
}

impl Receive<TestProbe> for EventWatcher {
    type Msg = EventWatcherMsg;

    fn receive(&mut self, _ctx: &Context<Self::Msg>, msg: TestProbe, _sender: Sender) {
        if self.seen_created.load(std::sync::atomic::Ordering::Relaxed) {
            msg.0.event(());
        }
        self.probe = Some(msg);
    }
}

#[test]
fn sys_events_reports_actor_created() {
    let sys = ActorSystem::new().unwrap();

    let seen = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
    let watcher = sys.actor_of_args::<EventWatcher>("event-watcher", seen).unwrap();

    // give the watcher's pre_start time to subscribe before the next actor
    // is created, so that creation's ActorCreated event is guaranteed seen
    std::thread::sleep(std::time::Duration::from_millis(100));

    struct Noop;
    impl ActorFactory for Noop {
        fn create() -> Self {
            Noop
        }
    }
    impl Actor for Noop {
        type Msg = ();
        fn recv(&mut self, _ctx: &Context<Self::Msg>, _msg: Self::Msg, _sender: Sender) {}
    }
    sys.actor_of::<Noop>("noop").unwrap();

    let (probe, listen) = probe();
    watcher.tell(TestProbe(probe), None);

    p_assert_eq!(listen, ());
}
