use swarmcore::actor::*;
use swarmcore::system::ActorSystem;

#[test]
fn system_create() {
    assert!(ActorSystem::new().is_ok());
    assert!(ActorSystem::with_name("valid-name").is_ok());

    assert!(ActorSystem::with_name("/").is_err());
    assert!(ActorSystem::with_name("*").is_err());
    assert!(ActorSystem::with_name("/a/b/c").is_err());
    assert!(ActorSystem::with_name("@").is_err());
    assert!(ActorSystem::with_name("#").is_err());
    assert!(ActorSystem::with_name("abc*").is_err());
}

struct ShutdownTest {
    level: u32,
}

impl ActorFactoryArgs for ShutdownTest {
    type Args = u32;

    fn create_args(level: u32) -> Self {
        ShutdownTest { level }
    }
}

impl Actor for ShutdownTest {
    type Msg = ();

    fn pre_start(&mut self, ctx: &Context<Self::Msg>) {
        if self.level < 10 {
            ctx.actor_of_args::<ShutdownTest>(&format!("test-actor-{}", self.level + 1), self.level + 1)
                .unwrap();
        }
    }

    fn recv(&mut self, _ctx: &Context<Self::Msg>, _msg: Self::Msg, _sender: Sender) {}
}

#[test]
fn system_shutdown() {
    let sys = ActorSystem::new().unwrap();

    sys.actor_of_args::<ShutdownTest>("test-actor-1", 1).unwrap();

    sys.shutdown();
}

#[test]
fn system_load_config() {
    let sys = ActorSystem::new().unwrap();

    // default mailbox queue size from config.rs, confirming config loads
    assert_eq!(sys.config().mailbox.user_queue_size, 1000);
}
