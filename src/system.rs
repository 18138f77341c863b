pub(crate) mod logger;
pub(crate) mod observability;
pub(crate) mod timer;

pub use self::observability::{LoggingSink, MetricsCollector, NoopSink, ObservabilitySink};

use std::fmt;

use crate::actor::BasicActorRef;

// Public API (plus the pub data types in this file)
pub use self::timer::{BasicTimer, ScheduleId, Timer};

/// The six kinds of system-lane traffic a cell can receive. Unlike user
/// messages these always travel the mailbox's unbounded system lane and
/// are drained ahead of any queued user message (see `kernel::mailbox`).
#[derive(Clone, Debug)]
pub enum SystemMsg {
    /// Delivered once, immediately after a cell is registered with its
    /// dispatcher, so `pre_start`/`post_start` run before any user message.
    ActorInit,
    /// A published `SystemEvent`, delivered to every actor subscribed to
    /// its topic on the system event stream (see `actor::channel`).
    Event(SystemEvent),
    /// A child reported a panic; delivered to the child's parent, which
    /// applies its `Strategy` to decide the child's fate.
    Failed(BasicActorRef),
    Resume,
    Restart,
    Terminate,
    /// Direct DeathWatch notification: `actor` has stopped. Delivered only
    /// to cells that called `Context::watch(actor)`, never broadcast.
    Terminated(BasicActorRef),
}

#[derive(Clone, Debug)]
pub enum SystemEvent {
    /// An actor was created.
    ActorCreated(ActorCreated),

    /// An actor was restarted.
    ActorRestarted(ActorRestarted),

    /// An actor was terminated.
    ActorTerminated(ActorTerminated),
}

impl From<SystemEvent> for SystemMsg {
    fn from(evt: SystemEvent) -> SystemMsg {
        SystemMsg::Event(evt)
    }
}

#[derive(Clone, Debug)]
pub struct ActorCreated {
    pub actor: BasicActorRef,
}

#[derive(Clone, Debug)]
pub struct ActorRestarted {
    pub actor: BasicActorRef,
}

#[derive(Clone, Debug)]
pub struct ActorTerminated {
    pub actor: BasicActorRef,
}

impl From<ActorCreated> for SystemEvent {
    fn from(a: ActorCreated) -> SystemEvent {
        SystemEvent::ActorCreated(a)
    }
}

impl From<ActorRestarted> for SystemEvent {
    fn from(a: ActorRestarted) -> SystemEvent {
        SystemEvent::ActorRestarted(a)
    }
}

impl From<ActorTerminated> for SystemEvent {
    fn from(a: ActorTerminated) -> SystemEvent {
        SystemEvent::ActorTerminated(a)
    }
}

impl From<ActorCreated> for SystemMsg {
    fn from(a: ActorCreated) -> SystemMsg {
        SystemMsg::Event(SystemEvent::ActorCreated(a))
    }
}

impl From<ActorRestarted> for SystemMsg {
    fn from(a: ActorRestarted) -> SystemMsg {
        SystemMsg::Event(SystemEvent::ActorRestarted(a))
    }
}

impl From<ActorTerminated> for SystemMsg {
    fn from(a: ActorTerminated) -> SystemMsg {
        SystemMsg::Event(SystemEvent::ActorTerminated(a))
    }
}

pub enum SystemError {
    ModuleFailed(String),
    InvalidName(String),
}

impl fmt::Display for SystemError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            SystemError::ModuleFailed(ref m) => write!(
                f,
                "Failed to create actor system. Cause: Sub module failed to start ({})",
                m
            ),
            SystemError::InvalidName(ref name) => write!(
                f,
                "Failed to create actor system. Cause: Invalid actor system name ({})",
                name
            ),
        }
    }
}

impl fmt::Debug for SystemError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

use std::{
    sync::{Arc, Mutex},
    time::{Duration, Instant, SystemTime},
};

use dashmap::DashMap;
use slog::Logger;
use uuid::Uuid;

use crate::{
    actor::*,
    config::load_config,
    kernel::dispatcher::Dispatcher,
    kernel::provider::{create_root, Provider},
    system::logger::{default_log, DeadLetterLogger},
    system::timer::*,
    validate::validate_name,
    AnyMessage, Config, Message,
};

pub struct ProtoSystem {
    id: Uuid,
    name: String,
    pub host: Arc<str>,
    config: Config,
    started_at: SystemTime,
    started_at_moment: Instant,
}

#[derive(Default)]
pub struct SystemBuilder {
    name: Option<String>,
    cfg: Option<Config>,
    log: Option<Logger>,
    sink: Option<Arc<dyn ObservabilitySink>>,
}

impl SystemBuilder {
    pub fn new() -> Self {
        SystemBuilder::default()
    }

    pub fn create(self) -> Result<ActorSystem, SystemError> {
        let name = self.name.unwrap_or_else(|| "swarmcore".to_string());
        let cfg = self.cfg.unwrap_or_else(load_config);
        let log = self.log.unwrap_or_else(|| default_log(&cfg));
        let sink = self.sink.unwrap_or_else(|| Arc::new(NoopSink));

        ActorSystem::create(name.as_ref(), log, cfg, sink)
    }

    pub fn name(self, name: &str) -> Self {
        SystemBuilder {
            name: Some(name.to_string()),
            ..self
        }
    }

    pub fn cfg(self, cfg: Config) -> Self {
        SystemBuilder {
            cfg: Some(cfg),
            ..self
        }
    }

    pub fn log(self, log: Logger) -> Self {
        SystemBuilder {
            log: Some(log),
            ..self
        }
    }

    /// Wire a custom `ObservabilitySink`; defaults to `NoopSink` (6.4).
    pub fn sink(self, sink: Arc<dyn ObservabilitySink>) -> Self {
        SystemBuilder {
            sink: Some(sink),
            ..self
        }
    }
}

/// The actor runtime and common services coordinator.
///
/// An `ActorSystem` owns the actor hierarchy's guardians, the named
/// dispatcher pools cells run on, the system event/dead-letter channels,
/// and the scheduler. Create one instance per application.
#[derive(Clone)]
pub struct ActorSystem {
    proto: Arc<ProtoSystem>,
    sys_actors: Arc<std::sync::OnceLock<SysActors>>,
    log: Logger,
    debug: bool,
    timer: Arc<Mutex<TimerRef>>,
    sys_channels: Arc<std::sync::OnceLock<SysChannels>>,
    dispatchers: Arc<DashMap<String, Dispatcher>>,
    pub(crate) provider: Provider,
}

impl ActorSystem {
    /// Create a new `ActorSystem` with a generated default name and config
    /// loaded per `load_config`.
    pub fn new() -> Result<ActorSystem, SystemError> {
        let cfg = load_config();
        let log = default_log(&cfg);

        ActorSystem::create("swarmcore", log, cfg, Arc::new(NoopSink))
    }

    pub fn with_name(name: &str) -> Result<ActorSystem, SystemError> {
        let cfg = load_config();
        let log = default_log(&cfg);

        ActorSystem::create(name, log, cfg, Arc::new(NoopSink))
    }

    pub fn with_config(name: &str, cfg: Config) -> Result<ActorSystem, SystemError> {
        let log = default_log(&cfg);

        ActorSystem::create(name, log, cfg, Arc::new(NoopSink))
    }

    fn create(name: &str, log: Logger, cfg: Config, sink: Arc<dyn ObservabilitySink>) -> Result<ActorSystem, SystemError> {
        validate_name(name).map_err(|_| SystemError::InvalidName(name.into()))?;
        let debug = cfg.debug;

        if debug {
            slog::debug!(log, "Starting actor system: System[{}]", name);
        }

        let prov = Provider::new(log.clone());
        let timer = BasicTimer::start(&cfg);

        let dispatchers = DashMap::new();
        dispatchers.insert("default".to_string(), Dispatcher::new("default", &cfg.dispatcher));
        dispatchers.insert("system".to_string(), Dispatcher::new("system", &cfg.dispatcher));

        let proto = ProtoSystem {
            id: Uuid::new_v4(),
            name: name.to_string(),
            host: Arc::from("localhost"),
            config: cfg,
            started_at: SystemTime::now(),
            started_at_moment: Instant::now(),
        };

        // `sys_actors`/`sys_channels` can only be built against a
        // fully-formed `ActorSystem` (actor creation needs `provider()`,
        // `host()`, a dispatcher...), so the system is assembled once with
        // both left unset and then completed below. This mirrors the
        // teacher's two-phase `complete_start`, collapsed into one
        // synchronous constructor since nothing here yields.
        let sys = ActorSystem {
            proto: Arc::new(proto),
            debug,
            log,
            timer: Arc::new(Mutex::new(timer)),
            sys_actors: Arc::new(std::sync::OnceLock::new()),
            sys_channels: Arc::new(std::sync::OnceLock::new()),
            dispatchers: Arc::new(dispatchers),
            provider: prov,
        };

        let _ = sys.sys_actors.set(create_root(&sys));
        let _ = sys.sys_channels.set(bootstrap_channels(&sys)?);

        let _dl_logger = sys_actor_of_args::<DeadLetterLogger>(
            &sys,
            "dl_logger",
            sys.dead_letters().clone(),
        )?;

        let _metrics = sys_actor_of_args::<MetricsCollector>(
            &sys,
            "metrics",
            (sys.sys_events().clone(), sink),
        )?;

        slog::debug!(sys.log, "Actor system [{}] [{}] started", sys.id(), name);

        Ok(sys)
    }

    pub fn start_date(&self) -> SystemTime {
        self.proto.started_at
    }

    pub fn uptime(&self) -> u64 {
        Instant::now().duration_since(self.proto.started_at_moment).as_secs()
    }

    pub fn host(&self) -> Arc<str> {
        self.proto.host.clone()
    }

    pub fn id(&self) -> Uuid {
        self.proto.id
    }

    pub fn name(&self) -> String {
        self.proto.name.clone()
    }

    pub fn print_tree(&self) -> Vec<String> {
        fn print_node(node: &BasicActorRef, indent: &str, log: &mut Vec<String>) {
            log.push(format!("{}└─ {}", indent, node.name()));
            for actor in node.children() {
                print_node(&actor, &(indent.to_string() + "   "), log);
            }
        }

        let mut log = vec![self.name()];
        for actor in self.root().children() {
            print_node(&actor, "", &mut log);
        }
        log
    }

    fn sys_actors(&self) -> &SysActors {
        self.sys_actors
            .get()
            .expect("sys_actors is set before ActorSystem::create returns")
    }

    fn sys_channels(&self) -> &SysChannels {
        self.sys_channels
            .get()
            .expect("sys_channels is set before ActorSystem::create returns")
    }

    fn root(&self) -> &BasicActorRef {
        &self.sys_actors().root
    }

    pub fn user_root(&self) -> &BasicActorRef {
        &self.sys_actors().user
    }

    pub fn sys_root(&self) -> &BasicActorRef {
        &self.sys_actors().sysm
    }

    pub fn temp_root(&self) -> &BasicActorRef {
        &self.sys_actors().temp
    }

    /// Returns a reference to the system events channel.
    pub fn sys_events(&self) -> &ActorRef<ChannelMsg<SystemEvent>> {
        &self.sys_channels().sys_events
    }

    /// Returns a reference to the dead letters channel.
    pub fn dead_letters(&self) -> &ActorRef<DLChannelMsg> {
        &self.sys_channels().dead_letters
    }

    pub fn publish_event(&self, evt: SystemEvent) {
        let topic = Topic::from(&evt);
        self.sys_events().tell(Publish { topic, msg: evt }, None);
    }

    pub fn config(&self) -> &Config {
        &self.proto.config
    }

    #[inline]
    pub fn log(&self) -> Logger {
        self.log.clone()
    }

    pub(crate) fn provider(&self) -> &Provider {
        &self.provider
    }

    /// Looks up a named dispatcher, falling back to `"default"` for an
    /// unregistered name (e.g. a user actor created before a custom
    /// dispatcher has been registered).
    pub(crate) fn dispatcher(&self, name: &str) -> Dispatcher {
        self.dispatchers
            .get(name)
            .or_else(|| self.dispatchers.get("default"))
            .expect("the \"default\" dispatcher always exists")
            .clone()
    }

    /// Registers an additional named dispatcher, e.g. to isolate a family
    /// of blocking actors from the rest of the system.
    pub fn add_dispatcher(&self, name: &str, cfg: &crate::config::DispatcherConfig) {
        self.dispatchers.insert(name.to_string(), Dispatcher::new(name, cfg));
    }

    /// Shuts down the actor system.
    ///
    /// Stops the user guardian (and so, transitively, every user actor)
    /// and blocks the calling thread until the provider has unregistered
    /// it, polling at the scheduler's tick granularity.
    pub fn shutdown(&self) {
        self.stop(self.user_root());
        while self.provider().is_registered(self.user_root().path()) {
            std::thread::sleep(self.config().scheduler.tick);
        }
    }
}

impl ActorRefFactory for ActorSystem {
    fn actor_of_props<A>(&self, props: BoxActorProd<A>, name: &str) -> Result<ActorRef<A::Msg>, CreateError>
    where
        A: Actor,
    {
        self.provider.create_actor(props, name, self.user_root(), self)
    }

    fn actor_of<A>(&self, name: &str) -> Result<ActorRef<<A as Actor>::Msg>, CreateError>
    where
        A: ActorFactory + Actor,
    {
        self.actor_of_props(Props::new::<A>(), name)
    }

    fn actor_of_args<A>(&self, name: &str, args: A::Args) -> Result<ActorRef<<A as Actor>::Msg>, CreateError>
    where
        A: ActorFactoryArgs,
    {
        self.actor_of_props(Props::new_args::<A>(args), name)
    }

    fn stop(&self, actor: impl ActorReference) {
        actor.sys_tell(SystemMsg::Terminate);
    }
}

impl TmpActorRefFactory for ActorSystem {
    fn tmp_actor_of_props<A>(&self, props: BoxActorProd<A>) -> Result<ActorRef<A::Msg>, CreateError>
    where
        A: Actor,
    {
        self.provider.create_actor(props, &Uuid::new_v4().to_string(), self.temp_root(), self)
    }

    fn tmp_actor_of<A>(&self) -> Result<ActorRef<<A as Actor>::Msg>, CreateError>
    where
        A: ActorFactory + Actor,
    {
        self.tmp_actor_of_props(Props::new::<A>())
    }

    fn tmp_actor_of_args<A>(&self, args: A::Args) -> Result<ActorRef<<A as Actor>::Msg>, CreateError>
    where
        A: ActorFactoryArgs,
    {
        self.tmp_actor_of_props(Props::new_args::<A>(args))
    }
}

impl fmt::Debug for ActorSystem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "ActorSystem[Name: {}, Start Time: {:?}, Uptime: {} seconds]",
            self.name(),
            self.start_date(),
            self.uptime()
        )
    }
}

impl Timer for ActorSystem {
    fn schedule<T, M>(
        &self,
        initial_delay: Duration,
        interval: Duration,
        receiver: ActorRef<M>,
        sender: Sender,
        msg: T,
    ) -> ScheduleId
    where
        T: Message + Into<M>,
        M: Message,
    {
        let id = Uuid::new_v4();
        let msg: M = msg.into();

        let job = RepeatJob {
            id,
            send_at: Instant::now() + initial_delay,
            interval,
            receiver: receiver.into(),
            sender,
            msg: AnyMessage::new(msg, false),
        };

        let _ = self.timer.lock().unwrap().send(Job::Repeat(job));
        id
    }

    fn schedule_once<T, M>(&self, delay: Duration, receiver: ActorRef<M>, sender: Sender, msg: T) -> ScheduleId
    where
        T: Message + Into<M>,
        M: Message,
    {
        let id = Uuid::new_v4();
        let msg: M = msg.into();

        let job = OnceJob {
            id,
            send_at: Instant::now() + delay,
            receiver: receiver.into(),
            sender,
            msg: AnyMessage::new(msg, true),
        };

        let _ = self.timer.lock().unwrap().send(Job::Once(job));
        id
    }

    fn cancel_schedule(&self, id: ScheduleId) {
        let _ = self.timer.lock().unwrap().send(Job::Cancel(id));
    }
}

fn sys_actor_of_props<A>(sys: &ActorSystem, props: BoxActorProd<A>, name: &str) -> Result<ActorRef<A::Msg>, SystemError>
where
    A: Actor,
{
    sys.provider
        .create_actor(props, name, sys.sys_root(), sys)
        .map_err(|_| SystemError::ModuleFailed(name.into()))
}

fn sys_actor_of_args<A>(sys: &ActorSystem, name: &str, args: A::Args) -> Result<ActorRef<<A as Actor>::Msg>, SystemError>
where
    A: ActorFactoryArgs,
{
    sys_actor_of_props(sys, Props::new_args::<A>(args), name)
}

fn bootstrap_channels(sys: &ActorSystem) -> Result<SysChannels, SystemError> {
    let sys_events = sys_actor_of_props(sys, Props::new_from_fn(EventsChannel::new), "sys_events")?;
    let dead_letters = sys_actor_of_props(sys, Props::new_from_fn(Channel::<DeadLetter>::new), "dead_letters")?;

    Ok(SysChannels {
        sys_events,
        dead_letters,
    })
}

#[derive(Clone)]
pub struct SysActors {
    pub root: BasicActorRef,
    pub user: BasicActorRef,
    pub sysm: BasicActorRef,
    pub temp: BasicActorRef,
}

#[derive(Clone)]
pub struct SysChannels {
    sys_events: ActorRef<ChannelMsg<SystemEvent>>,
    dead_letters: ActorRef<DLChannelMsg>,
}
