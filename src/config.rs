//! Typed runtime configuration, assembled the way the teacher's `config.rs`
//! does: a `Config` struct of `Default`-able sub-configs, optionally
//! amended from a `toml` file named by the `SWARMCORE_CONF` env var.

use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Config {
    pub debug: bool,
    pub log: LoggerConfig,
    pub mailbox: MailboxConfig,
    pub dispatcher: DispatcherConfig,
    pub scheduler: SchedulerConfig,
    pub shard: ShardConfig,
    pub ask: AskConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            debug: false,
            log: LoggerConfig::default(),
            mailbox: MailboxConfig::default(),
            dispatcher: DispatcherConfig::default(),
            scheduler: SchedulerConfig::default(),
            shard: ShardConfig::default(),
            ask: AskConfig::default(),
        }
    }
}

impl Config {
    /// Merge a parsed `toml::Value` into this config. Absent keys are left
    /// at their current value; malformed sections are silently skipped
    /// (matching the teacher's forgiving `Option<()>` merge style).
    fn merge(&mut self, v: &toml::Value) -> Option<()> {
        let v = v.as_table()?;
        if let Some(debug) = v.get("debug").and_then(|v| v.as_bool()) {
            self.debug = debug;
        }
        if let Some(log) = v.get("log") {
            self.log.merge(log);
        }
        if let Some(mailbox) = v.get("mailbox") {
            self.mailbox.merge(mailbox);
        }
        if let Some(dispatcher) = v.get("dispatcher") {
            self.dispatcher.merge(dispatcher);
        }
        if let Some(scheduler) = v.get("scheduler") {
            self.scheduler.merge(scheduler);
        }
        if let Some(shard) = v.get("shard") {
            self.shard.merge(shard);
        }
        if let Some(ask) = v.get("ask") {
            self.ask.merge(ask);
        }
        None
    }
}

/// Loads a `Config`, optionally amended by the `toml` file named by the
/// `SWARMCORE_CONF` env var (defaulting to `config/swarmcore.toml`).
pub fn load_config() -> Config {
    use std::{
        env,
        fs::File,
        io::{self, Read},
    };

    let mut cfg = Config::default();

    let path = env::var("SWARMCORE_CONF").unwrap_or_else(|_| "config/swarmcore.toml".into());
    let amendment = File::open(path)
        .and_then(|mut f| {
            let mut s = String::new();
            f.read_to_string(&mut s)?;
            Ok(s)
        })
        .and_then(|s| {
            toml::from_str::<toml::Value>(&s).map_err(|e| io::Error::new(io::ErrorKind::Other, e))
        });

    if let Ok(amendment) = amendment {
        cfg.merge(&amendment);
    }

    cfg
}

#[derive(Clone, Debug)]
pub struct LoggerConfig {
    pub time_fmt: String,
    pub filter: Option<String>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        LoggerConfig {
            time_fmt: "%Y-%m-%d %H:%M:%S%.3f".into(),
            filter: None,
        }
    }
}

impl LoggerConfig {
    fn merge(&mut self, v: &toml::Value) -> Option<()> {
        let v = v.as_table()?;
        if let Some(fmt) = v.get("time_fmt").and_then(|v| v.as_str()) {
            self.time_fmt = fmt.into();
        }
        if let Some(filter) = v.get("filter").and_then(|v| v.as_str()) {
            self.filter = Some(filter.into());
        }
        None
    }
}

/// Mailbox sizing. `user_queue_size` bounds the user-message lane; the
/// system lane is always unbounded so supervision can never be starved by
/// mailbox pressure.
#[derive(Clone, Copy, Debug)]
pub struct MailboxConfig {
    pub user_queue_size: usize,
}

impl Default for MailboxConfig {
    fn default() -> Self {
        MailboxConfig {
            user_queue_size: 1000,
        }
    }
}

impl MailboxConfig {
    fn merge(&mut self, v: &toml::Value) -> Option<()> {
        let v = v.as_table()?;
        if let Some(n) = v.get("user_queue_size").and_then(|v| v.as_integer()) {
            self.user_queue_size = n as usize;
        }
        None
    }
}

/// Dispatcher thread pool sizing and the throughput quantum (how many user
/// messages a cell processes per scheduling turn before yielding the
/// worker back to the pool).
#[derive(Clone, Copy, Debug)]
pub struct DispatcherConfig {
    pub pool_size: usize,
    pub throughput: u32,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        DispatcherConfig {
            pool_size: num_cpus::get().max(1),
            throughput: 5,
        }
    }
}

impl DispatcherConfig {
    fn merge(&mut self, v: &toml::Value) -> Option<()> {
        let v = v.as_table()?;
        if let Some(n) = v.get("pool_size").and_then(|v| v.as_integer()) {
            self.pool_size = n as usize;
        }
        if let Some(n) = v.get("throughput").and_then(|v| v.as_integer()) {
            self.throughput = n as u32;
        }
        None
    }
}

#[derive(Clone, Copy, Debug)]
pub struct SchedulerConfig {
    pub tick: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            tick: Duration::from_millis(10),
        }
    }
}

impl SchedulerConfig {
    fn merge(&mut self, v: &toml::Value) -> Option<()> {
        let v = v.as_table()?;
        if let Some(n) = v.get("tick_millis").and_then(|v| v.as_integer()) {
            self.tick = Duration::from_millis(n as u64);
        }
        None
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ShardConfig {
    pub shard_count: u32,
    pub virtual_nodes: u32,
}

impl Default for ShardConfig {
    fn default() -> Self {
        ShardConfig {
            shard_count: 128,
            virtual_nodes: 100,
        }
    }
}

impl ShardConfig {
    fn merge(&mut self, v: &toml::Value) -> Option<()> {
        let v = v.as_table()?;
        if let Some(n) = v.get("shard_count").and_then(|v| v.as_integer()) {
            self.shard_count = n as u32;
        }
        if let Some(n) = v.get("virtual_nodes").and_then(|v| v.as_integer()) {
            self.virtual_nodes = n as u32;
        }
        None
    }
}

#[derive(Clone, Copy, Debug)]
pub struct AskConfig {
    pub timeout: Duration,
}

impl Default for AskConfig {
    fn default() -> Self {
        AskConfig {
            timeout: Duration::from_secs(5),
        }
    }
}

impl AskConfig {
    fn merge(&mut self, v: &toml::Value) -> Option<()> {
        let v = v.as_table()?;
        if let Some(n) = v.get("timeout_millis").and_then(|v| v.as_integer()) {
            self.timeout = Duration::from_millis(n as u64);
        }
        None
    }
}
