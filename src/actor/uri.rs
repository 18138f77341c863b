use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Monotonically increasing id identifying one incarnation of an actor at
/// a given path. Unlike `rand::random`, this is scoped to the owning
/// `ActorSystem` and strictly increasing, so two incarnations of the same
/// path can never collide.
pub type ActorId = u64;

#[derive(Default)]
pub struct AtomicActorId(AtomicU64);

impl AtomicActorId {
    pub fn new() -> Self {
        AtomicActorId(AtomicU64::new(1))
    }

    pub fn next(&self) -> ActorId {
        self.0.fetch_add(1, Ordering::SeqCst)
    }
}

#[derive(Clone, Eq)]
pub struct ActorPath(Arc<String>);

impl ActorPath {
    pub fn new(path: &str) -> ActorPath {
        ActorPath(Arc::new(path.to_string()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl PartialEq for ActorPath {
    fn eq(&self, other: &ActorPath) -> bool {
        self.0 == other.0
    }
}

impl std::hash::Hash for ActorPath {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state)
    }
}

impl fmt::Display for ActorPath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for ActorPath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Uniquely identifies an actor instance: a stable `path` (the hierarchy
/// location, reused across restarts) plus a `uid` unique per incarnation,
/// so a stale `ActorRef` pointing at a since-replaced path can be detected.
#[derive(Clone, Eq)]
pub struct ActorUri {
    pub uid: ActorId,
    pub name: Arc<String>,
    pub path: ActorPath,
    pub host: Arc<str>,
}

impl ActorUri {
    pub fn temp(host: &Arc<str>, id_gen: &AtomicActorId) -> ActorUri {
        let uid = id_gen.next();
        ActorUri {
            uid,
            name: Arc::new(uid.to_string()),
            path: ActorPath::new(&format!("/temp/{}", uid)),
            host: host.clone(),
        }
    }
}

impl PartialEq for ActorUri {
    fn eq(&self, other: &ActorUri) -> bool {
        self.path == other.path
    }
}

impl std::hash::Hash for ActorUri {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.path.hash(state)
    }
}

impl fmt::Display for ActorUri {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.path)
    }
}

impl fmt::Debug for ActorUri {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} (#{})", self.path, self.uid)
    }
}
