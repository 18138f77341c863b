use std::marker::PhantomData;
use std::panic::{RefUnwindSafe, UnwindSafe};
use std::sync::Arc;

use crate::actor::Actor;

/// Actor constructor arguments. Cloned once per restart (the producer is
/// retained across restarts, so the same args are replayed each time).
pub trait ActorArgs: Clone + Send + Sync + 'static {}
impl<T: Clone + Send + Sync + 'static> ActorArgs for T {}

/// Implemented by actors constructible with no arguments via `Props::new`.
pub trait ActorFactory: Actor {
    fn create() -> Self;
}

/// Implemented by actors constructible from `Args` via `Props::new_args`.
pub trait ActorFactoryArgs: Actor {
    type Args: ActorArgs;

    fn create_args(args: Self::Args) -> Self;
}

/// Produces an actor instance. The system holds one producer per actor
/// path and invokes it again on every restart, so it must be safe to call
/// repeatedly and to call across an unwind boundary (construction happens
/// inside a `catch_unwind`).
pub trait ActorProducer: Send + Sync + UnwindSafe + RefUnwindSafe {
    type Actor: Actor;

    fn produce(&self) -> Self::Actor;
}

pub type BoxActorProd<A> = Arc<dyn ActorProducer<Actor = A>>;

struct NullaryProducer<A>(PhantomData<A>);

unsafe impl<A> Send for NullaryProducer<A> {}
unsafe impl<A> Sync for NullaryProducer<A> {}
impl<A> UnwindSafe for NullaryProducer<A> {}
impl<A> RefUnwindSafe for NullaryProducer<A> {}

impl<A: ActorFactory> ActorProducer for NullaryProducer<A> {
    type Actor = A;

    fn produce(&self) -> A {
        A::create()
    }
}

struct ArgsProducer<A: ActorFactoryArgs> {
    args: A::Args,
}

unsafe impl<A: ActorFactoryArgs> Send for ArgsProducer<A> {}
unsafe impl<A: ActorFactoryArgs> Sync for ArgsProducer<A> {}
impl<A: ActorFactoryArgs> UnwindSafe for ArgsProducer<A> {}
impl<A: ActorFactoryArgs> RefUnwindSafe for ArgsProducer<A> {}

impl<A: ActorFactoryArgs> ActorProducer for ArgsProducer<A> {
    type Actor = A;

    fn produce(&self) -> A {
        A::create_args(self.args.clone())
    }
}

struct FnProducer<A, F>(F, PhantomData<A>);

unsafe impl<A, F: Send> Send for FnProducer<A, F> {}
unsafe impl<A, F: Sync> Sync for FnProducer<A, F> {}
impl<A, F> UnwindSafe for FnProducer<A, F> {}
impl<A, F> RefUnwindSafe for FnProducer<A, F> {}

impl<A: Actor, F: Fn() -> A + Send + Sync> ActorProducer for FnProducer<A, F> {
    type Actor = A;

    fn produce(&self) -> A {
        (self.0)()
    }
}

/// Builds the `ActorProducer` an `ActorSystem`/`Context` replays every time
/// an actor is created or restarted.
pub struct Props;

impl Props {
    /// For actors implementing `ActorFactory` (no constructor arguments).
    pub fn new<A: ActorFactory>() -> BoxActorProd<A> {
        Arc::new(NullaryProducer(PhantomData))
    }

    /// For actors implementing `ActorFactoryArgs`.
    pub fn new_args<A: ActorFactoryArgs>(args: A::Args) -> BoxActorProd<A> {
        Arc::new(ArgsProducer { args })
    }

    /// For actors constructed from a plain `Fn() -> A`, e.g. `Channel::new`.
    pub fn new_from_fn<A, F>(f: F) -> BoxActorProd<A>
    where
        A: Actor,
        F: Fn() -> A + Send + Sync + 'static,
    {
        Arc::new(FnProducer(f, PhantomData))
    }
}
