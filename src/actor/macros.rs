//! Declarative stand-ins for the `#[actor(...)]` attribute macro. The
//! attribute-macro crate this runtime used to ship alongside has no
//! surviving source in this tree, so the same envelope-enum-plus-dispatch
//! shape it generated is produced here with `macro_rules!` instead.
//!
//! ```ignore
//! actor!(CounterMsg { Inc(Inc), Dec(Dec) });
//!
//! impl Actor for Counter {
//!     type Msg = CounterMsg;
//!
//!     fn recv(&mut self, ctx: &Context<Self::Msg>, msg: CounterMsg, sender: Sender) {
//!         dispatch!(self, ctx, msg, sender, CounterMsg { Inc, Dec });
//!     }
//! }
//! ```

/// Generates a message envelope enum with one variant per receivable type,
/// plus a `From<T>` impl per variant so `actor_ref.tell(value, sender)`
/// works directly on the inner type.
#[macro_export]
macro_rules! actor {
    ($enum_name:ident { $($variant:ident($ty:ty)),+ $(,)? }) => {
        #[derive(Clone, Debug)]
        pub enum $enum_name {
            $($variant($ty)),+
        }

        $(
            impl From<$ty> for $enum_name {
                fn from(msg: $ty) -> $enum_name {
                    $enum_name::$variant(msg)
                }
            }
        )+
    };
}

/// Matches an envelope enum built by `actor!` and forwards each variant to
/// the matching `Receive<T>::receive` impl.
#[macro_export]
macro_rules! dispatch {
    ($self:expr, $ctx:expr, $msg:expr, $sender:expr, $enum_name:ident { $($variant:ident),+ $(,)? }) => {
        match $msg {
            $(
                $enum_name::$variant(m) => $crate::actor::Receive::receive($self, $ctx, m, $sender)
            ),+
        }
    };
}
