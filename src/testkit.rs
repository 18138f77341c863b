//! Test-support probes, ported from the teacher's separate `riker-testkit`
//! crate into this crate directly (SPEC_FULL.md's ambient test tooling
//! section) rather than kept as its own workspace member, since nothing
//! else in this crate is split out that way.
//!
//! A `Probe` is handed to an actor under test (usually as its `Args` or a
//! field on a test-only message) so the actor can report events back to
//! the test thread without the test needing its own actor or mailbox.

use std::time::Instant;

pub trait Probe {
    type Msg: Send;
    type Pay: Clone + Send;

    fn event(&self, evt: Self::Msg);
    fn payload(&self) -> &Self::Pay;
}

pub trait ProbeReceive {
    type Msg: Send;

    fn recv(&self) -> Self::Msg;
    fn reset_timer(&mut self);
    fn last_event_millis(&self) -> u64;
}

/// An `std::sync::mpsc`-backed `Probe`, for use within a single process.
pub mod channel {
    use super::{Probe, ProbeReceive};
    use std::sync::mpsc::{channel, Receiver, Sender};
    use std::time::Instant;

    pub fn probe<T: Send>() -> (ChannelProbe<(), T>, ChannelProbeReceive<T>) {
        probe_with_payload(())
    }

    pub fn probe_with_payload<P: Clone + Send, T: Send>(
        payload: P,
    ) -> (ChannelProbe<P, T>, ChannelProbeReceive<T>) {
        let (tx, rx) = channel::<T>();

        let probe = ChannelProbe { payload, tx: tx.clone() };
        let receiver = ChannelProbeReceive {
            rx,
            tx,
            timer_start: Instant::now(),
        };

        (probe, receiver)
    }

    #[derive(Clone, Debug)]
    pub struct ChannelProbe<P, T> {
        payload: P,
        tx: Sender<T>,
    }

    impl<P, T> Probe for ChannelProbe<P, T>
    where
        P: Clone + Send,
        T: Send,
    {
        type Msg = T;
        type Pay = P;

        fn event(&self, evt: T) {
            let _ = self.tx.send(evt);
        }

        fn payload(&self) -> &P {
            &self.payload
        }
    }

    #[allow(dead_code)]
    pub struct ChannelProbeReceive<T> {
        rx: Receiver<T>,
        tx: Sender<T>,
        timer_start: Instant,
    }

    impl<T: Send> ProbeReceive for ChannelProbeReceive<T> {
        type Msg = T;

        fn recv(&self) -> T {
            self.rx.recv().expect("probe sender dropped without sending an event")
        }

        fn reset_timer(&mut self) {
            self.timer_start = Instant::now();
        }

        fn last_event_millis(&self) -> u64 {
            self.timer_start.elapsed().as_millis() as u64
        }
    }
}

/// Mimics `assert_eq!` against the next event received by a probe.
#[macro_export]
macro_rules! p_assert_eq {
    ($listen:expr, $expected:expr) => {
        assert_eq!($listen.recv(), $expected);
    };
}

/// Checks a probe's events against an unordered set of expected values,
/// removing each as it's matched. Panics on any event not in the expected
/// set; succeeds once the expected set is empty.
#[macro_export]
macro_rules! p_assert_events {
    ($listen:expr, $expected:expr) => {{
        let mut expected = $expected.clone();
        while !expected.is_empty() {
            let got = $listen.recv();
            match expected.iter().position(|x| x == &got) {
                Some(pos) => {
                    expected.remove(pos);
                }
                None => panic!("probe received unexpected event: {:?}", got),
            }
        }
    }};
}

#[cfg(test)]
mod tests {
    use super::channel::{probe, probe_with_payload};
    use super::{Probe, ProbeReceive};
    use std::thread;

    #[test]
    fn chan_probe() {
        let (probe, listen) = probe();

        thread::spawn(move || {
            probe.event("some event");
        });

        assert_eq!(listen.recv(), "some event");
    }

    #[test]
    fn chan_probe_with_payload() {
        let payload = "test data".to_string();
        let (probe, listen) = probe_with_payload(payload);

        thread::spawn(move || {
            if probe.payload() == "test data" {
                probe.event("data received");
            } else {
                probe.event("unexpected payload");
            }
        });

        assert_eq!(listen.recv(), "data received");
    }

    #[test]
    fn p_assert_eq_macro() {
        let (probe, listen) = probe();
        probe.event("test".to_string());
        p_assert_eq!(listen, "test".to_string());
    }

    #[test]
    fn p_assert_events_macro() {
        let (probe, listen) = probe();
        let expected = vec!["event_1", "event_2", "event_3"];
        probe.event("event_1");
        probe.event("event_2");
        probe.event("event_3");
        p_assert_events!(listen, expected);
    }
}
