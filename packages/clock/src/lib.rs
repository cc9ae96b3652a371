//! A clock for the Anomos tracker.
//!
//! Peer records carry `last_seen`/`last_modified` timestamps and the idle
//! sweeper compares them against a cutoff. To keep those code paths testable
//! without sleeping, the tracker never reads the system time directly: it
//! goes through one of two interchangeable clocks.
//!
//! - [`clock::Working`]: the production clock, backed by the system time.
//! - [`clock::Stopped`]: a clock frozen at a settable instant, for tests.
//!
//! Each crate aliases one of them as its `CurrentClock` depending on whether
//! it is compiled for tests.
pub mod clock;
pub mod static_time;

#[cfg(test)]
mod tests {

    mod the_working_clock {
        use crate::clock::{Time, Working};

        #[test]
        fn it_should_return_a_time_after_the_unix_epoch() {
            assert!(Working::now().as_secs() > 0);
        }
    }

    mod the_stopped_clock {
        use std::time::Duration;

        use crate::clock::stopped::Stopped as _;
        use crate::clock::{Stopped, Time};

        #[test]
        fn it_should_return_the_time_it_was_set_to() {
            Stopped::local_set(&Duration::from_secs(100));

            assert_eq!(Stopped::now(), Duration::from_secs(100));
        }

        #[test]
        fn it_should_advance_when_time_is_added() {
            Stopped::local_set(&Duration::from_secs(100));

            Stopped::local_add(&Duration::from_secs(50)).unwrap();

            assert_eq!(Stopped::now(), Duration::from_secs(150));
        }

        #[test]
        fn it_should_subtract_a_duration_from_the_fixed_time() {
            Stopped::local_set(&Duration::from_secs(100));

            assert_eq!(Stopped::now_sub(&Duration::from_secs(40)), Some(Duration::from_secs(60)));
        }
    }
}
