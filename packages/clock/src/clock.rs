//! Time sources for the tracker.
use std::cell::RefCell;
use std::time::Duration;

use anomos_tracker_primitives::DurationSinceUnixEpoch;

/// A source of "now", measured as a duration since the Unix epoch.
pub trait Time: Sized {
    /// The current time.
    fn now() -> DurationSinceUnixEpoch;

    /// The current time plus `add`, or `None` on overflow.
    #[must_use]
    fn now_add(add: &Duration) -> Option<DurationSinceUnixEpoch> {
        Self::now().checked_add(*add)
    }

    /// The current time minus `sub`, or `None` on underflow.
    #[must_use]
    fn now_sub(sub: &Duration) -> Option<DurationSinceUnixEpoch> {
        Self::now().checked_sub(*sub)
    }
}

/// The production clock, backed by the system time.
pub struct Working;

impl Time for Working {
    fn now() -> DurationSinceUnixEpoch {
        let now = chrono::Utc::now();
        let secs = u64::try_from(now.timestamp()).unwrap_or_default();
        Duration::new(secs, now.timestamp_subsec_nanos())
    }
}

/// A clock frozen at a settable instant, for tests.
///
/// The fixed time is thread-local, so parallel tests do not interfere with
/// each other. It starts at the Unix epoch.
pub struct Stopped;

thread_local! {
    static FIXED_TIME: RefCell<DurationSinceUnixEpoch> = const { RefCell::new(Duration::ZERO) };
}

impl Time for Stopped {
    fn now() -> DurationSinceUnixEpoch {
        FIXED_TIME.with(|fixed| *fixed.borrow())
    }
}

pub mod stopped {
    //! Controls for the [`Stopped`](super::Stopped) clock.
    use std::time::Duration;

    use anomos_tracker_primitives::DurationSinceUnixEpoch;

    use super::FIXED_TIME;

    /// Operations only the stopped clock supports.
    pub trait Stopped: super::Time {
        /// Pins the clock at `time`.
        fn local_set(time: &DurationSinceUnixEpoch);

        /// Resets the clock to the Unix epoch.
        fn local_reset();

        /// Moves the clock forward by `add`.
        ///
        /// # Errors
        ///
        /// Returns an error if the addition overflows.
        fn local_add(add: &Duration) -> Result<(), AdvanceError>;
    }

    /// Error raised when advancing the stopped clock overflows.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct AdvanceError;

    impl Stopped for super::Stopped {
        fn local_set(time: &DurationSinceUnixEpoch) {
            FIXED_TIME.with(|fixed| *fixed.borrow_mut() = *time);
        }

        fn local_reset() {
            Self::local_set(&Duration::ZERO);
        }

        fn local_add(add: &Duration) -> Result<(), AdvanceError> {
            FIXED_TIME.with(|fixed| {
                let mut fixed = fixed.borrow_mut();
                *fixed = fixed.checked_add(*add).ok_or(AdvanceError)?;
                Ok(())
            })
        }
    }
}
