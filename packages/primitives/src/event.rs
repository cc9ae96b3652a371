//! The lifecycle event a peer reports in an announce request.
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// The event carried by an announce request.
///
/// A regular keep-alive announce carries no event at all, represented here
/// by [`AnnounceEvent::None`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AnnounceEvent {
    /// The peer has just joined the swarm.
    Started,

    /// The peer finished downloading and is now seeding.
    Completed,

    /// The peer is leaving; the tracker drops it from the overlay.
    Stopped,

    /// A periodic reannounce with no state change.
    #[default]
    None,
}

impl FromStr for AnnounceEvent {
    type Err = InvalidEventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "started" => Ok(Self::Started),
            "completed" => Ok(Self::Completed),
            "stopped" => Ok(Self::Stopped),
            "" => Ok(Self::None),
            other => Err(InvalidEventError::UnknownEvent { event: other.to_owned() }),
        }
    }
}

impl fmt::Display for AnnounceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Started => "started",
            Self::Completed => "completed",
            Self::Stopped => "stopped",
            Self::None => "none",
        };
        write!(f, "{s}")
    }
}

/// Error raised when an announce carries an event outside the protocol set.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidEventError {
    #[error("invalid event: {event}")]
    UnknownEvent { event: String },
}

#[cfg(test)]
mod tests {

    mod the_announce_event {
        use std::str::FromStr;

        use crate::event::AnnounceEvent;

        #[test]
        fn it_should_parse_the_three_protocol_events() {
            assert_eq!(AnnounceEvent::from_str("started").unwrap(), AnnounceEvent::Started);
            assert_eq!(AnnounceEvent::from_str("completed").unwrap(), AnnounceEvent::Completed);
            assert_eq!(AnnounceEvent::from_str("stopped").unwrap(), AnnounceEvent::Stopped);
        }

        #[test]
        fn an_empty_value_should_mean_no_event() {
            assert_eq!(AnnounceEvent::from_str("").unwrap(), AnnounceEvent::None);
        }

        #[test]
        fn it_should_reject_anything_else() {
            assert!(AnnounceEvent::from_str("paused").is_err());
        }
    }
}
