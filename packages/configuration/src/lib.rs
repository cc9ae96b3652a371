//! Configuration for the Anomos tracker.
//!
//! The configuration is loaded from a [TOML](https://toml.io/en/) file, from
//! an environment variable holding the same TOML content, or from individual
//! `ANOMOS_TRACKER__`-prefixed environment variable overrides. Keys the
//! tracker does not know are rejected at load time.
//!
//! When no configuration is provided at all, the defaults below apply. They
//! mirror the long-standing tracker defaults:
//!
//! ```toml
//! [logging]
//! threshold = "info"
//!
//! [http_tracker]
//! bind = "0.0.0.0"
//! port = 80
//!
//! [core]
//! reannounce_interval = 1800
//! response_size = 50
//! max_give = 200
//! nat_check = 3
//! socket_timeout = 15
//! timeout_downloaders_interval = 2700
//! save_dfile_interval = 300
//! dfile = "./tracker.dfile"
//! parse_dir_interval = 60
//! keep_dead = false
//! scrape_allowed = "full"
//! only_local_override_ip = 2
//! max_path_len = 20
//! data_dir = "."
//! num_neighbors = 4
//! msg_len = 4096
//! allow_get = false
//! show_names = true
//! ```
pub mod v1;

use std::path::PathBuf;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use thiserror::Error;

pub use crate::v1::core::{Core, OverrideIpPolicy, ScrapePolicy};
pub use crate::v1::http_tracker::{HttpTracker, Tsl};
pub use crate::v1::logging::{Logging, Threshold};
pub use crate::v1::Configuration;

/// Environment variable holding the whole configuration as inline TOML.
pub const ENV_VAR_CONFIG_TOML: &str = "ANOMOS_TRACKER_CONFIG_TOML";

/// Prefix for individual configuration overrides via the environment.
const ENV_VAR_PREFIX: &str = "ANOMOS_TRACKER__";

/// How many tracking codes the tracker hands out per announce.
pub const TRACKING_CODES_PER_ANNOUNCE: usize = 3;

/// The minimum number of hops every tracking-code path must have.
pub const MIN_TRACKING_HOPS: usize = 3;

/// Where the configuration should be loaded from.
#[derive(Debug, Default, Clone)]
pub struct Info {
    /// The whole configuration as inline TOML (takes precedence).
    pub config_toml: Option<String>,

    /// Path of the TOML configuration file.
    pub config_toml_path: Option<PathBuf>,
}

impl Info {
    /// Builds the load instructions from the environment and an optional
    /// file path.
    #[must_use]
    pub fn from_env_and_path(config_toml_path: Option<PathBuf>) -> Self {
        Self {
            config_toml: std::env::var(ENV_VAR_CONFIG_TOML).ok(),
            config_toml_path,
        }
    }
}

/// Errors raised while loading or validating the configuration.
#[derive(Error, Debug)]
pub enum Error {
    #[error("unable to load configuration: {source}")]
    UnableToLoad {
        #[from]
        source: figment::Error,
    },

    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

impl Configuration {
    /// Loads the configuration, layering defaults, the TOML source and
    /// environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML cannot be parsed or contains unknown
    /// keys.
    pub fn load(info: &Info) -> Result<Self, Error> {
        let figment = Figment::from(Serialized::defaults(Self::default()));

        let figment = if let Some(toml) = &info.config_toml {
            figment.merge(Toml::string(toml))
        } else if let Some(path) = &info.config_toml_path {
            figment.merge(Toml::file(path))
        } else {
            figment
        };

        let figment = figment.merge(Env::prefixed(ENV_VAR_PREFIX).split("__"));

        let configuration: Self = figment.extract()?;

        Ok(configuration)
    }

    /// Checks constraints that the type system cannot express.
    ///
    /// # Errors
    ///
    /// Returns an error naming the offending key.
    pub fn validate(&self) -> Result<(), Error> {
        if self.core.msg_len < 512 {
            return Err(Error::Invalid {
                message: format!("msg_len {} is too small to hold an onion", self.core.msg_len),
            });
        }

        if self.core.max_path_len < MIN_TRACKING_HOPS {
            return Err(Error::Invalid {
                message: format!(
                    "max_path_len {} cannot satisfy the {MIN_TRACKING_HOPS}-hop floor",
                    self.core.max_path_len
                ),
            });
        }

        if self.core.num_neighbors == 0 {
            return Err(Error::Invalid {
                message: "num_neighbors must be at least 1".to_owned(),
            });
        }

        if self.core.allowed_dir.is_none() && self.core.allow_get {
            return Err(Error::Invalid {
                message: "allow_get requires allowed_dir".to_owned(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {

    mod loading_the_configuration {
        use figment::Jail;

        use crate::{Configuration, Info};

        #[test]
        fn it_should_fall_back_to_the_defaults_when_no_source_is_given() {
            let configuration = Configuration::load(&Info::default()).unwrap();

            assert_eq!(configuration, Configuration::default());
        }

        #[test]
        fn it_should_load_values_from_inline_toml() {
            let info = Info {
                config_toml: Some(
                    r#"
                    [core]
                    reannounce_interval = 60
                    "#
                    .to_owned(),
                ),
                config_toml_path: None,
            };

            let configuration = Configuration::load(&info).unwrap();

            assert_eq!(configuration.core.reannounce_interval, 60);
        }

        #[test]
        fn it_should_reject_unknown_keys() {
            let info = Info {
                config_toml: Some(
                    r#"
                    [core]
                    no_such_option = true
                    "#
                    .to_owned(),
                ),
                config_toml_path: None,
            };

            assert!(Configuration::load(&info).is_err());
        }

        #[test]
        fn it_should_allow_overriding_values_from_the_environment() {
            Jail::expect_with(|jail| {
                jail.set_env("ANOMOS_TRACKER__CORE__MAX_GIVE", "99");

                let configuration = Configuration::load(&Info::default()).expect("configuration should load");

                assert_eq!(configuration.core.max_give, 99);

                Ok(())
            });
        }
    }

    mod validating_the_configuration {
        use crate::Configuration;

        #[test]
        fn it_should_accept_the_defaults() {
            assert!(Configuration::default().validate().is_ok());
        }

        #[test]
        fn it_should_reject_an_undersized_message_length() {
            let mut configuration = Configuration::default();
            configuration.core.msg_len = 100;

            assert!(configuration.validate().is_err());
        }

        #[test]
        fn it_should_reject_a_path_cap_below_the_hop_floor() {
            let mut configuration = Configuration::default();
            configuration.core.max_path_len = 2;

            assert!(configuration.validate().is_err());
        }

        #[test]
        fn it_should_reject_allow_get_without_an_allowed_dir() {
            let mut configuration = Configuration::default();
            configuration.core.allow_get = true;
            configuration.core.allowed_dir = None;

            assert!(configuration.validate().is_err());
        }
    }
}
