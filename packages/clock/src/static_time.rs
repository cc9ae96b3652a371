//! Values fixed once at process start.
use std::time::SystemTime;

lazy_static::lazy_static! {
    /// The wall-clock time at which the tracker process started.
    pub static ref TIME_AT_APP_START: SystemTime = SystemTime::now();
}
