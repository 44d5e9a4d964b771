//! Pieces shared by every jamkick crate.
//!
//! Right now this is only the logging setup in [`observability`]; binaries and
//! integration tests call [`observability::init_logging`] once at startup so
//! that every component writes into the same rolling file sink.
//!
//! ```rust
//! use jamkick_common::observability::{LogConfig, LogFormat};
//!
//! let cfg = LogConfig {
//!     format: LogFormat::Json,
//!     ..LogConfig::default()
//! };
//! assert_eq!(cfg.app_name, "jamkick");
//! assert_eq!(cfg.default_filter, "info");
//! ```

pub mod observability;
