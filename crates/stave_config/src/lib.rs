//! Parsing and validation of `stave.toml` query-session configuration.
//!
//! A session configuration selects the analysis corner, the min/max
//! direction, how many paths a query may return, and which optional path
//! parts (unconstrained paths, capture clock paths, clock network prefixes)
//! are included. The defaults apply when the file or a field is absent.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, CONFIG_FILE_NAME};
pub use types::{SessionConfig, StaveConfig, DEFAULT_MAX_PATH_COUNT};
