//! Configuration types deserialized from `stave.toml`.

use serde::{Deserialize, Serialize};

/// Number of paths a query returns when `max_path_count` is not configured.
pub const DEFAULT_MAX_PATH_COUNT: usize = 1000;

/// The top-level configuration parsed from `stave.toml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct StaveConfig {
    /// Query-session settings.
    #[serde(default)]
    pub session: SessionConfig,
}

/// Mutable settings of one path-query session.
///
/// Each query facade owns one of these; callers change it between queries
/// rather than relying on process-wide analysis settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Name of the analysis corner. `None` selects the engine's default corner.
    pub corner: Option<String>,
    /// Analyze the max (setup) direction when `true`, min (hold) otherwise.
    pub use_max: bool,
    /// Maximum number of paths a single query returns.
    pub max_path_count: usize,
    /// Keep paths that have no timing constraint.
    pub include_unconstrained_paths: bool,
    /// Also populate the capture clock path of each result.
    pub include_capture_paths: bool,
    /// Emit the clock network stages as a prefix of each path.
    pub clock_expanded: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            corner: None,
            use_max: true,
            max_path_count: DEFAULT_MAX_PATH_COUNT,
            include_unconstrained_paths: false,
            include_capture_paths: false,
            clock_expanded: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_defaults() {
        let session = SessionConfig::default();
        assert_eq!(session.corner, None);
        assert!(session.use_max);
        assert_eq!(session.max_path_count, DEFAULT_MAX_PATH_COUNT);
        assert!(!session.include_unconstrained_paths);
        assert!(!session.include_capture_paths);
        assert!(session.clock_expanded);
    }

    #[test]
    fn partial_table_keeps_other_defaults() {
        let config: StaveConfig = toml::from_str("[session]\nuse_max = false\n").unwrap();
        assert!(!config.session.use_max);
        assert_eq!(config.session.max_path_count, DEFAULT_MAX_PATH_COUNT);
        assert!(config.session.clock_expanded);
    }

    #[test]
    fn toml_roundtrip() {
        let config = StaveConfig {
            session: SessionConfig {
                corner: Some("ss_0p72v_125c".into()),
                max_path_count: 5,
                ..SessionConfig::default()
            },
        };
        let text = toml::to_string(&config).unwrap();
        let back: StaveConfig = toml::from_str(&text).unwrap();
        assert_eq!(back, config);
    }
}
