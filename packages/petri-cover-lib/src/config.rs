use petri_cover_macros::config;
use serde::{Deserialize, Serialize};

use crate::logger::LogLevel;

pub trait IntoOr<T> {
    fn into_or(self, or: T) -> T;
}

impl<T> IntoOr<Option<T>> for Option<T> {
    fn into_or(self, or: Option<T>) -> Option<T> {
        match self {
            Some(t) => Some(t),
            None => or,
        }
    }
}

impl<T> IntoOr<T> for Option<T> {
    fn into_or(self, or: T) -> T {
        self.unwrap_or(or)
    }
}

/// Settings shared by every config that drives a run.
pub trait GeneralConfig {
    fn logger(&self) -> &LoggerConfig;
}

config! {
    pub struct LoggerConfig {
        enabled: bool = false,
        log_file: bool = false,
        log_level: LogLevel = LogLevel::Warn,
    }
}

/// Which markings a freshly created tree node is compared against when
/// deciding whether to stop expanding it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PruningPolicy {
    /// Only the markings on the path from the root to the new node's parent.
    /// This is the classical Karp-Miller check.
    #[default]
    AncestorOnly,
    /// Every marking already present anywhere in the tree. Prunes more, but
    /// may hide alternative paths that lead to an already seen marking.
    GlobalSeen,
}

config! {
    /// Settings for building a coverability tree.
    pub struct CoverabilityConfig {
        pruning: PruningPolicy = PruningPolicy::AncestorOnly,
        /// Abort once the tree holds more than this many nodes.
        max_nodes: Option<u64> = None,
        timeout: Option<std::time::Duration> = None,
        logger: LoggerConfig (Option<PartialLoggerConfig> = LoggerConfig::default()),
    }
}

impl GeneralConfig for CoverabilityConfig {
    fn logger(&self) -> &LoggerConfig {
        &self.logger
    }
}

#[test]
fn test_partial_config_from_toml() {
    let config = CoverabilityConfig::from_toml_str(
        r#"
        pruning = "GlobalSeen"
        max_nodes = 500

        [logger]
        log_level = "Debug"
        "#,
    )
    .unwrap();

    assert_eq!(*config.get_pruning(), PruningPolicy::GlobalSeen);
    assert_eq!(*config.get_max_nodes(), Some(500));
    assert_eq!(*config.get_timeout(), None);
    assert_eq!(*config.logger().get_log_level(), LogLevel::Debug);
    assert!(!*config.logger().get_enabled());
}

#[test]
fn test_empty_config_is_default() {
    let config = CoverabilityConfig::from_toml_str("").unwrap();
    assert_eq!(config, CoverabilityConfig::default());
}
