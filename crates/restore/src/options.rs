use serde::Deserialize;

/// Store configuration.
///
/// Deserializable so it can be embedded in an application's own config file;
/// missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreOptions {
    /// Keep navigated nodes in the store's cache. When `false`, every
    /// navigation builds a fresh node and node identity is not preserved.
    pub cache_nodes: bool,
    /// Anchor pattern subscriptions at both ends of the path string. When
    /// `false`, a pattern fires if it matches any part of the path.
    pub anchor_patterns: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            cache_nodes: true,
            anchor_patterns: true,
        }
    }
}
