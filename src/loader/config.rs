/*!
 * Loader Configuration
 *
 * Runtime selection between the two hazard-resolution strategies.
 */

use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Environment variable enabling the lockless strategy process-wide.
pub const LOCKLESS_ENV_VAR: &str = "CONCURRENT_LOADER_LOCKLESS";

/// Hazard-resolution strategy selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HazardStrategy {
    /// Route re-entrant resolutions to the dedicated serializer thread
    Handoff,
    /// Fully release the held lock around the nested resolution, restore after
    Lockless,
    /// Use the process-wide default probed at startup
    Auto,
}

/// Loader configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Preferred hazard strategy
    pub strategy: HazardStrategy,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            strategy: HazardStrategy::Auto,
        }
    }
}

/// A strategy with `Auto` resolved away; what a loader actually runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ResolvedStrategy {
    Handoff,
    Lockless,
}

impl LoaderConfig {
    /// Configuration pinned to the serializer hand-off strategy.
    pub const fn handoff() -> Self {
        Self {
            strategy: HazardStrategy::Handoff,
        }
    }

    /// Configuration pinned to the forced release/reacquire strategy.
    ///
    /// Only safe when no invariant of the embedding runtime depends on
    /// uninterrupted lock possession during the release window; the host's
    /// own re-entrant callback contract is what makes the window tolerable.
    pub const fn lockless() -> Self {
        Self {
            strategy: HazardStrategy::Lockless,
        }
    }

    /// Resolve `Auto` against the process-wide default.
    pub(crate) fn resolve(&self) -> ResolvedStrategy {
        match self.strategy {
            HazardStrategy::Handoff => ResolvedStrategy::Handoff,
            HazardStrategy::Lockless => ResolvedStrategy::Lockless,
            HazardStrategy::Auto => process_default(),
        }
    }
}

/// The process-wide default strategy, probed once and immutable after.
fn process_default() -> ResolvedStrategy {
    static DEFAULT: OnceLock<ResolvedStrategy> = OnceLock::new();
    *DEFAULT.get_or_init(|| probe(std::env::var(LOCKLESS_ENV_VAR).ok().as_deref()))
}

/// Interpret the probe input: lockless only on an explicit opt-in.
fn probe(value: Option<&str>) -> ResolvedStrategy {
    let enabled = value
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false);
    if enabled {
        ResolvedStrategy::Lockless
    } else {
        ResolvedStrategy::Handoff
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_strategies_resolve_to_themselves() {
        assert_eq!(LoaderConfig::handoff().resolve(), ResolvedStrategy::Handoff);
        assert_eq!(LoaderConfig::lockless().resolve(), ResolvedStrategy::Lockless);
    }

    #[test]
    fn test_probe_accepts_common_truthy_spellings() {
        assert_eq!(probe(Some("1")), ResolvedStrategy::Lockless);
        assert_eq!(probe(Some("true")), ResolvedStrategy::Lockless);
        assert_eq!(probe(Some(" YES ")), ResolvedStrategy::Lockless);
    }

    #[test]
    fn test_probe_defaults_to_handoff() {
        assert_eq!(probe(None), ResolvedStrategy::Handoff);
        assert_eq!(probe(Some("0")), ResolvedStrategy::Handoff);
        assert_eq!(probe(Some("false")), ResolvedStrategy::Handoff);
        assert_eq!(probe(Some("maybe")), ResolvedStrategy::Handoff);
    }

    #[test]
    fn test_config_serialization() {
        let config = LoaderConfig::lockless();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: LoaderConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }
}
