//! Placement configuration.
//!
//! ```toml
//! completion = "require_all"
//! seed = 42
//! output_dir = "./placement-results"
//!
//! [selection]
//! per_level_min = 2
//! per_level_max = 3
//!
//! [[thresholds]]
//! level = "A1"
//! min_score = 0.0
//! # ... one row per level
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::assessment::CompletionPolicy;
use crate::engine::EngineConfig;
use crate::scoring::LevelThresholds;
use crate::selection::SelectionConfig;

/// Top-level placement configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacementConfig {
    /// Per-level sampling bounds.
    #[serde(default)]
    pub selection: SelectionConfig,
    /// Score-to-level mapping.
    #[serde(default)]
    pub thresholds: LevelThresholds,
    /// Whether completion needs every question answered.
    #[serde(default)]
    pub completion: CompletionPolicy,
    /// Fixed RNG seed for reproducible selection.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Where interactive runs save their reports when no directory is given
    /// on the command line. Reports are not saved if this is unset too.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            selection: SelectionConfig::default(),
            thresholds: LevelThresholds::default(),
            completion: CompletionPolicy::default(),
            seed: None,
            output_dir: None,
        }
    }
}

impl PlacementConfig {
    /// The engine-facing subset of this configuration.
    pub fn to_engine_config(&self) -> EngineConfig {
        EngineConfig {
            selection: self.selection,
            thresholds: self.thresholds.clone(),
            completion: self.completion,
            seed: self.seed,
        }
    }

    /// Parse a config from TOML text without touching the environment.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: PlacementConfig = toml::from_str(content)?;
        config.selection.validate()?;
        Ok(config)
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `placement.toml` in the current directory
/// 2. `~/.config/placement/config.toml`
///
/// Environment variable overrides: `PLACEMENT_SEED`, `PLACEMENT_COMPLETION`,
/// `PLACEMENT_PER_LEVEL_MIN`, `PLACEMENT_PER_LEVEL_MAX`.
pub fn load_config() -> Result<PlacementConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<PlacementConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("placement.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            tracing::debug!("loading config from {}", path.display());
            toml::from_str::<PlacementConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => PlacementConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    config.selection.validate()?;

    Ok(config)
}

/// Apply `PLACEMENT_*` overrides using `lookup` to read variables.
fn apply_env_overrides(
    config: &mut PlacementConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<()> {
    if let Some(seed) = lookup("PLACEMENT_SEED") {
        config.seed = Some(
            seed.trim()
                .parse()
                .with_context(|| format!("PLACEMENT_SEED is not an integer: {seed}"))?,
        );
    }

    if let Some(policy) = lookup("PLACEMENT_COMPLETION") {
        config.completion = match policy.trim() {
            "require_all" => CompletionPolicy::RequireAll,
            "allow_partial" => CompletionPolicy::AllowPartial,
            other => anyhow::bail!(
                "PLACEMENT_COMPLETION must be require_all or allow_partial, got {other}"
            ),
        };
    }

    if let Some(min) = lookup("PLACEMENT_PER_LEVEL_MIN") {
        config.selection.per_level_min = min
            .trim()
            .parse()
            .with_context(|| format!("PLACEMENT_PER_LEVEL_MIN is not an integer: {min}"))?;
    }

    if let Some(max) = lookup("PLACEMENT_PER_LEVEL_MAX") {
        config.selection.per_level_max = max
            .trim()
            .parse()
            .with_context(|| format!("PLACEMENT_PER_LEVEL_MAX is not an integer: {max}"))?;
    }

    Ok(())
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("placement"))
}
