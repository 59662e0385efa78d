use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

use crate::name::PackageName;

/// Default number of rounds before resolution gives up.
pub const DEFAULT_MAX_ROUNDS: usize = 10;

/// Build and packaging tooling that is left out of pinned output by default.
pub const DEFAULT_UNSAFE_PACKAGES: [&str; 3] = ["distribute", "pip", "setuptools"];

/// Project configuration loaded from `pinset.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PinsetConfig {
    #[serde(default)]
    pub resolver: ResolverConfig,
}

/// Resolver settings from the `[resolver]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ResolverConfig {
    /// Consider pre-releases even when a final release satisfies a requirement.
    #[serde(default)]
    pub prereleases: bool,
    /// Keep unsafe packages in the output.
    #[serde(default)]
    pub allow_unsafe: bool,
    #[serde(default = "default_max_rounds")]
    pub max_rounds: usize,
    #[serde(default = "default_unsafe_packages")]
    pub unsafe_packages: Vec<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            prereleases: false,
            allow_unsafe: false,
            max_rounds: default_max_rounds(),
            unsafe_packages: default_unsafe_packages(),
        }
    }
}

fn default_max_rounds() -> usize {
    DEFAULT_MAX_ROUNDS
}

fn default_unsafe_packages() -> Vec<String> {
    DEFAULT_UNSAFE_PACKAGES.iter().map(|s| s.to_string()).collect()
}

impl ResolverConfig {
    /// The unsafe package list in normalized form.
    ///
    /// Entries that are not valid package names are skipped with a warning.
    pub fn unsafe_package_names(&self) -> BTreeSet<PackageName> {
        self.unsafe_packages
            .iter()
            .filter_map(|raw| match PackageName::new(raw) {
                Ok(name) => Some(name),
                Err(e) => {
                    tracing::warn!("Ignoring unsafe-packages entry: {e}");
                    None
                }
            })
            .collect()
    }
}

impl PinsetConfig {
    /// Load and parse a `pinset.toml` file from the given path.
    pub fn from_path(path: &Path) -> miette::Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| pinset_util::errors::PinsetError::Config {
                message: format!("Failed to read {}: {e}", path.display()),
            })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> miette::Result<Self> {
        toml::from_str(content).map_err(|e| {
            pinset_util::errors::PinsetError::Config {
                message: format!("Failed to parse config: {e}"),
            }
            .into()
        })
    }

    /// Load `pinset.toml` if present, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.is_file() {
            return Self::default();
        }
        match Self::from_path(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load {}, using defaults: {e}", path.display());
                Self::default()
            }
        }
    }
}
