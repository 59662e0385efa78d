//! A static package index loaded from TOML.
//!
//! ```toml
//! [packages.flask."0.10.1"]
//! dependencies = ["Jinja2>=2.4", "Werkzeug>=0.7", "itsdangerous>=0.21"]
//!
//! [packages.ipython."2.1.0"]
//! dependencies = ["gnureadline"]
//! extras = { notebook = ["pyzmq>=2.1.11", "tornado>=3.1"] }
//!
//! [editables."file:///src/app"]
//! name = "app"
//! dependencies = ["flask"]
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use miette::Diagnostic;
use serde::Deserialize;
use thiserror::Error;

use pinset_core::name::{ExtraName, InvalidNameError, PackageName};
use pinset_core::pin::{Pin, PinTarget};
use pinset_core::requirement::{Requirement, RequirementParseError};
use pinset_core::version::{Version, VersionParseError};

use crate::provider::{Candidate, MetadataProvider, ProviderError};

#[derive(Debug, Error, Diagnostic)]
pub enum IndexError {
    #[error("Failed to read index {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse index: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid version for {package}: {source}")]
    Version {
        package: String,
        #[source]
        source: VersionParseError,
    },

    #[error("Invalid dependency of {package}: {source}")]
    Dependency {
        package: String,
        #[source]
        source: RequirementParseError,
    },

    #[error(transparent)]
    Name(#[from] InvalidNameError),
}

#[derive(Debug, Default, Deserialize)]
struct IndexFile {
    #[serde(default)]
    packages: BTreeMap<String, BTreeMap<String, ReleaseEntry>>,
    #[serde(default)]
    editables: BTreeMap<String, EditableEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ReleaseEntry {
    #[serde(default)]
    dependencies: Vec<String>,
    #[serde(default)]
    extras: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EditableEntry {
    name: String,
    #[serde(default)]
    dependencies: Vec<String>,
    #[serde(default)]
    extras: BTreeMap<String, Vec<String>>,
}

/// Declared metadata of one release (or one editable source).
#[derive(Debug, Clone)]
struct Release {
    version: Option<Version>,
    dependencies: Vec<Requirement>,
    extras: BTreeMap<ExtraName, Vec<Requirement>>,
}

impl Release {
    fn dependencies_for(&self, pin: &Pin) -> Vec<Requirement> {
        let mut deps = self.dependencies.clone();
        for extra in &pin.extras {
            match self.extras.get(extra) {
                Some(extra_deps) => deps.extend(extra_deps.iter().cloned()),
                None => tracing::warn!("{} does not provide the extra '{extra}'", pin.name),
            }
        }
        deps
    }
}

/// In-memory provider answering from a parsed index.
#[derive(Debug, Clone, Default)]
pub struct IndexProvider {
    packages: BTreeMap<PackageName, Vec<Release>>,
    editables: BTreeMap<String, (PackageName, Release)>,
}

impl IndexProvider {
    pub fn from_path(path: &Path) -> Result<Self, IndexError> {
        let content = std::fs::read_to_string(path).map_err(|source| IndexError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, IndexError> {
        let file: IndexFile = toml::from_str(content)?;
        let mut index = Self::default();

        for (raw_name, releases) in file.packages {
            let name = PackageName::new(&raw_name)?;
            for (raw_version, entry) in releases {
                let version =
                    raw_version.parse::<Version>().map_err(|source| IndexError::Version {
                        package: raw_name.clone(),
                        source,
                    })?;
                let label = format!("{name}=={raw_version}");
                let release = Release {
                    version: Some(version),
                    dependencies: parse_all(&label, &entry.dependencies)?,
                    extras: parse_extras(&label, entry.extras)?,
                };
                index.packages.entry(name.clone()).or_default().push(release);
            }
        }
        for releases in index.packages.values_mut() {
            releases.sort_by(|a, b| a.version.cmp(&b.version));
        }

        for (url, entry) in file.editables {
            let name = PackageName::new(&entry.name)?;
            let label = format!("-e {url}");
            let release = Release {
                version: None,
                dependencies: parse_all(&label, &entry.dependencies)?,
                extras: parse_extras(&label, entry.extras)?,
            };
            index.editables.insert(url, (name, release));
        }

        Ok(index)
    }

    /// All known versions of a package, ascending.
    pub fn versions(&self, name: &PackageName) -> Vec<&Version> {
        self.packages
            .get(name)
            .map(|releases| releases.iter().filter_map(|r| r.version.as_ref()).collect())
            .unwrap_or_default()
    }

    pub fn package_count(&self) -> usize {
        self.packages.len()
    }

    fn release(&self, pin: &Pin) -> Option<&Release> {
        match pin.target {
            PinTarget::Version(ref version) => self
                .packages
                .get(&pin.name)?
                .iter()
                .find(|r| r.version.as_ref() == Some(version)),
            PinTarget::Editable(ref url) => self.editables.get(url).map(|(_, release)| release),
        }
    }
}

impl MetadataProvider for IndexProvider {
    fn find_best_candidate(
        &self,
        requirement: &Requirement,
        prereleases: bool,
    ) -> Result<Option<Candidate>, ProviderError> {
        if requirement.has_direct_url() {
            return Ok(None);
        }
        let versions = self.versions(&requirement.name);
        Ok(requirement
            .specifier
            .select_best(versions, prereleases)
            .map(|version| Candidate {
                name: requirement.name.clone(),
                version: version.clone(),
            }))
    }

    fn get_dependencies(&self, pin: &Pin) -> Result<Vec<Requirement>, ProviderError> {
        self.release(pin)
            .map(|release| release.dependencies_for(pin))
            .ok_or_else(|| ProviderError::new(format!("{pin} is not in the index")))
    }
}

fn parse_all(label: &str, lines: &[String]) -> Result<Vec<Requirement>, IndexError> {
    lines
        .iter()
        .map(|line| {
            line.parse::<Requirement>()
                .map_err(|source| IndexError::Dependency {
                    package: label.to_string(),
                    source,
                })
        })
        .collect()
}

fn parse_extras(
    label: &str,
    extras: BTreeMap<String, Vec<String>>,
) -> Result<BTreeMap<ExtraName, Vec<Requirement>>, IndexError> {
    extras
        .into_iter()
        .map(|(extra, lines)| -> Result<_, IndexError> {
            Ok((ExtraName::new(&extra)?, parse_all(label, &lines)?))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const INDEX: &str = r#"
[packages.SQLAlchemy]
"0.9.8" = {}
"0.9.9" = {}
"1.0.0b5" = {}

[packages.ipython."2.1.0"]
dependencies = ["gnureadline"]
extras = { notebook = ["pyzmq>=2.1.11", "tornado>=3.1"], nbconvert = ["pygments"] }

[editables."file:///src/app"]
name = "app"
dependencies = ["flask"]
"#;

    fn index() -> IndexProvider {
        IndexProvider::from_toml_str(INDEX).unwrap()
    }

    fn name(s: &str) -> PackageName {
        PackageName::new(s).unwrap()
    }

    #[test]
    fn names_are_normalized_and_versions_sorted() {
        let idx = index();
        let versions: Vec<String> = idx
            .versions(&name("sqlalchemy"))
            .iter()
            .map(|v| v.to_string())
            .collect();
        assert_eq!(versions, ["0.9.8", "0.9.9", "1.0.0b5"]);
        assert_eq!(idx.package_count(), 2);
    }

    #[test]
    fn best_candidate_respects_prerelease_policy() {
        let idx = index();
        let req: Requirement = "SQLAlchemy".parse().unwrap();
        let stable = idx.find_best_candidate(&req, false).unwrap().unwrap();
        let pre = idx.find_best_candidate(&req, true).unwrap().unwrap();
        assert_eq!(stable.version.to_string(), "0.9.9");
        assert_eq!(pre.version.to_string(), "1.0.0b5");
    }

    #[test]
    fn unknown_package_has_no_candidate() {
        let req: Requirement = "nonexistent".parse().unwrap();
        assert_eq!(index().find_best_candidate(&req, false).unwrap(), None);
    }

    #[test]
    fn dependencies_include_requested_extras_only() {
        let idx = index();
        let base = Pin::version(name("ipython"), "2.1.0".parse().unwrap());
        assert_eq!(idx.get_dependencies(&base).unwrap().len(), 1);

        let notebook = base
            .clone()
            .with_extras([ExtraName::new("notebook").unwrap()].into_iter().collect());
        let deps: Vec<String> = idx
            .get_dependencies(&notebook)
            .unwrap()
            .iter()
            .map(|d| d.to_string())
            .collect();
        assert_eq!(deps, ["gnureadline", "pyzmq>=2.1.11", "tornado>=3.1"]);
    }

    #[test]
    fn editable_dependencies() {
        let pin = Pin::editable(name("app"), "file:///src/app");
        let deps = index().get_dependencies(&pin).unwrap();
        assert_eq!(deps[0].name, name("flask"));
    }

    #[test]
    fn missing_release_is_provider_error() {
        let pin = Pin::version(name("ipython"), "9.9".parse().unwrap());
        let err = index().get_dependencies(&pin).unwrap_err();
        assert_eq!(err.message, "ipython==9.9 is not in the index");
    }

    #[test]
    fn invalid_entries_fail_to_load() {
        assert!(matches!(
            IndexProvider::from_toml_str("[packages.foo.\"not-a-version\"]\n"),
            Err(IndexError::Version { .. })
        ));
        assert!(matches!(
            IndexProvider::from_toml_str("[packages.foo.\"1.0\"]\ndependencies = [\"bar>=\"]\n"),
            Err(IndexError::Dependency { .. })
        ));
    }
}
