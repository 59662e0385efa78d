//! A named package reference with version/extras constraints.
//!
//! PEP 508 lines (`ipython[notebook]>=2.0`, `name @ https://…`) are parsed
//! by `pep508_rs`. The pip-only forms are handled here: bare `https://…#egg=name`
//! links and editables (`-e ./src/app`, `-e git+https://…#egg=app`).

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use miette::Diagnostic;
use pep508_rs::VersionOrUrl;
use thiserror::Error;

use crate::name::{ExtraName, InvalidNameError, PackageName};
use crate::specifier::SpecifierSet;

#[derive(Debug, Clone, Error, Diagnostic, PartialEq, Eq)]
pub enum RequirementParseError {
    #[error("Empty requirement")]
    Empty,

    #[error("Invalid requirement `{requirement}`: {message}")]
    Invalid { requirement: String, message: String },

    #[error("Unclosed extras bracket in `{0}`")]
    UnclosedExtras(String),

    #[error("Cannot determine a package name for `{0}`; add `#egg=<name>`")]
    MissingName(String),

    #[error(transparent)]
    Name(#[from] InvalidNameError),
}

/// Where a requirement is satisfied from.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum RequirementSource {
    /// Any version offered by the package index.
    #[default]
    Index,
    /// A direct URL, VCS link or local path.
    Url { url: String, editable: bool },
}

/// A single package requirement.
///
/// `parent` is a name-keyed back reference to the package whose pinned
/// version declared this requirement; roots have none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub name: PackageName,
    pub specifier: SpecifierSet,
    pub extras: BTreeSet<ExtraName>,
    pub source: RequirementSource,
    pub is_constraint: bool,
    pub parent: Option<PackageName>,
}

impl Requirement {
    /// A bare requirement on `name` admitting any version.
    pub fn new(name: PackageName) -> Self {
        Self {
            name,
            specifier: SpecifierSet::new(),
            extras: BTreeSet::new(),
            source: RequirementSource::Index,
            is_constraint: false,
            parent: None,
        }
    }

    /// Parse a requirement and mark it as a constraint.
    pub fn constraint(s: &str) -> Result<Self, RequirementParseError> {
        s.parse::<Self>().map(Self::into_constraint)
    }

    pub fn into_constraint(mut self) -> Self {
        self.is_constraint = true;
        self
    }

    pub fn with_specifier(mut self, specifier: SpecifierSet) -> Self {
        self.specifier = specifier;
        self
    }

    pub fn with_parent(mut self, parent: PackageName) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn is_editable(&self) -> bool {
        matches!(self.source, RequirementSource::Url { editable: true, .. })
    }

    pub fn has_direct_url(&self) -> bool {
        matches!(self.source, RequirementSource::Url { .. })
    }

    /// The source URL for direct and editable requirements.
    pub fn url(&self) -> Option<&str> {
        match self.source {
            RequirementSource::Url { ref url, .. } => Some(url),
            RequirementSource::Index => None,
        }
    }

    /// Pinned to exactly one index version (`name==1.0`).
    pub fn is_pinned(&self) -> bool {
        !self.has_direct_url() && self.specifier.is_pinned()
    }

    /// `-e <target>` or a bare link; the name comes from `#egg=` or, for a
    /// local editable, the directory name.
    fn parse_url(line: &str, url: &str, editable: bool) -> Result<Self, RequirementParseError> {
        let egg = url.split_once('#').and_then(|(_, fragment)| {
            fragment
                .split('&')
                .find_map(|kv| kv.strip_prefix("egg="))
        });

        let (name, extras) = match egg {
            Some(egg) => split_egg(line, egg)?,
            None if editable && is_local_path(url) => {
                let path = url.strip_prefix("file://").unwrap_or(url);
                let last = path
                    .trim_end_matches('/')
                    .rsplit('/')
                    .next()
                    .unwrap_or_default();
                (PackageName::new(last)?, BTreeSet::new())
            }
            None => return Err(RequirementParseError::MissingName(line.to_string())),
        };

        let mut req = Self::new(name);
        req.extras = extras;
        req.source = RequirementSource::Url {
            url: url.to_string(),
            editable,
        };
        Ok(req)
    }

    fn parse_pep508(line: &str) -> Result<Self, RequirementParseError> {
        let parsed = line
            .parse::<pep508_rs::Requirement>()
            .map_err(|e| RequirementParseError::Invalid {
                requirement: line.to_string(),
                message: e.to_string(),
            })?;

        // Environment markers are accepted but not evaluated.
        let mut req = Self::new(parsed.name.into());
        req.extras = parsed.extras.iter().cloned().map(ExtraName::from).collect();
        match parsed.version_or_url {
            Some(VersionOrUrl::VersionSpecifier(specifiers)) => {
                req.specifier = specifiers.iter().cloned().collect();
            }
            Some(VersionOrUrl::Url(url)) => {
                req.source = RequirementSource::Url {
                    url: url.to_string(),
                    editable: false,
                };
            }
            None => {}
        }
        Ok(req)
    }
}

impl FromStr for Requirement {
    type Err = RequirementParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let line = s.trim();
        if line.is_empty() {
            return Err(RequirementParseError::Empty);
        }

        if let Some((flag, target)) = line.split_once(char::is_whitespace) {
            if flag == "-e" || flag == "--editable" {
                return Self::parse_url(line, target.trim(), true);
            }
        }
        if looks_like_url(line) {
            return Self::parse_url(line, line, false);
        }
        Self::parse_pep508(line)
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.source {
            RequirementSource::Url {
                ref url,
                editable: true,
            } => write!(f, "-e {url}"),
            RequirementSource::Url { ref url, .. } => {
                write!(f, "{}{} @ {url}", self.name, render_extras(&self.extras))
            }
            RequirementSource::Index => write!(
                f,
                "{}{}{}",
                self.name,
                render_extras(&self.extras),
                self.specifier
            ),
        }
    }
}

/// `[a,b]` in sorted order, or nothing when there are no extras.
pub fn render_extras(extras: &BTreeSet<ExtraName>) -> String {
    if extras.is_empty() {
        return String::new();
    }
    let names: Vec<&str> = extras.iter().map(ExtraName::as_str).collect();
    format!("[{}]", names.join(","))
}

/// `name` or `name[extra,...]` from an `#egg=` fragment.
fn split_egg(
    line: &str,
    egg: &str,
) -> Result<(PackageName, BTreeSet<ExtraName>), RequirementParseError> {
    let Some((name, rest)) = egg.split_once('[') else {
        return Ok((PackageName::new(egg)?, BTreeSet::new()));
    };
    let list = rest
        .strip_suffix(']')
        .ok_or_else(|| RequirementParseError::UnclosedExtras(line.to_string()))?;
    let extras = list
        .split(',')
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(ExtraName::new)
        .collect::<Result<_, _>>()?;
    Ok((PackageName::new(name)?, extras))
}

/// A bare link: nothing but a scheme (`https`, `git+ssh`) before `://`.
fn looks_like_url(s: &str) -> bool {
    let bare_scheme = s.split_once("://").is_some_and(|(scheme, _)| {
        scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    });
    bare_scheme || is_local_path(s)
}

fn is_local_path(s: &str) -> bool {
    s.starts_with("file:") || s.starts_with('/') || s.starts_with("./") || s.starts_with("../")
}
