//! A requirement resolved to one exact version or one editable source.

use std::collections::BTreeSet;
use std::fmt;

use crate::name::{ExtraName, PackageName};
use crate::requirement::{render_extras, Requirement, RequirementSource};
use crate::specifier::SpecifierSet;
use crate::version::Version;

/// What a pin resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PinTarget {
    Version(Version),
    Editable(String),
}

/// A resolved package: name, requested extras and exact target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pin {
    pub name: PackageName,
    pub extras: BTreeSet<ExtraName>,
    pub target: PinTarget,
}

impl Pin {
    pub fn version(name: PackageName, version: Version) -> Self {
        Self {
            name,
            extras: BTreeSet::new(),
            target: PinTarget::Version(version),
        }
    }

    pub fn editable(name: PackageName, url: impl Into<String>) -> Self {
        Self {
            name,
            extras: BTreeSet::new(),
            target: PinTarget::Editable(url.into()),
        }
    }

    pub fn with_extras(mut self, extras: BTreeSet<ExtraName>) -> Self {
        self.extras = extras;
        self
    }

    pub fn is_editable(&self) -> bool {
        matches!(self.target, PinTarget::Editable(_))
    }

    /// Whether this pin still satisfies `requirement`'s specifier and source.
    ///
    /// An explicitly chosen pre-release stays valid; pre-release gating only
    /// applies when picking a new candidate.
    pub fn satisfies(&self, requirement: &Requirement) -> bool {
        match (&self.target, &requirement.source) {
            (PinTarget::Version(v), RequirementSource::Index) => requirement.specifier.contains(v),
            (PinTarget::Editable(url), RequirementSource::Url { url: wanted, .. }) => url == wanted,
            _ => false,
        }
    }

    /// The pinned form as a requirement: `name[extras]==version` or the editable itself.
    pub fn as_requirement(&self) -> Requirement {
        let mut req = Requirement::new(self.name.clone());
        req.extras = self.extras.clone();
        match self.target {
            PinTarget::Version(ref v) => {
                req.specifier = SpecifierSet::exact(v.clone());
            }
            PinTarget::Editable(ref url) => {
                req.source = RequirementSource::Url {
                    url: url.clone(),
                    editable: true,
                };
            }
        }
        req
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.target {
            PinTarget::Version(ref v) => {
                write!(f, "{}{}=={v}", self.name, render_extras(&self.extras))
            }
            PinTarget::Editable(ref url) => write!(f, "-e {url}"),
        }
    }
}
