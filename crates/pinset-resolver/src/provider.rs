//! The metadata capability the resolver queries.
//!
//! Fetching candidate lists from an index, building source distributions
//! and caching metadata on disk all live behind this trait.

use pinset_core::name::PackageName;
use pinset_core::pin::Pin;
use pinset_core::requirement::Requirement;
use pinset_core::version::Version;
use thiserror::Error;

/// The best matching version of a package for one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub name: PackageName,
    pub version: Version,
}

/// A failed provider query (network, build or lookup failure).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ProviderError {
    pub message: String,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub trait MetadataProvider {
    /// Best candidate for `requirement` under the pre-release policy, or
    /// `None` when nothing satisfies its specifier.
    fn find_best_candidate(
        &self,
        requirement: &Requirement,
        prereleases: bool,
    ) -> Result<Option<Candidate>, ProviderError>;

    /// Declared dependencies of exactly `pin`: the base dependencies plus
    /// those of every extra in `pin.extras` the candidate provides.
    fn get_dependencies(&self, pin: &Pin) -> Result<Vec<Requirement>, ProviderError>;
}

impl<P: MetadataProvider + ?Sized> MetadataProvider for &P {
    fn find_best_candidate(
        &self,
        requirement: &Requirement,
        prereleases: bool,
    ) -> Result<Option<Candidate>, ProviderError> {
        (**self).find_best_candidate(requirement, prereleases)
    }

    fn get_dependencies(&self, pin: &Pin) -> Result<Vec<Requirement>, ProviderError> {
        (**self).get_dependencies(pin)
    }
}
