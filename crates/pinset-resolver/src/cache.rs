//! Memoizing wrapper around a [`MetadataProvider`].
//!
//! Dependency lists are cached by candidate identity (name, target and
//! requested extras), so re-validating the same pin across rounds costs one
//! provider call.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashMap};

use pinset_core::name::{ExtraName, PackageName};
use pinset_core::pin::{Pin, PinTarget};
use pinset_core::requirement::Requirement;

use crate::provider::{Candidate, MetadataProvider, ProviderError};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CandidateKey {
    name: PackageName,
    target: String,
    extras: BTreeSet<ExtraName>,
}

impl From<&Pin> for CandidateKey {
    fn from(pin: &Pin) -> Self {
        let target = match pin.target {
            PinTarget::Version(ref v) => v.to_string(),
            PinTarget::Editable(ref url) => format!("-e {url}"),
        };
        Self {
            name: pin.name.clone(),
            target,
            extras: pin.extras.clone(),
        }
    }
}

/// Single-threaded dependency cache in front of another provider.
#[derive(Debug)]
pub struct CachingProvider<P> {
    inner: P,
    dependencies: RefCell<HashMap<CandidateKey, Vec<Requirement>>>,
    hits: Cell<usize>,
    misses: Cell<usize>,
}

impl<P: MetadataProvider> CachingProvider<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            dependencies: RefCell::new(HashMap::new()),
            hits: Cell::new(0),
            misses: Cell::new(0),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn hits(&self) -> usize {
        self.hits.get()
    }

    pub fn misses(&self) -> usize {
        self.misses.get()
    }
}

impl<P: MetadataProvider> MetadataProvider for CachingProvider<P> {
    fn find_best_candidate(
        &self,
        requirement: &Requirement,
        prereleases: bool,
    ) -> Result<Option<Candidate>, ProviderError> {
        self.inner.find_best_candidate(requirement, prereleases)
    }

    fn get_dependencies(&self, pin: &Pin) -> Result<Vec<Requirement>, ProviderError> {
        let key = CandidateKey::from(pin);
        if let Some(deps) = self.dependencies.borrow().get(&key) {
            self.hits.set(self.hits.get() + 1);
            tracing::trace!("Dependency cache hit for {pin}");
            return Ok(deps.clone());
        }

        self.misses.set(self.misses.get() + 1);
        let deps = self.inner.get_dependencies(pin)?;
        self.dependencies.borrow_mut().insert(key, deps.clone());
        Ok(deps)
    }
}
