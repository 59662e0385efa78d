//! Round-based resolution: merge, pin, expand, repeat until a round changes nothing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use pinset_core::config::ResolverConfig;
use pinset_core::pin::Pin;
use pinset_core::requirement::Requirement;

use crate::conflict::ConflictReport;
use crate::error::ResolveError;
use crate::merge::{group_by_name, validate};
use crate::prune::{GraphPruner, Resolution};
use crate::provider::MetadataProvider;
use crate::working_set::{NodeState, WorkingSet};

/// Resolve `roots` against `provider` with the given settings.
pub fn resolve<P: MetadataProvider>(
    provider: P,
    roots: &[Requirement],
    config: &ResolverConfig,
) -> Result<Resolution, ResolveError> {
    Resolver::new(provider, config.clone()).resolve(roots)
}

/// The fixpoint engine. Holds no state between calls to [`Resolver::resolve`].
pub struct Resolver<P> {
    provider: P,
    config: ResolverConfig,
    pruner: GraphPruner,
    cancel: Option<Arc<AtomicBool>>,
}

impl<P: MetadataProvider> Resolver<P> {
    pub fn new(provider: P, config: ResolverConfig) -> Self {
        let pruner = GraphPruner::from_config(&config);
        Self {
            provider,
            config,
            pruner,
            cancel: None,
        }
    }

    /// Stop between rounds once `flag` is set.
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Resolve root requirements (constraints included) into a pruned pin set.
    pub fn resolve(&self, roots: &[Requirement]) -> Result<Resolution, ResolveError> {
        for root in roots {
            validate(root)?;
        }

        let mut working = WorkingSet::new();
        for round in 1..=self.config.max_rounds {
            if self.is_cancelled() {
                return Err(ResolveError::Cancelled { rounds: round - 1 });
            }
            tracing::debug!("Round {round}: {} packages in working set", working.len());

            if !self.run_round(roots, &mut working)? {
                tracing::info!("Resolution converged after {round} rounds");
                let mut resolution = self.pruner.prune(roots, &working);
                resolution.rounds = round;
                return Ok(resolution);
            }
        }

        Err(ResolveError::RoundBudgetExceeded {
            rounds: self.config.max_rounds,
        })
    }

    /// Declared dependencies of a pinned or editable requirement, attributed to it.
    pub fn dependencies_of(
        &self,
        requirement: &Requirement,
    ) -> Result<Vec<Requirement>, ResolveError> {
        let pin = match (requirement.url(), requirement.specifier.pinned_version()) {
            (Some(url), _) if requirement.is_editable() => {
                Pin::editable(requirement.name.clone(), url)
            }
            (None, Some(version)) => Pin::version(requirement.name.clone(), version.clone()),
            _ => {
                return Err(ResolveError::PreconditionViolation {
                    requirement: requirement.to_string(),
                })
            }
        }
        .with_extras(requirement.extras.clone());

        let dependencies = self
            .provider
            .get_dependencies(&pin)
            .map_err(|e| ResolveError::Provider {
                package: pin.to_string(),
                message: e.message,
            })?;

        Ok(dependencies
            .into_iter()
            .map(|mut dep| {
                dep.is_constraint = false;
                dep.parent = Some(requirement.name.clone());
                dep
            })
            .collect())
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// One round. Returns whether anything changed.
    fn run_round(
        &self,
        roots: &[Requirement],
        working: &mut WorkingSet,
    ) -> Result<bool, ResolveError> {
        let produced: Vec<Requirement> = roots
            .iter()
            .chain(working.expanded_dependencies())
            .cloned()
            .collect();
        for req in &produced {
            validate(req)?;
        }

        let mut changed = working.reconcile(group_by_name(&produced));
        changed |= self.pin_unresolved(working, &produced)?;
        changed |= self.fetch_dependencies(working)?;
        Ok(changed)
    }

    fn pin_unresolved(
        &self,
        working: &mut WorkingSet,
        produced: &[Requirement],
    ) -> Result<bool, ResolveError> {
        let mut changed = false;
        for name in working.names() {
            let Some(node) = working.get_mut(&name) else {
                continue;
            };
            if matches!(node.state, NodeState::Pinned(_)) {
                continue;
            }

            let requirement = &node.requirement;
            let pin = match requirement.url() {
                Some(url) if requirement.is_editable() => Pin::editable(name.clone(), url),
                _ => {
                    let candidate = self
                        .provider
                        .find_best_candidate(requirement, self.config.prereleases)
                        .map_err(|e| ResolveError::Provider {
                            package: requirement.to_string(),
                            message: e.message,
                        })?
                        .ok_or_else(|| ResolveError::Unsatisfiable {
                            package: name.clone(),
                            specifier: requirement.specifier.clone(),
                            report: ConflictReport::for_package(&name, produced),
                        })?;
                    Pin::version(name.clone(), candidate.version)
                }
            }
            .with_extras(requirement.extras.clone());

            match node.state {
                NodeState::Invalidated(ref old) => tracing::debug!("Re-pinned {old} -> {pin}"),
                _ => tracing::debug!("Pinned {pin}"),
            }
            node.state = NodeState::Pinned(pin);
            node.dependencies = None;
            changed = true;
        }
        Ok(changed)
    }

    fn fetch_dependencies(&self, working: &mut WorkingSet) -> Result<bool, ResolveError> {
        let mut changed = false;
        for name in working.names() {
            let Some(node) = working.get_mut(&name) else {
                continue;
            };
            if !node.is_expandable() || node.dependencies.is_some() {
                continue;
            }
            let Some(pin) = node.pin() else {
                continue;
            };

            let dependencies = self.dependencies_of(&pin.as_requirement())?;
            for dep in &dependencies {
                validate(dep)?;
            }
            tracing::debug!("{pin} requires {} packages", dependencies.len());
            node.dependencies = Some(dependencies);
            changed = true;
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    use pinset_core::name::PackageName;
    use pinset_core::version::Version;

    use crate::provider::{Candidate, ProviderError};

    /// Every package exists at 1.0 with no dependencies.
    #[derive(Default)]
    struct FlatProvider {
        queries: Cell<usize>,
    }

    impl MetadataProvider for FlatProvider {
        fn find_best_candidate(
            &self,
            requirement: &Requirement,
            _prereleases: bool,
        ) -> Result<Option<Candidate>, ProviderError> {
            self.queries.set(self.queries.get() + 1);
            let version = "1.0".parse::<Version>().unwrap();
            Ok(requirement.specifier.contains(&version).then(|| Candidate {
                name: requirement.name.clone(),
                version,
            }))
        }

        fn get_dependencies(&self, _pin: &Pin) -> Result<Vec<Requirement>, ProviderError> {
            Ok(Vec::new())
        }
    }

    fn req(s: &str) -> Requirement {
        s.parse().unwrap()
    }

    #[test]
    fn single_package_converges_in_two_rounds() {
        let resolver = Resolver::new(FlatProvider::default(), ResolverConfig::default());
        let resolution = resolver.resolve(&[req("six")]).unwrap();
        assert_eq!(resolution.rounds, 2);
        assert_eq!(resolution.to_lines(), ["six==1.0"]);
    }

    #[test]
    fn empty_roots_resolve_to_nothing() {
        let resolver = Resolver::new(FlatProvider::default(), ResolverConfig::default());
        let resolution = resolver.resolve(&[]).unwrap();
        assert!(resolution.is_empty());
        assert_eq!(resolution.rounds, 1);
    }

    #[test]
    fn zero_round_budget_fails() {
        let config = ResolverConfig {
            max_rounds: 0,
            ..ResolverConfig::default()
        };
        let err = Resolver::new(FlatProvider::default(), config)
            .resolve(&[req("six")])
            .unwrap_err();
        assert!(matches!(err, ResolveError::RoundBudgetExceeded { rounds: 0 }));
    }

    #[test]
    fn editables_are_pinned_without_queries() {
        let provider = FlatProvider::default();
        let resolver = Resolver::new(&provider, ResolverConfig::default());
        let resolution = resolver.resolve(&[req("-e ./src/app")]).unwrap();
        assert_eq!(resolution.to_lines(), ["-e ./src/app"]);
        assert_eq!(provider.queries.get(), 0);
    }

    #[test]
    fn unsatisfiable_names_package() {
        let resolver = Resolver::new(FlatProvider::default(), ResolverConfig::default());
        let err = resolver.resolve(&[req("six>=2")]).unwrap_err();
        match err {
            ResolveError::Unsatisfiable { package, report, .. } => {
                assert_eq!(package, PackageName::new("six").unwrap());
                assert_eq!(report.len(), 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn preset_cancellation_stops_before_first_round() {
        let flag = Arc::new(AtomicBool::new(true));
        let resolver = Resolver::new(FlatProvider::default(), ResolverConfig::default())
            .with_cancellation(flag);
        let err = resolver.resolve(&[req("six")]).unwrap_err();
        assert!(matches!(err, ResolveError::Cancelled { rounds: 0 }));
    }

    #[test]
    fn dependencies_of_requires_pin() {
        let resolver = Resolver::new(FlatProvider::default(), ResolverConfig::default());
        let err = resolver.dependencies_of(&req("django>=1.8")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Expected pinned or editable requirement, got django>=1.8"
        );
        assert!(resolver.dependencies_of(&req("django==1.8")).is_ok());
    }
}
