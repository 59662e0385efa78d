//! Version specifier sets (`>=2,<3`, `==1.8`, `~=1.4.2`, `!=1.5.*`) and their
//! intersection.
//!
//! Clause parsing and matching come from `pep440_rs`; a set is kept in a
//! canonical order so equal sets render identically however they were built.

use std::fmt;
use std::str::FromStr;

use miette::Diagnostic;
use pep440_rs::{Operator, VersionSpecifier, VersionSpecifiers};
use thiserror::Error;

use crate::version::Version;

#[derive(Debug, Clone, Error, Diagnostic, PartialEq, Eq)]
#[error("Invalid specifier `{input}`: {message}")]
pub struct SpecifierParseError {
    pub input: String,
    pub message: String,
}

/// A conjunction of clauses. The empty set admits every version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecifierSet(VersionSpecifiers);

impl Default for SpecifierSet {
    fn default() -> Self {
        Self::from_iter(std::iter::empty())
    }
}

impl SpecifierSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// `==version`.
    pub fn exact(version: Version) -> Self {
        Self::from_iter([VersionSpecifier::equals_version(version)])
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().next().is_none()
    }

    pub fn len(&self) -> usize {
        self.0.iter().count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VersionSpecifier> {
        self.0.iter()
    }

    /// Whether `version` satisfies every clause.
    ///
    /// Pre-release gating is not applied here; see [`SpecifierSet::select_best`].
    pub fn contains(&self, version: &Version) -> bool {
        self.iter().all(|clause| clause.contains(version))
    }

    /// Symbolic intersection: the union of both clause sets.
    ///
    /// Never fails; an empty result range only shows up when no candidate
    /// satisfies it.
    pub fn intersect(&self, other: &SpecifierSet) -> SpecifierSet {
        self.iter().chain(other.iter()).cloned().collect()
    }

    /// True iff the set is a single exact `==`/`===` clause.
    pub fn is_pinned(&self) -> bool {
        self.pinned_version().is_some()
    }

    /// The version of a pinned set.
    pub fn pinned_version(&self) -> Option<&Version> {
        let mut clauses = self.iter();
        match (clauses.next(), clauses.next()) {
            (Some(clause), None)
                if matches!(clause.operator(), Operator::Equal | Operator::ExactEqual) =>
            {
                Some(clause.version())
            }
            _ => None,
        }
    }

    /// Pick the highest version satisfying the set.
    ///
    /// Final releases win over pre-releases unless `prereleases` is set;
    /// pre-releases are still picked when no final release satisfies the set.
    pub fn select_best<'a, I>(&self, versions: I, prereleases: bool) -> Option<&'a Version>
    where
        I: IntoIterator<Item = &'a Version>,
    {
        let (pre, finals): (Vec<&Version>, Vec<&Version>) = versions
            .into_iter()
            .filter(|v| self.contains(v))
            .partition(|v| v.any_prerelease());

        let best_final = finals.into_iter().max();
        if prereleases {
            best_final.into_iter().chain(pre).max()
        } else {
            best_final.or_else(|| pre.into_iter().max())
        }
    }
}

/// Display position of an operator: `~=`, `==`, `===`, `!=`, `>=`, `>`, `<=`, `<`.
fn operator_rank(operator: &Operator) -> u8 {
    match operator {
        Operator::TildeEqual => 0,
        Operator::Equal | Operator::EqualStar => 1,
        Operator::ExactEqual => 2,
        Operator::NotEqual | Operator::NotEqualStar => 3,
        Operator::GreaterThanEqual => 4,
        Operator::GreaterThan => 5,
        Operator::LessThanEqual => 6,
        Operator::LessThan => 7,
    }
}

fn is_wildcard(operator: &Operator) -> bool {
    matches!(operator, Operator::EqualStar | Operator::NotEqualStar)
}

impl FromIterator<VersionSpecifier> for SpecifierSet {
    /// Sorts clauses and drops duplicates. Of two equal clauses spelled
    /// differently (`==1.0`, `==1.0.0`) the shorter spelling is kept.
    fn from_iter<T: IntoIterator<Item = VersionSpecifier>>(iter: T) -> Self {
        let mut clauses: Vec<VersionSpecifier> = iter.into_iter().collect();
        clauses.sort_by_cached_key(|c| {
            (
                operator_rank(c.operator()),
                c.version().clone(),
                is_wildcard(c.operator()),
                c.to_string(),
            )
        });
        clauses.dedup_by(|a, b| a.operator() == b.operator() && a.version() == b.version());
        Self(clauses.into_iter().collect())
    }
}

impl FromStr for SpecifierSet {
    type Err = SpecifierParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<VersionSpecifier>()
                    .map_err(|e| SpecifierParseError {
                        input: part.to_string(),
                        message: e.to_string(),
                    })
            })
            .collect()
    }
}

impl fmt::Display for SpecifierSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(ToString::to_string).collect();
        f.write_str(&parts.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        s.parse().unwrap()
    }

    fn set(s: &str) -> SpecifierSet {
        s.parse().unwrap()
    }

    #[test]
    fn range_contains() {
        let range = set(">=2,<3");
        assert!(range.contains(&v("2.0")));
        assert!(range.contains(&v("2.9.9")));
        assert!(!range.contains(&v("3.0")));
        assert!(!range.contains(&v("1.9")));
    }

    #[test]
    fn less_than_excludes_prerelease_of_bound() {
        assert!(!set("<2.0").contains(&v("2.0a1")));
        assert!(set("<2.0").contains(&v("1.9")));
    }

    #[test]
    fn wildcard_and_compatible_release() {
        assert!(set("==1.4.*").contains(&v("1.4.9")));
        assert!(!set("!=1.4.*").contains(&v("1.4.2")));
        assert!(set("~=1.4.2").contains(&v("1.4.9")));
        assert!(!set("~=1.4.2").contains(&v("1.5.0")));
    }

    #[test]
    fn intersection_is_union_of_clauses() {
        let merged = set(">=1.4.6").intersect(&set(">=1.4.9,<2.0"));
        assert_eq!(merged.len(), 3);
        assert!(merged.contains(&v("1.4.9")));
        assert!(!merged.contains(&v("2.1.4")));
        assert_eq!(merged, set("<2.0,>=1.4.9").intersect(&set(">=1.4.6")));
    }

    #[test]
    fn intersection_renders_the_same_in_either_order() {
        let a = set("==1.0");
        let b = set("==1.0.0");
        assert_eq!(a.intersect(&b).to_string(), "==1.0");
        assert_eq!(b.intersect(&a).to_string(), "==1.0");
        assert_eq!(a.intersect(&b).len(), 1);
    }

    #[test]
    fn display_is_sorted() {
        assert_eq!(set("<3.1, >=3.0.34").to_string(), ">=3.0.34,<3.1");
        assert_eq!(set("!=1.5.*,==1.5.*,~=1.4").to_string(), "~=1.4,==1.5.*,!=1.5.*");
        assert_eq!(set("").to_string(), "");
        assert!(set("").is_empty());
    }

    #[test]
    fn pinned_detection() {
        assert!(set("==1.8").is_pinned());
        assert_eq!(set("==1.8").pinned_version(), Some(&v("1.8")));
        assert_eq!(SpecifierSet::exact(v("1.8")), set("==1.8"));
        assert!(!set(">=1.8").is_pinned());
        assert!(!set("==1.*").is_pinned());
        assert!(!set("==1.8,!=1.9").is_pinned());
    }

    #[test]
    fn select_best_prefers_final_release() {
        let versions = [v("0.9.8"), v("0.9.9"), v("1.0.0b5")];
        let any = SpecifierSet::new();
        assert_eq!(any.select_best(&versions, false), Some(&v("0.9.9")));
        assert_eq!(any.select_best(&versions, true), Some(&v("1.0.0b5")));
    }

    #[test]
    fn select_best_falls_back_to_prerelease() {
        let versions = [v("0.9.9"), v("1.0.0b5")];
        assert_eq!(
            set(">=1.0.0b1").select_best(&versions, false),
            Some(&v("1.0.0b5"))
        );
        assert_eq!(set(">=2").select_best(&versions, true), None);
    }

    #[test]
    fn parse_errors_name_the_clause() {
        let err = ">=2,1.0".parse::<SpecifierSet>().unwrap_err();
        assert_eq!(err.input, "1.0");
        assert!(">=1.*".parse::<SpecifierSet>().is_err());
        assert!("~=1".parse::<SpecifierSet>().is_err());
        assert!(">=banana".parse::<SpecifierSet>().is_err());
    }
}
