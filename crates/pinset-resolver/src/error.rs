//! Failures of a resolve call.

use miette::Diagnostic;
use thiserror::Error;

use pinset_core::name::PackageName;
use pinset_core::specifier::SpecifierSet;

use crate::conflict::ConflictReport;

/// Every way a resolve call can fail. All of them abort the whole call.
#[derive(Debug, Error, Diagnostic)]
pub enum ResolveError {
    /// A root or discovered requirement points at a non-editable URL or VCS source.
    #[error("URLs are not supported as packages, got {requirement}")]
    #[diagnostic(
        code(pinset::unsupported_constraint),
        help("Use an editable requirement (`-e <url>`) or a package index version instead")
    )]
    UnsupportedConstraint { requirement: String },

    /// No candidate satisfies the merged specifier of a package.
    #[error("Could not find a version that matches {package}{specifier}\n{report}")]
    #[diagnostic(code(pinset::unsatisfiable))]
    Unsatisfiable {
        package: PackageName,
        specifier: SpecifierSet,
        report: ConflictReport,
    },

    /// No fixed point was reached within the round budget.
    #[error(
        "No stable configuration of concrete packages could be found for the given constraints after {rounds} rounds of resolving."
    )]
    #[diagnostic(
        code(pinset::round_budget_exceeded),
        help("Raise `max-rounds` if the requirements are still converging")
    )]
    RoundBudgetExceeded { rounds: usize },

    /// Dependencies were requested for a requirement without a concrete version
    /// or editable source. This is a caller bug, not a resolution failure.
    #[error("Expected pinned or editable requirement, got {requirement}")]
    #[diagnostic(code(pinset::precondition))]
    PreconditionViolation { requirement: String },

    /// The metadata provider failed to answer a query.
    #[error("Metadata lookup failed for {package}: {message}")]
    #[diagnostic(code(pinset::provider))]
    Provider { package: String, message: String },

    /// The caller's cancellation flag was observed between rounds.
    #[error("Resolution cancelled after {rounds} rounds")]
    #[diagnostic(code(pinset::cancelled))]
    Cancelled { rounds: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_budget_message_names_rounds() {
        let err = ResolveError::RoundBudgetExceeded { rounds: 0 };
        assert!(err.to_string().contains("after 0 rounds of resolving"));
    }

    #[test]
    fn unsatisfiable_message_names_package_and_specifier() {
        let err = ResolveError::Unsatisfiable {
            package: PackageName::new("Django").unwrap(),
            specifier: ">=9000".parse().unwrap(),
            report: ConflictReport::new(),
        };
        assert!(err
            .to_string()
            .starts_with("Could not find a version that matches django>=9000"));
    }
}
