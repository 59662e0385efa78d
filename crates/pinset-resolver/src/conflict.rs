//! Reporting of the requirements that together admit no candidate.

use std::fmt;

use pinset_core::name::PackageName;
use pinset_core::requirement::Requirement;

/// Every requirement that contributed to an unsatisfiable package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConflictReport {
    pub sources: Vec<SpecifierSource>,
}

/// One contributing requirement and who asked for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecifierSource {
    pub requirement: String,
    /// `None` for top-level requirements.
    pub required_by: Option<PackageName>,
    pub is_constraint: bool,
}

impl From<&Requirement> for SpecifierSource {
    fn from(req: &Requirement) -> Self {
        Self {
            requirement: req.to_string(),
            required_by: req.parent.clone(),
            is_constraint: req.is_constraint,
        }
    }
}

impl ConflictReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect the requirements on `name` from everything produced in a round.
    pub fn for_package<'a, I>(name: &PackageName, produced: I) -> Self
    where
        I: IntoIterator<Item = &'a Requirement>,
    {
        let mut sources: Vec<SpecifierSource> = produced
            .into_iter()
            .filter(|req| &req.name == name)
            .map(SpecifierSource::from)
            .collect();
        sources.sort_by(|a, b| {
            (&a.required_by, &a.requirement).cmp(&(&b.required_by, &b.requirement))
        });
        sources.dedup();
        Self { sources }
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }
}

impl fmt::Display for ConflictReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.sources.is_empty() {
            return write!(f, "No requirements recorded.");
        }
        write!(f, "Requested by ({}):", self.sources.len())?;
        for s in &self.sources {
            write!(f, "\n  {s}")?;
        }
        Ok(())
    }
}

impl fmt::Display for SpecifierSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let origin = match self.required_by {
            Some(ref parent) => parent.as_str(),
            None => "<root>",
        };
        write!(f, "{} (from {origin}", self.requirement)?;
        if self.is_constraint {
            write!(f, ", constraint")?;
        }
        write!(f, ")")
    }
}
