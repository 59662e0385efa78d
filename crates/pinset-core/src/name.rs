//! Normalized package and extra names.
//!
//! Normalization is delegated to `pep508_rs`: lowercased, with every run of
//! `-`, `_` and `.` collapsed to a single `-`.

use std::fmt;
use std::str::FromStr;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Clone, Error, Diagnostic, PartialEq, Eq)]
#[error("Invalid name `{0}`: names may only contain letters, digits, `-`, `_` and `.`")]
pub struct InvalidNameError(pub String);

/// A package identifier in canonical form, so `Flask`, `flask` and `FLASK`
/// (or `foo_bar`, `Foo.Bar`, `foo-bar`) are the same package.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackageName(pep508_rs::PackageName);

/// The name of an optional feature set of a package, normalized like [`PackageName`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExtraName(pep508_rs::ExtraName);

impl PackageName {
    pub fn new(name: &str) -> Result<Self, InvalidNameError> {
        name.trim()
            .parse::<pep508_rs::PackageName>()
            .map(Self)
            .map_err(|_| InvalidNameError(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_ref()
    }
}

impl ExtraName {
    pub fn new(name: &str) -> Result<Self, InvalidNameError> {
        name.trim()
            .parse::<pep508_rs::ExtraName>()
            .map(Self)
            .map_err(|_| InvalidNameError(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_ref()
    }
}

impl From<pep508_rs::PackageName> for PackageName {
    fn from(name: pep508_rs::PackageName) -> Self {
        Self(name)
    }
}

impl From<pep508_rs::ExtraName> for ExtraName {
    fn from(name: pep508_rs::ExtraName) -> Self {
        Self(name)
    }
}

impl FromStr for PackageName {
    type Err = InvalidNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl FromStr for ExtraName {
    type Err = InvalidNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ExtraName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for PackageName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
