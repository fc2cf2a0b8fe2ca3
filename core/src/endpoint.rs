//! Region selection and endpoint composition.

use std::fmt;
use std::str::FromStr;

pub const US_BASE: &str = "https://api.example.com";
pub const EU_BASE: &str = "https://api.eu.example.com";

/// Which deployment of the service to talk to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Region {
    #[default]
    Us,
    Eu,
    /// A full base URL, e.g. a self-hosted or mock deployment.
    Custom(String),
}

impl Region {
    pub fn base_url(&self) -> &str {
        match self {
            Region::Us => US_BASE,
            Region::Eu => EU_BASE,
            Region::Custom(base) => base.trim_end_matches('/'),
        }
    }
}

impl From<&str> for Region {
    fn from(s: &str) -> Self {
        match s {
            "" | "us" | "US" => Region::Us,
            "eu" | "EU" => Region::Eu,
            other => Region::Custom(other.to_string()),
        }
    }
}

impl FromStr for Region {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Region::from(s))
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Region::Us => f.write_str("US"),
            Region::Eu => f.write_str("EU"),
            Region::Custom(base) => f.write_str(base),
        }
    }
}

/// The resolved URL of one façade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    root: String,
}

impl Endpoint {
    /// `path` is the façade's fixed sub-path; the document scan façade lives
    /// at the root and passes `""`.
    pub fn new(region: &Region, path: &str) -> Self {
        Self {
            root: format!("{}/{path}", region.base_url()),
        }
    }

    /// URL of the façade itself.
    pub fn url(&self) -> &str {
        &self.root
    }

    /// URL of an action below the façade.
    pub fn action(&self, action: &str) -> String {
        format!("{}/{action}", self.root.trim_end_matches('/'))
    }
}
