//! The six topical phases of the pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One topical stage of the enrichment pipeline.
///
/// Declaration order is execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Discovery,
    Profile,
    Metrics,
    Funding,
    TechStack,
    General,
}

impl Phase {
    /// All phases in execution order.
    pub const ALL: [Phase; 6] = [
        Phase::Discovery,
        Phase::Profile,
        Phase::Metrics,
        Phase::Funding,
        Phase::TechStack,
        Phase::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Discovery => "discovery",
            Self::Profile => "profile",
            Self::Metrics => "metrics",
            Self::Funding => "funding",
            Self::TechStack => "techStack",
            Self::General => "general",
        }
    }

    /// Human-readable label for progress messages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Discovery => "Company discovery",
            Self::Profile => "Company profile",
            Self::Metrics => "Business metrics",
            Self::Funding => "Funding",
            Self::TechStack => "Tech stack",
            Self::General => "Additional fields",
        }
    }

    /// Whether the phase needs a resolved company name before searching.
    pub fn requires_company_name(&self) -> bool {
        !matches!(self, Self::Discovery | Self::TechStack)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
