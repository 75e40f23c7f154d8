//! Building blocks shared by the phases.
//!
//! - Field classification (which phase handles which field)
//! - Content budgeting (proportional trimming under a size cap)
//! - Fallback chains (ordered strategies with early exit)
//! - Evidence gathering (bounded concurrent provider calls)
//! - Citation post-processing
//! - Website heuristics (parking detection, name/description extraction)

pub mod budget;
pub mod citations;
pub mod classify;
pub mod fallback;
pub mod gather;
pub mod website;

pub use budget::{cap_content, join_within_budget, trim_proportionally, CHUNK_SEPARATOR};
pub use citations::{attach_snippet_citations, enforce_github_integrity, strip_social_sources};
pub use classify::{classify, phase_for, ClassifiedFields};
pub use fallback::{FallbackChain, FallbackOutcome};
pub use gather::{content_blocks, dedupe_by_url, Gatherer};
pub use website::{extract_company_name, extract_description, validate_site, NameSource, SiteValidation};
