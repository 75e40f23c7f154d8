//! Heuristics over a company's own website content.
//!
//! Pages are first checked for parking/placeholder signs. Valid pages yield a
//! company name and a short description without calling the extractor.

use lazy_static::lazy_static;
use regex::Regex;

use crate::types::config::HeuristicLists;
use crate::types::email::capitalize_domain;

lazy_static! {
    static ref SITE_NAME: Regex =
        Regex::new(r#"(?i)og:site_name["']?\s*(?:content\s*=\s*|:\s*)?["']?([^"'<>\n]{2,60})"#).unwrap();
    static ref WELCOME_TO: Regex =
        Regex::new(r"\b(?i:welcome to) ([A-Z][\w&.\-]*(?:\s+[A-Z][\w&.\-]*){0,3})").unwrap();
    static ref ABOUT_NAME: Regex =
        Regex::new(r"(?m)^#*\s*About ([A-Z][\w&.\-]*(?:\s+[A-Z][\w&.\-]*){0,3})\s*$").unwrap();
    static ref COPYRIGHT: Regex =
        Regex::new(r"(?:©|\(c\)|Copyright)\s*(?:\d{4}\s*(?:[-–]\s*\d{4})?\s*)?([A-Z][\w&.\-]*(?:\s+[A-Z][\w&.\-]*){0,3})").unwrap();
    static ref META_DESCRIPTION: Regex = Regex::new(
        r#"(?i)(?:name=["']description["']\s+content=["']|og:description["']?\s*(?:content\s*=\s*)?["']|^description:\s*)([^"'\n]{20,400})"#
    )
    .unwrap();
    static ref SECTION_HEADING: Regex =
        Regex::new(r"(?i)^#*\s*(?:about(?: us)?|our mission|mission|what we do|who we are)\s*:?\s*$").unwrap();
}

/// Words that end a captured company name.
const NAME_STOPWORDS: &[&str] = &["All", "Rights", "Reserved", "Inc", "LLC", "Ltd", "Home", "Our"];

/// Outcome of checking fetched page content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiteValidation {
    Valid,
    TooShort { len: usize },
    Parked { phrase: String },
    NoIndicators,
}

impl SiteValidation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Check whether page content looks like a real company website.
pub fn validate_site(text: &str, lists: &HeuristicLists, min_len: usize) -> SiteValidation {
    let len = text.trim().chars().count();
    if len < min_len {
        return SiteValidation::TooShort { len };
    }
    if let Some(phrase) = lists.parking_phrase_in(text) {
        return SiteValidation::Parked {
            phrase: phrase.to_string(),
        };
    }
    if !lists.has_positive_indicator(text) {
        return SiteValidation::NoIndicators;
    }
    SiteValidation::Valid
}

/// Where a company name came from, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NameSource {
    KnownCompany,
    SiteName,
    Pattern,
    Title,
    Domain,
}

impl NameSource {
    /// Confidence for a name found on a validated site.
    pub fn confidence(&self) -> f64 {
        match self {
            Self::KnownCompany => 0.95,
            Self::SiteName => 0.92,
            Self::Pattern => 0.88,
            Self::Title => 0.85,
            Self::Domain => 0.6,
        }
    }
}

/// Company name from site content, by priority.
pub fn extract_company_name(
    text: &str,
    title: Option<&str>,
    domain: &str,
    lists: &HeuristicLists,
) -> (String, NameSource) {
    let label = domain
        .strip_prefix("www.")
        .unwrap_or(domain)
        .split('.')
        .next()
        .unwrap_or(domain);

    if let Some(known) = lists.known_company_name(label) {
        return (known.to_string(), NameSource::KnownCompany);
    }
    if let Some(name) = first_capture(&SITE_NAME, text) {
        return (name, NameSource::SiteName);
    }
    for pattern in [&*WELCOME_TO, &*ABOUT_NAME, &*COPYRIGHT] {
        if let Some(name) = first_capture(pattern, text) {
            return (name, NameSource::Pattern);
        }
    }
    if let Some(name) = title.and_then(|t| name_from_title(t, label)) {
        return (name, NameSource::Title);
    }
    (capitalize_domain(domain, lists), NameSource::Domain)
}

fn first_capture(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|m| clean_name(m.as_str())))
        .find(|name| !name.is_empty())
}

fn clean_name(raw: &str) -> String {
    let mut words: Vec<&str> = Vec::new();
    for word in raw.split_whitespace() {
        let bare = word.trim_matches(|c: char| c == ',' || c == '.' || c == '|');
        if bare.is_empty() || NAME_STOPWORDS.contains(&bare) {
            break;
        }
        words.push(bare);
        if word.ends_with(',') || word.ends_with('|') {
            break;
        }
    }
    words.join(" ")
}

/// Pick the title segment that names the company.
///
/// Titles look like "Acme | Cloud Tools" or "Home - Acme". The segment that
/// resembles the domain wins; otherwise the shortest segment.
fn name_from_title(title: &str, label: &str) -> Option<String> {
    let segments: Vec<&str> = title
        .split(['|', '–', '—', ':'])
        .flat_map(|s| s.split(" - "))
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("home"))
        .collect();

    let squashed_label = label.replace('-', "").to_lowercase();
    segments
        .iter()
        .find(|s| s.to_lowercase().replace([' ', '-'], "").contains(&squashed_label))
        .or_else(|| segments.iter().min_by_key(|s| s.len()))
        .map(|s| s.to_string())
}

/// Short description from site content.
///
/// Tries a meta-description marker, then the paragraph under an
/// About/Mission/What We Do heading, then the first substantive paragraph.
pub fn extract_description(text: &str) -> Option<String> {
    if let Some(caps) = META_DESCRIPTION.captures(text) {
        if let Some(m) = caps.get(1) {
            return Some(m.as_str().trim().to_string());
        }
    }

    let paragraphs: Vec<&str> = text
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    let after_heading = paragraphs
        .windows(2)
        .find(|pair| SECTION_HEADING.is_match(pair[0]) && is_substantive(pair[1]))
        .map(|pair| pair[1]);

    after_heading
        .or_else(|| paragraphs.iter().copied().find(|p| is_substantive(p)))
        .map(|p| truncate_sentence(p, 500))
}

fn is_substantive(paragraph: &str) -> bool {
    paragraph.chars().count() > 50
        && !paragraph.starts_with('#')
        && !paragraph.starts_with('[')
        && !paragraph.starts_with('!')
        && paragraph.split_whitespace().count() >= 6
}

fn truncate_sentence(text: &str, max: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match collapsed.char_indices().nth(max) {
        Some((idx, _)) => {
            let head = &collapsed[..idx];
            match head.rfind(". ") {
                Some(end) => head[..=end].to_string(),
                None => format!("{}...", head),
            }
        }
        None => collapsed,
    }
}
