//! Configuration for the enrichment pipeline.
//!
//! Numeric budgets and the heuristic word lists used by the phases live here
//! so they can be tuned per deployment instead of being hardcoded policy.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the enrichment pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    /// Ceiling for combined content handed to the extractor, in characters.
    ///
    /// Default: 250_000.
    pub content_cap: usize,

    /// Minimum characters each chunk keeps when content is trimmed.
    ///
    /// Default: 500.
    pub chunk_floor: usize,

    /// Results requested per search call. Default: 5.
    pub search_limit: usize,

    /// Discovery stops issuing fallback queries once this many results are
    /// gathered. Default: 5.
    pub discovery_target_results: usize,

    /// Maximum concurrent provider calls inside one phase. Default: 5.
    pub max_in_flight: usize,

    /// Time budget for a single provider call, in seconds. Default: 30.
    pub provider_timeout_secs: u64,

    /// Results below this confidence are dropped unless tagged as inferred.
    ///
    /// Default: 0.3.
    pub min_confidence: f64,

    /// Search snippets shorter than this are discarded. Default: 30.
    pub min_snippet_len: usize,

    /// Website content shorter than this is treated as a placeholder. Default: 200.
    pub min_website_len: usize,

    /// Prefer corroborated extraction, falling back to single pass. Default: true.
    pub corroborate: bool,

    /// Tunable keyword lists.
    pub heuristics: HeuristicLists,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            content_cap: 250_000,
            chunk_floor: 500,
            search_limit: 5,
            discovery_target_results: 5,
            max_in_flight: 5,
            provider_timeout_secs: 30,
            min_confidence: 0.3,
            min_snippet_len: 30,
            min_website_len: 200,
            corroborate: true,
            heuristics: HeuristicLists::default(),
        }
    }
}

impl EnrichmentConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the content cap.
    pub fn with_content_cap(mut self, cap: usize) -> Self {
        self.content_cap = cap;
        self
    }

    /// Set the per-chunk floor.
    pub fn with_chunk_floor(mut self, floor: usize) -> Self {
        self.chunk_floor = floor;
        self
    }

    /// Set the per-call search limit.
    pub fn with_search_limit(mut self, limit: usize) -> Self {
        self.search_limit = limit;
        self
    }

    /// Set the concurrent provider call limit (at least 1).
    pub fn with_max_in_flight(mut self, max: usize) -> Self {
        self.max_in_flight = max.max(1);
        self
    }

    /// Set the provider call timeout.
    pub fn with_provider_timeout_secs(mut self, secs: u64) -> Self {
        self.provider_timeout_secs = secs;
        self
    }

    /// Set the minimum confidence.
    pub fn with_min_confidence(mut self, min: f64) -> Self {
        self.min_confidence = min;
        self
    }

    /// Enable or disable corroborated extraction.
    pub fn with_corroboration(mut self, enabled: bool) -> Self {
        self.corroborate = enabled;
        self
    }

    /// Replace the heuristic lists.
    pub fn with_heuristics(mut self, heuristics: HeuristicLists) -> Self {
        self.heuristics = heuristics;
        self
    }

    /// Provider call timeout as a `Duration`.
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }
}

/// Heuristic word lists. Matching is case-insensitive substring matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicLists {
    /// Email providers whose domains never identify a company.
    pub personal_email_domains: Vec<String>,

    /// Phrases that mark a page as parked or placeholder content.
    pub parking_phrases: Vec<String>,

    /// At least one of these must appear for a page to count as a real site.
    pub positive_indicators: Vec<String>,

    /// Domains stripped from citation sources.
    pub social_domains: Vec<String>,

    /// Non-specific terms stripped from technology lists.
    pub generic_tech_terms: Vec<String>,

    /// Site paths fetched for leadership information.
    pub leadership_paths: Vec<String>,

    /// Titles that mark a field as an executive lookup.
    pub executive_titles: Vec<ExecutiveTitle>,

    /// Email local parts that name a mailbox role rather than a person.
    pub role_accounts: Vec<String>,

    /// Brand names whose casing cannot be derived from the domain, keyed by
    /// the domain's lowercase first label.
    pub known_companies: IndexMap<String, String>,

    /// Domain labels with more digits than this look machine-generated and
    /// yield no company-name guess. Default: 2.
    pub max_guess_digits: usize,
}

/// How senior a recognized title is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Seniority {
    CSuite,
    Founder,
    Director,
}

/// A recognized leadership title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutiveTitle {
    /// Lowercase keyword matched against field names and descriptions
    pub keyword: String,

    /// Title used in search queries
    pub title: String,

    pub seniority: Seniority,
}

impl ExecutiveTitle {
    pub fn new(keyword: &str, title: &str, seniority: Seniority) -> Self {
        Self {
            keyword: keyword.to_string(),
            title: title.to_string(),
            seniority,
        }
    }
}

impl Default for HeuristicLists {
    fn default() -> Self {
        Self {
            personal_email_domains: to_strings(&[
                "gmail.com",
                "googlemail.com",
                "yahoo.com",
                "outlook.com",
                "hotmail.com",
                "live.com",
                "msn.com",
                "aol.com",
                "icloud.com",
                "me.com",
                "mac.com",
                "protonmail.com",
                "proton.me",
                "gmx.com",
                "mail.com",
                "yandex.com",
                "zoho.com",
            ]),
            parking_phrases: to_strings(&[
                "domain for sale",
                "this domain is for sale",
                "buy this domain",
                "domain may be for sale",
                "parked domain",
                "domain parking",
                "parked free",
                "under construction",
                "coming soon",
                "404 not found",
                "page not found",
                "welcome to nginx",
                "apache2 ubuntu default page",
                "it works!",
                "default web site page",
                "hostgator",
                "godaddy",
                "sedo domain",
                "bluehost",
                "this site can't be reached",
            ]),
            positive_indicators: to_strings(&[
                "about", "product", "service", "contact", "team", "company", "we ", "our ",
            ]),
            social_domains: to_strings(&[
                "linkedin.com",
                "facebook.com",
                "twitter.com",
                "x.com",
                "instagram.com",
            ]),
            generic_tech_terms: to_strings(&[
                "website",
                "web",
                "software",
                "platform",
                "technology",
                "internet",
                "computer",
            ]),
            leadership_paths: to_strings(&["/about", "/team", "/leadership", "/about-us", "/our-team"]),
            executive_titles: default_executive_titles(),
            role_accounts: to_strings(&[
                "info", "contact", "sales", "admin", "hello", "support", "test", "team", "office",
                "mail", "help", "billing", "careers", "jobs", "hr", "marketing", "press", "noreply",
                "no-reply", "someone", "user", "webmaster", "enquiries", "inquiries",
            ]),
            known_companies: default_known_companies(),
            max_guess_digits: 2,
        }
    }
}

impl HeuristicLists {
    /// Whether the domain belongs to a personal email provider.
    pub fn is_personal_domain(&self, domain: &str) -> bool {
        let domain = domain.to_lowercase();
        self.personal_email_domains.iter().any(|d| *d == domain)
    }

    /// First parking phrase found in the text, if any.
    pub fn parking_phrase_in(&self, text: &str) -> Option<&str> {
        let lower = text.to_lowercase();
        self.parking_phrases
            .iter()
            .find(|p| lower.contains(p.as_str()))
            .map(String::as_str)
    }

    /// Whether the text contains any positive indicator.
    pub fn has_positive_indicator(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.positive_indicators.iter().any(|p| lower.contains(p.as_str()))
    }

    /// Whether the URL points at a social network.
    pub fn is_social_url(&self, url: &str) -> bool {
        let host = url::Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_lowercase()));
        match host {
            Some(host) => self
                .social_domains
                .iter()
                .any(|d| host == *d || host.ends_with(&format!(".{}", d))),
            None => {
                let lower = url.to_lowercase();
                self.social_domains.iter().any(|d| lower.contains(d.as_str()))
            }
        }
    }

    /// Brand name for a domain's first label.
    pub fn known_company_name(&self, label: &str) -> Option<&str> {
        self.known_companies.get(&label.to_lowercase()).map(String::as_str)
    }

    /// Whether an email local part (or one of its tokens) is a role mailbox.
    pub fn is_role_account(&self, token: &str) -> bool {
        let lower = token.to_lowercase();
        self.role_accounts.iter().any(|r| *r == lower)
    }

    /// Whether the technology name is too generic to keep.
    pub fn is_generic_tech(&self, term: &str) -> bool {
        let lower = term.trim().to_lowercase();
        self.generic_tech_terms.iter().any(|t| *t == lower)
    }
}

fn default_executive_titles() -> Vec<ExecutiveTitle> {
    use Seniority::*;
    vec![
        ExecutiveTitle::new("ceo", "CEO", CSuite),
        ExecutiveTitle::new("chief executive", "Chief Executive Officer", CSuite),
        ExecutiveTitle::new("cto", "CTO", CSuite),
        ExecutiveTitle::new("chief technology", "Chief Technology Officer", CSuite),
        ExecutiveTitle::new("cfo", "CFO", CSuite),
        ExecutiveTitle::new("chief financial", "Chief Financial Officer", CSuite),
        ExecutiveTitle::new("coo", "COO", CSuite),
        ExecutiveTitle::new("chief operating", "Chief Operating Officer", CSuite),
        ExecutiveTitle::new("cmo", "CMO", CSuite),
        ExecutiveTitle::new("chief marketing", "Chief Marketing Officer", CSuite),
        ExecutiveTitle::new("cpo", "CPO", CSuite),
        ExecutiveTitle::new("chief product", "Chief Product Officer", CSuite),
        ExecutiveTitle::new("president", "President", CSuite),
        ExecutiveTitle::new("founder", "Founder", Founder),
        ExecutiveTitle::new("owner", "Owner", Founder),
        ExecutiveTitle::new("director", "Director", Director),
        ExecutiveTitle::new("vp", "VP", Director),
        ExecutiveTitle::new("vice president", "Vice President", Director),
        ExecutiveTitle::new("head of", "Head of", Director),
    ]
}

fn default_known_companies() -> IndexMap<String, String> {
    [
        ("wiz", "Wiz"),
        ("github", "GitHub"),
        ("gitlab", "GitLab"),
        ("openai", "OpenAI"),
        ("anthropic", "Anthropic"),
        ("hubspot", "HubSpot"),
        ("linkedin", "LinkedIn"),
        ("youtube", "YouTube"),
        ("paypal", "PayPal"),
        ("mailchimp", "Mailchimp"),
        ("salesforce", "Salesforce"),
        ("stripe", "Stripe"),
        ("shopify", "Shopify"),
        ("mongodb", "MongoDB"),
        ("digitalocean", "DigitalOcean"),
        ("cloudflare", "Cloudflare"),
        ("datadoghq", "Datadog"),
        ("firecrawl", "Firecrawl"),
        ("ibm", "IBM"),
        ("amd", "AMD"),
        ("hp", "HP"),
        ("sap", "SAP"),
        ("aws", "AWS"),
    ]
    .into_iter()
    .map(|(label, name)| (label.to_string(), name.to_string()))
    .collect()
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
