//! Email parsing - the per-row identity every phase starts from.

use serde::{Deserialize, Serialize};

use super::config::HeuristicLists;
use crate::error::{EnrichmentError, Result};

/// Identity derived from a row's email address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailContext {
    pub email: String,

    /// Everything after `@`, lowercased
    pub domain: String,

    /// `domain` unless it belongs to a personal email provider
    pub company_domain: Option<String>,

    /// Person's name parsed from the local part
    pub personal_name: Option<String>,

    /// Company name guessed from the domain
    pub company_name_guess: Option<String>,

    pub is_personal_email: bool,
}

impl EmailContext {
    /// Domain without its top-level suffix, e.g. `acme` for `acme.co.uk`.
    pub fn domain_stem(&self) -> &str {
        first_label(&self.domain)
    }
}

/// Parse an email address into an [`EmailContext`].
pub fn parse_email(email: &str, lists: &HeuristicLists) -> Result<EmailContext> {
    let email = email.trim();
    let (local, domain) = email
        .rsplit_once('@')
        .filter(|(local, domain)| !local.is_empty() && domain.contains('.') && !domain.ends_with('.'))
        .ok_or_else(|| EnrichmentError::InvalidEmail {
            email: email.to_string(),
        })?;

    let domain = domain.to_lowercase();
    let is_personal_email = lists.is_personal_domain(&domain);
    let company_domain = (!is_personal_email).then(|| domain.clone());
    let company_name_guess = if is_personal_email {
        None
    } else {
        guess_company_name(&domain, lists)
    };

    Ok(EmailContext {
        email: email.to_string(),
        personal_name: parse_personal_name(local, lists),
        company_name_guess,
        company_domain,
        is_personal_email,
        domain,
    })
}

fn first_label(domain: &str) -> &str {
    let domain = domain.strip_prefix("www.").unwrap_or(domain);
    domain.split('.').next().unwrap_or(domain)
}

/// Company name guessed from a domain's first label.
///
/// Labels shorter than two characters, or with more digits than
/// `lists.max_guess_digits`, look machine-generated and yield nothing.
pub fn guess_company_name(domain: &str, lists: &HeuristicLists) -> Option<String> {
    let label = first_label(domain);
    if let Some(known) = lists.known_company_name(label) {
        return Some(known.to_string());
    }
    let digits = label.chars().filter(|c| c.is_ascii_digit()).count();
    if label.chars().count() < 2 || digits > lists.max_guess_digits {
        return None;
    }
    Some(title_case(&label.replace(['-', '_'], " ")))
}

/// Capitalize the domain's first label, using the known-company table when it matches.
pub fn capitalize_domain(domain: &str, lists: &HeuristicLists) -> String {
    let label = first_label(domain);
    lists
        .known_company_name(label)
        .map(str::to_string)
        .unwrap_or_else(|| title_case(&label.replace(['-', '_'], " ")))
}

fn parse_personal_name(local: &str, lists: &HeuristicLists) -> Option<String> {
    let local = local.split('+').next().unwrap_or(local);
    let tokens: Vec<&str> = local
        .split(['.', '_', '-'])
        .filter(|t| !t.is_empty())
        .collect();

    let alphabetic: Vec<&str> = tokens
        .iter()
        .copied()
        .filter(|t| t.chars().all(|c| c.is_alphabetic()))
        .collect();

    match alphabetic.as_slice() {
        [] => None,
        [single] => {
            if single.chars().count() < 2 || lists.is_role_account(single) {
                None
            } else {
                Some(title_case(single))
            }
        }
        many => {
            if many.iter().any(|t| lists.is_role_account(t)) {
                return None;
            }
            Some(
                many.iter()
                    .map(|t| title_case(t))
                    .collect::<Vec<_>>()
                    .join(" "),
            )
        }
    }
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(email: &str) -> EmailContext {
        parse_email(email, &HeuristicLists::default()).unwrap()
    }

    #[test]
    fn test_company_email() {
        let ctx = parse("info@wiz.io");
        assert_eq!(ctx.domain, "wiz.io");
        assert_eq!(ctx.company_domain.as_deref(), Some("wiz.io"));
        assert_eq!(ctx.company_name_guess.as_deref(), Some("Wiz"));
        assert_eq!(ctx.personal_name, None);
        assert!(!ctx.is_personal_email);
    }

    #[test]
    fn test_personal_email_has_no_company_domain() {
        let ctx = parse("test@gmail.com");
        assert!(ctx.is_personal_email);
        assert_eq!(ctx.company_domain, None);
        assert_eq!(ctx.company_name_guess, None);
    }

    #[test]
    fn test_personal_name_from_local_part() {
        assert_eq!(parse("jane.doe@acme.com").personal_name.as_deref(), Some("Jane Doe"));
        assert_eq!(parse("JOHN_SMITH@acme.com").personal_name.as_deref(), Some("John Smith"));
        assert_eq!(parse("maria@acme.com").personal_name.as_deref(), Some("Maria"));
        assert_eq!(parse("sales@acme.com").personal_name, None);
    }

    #[test]
    fn test_generated_looking_domain_has_no_guess() {
        let ctx = parse("someone@nonexistent-domain-xyz123.com");
        assert_eq!(ctx.company_name_guess, None);
        assert_eq!(ctx.company_domain.as_deref(), Some("nonexistent-domain-xyz123.com"));
    }

    #[test]
    fn test_hyphenated_domain_guess() {
        let lists = HeuristicLists::default();
        assert_eq!(guess_company_name("blue-bottle.com", &lists).as_deref(), Some("Blue Bottle"));
        assert_eq!(capitalize_domain("www.acme.co.uk", &lists), "Acme");
        assert_eq!(capitalize_domain("github.com", &lists), "GitHub");
    }

    #[test]
    fn test_digit_threshold_is_configurable() {
        let mut lists = HeuristicLists::default();
        assert_eq!(guess_company_name("3m.com", &lists).as_deref(), Some("3m"));
        assert_eq!(guess_company_name("web2024.com", &lists), None);

        lists.max_guess_digits = 4;
        assert_eq!(guess_company_name("web2024.com", &lists).as_deref(), Some("Web2024"));
    }

    #[test]
    fn test_role_accounts_come_from_config() {
        let mut lists = HeuristicLists::default();
        let parse_with =
            |lists: &HeuristicLists| parse_email("ops@acme.com", lists).unwrap().personal_name;
        assert_eq!(parse_with(&lists).as_deref(), Some("Ops"));

        lists.role_accounts.push("ops".into());
        assert_eq!(parse_with(&lists), None);
    }

    #[test]
    fn test_invalid_emails_rejected() {
        let lists = HeuristicLists::default();
        assert!(parse_email("not-an-email", &lists).is_err());
        assert!(parse_email("@acme.com", &lists).is_err());
        assert!(parse_email("bob@localhost", &lists).is_err());
    }
}
