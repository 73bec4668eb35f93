//! Email and site domain rules.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

static VALID_EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("email pattern should compile")
});

/// Second-level labels registries sell under a country code (`.com.br`).
const GENERIC_SECOND_LEVEL: &[&str] = &[
    "com", "net", "org", "gov", "edu", "adv", "art", "ind", "inf", "leilao", "mil", "co", "ac",
];

/// Personal webmail domains, matched on label boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainPolicy {
    personal: Vec<String>,
}

impl DomainPolicy {
    pub fn new(personal: &[String]) -> Self {
        Self {
            personal: personal
                .iter()
                .map(|d| d.trim().trim_start_matches('.').to_lowercase())
                .filter(|d| !d.is_empty())
                .collect(),
        }
    }

    /// Whether `domain` is, or is a subdomain of, a personal webmail domain.
    pub fn is_personal_domain(&self, domain: &str) -> bool {
        let domain = domain.trim().trim_end_matches('.').to_lowercase();
        let domain = domain.strip_prefix("www.").unwrap_or(&domain);
        self.personal.iter().any(|p| {
            domain == p
                || domain
                    .strip_suffix(p.as_str())
                    .is_some_and(|rest| rest.ends_with('.'))
        })
    }

    /// An email whose domain is not personal webmail.
    pub fn is_corporate_email(&self, email: &str) -> bool {
        is_valid_email(email) && email_domain(email).is_some_and(|d| !self.is_personal_domain(d))
    }

    /// Site derived from a corporate email, e.g. `contato@x.com.br` gives
    /// `https://www.x.com.br`. `None` for personal or malformed addresses.
    pub fn site_from_email(&self, email: &str) -> Option<String> {
        let domain = email_domain(email)?.to_lowercase();
        if self.is_personal_domain(&domain) {
            return None;
        }
        Some(format!("https://www.{}", registrable_domain(&domain)?))
    }

    /// Normalize a site: add a scheme when missing, drop it when it does not
    /// parse to a host or points at webmail.
    pub fn clean_site(&self, site: &str) -> Option<String> {
        let site = site.trim();
        if site.is_empty() {
            return None;
        }
        let candidate = if site.contains("://") {
            site.to_string()
        } else {
            format!("https://{}", site)
        };
        let host = site_host(&candidate)?;
        if self.is_personal_domain(&host) {
            tracing::debug!("Dropping webmail site {}", site);
            return None;
        }
        Some(candidate)
    }

    /// Host of a site that is present, parseable and not personal webmail.
    pub fn business_host(&self, site: &str) -> Option<String> {
        site_host(site).filter(|h| !self.is_personal_domain(h))
    }
}

/// Whether `email` is a single well-formed address.
pub fn is_valid_email(email: &str) -> bool {
    VALID_EMAIL.is_match(email.trim())
}

/// Domain part of an email address.
pub fn email_domain(email: &str) -> Option<&str> {
    let (local, domain) = email.trim().rsplit_once('@')?;
    let domain = domain.trim_end_matches('.');
    (!local.is_empty() && domain.contains('.')).then_some(domain)
}

/// Host of an http(s) URL, if it has one.
pub fn site_host(site: &str) -> Option<String> {
    let url = Url::parse(site.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    let host = url.host_str()?.to_lowercase();
    host.contains('.').then_some(host)
}

/// Last two labels, or last three under a `generic.cc` suffix.
fn registrable_domain(domain: &str) -> Option<String> {
    let labels: Vec<&str> = domain.split('.').filter(|l| !l.is_empty()).collect();
    if labels.len() < 2 {
        return None;
    }
    let tld = labels[labels.len() - 1];
    let second = labels[labels.len() - 2];
    let keep = if labels.len() >= 3
        && tld.len() == 2
        && tld.chars().all(|c| c.is_ascii_alphabetic())
        && GENERIC_SECOND_LEVEL.contains(&second)
    {
        3
    } else {
        2
    };
    Some(labels[labels.len() - keep..].join("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EnrichmentConfig;

    fn policy() -> DomainPolicy {
        DomainPolicy::new(&EnrichmentConfig::default().personal_domains)
    }

    #[test]
    fn test_personal_domains_on_label_boundaries() {
        let p = policy();
        assert!(p.is_personal_domain("gmail.com"));
        assert!(p.is_personal_domain("GMAIL.COM"));
        assert!(p.is_personal_domain("mail.uol.com.br"));
        assert!(p.is_personal_domain("yahoo.com.br"));
        assert!(!p.is_personal_domain("notgmail.com"));
        assert!(!p.is_personal_domain("zukleiloes.com.br"));
    }

    #[test]
    fn test_corporate_email() {
        let p = policy();
        assert!(p.is_corporate_email("contato@zukleiloes.com.br"));
        assert!(!p.is_corporate_email("fulano@hotmail.com"));
        assert!(!p.is_corporate_email("not-an-email"));
        assert!(!p.is_corporate_email("nao informado @ x.com"));
    }

    #[test]
    fn test_valid_email() {
        assert!(is_valid_email("contato@zukleiloes.com.br"));
        assert!(is_valid_email("  ana.lima+leiloes@lima.com.br "));
        assert!(!is_valid_email("nao informado"));
        assert!(!is_valid_email("ana@lima"));
        assert!(!is_valid_email("a@b.com c@d.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_site_from_email() {
        let p = policy();
        assert_eq!(
            p.site_from_email("contato@zukleiloes.com.br").as_deref(),
            Some("https://www.zukleiloes.com.br")
        );
        assert_eq!(
            p.site_from_email("ana@mail.limaleiloes.com").as_deref(),
            Some("https://www.limaleiloes.com")
        );
        assert_eq!(
            p.site_from_email("leiloeiro@sp.leilao.br").as_deref(),
            Some("https://www.sp.leilao.br")
        );
        assert_eq!(
            p.site_from_email("ana@studio.de").as_deref(),
            Some("https://www.studio.de")
        );
        assert_eq!(p.site_from_email("fulano@gmail.com"), None);
    }

    #[test]
    fn test_clean_site() {
        let p = policy();
        assert_eq!(
            p.clean_site("www.motaleiloes.com.br").as_deref(),
            Some("https://www.motaleiloes.com.br")
        );
        assert_eq!(
            p.clean_site("http://reis.com.br/").as_deref(),
            Some("http://reis.com.br/")
        );
        assert_eq!(p.clean_site("https://outlook.com/owa"), None);
        assert_eq!(p.clean_site("not a site"), None);
        assert_eq!(p.clean_site("  "), None);
    }
}
