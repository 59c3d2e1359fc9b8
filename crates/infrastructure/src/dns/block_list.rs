//! Block and allow lists: each group is a set of domains gathered from
//! inline entries and local hosts-style files.

use compact_str::CompactString;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};
use warden_dns_domain::domain_name::{domain_and_parents, normalize_domain};
use warden_dns_domain::DomainError;

/// Extracts the domain from one list line.
///
/// Accepts a bare domain or a hosts line (`0.0.0.0 ads.example.com`);
/// comments and loopback host names yield `None`.
pub fn parse_list_line(line: &str) -> Option<String> {
    let line = line.split('#').next().unwrap_or("").trim();
    if line.is_empty() {
        return None;
    }

    let parts: Vec<&str> = line.split_whitespace().collect();
    let domain = match parts.as_slice() {
        [domain] => *domain,
        [addr, domain, ..] if addr.parse::<std::net::IpAddr>().is_ok() => *domain,
        _ => return None,
    };

    if matches!(
        domain,
        "localhost" | "localhost.localdomain" | "broadcasthost" | "ip6-localhost" | "ip6-loopback"
    ) {
        return None;
    }

    let domain = normalize_domain(domain);
    (!domain.is_empty()).then_some(domain)
}

#[derive(Debug, Default)]
pub struct DomainGroups {
    groups: FxHashMap<String, FxHashSet<CompactString>>,
}

impl DomainGroups {
    /// Builds every group. An entry naming an existing file is read as a
    /// list; anything else is taken as a domain.
    pub async fn load(lists: &BTreeMap<String, Vec<String>>) -> Result<Self, DomainError> {
        let mut groups = FxHashMap::default();

        for (group, entries) in lists {
            let mut domains = FxHashSet::default();
            for entry in entries {
                if Path::new(entry).is_file() {
                    let contents = tokio::fs::read_to_string(entry).await.map_err(|e| {
                        DomainError::Config(format!("cannot read list file '{}': {}", entry, e))
                    })?;
                    let before = domains.len();
                    domains.extend(contents.lines().filter_map(parse_list_line).map(CompactString::from));
                    info!(group = %group, file = %entry, domains = domains.len() - before, "Loaded list file");
                } else if let Some(domain) = parse_list_line(entry) {
                    domains.insert(CompactString::from(domain));
                } else {
                    warn!(group = %group, entry = %entry, "Ignoring unusable list entry");
                }
            }
            groups.insert(group.clone(), domains);
        }

        Ok(Self { groups })
    }

    /// True when the domain or one of its parents is in `group`.
    pub fn contains(&self, group: &str, domain: &str) -> bool {
        self.groups
            .get(group)
            .is_some_and(|domains| domain_and_parents(domain).any(|d| domains.contains(d)))
    }

    /// `(group, number of domains)`, sorted by group name.
    pub fn summary(&self) -> Vec<(&str, usize)> {
        let mut summary: Vec<_> = self
            .groups
            .iter()
            .map(|(group, domains)| (group.as_str(), domains.len()))
            .collect();
        summary.sort_unstable();
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_line() {
        assert_eq!(parse_list_line("ads.example.com"), Some("ads.example.com".into()));
        assert_eq!(parse_list_line("0.0.0.0 Tracker.NET"), Some("tracker.net".into()));
        assert_eq!(parse_list_line("127.0.0.1 localhost"), None);
        assert_eq!(parse_list_line("# comment"), None);
        assert_eq!(parse_list_line("bad.com # trailing"), Some("bad.com".into()));
        assert_eq!(parse_list_line("two words"), None);
    }

    #[tokio::test]
    async fn test_groups_match_parents() {
        let mut lists = BTreeMap::new();
        lists.insert("ads".to_string(), vec!["doubleclick.net".to_string()]);
        let groups = DomainGroups::load(&lists).await.unwrap();

        assert!(groups.contains("ads", "ad.doubleclick.net"));
        assert!(groups.contains("ads", "doubleclick.net"));
        assert!(!groups.contains("ads", "notdoubleclick.net"));
        assert!(!groups.contains("other", "doubleclick.net"));
    }
}
