/// Lowercases a domain name and strips the trailing root dot.
pub fn normalize_domain(domain: &str) -> String {
    domain.trim_end_matches('.').to_ascii_lowercase()
}

/// Iterates a normalized name followed by each of its parent domains,
/// most specific first: `a.b.c` yields `a.b.c`, `b.c`, `c`.
pub fn domain_and_parents(domain: &str) -> impl Iterator<Item = &str> {
    let mut rest = Some(domain).filter(|d| !d.is_empty());
    std::iter::from_fn(move || {
        let current = rest?;
        rest = current.split_once('.').map(|(_, parent)| parent).filter(|p| !p.is_empty());
        Some(current)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_root_and_lowercases() {
        assert_eq!(normalize_domain("Example.COM."), "example.com");
    }

    #[test]
    fn test_domain_and_parents_walks_up() {
        let all: Vec<_> = domain_and_parents("a.b.example.com").collect();
        assert_eq!(all, vec!["a.b.example.com", "b.example.com", "example.com", "com"]);
    }

    #[test]
    fn test_domain_and_parents_empty() {
        assert_eq!(domain_and_parents("").count(), 0);
    }
}
