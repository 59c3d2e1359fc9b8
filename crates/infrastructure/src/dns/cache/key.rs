use compact_str::CompactString;
use hickory_proto::op::Query;
use hickory_proto::rr::{DNSClass, RecordType};
use warden_dns_domain::domain_name::normalize_domain;

/// Normalized question: lowercase name without the root dot, type and class.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub domain: CompactString,
    pub record_type: RecordType,
    pub class: DNSClass,
}

impl CacheKey {
    #[inline]
    pub fn new(domain: &str, record_type: RecordType, class: DNSClass) -> Self {
        Self {
            domain: CompactString::from(normalize_domain(domain)),
            record_type,
            class,
        }
    }

    pub fn from_query(query: &Query) -> Self {
        Self::new(
            &query.name().to_ascii(),
            query.query_type(),
            query.query_class(),
        )
    }
}
