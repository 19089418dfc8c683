use std::net::{Ipv4Addr, Ipv6Addr};

/// Which address family a client IP literal belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpFamily {
    V4,
    V6,
}

/// Classify `candidate` as an IPv4 dotted-quad or IPv6 literal.
///
/// No DNS resolution and no trimming: `" 1.2.3.4"` is not an address.
/// Returns `None` for the empty string and anything else.
pub fn ip_family(candidate: &str) -> Option<IpFamily> {
    if candidate.is_empty() {
        return None;
    }
    if candidate.parse::<Ipv4Addr>().is_ok() {
        return Some(IpFamily::V4);
    }
    if candidate.parse::<Ipv6Addr>().is_ok() {
        return Some(IpFamily::V6);
    }
    None
}

pub fn is_valid_ip(candidate: &str) -> bool {
    ip_family(candidate).is_some()
}
