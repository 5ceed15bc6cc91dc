use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Url;

lazy_static! {
    static ref IPV4_SHAPE: Regex = Regex::new(r"^(?:[0-9]{1,3}\.){3}[0-9]{1,3}$")
        .expect("IPv4 pattern is a valid regex");
}

/// What a normalized target turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetKind {
    /// Dotted quad with every octet in range; queried directly.
    Ip,
    /// Dotted-quad shape with an octet above 255.
    MalformedIp,
    /// Anything else, resolved through DNS before querying.
    Domain,
}

/// Reduce user input to a bare host.
///
/// URLs collapse to their host, without port or userinfo, whether the port
/// was explicit or the scheme default. Anything that is not a URL with a host
/// is returned trimmed.
pub fn normalize(input: &str) -> String {
    let trimmed = input.trim();

    match Url::parse(trimmed) {
        Ok(url) => match url.host_str() {
            Some(host) if !host.is_empty() => host.to_string(),
            _ => trimmed.to_string(),
        },
        Err(_) => trimmed.to_string(),
    }
}

/// Four dot-separated groups of one to three digits.
pub fn looks_like_ipv4(candidate: &str) -> bool {
    IPV4_SHAPE.is_match(candidate)
}

pub fn is_valid_ipv4(candidate: &str) -> bool {
    looks_like_ipv4(candidate)
        && candidate
            .split('.')
            .all(|octet| octet.parse::<u16>().map(|n| n <= 255).unwrap_or(false))
}

pub fn classify(target: &str) -> TargetKind {
    if is_valid_ipv4(target) {
        TargetKind::Ip
    } else if looks_like_ipv4(target) {
        TargetKind::MalformedIp
    } else {
        TargetKind::Domain
    }
}
