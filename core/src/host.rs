//! `host` header formatting.

/// Port implied by `scheme` when none is written.
pub fn default_port(scheme: &str) -> Option<u16> {
    match scheme.to_ascii_lowercase().as_str() {
        "http" | "ws" => Some(80),
        "https" | "wss" => Some(443),
        _ => None,
    }
}

/// Value of the `host` header for a request to `hostname:port` over `scheme`.
///
/// The port is left out when it is absent or equal to the scheme's default.
/// IPv6 literals are bracketed.
pub fn host_header(hostname: &str, port: Option<u16>, scheme: &str) -> String {
    let host = if hostname.contains(':') && !hostname.starts_with('[') {
        format!("[{hostname}]")
    } else {
        hostname.to_string()
    };
    match port {
        Some(p) if Some(p) != default_port(scheme) => format!("{host}:{p}"),
        _ => host,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn implicit_ports_are_stripped() {
        assert_eq!(host_header("example.com", Some(80), "http"), "example.com");
        assert_eq!(host_header("example.com", Some(443), "https"), "example.com");
        assert_eq!(host_header("example.com", None, "https"), "example.com");
    }

    #[test]
    fn other_ports_are_kept() {
        assert_eq!(host_header("example.com", Some(8080), "http"), "example.com:8080");
        assert_eq!(host_header("example.com", Some(443), "http"), "example.com:443");
        assert_eq!(host_header("example.com", Some(80), "https"), "example.com:80");
    }

    #[test]
    fn scheme_is_case_insensitive() {
        assert_eq!(host_header("example.com", Some(443), "HTTPS"), "example.com");
    }

    #[test]
    fn ipv6_literals_are_bracketed() {
        assert_eq!(host_header("::1", Some(3000), "http"), "[::1]:3000");
        assert_eq!(host_header("[::1]", None, "http"), "[::1]");
    }
}
