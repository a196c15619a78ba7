use url::Url;

/// Normalizes a free-text website value into a bare hostname.
///
/// Accepts full URLs, bare hosts, or host/path fragments: the scheme and
/// path are stripped, a leading `www.` is removed, and the result is
/// lower-cased. There is no DNS validation; garbage passes through
/// best-effort.
pub fn sanitize_domain(website: &str) -> String {
    if website.is_empty() {
        return String::new();
    }
    let trimmed = website.trim();

    let host = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        match Url::parse(trimmed) {
            Ok(parsed) => parsed.host_str().unwrap_or_default().to_string(),
            Err(_) => trimmed.to_string(),
        }
    } else {
        trimmed.to_string()
    };

    // tolerate "host/path" without a scheme
    let host = host.split('/').next().unwrap_or_default();
    let host = match host.get(..4) {
        Some(prefix) if prefix.eq_ignore_ascii_case("www.") => &host[4..],
        _ => host,
    };
    host.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_stays_empty() {
        assert_eq!(sanitize_domain(""), "");
        assert_eq!(sanitize_domain("   "), "");
    }

    #[test]
    fn bare_hostname_passes_through() {
        assert_eq!(sanitize_domain("example.com"), "example.com");
    }

    #[test]
    fn url_with_path_reduces_to_host() {
        assert_eq!(
            sanitize_domain("https://www.Example.com/about"),
            "example.com"
        );
        assert_eq!(
            sanitize_domain("http://example.com/a/b?q=1"),
            "example.com"
        );
    }

    #[test]
    fn schemeless_path_is_split_off() {
        assert_eq!(sanitize_domain("example.com/pricing"), "example.com");
    }

    #[test]
    fn www_prefix_is_stripped_case_insensitively() {
        assert_eq!(sanitize_domain("WWW.Example.COM"), "example.com");
        assert_eq!(sanitize_domain("www.example.com"), "example.com");
        // only a leading www. counts
        assert_eq!(sanitize_domain("wwwexample.com"), "wwwexample.com");
    }

    #[test]
    fn schemeless_port_is_kept() {
        assert_eq!(sanitize_domain("Example.com:8080/x"), "example.com:8080");
    }

    #[test]
    fn url_host_extraction_drops_port() {
        assert_eq!(sanitize_domain("https://example.com:8443/x"), "example.com");
    }
}
