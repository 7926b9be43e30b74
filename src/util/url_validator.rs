use std::net::IpAddr;
use thiserror::Error;
use url::Url;

/// Reasons an article link is refused before any request is made.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    #[error("Private IP address not allowed: {0}")]
    PrivateIp(String),
    #[error("Localhost not allowed")]
    Localhost,
}

/// Validates an article link before it is fetched or handed to the system browser.
///
/// Links come from remote feeds, so anything that is not plain http(s) to a
/// public host is rejected: `file://` and friends, `localhost`, loopback,
/// RFC 1918, link-local and unique-local addresses.
///
/// ```
/// use broadsheet::util::validate_article_url;
///
/// assert!(validate_article_url("https://example.com/2024/01/story").is_ok());
/// assert!(validate_article_url("http://localhost/story").is_err());
/// assert!(validate_article_url("file:///etc/passwd").is_err());
/// ```
pub fn validate_article_url(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str.trim())?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }

    let Some(host) = url.host_str() else {
        return Ok(url);
    };
    if host.eq_ignore_ascii_case("localhost") {
        return Err(UrlValidationError::Localhost);
    }

    let bare = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    if let Ok(ip) = bare.parse::<IpAddr>() {
        if ip.is_loopback() {
            return Err(UrlValidationError::Localhost);
        }
        if is_private_ip(&ip) {
            return Err(UrlValidationError::PrivateIp(ip.to_string()));
        }
    }

    Ok(url)
}

fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_private() || v4.is_link_local() || v4.is_unspecified(),
        IpAddr::V6(v6) => {
            let first = v6.segments()[0];
            v6.is_unspecified() || (first & 0xfe00) == 0xfc00 || (first & 0xffc0) == 0xfe80
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_article_links_accepted() {
        assert!(validate_article_url("https://www.economist.com/leaders/2024/01/04/story").is_ok());
        assert!(validate_article_url("http://news.example.org:8080/a").is_ok());
        assert!(validate_article_url("  https://example.com/padded  ").is_ok());
    }

    #[test]
    fn test_non_http_schemes_rejected() {
        assert!(matches!(
            validate_article_url("file:///etc/passwd"),
            Err(UrlValidationError::UnsupportedScheme(_))
        ));
        assert!(validate_article_url("javascript:alert(1)").is_err());
    }

    #[test]
    fn test_local_hosts_rejected() {
        for url in ["http://localhost/a", "http://LOCALHOST/a", "http://127.0.0.1/a", "http://[::1]/a"] {
            assert!(
                matches!(validate_article_url(url), Err(UrlValidationError::Localhost)),
                "{url} should be rejected"
            );
        }
    }

    #[test]
    fn test_private_ranges_rejected() {
        for url in [
            "http://192.168.1.1/a",
            "http://10.0.0.1:3000/a",
            "http://172.16.0.1/a",
            "http://169.254.1.1/a",
            "http://0.0.0.0/a",
            "http://[fe80::1]/a",
            "http://[fd00::1]/a",
        ] {
            assert!(
                matches!(validate_article_url(url), Err(UrlValidationError::PrivateIp(_))),
                "{url} should be rejected"
            );
        }
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(
            validate_article_url("not a url"),
            Err(UrlValidationError::InvalidUrl(_))
        ));
    }
}
