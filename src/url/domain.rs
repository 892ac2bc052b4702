use url::Url;

/// Returns the host and explicit port of a URL as a comparable key
///
/// The host is taken exactly as parsed: no `www.` folding and no port
/// normalization beyond what URL parsing itself does (a default port such as
/// `:443` on `https` is dropped by the parser).
///
/// # Examples
///
/// ```
/// use url::Url;
/// use pagescope::url::host_key;
///
/// let url = Url::parse("https://example.com:8443/path").unwrap();
/// assert_eq!(host_key(&url), Some(("example.com".to_string(), Some(8443))));
/// ```
pub fn host_key(url: &Url) -> Option<(String, Option<u16>)> {
    url.host_str().map(|h| (h.to_string(), url.port()))
}

/// Returns true if both URLs point at exactly the same host and port
pub fn same_host(a: &Url, b: &Url) -> bool {
    match (host_key(a), host_key(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}
