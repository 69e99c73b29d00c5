//! URL utilities for building backend endpoints
//!
//! The configured base URL may or may not carry a trailing slash; endpoint
//! paths are joined onto it without producing double slashes.

/// Remove trailing slashes from a base URL
///
/// # Examples
///
/// ```
/// use charla::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("https://bot.example.com"), "https://bot.example.com");
/// assert_eq!(normalize_base_url("https://bot.example.com///"), "https://bot.example.com");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}

/// Join an endpoint path onto a base URL
///
/// Leading slashes of the endpoint are dropped, trailing ones are kept, so
/// `process-file/` stays routable on backends that distinguish the two.
///
/// # Examples
///
/// ```
/// use charla::utils::url::endpoint_url;
///
/// assert_eq!(
///     endpoint_url("https://bot.example.com/", "/process-file/"),
///     "https://bot.example.com/process-file/"
/// );
/// ```
pub fn endpoint_url(base_url: &str, endpoint: &str) -> String {
    let normalized_base = normalize_base_url(base_url);
    let endpoint = endpoint.trim_start_matches('/');
    format!("{}/{}", normalized_base, endpoint)
}
