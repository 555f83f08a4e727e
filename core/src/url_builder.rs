//! Request URL assembly.
//!
//! `{base}/` + `{prefix}/{version}/{endpoint}`, an optional port spliced in
//! right after the host name, and query canonicalization when the
//! connection is not encrypted.

use crate::params::ParameterSet;
use crate::query::normalize_query_string;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlBuilder {
    root: String,
    port: Option<u16>,
    encrypted: bool,
}

impl UrlBuilder {
    pub fn new(base_url: &str, api_prefix: &str, version: &str, port: Option<u16>) -> Self {
        let mut root = base_url.to_string();
        if !root.ends_with('/') {
            root.push('/');
        }
        root.push_str(api_prefix);
        root.push('/');
        root.push_str(version);
        root.push('/');

        Self {
            root,
            port,
            encrypted: is_encrypted(base_url),
        }
    }

    /// Whether requests travel over TLS, which selects the auth channel.
    pub fn is_encrypted(&self) -> bool {
        self.encrypted
    }

    /// Fully-qualified URL for `endpoint`.
    ///
    /// On encrypted connections the parameters are not folded into the URL;
    /// the dispatcher sends them as separate query parameters.
    pub fn build(&self, endpoint: &str, params: &ParameterSet) -> String {
        let mut url = format!("{}{endpoint}", self.root);

        if let Some(port) = self.port {
            url = splice_port(&url, port);
        }

        if self.encrypted {
            return url;
        }
        normalize_query_string(&url, params)
    }
}

/// `https` scheme prefix, case-insensitive.
pub fn is_encrypted(url: &str) -> bool {
    url.get(..5).is_some_and(|scheme| scheme.eq_ignore_ascii_case("https"))
}

/// Insert `:port` right after the first occurrence of the host name.
///
/// The host is read from the raw authority text, so internationalized
/// names are matched as written. An already declared port is left in
/// place, so `host:8080` becomes `host:{port}:8080`.
fn splice_port(url: &str, port: u16) -> String {
    match raw_host(url) {
        Some(host) => url.replacen(host, &format!("{host}:{port}"), 1),
        None => url.to_string(),
    }
}

/// Host as it appears in `url`: after `scheme://` and any userinfo, before
/// the port or path. IPv6 literals keep their brackets.
fn raw_host(url: &str) -> Option<&str> {
    let (_, rest) = url.split_once("://")?;
    let authority = rest.split(['/', '?', '#']).next().unwrap_or(rest);
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, h)| h);
    let host = match host_port.find(']') {
        Some(end) if host_port.starts_with('[') => &host_port[..=end],
        _ => host_port.split_once(':').map_or(host_port, |(h, _)| h),
    };
    (!host.is_empty()).then_some(host)
}
