//! Deterministic query-string canonicalization.
//!
//! # Design
//! The canonical form is what both URL construction on plain-HTTP
//! connections and the OAuth signature base string rely on, so it is
//! reproduced byte for byte:
//! - existing query pairs on the URL are parsed first (first occurrence of a
//!   key wins), then flattened `ParameterSet` entries override them;
//! - keys are sorted by their raw form in code-point order;
//! - keys and values are encoded with the `encodeURIComponent` set, after
//!   which `%5B`/`%5D` in keys are turned back into literal brackets.
//!
//! Two legacy edge cases are kept on purpose: a URL with no `?` and an empty
//! parameter set comes back untouched, while any other input that ends up
//! with no pairs still gets a trailing `?`.

use std::collections::BTreeMap;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::params::ParameterSet;

/// Characters left alone by `encodeURIComponent`: `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
pub const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode one URI component.
pub fn encode_component(input: &str) -> String {
    utf8_percent_encode(input, URI_COMPONENT).to_string()
}

/// Encode a query key, keeping brackets literal.
pub fn encode_key(key: &str) -> String {
    encode_component(key).replace("%5B", "[").replace("%5D", "]")
}

/// Split a URL into the part before the first `?` and the raw query (without fragment).
pub fn split_query(url: &str) -> (&str, Option<&str>) {
    match url.split_once('?') {
        Some((base, rest)) => {
            let query = rest.split_once('#').map_or(rest, |(q, _)| q);
            (base, Some(query))
        }
        None => (url, None),
    }
}

/// Parse a raw query string into decoded pairs, first occurrence of a key winning.
///
/// `+` decodes to a space. Pieces whose key or value is not valid
/// percent-encoded UTF-8 are skipped, as are pieces with an empty key.
pub fn parse_query(query: &str) -> BTreeMap<String, String> {
    let mut pairs = BTreeMap::new();
    for piece in query.split('&') {
        let (raw_key, raw_value) = piece.split_once('=').unwrap_or((piece, ""));
        if raw_key.is_empty() {
            continue;
        }
        let (Some(key), Some(value)) = (decode_form(raw_key), decode_form(raw_value)) else {
            continue;
        };
        pairs.entry(key).or_insert(value);
    }
    pairs
}

fn decode_form(input: &str) -> Option<String> {
    let spaced = input.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .ok()
        .map(|s| s.into_owned())
}

/// Canonical `key=value&...` string for already-merged pairs.
///
/// Pairs come out sorted by raw key because `BTreeMap` orders `String` by
/// code point.
pub fn canonical_query_string(pairs: &BTreeMap<String, String>) -> String {
    pairs
        .iter()
        .map(|(key, value)| format!("{}={}", encode_key(key), encode_component(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Rebuild `url` with a canonical query string that also carries `params`.
pub fn normalize_query_string(url: &str, params: &ParameterSet) -> String {
    let (base, query) = split_query(url);
    if query.is_none() && params.is_empty() {
        return url.to_string();
    }

    let mut pairs = query.map(parse_query).unwrap_or_default();
    for (key, value) in params.flatten() {
        pairs.insert(key, value);
    }

    format!("{base}?{}", canonical_query_string(&pairs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamValue;

    const PRODUCTS: &str = "http://test.dev/wp-json/wc/v3/products";

    #[test]
    fn sorts_existing_query_by_name() {
        let url = format!("{PRODUCTS}?filter[q]=Woo+Album&fields=id&filter[limit]=1");
        assert_eq!(
            normalize_query_string(&url, &ParameterSet::new()),
            format!("{PRODUCTS}?fields=id&filter[limit]=1&filter[q]=Woo%20Album")
        );
    }

    #[test]
    fn no_query_and_no_params_is_untouched() {
        assert_eq!(normalize_query_string(PRODUCTS, &ParameterSet::new()), PRODUCTS);
    }

    #[test]
    fn empty_result_keeps_trailing_question_mark() {
        let url = format!("{PRODUCTS}?");
        assert_eq!(normalize_query_string(&url, &ParameterSet::new()), url);

        let params = ParameterSet::new().with("filter", ParamValue::Nested(Vec::new()));
        assert_eq!(normalize_query_string(PRODUCTS, &params), url);
    }

    #[test]
    fn params_merge_and_override_url_pairs() {
        let url = format!("{PRODUCTS}?page=1&status=any");
        let params = ParameterSet::new()
            .with("page", 3u32)
            .with_nested("filter", [("meta", "true")]);
        assert_eq!(
            normalize_query_string(&url, &params),
            format!("{PRODUCTS}?filter[meta]=true&page=3&status=any")
        );
    }

    #[test]
    fn first_duplicate_in_url_wins() {
        let url = format!("{PRODUCTS}?a=1&a=2");
        assert_eq!(normalize_query_string(&url, &ParameterSet::new()), format!("{PRODUCTS}?a=1"));
    }

    #[test]
    fn canonical_url_is_a_fixed_point() {
        let params = ParameterSet::new()
            .with_nested("filter", [("q", "Woo Album"), ("limit", "1")])
            .with("fields", "id,name");
        let once = normalize_query_string(PRODUCTS, &params);
        let twice = normalize_query_string(&once, &ParameterSet::new());
        assert_eq!(once, twice);
    }

    #[test]
    fn brackets_stay_literal_only_in_keys() {
        let params = ParameterSet::new().with("search", "[a]").with_nested("f", [("x y", "1")]);
        let url = normalize_query_string(PRODUCTS, &params);
        assert_eq!(url, format!("{PRODUCTS}?f[x%20y]=1&search=%5Ba%5D"));
    }

    #[test]
    fn encodes_like_uri_component() {
        assert_eq!(encode_component("a b&c=d/é"), "a%20b%26c%3Dd%2F%C3%A9");
        assert_eq!(encode_component("-_.!~*'()"), "-_.!~*'()");
    }

    #[test]
    fn keys_come_out_in_raw_order() {
        let params: ParameterSet = [("b", "1"), ("B", "2"), ("a[z]", "3"), ("a", "4"), ("a_b", "5")]
            .into_iter()
            .collect();
        let url = normalize_query_string(PRODUCTS, &params);
        let (_, query) = split_query(&url);
        let keys: Vec<&str> = query
            .unwrap_or_default()
            .split('&')
            .filter_map(|p| p.split_once('=').map(|(k, _)| k))
            .collect();
        assert_eq!(keys, vec!["B", "a", "a[z]", "a_b", "b"]);
    }

    #[test]
    fn fragment_is_not_part_of_query() {
        assert_eq!(split_query("http://x/p?a=1#top"), ("http://x/p", Some("a=1")));
    }

    #[test]
    fn undecodable_pieces_are_skipped() {
        let pairs = parse_query("good=1&bad=%E0%A4%A&=orphan");
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs.get("good").map(String::as_str), Some("1"));
    }
}
