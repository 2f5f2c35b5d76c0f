use std::collections::HashSet;
use std::sync::LazyLock;
use url::{Host, Url};
use xxhash_rust::xxh3::xxh3_128;

// * Normalizes a URL to ensure a unique, deterministic representation.
// * This is critical for the deduplication coordinator: equivalent URLs must
// * compare equal before fingerprinting.
// *
// * Logic:
// * 1. Lowercase scheme and host (the url crate does this on parse).
// * 2. Upgrade http to https, except for localhost/loopback hosts.
// * 3. Strip one leading "www.".
// * 4. Remove tracking parameters (utm_*, gclid, etc.), keeping the
// *    surviving parameters in their original order.
// * 5. Strip the fragment - client-side only, irrelevant for identity.
// * 6. Strip a single trailing slash unless the path is exactly "/".

// * Tracking parameters to strip, matched on the lowercased key.
// ! Add new tracking params here as they are discovered.
static TRACKING_PARAMS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "utm_source",
        "utm_medium",
        "utm_campaign",
        "utm_term",
        "utm_content",
        "fbclid",
        "gclid",
        "msclkid",
        "session_id",
        "ref",
        "source",
    ]
    .into()
});

/// Canonicalizes a URL, best-effort.
///
/// Malformed or non-http(s) input comes back unchanged: normalization is
/// never a fatal step, and the validator decides whether the raw value is
/// acceptable at all.
pub fn normalize_url(raw: &str) -> String {
    match try_normalize(raw) {
        Some(normalized) => normalized,
        None => raw.to_string(),
    }
}

/// Stable 128-bit fingerprint of the normalized form.
///
/// Fingerprint equality is treated as definite duplication downstream.
pub fn url_fingerprint(raw: &str) -> u128 {
    xxh3_128(normalize_url(raw).as_bytes())
}

fn try_normalize(raw: &str) -> Option<String> {
    let mut url = Url::parse(raw.trim()).ok()?;

    // * Only http(s) URLs have canonical forms worth computing here
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }

    // * Step 2: upgrade to https, except for local development hosts
    if url.scheme() == "http" && !is_loopback(&url) {
        url.set_scheme("https").ok()?;
    }

    // * Step 3: strip one leading "www." (domains only, never IP literals)
    let stripped_host = match url.host() {
        Some(Host::Domain(domain)) => domain
            .strip_prefix("www.")
            .filter(|stripped| !stripped.is_empty())
            .map(str::to_string),
        _ => None,
    };
    if let Some(host) = stripped_host {
        url.set_host(Some(&host)).ok()?;
    }

    // * Step 4: drop tracking params, keep the rest in original order
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !TRACKING_PARAMS.contains(key.to_lowercase().as_str()))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    if kept.is_empty() {
        url.set_query(None);
    } else {
        let mut serializer = url.query_pairs_mut();
        serializer.clear();
        for (key, value) in &kept {
            serializer.append_pair(key, value);
        }
    }

    // * Step 5: strip fragment
    url.set_fragment(None);

    // * Step 6: strip a single trailing slash
    let path = url.path();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path[..path.len() - 1].to_string();
        url.set_path(&trimmed);
    }

    Some(url.to_string())
}

// * localhost and loopback addresses stay on http: local dev servers
// * rarely speak TLS and the upgrade would just break fingerprint equality
fn is_loopback(url: &Url) -> bool {
    match url.host() {
        Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        Some(Host::Ipv4(addr)) => addr.is_loopback(),
        Some(Host::Ipv6(addr)) => addr.is_loopback(),
        None => false,
    }
}
