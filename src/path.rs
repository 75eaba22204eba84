use crate::error::{Error, Result};
use url::Url;

/// Query marker crawlers use in place of a `#!` fragment
pub const ESCAPED_FRAGMENT: &str = "?_escaped_fragment_=";

/// Canonical hash-bang form stored as the index key
pub const HASH_BANG: &str = "#!";

const PATH_WRAPPER: &str = "path=";

/// Convert a raw path into the key used by every index operation.
///
/// Paths are case-insensitive, and the escaped-fragment query form is mapped
/// onto the hash-bang form. Every marker is rewritten so that normalizing
/// twice gives the same key.
pub fn normalize(raw: &str) -> String {
    raw.to_lowercase().replace(ESCAPED_FRAGMENT, HASH_BANG)
}

/// Remove a `path=` wrapper from a lookup value.
///
/// Callers sometimes forward a whole URL whose query is itself `?path=<path>`;
/// everything up to and including the wrapper is dropped.
pub fn strip_path_wrapper(raw: &str) -> &str {
    if let Some(index) = raw.find("?path=") {
        return &raw[index + "?path=".len()..];
    }
    raw.strip_prefix(PATH_WRAPPER).unwrap_or(raw)
}

/// Normalized key for a lookup value, with any `path=` wrapper removed first
pub fn lookup_key(raw: &str) -> String {
    normalize(strip_path_wrapper(&raw.to_lowercase()))
}

/// Extract the `path` query parameter from a lookup request URL.
///
/// Accepts absolute URLs as well as origin-relative ones such as
/// `/index?path=/?_escaped_fragment_=about`. The URL is lower-cased before
/// parsing. A missing parameter yields the empty path.
pub fn lookup_path_from_url(request_url: &str) -> Result<String> {
    let base = Url::parse("http://localhost/")
        .map_err(|e| Error::Validation(format!("invalid base url: {}", e)))?;
    let lowered = request_url.to_lowercase();
    let parsed = Url::options()
        .base_url(Some(&base))
        .parse(&lowered)
        .map_err(|e| Error::Validation(format!("invalid request url '{}': {}", request_url, e)))?;

    let path = parsed
        .query_pairs()
        .find(|(key, _)| key == "path")
        .map(|(_, value)| value.into_owned())
        .unwrap_or_default();

    ::log::trace!("Lookup url {} carries path '{}'", request_url, path);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_lowercases_and_rewrites_fragment() {
        assert_eq!(normalize("/#!Test"), "/#!test");
        assert_eq!(normalize("/?_escaped_fragment_=About"), "/#!about");
        assert_eq!(normalize("/?_ESCAPED_FRAGMENT_=about"), "/#!about");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let samples = [
            "/#!Test/X",
            "/?_escaped_fragment_=Foo",
            "/plain/PATH",
            "",
            "?_escaped_fragment_=?_escaped_fragment_=",
        ];
        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "normalize not idempotent for {}", sample);
        }
    }

    #[test]
    fn test_strip_path_wrapper() {
        assert_eq!(strip_path_wrapper("path=/#!test"), "/#!test");
        assert_eq!(strip_path_wrapper("/index?path=/#!test"), "/#!test");
        assert_eq!(strip_path_wrapper("/#!test"), "/#!test");
        assert_eq!(lookup_key("PATH=/#!Test"), "/#!test");
    }

    #[test]
    fn test_lookup_path_from_url() {
        let path = lookup_path_from_url("/index?path=/?_escaped_fragment_=test").unwrap();
        assert_eq!(path, "/?_escaped_fragment_=test");
        assert_eq!(lookup_key(&path), "/#!test");

        let absolute =
            lookup_path_from_url("https://search.example.com/index?path=%2F%23!About").unwrap();
        assert_eq!(absolute, "/#!about");

        assert_eq!(lookup_path_from_url("/index").unwrap(), "");
    }
}
