use percent_encoding::percent_decode_str;
use std::collections::HashMap;

/// Both normalized forms of a request path, lowercased
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPath {
    pub alias: String,
    pub canonical: String,
}

/// Resolves request paths to their alias and internal forms
pub trait PathNormalizer: Send + Sync {
    /// Alias for an internal path, or the input when it has none
    fn alias_for(&self, raw_path: &str) -> String;

    /// Internal path behind an alias, or the input when it is not an alias
    fn canonical_for(&self, alias_or_path: &str) -> String;

    /// Internal path of the content entity a route renders, when the route
    /// belongs to one (e.g. `/node/12/revisions` renders `/node/12`)
    fn entity_path(&self, _canonical: &str) -> Option<String> {
        None
    }

    fn normalize(&self, raw_path: &str) -> NormalizedPath {
        let alias = self.alias_for(raw_path).to_lowercase();
        let canonical = self.canonical_for(&alias).to_lowercase();
        NormalizedPath { alias, canonical }
    }
}

/// Strip query, fragment and trailing slashes; keep a single leading slash
pub fn clean_path(raw: &str) -> String {
    let path = raw.split(['?', '#']).next().unwrap_or_default().trim();
    let trimmed = path.trim_matches('/');
    format!("/{}", trimmed)
}

/// Request path as the router's extractors see it: dot segments resolved,
/// empty segments dropped, each segment percent-decoded once. `None` when an
/// escape does not decode to UTF-8.
pub fn decode_request_path(raw: &str) -> Option<String> {
    let path = raw.split(['?', '#']).next().unwrap_or_default();

    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }

    let decoded = segments
        .into_iter()
        .map(|s| percent_decode_str(s).decode_utf8().ok())
        .collect::<Option<Vec<_>>>()?;
    Some(format!("/{}", decoded.join("/")))
}

/// In-memory bidirectional alias table
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    by_path: HashMap<String, String>,
    by_alias: HashMap<String, String>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `alias` for internal `path`; the latest alias for a path wins
    pub fn add(&mut self, path: &str, alias: &str) -> &mut Self {
        let path = clean_path(path).to_lowercase();
        let alias = clean_path(alias).to_lowercase();
        self.by_path.insert(path.clone(), alias.clone());
        self.by_alias.insert(alias, path);
        self
    }

    pub fn with(mut self, path: &str, alias: &str) -> Self {
        self.add(path, alias);
        self
    }

    pub fn len(&self) -> usize {
        self.by_alias.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_alias.is_empty()
    }
}

impl PathNormalizer for AliasTable {
    fn alias_for(&self, raw_path: &str) -> String {
        let path = clean_path(raw_path);
        let key = path.to_lowercase();
        self.by_path.get(&key).cloned().unwrap_or(path)
    }

    fn canonical_for(&self, alias_or_path: &str) -> String {
        let path = clean_path(alias_or_path);
        let key = path.to_lowercase();
        self.by_alias.get(&key).cloned().unwrap_or(path)
    }

    fn entity_path(&self, canonical: &str) -> Option<String> {
        let mut segments = canonical.trim_start_matches('/').split('/');
        match (segments.next(), segments.next()) {
            (Some("node"), Some(id)) if !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()) => {
                Some(format!("/node/{}", id))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> AliasTable {
        AliasTable::new().with("/node/12", "/Secret").with("/node/40", "/about-us")
    }

    #[test]
    fn clean_path_strips_noise() {
        assert_eq!(clean_path("/secret/?a=1#top"), "/secret");
        assert_eq!(clean_path(""), "/");
        assert_eq!(clean_path("node/12"), "/node/12");
    }

    #[test]
    fn request_paths_are_decoded_once() {
        assert_eq!(decode_request_path("/%73ecret").as_deref(), Some("/secret"));
        assert_eq!(decode_request_path("/a%20b/?q=%41").as_deref(), Some("/a b"));
        assert_eq!(decode_request_path("/%2573ecret").as_deref(), Some("/%73ecret"));
        assert_eq!(decode_request_path("/%FF"), None);
    }

    #[test]
    fn request_paths_resolve_dot_segments() {
        assert_eq!(decode_request_path("/health/../secret").as_deref(), Some("/secret"));
        assert_eq!(decode_request_path("/./a//b/../c").as_deref(), Some("/a/c"));
        assert_eq!(decode_request_path("/../../").as_deref(), Some("/"));
    }

    #[test]
    fn normalize_resolves_both_directions() {
        let t = table();
        let from_alias = t.normalize("/SECRET");
        assert_eq!(from_alias, NormalizedPath { alias: "/secret".into(), canonical: "/node/12".into() });

        let from_path = t.normalize("/node/12");
        assert_eq!(from_path, from_alias);

        let unknown = t.normalize("/Plain/Page");
        assert_eq!(unknown, NormalizedPath { alias: "/plain/page".into(), canonical: "/plain/page".into() });
    }

    #[test]
    fn entity_path_recognizes_node_routes() {
        let t = table();
        assert_eq!(t.entity_path("/node/12/revisions"), Some("/node/12".to_string()));
        assert_eq!(t.entity_path("/node/12"), Some("/node/12".to_string()));
        assert_eq!(t.entity_path("/node/add"), None);
        assert_eq!(t.entity_path("/about"), None);
    }
}
