//! Logical id generation.
//!
//! Ids are derived from the entry path, segment by segment, unless the
//! module declares an explicit `slug`. Callers can swap the strategy by
//! passing any [`IdGenerator`], including a plain closure.
//!
//! Uniqueness is not checked here. Two files mapping to the same id will
//! overwrite each other in the store. A segment that slugifies to nothing
//! stays in place as an empty segment, so directory levels never merge.

use std::path::Path;

use crate::model::Metadata;

/// Strategy for deriving a logical id.
pub trait IdGenerator: Send + Sync {
    /// Id for the file at `entry` (relative to `base`) with declared `metadata`.
    fn generate(&self, entry: &str, base: &Path, metadata: Option<&Metadata>) -> String;
}

impl<F> IdGenerator for F
where
    F: Fn(&str, &Path, Option<&Metadata>) -> String + Send + Sync,
{
    fn generate(&self, entry: &str, base: &Path, metadata: Option<&Metadata>) -> String {
        self(entry, base, metadata)
    }
}

/// Default path-based id strategy, see [`generate_id`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultIdGenerator;

impl IdGenerator for DefaultIdGenerator {
    fn generate(&self, entry: &str, _base: &Path, metadata: Option<&Metadata>) -> String {
        generate_id(entry, metadata)
    }
}

/// Default id for an entry path.
///
/// 1. A string `slug` in the metadata is returned verbatim.
/// 2. Otherwise the extension is stripped, each `/` segment is slugified on
///    its own, and a trailing `/index` segment is dropped so an index file
///    takes its directory's id.
#[must_use]
pub fn generate_id(entry: &str, metadata: Option<&Metadata>) -> String {
    if let Some(slug) = metadata
        .and_then(|m| m.get("slug"))
        .and_then(serde_json::Value::as_str)
    {
        return slug.to_string();
    }

    let slugged = strip_extension(entry)
        .split('/')
        .map(slugify)
        .collect::<Vec<_>>()
        .join("/");

    match slugged.strip_suffix("/index") {
        Some(parent) => parent.to_string(),
        None => slugged,
    }
}

/// Slugify one path segment.
///
/// Transliterates to ASCII, lowercases, and collapses every run of
/// non-alphanumeric characters into a single `-`, trimmed at both ends.
#[must_use]
pub fn slugify(segment: &str) -> String {
    let ascii = deunicode::deunicode(segment).to_lowercase();

    let mut slug = String::with_capacity(ascii.len());
    let mut pending_hyphen = false;
    for c in ascii.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }
    slug
}

fn strip_extension(entry: &str) -> &str {
    let name_start = entry.rfind('/').map_or(0, |i| i + 1);
    match entry[name_start..].rfind('.') {
        Some(dot) if dot > 0 => &entry[..name_start + dot],
        _ => entry,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn meta(value: serde_json::Value) -> Metadata {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_generate_id_slugifies_segments() {
        assert_eq!(generate_id("posts/My First Post.astro", None), "posts/my-first-post");
    }

    #[test]
    fn test_generate_id_drops_trailing_index() {
        assert_eq!(generate_id("posts/index.astro", None), "posts");
        assert_eq!(generate_id("docs/guides/index.md", None), "docs/guides");
    }

    #[test]
    fn test_generate_id_top_level_index_kept() {
        assert_eq!(generate_id("index.md", None), "index");
    }

    #[test]
    fn test_generate_id_slug_wins() {
        let metadata = meta(json!({"slug": "custom", "title": "Ignored"}));
        assert_eq!(generate_id("posts/anything.md", Some(&metadata)), "custom");
    }

    #[test]
    fn test_generate_id_non_string_slug_ignored() {
        let metadata = meta(json!({"slug": 42}));
        assert_eq!(generate_id("posts/a.md", Some(&metadata)), "posts/a");
    }

    #[test]
    fn test_generate_id_keeps_segments_apart() {
        assert_eq!(generate_id("Release Notes/ v2 /Intro.md", None), "release-notes/v2/intro");
    }

    #[test]
    fn test_generate_id_multi_dot_name() {
        assert_eq!(generate_id("posts/v1.2.notes.md", None), "posts/v1-2-notes");
        assert_eq!(generate_id("posts/.hidden", None), "posts/hidden");
    }

    #[test]
    fn test_generate_id_empty_segments_stay_in_place() {
        assert_eq!(generate_id("posts/---.md", None), "posts/");
        assert_ne!(generate_id("posts/---.md", None), generate_id("posts/index.md", None));
        assert_eq!(generate_id("a/!!/b.md", None), "a//b");
        assert_ne!(generate_id("a/!!/b.md", None), generate_id("a/b.md", None));
    }

    #[test]
    fn test_generate_id_all_punctuation_is_empty() {
        assert_eq!(generate_id("!!!.md", None), "");
    }

    #[test]
    fn test_slugify_transliterates() {
        assert_eq!(slugify("Crème Brûlée"), "creme-brulee");
        assert_eq!(slugify("  --Hello, World!--  "), "hello-world");
        assert_eq!(slugify("snake_case_name"), "snake-case-name");
    }

    #[test]
    fn test_closure_generator() {
        let by_filename = |entry: &str, _base: &Path, _meta: Option<&Metadata>| {
            entry.rsplit('/').next().unwrap_or(entry).to_string()
        };
        assert_eq!(by_filename.generate("posts/a.md", Path::new("/b"), None), "a.md");
    }
}
