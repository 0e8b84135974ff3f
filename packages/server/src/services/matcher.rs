//! Association of imported size variants with their main files.

use crate::utils::filename::base_name;

/// Decides whether a variant file belongs to a main file.
pub trait FormatMatcher: Send + Sync {
    /// `variant_name` is the variant's file name with its `{format}_` prefix
    /// already removed.
    fn matches(&self, format: &str, variant_name: &str, main_name: &str) -> bool;
}

/// Matches when both names share the same base name, ignoring extensions.
///
/// Unrelated uploads that happen to share a base name are indistinguishable
/// to this matcher.
#[derive(Debug, Default, Clone, Copy)]
pub struct BaseNameMatcher;

impl FormatMatcher for BaseNameMatcher {
    fn matches(&self, _format: &str, variant_name: &str, main_name: &str) -> bool {
        base_name(variant_name) == base_name(main_name)
    }
}

/// Split `{format}_{rest}` for the first format name that prefixes `name`.
pub fn split_format<'a>(name: &'a str, formats: &'a [String]) -> Option<(&'a str, &'a str)> {
    formats.iter().find_map(|format| {
        name.strip_prefix(format.as_str())
            .and_then(|rest| rest.strip_prefix('_'))
            .filter(|rest| !rest.is_empty())
            .map(|rest| (format.as_str(), rest))
    })
}
