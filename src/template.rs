//! `{name}` placeholder handling for command targets.
//!
//! A placeholder is a brace-delimited word made of letters, digits, `_`, `-`
//! or `.`. Anything else in braces (shell snippets such as `awk '{print $1}'`,
//! names with spaces, stray or unbalanced braces) is left alone as literal text.
//!
//! There is no brace escaping: `{{` and `}}` are ordinary characters, so
//! `x{{id}}y` with `id = 1` renders `x{1}y`. This keeps targets without
//! placeholders byte-for-byte unchanged by rendering.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::error::TemplateError;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([A-Za-z0-9_.\-]+)\}").expect("placeholder pattern is valid")
});

pub fn extract_placeholders(target: &str) -> BTreeSet<String> {
    PLACEHOLDER
        .captures_iter(target)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Placeholder names in sorted order, for front ends that prompt for values.
pub fn placeholders_sorted(target: &str) -> Vec<String> {
    extract_placeholders(target).into_iter().collect()
}

/// Substitutes every placeholder in one pass. Substituted values are never
/// re-scanned, so a value containing `{x}` is inserted verbatim.
pub fn render(target: &str, variables: &BTreeMap<String, String>) -> Result<String, TemplateError> {
    if let Some(missing) = PLACEHOLDER
        .captures_iter(target)
        .map(|caps| caps[1].to_string())
        .find(|key| !variables.contains_key(key))
    {
        return Err(TemplateError::MissingKey(missing));
    }

    let rendered = PLACEHOLDER.replace_all(target, |caps: &Captures| {
        variables.get(&caps[1]).cloned().unwrap_or_default()
    });
    Ok(rendered.into_owned())
}
