//! Slug codec: display names ↔ URL-safe lowercase identifiers.
//!
//! Slugs keep Unicode letters and digits (Cyrillic model names stay
//! readable) and collapse every other run of characters into a single `-`.

use std::cmp::Ordering;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::taxonomy::{RichBlock, RichText};

/// Strip HTML tags and a handful of common entities, collapsing whitespace.
#[must_use]
pub fn strip_markup(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_tag = false;
    for ch in raw.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                out.push(' ');
            }
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }

    let decoded = out
        .replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&");

    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Plain-text content of a rich or plain display string.
///
/// Sibling inline nodes are concatenated as-is; top-level blocks are
/// separated by a space.
#[must_use]
pub fn plain_text(text: &RichText) -> String {
    match text {
        RichText::Plain(raw) => strip_markup(raw),
        RichText::Block(block) => strip_markup(&block_text(block)),
        RichText::Rich(blocks) => {
            let joined = blocks.iter().map(block_text).collect::<Vec<_>>().join(" ");
            strip_markup(&joined)
        }
    }
}

fn block_text(block: &RichBlock) -> String {
    let mut out = block.text.clone().unwrap_or_default();
    for child in &block.children {
        out.push_str(&block_text(child));
    }
    out
}

/// Canonicalize display text into a slug.
///
/// Markup is stripped first, then every letter/digit is lowercased and every
/// run of anything else becomes a single `-`. Leading and trailing separators
/// are never emitted.
#[must_use]
pub fn slugify(display_text: &str) -> String {
    let plain = strip_markup(display_text);
    let mut slug = String::with_capacity(plain.len());
    let mut pending_separator = false;

    for ch in plain.chars() {
        if !ch.is_alphanumeric() {
            pending_separator = true;
            continue;
        }
        // Lowercasing can expand into combining marks (e.g. 'İ'); only the
        // alphanumeric part is kept so slugify stays idempotent.
        for lower in ch.to_lowercase().filter(|c| c.is_alphanumeric()) {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(lower);
        }
    }

    slug
}

/// Compare two display strings or slugs by their slug form.
#[must_use]
pub fn slug_equals(a: &str, b: &str) -> bool {
    slugify(a) == slugify(b)
}

/// Locale-aware ordering for display names: case- and diacritic-insensitive
/// first, with the raw strings as a tie-breaker so the order is total.
#[must_use]
pub fn compare_display(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.cmp(b))
}

fn collation_key(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}
