//! Free-text label search.
//!
//! Readers type page labels the way they appear in print (`"12"`, `"012"`,
//! `"100-101"`). Matching runs in three stages:
//!
//! 1. literal: the normalized query equals a normalized canvas label;
//! 2. double page: the query splits into two numeric groups which are then
//!    searched for as one compound label (`100-101`, `100_101`, `100 101`);
//! 3. single group (legacy dialect only): the first numeric group anywhere in
//!    a canvas label.
//!
//! The first canvas (in index order) satisfying the earliest stage wins.

use std::sync::OnceLock;

use regex::Regex;

use crate::schema::Dialect;

/// Trim a label and strip leading zeros from all-digit labels.
///
/// `"007"` becomes `"7"`, `"000"` becomes `"0"`, anything containing a
/// non-digit is only trimmed.
#[must_use]
pub fn normalize_label(label: &str) -> String {
    let trimmed = label.trim();
    if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        let stripped = trimmed.trim_start_matches('0');
        if stripped.is_empty() {
            "0".to_string()
        } else {
            stripped.to_string()
        }
    } else {
        trimmed.to_string()
    }
}

fn iiif_groups() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([0-9]*)[^0-9]+([0-9]*)").expect("valid regex"))
}

fn legacy_groups() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([0-9]*)[^0-9]*([0-9]*)").expect("valid regex"))
}

/// Numeric groups extracted from a query.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Groups {
    first: String,
    second: String,
}

fn extract_groups(query: &str, dialect: Dialect) -> Option<Groups> {
    let re = match dialect {
        Dialect::Iiif => iiif_groups(),
        Dialect::Legacy => legacy_groups(),
    };
    let caps = re.captures(query)?;
    let group = |i| caps.get(i).map_or("", |m| m.as_str()).to_string();
    Some(Groups {
        first: group(1),
        second: group(2),
    })
}

/// Build the search pattern for a query, if the dialect has one.
fn search_pattern(groups: &Groups, dialect: Dialect) -> Option<Regex> {
    let first = regex::escape(&groups.first);
    let second = regex::escape(&groups.second);

    let pattern = match dialect {
        Dialect::Iiif if !groups.second.is_empty() => format!("^{first}[^0-9]+{second}$"),
        Dialect::Iiif => return None,
        Dialect::Legacy if groups.first.is_empty() => return None,
        Dialect::Legacy if !groups.second.is_empty() => format!("^{first}[^0-9]*{second}$"),
        Dialect::Legacy => format!("[^0-9]*{first}[^0-9]*"),
    };

    match Regex::new(&pattern) {
        Ok(re) => Some(re),
        Err(error) => {
            tracing::warn!(%pattern, %error, "label search pattern rejected");
            None
        }
    }
}

/// Resolve a user-typed label to the index of the first matching canvas.
///
/// `labels` are the stored canvas labels in index order.
#[must_use]
pub fn find_canvas_index<S: AsRef<str>>(
    query: &str,
    labels: &[S],
    dialect: Dialect,
) -> Option<usize> {
    let query = normalize_label(query);

    if let Some(index) = labels
        .iter()
        .position(|label| normalize_label(label.as_ref()) == query)
    {
        return Some(index);
    }

    let groups = extract_groups(&query, dialect)?;
    let pattern = search_pattern(&groups, dialect)?;

    labels
        .iter()
        .position(|label| pattern.is_match(label.as_ref().trim()))
}
