//! Frontmatter parsing and the remote-side protection flags derived from it.
//!
//! A frontmatter block is the YAML between the first pair of `---` fences.
//! Parsing is tolerant by design: anything malformed or absent yields `None`,
//! and callers treat that as "no metadata" rather than an error.

use std::collections::BTreeMap;

use serde_yaml::Value;
use tracing::debug;

/// Parsed frontmatter: a flat key/value mapping.
pub type Frontmatter = BTreeMap<String, Value>;

/// Extract and parse the frontmatter block from a note's raw text.
pub fn parse_frontmatter(text: &str) -> Option<Frontmatter> {
    let block = text.split("---").nth(1)?;
    match serde_yaml::from_str::<Frontmatter>(block) {
        Ok(fm) => Some(fm),
        Err(e) => {
            debug!(error = %e, "frontmatter block did not parse as YAML mapping");
            None
        }
    }
}

/// Interpret a frontmatter value as a boolean. Accepts both YAML booleans and
/// the string forms `"true"`/`"false"`, which show up in hand-edited notes.
pub fn truthy(value: Option<&Value>) -> Option<bool> {
    match value {
        Some(Value::Bool(b)) => Some(*b),
        Some(Value::String(s)) => match s.trim() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Remote-side metadata that can override an otherwise-eligible deletion.
/// Parsed on demand from the remote file's own frontmatter during index
/// protection checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtectionFlags {
    pub index: bool,
    pub autoclean: Option<bool>,
    pub share: bool,
}

impl ProtectionFlags {
    pub fn from_frontmatter(fm: &Frontmatter) -> Self {
        ProtectionFlags {
            index: truthy(fm.get("index")).unwrap_or(false),
            autoclean: truthy(fm.get("autoclean")),
            share: truthy(fm.get("share")).unwrap_or(false),
        }
    }

    /// Deletion is suppressed when the file declares itself an index, opts
    /// out of auto-cleanup, or is not (or no longer) marked as shared.
    pub fn forbids_deletion(&self) -> bool {
        self.index || self.autoclean == Some(false) || !self.share
    }
}
