use serde::Deserialize;
use tracing::debug;

use crate::error::{Result, TranslatorError};

/// Private-use code point interposed into replacement text while rules run.
///
/// Every inserted character is prefixed with the marker, so a later lookup
/// can never start on text produced by an earlier rule. All markers are
/// stripped once the last table has been applied.
pub const MARKER: char = '\u{E000}';

/// How a matched lookup is rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Substitute the rule's replacement.
    #[default]
    Replacement,
    /// Keep the lookup but wrap it in `【` `】`.
    Highlight,
}

impl Mode {
    /// Inflated text spliced in for one occurrence of `rule.lookup()`.
    pub fn inflate(self, rule: &MappingRule) -> String {
        match self {
            Mode::Replacement => inflate(rule.replacement()),
            Mode::Highlight => inflate(&format!("【{}】", rule.lookup())),
        }
    }
}

/// Prefix each character of `text` with [`MARKER`]. Empty stays empty.
pub fn inflate(text: &str) -> String {
    let mut inflated = String::with_capacity(text.len() + text.chars().count() * MARKER.len_utf8());
    for c in text.chars() {
        inflated.push(MARKER);
        inflated.push(c);
    }
    inflated
}

pub fn strip_markers(text: &str) -> String {
    text.chars().filter(|c| *c != MARKER).collect()
}

/// One row of a mapping table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingRule {
    lookup: String,
    replacement: String,
}

impl MappingRule {
    pub fn new(lookup: impl Into<String>, replacement: impl Into<String>) -> Result<Self> {
        let lookup = lookup.into();
        let replacement = replacement.into();
        if lookup.is_empty() {
            return Err(TranslatorError::Configuration(format!(
                "mapping rule with replacement '{}' has an empty lookup",
                replacement
            )));
        }
        if lookup.contains(MARKER) || replacement.contains(MARKER) {
            return Err(TranslatorError::Configuration(format!(
                "mapping rule '{}' contains the reserved character U+E000",
                lookup.replace(MARKER, "")
            )));
        }
        Ok(MappingRule {
            lookup,
            replacement,
        })
    }

    pub fn lookup(&self) -> &str {
        &self.lookup
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }
}

/// Rules in table row order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingTable {
    name: String,
    rules: Vec<MappingRule>,
}

impl MappingTable {
    pub fn new(name: impl Into<String>, rules: Vec<MappingRule>) -> Self {
        MappingTable {
            name: name.into(),
            rules,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rules(&self) -> &[MappingRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Replace every non-overlapping occurrence of `lookup`, scanning left to
/// right, except occurrences that start on marker-prefixed text.
fn replace_unprotected(text: &str, lookup: &str, inflated: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(i) = rest.find(lookup) {
        if rest[..i].ends_with(MARKER) {
            // inserted by an earlier rule; step over its first character
            let width = rest[i..].chars().next().map_or(1, char::len_utf8);
            out.push_str(&rest[..i + width]);
            rest = &rest[i + width..];
        } else {
            out.push_str(&rest[..i]);
            out.push_str(inflated);
            rest = &rest[i + lookup.len()..];
        }
    }
    out.push_str(rest);
    out
}

/// Apply every rule of `table` in row order, leaving markers in place.
///
/// Callers chaining several tables strip the markers once at the end with
/// [`strip_markers`]; [`substitute`] does both for a single table.
pub fn apply_table(text: &str, table: &MappingTable, mode: Mode) -> String {
    table.rules().iter().fold(text.to_string(), |current, rule| {
        debug!(
            table = table.name(),
            "replacing {} with {}",
            rule.lookup(),
            rule.replacement()
        );
        replace_unprotected(&current, rule.lookup(), &mode.inflate(rule))
    })
}

pub fn substitute(text: &str, table: &MappingTable, mode: Mode) -> String {
    strip_markers(&apply_table(&strip_markers(text), table, mode))
}
