//! Block parser.
//!
//! A library document is plain text. Lines before the first header form the
//! preface; every `[name]` or `[name:arg1:arg2]` header opens a block that
//! collects the lines following it until the next header.
//!
//! ```text
//! Greeting queries.
//!
//! [all_greetings]
//! select * from greetings
//!
//! [greeting_by_id:id]
//! select * from greetings where id = $1
//! ```
//!
//! Lines are stored exactly as given, terminators included, so joining a
//! block's statements reproduces its source text.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::trace;

/// A named group of raw statement lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Block name, taken from the header.
    pub name: String,
    /// Declared parameter names, in header order.
    pub params: Vec<String>,
    /// Raw statement lines, in document order.
    pub statements: Vec<String>,
}

impl Block {
    /// Creates an empty block.
    #[must_use]
    pub fn new(name: impl Into<String>, params: Vec<String>) -> Self {
        Self {
            name: name.into(),
            params,
            statements: Vec::new(),
        }
    }

    /// Returns the statement lines joined into the block's SQL text.
    #[must_use]
    pub fn body(&self) -> String {
        self.statements.concat()
    }
}

/// The output of [`parse`]: preface text plus blocks keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Preface lines joined with `\n`.
    pub preface: String,
    /// Blocks keyed by name.
    pub blocks: BTreeMap<String, Block>,
}

/// Parses a header line into a block name and declared parameter names.
///
/// Returns `None` when the trimmed line is not bracketed.
fn parse_header(line: &str) -> Option<(&str, Vec<String>)> {
    let trimmed = line.trim();
    if !(trimmed.starts_with('[') && trimmed.ends_with(']')) {
        return None;
    }
    let body = trimmed.trim_matches(|c| c == '[' || c == ']');

    let mut parts = body.split(':');
    let name = parts.next().unwrap_or_default();
    Some((name, parts.map(String::from).collect()))
}

/// Parses document lines into a preface and named blocks.
///
/// Lines are kept verbatim. A header seen again re-enters its existing block;
/// the parameter list from the first occurrence is kept. An empty header
/// (`[]`) opens a block named `""`.
#[must_use]
pub fn parse<I, S>(lines: I) -> Document
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut preface: Vec<String> = Vec::new();
    let mut blocks: BTreeMap<String, Block> = BTreeMap::new();
    let mut current: Option<String> = None;

    for line in lines {
        let line = line.as_ref();

        if let Some((name, params)) = parse_header(line) {
            trace!(name, ?params, "block header");
            if let Entry::Vacant(entry) = blocks.entry(name.to_string()) {
                entry.insert(Block::new(name, params));
            }
            current = Some(name.to_string());
            continue;
        }

        match current.as_ref().and_then(|name| blocks.get_mut(name)) {
            Some(block) => block.statements.push(line.to_string()),
            None => preface.push(line.to_string()),
        }
    }

    Document {
        preface: preface.join("\n"),
        blocks,
    }
}

/// Splits text into lines, each terminated by `\n`.
///
/// Every line gets a terminator, including a final line that had none, so a
/// block's body always ends with a newline.
#[must_use]
pub fn split_lines(text: &str) -> Vec<String> {
    text.lines().map(|line| format!("{line}\n")).collect()
}

/// Splits file contents into lines, keeping terminators as they appear.
///
/// A final line without a terminator stays unterminated.
#[must_use]
pub fn split_lines_inclusive(text: &str) -> Vec<String> {
    text.split_inclusive('\n').map(String::from).collect()
}
