//! Indirect object identifiers and textual reference rewriting
//!
//! Dictionary values are kept as raw text, so every place that needs to
//! follow, renumber or drop an `N G R` reference goes through the helpers in
//! this module. Matching is done on whole `number generation R` triples:
//! object `1` never matches inside `10 0 R` or `/F1 0 R`.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::fmt;

lazy_static! {
    static ref REFERENCE_RE: Regex = Regex::new(r"\b(\d+)\s+(\d+)\s+R\b").unwrap();
}

/// Identity of an indirect object: `(number, generation)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId {
    number: u32,
    generation: u16,
}

impl ObjectId {
    pub fn new(number: u32, generation: u16) -> Self {
        Self { number, generation }
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn generation(&self) -> u16 {
        self.generation
    }

    /// Parse a single `N G R` reference, ignoring surrounding whitespace.
    pub fn parse_reference(text: &str) -> Option<Self> {
        let caps = REFERENCE_RE.captures(text.trim())?;
        let whole = caps.get(0)?;
        if whole.start() != 0 || whole.end() != text.trim().len() {
            return None;
        }
        parse_captures(&caps)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} R", self.number, self.generation)
    }
}

fn parse_captures(caps: &Captures<'_>) -> Option<ObjectId> {
    let number = caps.get(1)?.as_str().parse().ok()?;
    let generation = caps.get(2)?.as_str().parse().ok()?;
    Some(ObjectId::new(number, generation))
}

/// Every reference found in `text`, in order of appearance.
pub fn references_in(text: &str) -> Vec<ObjectId> {
    REFERENCE_RE
        .captures_iter(text)
        .filter_map(|caps| parse_captures(&caps))
        .collect()
}

/// Replace every `old_number G R` with `new_number G R`, keeping `G`.
pub fn rewrite_reference(text: &str, old_number: u32, new_number: u32) -> String {
    let mut map = HashMap::with_capacity(1);
    map.insert(old_number, new_number);
    rewrite_references(text, &map)
}

/// Apply a whole renumbering map in a single pass.
///
/// Each reference is looked up once, so a chain such as `1 -> 2, 2 -> 3`
/// sends `1 0 R` to `2 0 R` and `2 0 R` to `3 0 R`, never `1 0 R` to `3 0 R`.
pub fn rewrite_references(text: &str, map: &HashMap<u32, u32>) -> String {
    if map.is_empty() {
        return text.to_string();
    }
    REFERENCE_RE
        .replace_all(text, |caps: &Captures<'_>| match parse_captures(caps) {
            Some(id) => match map.get(&id.number()) {
                Some(&new_number) => format!("{} {} R", new_number, id.generation()),
                None => caps[0].to_string(),
            },
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Drop every occurrence of `number generation R` from `text`.
///
/// Whitespace around the removed reference collapses to a single space when
/// the reference sat between two other tokens, so `[6 0 R 7 0 R 8 0 R]`
/// minus `7` reads `[6 0 R 8 0 R]`.
pub fn remove_reference(text: &str, number: u32, generation: u16) -> String {
    let pattern = format!(r"(\s*)\b{number}\s+{generation}\s+R\b(\s*)");
    let re = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(_) => return text.to_string(),
    };
    re.replace_all(text, |caps: &Captures<'_>| {
        let leading = caps.get(1).map_or("", |m| m.as_str());
        let trailing = caps.get(2).map_or("", |m| m.as_str());
        if !leading.is_empty() && !trailing.is_empty() {
            " ".to_string()
        } else {
            String::new()
        }
    })
    .into_owned()
}
