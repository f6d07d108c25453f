//! Marker regions as named slots.
//!
//! A slot is delimited by a begin line and an end line, both carrying the
//! slot name:
//!
//! ```text
//! // scaffold:begin model
//! pub struct UserExample { pub id: i64 }
//! // scaffold:end model
//! ```
//!
//! Parsing fails on any marker that is not paired inside the same file, so a
//! broken template never produces truncated output.

use crate::error::{Result, ScaffoldError};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Prefixes that open and close a marker region
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarkerStyle {
    pub begin: String,
    pub end: String,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        MarkerStyle {
            begin: "// scaffold:begin".to_string(),
            end: "// scaffold:end".to_string(),
        }
    }
}

/// What to do with a slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotFill {
    Delete,
    Inject(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Region {
    slot: String,
    /// Index of the begin marker line
    begin: usize,
    /// Index of the end marker line
    end: usize,
}

/// A text split into lines with its marker regions located
#[derive(Debug, Clone)]
pub struct SlotTemplate<'a> {
    lines: Vec<&'a str>,
    regions: Vec<Region>,
}

fn marker_name<'l>(line: &'l str, prefix: &str) -> Option<&'l str> {
    let rest = line.trim().strip_prefix(prefix)?;
    // `// scaffold:beginning` is not a marker
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return None;
    }
    Some(rest.trim())
}

impl<'a> SlotTemplate<'a> {
    /// Locate every region of `text`
    ///
    /// `origin` only labels errors. Regions may not nest.
    pub fn parse(text: &'a str, markers: &MarkerStyle, origin: &Path) -> Result<Self> {
        let unpaired = |slot: &str, marker: &str, line: usize| ScaffoldError::UnpairedMarker {
            file: origin.to_path_buf(),
            slot: slot.to_string(),
            marker: marker.to_string(),
            line: line + 1,
        };

        let lines: Vec<&str> = text.split_inclusive('\n').collect();
        let mut regions = Vec::new();
        let mut open: Option<(String, usize)> = None;

        for (index, line) in lines.iter().enumerate() {
            if let Some(name) = marker_name(line, &markers.begin) {
                if let Some((slot, at)) = open {
                    return Err(unpaired(&slot, &markers.begin, at));
                }
                if name.is_empty() {
                    return Err(unpaired(name, &markers.begin, index));
                }
                open = Some((name.to_string(), index));
            } else if let Some(name) = marker_name(line, &markers.end) {
                match open.take() {
                    Some((slot, begin)) if slot == name => regions.push(Region {
                        slot,
                        begin,
                        end: index,
                    }),
                    Some((slot, begin)) => return Err(unpaired(&slot, &markers.begin, begin)),
                    None => return Err(unpaired(name, &markers.end, index)),
                }
            }
        }
        if let Some((slot, at)) = open {
            return Err(unpaired(&slot, &markers.begin, at));
        }
        Ok(SlotTemplate { lines, regions })
    }

    pub fn slots(&self) -> impl Iterator<Item = &str> {
        self.regions.iter().map(|r| r.slot.as_str())
    }

    pub fn has_slot(&self, slot: &str) -> bool {
        self.regions.iter().any(|r| r.slot == slot)
    }

    /// Resolve the filled slots; regions without a fill are kept verbatim
    pub fn render(&self, fills: &BTreeMap<String, SlotFill>) -> String {
        let mut out = String::new();
        let mut index = 0;
        let mut regions = self.regions.iter().peekable();
        while index < self.lines.len() {
            let region = regions.peek().filter(|r| r.begin == index);
            let Some(region) = region else {
                out.push_str(self.lines[index]);
                index += 1;
                continue;
            };
            match fills.get(&region.slot) {
                Some(SlotFill::Delete) => {}
                Some(SlotFill::Inject(text)) => {
                    out.push_str(text);
                    if !text.is_empty()
                        && !text.ends_with('\n')
                        && self.lines[region.end].ends_with('\n')
                    {
                        out.push('\n');
                    }
                }
                None => {
                    for line in &self.lines[region.begin..=region.end] {
                        out.push_str(line);
                    }
                }
            }
            index = region.end + 1;
            regions.next();
        }
        out
    }
}
