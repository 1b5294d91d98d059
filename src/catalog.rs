//! Event namespace loaded from definition text.
//!
//! One logical line per event:
//!
//! ```text
//! # comment
//! SW_DIR      [default switch]   Direction switch.
//! TIMEOUT_[4] [timer]            Timer expiry.
//!     Continuation lines start with whitespace.
//! ```
//!
//! Identities are handed out in definition order. `NAME[n]` declares `n`
//! events `NAME0..NAME{n-1}`; only the first keeps the description. Every
//! event also belongs to the group `all`.

use std::collections::HashMap;

use crate::{Error, EventId, Result};

/// Name of the group every event belongs to
pub const GROUP_ALL: &str = "all";

/// One defined event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDef {
    /// Event name without any prefix
    pub name: String,
    /// Short description, empty for the tail of a multi event
    pub description: String,
    /// Trace groups, lower case, always ending with `all`
    pub groups: Vec<String>,
}

/// The events of a machine, indexed by identity
#[derive(Debug, Clone, Default)]
pub struct EventCatalog {
    events: Vec<EventDef>,
    by_name: HashMap<String, EventId>,
    multi: Vec<(String, usize)>,
}

impl EventCatalog {
    /// Parse definition text
    pub fn parse(text: &str) -> Result<Self> {
        let mut catalog = EventCatalog::default();
        for (line, content) in logical_lines(text)? {
            catalog.add_line(line, &content)?;
        }
        Ok(catalog)
    }

    fn add_line(&mut self, line: usize, content: &str) -> Result<()> {
        let malformed = || Error::MalformedEvent {
            line,
            text: content.to_string(),
        };

        let (head, rest) = content.split_once(' ').unwrap_or((content, ""));
        let (name, multi) = match head.split_once('[') {
            Some((name, count)) => {
                let count = count.strip_suffix(']').ok_or_else(malformed)?;
                (name, Some(count))
            }
            None => (head, None),
        };
        if !is_ident(name) {
            return Err(malformed());
        }

        let rest = rest.trim_start();
        let (mut groups, description) = match rest.strip_prefix('[') {
            Some(bracketed) => {
                let (groups, description) = bracketed.split_once(']').ok_or_else(malformed)?;
                let groups: Vec<String> =
                    groups.split_whitespace().map(str::to_lowercase).collect();
                (groups, description.trim())
            }
            None => (Vec::new(), rest),
        };
        groups.push(GROUP_ALL.to_string());

        match multi {
            None => self.add(line, name.to_string(), description, groups),
            Some(count) => {
                let count: i64 = count.trim().parse().map_err(|_| Error::BadMultiCount {
                    line,
                    count: count.to_string(),
                })?;
                if count <= 0 {
                    return Ok(());
                }
                self.multi
                    .push((name.trim_end_matches('_').to_string(), count as usize));
                for n in 0..count {
                    let desc = if n == 0 { description } else { "" };
                    self.add(line, format!("{name}{n}"), desc, groups.clone())?;
                }
                Ok(())
            }
        }
    }

    fn add(&mut self, line: usize, name: String, description: &str, groups: Vec<String>) -> Result<()> {
        if self.by_name.contains_key(&name) {
            return Err(Error::DuplicateEvent { line, name });
        }
        let id = u8::try_from(self.events.len())
            .map_err(|_| Error::TooManyEvents(self.events.len() + 1))?;
        self.by_name.insert(name.clone(), EventId(id));
        self.events.push(EventDef {
            name,
            description: description.to_string(),
            groups,
        });
        Ok(())
    }

    /// Number of defined events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True if no events are defined
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Identity of a named event
    pub fn id(&self, name: &str) -> Option<EventId> {
        self.by_name.get(name).copied()
    }

    /// Definition of an event
    pub fn get(&self, id: EventId) -> Option<&EventDef> {
        self.events.get(id.0 as usize)
    }

    /// Name of an event
    pub fn name(&self, id: EventId) -> Option<&str> {
        self.get(id).map(|def| def.name.as_str())
    }

    /// Description of an event
    pub fn description(&self, id: EventId) -> Option<&str> {
        self.get(id).map(|def| def.description.as_str())
    }

    /// Number of events a multi definition expanded to
    pub fn multi_count(&self, name: &str) -> Option<usize> {
        let name = name.trim_end_matches('_');
        self.multi
            .iter()
            .find(|(multi, _)| multi == name)
            .map(|(_, count)| *count)
    }

    /// Every group mentioned, in first-seen order
    pub fn groups(&self) -> Vec<&str> {
        let mut groups: Vec<&str> = Vec::new();
        for group in self.events.iter().flat_map(|def| def.groups.iter()) {
            if !groups.contains(&group.as_str()) {
                groups.push(group);
            }
        }
        groups
    }

    /// Mask of the events in `group`, `None` if no event is in it
    pub fn trace_mask(&self, group: &str) -> Option<TraceMask> {
        let group = group.to_lowercase();
        let mut mask = TraceMask::empty(self.len());
        let mut found = false;
        for (index, def) in self.events.iter().enumerate() {
            if def.groups.contains(&group) {
                mask.bits[index / 8] |= 1 << (index % 8);
                found = true;
            }
        }
        found.then_some(mask)
    }
}

/// Bitset of event identities selected for tracing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceMask {
    bits: Vec<u8>,
}

impl TraceMask {
    /// Mask covering `count` events with nothing selected.
    ///
    /// Storage is rounded up to whole 16 bit words.
    pub fn empty(count: usize) -> Self {
        Self {
            bits: vec![0; 2 * count.div_ceil(16)],
        }
    }

    /// True if `id` is selected
    pub fn contains(&self, id: EventId) -> bool {
        let index = id.0 as usize;
        self.bits
            .get(index / 8)
            .is_some_and(|byte| byte & (1 << (index % 8)) != 0)
    }

    /// Select `id`; identities beyond the mask are ignored
    pub fn insert(&mut self, id: EventId) {
        let index = id.0 as usize;
        if let Some(byte) = self.bits.get_mut(index / 8) {
            *byte |= 1 << (index % 8);
        }
    }

    /// Deselect `id`
    pub fn remove(&mut self, id: EventId) {
        let index = id.0 as usize;
        if let Some(byte) = self.bits.get_mut(index / 8) {
            *byte &= !(1 << (index % 8));
        }
    }

    /// Raw mask bytes, event 0 in bit 0 of the first byte
    pub fn as_bytes(&self) -> &[u8] {
        &self.bits
    }
}

fn is_ident(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Join continuation lines, drop blanks and comments, squash whitespace.
/// Returns the starting line number of each logical line.
fn logical_lines(text: &str) -> Result<Vec<(usize, String)>> {
    let mut lines: Vec<(usize, String)> = Vec::new();
    for (number, raw) in text.lines().enumerate() {
        let number = number + 1;
        if raw.trim().is_empty() || raw.starts_with('#') {
            continue;
        }
        let squashed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        if raw.starts_with(char::is_whitespace) {
            let (_, previous) = lines
                .last_mut()
                .ok_or(Error::OrphanContinuation(number))?;
            previous.push(' ');
            previous.push_str(&squashed);
        } else {
            lines.push((number, squashed));
        }
    }
    Ok(lines)
}
