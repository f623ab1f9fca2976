//! Cumulative-context engine
//!
//! Maintains the append-only, byte-bounded log stored in a memory block's
//! `value`. Entries are separated by a timestamped delimiter line; when the
//! budget overflows, the oldest entries are dropped and the value gains a
//! leading truncation marker. The newest entry is always preserved, cut
//! down with an explicit suffix if it alone cannot fit.
//!
//! Invariants upheld by [`append`]:
//! - the returned value never exceeds [`MAX_BLOCK_BYTES`] bytes
//! - the last entry is the new text, or the value is returned unchanged
//!   when the new text duplicates the most recent entry
//! - a leading [`TRUNCATION_MARKER`] appears exactly when entries were
//!   dropped or cut
//! - appending the same text twice is a no-op the second time

use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::OnceLock;

use crate::similarity::is_similar_entry;

/// Hard byte cap for a memory block value, kept under the runtime's
/// 5000-character API limit.
pub const MAX_BLOCK_BYTES: usize = 4800;

/// First line of a value that lost entries to truncation
pub const TRUNCATION_MARKER: &str = "--- OLDER ENTRIES TRUNCATED ---";

/// Suffix appended when the newest entry itself had to be cut
pub const TRUNCATED_SUFFIX: &str = " [CONTENT TRUNCATED]";

/// One parsed entry of a cumulative-context value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextEntry {
    /// Timestamp text from the delimiter; `None` for content that
    /// precedes the first delimiter (treated as the oldest entry)
    pub timestamp: Option<String>,
    /// Entry text with surrounding whitespace trimmed
    pub content: String,
}

impl ContextEntry {
    /// Rendered byte length including this entry's separator
    fn rendered_len(&self) -> usize {
        self.render().len()
    }

    /// Render the entry as it appears mid-value: separator plus content
    fn render(&self) -> String {
        match &self.timestamp {
            Some(ts) => format!("{}{}", delimiter_for(ts), self.content),
            None => format!("\n\n{}", self.content),
        }
    }
}

fn delimiter_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n\n--- CONTEXT ENTRY \(([^)]+)\) ---\n\n").unwrap())
}

/// Delimiter for a new entry created now
pub fn entry_delimiter(now: DateTime<Utc>) -> String {
    delimiter_for(&now.format("%Y-%m-%d %H:%M:%S UTC").to_string())
}

fn delimiter_for(timestamp: &str) -> String {
    format!("\n\n--- CONTEXT ENTRY ({timestamp}) ---\n\n")
}

/// Parse a stored value into its entries, oldest first
pub fn parse_entries(value: &str) -> Vec<ContextEntry> {
    let mut entries = Vec::new();
    let mut pending_timestamp: Option<String> = None;
    let mut last_end = 0;

    for caps in delimiter_regex().captures_iter(value) {
        let whole = caps.get(0).expect("match always has a full capture");
        push_entry(&mut entries, pending_timestamp.take(), &value[last_end..whole.start()]);
        pending_timestamp = Some(caps[1].to_string());
        last_end = whole.end();
    }
    push_entry(&mut entries, pending_timestamp, &value[last_end..]);

    entries
}

fn push_entry(entries: &mut Vec<ContextEntry>, timestamp: Option<String>, content: &str) {
    let trimmed = content.trim();
    if !trimmed.is_empty() {
        entries.push(ContextEntry {
            timestamp,
            content: trimmed.to_string(),
        });
    }
}

/// Append `new_entry` to `existing` with deduplication and truncation,
/// stamping the entry with the current time.
pub fn append(existing: &str, new_entry: &str) -> String {
    append_at(existing, new_entry, Utc::now())
}

/// [`append`] with an explicit clock, used by tests
pub fn append_at(existing: &str, new_entry: &str, now: DateTime<Utc>) -> String {
    if new_entry.trim().is_empty() {
        return existing.to_string();
    }

    let delimiter = entry_delimiter(now);

    if existing.trim().is_empty() {
        if new_entry.len() <= MAX_BLOCK_BYTES {
            return new_entry.to_string();
        }
        return truncate_single(new_entry, &delimiter);
    }

    let mut entries = parse_entries(existing);
    if let Some(latest) = entries.last() {
        if is_similar_entry(&latest.content, new_entry) {
            return existing.to_string();
        }
    }

    let candidate = format!("{existing}{delimiter}{new_entry}");
    if candidate.len() <= MAX_BLOCK_BYTES {
        return candidate;
    }

    entries.push(ContextEntry {
        timestamp: Some(now.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
        content: new_entry.trim().to_string(),
    });
    truncate_oldest(&entries, &delimiter)
}

/// Drop oldest entries until the value fits the budget. The newest entry
/// is always kept, cut down if it alone overflows.
fn truncate_oldest(entries: &[ContextEntry], newest_delimiter: &str) -> String {
    let newest = entries.last().expect("truncation requires at least one entry");

    if TRUNCATION_MARKER.len() + newest_delimiter.len() + newest.content.len() > MAX_BLOCK_BYTES {
        return truncate_single(&newest.content, newest_delimiter);
    }

    // Walk from second-newest to oldest, keeping entries while they fit.
    let mut kept: Vec<&ContextEntry> = vec![newest];
    let mut size = TRUNCATION_MARKER.len() + newest.rendered_len();
    for entry in entries.iter().rev().skip(1) {
        let next_size = size + entry.rendered_len();
        if next_size > MAX_BLOCK_BYTES {
            break;
        }
        kept.push(entry);
        size = next_size;
    }

    let mut value = String::with_capacity(size);
    value.push_str(TRUNCATION_MARKER);
    for entry in kept.iter().rev() {
        value.push_str(&entry.render());
    }
    value
}

/// Emit a single cut-down entry behind the truncation marker. The prefix
/// budget reserves room for the marker, one delimiter, and the suffix so
/// the result stays within [`MAX_BLOCK_BYTES`].
fn truncate_single(content: &str, delimiter: &str) -> String {
    let budget = MAX_BLOCK_BYTES
        .saturating_sub(TRUNCATION_MARKER.len())
        .saturating_sub(delimiter.len())
        .saturating_sub(TRUNCATED_SUFFIX.len());
    let prefix = truncate_to_char_boundary(content.trim(), budget);
    format!("{TRUNCATION_MARKER}{delimiter}{prefix}{TRUNCATED_SUFFIX}")
}

/// Cut `s` to at most `max_bytes`, stepping back to a UTF-8 boundary
fn truncate_to_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
