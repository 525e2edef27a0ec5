//! Semicolon-delimited participant lists.
//!
//! The delimited string is the wire and storage format; components parse it
//! into an ordered list at their boundary and re-join only when serializing
//! back out.

/// Split a `a@x;b@y` list into trimmed, non-empty entries.
pub fn split_participants(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn join_participants(entries: &[String]) -> String {
    entries.join(";")
}

/// Union of the meeting-level list and one item's additional list, keeping
/// first-appearance order and dropping duplicates.
pub fn combine_participants(fixed: &str, additional: &str) -> Vec<String> {
    let mut combined = split_participants(fixed);
    for entry in split_participants(additional) {
        if !combined.contains(&entry) {
            combined.push(entry);
        }
    }
    combined
}

/// Union across the meeting and every agenda item, first appearance wins.
pub fn collect_unique_participants(fixed: &str, additional_lists: &[&str]) -> Vec<String> {
    let mut unique = split_participants(fixed);
    for list in additional_lists {
        for entry in split_participants(list) {
            if !unique.contains(&entry) {
                unique.push(entry);
            }
        }
    }
    unique
}
