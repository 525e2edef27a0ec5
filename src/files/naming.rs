//! Folder-safe naming for meetings and agenda items.

use chrono::DateTime;
use chrono_tz::Tz;

/// Reduce a title to a folder-safe form: at most 40 characters, everything
/// outside the allow-list (word characters, digits, whitespace, `-`, `_`,
/// `.` and the German umlauts) replaced with `_`, then trimmed.
pub fn safe_string(unsafe_string: &str) -> String {
    unsafe_string
        .chars()
        .take(40)
        .map(|c| {
            if c.is_ascii_alphanumeric()
                || c == '_'
                || c == '-'
                || c == '.'
                || c.is_whitespace()
                || "äöüÄÖÜß".contains(c)
            {
                c
            } else {
                '_'
            }
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Canonical meeting folder name: `YYYY-MM-DD - <safe title>`, with the date
/// rendered in the meeting's own zone.
pub fn meeting_folder_name(start_local: DateTime<Tz>, title: &str) -> String {
    format!("{} - {}", start_local.format("%Y-%m-%d"), safe_string(title))
}

/// Canonical agenda item folder name: `NN - <safe title>`, where `NN` is the
/// one-based position, zero-padded to two digits.
pub fn agenda_folder_name(order_index: i64, title: &str) -> String {
    format!("{:02} - {}", order_index + 1, safe_string(title))
}
