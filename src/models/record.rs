//! Field-name convention conversion between the storage representation
//! (PascalCase columns) and the domain representation (camelCase keys).
//!
//! The identity column is special-cased: `ID` maps to `id` and back, which
//! the generic first-letter rule would not produce.

use serde_json::{Map, Value};

fn lower_first(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn upper_first(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Storage keys -> domain keys (`Title` -> `title`, `ID` -> `id`).
pub fn to_domain_record(record: &Map<String, Value>) -> Map<String, Value> {
    let mut converted = Map::new();
    for (key, value) in record {
        let domain_key = if key == "ID" {
            "id".to_string()
        } else {
            lower_first(key)
        };
        converted.insert(domain_key, value.clone());
    }
    converted
}

/// Domain keys -> storage keys (`title` -> `Title`, `id` -> `ID`).
pub fn to_storage_record(record: &Map<String, Value>) -> Map<String, Value> {
    let mut converted = Map::new();
    for (key, value) in record {
        let storage_key = if key == "id" {
            "ID".to_string()
        } else {
            upper_first(key)
        };
        converted.insert(storage_key, value.clone());
    }
    converted
}

pub fn to_domain_records(records: &[Map<String, Value>]) -> Vec<Map<String, Value>> {
    records.iter().map(to_domain_record).collect()
}

pub fn to_storage_records(records: &[Map<String, Value>]) -> Vec<Map<String, Value>> {
    records.iter().map(to_storage_record).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn storage_to_domain_lowercases_first_letter() {
        let storage = record(&[
            ("Title", json!("Budget Sync")),
            ("DurationInMinutes", json!(30)),
        ]);
        let domain = to_domain_record(&storage);
        assert_eq!(domain["title"], json!("Budget Sync"));
        assert_eq!(domain["durationInMinutes"], json!(30));
    }

    #[test]
    fn identity_field_is_special_cased_both_ways() {
        let storage = record(&[("ID", json!(42))]);
        let domain = to_domain_record(&storage);
        assert_eq!(domain["id"], json!(42));
        assert!(!domain.contains_key("iD"));

        let back = to_storage_record(&domain);
        assert_eq!(back["ID"], json!(42));
        assert!(!back.contains_key("Id"));
    }

    #[test]
    fn round_trip_is_identity() {
        let storage = record(&[
            ("ID", json!(1)),
            ("StartTime", json!("2025-03-01T08:00:00+00:00")),
            ("Title", json!("Q3 Review")),
            ("FixedParticipants", json!("a@example.com;b@example.com")),
            ("FileLocationId", Value::Null),
        ]);
        let round_tripped = to_storage_record(&to_domain_record(&storage));
        assert_eq!(round_tripped, storage);

        let domain = to_domain_record(&storage);
        assert_eq!(to_domain_record(&to_storage_record(&domain)), domain);
    }
}
