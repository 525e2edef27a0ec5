//! Assembles the JSON data model consumed by the document templates.
//!
//! Two shapes exist: the agenda overview (with per-item start times and an
//! optional remarks-suppressed "clean" variant) and the protocol draft.
//! All participant identifiers are resolved to display names beforehand;
//! the map passed in already has the override table applied.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use chrono::Locale;
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::models::agenda_item::{calculate_end_time, AgendaItem};
use crate::models::board_meeting::BoardMeeting;
use crate::models::participants;

/// Document creation stamps are always rendered in the organization's home
/// zone, independent of the meeting's zone.
const ORGANIZATION_ZONE: Tz = chrono_tz::Europe::Berlin;

fn locale_for(language: &str) -> Locale {
    match language.to_lowercase().as_str() {
        "de" => Locale::de_DE,
        _ => Locale::en_US,
    }
}

fn long_date(local: DateTime<Tz>, language: &str) -> String {
    let pattern = match language.to_lowercase().as_str() {
        "de" => "%A, %-d. %B %Y",
        _ => "%A, %B %-d, %Y",
    };
    local.format_localized(pattern, locale_for(language)).to_string()
}

fn short_date(local: DateTime<Tz>, language: &str) -> String {
    let pattern = match language.to_lowercase().as_str() {
        "de" => "%d.%m.%Y",
        _ => "%m/%d/%Y",
    };
    local.format(pattern).to_string()
}

fn short_time(local: DateTime<Tz>) -> String {
    local.format("%H:%M").to_string()
}

/// Recompose a profile's "Last, First" display form into "First Last".
///
/// Falls back to whichever part is non-empty. A participant absent from the
/// resolved map renders as a visible placeholder rather than breaking the
/// document.
pub fn lookup_display_name(names: &HashMap<String, String>, upn: &str) -> String {
    let raw = names.get(upn).map(String::as_str).unwrap_or_default();
    let mut parts = raw.splitn(2, ", ");
    let last_name = parts.next().unwrap_or_default().trim();
    let first_name = parts.next().unwrap_or_default().trim();
    if !first_name.is_empty() && !last_name.is_empty() {
        format!("{first_name} {last_name}")
    } else if !first_name.is_empty() {
        first_name.to_string()
    } else if !last_name.is_empty() {
        last_name.to_string()
    } else {
        "Unknown Participant".to_string()
    }
}

/// The deduplicated union of meeting-level and per-item participants, in
/// first-appearance order.
pub fn collect_participants(meeting: &BoardMeeting, items: &[AgendaItem]) -> Vec<String> {
    let additional: Vec<&str> = items
        .iter()
        .map(|item| item.additional_participants.as_str())
        .collect();
    participants::collect_unique_participants(&meeting.fixed_participants, &additional)
}

fn fixed_participants_json(
    meeting: &BoardMeeting,
    items: &[AgendaItem],
    names: &HashMap<String, String>,
) -> Value {
    Value::Array(
        participants::split_participants(&meeting.fixed_participants)
            .iter()
            .map(|upn| {
                json!({
                    "fixedPerson": lookup_display_name(names, upn),
                    "totalTops": items.len(),
                })
            })
            .collect(),
    )
}

fn additional_participants_line(item: &AgendaItem, names: &HashMap<String, String>) -> String {
    participants::split_participants(&item.additional_participants)
        .iter()
        .map(|upn| lookup_display_name(names, upn))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Data model for the agenda overview template.
pub fn agenda_template_data(
    meeting: &BoardMeeting,
    items: &[AgendaItem],
    language: &str,
    include_remarks: bool,
    names: &HashMap<String, String>,
    now: DateTime<Utc>,
) -> Result<Value, AppError> {
    let zone = meeting.zone()?;
    let local_start = meeting.start_time.with_timezone(&zone);
    let local_end = calculate_end_time(meeting.start_time, items).with_timezone(&zone);
    let local_now = now.with_timezone(&ORGANIZATION_ZONE);

    let tops_details: Vec<Value> = items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let mut detail = json!({
                "agendaTitle": item.title,
                "i": (index + 1).to_string(),
                "additionalParticipants": additional_participants_line(item, names),
                "isMisc": item.is_misc,
                "hasBody": !item.is_misc,
                "isDecision": item.needs_decision,
                "hasAdditionalParticipants": !item.additional_participants.is_empty(),
                "durationInMinutes": item.duration_in_minutes,
                "startTime": item
                    .start_time
                    .map(|start| short_time(start.with_timezone(&zone)))
                    .unwrap_or_default(),
                "includeRemarks": include_remarks,
            });
            if include_remarks && !item.remarks.is_empty() {
                detail["remarks"] = json!(item.remarks);
            }
            detail
        })
        .collect();

    Ok(json!({
        "meetingTitle": meeting.title,
        "meetingDate": long_date(local_start, language),
        "meetingTime": short_time(local_start),
        "meetingLocation": meeting.location,
        "fixedParticipants": fixed_participants_json(meeting, items, names),
        "topsDetails": tops_details,
        "creationDate": format!(
            "{} {}",
            short_date(local_now, language),
            short_time(local_now)
        ),
        "meetingEndTime": short_time(local_end),
    }))
}

/// Data model for the protocol draft template.
pub fn protocol_template_data(
    meeting: &BoardMeeting,
    items: &[AgendaItem],
    language: &str,
    names: &HashMap<String, String>,
) -> Result<Value, AppError> {
    let zone = meeting.zone()?;
    let local_start = meeting.start_time.with_timezone(&zone);

    let tops_details: Vec<Value> = items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            json!({
                "agendaTitle": item.title,
                "i": (index + 1).to_string(),
                "additionalParticipants": additional_participants_line(item, names),
                "isMisc": item.is_misc,
                "hasBody": !item.is_misc && !item.remarks.is_empty(),
                "isDecision": item.needs_decision,
                "hasAdditionalParticipants": !item.additional_participants.is_empty(),
                "remarks": item.remarks,
            })
        })
        .collect();

    Ok(json!({
        "meetingTitle": meeting.title,
        "meetingDate": short_date(local_start, language),
        "meetingLocation": meeting.location,
        "topsCount": items.len(),
        "fixedParticipants": fixed_participants_json(meeting, items, names),
        "topsDetails": tops_details,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use crate::models::agenda_item::calculate_timestamps;

    fn meeting() -> BoardMeeting {
        BoardMeeting {
            id: Some(1),
            start_time: Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap(),
            title: "Budget Sync".into(),
            fixed_participants: "anna.schmidt@example.com;guest@external.org".into(),
            remarks: String::new(),
            location: "Berlin HQ".into(),
            room: "R-401".into(),
            time_zone: "Europe/Berlin".into(),
            meeting_link: None,
            file_location_id: None,
            event_id: None,
        }
    }

    fn items() -> Vec<AgendaItem> {
        let mut items = vec![
            AgendaItem {
                id: Some(10),
                board_meeting: Some(1),
                order_index: 0,
                duration_in_minutes: 10,
                title: "Intro".into(),
                additional_participants: String::new(),
                is_misc: false,
                needs_decision: false,
                remarks: "welcome round".into(),
                file_location_id: None,
                protocol_location_id: None,
                event_id: None,
                start_time: None,
                is_new: false,
            },
            AgendaItem {
                id: Some(11),
                board_meeting: Some(1),
                order_index: 1,
                duration_in_minutes: 50,
                title: "Finance".into(),
                additional_participants: "cfo@example.com".into(),
                is_misc: false,
                needs_decision: true,
                remarks: String::new(),
                file_location_id: None,
                protocol_location_id: None,
                event_id: None,
                start_time: None,
                is_new: false,
            },
        ];
        calculate_timestamps(
            Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap(),
            &mut items,
        );
        items
    }

    fn names() -> HashMap<String, String> {
        let mut names = HashMap::new();
        names.insert("anna.schmidt@example.com".into(), "Schmidt, Anna".into());
        names.insert("guest@external.org".into(), "guest@external.org".into());
        names.insert("cfo@example.com".into(), "Finanzchefin".into());
        names
    }

    #[test]
    fn display_name_recomposition_and_fallbacks() {
        let names = names();
        assert_eq!(
            lookup_display_name(&names, "anna.schmidt@example.com"),
            "Anna Schmidt"
        );
        // Echoed external UPN has no comma, so it stays as-is.
        assert_eq!(
            lookup_display_name(&names, "guest@external.org"),
            "guest@external.org"
        );
        // Single-part override passes through.
        assert_eq!(lookup_display_name(&names, "cfo@example.com"), "Finanzchefin");
        // Entirely unresolved participants get the placeholder.
        assert_eq!(
            lookup_display_name(&names, "nobody@example.com"),
            "Unknown Participant"
        );
    }

    #[test]
    fn agenda_data_derives_times_in_the_meeting_zone() {
        let now = Utc.with_ymd_and_hms(2025, 2, 20, 11, 30, 0).unwrap();
        let data =
            agenda_template_data(&meeting(), &items(), "DE", true, &names(), now).unwrap();
        assert_eq!(data["meetingTime"], json!("09:00"));
        assert_eq!(data["meetingEndTime"], json!("10:00"));
        assert_eq!(data["topsDetails"][0]["startTime"], json!("09:00"));
        assert_eq!(data["topsDetails"][1]["startTime"], json!("09:10"));
        assert_eq!(data["meetingDate"], json!("Samstag, 1. März 2025"));
        assert_eq!(data["creationDate"], json!("20.02.2025 12:30"));
        assert_eq!(data["topsDetails"][0]["remarks"], json!("welcome round"));
    }

    #[test]
    fn clean_variant_omits_remarks_but_keeps_the_shape() {
        let now = Utc.with_ymd_and_hms(2025, 2, 20, 11, 30, 0).unwrap();
        let data =
            agenda_template_data(&meeting(), &items(), "EN", false, &names(), now).unwrap();
        assert!(data["topsDetails"][0].get("remarks").is_none());
        assert_eq!(data["topsDetails"][0]["includeRemarks"], json!(false));
        assert_eq!(data["meetingDate"], json!("Saturday, March 1, 2025"));
    }

    #[test]
    fn protocol_data_counts_tops_and_marks_bodies() {
        let data = protocol_template_data(&meeting(), &items(), "DE", &names()).unwrap();
        assert_eq!(data["topsCount"], json!(2));
        assert_eq!(data["meetingDate"], json!("01.03.2025"));
        // Intro has remarks -> body; Finance does not.
        assert_eq!(data["topsDetails"][0]["hasBody"], json!(true));
        assert_eq!(data["topsDetails"][1]["hasBody"], json!(false));
        assert_eq!(
            data["topsDetails"][1]["additionalParticipants"],
            json!("Finanzchefin")
        );
    }
}
