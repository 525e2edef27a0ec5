//! Invite drift classification.
//!
//! Ground truth lives in the database; the remote calendar can drift through
//! manual edits, deletions or sends. [`classify`] compares the expected
//! invite against the observed remote event and yields one of seven states.
//! The function is pure so every transition is testable without I/O.

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InviteKind {
    /// The meeting-level invite covering the whole session.
    Meeting,
    /// A per-agenda-item invite for additional participants.
    AgendaItem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InviteStatus {
    /// An event id exists; drift has not been checked yet.
    Created,
    /// No remote event exists.
    Missing,
    /// Remote event matches ground truth but was never sent.
    UnsentDraft,
    /// Remote event matches ground truth and is sent. Terminal.
    SentCurrent,
    /// Remote event drifted and is still a draft.
    StaleUnsent,
    /// Remote event drifted after it was already sent.
    StaleSent,
    /// Remote state could not be determined; reload required.
    Unknown,
}

impl InviteStatus {
    pub fn message(&self) -> &'static str {
        match self {
            InviteStatus::Created => "Einladung erstellt",
            InviteStatus::Missing => "Einladung fehlt",
            InviteStatus::UnsentDraft => "Einladung erstellt, noch nicht versendet",
            InviteStatus::SentCurrent => "Einladung erstellt und versendet",
            InviteStatus::StaleUnsent => "Einladung veraltet, noch nicht versendet",
            InviteStatus::StaleSent => "Einladung veraltet aber schon versendet",
            InviteStatus::Unknown => "Einladungstatus unbekannt. Bitte neu laden.",
        }
    }

    pub fn action_label(&self) -> &'static str {
        match self {
            InviteStatus::Created | InviteStatus::SentCurrent => "Keine Aktion notwendig",
            InviteStatus::Missing => "Einladung erstellen",
            InviteStatus::UnsentDraft => "Öffnen zum Senden",
            InviteStatus::StaleUnsent => "Einladung aktualisieren",
            InviteStatus::StaleSent => "Einladung aktualisieren und senden",
            InviteStatus::Unknown => "Bitte App neu laden",
        }
    }

    pub fn is_action_enabled(&self) -> bool {
        !matches!(self, InviteStatus::Created | InviteStatus::SentCurrent)
    }
}

/// What the database says the invite should look like. Attendees are the
/// resolved primary mail addresses of the expected participant set.
#[derive(Debug, Clone)]
pub struct ExpectedInvite {
    pub kind: InviteKind,
    pub subject: String,
    /// Item invites historically also used `<meeting title> - <item title>`
    /// as the subject; both forms count as a match.
    pub combined_subject: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub room: String,
    pub attendees: Vec<String>,
}

/// What the remote calendar currently holds.
#[derive(Debug, Clone)]
pub struct ObservedInvite {
    pub subject: String,
    pub is_draft: bool,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub location: String,
    pub attendees: Vec<String>,
}

fn attendee_sets_match(expected: &[String], observed: &[String]) -> bool {
    if expected.is_empty() {
        return observed.is_empty();
    }
    let mut expected: Vec<&str> = expected.iter().map(String::as_str).collect();
    let mut observed: Vec<&str> = observed.iter().map(String::as_str).collect();
    expected.sort_unstable();
    expected.dedup();
    observed.sort_unstable();
    observed.dedup();
    expected == observed
}

/// The transition function of the state machine.
///
/// Meeting-level invites skip the attendee and room comparison: the meeting
/// event is owned by a fixed host list and its location is informational.
pub fn classify(expected: &ExpectedInvite, observed: Option<&ObservedInvite>) -> InviteStatus {
    let Some(observed) = observed else {
        return InviteStatus::Missing;
    };

    let subject_matches = observed.subject == expected.subject
        || expected
            .combined_subject
            .as_deref()
            .is_some_and(|combined| observed.subject == combined);
    let attendees_match = expected.kind == InviteKind::Meeting
        || attendee_sets_match(&expected.attendees, &observed.attendees);
    let room_matches =
        expected.kind == InviteKind::Meeting || observed.location == expected.room;
    let times_match = observed.start == expected.start && observed.end == expected.end;

    let current = subject_matches && attendees_match && room_matches && times_match;
    match (current, observed.is_draft) {
        (true, true) => InviteStatus::UnsentDraft,
        (true, false) => InviteStatus::SentCurrent,
        (false, true) => InviteStatus::StaleUnsent,
        (false, false) => InviteStatus::StaleSent,
    }
}

/// The automation loop never leaves an item as a draft: anything that would
/// stay unsent is relabeled so the next update forces a send.
pub fn relabel_for_send(status: InviteStatus) -> InviteStatus {
    match status {
        InviteStatus::UnsentDraft | InviteStatus::StaleUnsent => InviteStatus::StaleSent,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn expected_item() -> ExpectedInvite {
        ExpectedInvite {
            kind: InviteKind::AgendaItem,
            subject: "Q3 Review".into(),
            combined_subject: Some("Budget Sync - Q3 Review".into()),
            start: Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 3, 1, 8, 30, 0).unwrap(),
            room: "R-401".into(),
            attendees: vec!["a@example.com".into(), "b@example.com".into()],
        }
    }

    fn matching_observation() -> ObservedInvite {
        ObservedInvite {
            subject: "Q3 Review".into(),
            is_draft: true,
            start: Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 3, 1, 8, 30, 0).unwrap(),
            location: "R-401".into(),
            attendees: vec!["b@example.com".into(), "a@example.com".into()],
        }
    }

    #[test]
    fn no_remote_event_is_missing() {
        assert_eq!(classify(&expected_item(), None), InviteStatus::Missing);
    }

    #[test]
    fn matching_draft_is_unsent_draft() {
        let observed = matching_observation();
        assert_eq!(
            classify(&expected_item(), Some(&observed)),
            InviteStatus::UnsentDraft
        );
    }

    #[test]
    fn drifted_start_time_makes_a_draft_stale() {
        let mut observed = matching_observation();
        observed.start = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        assert_eq!(
            classify(&expected_item(), Some(&observed)),
            InviteStatus::StaleUnsent
        );
    }

    #[test]
    fn drifted_sent_event_is_stale_sent() {
        let mut observed = matching_observation();
        observed.start = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        observed.is_draft = false;
        assert_eq!(
            classify(&expected_item(), Some(&observed)),
            InviteStatus::StaleSent
        );
    }

    #[test]
    fn matching_sent_event_is_current() {
        let mut observed = matching_observation();
        observed.is_draft = false;
        assert_eq!(
            classify(&expected_item(), Some(&observed)),
            InviteStatus::SentCurrent
        );
    }

    #[test]
    fn combined_subject_form_counts_as_match() {
        let mut observed = matching_observation();
        observed.subject = "Budget Sync - Q3 Review".into();
        assert_eq!(
            classify(&expected_item(), Some(&observed)),
            InviteStatus::UnsentDraft
        );
    }

    #[test]
    fn meeting_kind_ignores_attendees_and_room() {
        let mut expected = expected_item();
        expected.kind = InviteKind::Meeting;
        expected.combined_subject = None;
        let mut observed = matching_observation();
        observed.attendees = vec!["host@example.com".into()];
        observed.location = "somewhere else".into();
        assert_eq!(
            classify(&expected, Some(&observed)),
            InviteStatus::UnsentDraft
        );
    }

    #[test]
    fn attendee_mismatch_makes_item_stale() {
        let mut observed = matching_observation();
        observed.attendees = vec!["a@example.com".into()];
        assert_eq!(
            classify(&expected_item(), Some(&observed)),
            InviteStatus::StaleUnsent
        );
    }

    #[test]
    fn empty_expected_set_requires_empty_remote_set() {
        let mut expected = expected_item();
        expected.attendees.clear();
        let mut observed = matching_observation();
        observed.attendees.clear();
        assert_eq!(
            classify(&expected, Some(&observed)),
            InviteStatus::UnsentDraft
        );
        observed.attendees = vec!["a@example.com".into()];
        assert_eq!(
            classify(&expected, Some(&observed)),
            InviteStatus::StaleUnsent
        );
    }

    #[test]
    fn relabel_forces_drafts_toward_send() {
        assert_eq!(
            relabel_for_send(InviteStatus::UnsentDraft),
            InviteStatus::StaleSent
        );
        assert_eq!(
            relabel_for_send(InviteStatus::StaleUnsent),
            InviteStatus::StaleSent
        );
        assert_eq!(
            relabel_for_send(InviteStatus::SentCurrent),
            InviteStatus::SentCurrent
        );
    }
}
