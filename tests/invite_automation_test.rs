use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};

use gremium::errors::AppError;
use gremium::invites::automation::{run_automation_with, InviteChannel};
use gremium::invites::{InviteItem, InviteKind, InviteStatus};

fn invite(id: i64, kind: InviteKind, title: &str, status: InviteStatus) -> InviteItem {
    let start = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();
    InviteItem {
        id,
        kind,
        title: title.into(),
        status,
        event_id: Some(format!("event-{id}")),
        participants: String::new(),
        start,
        end: start + Duration::minutes(30),
        room: "R-401".into(),
        web_link: None,
    }
}

/// Scripted channel: each invite needs a fixed number of corrective actions
/// before it reports `SentCurrent`. Records every action it receives.
struct ScriptedChannel {
    invites: Vec<InviteItem>,
    applies_needed: HashMap<i64, usize>,
    pub applied: Vec<(InviteKind, i64, InviteStatus)>,
}

impl ScriptedChannel {
    fn new(invites: Vec<InviteItem>, applies_needed: &[(i64, usize)]) -> Self {
        ScriptedChannel {
            invites,
            applies_needed: applies_needed.iter().copied().collect(),
            applied: Vec::new(),
        }
    }
}

#[async_trait]
impl InviteChannel for ScriptedChannel {
    async fn refresh(&mut self) -> Result<Vec<InviteItem>, AppError> {
        Ok(self
            .invites
            .iter()
            .map(|invite| {
                let mut refreshed = invite.clone();
                if self.applies_needed.get(&invite.id).copied().unwrap_or(0) == 0 {
                    refreshed.status = InviteStatus::SentCurrent;
                }
                refreshed
            })
            .collect())
    }

    async fn apply(&mut self, invite: &InviteItem) -> Result<(), AppError> {
        self.applied.push((invite.kind, invite.id, invite.status));
        if let Some(remaining) = self.applies_needed.get_mut(&invite.id) {
            *remaining = remaining.saturating_sub(1);
        }
        Ok(())
    }
}

#[tokio::test]
async fn meeting_settles_before_any_item_is_touched() {
    let mut channel = ScriptedChannel::new(
        vec![
            invite(7, InviteKind::AgendaItem, "Finance", InviteStatus::Missing),
            invite(1, InviteKind::Meeting, "Budget Sync", InviteStatus::Missing),
            invite(3, InviteKind::AgendaItem, "Intro", InviteStatus::Missing),
        ],
        &[(1, 2), (3, 1), (7, 1)],
    );

    let report = run_automation_with(&mut channel, 5).await.unwrap();

    // The meeting takes two rounds; no item action may interleave, and the
    // items then settle in ascending id order.
    let order: Vec<(InviteKind, i64)> = channel
        .applied
        .iter()
        .map(|(kind, id, _)| (*kind, *id))
        .collect();
    assert_eq!(
        order,
        vec![
            (InviteKind::Meeting, 1),
            (InviteKind::Meeting, 1),
            (InviteKind::AgendaItem, 3),
            (InviteKind::AgendaItem, 7),
        ]
    );
    assert_eq!(report.applied, 4);
    assert_eq!(report.settled, 3);
}

#[tokio::test]
async fn item_drafts_are_relabeled_to_force_a_send() {
    let mut channel = ScriptedChannel::new(
        vec![
            invite(1, InviteKind::Meeting, "Budget Sync", InviteStatus::SentCurrent),
            invite(3, InviteKind::AgendaItem, "Intro", InviteStatus::UnsentDraft),
            invite(4, InviteKind::AgendaItem, "Finance", InviteStatus::StaleUnsent),
        ],
        &[(1, 0), (3, 1), (4, 1)],
    );

    run_automation_with(&mut channel, 5).await.unwrap();

    // Both draft states must arrive at the channel as StaleSent, so the
    // resulting update sends instead of leaving another draft behind.
    assert_eq!(
        channel.applied,
        vec![
            (InviteKind::AgendaItem, 3, InviteStatus::StaleSent),
            (InviteKind::AgendaItem, 4, InviteStatus::StaleSent),
        ]
    );
}

#[tokio::test]
async fn fully_settled_state_applies_nothing() {
    let mut channel = ScriptedChannel::new(
        vec![
            invite(1, InviteKind::Meeting, "Budget Sync", InviteStatus::SentCurrent),
            invite(3, InviteKind::AgendaItem, "Intro", InviteStatus::SentCurrent),
        ],
        &[(1, 0), (3, 0)],
    );

    let report = run_automation_with(&mut channel, 5).await.unwrap();
    assert!(channel.applied.is_empty());
    assert_eq!(report.applied, 0);
    assert_eq!(report.settled, 2);
}

#[tokio::test]
async fn stuck_meeting_invite_hits_the_attempt_bound() {
    // 1000 applies needed: effectively never settles.
    let mut channel = ScriptedChannel::new(
        vec![invite(1, InviteKind::Meeting, "Budget Sync", InviteStatus::Unknown)],
        &[(1, 1000)],
    );

    let err = run_automation_with(&mut channel, 3).await.unwrap_err();
    assert!(matches!(err, AppError::Automation(_)));
    assert_eq!(channel.applied.len(), 3);
}

#[tokio::test]
async fn stuck_item_reports_partial_completion() {
    let mut channel = ScriptedChannel::new(
        vec![
            invite(1, InviteKind::Meeting, "Budget Sync", InviteStatus::SentCurrent),
            invite(3, InviteKind::AgendaItem, "Intro", InviteStatus::StaleSent),
            invite(4, InviteKind::AgendaItem, "Finance", InviteStatus::StaleSent),
        ],
        &[(1, 0), (3, 0), (4, 1000)],
    );

    let err = run_automation_with(&mut channel, 2).await.unwrap_err();
    let AppError::Automation(message) = err else {
        panic!("expected an automation error");
    };
    // Item 3 settled before item 4 got stuck; the error says so.
    assert!(message.contains("Agenda item 4"));
    assert!(message.contains("2 invite(s) completed"));
}
