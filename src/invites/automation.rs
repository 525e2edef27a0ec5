//! Bulk invite automation.
//!
//! Settles the meeting-level invite first, then every agenda item in
//! ascending id order, re-applying create/update actions until each invite
//! reaches `SentCurrent`. Item invites are only enabled once the meeting has
//! a confirmed online-meeting link, which is why the meeting must fully
//! settle before any item is touched.
//!
//! Each invite gets a bounded number of attempts. On exhaustion the loop
//! stops with a partial-completion error instead of spinning forever.

use async_trait::async_trait;
use serde::Serialize;
use sqlx::PgPool;

use crate::config::{CalendarConfig, DriveConfig};
use crate::errors::AppError;
use crate::graph::calendar::CalendarStore;
use crate::graph::drive::DirectoryStore;
use crate::graph::profiles::ProfileStore;
use crate::invites::status::{relabel_for_send, InviteKind, InviteStatus};
use crate::invites::{
    create_update_item_invite, create_update_meeting_invite, load_invite_items, InviteItem,
};
use crate::models::agenda_item::{self, calculate_timestamps};
use crate::models::board_meeting;

/// Default per-invite attempt bound.
pub const MAX_ATTEMPTS_PER_INVITE: usize = 5;

/// The automation loop's view of the world: reload classified invites,
/// apply one corrective action. Splitting this out keeps the loop testable
/// against scripted fakes.
#[async_trait]
pub trait InviteChannel: Send {
    async fn refresh(&mut self) -> Result<Vec<InviteItem>, AppError>;
    async fn apply(&mut self, invite: &InviteItem) -> Result<(), AppError>;
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationReport {
    /// Corrective actions issued.
    pub applied: usize,
    /// Invites that reached `SentCurrent`.
    pub settled: usize,
}

/// Drive every invite to `SentCurrent`, meeting first, then items by id.
pub async fn run_automation_with(
    channel: &mut dyn InviteChannel,
    max_attempts: usize,
) -> Result<AutomationReport, AppError> {
    let mut report = AutomationReport {
        applied: 0,
        settled: 0,
    };
    let mut invites = channel.refresh().await?;

    let mut attempts = 0;
    loop {
        let Some(meeting_invite) = invites
            .iter()
            .find(|invite| invite.kind == InviteKind::Meeting)
        else {
            return Err(AppError::Automation(
                "No meeting-level invite to process".into(),
            ));
        };
        if meeting_invite.status == InviteStatus::SentCurrent {
            break;
        }
        if attempts >= max_attempts {
            return Err(AppError::Automation(format!(
                "Meeting invite did not settle after {max_attempts} attempt(s); \
                 last status: {}",
                meeting_invite.status.message()
            )));
        }
        attempts += 1;
        let invite = meeting_invite.clone();
        channel.apply(&invite).await?;
        report.applied += 1;
        invites = channel.refresh().await?;
    }
    report.settled += 1;

    let mut item_ids: Vec<i64> = invites
        .iter()
        .filter(|invite| invite.kind == InviteKind::AgendaItem)
        .map(|invite| invite.id)
        .collect();
    item_ids.sort_unstable();

    for id in item_ids {
        let mut attempts = 0;
        loop {
            let Some(invite) = invites
                .iter()
                .find(|invite| invite.kind == InviteKind::AgendaItem && invite.id == id)
            else {
                // The item disappeared between refreshes; nothing to settle.
                break;
            };
            if invite.status == InviteStatus::SentCurrent {
                report.settled += 1;
                break;
            }
            if attempts >= max_attempts {
                return Err(AppError::Automation(format!(
                    "Agenda item {id} invite did not settle after {max_attempts} attempt(s); \
                     {} invite(s) completed before it",
                    report.settled
                )));
            }
            attempts += 1;
            // Never leave an existing item invite as a draft: force the
            // update path that sends.
            let mut forced = invite.clone();
            forced.status = relabel_for_send(forced.status);
            channel.apply(&forced).await?;
            report.applied += 1;
            invites = channel.refresh().await?;
        }
    }

    Ok(report)
}

/// Production channel wired to the database and the remote stores.
pub struct LiveInviteChannel<'a> {
    pub pool: &'a PgPool,
    pub calendar: &'a dyn CalendarStore,
    pub directory: &'a dyn DirectoryStore,
    pub profiles: &'a dyn ProfileStore,
    pub drives: &'a DriveConfig,
    pub calendar_config: &'a CalendarConfig,
    pub board_meeting_id: i64,
}

#[async_trait]
impl InviteChannel for LiveInviteChannel<'_> {
    async fn refresh(&mut self) -> Result<Vec<InviteItem>, AppError> {
        let meeting = board_meeting::find_by_id(self.pool, self.board_meeting_id)
            .await?
            .ok_or(AppError::NotFound)?;
        let mut items = agenda_item::find_by_meeting(self.pool, self.board_meeting_id).await?;
        calculate_timestamps(meeting.start_time, &mut items);
        load_invite_items(self.calendar, self.profiles, &meeting, &items).await
    }

    async fn apply(&mut self, invite: &InviteItem) -> Result<(), AppError> {
        let is_create_as_new = invite.status == InviteStatus::Missing;
        let is_update = matches!(
            invite.status,
            InviteStatus::StaleUnsent | InviteStatus::StaleSent
        );
        if !is_create_as_new && !is_update {
            // Created/Unknown have no server-side action; UnsentDraft can
            // only be sent manually through its deep link. The attempt bound
            // keeps these from looping forever.
            return Ok(());
        }

        let meeting = board_meeting::find_by_id(self.pool, self.board_meeting_id)
            .await?
            .ok_or(AppError::NotFound)?;
        let mut items = agenda_item::find_by_meeting(self.pool, self.board_meeting_id).await?;
        calculate_timestamps(meeting.start_time, &mut items);

        match invite.kind {
            InviteKind::Meeting => {
                create_update_meeting_invite(
                    self.pool,
                    self.calendar,
                    self.directory,
                    self.drives,
                    self.calendar_config,
                    &meeting,
                    &items,
                    is_create_as_new,
                )
                .await?;
            }
            InviteKind::AgendaItem => {
                let item = items
                    .iter()
                    .find(|item| item.id == Some(invite.id))
                    .ok_or(AppError::NotFound)?;
                let is_already_sent = invite.status == InviteStatus::StaleSent;
                create_update_item_invite(
                    self.pool,
                    self.calendar,
                    &meeting,
                    item,
                    is_create_as_new,
                    is_already_sent,
                )
                .await?;
            }
        }
        Ok(())
    }
}

/// Run the bulk automation for one meeting against the live stores.
pub async fn run_automation(
    pool: &PgPool,
    calendar: &dyn CalendarStore,
    directory: &dyn DirectoryStore,
    profiles: &dyn ProfileStore,
    drives: &DriveConfig,
    calendar_config: &CalendarConfig,
    board_meeting_id: i64,
) -> Result<AutomationReport, AppError> {
    let mut channel = LiveInviteChannel {
        pool,
        calendar,
        directory,
        profiles,
        drives,
        calendar_config,
        board_meeting_id,
    };
    run_automation_with(&mut channel, MAX_ATTEMPTS_PER_INVITE).await
}
