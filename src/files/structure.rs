//! The file-structure reconciler.
//!
//! Guarantees that a board meeting and each of its agenda items has a
//! correctly named, correctly parented folder, and that agenda items
//! belonging to no meeting have their folders relocated into the shared
//! unassigned pool. Folders are never deleted here; un-assignment always
//! relocates.
//!
//! The reconciler reads database state but never writes it: the returned id
//! mapping is persisted by the caller. Re-running with unchanged inputs
//! issues only same-name renames, which the remote store treats as no-ops.

use serde::Serialize;
use sqlx::PgPool;

use crate::config::DriveConfig;
use crate::errors::AppError;
use crate::files::naming;
use crate::graph::drive::DirectoryStore;
use crate::models::agenda_item::{self, calculate_timestamps, AgendaItem};
use crate::models::board_meeting::{self, BoardMeeting};

/// Folder assignment for one agenda item after reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderAssignment {
    #[serde(rename = "id")]
    pub agenda_item_id: i64,
    pub title: String,
    pub file_location_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileStructureResult {
    pub board_meeting_file_location_id: String,
    pub agenda_items: Vec<FolderAssignment>,
}

/// Core reconciliation over already-loaded state.
///
/// Ordering matters: the meeting folder must exist before any item folder is
/// created, because items are parented under it.
pub async fn reconcile_file_structure(
    store: &dyn DirectoryStore,
    drives: &DriveConfig,
    meeting: &BoardMeeting,
    items: &[AgendaItem],
    orphans: &[AgendaItem],
) -> Result<FileStructureResult, AppError> {
    // 1. Meeting folder: create under the meetings root, or rename the
    //    existing folder in place to heal drift from manual renames.
    let meeting_folder_name =
        naming::meeting_folder_name(meeting.local_start()?, &meeting.title);
    let meeting_folder_id = match &meeting.file_location_id {
        None => {
            log::info!("Creating meeting folder '{meeting_folder_name}'");
            store
                .create_folder(
                    &drives.meetings_drive_id,
                    &drives.meetings_root_folder_id,
                    &meeting_folder_name,
                )
                .await?
        }
        Some(existing) => {
            log::info!("Updating meeting folder '{meeting_folder_name}'");
            store
                .rename_or_move(
                    &drives.meetings_drive_id,
                    existing,
                    Some(&meeting_folder_name),
                    None,
                )
                .await?;
            existing.clone()
        }
    };

    // 2. Item folders, in agenda order. Renaming always re-parents under the
    //    meeting folder so items moved between meetings come along.
    let mut assignments = Vec::with_capacity(items.len());
    for item in items {
        let id = item
            .id
            .ok_or_else(|| AppError::BadRequest("Agenda item without id".into()))?;
        let folder_name = naming::agenda_folder_name(item.order_index, &item.title);
        let folder_id = match &item.file_location_id {
            None => {
                log::info!("Creating agenda item folder '{folder_name}'");
                store
                    .create_folder(&drives.meetings_drive_id, &meeting_folder_id, &folder_name)
                    .await?
            }
            Some(existing) => {
                log::info!("Updating agenda item folder '{folder_name}'");
                store
                    .rename_or_move(
                        &drives.meetings_drive_id,
                        existing,
                        Some(&folder_name),
                        Some(&meeting_folder_id),
                    )
                    .await?;
                existing.clone()
            }
        };
        assignments.push(FolderAssignment {
            agenda_item_id: id,
            title: item.title.clone(),
            file_location_id: folder_id,
        });
    }

    // 3. Relocate orphaned item folders into the shared pool. One item's
    //    failure must not abort the others; a folder that is already gone
    //    counts as done.
    for orphan in orphans {
        let Some(folder_id) = &orphan.file_location_id else {
            continue;
        };
        let result = store
            .rename_or_move(
                &drives.meetings_drive_id,
                folder_id,
                Some(&naming::safe_string(&orphan.title)),
                Some(&drives.unassigned_pool_folder_id),
            )
            .await;
        match result {
            Ok(()) => {
                log::info!("Moved orphaned agenda item folder '{}'", orphan.title);
            }
            Err(err) if err.is_not_found() => {
                log::error!(
                    "Orphaned agenda item folder not found: {} ({folder_id})",
                    orphan.title
                );
            }
            Err(err) => {
                log::error!(
                    "Failed to move orphaned agenda item folder {} ({folder_id}): {err}",
                    orphan.title
                );
            }
        }
    }

    Ok(FileStructureResult {
        board_meeting_file_location_id: meeting_folder_id,
        agenda_items: assignments,
    })
}

/// Load a meeting's state and reconcile its folder tree.
///
/// A missing meeting row is fatal; there is nothing to reconcile against.
/// Orphans are loaded globally, not scoped to this meeting, so any detached
/// item gets relocated no matter which meeting triggered the run.
pub async fn ensure_file_structure(
    pool: &PgPool,
    store: &dyn DirectoryStore,
    drives: &DriveConfig,
    board_meeting_id: i64,
) -> Result<FileStructureResult, AppError> {
    let meeting = board_meeting::find_by_id(pool, board_meeting_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut items = agenda_item::find_by_meeting(pool, board_meeting_id).await?;
    calculate_timestamps(meeting.start_time, &mut items);

    let orphans = agenda_item::find_orphaned(pool).await?;

    log::info!(
        "Reconciling file structure for meeting {board_meeting_id}: {} item(s), {} orphan(s)",
        items.len(),
        orphans.len()
    );

    reconcile_file_structure(store, drives, &meeting, &items, &orphans).await
}

/// Persist the folder ids a reconciler run produced.
pub async fn persist_file_structure(
    pool: &PgPool,
    board_meeting_id: i64,
    result: &FileStructureResult,
) -> Result<(), AppError> {
    board_meeting::set_file_location(
        pool,
        board_meeting_id,
        &result.board_meeting_file_location_id,
    )
    .await?;
    for assignment in &result.agenda_items {
        agenda_item::set_file_location(
            pool,
            assignment.agenda_item_id,
            &assignment.file_location_id,
        )
        .await?;
    }
    Ok(())
}
