use sqlx::PgPool;

use crate::errors::AppError;
use crate::gateway::{self, SqlParam};

use super::types::AgendaItem;

/// Items of one meeting, agenda order.
pub async fn find_by_meeting(pool: &PgPool, meeting_id: i64) -> Result<Vec<AgendaItem>, AppError> {
    let records = gateway::execute_query(
        pool,
        "SELECT * FROM \"AgendaItems\" WHERE \"BoardMeeting\" = @Id ORDER BY \"OrderIndex\" ASC",
        &[("Id", meeting_id.into())],
    )
    .await?;
    AgendaItem::from_records(&records)
}

/// Items with no assigned meeting; the global pool of reusable topics.
pub async fn find_orphaned(pool: &PgPool) -> Result<Vec<AgendaItem>, AppError> {
    let records = gateway::execute_query(
        pool,
        "SELECT * FROM \"AgendaItems\" WHERE \"BoardMeeting\" IS NULL ORDER BY \"ID\" ASC",
        &[],
    )
    .await?;
    AgendaItem::from_records(&records)
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<AgendaItem>, AppError> {
    let records = gateway::execute_query(
        pool,
        "SELECT * FROM \"AgendaItems\" WHERE \"ID\" = @Id",
        &[("Id", id.into())],
    )
    .await?;
    match records.first() {
        Some(record) => Ok(Some(AgendaItem::from_record(record)?)),
        None => Ok(None),
    }
}

fn item_params<'a>(
    item: &'a AgendaItem,
    meeting_id: Option<i64>,
    order_index: i64,
) -> Vec<(&'static str, SqlParam)> {
    vec![
        ("DurationInMinutes", item.duration_in_minutes.into()),
        ("Title", item.title.as_str().into()),
        (
            "AdditionalParticipants",
            item.additional_participants.as_str().into(),
        ),
        ("FileLocationId", item.file_location_id.clone().into()),
        ("ProtocolLocationId", item.protocol_location_id.clone().into()),
        ("OrderIndex", order_index.into()),
        ("IsMisc", item.is_misc.into()),
        ("NeedsDecision", item.needs_decision.into()),
        ("BoardMeeting", meeting_id.into()),
        ("Remarks", item.remarks.as_str().into()),
    ]
}

pub async fn insert(
    pool: &PgPool,
    item: &AgendaItem,
    meeting_id: Option<i64>,
    order_index: i64,
) -> Result<AgendaItem, AppError> {
    let records = gateway::execute_query(
        pool,
        "INSERT INTO \"AgendaItems\" \
         (\"DurationInMinutes\", \"Title\", \"AdditionalParticipants\", \"FileLocationId\", \
          \"ProtocolLocationId\", \"OrderIndex\", \"IsMisc\", \"NeedsDecision\", \"BoardMeeting\", \"Remarks\") \
         VALUES (@DurationInMinutes, @Title, @AdditionalParticipants, @FileLocationId, \
          @ProtocolLocationId, @OrderIndex, @IsMisc, @NeedsDecision, @BoardMeeting, @Remarks) \
         RETURNING *",
        &item_params(item, meeting_id, order_index),
    )
    .await?;
    let record = records
        .first()
        .ok_or_else(|| AppError::Db(sqlx::Error::RowNotFound))?;
    AgendaItem::from_record(record)
}

/// Full-field update; the caller supplies the dense order index.
pub async fn update(
    pool: &PgPool,
    item: &AgendaItem,
    meeting_id: Option<i64>,
    order_index: i64,
) -> Result<u64, AppError> {
    let id = item
        .id
        .ok_or_else(|| AppError::BadRequest("Agenda item id is missing".into()))?;
    let mut params = item_params(item, meeting_id, order_index);
    params.push(("Id", id.into()));
    gateway::execute(
        pool,
        "UPDATE \"AgendaItems\" SET \
         \"DurationInMinutes\" = @DurationInMinutes, \
         \"Title\" = @Title, \
         \"AdditionalParticipants\" = @AdditionalParticipants, \
         \"FileLocationId\" = @FileLocationId, \
         \"ProtocolLocationId\" = @ProtocolLocationId, \
         \"OrderIndex\" = @OrderIndex, \
         \"IsMisc\" = @IsMisc, \
         \"NeedsDecision\" = @NeedsDecision, \
         \"BoardMeeting\" = @BoardMeeting, \
         \"Remarks\" = @Remarks \
         WHERE \"ID\" = @Id",
        &params,
    )
    .await
}

/// Detach an item from its meeting. The folder is relocated by the next
/// reconciler run; the calendar event is cancelled by the caller first.
pub async fn unassign(pool: &PgPool, id: i64) -> Result<u64, AppError> {
    gateway::execute(
        pool,
        "UPDATE \"AgendaItems\" SET \"BoardMeeting\" = NULL, \"EventId\" = NULL WHERE \"ID\" = @Id",
        &[("Id", id.into())],
    )
    .await
}

pub async fn set_event_id(pool: &PgPool, id: i64, event_id: &str) -> Result<(), AppError> {
    gateway::execute(
        pool,
        "UPDATE \"AgendaItems\" SET \"EventId\" = @EventId WHERE \"ID\" = @Id",
        &[("Id", id.into()), ("EventId", event_id.into())],
    )
    .await?;
    Ok(())
}

pub async fn set_file_location(
    pool: &PgPool,
    id: i64,
    file_location_id: &str,
) -> Result<(), AppError> {
    gateway::execute(
        pool,
        "UPDATE \"AgendaItems\" SET \"FileLocationId\" = @FileLocationId WHERE \"ID\" = @Id",
        &[
            ("Id", id.into()),
            ("FileLocationId", file_location_id.into()),
        ],
    )
    .await?;
    Ok(())
}

pub async fn delete(pool: &PgPool, id: i64) -> Result<u64, AppError> {
    gateway::execute(
        pool,
        "DELETE FROM \"AgendaItems\" WHERE \"ID\" = @Id",
        &[("Id", id.into())],
    )
    .await
}
