use sqlx::PgPool;

use crate::errors::AppError;
use crate::gateway;

use super::types::BoardMeeting;

/// All meetings, soonest first.
pub async fn list_all(pool: &PgPool) -> Result<Vec<BoardMeeting>, AppError> {
    let records = gateway::execute_query(
        pool,
        "SELECT * FROM \"BoardMeetings\" ORDER BY \"StartTime\" ASC",
        &[],
    )
    .await?;
    BoardMeeting::from_records(&records)
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<BoardMeeting>, AppError> {
    let records = gateway::execute_query(
        pool,
        "SELECT * FROM \"BoardMeetings\" WHERE \"ID\" = @Id",
        &[("Id", id.into())],
    )
    .await?;
    match records.first() {
        Some(record) => Ok(Some(BoardMeeting::from_record(record)?)),
        None => Ok(None),
    }
}

/// Insert and return the stored row (the database assigns the id).
pub async fn insert(pool: &PgPool, meeting: &BoardMeeting) -> Result<BoardMeeting, AppError> {
    let records = gateway::execute_query(
        pool,
        "INSERT INTO \"BoardMeetings\" \
         (\"StartTime\", \"Title\", \"FixedParticipants\", \"Remarks\", \"Location\", \"TimeZone\", \"Room\") \
         VALUES (@StartTime, @Title, @FixedParticipants, @Remarks, @Location, @TimeZone, @Room) \
         RETURNING *",
        &[
            ("StartTime", meeting.start_time.into()),
            ("Title", meeting.title.as_str().into()),
            ("FixedParticipants", meeting.fixed_participants.as_str().into()),
            ("Remarks", meeting.remarks.as_str().into()),
            ("Location", meeting.location.as_str().into()),
            ("TimeZone", meeting.time_zone.as_str().into()),
            ("Room", meeting.room.as_str().into()),
        ],
    )
    .await?;
    let record = records
        .first()
        .ok_or_else(|| AppError::Db(sqlx::Error::RowNotFound))?;
    BoardMeeting::from_record(record)
}

/// Full-field update; every mutable column is written on every call.
pub async fn update(pool: &PgPool, meeting: &BoardMeeting) -> Result<u64, AppError> {
    let id = meeting
        .id
        .ok_or_else(|| AppError::BadRequest("Board meeting id is missing".into()))?;
    gateway::execute(
        pool,
        "UPDATE \"BoardMeetings\" SET \
         \"StartTime\" = @StartTime, \
         \"Title\" = @Title, \
         \"FixedParticipants\" = @FixedParticipants, \
         \"Remarks\" = @Remarks, \
         \"Location\" = @Location, \
         \"EventId\" = @EventId, \
         \"TimeZone\" = @TimeZone, \
         \"MeetingLink\" = @MeetingLink, \
         \"Room\" = @Room \
         WHERE \"ID\" = @Id",
        &[
            ("Id", id.into()),
            ("StartTime", meeting.start_time.into()),
            ("Title", meeting.title.as_str().into()),
            ("FixedParticipants", meeting.fixed_participants.as_str().into()),
            ("Remarks", meeting.remarks.as_str().into()),
            ("Location", meeting.location.as_str().into()),
            ("EventId", meeting.event_id.clone().into()),
            ("TimeZone", meeting.time_zone.as_str().into()),
            ("MeetingLink", meeting.meeting_link.clone().into()),
            ("Room", meeting.room.as_str().into()),
        ],
    )
    .await
}

pub async fn delete(pool: &PgPool, id: i64) -> Result<u64, AppError> {
    gateway::execute(
        pool,
        "DELETE FROM \"BoardMeetings\" WHERE \"ID\" = @Id",
        &[("Id", id.into())],
    )
    .await
}

pub async fn set_file_location(
    pool: &PgPool,
    id: i64,
    file_location_id: &str,
) -> Result<(), AppError> {
    gateway::execute(
        pool,
        "UPDATE \"BoardMeetings\" SET \"FileLocationId\" = @FileLocationId WHERE \"ID\" = @Id",
        &[
            ("Id", id.into()),
            ("FileLocationId", file_location_id.into()),
        ],
    )
    .await?;
    Ok(())
}

/// Persist the calendar linkage created for the meeting-level invite.
pub async fn set_event(
    pool: &PgPool,
    id: i64,
    event_id: &str,
    meeting_link: Option<&str>,
) -> Result<(), AppError> {
    gateway::execute(
        pool,
        "UPDATE \"BoardMeetings\" SET \"EventId\" = @EventId, \"MeetingLink\" = @MeetingLink \
         WHERE \"ID\" = @Id",
        &[
            ("Id", id.into()),
            ("EventId", event_id.into()),
            ("MeetingLink", meeting_link.map(str::to_string).into()),
        ],
    )
    .await?;
    Ok(())
}
