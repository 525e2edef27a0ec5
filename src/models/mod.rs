pub mod agenda_item;
pub mod board_meeting;
pub mod participants;
pub mod record;
pub mod user_mapping;
