use crate::errors::AppError;

/// Process-wide configuration, read once in `main` and injected everywhere.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_address: String,
    pub graph: GraphConfig,
    pub drives: DriveConfig,
    pub calendar: CalendarConfig,
    pub defaults: DefaultsConfig,
}

/// Connection settings for the Microsoft-Graph-shaped remote store.
///
/// Token acquisition is handled outside this service; the token arrives as
/// configuration and is attached as a bearer header by the client.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    pub base_url: String,
    pub access_token: String,
}

/// SharePoint site, drive and well-known folder identifiers.
#[derive(Debug, Clone)]
pub struct DriveConfig {
    pub site: String,
    pub meetings_drive_id: String,
    pub meetings_root_folder_id: String,
    pub unassigned_pool_folder_id: String,
    pub assets_drive_id: String,
    pub agenda_template_file_id_de: String,
    pub agenda_template_file_id_en: String,
    pub protocol_template_file_id_de: String,
    pub protocol_template_file_id_en: String,
}

/// Shared mailbox owning all calendar events, plus the fixed host list
/// attached to meeting-level invites.
#[derive(Debug, Clone)]
pub struct CalendarConfig {
    pub event_mailbox: String,
    pub online_meeting_hosts: String,
}

/// Static pick lists served to the client.
#[derive(Debug, Clone)]
pub struct DefaultsConfig {
    pub rooms: Vec<String>,
    pub participant_groups: Vec<String>,
}

fn require_env(name: &str) -> Result<String, AppError> {
    std::env::var(name)
        .map_err(|_| AppError::Config(format!("Missing environment variable: {name}")))
}

fn optional_env(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn list_env(name: &str) -> Vec<String> {
    optional_env(name, "")
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Ok(AppConfig {
            database_url: require_env("DATABASE_URL")?,
            bind_address: optional_env("BIND_ADDRESS", "127.0.0.1:8080"),
            graph: GraphConfig {
                base_url: optional_env("GRAPH_BASE_URL", "https://graph.microsoft.com/v1.0"),
                access_token: require_env("GRAPH_ACCESS_TOKEN")?,
            },
            drives: DriveConfig {
                site: require_env("SHAREPOINT_SITE")?,
                meetings_drive_id: require_env("SHAREPOINT_MEETINGS_DRIVE_ID")?,
                meetings_root_folder_id: require_env("SHAREPOINT_MEETINGS_FOLDER_ID")?,
                unassigned_pool_folder_id: require_env("SHAREPOINT_UNASSIGNED_TOPS_FOLDER_ID")?,
                assets_drive_id: require_env("SHAREPOINT_ASSETS_DRIVE_ID")?,
                agenda_template_file_id_de: optional_env("AGENDA_TEMPLATE_FILE_ID_DE", ""),
                agenda_template_file_id_en: optional_env("AGENDA_TEMPLATE_FILE_ID_EN", ""),
                protocol_template_file_id_de: optional_env("PROTOCOL_TEMPLATE_FILE_ID_DE", ""),
                protocol_template_file_id_en: optional_env("PROTOCOL_TEMPLATE_FILE_ID_EN", ""),
            },
            calendar: CalendarConfig {
                event_mailbox: require_env("EVENT_MAILBOX")?,
                online_meeting_hosts: optional_env("ONLINE_MEETING_HOSTS", ""),
            },
            defaults: DefaultsConfig {
                rooms: list_env("DEFAULT_ROOMS"),
                participant_groups: list_env("DEFAULT_PARTICIPANT_GROUPS"),
            },
        })
    }
}
