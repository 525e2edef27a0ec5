//! Shared fakes and fixtures for the integration tests.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use gremium::config::DriveConfig;
use gremium::errors::AppError;
use gremium::graph::drive::{DirectoryStore, DriveChild};
use gremium::graph::profiles::ProfileStore;
use gremium::models::agenda_item::AgendaItem;
use gremium::models::board_meeting::BoardMeeting;

pub fn test_drives() -> DriveConfig {
    DriveConfig {
        site: "contoso.sharepoint.com,site-id".into(),
        meetings_drive_id: "meetings-drive".into(),
        meetings_root_folder_id: "meetings-root".into(),
        unassigned_pool_folder_id: "unassigned-pool".into(),
        assets_drive_id: "assets-drive".into(),
        agenda_template_file_id_de: String::new(),
        agenda_template_file_id_en: String::new(),
        protocol_template_file_id_de: String::new(),
        protocol_template_file_id_en: String::new(),
    }
}

pub fn meeting(title: &str) -> BoardMeeting {
    BoardMeeting {
        id: Some(1),
        // 09:00 Europe/Berlin on 2025-03-01.
        start_time: Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap(),
        title: title.into(),
        fixed_participants: "anna@example.com;bernd@example.com".into(),
        remarks: String::new(),
        location: "Berlin HQ".into(),
        room: "R-401".into(),
        time_zone: "Europe/Berlin".into(),
        meeting_link: None,
        file_location_id: None,
        event_id: None,
    }
}

pub fn agenda_item(id: i64, order_index: i64, title: &str, minutes: i64) -> AgendaItem {
    AgendaItem {
        id: Some(id),
        board_meeting: Some(1),
        order_index,
        duration_in_minutes: minutes,
        title: title.into(),
        additional_participants: String::new(),
        is_misc: false,
        needs_decision: false,
        remarks: String::new(),
        file_location_id: None,
        protocol_location_id: None,
        event_id: None,
        start_time: None,
        is_new: false,
    }
}

#[derive(Debug, Clone)]
pub struct FakeFolder {
    pub name: String,
    pub parent: String,
}

#[derive(Debug, Clone)]
pub struct FakeFile {
    pub name: String,
    pub parent: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct FakeDirectoryState {
    next_id: usize,
    pub folders: HashMap<String, FakeFolder>,
    pub files: HashMap<String, FakeFile>,
    pub create_calls: usize,
    pub rename_calls: usize,
    pub deleted: Vec<String>,
    /// Item ids whose rename fails with a generic remote error.
    pub fail_rename: HashSet<String>,
    /// Item ids the store pretends not to know.
    pub missing: HashSet<String>,
}

/// In-memory [`DirectoryStore`] with call accounting.
#[derive(Default)]
pub struct FakeDirectoryStore {
    pub state: Mutex<FakeDirectoryState>,
}

impl FakeDirectoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn folder(&self, id: &str) -> Option<FakeFolder> {
        self.state.lock().unwrap().folders.get(id).cloned()
    }

    pub fn create_calls(&self) -> usize {
        self.state.lock().unwrap().create_calls
    }

    pub fn rename_calls(&self) -> usize {
        self.state.lock().unwrap().rename_calls
    }

    pub fn deleted(&self) -> Vec<String> {
        self.state.lock().unwrap().deleted.clone()
    }

    pub fn children_of(&self, parent: &str) -> Vec<String> {
        let state = self.state.lock().unwrap();
        let mut names: Vec<String> = state
            .folders
            .values()
            .filter(|folder| folder.parent == parent)
            .map(|folder| folder.name.clone())
            .chain(
                state
                    .files
                    .values()
                    .filter(|file| file.parent == parent)
                    .map(|file| file.name.clone()),
            )
            .collect();
        names.sort();
        names
    }
}

fn remote_missing(id: &str) -> AppError {
    AppError::Graph {
        status: 404,
        message: format!("Item {id} not found"),
    }
}

#[async_trait]
impl DirectoryStore for FakeDirectoryStore {
    async fn create_folder(
        &self,
        _drive_id: &str,
        parent_id: &str,
        name: &str,
    ) -> Result<String, AppError> {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        state.create_calls += 1;
        let id = format!("folder-{}", state.next_id);
        state.folders.insert(
            id.clone(),
            FakeFolder {
                name: name.to_string(),
                parent: parent_id.to_string(),
            },
        );
        Ok(id)
    }

    async fn rename_or_move(
        &self,
        _drive_id: &str,
        item_id: &str,
        new_name: Option<&str>,
        new_parent_id: Option<&str>,
    ) -> Result<(), AppError> {
        let mut state = self.state.lock().unwrap();
        if state.missing.contains(item_id) {
            return Err(remote_missing(item_id));
        }
        if state.fail_rename.contains(item_id) {
            return Err(AppError::Graph {
                status: 503,
                message: format!("Rename of {item_id} rejected"),
            });
        }
        state.rename_calls += 1;
        let folder = state
            .folders
            .get_mut(item_id)
            .ok_or_else(|| remote_missing(item_id))?;
        if let Some(name) = new_name {
            folder.name = name.to_string();
        }
        if let Some(parent) = new_parent_id {
            folder.parent = parent.to_string();
        }
        Ok(())
    }

    async fn delete_item(&self, _drive_id: &str, item_id: &str) -> Result<(), AppError> {
        let mut state = self.state.lock().unwrap();
        state.deleted.push(item_id.to_string());
        if state.folders.remove(item_id).is_none() && state.files.remove(item_id).is_none() {
            return Err(remote_missing(item_id));
        }
        Ok(())
    }

    async fn get_link(&self, _drive_id: &str, item_id: &str) -> Result<String, AppError> {
        let state = self.state.lock().unwrap();
        if state.folders.contains_key(item_id) || state.files.contains_key(item_id) {
            Ok(format!("https://files.example/{item_id}"))
        } else {
            Err(remote_missing(item_id))
        }
    }

    async fn list_children(
        &self,
        _drive_id: &str,
        item_id: &str,
    ) -> Result<Vec<DriveChild>, AppError> {
        let state = self.state.lock().unwrap();
        let mut children: Vec<DriveChild> = state
            .folders
            .iter()
            .filter(|(_, folder)| folder.parent == item_id)
            .map(|(id, folder)| DriveChild {
                id: id.clone(),
                name: folder.name.clone(),
                is_file: false,
            })
            .collect();
        children.extend(
            state
                .files
                .iter()
                .filter(|(_, file)| file.parent == item_id)
                .map(|(id, file)| DriveChild {
                    id: id.clone(),
                    name: file.name.clone(),
                    is_file: true,
                }),
        );
        Ok(children)
    }

    async fn fetch_content(&self, _drive_id: &str, item_id: &str) -> Result<Vec<u8>, AppError> {
        let state = self.state.lock().unwrap();
        state
            .files
            .get(item_id)
            .map(|file| file.bytes.clone())
            .ok_or_else(|| remote_missing(item_id))
    }

    async fn fetch_converted(
        &self,
        drive_id: &str,
        item_id: &str,
        _format: &str,
    ) -> Result<Vec<u8>, AppError> {
        let mut bytes = b"%PDF-".to_vec();
        bytes.extend(self.fetch_content(drive_id, item_id).await?);
        Ok(bytes)
    }

    async fn upload_content(
        &self,
        _drive_id: &str,
        parent_id: &str,
        file_name: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<String, AppError> {
        let mut state = self.state.lock().unwrap();
        // Replace semantics: an existing file of the same name is overwritten.
        let existing = state
            .files
            .iter()
            .find(|(_, file)| file.parent == parent_id && file.name == file_name)
            .map(|(id, _)| id.clone());
        let id = match existing {
            Some(id) => id,
            None => {
                state.next_id += 1;
                format!("file-{}", state.next_id)
            }
        };
        state.files.insert(
            id.clone(),
            FakeFile {
                name: file_name.to_string(),
                parent: parent_id.to_string(),
                bytes,
            },
        );
        Ok(id)
    }
}

/// In-memory [`ProfileStore`] recording the size of every lookup chunk.
#[derive(Default)]
pub struct FakeProfileStore {
    pub profiles: HashMap<String, String>,
    pub mails: HashMap<String, String>,
    pub chunk_sizes: Mutex<Vec<usize>>,
}

#[async_trait]
impl ProfileStore for FakeProfileStore {
    async fn display_names(&self, upns: &[String]) -> Result<HashMap<String, String>, AppError> {
        self.chunk_sizes.lock().unwrap().push(upns.len());
        Ok(upns
            .iter()
            .map(|upn| {
                // Unknown UPNs behave like the remote 404 path: echoed.
                let name = self.profiles.get(upn).cloned().unwrap_or_else(|| upn.clone());
                (upn.clone(), name)
            })
            .collect())
    }

    async fn primary_mails(&self, upns: &[String]) -> Result<Vec<String>, AppError> {
        let mut mails = Vec::new();
        for upn in upns {
            let mail = self.mails.get(upn).cloned().unwrap_or_else(|| upn.clone());
            if !mails.contains(&mail) {
                mails.push(mail);
            }
        }
        Ok(mails)
    }
}
