//! Remote directory operations against the SharePoint drive API.
//!
//! [`DirectoryStore`] is the seam the reconciler and the document pipeline
//! are written against; [`GraphDirectoryClient`] is the production
//! implementation. All side effects are remote and non-transactional.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::graph::client::GraphClient;

/// Summary of one child entry inside a folder.
#[derive(Debug, Clone)]
pub struct DriveChild {
    pub id: String,
    pub name: String,
    pub is_file: bool,
}

#[async_trait]
pub trait DirectoryStore: Send + Sync {
    /// Create a folder under `parent_id`; name collisions auto-rename.
    async fn create_folder(
        &self,
        drive_id: &str,
        parent_id: &str,
        name: &str,
    ) -> Result<String, AppError>;

    /// Rename and/or reparent an item in place; name collisions auto-rename.
    async fn rename_or_move(
        &self,
        drive_id: &str,
        item_id: &str,
        new_name: Option<&str>,
        new_parent_id: Option<&str>,
    ) -> Result<(), AppError>;

    async fn delete_item(&self, drive_id: &str, item_id: &str) -> Result<(), AppError>;

    async fn get_link(&self, drive_id: &str, item_id: &str) -> Result<String, AppError>;

    async fn list_children(
        &self,
        drive_id: &str,
        item_id: &str,
    ) -> Result<Vec<DriveChild>, AppError>;

    async fn fetch_content(&self, drive_id: &str, item_id: &str) -> Result<Vec<u8>, AppError>;

    /// Fetch the item converted to another format (e.g. `pdf`).
    async fn fetch_converted(
        &self,
        drive_id: &str,
        item_id: &str,
        format: &str,
    ) -> Result<Vec<u8>, AppError>;

    /// Upload file content under `parent_id`; an existing file of the same
    /// name is replaced. Returns the item id.
    async fn upload_content(
        &self,
        drive_id: &str,
        parent_id: &str,
        file_name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, AppError>;
}

pub struct GraphDirectoryClient {
    client: GraphClient,
    site: String,
}

impl GraphDirectoryClient {
    pub fn new(client: GraphClient, site: &str) -> Self {
        GraphDirectoryClient {
            client,
            site: site.to_string(),
        }
    }

    fn item_path(&self, drive_id: &str, item_id: &str) -> String {
        format!("/sites/{}/drives/{}/items/{}", self.site, drive_id, item_id)
    }
}

fn id_of(item: &Value) -> Result<String, AppError> {
    item.get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| AppError::Graph {
            status: 200,
            message: "Drive item response carries no id".into(),
        })
}

#[async_trait]
impl DirectoryStore for GraphDirectoryClient {
    async fn create_folder(
        &self,
        drive_id: &str,
        parent_id: &str,
        name: &str,
    ) -> Result<String, AppError> {
        let path = format!("{}/children", self.item_path(drive_id, parent_id));
        let body = json!({
            "name": name,
            "folder": {},
            "@microsoft.graph.conflictBehavior": "rename",
        });
        let created = self.client.post_json(&path, &body).await?;
        id_of(&created)
    }

    async fn rename_or_move(
        &self,
        drive_id: &str,
        item_id: &str,
        new_name: Option<&str>,
        new_parent_id: Option<&str>,
    ) -> Result<(), AppError> {
        let mut body = json!({ "@microsoft.graph.conflictBehavior": "rename" });
        if let Some(name) = new_name {
            body["name"] = json!(name);
        }
        if let Some(parent) = new_parent_id {
            body["parentReference"] = json!({ "id": parent });
        }
        self.client
            .patch_json(&self.item_path(drive_id, item_id), &body)
            .await?;
        Ok(())
    }

    async fn delete_item(&self, drive_id: &str, item_id: &str) -> Result<(), AppError> {
        self.client.delete(&self.item_path(drive_id, item_id)).await
    }

    async fn get_link(&self, drive_id: &str, item_id: &str) -> Result<String, AppError> {
        let item = self
            .client
            .get_json(&self.item_path(drive_id, item_id))
            .await?;
        item.get("webUrl")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| AppError::Graph {
                status: 200,
                message: "Drive item carries no webUrl".into(),
            })
    }

    async fn list_children(
        &self,
        drive_id: &str,
        item_id: &str,
    ) -> Result<Vec<DriveChild>, AppError> {
        let path = format!("{}/children", self.item_path(drive_id, item_id));
        let listing = self.client.get_json(&path).await?;
        let entries = listing
            .get("value")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        entries
            .iter()
            .map(|entry| {
                Ok(DriveChild {
                    id: id_of(entry)?,
                    name: entry
                        .get("name")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    is_file: entry.get("file").is_some_and(|f| !f.is_null()),
                })
            })
            .collect()
    }

    async fn fetch_content(&self, drive_id: &str, item_id: &str) -> Result<Vec<u8>, AppError> {
        let path = format!("{}/content", self.item_path(drive_id, item_id));
        self.client.get_bytes(&path).await
    }

    async fn fetch_converted(
        &self,
        drive_id: &str,
        item_id: &str,
        format: &str,
    ) -> Result<Vec<u8>, AppError> {
        let path = format!(
            "{}/content?format={format}",
            self.item_path(drive_id, item_id)
        );
        self.client.get_bytes(&path).await
    }

    async fn upload_content(
        &self,
        drive_id: &str,
        parent_id: &str,
        file_name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, AppError> {
        let path = format!(
            "{}:/{}:/content?@microsoft.graph.conflictBehavior=replace",
            self.item_path(drive_id, parent_id),
            file_name
        );
        let uploaded = self.client.put_bytes(&path, bytes, content_type).await?;
        id_of(&uploaded)
    }
}

/// Drop an internet-shortcut file pointing at `link_url` into a folder.
pub async fn create_link_file(
    store: &dyn DirectoryStore,
    drive_id: &str,
    folder_id: &str,
    link_url: &str,
    link_title: &str,
) -> Result<String, AppError> {
    let file_name = format!("{link_title}.url");
    let content = format!("[InternetShortcut]\nURL={link_url}");
    store
        .upload_content(
            drive_id,
            folder_id,
            &file_name,
            content.into_bytes(),
            "text/plain",
        )
        .await
}

/// Remove every `.url` shortcut file from a folder.
pub async fn delete_link_files(
    store: &dyn DirectoryStore,
    drive_id: &str,
    folder_id: &str,
) -> Result<usize, AppError> {
    let children = store.list_children(drive_id, folder_id).await?;
    let mut deleted = 0;
    for child in children {
        if child.is_file && child.name.ends_with(".url") {
            store.delete_item(drive_id, &child.id).await?;
            deleted += 1;
        }
    }
    log::info!("Deleted {deleted} .url file(s) from folder {folder_id}");
    Ok(deleted)
}
