//! Document generation pipeline.
//!
//! Templates live as DOCX files in the assets drive. The rendering engine is
//! consumed through the [`DocumentRenderer`] seam; the built-in
//! [`DocxTagRenderer`] substitutes scalar `{tag}` placeholders inside the
//! DOCX container, which is what the shipped templates use. PDF conversion
//! is delegated to the remote store's format converter.

use std::io::{Cursor, Read, Write};

use chrono::Utc;
use serde_json::Value;
use sqlx::PgPool;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::config::DriveConfig;
use crate::docs::template_data;
use crate::errors::AppError;
use crate::files::naming;
use crate::files::structure::{self, FileStructureResult};
use crate::graph::drive::DirectoryStore;
use crate::graph::profiles::{self, ProfileStore};
use crate::models::agenda_item::{self, calculate_timestamps, AgendaItem};
use crate::models::board_meeting::{self, BoardMeeting};
use crate::models::user_mapping;

pub const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

pub trait DocumentRenderer: Send + Sync {
    fn render(&self, template: &[u8], data: &Value) -> Result<Vec<u8>, AppError>;
}

/// Replaces `{key}` placeholders in the XML parts of a DOCX archive with the
/// scalar fields of the data model. Repeating sections are laid out by the
/// template itself.
pub struct DocxTagRenderer;

impl DocxTagRenderer {
    fn scalar_tags(data: &Value) -> Vec<(String, String)> {
        let Some(map) = data.as_object() else {
            return Vec::new();
        };
        map.iter()
            .filter_map(|(key, value)| {
                let rendered = match value {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    _ => return None,
                };
                Some((format!("{{{key}}}"), rendered))
            })
            .collect()
    }
}

impl DocumentRenderer for DocxTagRenderer {
    fn render(&self, template: &[u8], data: &Value) -> Result<Vec<u8>, AppError> {
        let tags = Self::scalar_tags(data);
        let mut archive = ZipArchive::new(Cursor::new(template))
            .map_err(|e| AppError::Render(format!("Template is not a DOCX archive: {e}")))?;
        let mut output = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();

        for index in 0..archive.len() {
            let mut entry = archive
                .by_index(index)
                .map_err(|e| AppError::Render(format!("Unreadable template entry: {e}")))?;
            let name = entry.name().to_string();
            let mut content = Vec::new();
            entry
                .read_to_end(&mut content)
                .map_err(|e| AppError::Render(format!("Unreadable template entry: {e}")))?;

            let content = if name.starts_with("word/") && name.ends_with(".xml") {
                let mut text = String::from_utf8(content)
                    .map_err(|e| AppError::Render(format!("Template XML is not UTF-8: {e}")))?;
                for (tag, replacement) in &tags {
                    text = text.replace(tag.as_str(), replacement);
                }
                text.into_bytes()
            } else {
                content
            };

            output
                .start_file(name, options)
                .and_then(|()| output.write_all(&content).map_err(Into::into))
                .map_err(|e| AppError::Render(format!("Could not write document: {e}")))?;
        }

        let cursor = output
            .finish()
            .map_err(|e| AppError::Render(format!("Could not finish document: {e}")))?;
        Ok(cursor.into_inner())
    }
}

struct MeetingDocumentContext {
    meeting: BoardMeeting,
    items: Vec<AgendaItem>,
    names: std::collections::HashMap<String, String>,
    structure: FileStructureResult,
}

/// Shared preamble of both pipelines: reconcile the folder tree (the target
/// folder must exist before anything is uploaded), persist the ids, and
/// resolve every participant name once.
async fn prepare_meeting_documents(
    pool: &PgPool,
    directory: &dyn DirectoryStore,
    profiles_store: &dyn ProfileStore,
    drives: &DriveConfig,
    board_meeting_id: i64,
) -> Result<MeetingDocumentContext, AppError> {
    let structure =
        structure::ensure_file_structure(pool, directory, drives, board_meeting_id).await?;
    structure::persist_file_structure(pool, board_meeting_id, &structure).await?;

    let meeting = board_meeting::find_by_id(pool, board_meeting_id)
        .await?
        .ok_or(AppError::NotFound)?;
    let mut items = agenda_item::find_by_meeting(pool, board_meeting_id).await?;
    calculate_timestamps(meeting.start_time, &mut items);

    let overrides = user_mapping::override_map(pool).await?;
    let upns = template_data::collect_participants(&meeting, &items);
    let names = profiles::resolve_display_names(profiles_store, &overrides, &upns).await?;

    Ok(MeetingDocumentContext {
        meeting,
        items,
        names,
        structure,
    })
}

fn agenda_variants(drives: &DriveConfig) -> Vec<(String, String, bool)> {
    let mut variants = Vec::new();
    for (file_id, language) in [
        (&drives.agenda_template_file_id_de, "DE"),
        (&drives.agenda_template_file_id_en, "EN"),
    ] {
        if file_id.is_empty() {
            continue;
        }
        variants.push((file_id.clone(), language.to_string(), true));
        variants.push((file_id.clone(), language.to_string(), false));
    }
    variants
}

/// Render the agenda overview as PDF into the meeting folder, in every
/// configured language, once with remarks and once clean.
pub async fn generate_agenda_pdfs(
    pool: &PgPool,
    directory: &dyn DirectoryStore,
    profiles_store: &dyn ProfileStore,
    renderer: &dyn DocumentRenderer,
    drives: &DriveConfig,
    board_meeting_id: i64,
) -> Result<(), AppError> {
    let context =
        prepare_meeting_documents(pool, directory, profiles_store, drives, board_meeting_id)
            .await?;
    let folder_id = &context.structure.board_meeting_file_location_id;

    for (file_id, language, include_remarks) in agenda_variants(drives) {
        let data = template_data::agenda_template_data(
            &context.meeting,
            &context.items,
            &language,
            include_remarks,
            &context.names,
            Utc::now(),
        )?;
        let template = directory
            .fetch_content(&drives.assets_drive_id, &file_id)
            .await?;
        let rendered = renderer.render(&template, &data)?;

        let temp_name = format!("Agenda_temp_{language}.docx");
        let temp_id = directory
            .upload_content(
                &drives.meetings_drive_id,
                folder_id,
                &temp_name,
                rendered,
                DOCX_CONTENT_TYPE,
            )
            .await?;

        let pdf = directory
            .fetch_converted(&drives.meetings_drive_id, &temp_id, "pdf")
            .await?;
        let clean_suffix = if include_remarks { "" } else { " clean" };
        let pdf_name = format!(
            "Agenda-{}{clean_suffix}.pdf",
            naming::safe_string(&context.meeting.title)
        );
        directory
            .upload_content(
                &drives.meetings_drive_id,
                folder_id,
                &pdf_name,
                pdf,
                "application/pdf",
            )
            .await?;

        directory
            .delete_item(&drives.meetings_drive_id, &temp_id)
            .await?;
        log::info!("Generated '{pdf_name}' for meeting {board_meeting_id}");
    }

    Ok(())
}

/// Render the protocol draft DOCX into the meeting folder, per language.
pub async fn generate_protocol_drafts(
    pool: &PgPool,
    directory: &dyn DirectoryStore,
    profiles_store: &dyn ProfileStore,
    renderer: &dyn DocumentRenderer,
    drives: &DriveConfig,
    board_meeting_id: i64,
) -> Result<(), AppError> {
    let context =
        prepare_meeting_documents(pool, directory, profiles_store, drives, board_meeting_id)
            .await?;
    let folder_id = &context.structure.board_meeting_file_location_id;

    for (file_id, language) in [
        (&drives.protocol_template_file_id_de, "DE"),
        (&drives.protocol_template_file_id_en, "EN"),
    ] {
        if file_id.is_empty() {
            continue;
        }
        let data = template_data::protocol_template_data(
            &context.meeting,
            &context.items,
            language,
            &context.names,
        )?;
        let template = directory
            .fetch_content(&drives.assets_drive_id, file_id)
            .await?;
        let rendered = renderer.render(&template, &data)?;

        let file_name = format!("Protocol DRAFT {language}.docx");
        directory
            .upload_content(
                &drives.meetings_drive_id,
                folder_id,
                &file_name,
                rendered,
                DOCX_CONTENT_TYPE,
            )
            .await?;
        log::info!("Generated '{file_name}' for meeting {board_meeting_id}");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn docx_with_document_xml(xml: &str) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        writer.start_file("word/document.xml", options).unwrap();
        writer.write_all(xml.as_bytes()).unwrap();
        writer.start_file("docProps/core.xml", options).unwrap();
        writer.write_all(b"<coreProperties/>").unwrap();
        writer.finish().unwrap().into_inner()
    }

    fn read_entry(bytes: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut entry = archive.by_name(name).unwrap();
        let mut text = String::new();
        entry.read_to_string(&mut text).unwrap();
        text
    }

    #[test]
    fn scalar_tags_are_substituted_in_word_xml_only() {
        let template = docx_with_document_xml(
            "<w:t>{meetingTitle} at {meetingTime}, tops: {topsCount}</w:t>",
        );
        let data = json!({
            "meetingTitle": "Budget Sync",
            "meetingTime": "09:00",
            "topsCount": 2,
            "topsDetails": [{"agendaTitle": "Intro"}],
        });
        let rendered = DocxTagRenderer.render(&template, &data).unwrap();
        assert_eq!(
            read_entry(&rendered, "word/document.xml"),
            "<w:t>Budget Sync at 09:00, tops: 2</w:t>"
        );
        assert_eq!(read_entry(&rendered, "docProps/core.xml"), "<coreProperties/>");
    }

    #[test]
    fn non_archive_input_is_a_render_error() {
        let err = DocxTagRenderer.render(b"plain text", &json!({})).unwrap_err();
        assert!(matches!(err, AppError::Render(_)));
    }
}
