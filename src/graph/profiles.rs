//! Batched user-profile lookups.
//!
//! The remote batch endpoint caps sub-requests, so requests are issued in
//! chunks. External/guest UPNs with no profile come back echoed as their own
//! display name; the custom override table is applied afterwards and wins.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::AppError;
use crate::graph::client::{BatchRequest, GraphClient, BATCH_LIMIT};

#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Resolve up to [`BATCH_LIMIT`] UPNs in one remote call. A UPN the
    /// remote store does not know maps to itself; a failed sub-request is
    /// absent from the result.
    async fn display_names(&self, upns: &[String]) -> Result<HashMap<String, String>, AppError>;

    /// Primary mail addresses for the given UPNs, for attendee comparison.
    async fn primary_mails(&self, upns: &[String]) -> Result<Vec<String>, AppError>;
}

pub struct GraphProfileClient {
    client: GraphClient,
}

impl GraphProfileClient {
    pub fn new(client: GraphClient) -> Self {
        GraphProfileClient { client }
    }

    fn batch_requests(upns: &[String], select: &str) -> Vec<BatchRequest> {
        upns.iter()
            .enumerate()
            .map(|(index, upn)| BatchRequest {
                id: index.to_string(),
                method: "GET".to_string(),
                url: format!("/users/{upn}?$select={select}"),
            })
            .collect()
    }
}

#[async_trait]
impl ProfileStore for GraphProfileClient {
    async fn display_names(&self, upns: &[String]) -> Result<HashMap<String, String>, AppError> {
        if upns.len() > BATCH_LIMIT {
            return Err(AppError::BadRequest(format!(
                "display_names called with {} UPNs, limit is {BATCH_LIMIT}",
                upns.len()
            )));
        }
        let responses = self
            .client
            .batch(&Self::batch_requests(upns, "displayName"))
            .await?;

        let mut names = HashMap::new();
        for response in responses {
            let Ok(index) = response.id.parse::<usize>() else {
                continue;
            };
            let Some(upn) = upns.get(index) else { continue };
            match response.status {
                200 => {
                    if let Some(name) = response
                        .body
                        .get("displayName")
                        .and_then(Value::as_str)
                    {
                        names.insert(upn.clone(), name.to_string());
                    }
                }
                // External users have no profile in this tenant.
                404 => {
                    names.insert(upn.clone(), upn.clone());
                }
                _ => {}
            }
        }
        Ok(names)
    }

    async fn primary_mails(&self, upns: &[String]) -> Result<Vec<String>, AppError> {
        let mut mails = Vec::new();
        for chunk in upns.chunks(BATCH_LIMIT) {
            let responses = self
                .client
                .batch(&Self::batch_requests(chunk, "displayName,mail"))
                .await?;
            for response in responses {
                if response.status != 200 {
                    continue;
                }
                if let Some(mail) = response.body.get("mail").and_then(Value::as_str) {
                    if !mails.contains(&mail.to_string()) {
                        mails.push(mail.to_string());
                    }
                }
            }
        }
        Ok(mails)
    }
}

/// Resolve every UPN to a display name: chunked remote lookups, then the
/// override table on top. One failed chunk is logged and skipped so the
/// remaining participants still resolve.
pub async fn resolve_display_names(
    store: &dyn ProfileStore,
    overrides: &HashMap<String, String>,
    upns: &[String],
) -> Result<HashMap<String, String>, AppError> {
    let mut names = HashMap::new();
    for chunk in upns.chunks(BATCH_LIMIT) {
        match store.display_names(chunk).await {
            Ok(resolved) => names.extend(resolved),
            Err(err) => {
                log::error!("Display-name batch failed: {err}");
            }
        }
    }
    for (upn, display_name) in overrides {
        if names.contains_key(upn) {
            names.insert(upn.clone(), display_name.clone());
        }
    }
    Ok(names)
}
