use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::errors::AppError;
use crate::gateway::{self, ColumnSpec, ColumnType, SqlParam};

/// A custom display-name override for one UPN. Overrides always win over
/// the remote profile lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserMapping {
    pub upn: String,
    pub display_name: String,
}

pub async fn list_all(pool: &PgPool) -> Result<Vec<UserMapping>, AppError> {
    let records = gateway::execute_query(
        pool,
        "SELECT * FROM \"UserMappings\" ORDER BY \"DisplayName\" ASC",
        &[],
    )
    .await?;
    records
        .iter()
        .map(|record| {
            let domain = crate::models::record::to_domain_record(record);
            Ok(serde_json::from_value(serde_json::Value::Object(domain))?)
        })
        .collect()
}

/// The override table as a lookup map.
pub async fn override_map(pool: &PgPool) -> Result<HashMap<String, String>, AppError> {
    Ok(list_all(pool)
        .await?
        .into_iter()
        .map(|mapping| (mapping.upn, mapping.display_name))
        .collect())
}

/// Wholesale replacement: delete everything, then bulk-insert the new set.
///
/// The two statements are not wrapped in one transaction; a crash between
/// them loses the table until the next save. Accepted for a small,
/// manually-edited lookup table.
pub async fn replace_all(pool: &PgPool, mappings: &[UserMapping]) -> Result<(), AppError> {
    gateway::execute(pool, "DELETE FROM \"UserMappings\"", &[]).await?;

    let columns = [
        ColumnSpec::new("Upn", ColumnType::Text, false),
        ColumnSpec::new("DisplayName", ColumnType::Text, false),
    ];
    let rows: Vec<Vec<SqlParam>> = mappings
        .iter()
        .map(|mapping| {
            vec![
                mapping.upn.as_str().into(),
                mapping.display_name.as_str().into(),
            ]
        })
        .collect();
    gateway::bulk_insert(pool, "UserMappings", &columns, &rows).await
}
