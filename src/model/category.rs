use crate::logic::validate::{BodySchema, FieldKind, FieldRule};
use crate::model::Variety;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Populated only when the request includes the `varieties` relation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub varieties: Option<Vec<Variety>>,
}

/// Create/replace payload. Ids and timestamps are store-assigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

pub const CREATE_CATEGORY_SCHEMA: BodySchema = BodySchema {
    fields: &[
        FieldRule {
            name: "name",
            kind: FieldKind::Text,
            required: true,
            message: "Name is required",
        },
        FieldRule {
            name: "description",
            kind: FieldKind::FreeText,
            required: false,
            message: "Description must be a string",
        },
    ],
};
