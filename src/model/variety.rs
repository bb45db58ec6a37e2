use crate::logic::validate::{BodySchema, FieldKind, FieldRule};
use crate::model::{Category, Taxonomy};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A cultivated plant variety. Belongs to exactly one taxonomy and to any
/// number of categories.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variety {
    pub id: i64,
    pub name: String,
    pub scientific_name: String,
    pub description: Option<String>,
    pub origin: String,
    #[serde(default)]
    pub synonyms: Vec<String>,
    pub genus: String,
    pub species: String,
    pub taxonomy_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taxonomy: Option<Taxonomy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<Category>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVariety {
    pub name: String,
    pub scientific_name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub origin: String,
    #[serde(default)]
    pub synonyms: Vec<String>,
    pub genus: String,
    pub species: String,
    pub taxonomy_id: i64,
    /// Categories linked in the same write as the create (atomic).
    #[serde(default)]
    pub category_ids: Vec<i64>,
}

/// Partial update; absent fields keep their stored values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VarietyPatch {
    pub name: Option<String>,
    pub scientific_name: Option<String>,
    pub description: Option<String>,
    pub origin: Option<String>,
    pub synonyms: Option<Vec<String>>,
    pub genus: Option<String>,
    pub species: Option<String>,
    pub taxonomy_id: Option<i64>,
    pub category_ids: Option<Vec<i64>>,
}

pub const CREATE_VARIETY_SCHEMA: BodySchema = BodySchema {
    fields: &[
        FieldRule {
            name: "name",
            kind: FieldKind::Text,
            required: true,
            message: "Name is required",
        },
        FieldRule {
            name: "scientificName",
            kind: FieldKind::Text,
            required: true,
            message: "Scientific name is required",
        },
        FieldRule {
            name: "description",
            kind: FieldKind::FreeText,
            required: false,
            message: "Description must be a string",
        },
        FieldRule {
            name: "origin",
            kind: FieldKind::Text,
            required: true,
            message: "Origin is required",
        },
        FieldRule {
            name: "synonyms",
            kind: FieldKind::TextList,
            required: false,
            message: "Synonyms must be a list of strings",
        },
        FieldRule {
            name: "genus",
            kind: FieldKind::Text,
            required: true,
            message: "Genus is required",
        },
        FieldRule {
            name: "species",
            kind: FieldKind::Text,
            required: true,
            message: "Species is required",
        },
        FieldRule {
            name: "taxonomyId",
            kind: FieldKind::Id,
            required: true,
            message: "Taxonomy id is required",
        },
        FieldRule {
            name: "categoryIds",
            kind: FieldKind::IdList,
            required: false,
            message: "Category ids must be a list of ids",
        },
    ],
};

pub const UPDATE_VARIETY_SCHEMA: BodySchema = BodySchema {
    fields: &[
        FieldRule {
            name: "name",
            kind: FieldKind::Text,
            required: false,
            message: "Name is required",
        },
        FieldRule {
            name: "scientificName",
            kind: FieldKind::Text,
            required: false,
            message: "Scientific name is required",
        },
        FieldRule {
            name: "description",
            kind: FieldKind::FreeText,
            required: false,
            message: "Description must be a string",
        },
        FieldRule {
            name: "origin",
            kind: FieldKind::Text,
            required: false,
            message: "Origin is required",
        },
        FieldRule {
            name: "synonyms",
            kind: FieldKind::TextList,
            required: false,
            message: "Synonyms must be a list of strings",
        },
        FieldRule {
            name: "genus",
            kind: FieldKind::Text,
            required: false,
            message: "Genus is required",
        },
        FieldRule {
            name: "species",
            kind: FieldKind::Text,
            required: false,
            message: "Species is required",
        },
        FieldRule {
            name: "taxonomyId",
            kind: FieldKind::Id,
            required: false,
            message: "Taxonomy id is required",
        },
        FieldRule {
            name: "categoryIds",
            kind: FieldKind::IdList,
            required: false,
            message: "Category ids must be a list of ids",
        },
    ],
};
