use crate::logic::validate::{BodySchema, FieldKind, FieldRule};
use crate::model::Variety;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Botanical classification. The five rank fields are unique as a group.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Taxonomy {
    pub id: i64,
    pub kingdom: String,
    pub phylum: String,
    #[serde(rename = "class")]
    pub class_name: String,
    pub order: String,
    pub family: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub varieties: Option<Vec<Variety>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTaxonomy {
    pub kingdom: String,
    pub phylum: String,
    #[serde(rename = "class")]
    pub class_name: String,
    pub order: String,
    pub family: String,
}

impl NewTaxonomy {
    /// Key used for the composite uniqueness constraint.
    pub fn rank_key(&self) -> (&str, &str, &str, &str, &str) {
        (
            &self.kingdom,
            &self.phylum,
            &self.class_name,
            &self.order,
            &self.family,
        )
    }
}

pub const CREATE_TAXONOMY_SCHEMA: BodySchema = BodySchema {
    fields: &[
        FieldRule {
            name: "kingdom",
            kind: FieldKind::Text,
            required: true,
            message: "Kingdom is required",
        },
        FieldRule {
            name: "phylum",
            kind: FieldKind::Text,
            required: true,
            message: "Phylum is required",
        },
        FieldRule {
            name: "class",
            kind: FieldKind::Text,
            required: true,
            message: "Class is required",
        },
        FieldRule {
            name: "order",
            kind: FieldKind::Text,
            required: true,
            message: "Order is required",
        },
        FieldRule {
            name: "family",
            kind: FieldKind::Text,
            required: true,
            message: "Family is required",
        },
    ],
};
