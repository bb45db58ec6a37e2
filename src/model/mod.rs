pub mod category;
pub mod taxonomy;
pub mod variety;

pub use category::{Category, NewCategory, CREATE_CATEGORY_SCHEMA};
pub use taxonomy::{NewTaxonomy, Taxonomy, CREATE_TAXONOMY_SCHEMA};
pub use variety::{
    NewVariety, Variety, VarietyPatch, CREATE_VARIETY_SCHEMA, UPDATE_VARIETY_SCHEMA,
};
