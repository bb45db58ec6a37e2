use anyhow::anyhow;
use chrono::Utc;
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering;

use crate::logic::{IncludeSpec, QueryOptions, SortDirection};
use crate::model::{
    Category, NewCategory, NewTaxonomy, NewVariety, Taxonomy, Variety, VarietyPatch,
};
use crate::store::error::{StoreError, StoreResult};
use crate::store::traits::{CategoryStore, Store, TaxonomyStore, VarietyStore};

/// Matches the VARCHAR(255) columns of the Postgres schema so both stores
/// classify oversized values the same way.
const MAX_TEXT_LEN: usize = 255;

/// In-process store used by the test suite and by server runs without a
/// configured database. Same observable semantics as [`PostgresStore`]:
/// uniqueness, referential checks, length limits and error classification.
///
/// [`PostgresStore`]: crate::store::postgres::PostgresStore
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

#[derive(Debug, Default)]
struct Tables {
    categories: Vec<Category>,
    taxonomies: Vec<Taxonomy>,
    varieties: Vec<Variety>,
    /// (variety_id, category_id) join rows.
    variety_categories: Vec<(i64, i64)>,
    next_category_id: i64,
    next_taxonomy_id: i64,
    next_variety_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Tables {
    fn next_category_id(&mut self) -> i64 {
        self.next_category_id += 1;
        self.next_category_id
    }

    fn next_taxonomy_id(&mut self) -> i64 {
        self.next_taxonomy_id += 1;
        self.next_taxonomy_id
    }

    fn next_variety_id(&mut self) -> i64 {
        self.next_variety_id += 1;
        self.next_variety_id
    }
}

fn ensure_fits(column: &str, value: &str) -> StoreResult<()> {
    if value.chars().count() > MAX_TEXT_LEN {
        return Err(StoreError::ValueTooLong(format!(
            "value for column \"{}\" exceeds {} characters",
            column, MAX_TEXT_LEN
        )));
    }
    Ok(())
}

fn unknown_field(field: &str) -> StoreError {
    StoreError::Other(anyhow!("unknown field `{}` in query options", field))
}

fn unknown_relation(entity: &str, relation: &str) -> StoreError {
    StoreError::Other(anyhow!("unknown relation `{}` for {}", relation, entity))
}

/// Stringified scalar used for case-insensitive comparison against filter
/// candidates. Non-scalar values never match.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn compare_json(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

/// Filterable/sortable wire-format field names per table. Kept in lockstep
/// with the column maps of the Postgres store so unknown fields classify
/// identically in both backends.
const CATEGORY_FIELDS: &[&str] = &["id", "name", "description", "createdAt", "updatedAt"];
const TAXONOMY_FIELDS: &[&str] = &[
    "id",
    "kingdom",
    "phylum",
    "class",
    "order",
    "family",
    "createdAt",
    "updatedAt",
];
const VARIETY_FIELDS: &[&str] = &[
    "id",
    "name",
    "scientificName",
    "description",
    "origin",
    "genus",
    "species",
    "taxonomyId",
    "createdAt",
    "updatedAt",
];

/// Applies predicate and ordering over the serialized form of each row, so
/// filter/sort fields address the wire-format (camelCase) field names.
/// Fields are checked before any row is touched; unknown fields are rejected
/// even when the table is empty.
fn apply_query<T: Serialize + Clone>(
    rows: &[T],
    options: &QueryOptions,
    fields: &[&str],
) -> StoreResult<Vec<T>> {
    if let Some(predicates) = &options.predicate {
        for predicate in predicates {
            if !fields.contains(&predicate.field.as_str()) {
                return Err(unknown_field(&predicate.field));
            }
        }
    }
    for key in &options.ordering {
        if !fields.contains(&key.field.as_str()) {
            return Err(unknown_field(&key.field));
        }
    }

    let mut selected: Vec<(T, Value)> = Vec::new();

    'rows: for row in rows {
        let json = serde_json::to_value(row).map_err(|e| StoreError::Other(e.into()))?;
        if let Some(predicates) = &options.predicate {
            for predicate in predicates {
                let field = json.get(&predicate.field).unwrap_or(&Value::Null);
                match scalar_text(field) {
                    Some(text) if predicate.matches(&text) => {}
                    _ => continue 'rows,
                }
            }
        }
        selected.push((row.clone(), json));
    }

    if !options.ordering.is_empty() {
        selected.sort_by(|(_, a), (_, b)| {
            for key in &options.ordering {
                let left = a.get(&key.field).unwrap_or(&Value::Null);
                let right = b.get(&key.field).unwrap_or(&Value::Null);
                let ordering = match key.direction {
                    SortDirection::Asc => compare_json(left, right),
                    SortDirection::Desc => compare_json(right, left),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });
    }

    Ok(selected.into_iter().map(|(row, _)| row).collect())
}

fn attach_category_relations(
    tables: &Tables,
    category: &mut Category,
    include: &IncludeSpec,
) -> StoreResult<()> {
    for (relation, _) in include.iter() {
        match relation {
            "varieties" => {
                let sub = include.child("varieties");
                let mut varieties: Vec<Variety> = tables
                    .varieties
                    .iter()
                    .filter(|v| tables.variety_categories.contains(&(v.id, category.id)))
                    .cloned()
                    .collect();
                for variety in &mut varieties {
                    attach_variety_relations(tables, variety, &sub)?;
                }
                category.varieties = Some(varieties);
            }
            other => return Err(unknown_relation("category", other)),
        }
    }
    Ok(())
}

fn attach_taxonomy_relations(
    tables: &Tables,
    taxonomy: &mut Taxonomy,
    include: &IncludeSpec,
) -> StoreResult<()> {
    for (relation, _) in include.iter() {
        match relation {
            "varieties" => {
                let sub = include.child("varieties");
                let mut varieties: Vec<Variety> = tables
                    .varieties
                    .iter()
                    .filter(|v| v.taxonomy_id == taxonomy.id)
                    .cloned()
                    .collect();
                for variety in &mut varieties {
                    attach_variety_relations(tables, variety, &sub)?;
                }
                taxonomy.varieties = Some(varieties);
            }
            other => return Err(unknown_relation("taxonomy", other)),
        }
    }
    Ok(())
}

fn attach_variety_relations(
    tables: &Tables,
    variety: &mut Variety,
    include: &IncludeSpec,
) -> StoreResult<()> {
    for (relation, _) in include.iter() {
        match relation {
            "taxonomy" => {
                let sub = include.child("taxonomy");
                let mut taxonomy = tables
                    .taxonomies
                    .iter()
                    .find(|t| t.id == variety.taxonomy_id)
                    .cloned()
                    .ok_or_else(|| {
                        StoreError::Other(anyhow!(
                            "variety {} references missing taxonomy {}",
                            variety.id,
                            variety.taxonomy_id
                        ))
                    })?;
                attach_taxonomy_relations(tables, &mut taxonomy, &sub)?;
                variety.taxonomy = Some(taxonomy);
            }
            "categories" => {
                let sub = include.child("categories");
                let mut categories: Vec<Category> = tables
                    .categories
                    .iter()
                    .filter(|c| tables.variety_categories.contains(&(variety.id, c.id)))
                    .cloned()
                    .collect();
                for category in &mut categories {
                    attach_category_relations(tables, category, &sub)?;
                }
                variety.categories = Some(categories);
            }
            other => return Err(unknown_relation("variety", other)),
        }
    }
    Ok(())
}

#[async_trait::async_trait]
impl CategoryStore for MemoryStore {
    async fn find_categories(
        &self,
        options: &QueryOptions,
        include: &IncludeSpec,
    ) -> StoreResult<Vec<Category>> {
        let tables = self.tables.read();
        let mut categories = apply_query(&tables.categories, options, CATEGORY_FIELDS)?;
        for category in &mut categories {
            attach_category_relations(&tables, category, include)?;
        }
        Ok(categories)
    }

    async fn find_category(
        &self,
        id: i64,
        include: &IncludeSpec,
    ) -> StoreResult<Option<Category>> {
        let tables = self.tables.read();
        let Some(mut category) = tables.categories.iter().find(|c| c.id == id).cloned() else {
            return Ok(None);
        };
        attach_category_relations(&tables, &mut category, include)?;
        Ok(Some(category))
    }

    async fn create_category(&self, data: NewCategory) -> StoreResult<Category> {
        ensure_fits("name", &data.name)?;
        let mut tables = self.tables.write();
        if tables.categories.iter().any(|c| c.name == data.name) {
            return Err(StoreError::UniqueViolation(format!(
                "category name \"{}\" already exists",
                data.name
            )));
        }
        let now = Utc::now();
        let category = Category {
            id: tables.next_category_id(),
            name: data.name,
            description: data.description,
            created_at: now,
            updated_at: now,
            varieties: None,
        };
        tables.categories.push(category.clone());
        Ok(category)
    }

    async fn update_category(&self, id: i64, data: NewCategory) -> StoreResult<Category> {
        ensure_fits("name", &data.name)?;
        let mut tables = self.tables.write();
        if tables
            .categories
            .iter()
            .any(|c| c.id != id && c.name == data.name)
        {
            return Err(StoreError::UniqueViolation(format!(
                "category name \"{}\" already exists",
                data.name
            )));
        }
        let category = tables
            .categories
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(StoreError::NotFound)?;
        category.name = data.name;
        category.description = data.description;
        category.updated_at = Utc::now();
        Ok(category.clone())
    }

    async fn delete_category(&self, id: i64) -> StoreResult<()> {
        let mut tables = self.tables.write();
        let position = tables
            .categories
            .iter()
            .position(|c| c.id == id)
            .ok_or(StoreError::NotFound)?;
        tables.categories.remove(position);
        tables.variety_categories.retain(|(_, cid)| *cid != id);
        Ok(())
    }

    async fn delete_categories(&self) -> StoreResult<()> {
        let mut tables = self.tables.write();
        tables.categories.clear();
        tables.variety_categories.clear();
        Ok(())
    }
}

#[async_trait::async_trait]
impl TaxonomyStore for MemoryStore {
    async fn find_taxonomies(
        &self,
        options: &QueryOptions,
        include: &IncludeSpec,
    ) -> StoreResult<Vec<Taxonomy>> {
        let tables = self.tables.read();
        let mut taxonomies = apply_query(&tables.taxonomies, options, TAXONOMY_FIELDS)?;
        for taxonomy in &mut taxonomies {
            attach_taxonomy_relations(&tables, taxonomy, include)?;
        }
        Ok(taxonomies)
    }

    async fn find_taxonomy(
        &self,
        id: i64,
        include: &IncludeSpec,
    ) -> StoreResult<Option<Taxonomy>> {
        let tables = self.tables.read();
        let Some(mut taxonomy) = tables.taxonomies.iter().find(|t| t.id == id).cloned() else {
            return Ok(None);
        };
        attach_taxonomy_relations(&tables, &mut taxonomy, include)?;
        Ok(Some(taxonomy))
    }

    async fn create_taxonomy(&self, data: NewTaxonomy) -> StoreResult<Taxonomy> {
        for (column, value) in [
            ("kingdom", &data.kingdom),
            ("phylum", &data.phylum),
            ("class", &data.class_name),
            ("order", &data.order),
            ("family", &data.family),
        ] {
            ensure_fits(column, value)?;
        }
        let mut tables = self.tables.write();
        if tables.taxonomies.iter().any(|t| {
            (
                t.kingdom.as_str(),
                t.phylum.as_str(),
                t.class_name.as_str(),
                t.order.as_str(),
                t.family.as_str(),
            ) == data.rank_key()
        }) {
            return Err(StoreError::UniqueViolation(
                "taxonomy classification already exists".to_string(),
            ));
        }
        let now = Utc::now();
        let taxonomy = Taxonomy {
            id: tables.next_taxonomy_id(),
            kingdom: data.kingdom,
            phylum: data.phylum,
            class_name: data.class_name,
            order: data.order,
            family: data.family,
            created_at: now,
            updated_at: now,
            varieties: None,
        };
        tables.taxonomies.push(taxonomy.clone());
        Ok(taxonomy)
    }

    async fn update_taxonomy(&self, id: i64, data: NewTaxonomy) -> StoreResult<Taxonomy> {
        let mut tables = self.tables.write();
        if tables.taxonomies.iter().any(|t| {
            t.id != id
                && (
                    t.kingdom.as_str(),
                    t.phylum.as_str(),
                    t.class_name.as_str(),
                    t.order.as_str(),
                    t.family.as_str(),
                ) == data.rank_key()
        }) {
            return Err(StoreError::UniqueViolation(
                "taxonomy classification already exists".to_string(),
            ));
        }
        let taxonomy = tables
            .taxonomies
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(StoreError::NotFound)?;
        taxonomy.kingdom = data.kingdom;
        taxonomy.phylum = data.phylum;
        taxonomy.class_name = data.class_name;
        taxonomy.order = data.order;
        taxonomy.family = data.family;
        taxonomy.updated_at = Utc::now();
        Ok(taxonomy.clone())
    }

    async fn delete_taxonomy(&self, id: i64) -> StoreResult<()> {
        let mut tables = self.tables.write();
        if !tables.taxonomies.iter().any(|t| t.id == id) {
            return Err(StoreError::NotFound);
        }
        if tables.varieties.iter().any(|v| v.taxonomy_id == id) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "taxonomy {} is still referenced by varieties",
                id
            )));
        }
        tables.taxonomies.retain(|t| t.id != id);
        Ok(())
    }

    async fn delete_taxonomies(&self) -> StoreResult<()> {
        let mut tables = self.tables.write();
        if !tables.varieties.is_empty() {
            return Err(StoreError::ForeignKeyViolation(
                "taxonomies are still referenced by varieties".to_string(),
            ));
        }
        tables.taxonomies.clear();
        Ok(())
    }
}

#[async_trait::async_trait]
impl VarietyStore for MemoryStore {
    async fn find_varieties(
        &self,
        options: &QueryOptions,
        include: &IncludeSpec,
    ) -> StoreResult<Vec<Variety>> {
        let tables = self.tables.read();
        let mut varieties = apply_query(&tables.varieties, options, VARIETY_FIELDS)?;
        for variety in &mut varieties {
            attach_variety_relations(&tables, variety, include)?;
        }
        Ok(varieties)
    }

    async fn find_variety(&self, id: i64, include: &IncludeSpec) -> StoreResult<Option<Variety>> {
        let tables = self.tables.read();
        let Some(mut variety) = tables.varieties.iter().find(|v| v.id == id).cloned() else {
            return Ok(None);
        };
        attach_variety_relations(&tables, &mut variety, include)?;
        Ok(Some(variety))
    }

    async fn create_variety(&self, data: NewVariety) -> StoreResult<Variety> {
        for (column, value) in [
            ("name", &data.name),
            ("scientific_name", &data.scientific_name),
            ("origin", &data.origin),
            ("genus", &data.genus),
            ("species", &data.species),
        ] {
            ensure_fits(column, value)?;
        }
        let mut tables = self.tables.write();
        if tables.varieties.iter().any(|v| v.name == data.name) {
            return Err(StoreError::UniqueViolation(format!(
                "variety name \"{}\" already exists",
                data.name
            )));
        }
        if !tables.taxonomies.iter().any(|t| t.id == data.taxonomy_id) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "taxonomy {} does not exist",
                data.taxonomy_id
            )));
        }
        for category_id in &data.category_ids {
            if !tables.categories.iter().any(|c| c.id == *category_id) {
                return Err(StoreError::ForeignKeyViolation(format!(
                    "category {} does not exist",
                    category_id
                )));
            }
        }
        let now = Utc::now();
        let variety = Variety {
            id: tables.next_variety_id(),
            name: data.name,
            scientific_name: data.scientific_name,
            description: data.description,
            origin: data.origin,
            synonyms: data.synonyms,
            genus: data.genus,
            species: data.species,
            taxonomy_id: data.taxonomy_id,
            created_at: now,
            updated_at: now,
            taxonomy: None,
            categories: None,
        };
        for category_id in data.category_ids {
            tables.variety_categories.push((variety.id, category_id));
        }
        tables.varieties.push(variety.clone());
        Ok(variety)
    }

    async fn update_variety(&self, id: i64, data: VarietyPatch) -> StoreResult<Variety> {
        if let Some(name) = &data.name {
            ensure_fits("name", name)?;
        }
        let mut tables = self.tables.write();
        if let Some(name) = &data.name {
            if tables.varieties.iter().any(|v| v.id != id && &v.name == name) {
                return Err(StoreError::UniqueViolation(format!(
                    "variety name \"{}\" already exists",
                    name
                )));
            }
        }
        if let Some(taxonomy_id) = data.taxonomy_id {
            if !tables.taxonomies.iter().any(|t| t.id == taxonomy_id) {
                return Err(StoreError::ForeignKeyViolation(format!(
                    "taxonomy {} does not exist",
                    taxonomy_id
                )));
            }
        }
        if let Some(category_ids) = &data.category_ids {
            for category_id in category_ids {
                if !tables.categories.iter().any(|c| c.id == *category_id) {
                    return Err(StoreError::ForeignKeyViolation(format!(
                        "category {} does not exist",
                        category_id
                    )));
                }
            }
        }
        if !tables.varieties.iter().any(|v| v.id == id) {
            return Err(StoreError::NotFound);
        }

        if let Some(category_ids) = &data.category_ids {
            tables.variety_categories.retain(|(vid, _)| *vid != id);
            for category_id in category_ids {
                tables.variety_categories.push((id, *category_id));
            }
        }
        let variety = tables
            .varieties
            .iter_mut()
            .find(|v| v.id == id)
            .ok_or(StoreError::NotFound)?;
        if let Some(name) = data.name {
            variety.name = name;
        }
        if let Some(scientific_name) = data.scientific_name {
            variety.scientific_name = scientific_name;
        }
        if let Some(description) = data.description {
            variety.description = Some(description);
        }
        if let Some(origin) = data.origin {
            variety.origin = origin;
        }
        if let Some(synonyms) = data.synonyms {
            variety.synonyms = synonyms;
        }
        if let Some(genus) = data.genus {
            variety.genus = genus;
        }
        if let Some(species) = data.species {
            variety.species = species;
        }
        if let Some(taxonomy_id) = data.taxonomy_id {
            variety.taxonomy_id = taxonomy_id;
        }
        variety.updated_at = Utc::now();
        Ok(variety.clone())
    }

    async fn delete_variety(&self, id: i64) -> StoreResult<()> {
        let mut tables = self.tables.write();
        let position = tables
            .varieties
            .iter()
            .position(|v| v.id == id)
            .ok_or(StoreError::NotFound)?;
        tables.varieties.remove(position);
        tables.variety_categories.retain(|(vid, _)| *vid != id);
        Ok(())
    }

    async fn delete_varieties(&self) -> StoreResult<()> {
        let mut tables = self.tables.write();
        tables.varieties.clear();
        tables.variety_categories.clear();
        Ok(())
    }
}

impl Store for MemoryStore {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::{build_query_options, compile_include, parse_query};

    fn category(name: &str) -> NewCategory {
        NewCategory {
            name: name.to_string(),
            description: None,
        }
    }

    fn taxonomy(family: &str) -> NewTaxonomy {
        NewTaxonomy {
            kingdom: "Plantae".to_string(),
            phylum: "Tracheophyta".to_string(),
            class_name: "Magnoliopsida".to_string(),
            order: "Lamiales".to_string(),
            family: family.to_string(),
        }
    }

    fn variety(name: &str, taxonomy_id: i64, category_ids: Vec<i64>) -> NewVariety {
        NewVariety {
            name: name.to_string(),
            scientific_name: format!("{} sp.", name),
            description: None,
            origin: "Asia".to_string(),
            synonyms: vec![],
            genus: "Ocimum".to_string(),
            species: "basilicum".to_string(),
            taxonomy_id,
            category_ids,
        }
    }

    fn options(filter: &str, sort: &str) -> QueryOptions {
        build_query_options(&parse_query(filter, false), &parse_query(sort, false))
    }

    #[tokio::test]
    async fn filters_case_insensitively_and_sorts() {
        let store = MemoryStore::new();
        for name in ["Tree", "Herb", "Fruit"] {
            store.create_category(category(name)).await.unwrap();
        }

        let found = store
            .find_categories(&options("name=herb,FRUIT", "name=asc"), &IncludeSpec::default())
            .await
            .unwrap();
        let names: Vec<&str> = found.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Fruit", "Herb"]);
    }

    #[tokio::test]
    async fn descending_sort_and_default_order() {
        let store = MemoryStore::new();
        for name in ["B", "A", "C"] {
            store.create_category(category(name)).await.unwrap();
        }

        let found = store
            .find_categories(&options("", "name=desc"), &IncludeSpec::default())
            .await
            .unwrap();
        let names: Vec<&str> = found.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["C", "B", "A"]);

        // No sort keys: insertion order.
        let found = store
            .find_categories(&options("", ""), &IncludeSpec::default())
            .await
            .unwrap();
        let names: Vec<&str> = found.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A", "C"]);
    }

    #[tokio::test]
    async fn duplicate_category_name_is_a_unique_violation() {
        let store = MemoryStore::new();
        store.create_category(category("Herb")).await.unwrap();
        let err = store.create_category(category("Herb")).await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation(_)));
    }

    #[tokio::test]
    async fn update_and_delete_report_not_found() {
        let store = MemoryStore::new();
        let err = store.update_category(999, category("X")).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
        let err = store.delete_category(999).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[tokio::test]
    async fn variety_requires_existing_taxonomy_and_categories() {
        let store = MemoryStore::new();
        let err = store
            .create_variety(variety("Basil", 42, vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ForeignKeyViolation(_)));

        let tax = store.create_taxonomy(taxonomy("Lamiaceae")).await.unwrap();
        let err = store
            .create_variety(variety("Basil", tax.id, vec![7]))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ForeignKeyViolation(_)));
    }

    #[tokio::test]
    async fn include_populates_nested_relations() {
        let store = MemoryStore::new();
        let herb = store.create_category(category("Herb")).await.unwrap();
        let tax = store.create_taxonomy(taxonomy("Lamiaceae")).await.unwrap();
        store
            .create_variety(variety("Basil", tax.id, vec![herb.id]))
            .await
            .unwrap();

        let found = store
            .find_category(herb.id, &compile_include("varieties.taxonomy"))
            .await
            .unwrap()
            .unwrap();
        let varieties = found.varieties.unwrap();
        assert_eq!(varieties.len(), 1);
        assert_eq!(
            varieties[0].taxonomy.as_ref().unwrap().family,
            "Lamiaceae"
        );
    }

    #[tokio::test]
    async fn unknown_query_fields_are_rejected_even_on_empty_tables() {
        let store = MemoryStore::new();

        let err = store
            .find_categories(&options("", "bogus=asc"), &IncludeSpec::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Other(_)));

        let err = store
            .find_categories(&options("bogus=x", ""), &IncludeSpec::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Other(_)));
    }

    #[tokio::test]
    async fn unknown_relation_is_an_unclassified_error() {
        let store = MemoryStore::new();
        store.create_category(category("Herb")).await.unwrap();
        let err = store
            .find_categories(&QueryOptions::default(), &compile_include("bogus"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Other(_)));
    }

    #[tokio::test]
    async fn taxonomy_delete_is_restricted_while_referenced() {
        let store = MemoryStore::new();
        let tax = store.create_taxonomy(taxonomy("Lamiaceae")).await.unwrap();
        store
            .create_variety(variety("Basil", tax.id, vec![]))
            .await
            .unwrap();

        let err = store.delete_taxonomy(tax.id).await.unwrap_err();
        assert!(matches!(err, StoreError::ForeignKeyViolation(_)));

        store.delete_varieties().await.unwrap();
        store.delete_taxonomy(tax.id).await.unwrap();
    }

    #[tokio::test]
    async fn oversized_values_are_classified() {
        let store = MemoryStore::new();
        let err = store
            .create_category(category(&"x".repeat(300)))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ValueTooLong(_)));
    }
}
