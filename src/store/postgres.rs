use anyhow::{anyhow, Context, Result};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use std::future::Future;
use std::pin::Pin;

use crate::logic::{IncludeSpec, QueryOptions, SortDirection};
use crate::model::{
    Category, NewCategory, NewTaxonomy, NewVariety, Taxonomy, Variety, VarietyPatch,
};
use crate::store::error::{StoreError, StoreResult};
use crate::store::traits::{CategoryStore, Store, TaxonomyStore, VarietyStore};

type BoxedResult<'a> = Pin<Box<dyn Future<Output = StoreResult<()>> + Send + 'a>>;

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new PostgreSQL store with the given database URL
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .connect(database_url)
            .await
            .context("Failed to create PostgreSQL connection pool")?;

        Ok(Self { pool })
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the schema when it does not exist yet.
    pub async fn migrate(&self) -> Result<()> {
        let statements = [
            r#"CREATE TABLE IF NOT EXISTS categories (
                id BIGSERIAL PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                description TEXT,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )"#,
            r#"CREATE TABLE IF NOT EXISTS taxonomies (
                id BIGSERIAL PRIMARY KEY,
                kingdom VARCHAR(255) NOT NULL,
                phylum VARCHAR(255) NOT NULL,
                "class" VARCHAR(255) NOT NULL,
                "order" VARCHAR(255) NOT NULL,
                family VARCHAR(255) NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                UNIQUE (kingdom, phylum, "class", "order", family)
            )"#,
            r#"CREATE TABLE IF NOT EXISTS varieties (
                id BIGSERIAL PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                scientific_name VARCHAR(255) NOT NULL,
                description TEXT,
                origin VARCHAR(255) NOT NULL,
                synonyms TEXT[] NOT NULL DEFAULT '{}',
                genus VARCHAR(255) NOT NULL,
                species VARCHAR(255) NOT NULL,
                taxonomy_id BIGINT NOT NULL REFERENCES taxonomies(id),
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )"#,
            r#"CREATE TABLE IF NOT EXISTS variety_categories (
                variety_id BIGINT NOT NULL REFERENCES varieties(id) ON DELETE CASCADE,
                category_id BIGINT NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
                PRIMARY KEY (variety_id, category_id)
            )"#,
        ];
        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .context("Failed to create schema")?;
        }
        Ok(())
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    if matches!(err, sqlx::Error::RowNotFound) {
        return StoreError::NotFound;
    }
    if let sqlx::Error::Database(ref db) = err {
        match db.code().as_deref() {
            Some("22001") => return StoreError::ValueTooLong(db.message().to_string()),
            Some("23505") => return StoreError::UniqueViolation(db.message().to_string()),
            Some("23503") => return StoreError::ForeignKeyViolation(db.message().to_string()),
            _ => {}
        }
    }
    StoreError::Other(anyhow::Error::from(err))
}

fn unknown_field(field: &str) -> StoreError {
    StoreError::Other(anyhow!("unknown field `{}` in query options", field))
}

/// Wire-format field name to (quoted) column, per table. Everything else is
/// rejected before it can reach the SQL text.
fn category_column(field: &str) -> Option<&'static str> {
    match field {
        "id" => Some("id"),
        "name" => Some("name"),
        "description" => Some("description"),
        "createdAt" => Some("created_at"),
        "updatedAt" => Some("updated_at"),
        _ => None,
    }
}

fn taxonomy_column(field: &str) -> Option<&'static str> {
    match field {
        "id" => Some("id"),
        "kingdom" => Some("kingdom"),
        "phylum" => Some("phylum"),
        "class" => Some(r#""class""#),
        "order" => Some(r#""order""#),
        "family" => Some("family"),
        "createdAt" => Some("created_at"),
        "updatedAt" => Some("updated_at"),
        _ => None,
    }
}

fn variety_column(field: &str) -> Option<&'static str> {
    match field {
        "id" => Some("id"),
        "name" => Some("name"),
        "scientificName" => Some("scientific_name"),
        "description" => Some("description"),
        "origin" => Some("origin"),
        "genus" => Some("genus"),
        "species" => Some("species"),
        "taxonomyId" => Some("taxonomy_id"),
        "createdAt" => Some("created_at"),
        "updatedAt" => Some("updated_at"),
        _ => None,
    }
}

/// Appends WHERE/ORDER BY clauses for the normalized query options. With no
/// sort keys rows come back in primary-key order.
fn push_query_clauses(
    builder: &mut QueryBuilder<Postgres>,
    options: &QueryOptions,
    column_for: fn(&str) -> Option<&'static str>,
) -> StoreResult<()> {
    if let Some(predicates) = &options.predicate {
        builder.push(" WHERE ");
        for (index, predicate) in predicates.iter().enumerate() {
            let column = column_for(&predicate.field).ok_or_else(|| unknown_field(&predicate.field))?;
            if index > 0 {
                builder.push(" AND ");
            }
            builder
                .push("LOWER(")
                .push(column)
                .push("::TEXT) = ANY(")
                .push_bind(predicate.one_of.clone())
                .push(")");
        }
    }

    if options.ordering.is_empty() {
        builder.push(" ORDER BY id");
    } else {
        builder.push(" ORDER BY ");
        for (index, key) in options.ordering.iter().enumerate() {
            let column = column_for(&key.field).ok_or_else(|| unknown_field(&key.field))?;
            if index > 0 {
                builder.push(", ");
            }
            builder.push(column);
            builder.push(match key.direction {
                SortDirection::Asc => " ASC",
                SortDirection::Desc => " DESC",
            });
        }
    }
    Ok(())
}

const CATEGORY_COLUMNS: &str = "id, name, description, created_at, updated_at";
const TAXONOMY_COLUMNS: &str =
    r#"id, kingdom, phylum, "class", "order", family, created_at, updated_at"#;
const VARIETY_COLUMNS: &str = "id, name, scientific_name, description, origin, synonyms, genus, species, taxonomy_id, created_at, updated_at";

fn row_to_category(row: &PgRow) -> Category {
    Category {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        varieties: None,
    }
}

fn row_to_taxonomy(row: &PgRow) -> Taxonomy {
    Taxonomy {
        id: row.get("id"),
        kingdom: row.get("kingdom"),
        phylum: row.get("phylum"),
        class_name: row.get("class"),
        order: row.get("order"),
        family: row.get("family"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        varieties: None,
    }
}

fn row_to_variety(row: &PgRow) -> Variety {
    Variety {
        id: row.get("id"),
        name: row.get("name"),
        scientific_name: row.get("scientific_name"),
        description: row.get("description"),
        origin: row.get("origin"),
        synonyms: row.get("synonyms"),
        genus: row.get("genus"),
        species: row.get("species"),
        taxonomy_id: row.get("taxonomy_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        taxonomy: None,
        categories: None,
    }
}

impl PostgresStore {
    // Relation loading is mutually recursive across the three entities, so
    // these return boxed futures.

    fn attach_category_relations<'a>(
        &'a self,
        category: &'a mut Category,
        include: &'a IncludeSpec,
    ) -> BoxedResult<'a> {
        Box::pin(async move {
            for (relation, _) in include.iter() {
                match relation {
                    "varieties" => {
                        let sub = include.child("varieties");
                        let rows = sqlx::query(&format!(
                            "SELECT {} FROM varieties WHERE id IN \
                             (SELECT variety_id FROM variety_categories WHERE category_id = $1) \
                             ORDER BY id",
                            VARIETY_COLUMNS
                        ))
                        .bind(category.id)
                        .fetch_all(&self.pool)
                        .await
                        .map_err(map_sqlx_error)?;
                        let mut varieties: Vec<Variety> =
                            rows.iter().map(row_to_variety).collect();
                        for variety in &mut varieties {
                            self.attach_variety_relations(variety, &sub).await?;
                        }
                        category.varieties = Some(varieties);
                    }
                    other => {
                        return Err(StoreError::Other(anyhow!(
                            "unknown relation `{}` for category",
                            other
                        )))
                    }
                }
            }
            Ok(())
        })
    }

    fn attach_taxonomy_relations<'a>(
        &'a self,
        taxonomy: &'a mut Taxonomy,
        include: &'a IncludeSpec,
    ) -> BoxedResult<'a> {
        Box::pin(async move {
            for (relation, _) in include.iter() {
                match relation {
                    "varieties" => {
                        let sub = include.child("varieties");
                        let rows = sqlx::query(&format!(
                            "SELECT {} FROM varieties WHERE taxonomy_id = $1 ORDER BY id",
                            VARIETY_COLUMNS
                        ))
                        .bind(taxonomy.id)
                        .fetch_all(&self.pool)
                        .await
                        .map_err(map_sqlx_error)?;
                        let mut varieties: Vec<Variety> =
                            rows.iter().map(row_to_variety).collect();
                        for variety in &mut varieties {
                            self.attach_variety_relations(variety, &sub).await?;
                        }
                        taxonomy.varieties = Some(varieties);
                    }
                    other => {
                        return Err(StoreError::Other(anyhow!(
                            "unknown relation `{}` for taxonomy",
                            other
                        )))
                    }
                }
            }
            Ok(())
        })
    }

    fn attach_variety_relations<'a>(
        &'a self,
        variety: &'a mut Variety,
        include: &'a IncludeSpec,
    ) -> BoxedResult<'a> {
        Box::pin(async move {
            for (relation, _) in include.iter() {
                match relation {
                    "taxonomy" => {
                        let sub = include.child("taxonomy");
                        let row = sqlx::query(&format!(
                            "SELECT {} FROM taxonomies WHERE id = $1",
                            TAXONOMY_COLUMNS
                        ))
                        .bind(variety.taxonomy_id)
                        .fetch_one(&self.pool)
                        .await
                        .map_err(map_sqlx_error)?;
                        let mut taxonomy = row_to_taxonomy(&row);
                        self.attach_taxonomy_relations(&mut taxonomy, &sub).await?;
                        variety.taxonomy = Some(taxonomy);
                    }
                    "categories" => {
                        let sub = include.child("categories");
                        let rows = sqlx::query(&format!(
                            "SELECT {} FROM categories WHERE id IN \
                             (SELECT category_id FROM variety_categories WHERE variety_id = $1) \
                             ORDER BY id",
                            CATEGORY_COLUMNS
                        ))
                        .bind(variety.id)
                        .fetch_all(&self.pool)
                        .await
                        .map_err(map_sqlx_error)?;
                        let mut categories: Vec<Category> =
                            rows.iter().map(row_to_category).collect();
                        for category in &mut categories {
                            self.attach_category_relations(category, &sub).await?;
                        }
                        variety.categories = Some(categories);
                    }
                    other => {
                        return Err(StoreError::Other(anyhow!(
                            "unknown relation `{}` for variety",
                            other
                        )))
                    }
                }
            }
            Ok(())
        })
    }
}

#[async_trait::async_trait]
impl CategoryStore for PostgresStore {
    async fn find_categories(
        &self,
        options: &QueryOptions,
        include: &IncludeSpec,
    ) -> StoreResult<Vec<Category>> {
        let mut builder =
            QueryBuilder::new(format!("SELECT {} FROM categories", CATEGORY_COLUMNS));
        push_query_clauses(&mut builder, options, category_column)?;
        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        let mut categories: Vec<Category> = rows.iter().map(row_to_category).collect();
        for category in &mut categories {
            self.attach_category_relations(category, include).await?;
        }
        Ok(categories)
    }

    async fn find_category(
        &self,
        id: i64,
        include: &IncludeSpec,
    ) -> StoreResult<Option<Category>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM categories WHERE id = $1",
            CATEGORY_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        let Some(row) = row else {
            return Ok(None);
        };
        let mut category = row_to_category(&row);
        self.attach_category_relations(&mut category, include)
            .await?;
        Ok(Some(category))
    }

    async fn create_category(&self, data: NewCategory) -> StoreResult<Category> {
        let row = sqlx::query(&format!(
            "INSERT INTO categories (name, description) VALUES ($1, $2) RETURNING {}",
            CATEGORY_COLUMNS
        ))
        .bind(&data.name)
        .bind(&data.description)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(row_to_category(&row))
    }

    async fn update_category(&self, id: i64, data: NewCategory) -> StoreResult<Category> {
        let row = sqlx::query(&format!(
            "UPDATE categories SET name = $2, description = $3, updated_at = now() \
             WHERE id = $1 RETURNING {}",
            CATEGORY_COLUMNS
        ))
        .bind(id)
        .bind(&data.name)
        .bind(&data.description)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        row.map(|row| row_to_category(&row))
            .ok_or(StoreError::NotFound)
    }

    async fn delete_category(&self, id: i64) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_categories(&self) -> StoreResult<()> {
        sqlx::query("DELETE FROM categories")
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl TaxonomyStore for PostgresStore {
    async fn find_taxonomies(
        &self,
        options: &QueryOptions,
        include: &IncludeSpec,
    ) -> StoreResult<Vec<Taxonomy>> {
        let mut builder =
            QueryBuilder::new(format!("SELECT {} FROM taxonomies", TAXONOMY_COLUMNS));
        push_query_clauses(&mut builder, options, taxonomy_column)?;
        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        let mut taxonomies: Vec<Taxonomy> = rows.iter().map(row_to_taxonomy).collect();
        for taxonomy in &mut taxonomies {
            self.attach_taxonomy_relations(taxonomy, include).await?;
        }
        Ok(taxonomies)
    }

    async fn find_taxonomy(
        &self,
        id: i64,
        include: &IncludeSpec,
    ) -> StoreResult<Option<Taxonomy>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM taxonomies WHERE id = $1",
            TAXONOMY_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        let Some(row) = row else {
            return Ok(None);
        };
        let mut taxonomy = row_to_taxonomy(&row);
        self.attach_taxonomy_relations(&mut taxonomy, include)
            .await?;
        Ok(Some(taxonomy))
    }

    async fn create_taxonomy(&self, data: NewTaxonomy) -> StoreResult<Taxonomy> {
        let row = sqlx::query(&format!(
            r#"INSERT INTO taxonomies (kingdom, phylum, "class", "order", family)
               VALUES ($1, $2, $3, $4, $5) RETURNING {}"#,
            TAXONOMY_COLUMNS
        ))
        .bind(&data.kingdom)
        .bind(&data.phylum)
        .bind(&data.class_name)
        .bind(&data.order)
        .bind(&data.family)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(row_to_taxonomy(&row))
    }

    async fn update_taxonomy(&self, id: i64, data: NewTaxonomy) -> StoreResult<Taxonomy> {
        let row = sqlx::query(&format!(
            r#"UPDATE taxonomies SET kingdom = $2, phylum = $3, "class" = $4, "order" = $5,
               family = $6, updated_at = now() WHERE id = $1 RETURNING {}"#,
            TAXONOMY_COLUMNS
        ))
        .bind(id)
        .bind(&data.kingdom)
        .bind(&data.phylum)
        .bind(&data.class_name)
        .bind(&data.order)
        .bind(&data.family)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        row.map(|row| row_to_taxonomy(&row))
            .ok_or(StoreError::NotFound)
    }

    async fn delete_taxonomy(&self, id: i64) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM taxonomies WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_taxonomies(&self) -> StoreResult<()> {
        sqlx::query("DELETE FROM taxonomies")
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl VarietyStore for PostgresStore {
    async fn find_varieties(
        &self,
        options: &QueryOptions,
        include: &IncludeSpec,
    ) -> StoreResult<Vec<Variety>> {
        let mut builder = QueryBuilder::new(format!("SELECT {} FROM varieties", VARIETY_COLUMNS));
        push_query_clauses(&mut builder, options, variety_column)?;
        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        let mut varieties: Vec<Variety> = rows.iter().map(row_to_variety).collect();
        for variety in &mut varieties {
            self.attach_variety_relations(variety, include).await?;
        }
        Ok(varieties)
    }

    async fn find_variety(&self, id: i64, include: &IncludeSpec) -> StoreResult<Option<Variety>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM varieties WHERE id = $1",
            VARIETY_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        let Some(row) = row else {
            return Ok(None);
        };
        let mut variety = row_to_variety(&row);
        self.attach_variety_relations(&mut variety, include).await?;
        Ok(Some(variety))
    }

    async fn create_variety(&self, data: NewVariety) -> StoreResult<Variety> {
        // Create and category links are one atomic write.
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        let row = sqlx::query(&format!(
            "INSERT INTO varieties \
             (name, scientific_name, description, origin, synonyms, genus, species, taxonomy_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {}",
            VARIETY_COLUMNS
        ))
        .bind(&data.name)
        .bind(&data.scientific_name)
        .bind(&data.description)
        .bind(&data.origin)
        .bind(&data.synonyms)
        .bind(&data.genus)
        .bind(&data.species)
        .bind(data.taxonomy_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;
        let variety = row_to_variety(&row);

        for category_id in &data.category_ids {
            sqlx::query("INSERT INTO variety_categories (variety_id, category_id) VALUES ($1, $2)")
                .bind(variety.id)
                .bind(category_id)
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
        }
        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(variety)
    }

    async fn update_variety(&self, id: i64, data: VarietyPatch) -> StoreResult<Variety> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        let row = sqlx::query(&format!(
            "UPDATE varieties SET \
             name = COALESCE($2, name), \
             scientific_name = COALESCE($3, scientific_name), \
             description = COALESCE($4, description), \
             origin = COALESCE($5, origin), \
             synonyms = COALESCE($6, synonyms), \
             genus = COALESCE($7, genus), \
             species = COALESCE($8, species), \
             taxonomy_id = COALESCE($9, taxonomy_id), \
             updated_at = now() \
             WHERE id = $1 RETURNING {}",
            VARIETY_COLUMNS
        ))
        .bind(id)
        .bind(&data.name)
        .bind(&data.scientific_name)
        .bind(&data.description)
        .bind(&data.origin)
        .bind(&data.synonyms)
        .bind(&data.genus)
        .bind(&data.species)
        .bind(data.taxonomy_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;
        let variety = row.map(|row| row_to_variety(&row)).ok_or(StoreError::NotFound)?;

        if let Some(category_ids) = &data.category_ids {
            sqlx::query("DELETE FROM variety_categories WHERE variety_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
            for category_id in category_ids {
                sqlx::query(
                    "INSERT INTO variety_categories (variety_id, category_id) VALUES ($1, $2)",
                )
                .bind(id)
                .bind(category_id)
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
            }
        }
        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(variety)
    }

    async fn delete_variety(&self, id: i64) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM varieties WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_varieties(&self) -> StoreResult<()> {
        sqlx::query("DELETE FROM varieties")
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }
}

impl Store for PostgresStore {}
