use crate::logic::{IncludeSpec, QueryOptions};
use crate::model::{
    Category, NewCategory, NewTaxonomy, NewVariety, Taxonomy, Variety, VarietyPatch,
};
use crate::store::error::StoreResult;

#[async_trait::async_trait]
pub trait CategoryStore: Send + Sync {
    /// Returns an empty vec (not an error) when nothing matches.
    async fn find_categories(
        &self,
        options: &QueryOptions,
        include: &IncludeSpec,
    ) -> StoreResult<Vec<Category>>;
    async fn find_category(&self, id: i64, include: &IncludeSpec)
        -> StoreResult<Option<Category>>;
    async fn create_category(&self, data: NewCategory) -> StoreResult<Category>;
    async fn update_category(&self, id: i64, data: NewCategory) -> StoreResult<Category>;
    async fn delete_category(&self, id: i64) -> StoreResult<()>;
    async fn delete_categories(&self) -> StoreResult<()>;
}

#[async_trait::async_trait]
pub trait TaxonomyStore: Send + Sync {
    async fn find_taxonomies(
        &self,
        options: &QueryOptions,
        include: &IncludeSpec,
    ) -> StoreResult<Vec<Taxonomy>>;
    async fn find_taxonomy(&self, id: i64, include: &IncludeSpec)
        -> StoreResult<Option<Taxonomy>>;
    async fn create_taxonomy(&self, data: NewTaxonomy) -> StoreResult<Taxonomy>;
    async fn update_taxonomy(&self, id: i64, data: NewTaxonomy) -> StoreResult<Taxonomy>;
    async fn delete_taxonomy(&self, id: i64) -> StoreResult<()>;
    async fn delete_taxonomies(&self) -> StoreResult<()>;
}

#[async_trait::async_trait]
pub trait VarietyStore: Send + Sync {
    async fn find_varieties(
        &self,
        options: &QueryOptions,
        include: &IncludeSpec,
    ) -> StoreResult<Vec<Variety>>;
    async fn find_variety(&self, id: i64, include: &IncludeSpec) -> StoreResult<Option<Variety>>;
    /// Creating a variety links its categories in the same atomic write.
    async fn create_variety(&self, data: NewVariety) -> StoreResult<Variety>;
    async fn update_variety(&self, id: i64, data: VarietyPatch) -> StoreResult<Variety>;
    async fn delete_variety(&self, id: i64) -> StoreResult<()>;
    async fn delete_varieties(&self) -> StoreResult<()>;
}

pub trait Store: CategoryStore + TaxonomyStore + VarietyStore + Send + Sync {}
