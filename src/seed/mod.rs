use anyhow::{anyhow, Result};
use std::collections::HashMap;

use crate::logic::{IncludeSpec, QueryOptions};
use crate::model::{NewCategory, NewTaxonomy, NewVariety};
use crate::store::Store;

const CATEGORIES: &[(&str, &str)] = &[
    ("Herb", "Plants used for flavoring or medicinal purposes."),
    ("Fruit", "Edible fruit-bearing plants."),
    (
        "Vegetable",
        "Plants grown for their edible parts, such as leaves, stems, and roots.",
    ),
    (
        "Flower",
        "Plants cultivated primarily for their decorative blooms.",
    ),
    (
        "Succulent",
        "Plants with thick, fleshy parts adapted to store water.",
    ),
    ("Cactus", "Spiny plants adapted to arid environments."),
    (
        "Shrub",
        "Small to medium-sized woody plants with multiple stems.",
    ),
    (
        "Tree",
        "Large, perennial plants with a single trunk and a canopy of leaves.",
    ),
    ("Fern", "Non-flowering plants that reproduce via spores."),
    (
        "Palm",
        "Tropical trees with a single trunk and large, feather-like leaves.",
    ),
    (
        "Vine",
        "Plants with long, slender stems that climb or sprawl.",
    ),
    (
        "Grass",
        "Herbaceous plants with narrow leaves and hollow stems.",
    ),
    (
        "Bulb",
        "Plants that grow from underground storage organs with fleshy leaves.",
    ),
    ("Aquatic", "Plants adapted to living in or on water."),
    (
        "Creeper",
        "Plants with stems that spread horizontally along the ground.",
    ),
];

struct SampleVariety {
    name: &'static str,
    scientific_name: &'static str,
    description: &'static str,
    origin: &'static str,
    synonyms: &'static [&'static str],
    genus: &'static str,
    species: &'static str,
    taxonomy: (&'static str, &'static str, &'static str, &'static str, &'static str),
    categories: &'static [&'static str],
}

const VARIETIES: &[SampleVariety] = &[
    SampleVariety {
        name: "Basil",
        scientific_name: "Ocimum basilicum",
        description: "A culinary herb with aromatic leaves, widely used in Mediterranean and Asian cuisine.",
        origin: "Central Africa to Southeast Asia",
        synonyms: &["Great basil", "Saint-Joseph's-wort"],
        genus: "Ocimum",
        species: "basilicum",
        taxonomy: ("Plantae", "Tracheophyta", "Magnoliopsida", "Lamiales", "Lamiaceae"),
        categories: &["Herb"],
    },
    SampleVariety {
        name: "Tomato",
        scientific_name: "Solanum lycopersicum",
        description: "A widely cultivated plant bearing edible berries, eaten raw or cooked.",
        origin: "Western South America",
        synonyms: &["Love apple"],
        genus: "Solanum",
        species: "lycopersicum",
        taxonomy: ("Plantae", "Tracheophyta", "Magnoliopsida", "Solanales", "Solanaceae"),
        categories: &["Fruit", "Vegetable"],
    },
    SampleVariety {
        name: "Aloe Vera",
        scientific_name: "Aloe vera",
        description: "A succulent species grown for its thick, gel-filled leaves.",
        origin: "Arabian Peninsula",
        synonyms: &["True aloe", "Barbados aloe"],
        genus: "Aloe",
        species: "vera",
        taxonomy: ("Plantae", "Tracheophyta", "Liliopsida", "Asparagales", "Asphodelaceae"),
        categories: &["Succulent"],
    },
    SampleVariety {
        name: "Rosemary",
        scientific_name: "Salvia rosmarinus",
        description: "An evergreen shrub with fragrant, needle-like leaves used as a seasoning.",
        origin: "Mediterranean region",
        synonyms: &["Rosmarinus officinalis"],
        genus: "Salvia",
        species: "rosmarinus",
        taxonomy: ("Plantae", "Tracheophyta", "Magnoliopsida", "Lamiales", "Lamiaceae"),
        categories: &["Herb", "Shrub"],
    },
];

/// Populates an empty store with the sample data set. Stores that already
/// hold categories are left untouched, so repeated startups do not duplicate
/// rows.
pub async fn load_seed_data<S: Store>(store: &S) -> Result<()> {
    let existing = store
        .find_categories(&QueryOptions::default(), &IncludeSpec::default())
        .await
        .map_err(|err| anyhow!("failed to inspect store before seeding: {err}"))?;
    if !existing.is_empty() {
        log::info!("Store already seeded, skipping");
        return Ok(());
    }

    let mut category_ids = HashMap::new();
    for (name, description) in CATEGORIES {
        let category = store
            .create_category(NewCategory {
                name: (*name).to_string(),
                description: Some((*description).to_string()),
            })
            .await
            .map_err(|err| anyhow!("failed to seed category `{name}`: {err}"))?;
        category_ids.insert(*name, category.id);
    }

    let mut taxonomy_ids = HashMap::new();
    for sample in VARIETIES {
        let taxonomy_id = match taxonomy_ids.get(&sample.taxonomy) {
            Some(id) => *id,
            None => {
                let (kingdom, phylum, class_name, order, family) = sample.taxonomy;
                let taxonomy = store
                    .create_taxonomy(NewTaxonomy {
                        kingdom: kingdom.to_string(),
                        phylum: phylum.to_string(),
                        class_name: class_name.to_string(),
                        order: order.to_string(),
                        family: family.to_string(),
                    })
                    .await
                    .map_err(|err| anyhow!("failed to seed taxonomy `{family}`: {err}"))?;
                taxonomy_ids.insert(sample.taxonomy, taxonomy.id);
                taxonomy.id
            }
        };

        let category_ids = sample
            .categories
            .iter()
            .map(|name| {
                category_ids
                    .get(name)
                    .copied()
                    .ok_or_else(|| anyhow!("sample references unknown category `{name}`"))
            })
            .collect::<Result<Vec<_>>>()?;

        store
            .create_variety(NewVariety {
                name: sample.name.to_string(),
                scientific_name: sample.scientific_name.to_string(),
                description: Some(sample.description.to_string()),
                origin: sample.origin.to_string(),
                synonyms: sample.synonyms.iter().map(|s| s.to_string()).collect(),
                genus: sample.genus.to_string(),
                species: sample.species.to_string(),
                taxonomy_id,
                category_ids,
            })
            .await
            .map_err(|err| anyhow!("failed to seed variety `{}`: {err}", sample.name))?;
    }

    log::info!(
        "Seeded {} categories, {} taxonomies and {} varieties",
        CATEGORIES.len(),
        taxonomy_ids.len(),
        VARIETIES.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::store::traits::{CategoryStore, VarietyStore};

    #[tokio::test]
    async fn seeding_populates_and_is_idempotent() {
        let store = MemoryStore::new();
        load_seed_data(&store).await.unwrap();
        load_seed_data(&store).await.unwrap();

        let categories = store
            .find_categories(&QueryOptions::default(), &IncludeSpec::default())
            .await
            .unwrap();
        assert_eq!(categories.len(), CATEGORIES.len());

        let varieties = store
            .find_varieties(&QueryOptions::default(), &IncludeSpec::default())
            .await
            .unwrap();
        assert_eq!(varieties.len(), VARIETIES.len());
    }
}
