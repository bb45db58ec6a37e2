use crate::logic::query_string::{QueryMap, QueryValue};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

/// "Field value is one of these candidates, case-insensitively."
/// Candidates are stored lowercased; original casing is not kept.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldPredicate {
    pub field: String,
    pub one_of: Vec<String>,
}

impl FieldPredicate {
    pub fn matches(&self, value: &str) -> bool {
        let value = value.to_lowercase();
        self.one_of.iter().any(|candidate| candidate == &value)
    }
}

/// Structured predicate/ordering form consumed by the persistence layer.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct QueryOptions {
    /// `None` means "match all": no where-clause is emitted.
    pub predicate: Option<Vec<FieldPredicate>>,
    /// Empty means no ordering; the store's default order applies and callers
    /// must not assume any particular one.
    pub ordering: Vec<SortKey>,
}

/// Converts parsed `filter` and `sort` mappings into [`QueryOptions`].
///
/// Filter values are comma-split into candidate sets, trimmed and lowercased.
/// Keys with empty values are skipped entirely rather than matching nothing,
/// and nested values are skipped as well. Sort direction is descending only
/// for the exact literal `"desc"`; emission order follows the mapping's
/// insertion order, which fixes multi-key precedence.
pub fn build_query_options(filters: &QueryMap, sort: &QueryMap) -> QueryOptions {
    let mut predicates = Vec::new();
    for (field, value) in filters {
        let Some(value) = value.as_scalar() else {
            continue;
        };
        if value.is_empty() {
            continue;
        }
        let one_of: Vec<String> = value
            .split(',')
            .map(|candidate| candidate.trim().to_lowercase())
            .collect();
        predicates.push(FieldPredicate {
            field: field.clone(),
            one_of,
        });
    }

    let ordering = sort
        .iter()
        .map(|(field, value)| SortKey {
            field: field.clone(),
            direction: match value.as_scalar() {
                Some("desc") => SortDirection::Desc,
                _ => SortDirection::Asc,
            },
        })
        .collect();

    QueryOptions {
        predicate: if predicates.is_empty() {
            None
        } else {
            Some(predicates)
        },
        ordering,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::query_string::parse_query;

    #[test]
    fn no_filters_means_match_all() {
        let options = build_query_options(&QueryMap::new(), &QueryMap::new());
        assert_eq!(options.predicate, None);
        assert!(options.ordering.is_empty());
    }

    #[test]
    fn filter_values_are_split_trimmed_and_lowercased() {
        let filters = parse_query("name=Herb, Fruit", false);
        let options = build_query_options(&filters, &QueryMap::new());
        let predicates = options.predicate.unwrap();
        assert_eq!(predicates.len(), 1);
        assert_eq!(predicates[0].field, "name");
        assert_eq!(predicates[0].one_of, vec!["herb", "fruit"]);
    }

    #[test]
    fn empty_filter_values_are_skipped() {
        let filters = parse_query("name=&origin=Asia", false);
        let options = build_query_options(&filters, &QueryMap::new());
        let predicates = options.predicate.unwrap();
        assert_eq!(predicates.len(), 1);
        assert_eq!(predicates[0].field, "origin");
    }

    #[test]
    fn nested_filter_values_are_skipped() {
        let filters = parse_query("name[contains]=herb", false);
        let options = build_query_options(&filters, &QueryMap::new());
        assert_eq!(options.predicate, None);
    }

    #[test]
    fn predicate_matches_case_insensitively() {
        let filters = parse_query("name=Herb,Fruit", false);
        let options = build_query_options(&filters, &QueryMap::new());
        let predicate = &options.predicate.unwrap()[0];
        assert!(predicate.matches("HERB"));
        assert!(predicate.matches("fruit"));
        assert!(!predicate.matches("tree"));
    }

    #[test]
    fn sort_preserves_insertion_order() {
        let sort = parse_query("name=desc&id=asc", false);
        let options = build_query_options(&QueryMap::new(), &sort);
        assert_eq!(options.ordering.len(), 2);
        assert_eq!(options.ordering[0].field, "name");
        assert_eq!(options.ordering[0].direction, SortDirection::Desc);
        assert_eq!(options.ordering[1].field, "id");
        assert_eq!(options.ordering[1].direction, SortDirection::Asc);
    }

    #[test]
    fn anything_but_the_desc_literal_sorts_ascending() {
        let sort = parse_query("name=DESC&id=descending&kingdom[x]=desc", false);
        let options = build_query_options(&QueryMap::new(), &sort);
        assert!(options
            .ordering
            .iter()
            .all(|key| key.direction == SortDirection::Asc));
    }
}
