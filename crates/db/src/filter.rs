//! Field predicates evaluated against stored JSON documents.

use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
enum Clause {
    Eq { field: String, value: Value },
    ContainsIgnoreCase { field: String, needle: String },
}

/// Conjunction of field predicates. An empty filter matches every document.
///
/// Field names are the serialized (wire) names of the document, e.g. `userId`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<Clause>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Match the document whose `id` is `id`.
    pub fn by_id(id: Uuid) -> Self {
        Self::new().eq("id", id.to_string())
    }

    /// Exact equality on a top-level field.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.push(Clause::Eq {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    /// Case-insensitive substring match on a string field.
    /// Documents where the field is missing or not a string never match.
    pub fn contains_ignore_case(mut self, field: impl Into<String>, needle: &str) -> Self {
        self.clauses.push(Clause::ContainsIgnoreCase {
            field: field.into(),
            needle: needle.to_lowercase(),
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// The id pinned by an `id` equality, if any.
    pub(crate) fn id(&self) -> Option<Uuid> {
        self.clauses.iter().find_map(|clause| match clause {
            Clause::Eq { field, value } if field == "id" => {
                value.as_str().and_then(|id| Uuid::parse_str(id).ok())
            }
            _ => None,
        })
    }

    /// String equalities other than `id`, which SQLite can compare directly
    /// against `json_extract`.
    pub(crate) fn text_equalities(&self) -> impl Iterator<Item = (&str, &str)> {
        self.clauses.iter().filter_map(|clause| match clause {
            Clause::Eq { field, value } if field != "id" => {
                value.as_str().map(|text| (field.as_str(), text))
            }
            _ => None,
        })
    }

    pub fn matches(&self, document: &Value) -> bool {
        self.clauses.iter().all(|clause| match clause {
            Clause::Eq { field, value } => document.get(field) == Some(value),
            Clause::ContainsIgnoreCase { field, needle } => document
                .get(field)
                .and_then(Value::as_str)
                .is_some_and(|haystack| haystack.to_lowercase().contains(needle.as_str())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn book() -> Value {
        json!({
            "id": "b1",
            "title": "The Left Hand of Darkness",
            "author": "Ursula K. Le Guin",
            "favorite": true,
            "category": null,
        })
    }

    #[test]
    fn empty_filter_matches_anything() {
        assert!(Filter::new().is_empty());
        assert!(Filter::new().matches(&book()));
    }

    #[test]
    fn eq_compares_json_values() {
        assert!(Filter::new().eq("favorite", true).matches(&book()));
        assert!(!Filter::new().eq("favorite", false).matches(&book()));
        assert!(!Filter::new().eq("pages", 10).matches(&book()));
    }

    #[test]
    fn eq_null_is_not_a_missing_field() {
        assert!(Filter::new().eq("category", Value::Null).matches(&book()));
        assert!(!Filter::new().eq("status", Value::Null).matches(&book()));
    }

    #[test]
    fn contains_ignores_case() {
        let filter = Filter::new().contains_ignore_case("author", "le guin");
        assert!(filter.matches(&book()));
        assert!(!Filter::new()
            .contains_ignore_case("author", "tolkien")
            .matches(&book()));
    }

    #[test]
    fn contains_treats_needle_literally() {
        assert!(!Filter::new()
            .contains_ignore_case("title", ".*")
            .matches(&book()));
    }

    #[test]
    fn contains_skips_non_string_fields() {
        assert!(!Filter::new()
            .contains_ignore_case("favorite", "true")
            .matches(&book()));
        assert!(!Filter::new()
            .contains_ignore_case("category", "")
            .matches(&book()));
    }

    #[test]
    fn clauses_are_conjunctive() {
        let filter = Filter::new()
            .eq("favorite", true)
            .contains_ignore_case("title", "darkness");
        assert!(filter.matches(&book()));

        let filter = filter.eq("id", "b2");
        assert!(!filter.matches(&book()));
    }

    #[test]
    fn id_and_text_equalities_are_exposed() {
        let id = Uuid::now_v7();
        let filter = Filter::by_id(id)
            .eq("userId", "u1")
            .eq("favorite", true)
            .contains_ignore_case("title", "dark");

        assert_eq!(filter.id(), Some(id));
        assert_eq!(filter.text_equalities().collect::<Vec<_>>(), vec![("userId", "u1")]);
        assert_eq!(Filter::new().eq("id", "not-a-uuid").id(), None);
    }

    #[test]
    fn by_id_matches_the_string_form() {
        let id = Uuid::now_v7();
        let doc = json!({ "id": id.to_string() });
        assert!(Filter::by_id(id).matches(&doc));
        assert!(!Filter::by_id(Uuid::now_v7()).matches(&doc));
    }
}
