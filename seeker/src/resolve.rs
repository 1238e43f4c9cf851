//! Relational path resolution.
//!
//! A path is a `__`-separated list of attribute names, e.g. `author__name` or
//! `tags__name`. Resolution walks the attributes of a record one segment at a
//! time and never fails: anything that cannot be followed becomes null.
//!
//! Crossing a to-many relation fans out. The remaining segments are resolved
//! against every related record and the results are returned as a list, so a
//! path through a to-many relation is always list-valued from that point on.
//!
//! A display-valued attribute ends resolution immediately and any remaining
//! segments are ignored.

use seeker_shared::Value;

use crate::source::{Attribute, Record};

/// Separator between the segments of a path.
pub const PATH_SEPARATOR: &str = "__";

/// Split a path into its segments. The empty path has none.
pub fn segments(path: &str) -> Vec<&str> {
    if path.is_empty() {
        Vec::new()
    } else {
        path.split(PATH_SEPARATOR).collect()
    }
}

/// Resolve `path` against `record`.
///
/// The empty path resolves to the record's display string, as does any path
/// that ends on a related record.
pub fn resolve(record: &dyn Record, path: &str) -> Value {
    resolve_segments(record, &segments(path))
}

/// Resolve already split segments against `record`.
pub fn resolve_segments(record: &dyn Record, segments: &[&str]) -> Value {
    let Some((segment, rest)) = segments.split_first() else {
        return Value::Text(record.display());
    };

    match record.attribute(segment) {
        Attribute::Display(display) => Value::Text(display),
        Attribute::ToMany(related) => Value::List(
            related
                .iter()
                .map(|item| resolve_segments(item.as_ref(), rest))
                .collect(),
        ),
        Attribute::ToOne(Some(related)) => resolve_segments(related.as_ref(), rest),
        Attribute::ToOne(None) | Attribute::Missing => Value::Null,
        // Scalars have no attributes of their own.
        Attribute::Scalar(value) if rest.is_empty() => value,
        Attribute::Scalar(_) => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::memory::MemoryRecord;
    use chrono::NaiveDate;

    fn tag(pk: i64, name: &str) -> crate::source::RecordRef {
        MemoryRecord::new("Tag", pk)
            .with_value("name", name)
            .with_label(format!("#{}", name))
            .into_ref()
    }

    fn article() -> MemoryRecord {
        let country = MemoryRecord::keyed("Country", "code", "NL")
            .with_value("name", "Netherlands")
            .into_ref();
        let author = MemoryRecord::new("Author", 7)
            .with_value("name", "Ada")
            .with_one("country", Some(country))
            .with_many("tags", vec![tag(3, "x")])
            .with_label("Ada L.")
            .into_ref();

        MemoryRecord::new("Article", 5)
            .with_value("title", "Hello")
            .with_value("published", NaiveDate::from_ymd_opt(2024, 1, 31).unwrap())
            .with_value("views", 42)
            .with_value("summary", Value::Null)
            .with_display("status", "Published")
            .with_one("author", Some(author))
            .with_one("editor", None)
            .with_many("tags", vec![tag(1, "a"), tag(2, "b")])
            .with_many("related", vec![])
            .with_label("Hello (2024)")
    }

    #[test]
    fn test_scalar_keeps_native_type() {
        let record = article();

        assert_eq!(resolve(&record, "title"), Value::from("Hello"));
        assert_eq!(resolve(&record, "views"), Value::Integer(42));
        assert_eq!(
            resolve(&record, "published"),
            Value::Date(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap())
        );
        assert_eq!(resolve(&record, "summary"), Value::Null);
    }

    #[test]
    fn test_empty_path_is_display() {
        assert_eq!(resolve(&article(), ""), Value::from("Hello (2024)"));
    }

    #[test]
    fn test_to_one_traversal() {
        let record = article();

        assert_eq!(resolve(&record, "author__name"), Value::from("Ada"));
        assert_eq!(
            resolve(&record, "author__country__name"),
            Value::from("Netherlands")
        );
        // Ending on a related record yields its display string.
        assert_eq!(resolve(&record, "author"), Value::from("Ada L."));
    }

    #[test]
    fn test_fan_out_shape_and_order() {
        let record = article();

        assert_eq!(
            resolve(&record, "tags__name"),
            Value::from(vec!["a", "b"])
        );
        assert_eq!(
            resolve(&record, "tags"),
            Value::from(vec!["#a", "#b"])
        );
        assert_eq!(resolve(&record, "related__name"), Value::List(vec![]));
    }

    #[test]
    fn test_fan_out_below_to_one() {
        assert_eq!(
            resolve(&article(), "author__tags__name"),
            Value::from(vec!["x"])
        );
    }

    #[test]
    fn test_display_terminates_path() {
        let record = article();

        assert_eq!(resolve(&record, "status"), Value::from("Published"));
        assert_eq!(
            resolve(&record, "status__anything__else"),
            Value::from("Published")
        );
    }

    #[test]
    fn test_missing_paths_are_null() {
        let record = article();

        for path in [
            "nope",
            "nope__deeper",
            "editor",
            "editor__name",
            "author__nope",
            "title__length",
            "tags__nope",
        ] {
            let value = resolve(&record, path);
            match path {
                "tags__nope" => assert_eq!(value, Value::List(vec![Value::Null, Value::Null])),
                _ => assert_eq!(value, Value::Null, "path {}", path),
            }
        }
    }

    #[test]
    fn test_segments() {
        assert!(segments("").is_empty());
        assert_eq!(segments("a__b__c"), vec!["a", "b", "c"]);
        assert_eq!(segments("with_underscore"), vec!["with_underscore"]);
    }
}
