//! Boolean filter tree evaluated against row records.
//!
//! Leaves compare one path's value with a literal; a missing value or a
//! type-mismatched literal fails the comparison rather than erroring.

use super::row_record::RowRecord;
use crate::{Path, TypedValue};
use std::cmp::Ordering;

#[derive(Clone, Debug)]
pub enum Filter {
    Eq(Path, TypedValue),
    NotEq(Path, TypedValue),
    Lt(Path, TypedValue),
    LtEq(Path, TypedValue),
    Gt(Path, TypedValue),
    GtEq(Path, TypedValue),
    And(Box<Filter>, Box<Filter>),
    Or(Box<Filter>, Box<Filter>),
    Not(Box<Filter>),
}

impl Filter {
    pub fn and(self, other: Filter) -> Filter {
        Filter::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Filter) -> Filter {
        Filter::Or(Box::new(self), Box::new(other))
    }

    pub fn negate(self) -> Filter {
        Filter::Not(Box::new(self))
    }

    pub fn satisfy(&self, record: &RowRecord) -> bool {
        match self {
            Filter::Eq(path, literal) => Self::compare(record, path, literal)
                .is_some_and(|ordering| ordering == Ordering::Equal),
            Filter::NotEq(path, literal) => Self::compare(record, path, literal)
                .is_some_and(|ordering| ordering != Ordering::Equal),
            Filter::Lt(path, literal) => Self::compare(record, path, literal)
                .is_some_and(|ordering| ordering == Ordering::Less),
            Filter::LtEq(path, literal) => Self::compare(record, path, literal)
                .is_some_and(|ordering| ordering != Ordering::Greater),
            Filter::Gt(path, literal) => Self::compare(record, path, literal)
                .is_some_and(|ordering| ordering == Ordering::Greater),
            Filter::GtEq(path, literal) => Self::compare(record, path, literal)
                .is_some_and(|ordering| ordering != Ordering::Less),
            Filter::And(lhs, rhs) => lhs.satisfy(record) && rhs.satisfy(record),
            Filter::Or(lhs, rhs) => lhs.satisfy(record) || rhs.satisfy(record),
            Filter::Not(inner) => !inner.satisfy(record),
        }
    }

    fn compare(record: &RowRecord, path: &Path, literal: &TypedValue) -> Option<Ordering> {
        let value = record.value_of(path)?;
        match (value, literal) {
            (TypedValue::Boolean(a), TypedValue::Boolean(b)) => a.partial_cmp(b),
            (TypedValue::Int32(a), TypedValue::Int32(b)) => a.partial_cmp(b),
            (TypedValue::Int64(a), TypedValue::Int64(b)) => a.partial_cmp(b),
            (TypedValue::Float(a), TypedValue::Float(b)) => a.partial_cmp(b),
            (TypedValue::Double(a), TypedValue::Double(b)) => a.partial_cmp(b),
            (TypedValue::Text(a), TypedValue::Text(b)) => a.partial_cmp(b),
            _ => None,
        }
    }

    /// Every path referenced by a leaf, deduplicated, in first-use order.
    pub fn condition_paths(&self) -> Vec<Path> {
        let mut paths = Vec::new();
        self.collect_paths(&mut paths);
        paths
    }

    fn collect_paths(&self, out: &mut Vec<Path>) {
        match self {
            Filter::Eq(path, _)
            | Filter::NotEq(path, _)
            | Filter::Lt(path, _)
            | Filter::LtEq(path, _)
            | Filter::Gt(path, _)
            | Filter::GtEq(path, _) => {
                if !out.contains(path) {
                    out.push(path.clone());
                }
            }
            Filter::And(lhs, rhs) | Filter::Or(lhs, rhs) => {
                lhs.collect_paths(out);
                rhs.collect_paths(out);
            }
            Filter::Not(inner) => inner.collect_paths(out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn record(values: Vec<Option<TypedValue>>) -> RowRecord {
        RowRecord {
            timestamp: 10,
            paths: Rc::new(vec![Path::new("d1", "s1"), Path::new("d1", "s2")]),
            values,
        }
    }

    #[test]
    fn test_comparisons() {
        let row = record(vec![Some(TypedValue::Int32(30)), None]);
        let s1 = Path::new("d1", "s1");

        assert!(Filter::Gt(s1.clone(), TypedValue::Int32(20)).satisfy(&row));
        assert!(!Filter::Gt(s1.clone(), TypedValue::Int32(30)).satisfy(&row));
        assert!(Filter::GtEq(s1.clone(), TypedValue::Int32(30)).satisfy(&row));
        assert!(Filter::Lt(s1.clone(), TypedValue::Int32(31)).satisfy(&row));
        assert!(Filter::Eq(s1.clone(), TypedValue::Int32(30)).satisfy(&row));
        assert!(Filter::NotEq(s1, TypedValue::Int32(29)).satisfy(&row));
    }

    #[test]
    fn test_missing_value_fails_every_leaf() {
        let row = record(vec![Some(TypedValue::Int32(30)), None]);
        let s2 = Path::new("d1", "s2");

        assert!(!Filter::Eq(s2.clone(), TypedValue::Int32(30)).satisfy(&row));
        assert!(!Filter::NotEq(s2.clone(), TypedValue::Int32(30)).satisfy(&row));
        assert!(!Filter::Lt(s2, TypedValue::Int32(30)).satisfy(&row));
    }

    #[test]
    fn test_type_mismatch_fails_rather_than_panics() {
        let row = record(vec![Some(TypedValue::Int32(30)), None]);
        let s1 = Path::new("d1", "s1");
        assert!(!Filter::Gt(s1, TypedValue::Double(1.0)).satisfy(&row));
    }

    #[test]
    fn test_connectives() {
        let row = record(vec![
            Some(TypedValue::Int32(30)),
            Some(TypedValue::Text("on".to_string())),
        ]);
        let s1 = Path::new("d1", "s1");
        let s2 = Path::new("d1", "s2");

        let filter = Filter::Gt(s1.clone(), TypedValue::Int32(20))
            .and(Filter::Eq(s2.clone(), "on".into()));
        assert!(filter.satisfy(&row));

        let filter = Filter::Lt(s1.clone(), TypedValue::Int32(20))
            .or(Filter::Eq(s2.clone(), "on".into()));
        assert!(filter.satisfy(&row));

        let filter = Filter::Eq(s2.clone(), "off".into()).negate();
        assert!(filter.satisfy(&row));

        assert_eq!(
            Filter::Gt(s1.clone(), TypedValue::Int32(0))
                .and(Filter::Eq(s2, "on".into()).or(Filter::Lt(s1.clone(), 5.into())))
                .condition_paths()
                .len(),
            2
        );
    }
}
