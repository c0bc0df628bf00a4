//! Canonical ordering: ascending by lower-cased title.

use serde::Serialize;

use songbook_core::{Record, Title};

/// First position where the sequence departs from canonical order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderMismatch {
    pub index: usize,
    /// Title currently at `index`.
    pub actual: Title,
    /// Title that belongs at `index` once sorted.
    pub expected: Title,
}

/// Result of checking a sequence against canonical order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortCheck {
    pub sorted: bool,
    pub first_mismatch: Option<OrderMismatch>,
}

/// Compare the lower-cased title sequence against its sorted counterpart.
pub fn check_order(records: &[Record]) -> SortCheck {
    let keys: Vec<String> = records.iter().map(Record::sort_key).collect();
    let mut canonical: Vec<usize> = (0..records.len()).collect();
    canonical.sort_by(|&a, &b| keys[a].cmp(&keys[b]));

    let first_mismatch = canonical
        .iter()
        .enumerate()
        .find(|(index, source)| keys[*index] != keys[**source])
        .map(|(index, &source)| OrderMismatch {
            index,
            actual: records[index].title_or_empty(),
            expected: records[source].title_or_empty(),
        });

    SortCheck {
        sorted: first_mismatch.is_none(),
        first_mismatch,
    }
}

/// Stable sort by lower-cased title; ties keep their relative order.
pub fn sort_records(mut records: Vec<Record>) -> Vec<Record> {
    records.sort_by_cached_key(Record::sort_key);
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(titles: &[&str]) -> Vec<Record> {
        titles.iter().copied().map(Record::with_title).collect()
    }

    fn titles(records: &[Record]) -> Vec<String> {
        records.iter().map(|r| r.title_or_empty().0).collect()
    }

    #[test]
    fn empty_and_single_are_sorted() {
        assert!(check_order(&[]).sorted);
        assert!(check_order(&records(&["Solar"])).sorted);
    }

    #[test]
    fn case_is_ignored_for_order() {
        let check = check_order(&records(&["all blues", "Autumn Leaves", "blue bossa"]));
        assert!(check.sorted);
        assert!(check.first_mismatch.is_none());
    }

    #[test]
    fn reports_first_mismatch() {
        let check = check_order(&records(&["Alpha", "Delta", "Bravo", "Charlie"]));
        assert!(!check.sorted);
        assert_eq!(
            check.first_mismatch,
            Some(OrderMismatch {
                index: 1,
                actual: Title::from("Delta"),
                expected: Title::from("Bravo"),
            })
        );
    }

    #[test]
    fn sort_orders_case_insensitively() {
        let sorted = sort_records(records(&["Bravo", "alpha", "Charlie", "ALPHA 2"]));
        assert_eq!(titles(&sorted), vec!["alpha", "ALPHA 2", "Bravo", "Charlie"]);
        assert!(check_order(&sorted).sorted);
    }

    #[test]
    fn sort_is_stable_on_equal_keys() {
        let input = vec![
            Record::with_title("Solar").with_field("Take", 1),
            Record::with_title("Airegin"),
            Record::with_title("SOLAR").with_field("Take", 2),
        ];
        let sorted = sort_records(input);
        assert_eq!(titles(&sorted), vec!["Airegin", "Solar", "SOLAR"]);
        assert!(check_order(&sorted).sorted);
    }

    #[test]
    fn equal_keys_in_any_order_count_as_sorted() {
        assert!(check_order(&records(&["SOLAR", "Solar"])).sorted);
    }
}
