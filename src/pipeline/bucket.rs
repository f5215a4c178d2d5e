// Column grouping for the kanban boards

use std::collections::HashMap;

use crate::models::{Deal, Prospect, Stage};

/// A record that can be placed in a board column
pub trait Keyed {
    fn record_id(&self) -> &str;
    /// Column key, or None when the record has no usable key
    fn bucket_key(&self) -> Option<&str>;
    /// Value summed into the column footer
    fn bucket_value(&self) -> f64;
}

impl Keyed for Deal {
    fn record_id(&self) -> &str {
        &self.id
    }

    fn bucket_key(&self) -> Option<&str> {
        self.status.as_deref()
    }

    fn bucket_value(&self) -> f64 {
        self.value
    }
}

impl Keyed for Prospect {
    fn record_id(&self) -> &str {
        &self.id
    }

    fn bucket_key(&self) -> Option<&str> {
        if self.stage_id.is_empty() {
            None
        } else {
            Some(&self.stage_id)
        }
    }

    fn bucket_value(&self) -> f64 {
        self.estimated_budget().unwrap_or(0.0)
    }
}

/// One board column
#[derive(Debug)]
pub struct Bucket<'a, T> {
    pub key: String,
    pub items: Vec<&'a T>,
    pub total: f64,
}

impl<'a, T> Bucket<'a, T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Columns in key order, plus the number of records that matched no column
#[derive(Debug)]
pub struct Buckets<'a, T> {
    buckets: Vec<Bucket<'a, T>>,
    dropped: usize,
}

impl<'a, T> Buckets<'a, T> {
    pub fn iter(&self) -> std::slice::Iter<'_, Bucket<'a, T>> {
        self.buckets.iter()
    }

    pub fn get(&self, key: &str) -> Option<&Bucket<'a, T>> {
        self.buckets.iter().find(|b| b.key == key)
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Records left out because their key matched no column
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Sum of all column totals
    pub fn grand_total(&self) -> f64 {
        self.buckets.iter().map(|b| b.total).sum()
    }
}

impl<'a, 'b, T> IntoIterator for &'b Buckets<'a, T> {
    type Item = &'b Bucket<'a, T>;
    type IntoIter = std::slice::Iter<'b, Bucket<'a, T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.buckets.iter()
    }
}

/// Group records into one column per key, in a single pass.
///
/// Input order is preserved inside each column. Records with no key, or
/// a key not in `keys`, are left out of every column. When `keys`
/// repeats a key, the first occurrence receives the records.
pub fn group_by_key<'a, T, K>(records: &'a [T], keys: &[K]) -> Buckets<'a, T>
where
    T: Keyed,
    K: AsRef<str>,
{
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(keys.len());
    let mut buckets = Vec::with_capacity(keys.len());
    for (i, key) in keys.iter().enumerate() {
        index.entry(key.as_ref()).or_insert(i);
        buckets.push(Bucket {
            key: key.as_ref().to_string(),
            items: Vec::new(),
            total: 0.0,
        });
    }

    let mut dropped = 0;
    for record in records {
        match record.bucket_key().and_then(|k| index.get(k)) {
            Some(&i) => {
                let bucket = &mut buckets[i];
                bucket.items.push(record);
                bucket.total += record.bucket_value();
            }
            None => dropped += 1,
        }
    }

    Buckets { buckets, dropped }
}

/// Stages in column order (stable on equal `order`)
pub fn order_stages(stages: &[Stage]) -> Vec<&Stage> {
    let mut ordered: Vec<&Stage> = stages.iter().collect();
    ordered.sort_by_key(|s| s.order);
    ordered
}

/// Current column key of the record with the given id
pub fn current_key_of<'a, T: Keyed>(records: &'a [T], id: &str) -> Option<&'a str> {
    records
        .iter()
        .find(|r| r.record_id() == id)
        .and_then(|r| r.bucket_key())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DealStatus, Qualification};
    use chrono::NaiveDate;

    fn deal(id: &str, status: Option<&str>, value: f64) -> Deal {
        Deal {
            id: id.to_string(),
            title: format!("Deal {}", id),
            value,
            status: status.map(|s| s.to_string()),
            client: "Acme".to_string(),
            sent_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            next_follow_up: None,
            follow_ups: Vec::new(),
        }
    }

    fn prospect(id: &str, stage: &str) -> Prospect {
        Prospect {
            id: id.to_string(),
            name: id.to_uppercase(),
            company: "Acme".to_string(),
            email: None,
            phone: None,
            stage_id: stage.to_string(),
            created_ts: 0,
            qualification: None,
        }
    }

    fn status_keys() -> Vec<&'static str> {
        DealStatus::ALL.iter().map(|s| s.as_str()).collect()
    }

    #[test]
    fn test_each_record_lands_in_its_own_bucket() {
        let deals = vec![
            deal("a", Some("sent"), 10.0),
            deal("b", Some("lost"), 20.0),
            deal("c", Some("sent"), 30.0),
            deal("d", Some("order_placed"), 40.0),
        ];
        let buckets = group_by_key(&deals, &status_keys());

        let sent: Vec<&str> = buckets.get("sent").unwrap().items.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(sent, vec!["a", "c"]);
        assert_eq!(buckets.get("lost").unwrap().len(), 1);
        assert_eq!(buckets.get("order_placed").unwrap().len(), 1);
        assert!(buckets.get("following_up").unwrap().is_empty());
        assert_eq!(buckets.dropped(), 0);
    }

    #[test]
    fn test_unknown_and_missing_keys_are_dropped() {
        let deals = vec![
            deal("a", Some("sent"), 10.0),
            deal("b", Some("archived"), 20.0),
            deal("c", None, 30.0),
        ];
        let buckets = group_by_key(&deals, &status_keys());

        let placed: usize = buckets.iter().map(|b| b.len()).sum();
        assert_eq!(placed, 1);
        assert_eq!(buckets.dropped(), 2);
        assert_eq!(buckets.grand_total(), 10.0);
    }

    #[test]
    fn test_union_of_buckets_preserves_relative_order() {
        let keys = vec!["x", "y"];
        let prospects = vec![
            prospect("p1", "y"),
            prospect("p2", "x"),
            prospect("p3", "z"),
            prospect("p4", "y"),
            prospect("p5", "x"),
        ];
        let buckets = group_by_key(&prospects, &keys);

        // Every kept record appears exactly once
        let mut seen: Vec<&str> = buckets
            .iter()
            .flat_map(|b| b.items.iter().map(|p| p.id.as_str()))
            .collect();
        seen.sort();
        assert_eq!(seen, vec!["p1", "p2", "p4", "p5"]);

        // Within a bucket the input order is kept
        let y: Vec<&str> = buckets.get("y").unwrap().items.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(y, vec!["p1", "p4"]);
        let x: Vec<&str> = buckets.get("x").unwrap().items.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(x, vec!["p2", "p5"]);
    }

    #[test]
    fn test_bucket_totals() {
        let deals = vec![
            deal("a", Some("sent"), 100.25),
            deal("b", Some("sent"), 50.5),
            deal("c", Some("lost"), 7.0),
        ];
        let buckets = group_by_key(&deals, &status_keys());

        assert_eq!(buckets.get("sent").unwrap().total, 150.75);
        assert_eq!(buckets.get("lost").unwrap().total, 7.0);
        assert_eq!(buckets.get("following_up").unwrap().total, 0.0);
        assert_eq!(buckets.get("order_placed").unwrap().total, 0.0);
    }

    #[test]
    fn test_prospect_value_uses_estimated_budget() {
        let mut with_budget = prospect("p1", "new");
        with_budget.qualification = Some(Qualification {
            estimated_budget: Some(900.0),
            ..Default::default()
        });
        let prospects = vec![with_budget, prospect("p2", "new")];
        let buckets = group_by_key(&prospects, &["new"]);
        assert_eq!(buckets.get("new").unwrap().total, 900.0);
    }

    #[test]
    fn test_empty_stage_id_is_unassigned() {
        let prospects = vec![prospect("p1", "")];
        let buckets = group_by_key(&prospects, &[""]);
        assert!(buckets.get("").unwrap().is_empty());
        assert_eq!(buckets.dropped(), 1);
    }

    #[test]
    fn test_duplicate_keys_first_wins() {
        let prospects = vec![prospect("p1", "a")];
        let buckets = group_by_key(&prospects, &["a", "a"]);
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets.iter().next().unwrap().len(), 1);
        assert_eq!(buckets.iter().nth(1).unwrap().len(), 0);
    }

    #[test]
    fn test_order_stages_is_stable() {
        let stages = vec![
            Stage::new("c", "C", 2),
            Stage::new("a1", "A1", 0),
            Stage::new("b", "B", 1),
            Stage::new("a2", "A2", 0),
        ];
        let ids: Vec<&str> = order_stages(&stages).iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "a2", "b", "c"]);
    }

    #[test]
    fn test_current_key_of() {
        let prospects = vec![prospect("p1", "A"), prospect("p2", "B")];
        assert_eq!(current_key_of(&prospects, "p2"), Some("B"));
        assert_eq!(current_key_of(&prospects, "p9"), None);
    }
}
