//! Record reconciliation between two keyed collections.
//!
//! Keys are compared with exact string equality. Nothing here touches the
//! filesystem or the database; callers hand in already-loaded slices and get
//! back borrowed partitions or in-place updates plus counts.

use std::collections::{HashMap, HashSet};

/// A record that carries a join key.
pub trait Keyed {
    fn key(&self) -> &str;
}

/// Result of joining a left and a right collection on their keys.
///
/// Each side keeps its input order.
#[derive(Debug)]
pub struct Partition<'a, L, R> {
    pub matched: Vec<(&'a L, &'a R)>,
    pub left_only: Vec<&'a L>,
    pub right_only: Vec<&'a R>,
}

/// Partition two collections on their `Keyed` keys.
pub fn partition<'a, L: Keyed, R: Keyed>(left: &'a [L], right: &'a [R]) -> Partition<'a, L, R> {
    partition_by(left, right, |l: &'a L| l.key(), |r: &'a R| r.key())
}

/// Partition two collections using explicit key extractors.
///
/// When a key repeats on the right, its first occurrence is the one paired.
pub fn partition_by<'a, L, R, KL, KR>(
    left: &'a [L],
    right: &'a [R],
    left_key: KL,
    right_key: KR,
) -> Partition<'a, L, R>
where
    KL: Fn(&'a L) -> &'a str,
    KR: Fn(&'a R) -> &'a str,
{
    let mut right_index: HashMap<&'a str, &'a R> = HashMap::with_capacity(right.len());
    for record in right {
        right_index.entry(right_key(record)).or_insert(record);
    }

    let mut matched = Vec::new();
    let mut left_only = Vec::new();
    let mut matched_keys: HashSet<&'a str> = HashSet::new();

    for record in left {
        let key = left_key(record);
        match right_index.get(key) {
            Some(other) => {
                matched.push((record, *other));
                matched_keys.insert(key);
            }
            None => left_only.push(record),
        }
    }

    let right_only = right
        .iter()
        .filter(|record| !matched_keys.contains(right_key(*record)))
        .collect();

    Partition {
        matched,
        left_only,
        right_only,
    }
}

/// Derives one target field of a left record from its matched right record.
///
/// `derive` returns `Ok(None)` when the source has no value and `Err` when
/// the source value cannot be interpreted. Neither overwrites the target.
pub struct FieldMapping<'f, L, R, E> {
    pub field: &'static str,
    pub target: fn(&mut L) -> &mut String,
    pub derive: &'f dyn Fn(&R) -> Result<Option<String>, E>,
}

/// A record-level failure that was isolated and counted.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordFailure<E> {
    pub key: String,
    pub field: &'static str,
    pub error: E,
}

/// Counts produced by [`apply_updates`].
///
/// `updated`, `already_correct` and `skipped` count field updates, so with a
/// single mapping they are per matched record.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateReport<E> {
    pub total: usize,
    pub updated: usize,
    pub already_correct: usize,
    pub skipped: usize,
    /// Left records with no matching source record.
    pub missing: usize,
    /// Source records that matched nothing on the left.
    pub unused_source: usize,
    pub failures: Vec<RecordFailure<E>>,
}

impl<E> UpdateReport<E> {
    /// Share of left records that ended up with a correct value, in percent.
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.updated + self.already_correct) as f64 / self.total as f64 * 100.0
    }
}

/// Join `left` against `source` and apply every mapping to each matched pair.
///
/// A target is only written when the derived value differs from the current
/// one. Never fails as a whole; per-record derivation errors are collected in
/// the report.
pub fn apply_updates<L, R, E>(
    left: &mut [L],
    source: &[R],
    mappings: &[FieldMapping<'_, L, R, E>],
) -> UpdateReport<E>
where
    L: Keyed,
    R: Keyed,
{
    let mut index: HashMap<&str, &R> = HashMap::with_capacity(source.len());
    for record in source {
        index.entry(record.key()).or_insert(record);
    }

    let mut report = UpdateReport {
        total: left.len(),
        updated: 0,
        already_correct: 0,
        skipped: 0,
        missing: 0,
        unused_source: 0,
        failures: Vec::new(),
    };
    let mut used: HashSet<&str> = HashSet::new();

    for record in left.iter_mut() {
        let Some(src) = index.get(record.key()).copied() else {
            report.missing += 1;
            continue;
        };
        used.insert(src.key());

        for mapping in mappings {
            match (mapping.derive)(src) {
                Ok(Some(value)) => {
                    let slot = (mapping.target)(&mut *record);
                    if *slot == value {
                        report.already_correct += 1;
                    } else {
                        *slot = value;
                        report.updated += 1;
                    }
                }
                Ok(None) => report.skipped += 1,
                Err(error) => {
                    report.skipped += 1;
                    report.failures.push(RecordFailure {
                        key: src.key().to_string(),
                        field: mapping.field,
                        error,
                    });
                }
            }
        }
    }

    report.unused_source = index.keys().filter(|key| !used.contains(*key)).count();
    report
}
