//! Rework and delay probability tables.
//!
//! Both tables are sampled the same way: walk the entries of one key in
//! ascending probability order, accumulating probability, and pick the first
//! entry whose running sum exceeds a single uniform draw in `[0, 1)`.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Rows whose progress differs by less than this are the same row.
pub const PROGRESS_TOLERANCE: f64 = 1e-5;

const SUM_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReworkEntry {
    pub occurrence: u32,
    pub progress: f64,
    pub probability: f64,
    /// Task sent back to NONE when this entry is drawn.
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelayEntry {
    pub occurrence: u32,
    pub probability: f64,
    #[serde(alias = "amount")]
    pub extra_work: f64,
}

/// Rework table lookup key for a progress ratio: tenths, rounded.
pub fn progress_bucket(progress: f64) -> i64 {
    (progress * 10.0).round() as i64
}

#[derive(Debug, Clone, PartialEq)]
struct ReworkRow {
    probability: f64,
    source: String,
}

#[derive(Debug, Clone, Default)]
pub struct ReworkTable {
    rows: BTreeMap<(u32, i64), Vec<ReworkRow>>,
}

impl ReworkTable {
    pub fn build(task: &str, entries: &[ReworkEntry], strict: bool) -> Result<Self, ModelError> {
        let mut kept: Vec<&ReworkEntry> = Vec::with_capacity(entries.len());
        for entry in entries {
            let duplicate = kept.iter().any(|k| {
                k.occurrence == entry.occurrence
                    && (k.progress - entry.progress).abs() < PROGRESS_TOLERANCE
                    && k.source == entry.source
            });
            if duplicate {
                tracing::debug!(
                    task = %task,
                    source = %entry.source,
                    occurrence = entry.occurrence,
                    "dropping duplicate rework row"
                );
                continue;
            }
            check_probability(task, "rework", entry.probability)?;
            kept.push(entry);
        }

        let mut rows: BTreeMap<(u32, i64), Vec<ReworkRow>> = BTreeMap::new();
        for entry in kept {
            rows.entry((entry.occurrence, progress_bucket(entry.progress)))
                .or_default()
                .push(ReworkRow {
                    probability: entry.probability,
                    source: entry.source.clone(),
                });
        }

        for ((occurrence, bucket), list) in rows.iter_mut() {
            let key = format!("occurrence {} progress {:.1}", occurrence, *bucket as f64 / 10.0);
            let probs: Vec<f64> = list.iter().map(|r| r.probability).collect();
            check_partition(task, "rework", &key, &probs, strict)?;
            list.sort_by(|a, b| a.probability.total_cmp(&b.probability));
        }

        Ok(Self { rows })
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_key(&self, occurrence: u32, bucket: i64) -> bool {
        self.rows.contains_key(&(occurrence, bucket))
    }

    /// All source task names referenced by the table.
    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.rows
            .values()
            .flat_map(|list| list.iter().map(|r| r.source.as_str()))
    }

    /// Draw once for `(occurrence, bucket)`. Returns the source task of the hit.
    ///
    /// No random number is consumed when the key has no rows.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        occurrence: u32,
        bucket: i64,
        rng: &mut R,
    ) -> Option<&str> {
        let list = self.rows.get(&(occurrence, bucket))?;
        let draw: f64 = rng.gen();
        let mut acc = 0.0;
        for row in list {
            acc += row.probability;
            if draw < acc {
                return Some(row.source.as_str());
            }
        }
        None
    }
}

#[derive(Debug, Clone, PartialEq)]
struct DelayRow {
    probability: f64,
    extra_work: f64,
}

#[derive(Debug, Clone, Default)]
pub struct DelayTable {
    rows: BTreeMap<u32, Vec<DelayRow>>,
}

impl DelayTable {
    pub fn build(task: &str, entries: &[DelayEntry], strict: bool) -> Result<Self, ModelError> {
        let mut rows: BTreeMap<u32, Vec<DelayRow>> = BTreeMap::new();
        for entry in entries {
            check_probability(task, "delay", entry.probability)?;
            if !entry.extra_work.is_finite() || entry.extra_work < 0.0 {
                return Err(ModelError::InvalidDelayAmount {
                    task: task.to_string(),
                    occurrence: entry.occurrence,
                    amount: entry.extra_work,
                });
            }
            rows.entry(entry.occurrence).or_default().push(DelayRow {
                probability: entry.probability,
                extra_work: entry.extra_work,
            });
        }

        for (occurrence, list) in rows.iter_mut() {
            let key = format!("occurrence {}", occurrence);
            let probs: Vec<f64> = list.iter().map(|r| r.probability).collect();
            check_partition(task, "delay", &key, &probs, strict)?;
            list.sort_by(|a, b| a.probability.total_cmp(&b.probability));
        }

        Ok(Self { rows })
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Draw once for `occurrence`. Returns the extra work of the hit entry.
    ///
    /// No random number is consumed when the occurrence has no rows.
    pub fn sample<R: Rng + ?Sized>(&self, occurrence: u32, rng: &mut R) -> Option<f64> {
        let list = self.rows.get(&occurrence)?;
        let draw: f64 = rng.gen();
        let mut acc = 0.0;
        for row in list {
            acc += row.probability;
            if draw < acc {
                return Some(row.extra_work);
            }
        }
        None
    }
}

fn check_probability(task: &str, table: &'static str, probability: f64) -> Result<(), ModelError> {
    if probability.is_finite() && (0.0..=1.0).contains(&probability) {
        Ok(())
    } else {
        Err(ModelError::InvalidProbability {
            task: task.to_string(),
            table,
            probability,
        })
    }
}

fn check_partition(
    task: &str,
    table: &'static str,
    key: &str,
    probs: &[f64],
    strict: bool,
) -> Result<(), ModelError> {
    if strict && probs.windows(2).any(|w| w[1] < w[0]) {
        return Err(ModelError::UnsortedProbabilities {
            task: task.to_string(),
            table,
            key: key.to_string(),
        });
    }

    let sum: f64 = probs.iter().sum();
    if sum > 1.0 + SUM_TOLERANCE {
        return Err(ModelError::ProbabilityOverflow {
            task: task.to_string(),
            table,
            key: key.to_string(),
            sum,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rework(occurrence: u32, progress: f64, probability: f64, source: &str) -> ReworkEntry {
        ReworkEntry {
            occurrence,
            progress,
            probability,
            source: source.to_string(),
        }
    }

    fn delay(occurrence: u32, probability: f64, extra_work: f64) -> DelayEntry {
        DelayEntry {
            occurrence,
            probability,
            extra_work,
        }
    }

    #[test]
    fn test_progress_bucket_rounds_to_tenths() {
        assert_eq!(progress_bucket(0.0), 0);
        assert_eq!(progress_bucket(0.34), 3);
        assert_eq!(progress_bucket(0.35), 4);
        assert_eq!(progress_bucket(0.5), 5);
        assert_eq!(progress_bucket(1.0), 10);
    }

    #[test]
    fn test_certain_rework_always_hits() {
        let table = ReworkTable::build("B", &[rework(1, 0.5, 1.0, "A")], true).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            assert_eq!(table.sample(1, 5, &mut rng), Some("A"));
        }
        assert_eq!(table.sample(1, 6, &mut rng), None);
        assert_eq!(table.sample(2, 5, &mut rng), None);
    }

    #[test]
    fn test_zero_probability_never_hits() {
        let table = ReworkTable::build("B", &[rework(1, 0.5, 0.0, "A")], true).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            assert_eq!(table.sample(1, 5, &mut rng), None);
        }
    }

    #[test]
    fn test_missing_key_consumes_no_randomness() {
        let table = ReworkTable::build("B", &[rework(1, 0.5, 0.5, "A")], true).unwrap();
        let mut a = StdRng::seed_from_u64(3);
        let mut b = StdRng::seed_from_u64(3);
        assert_eq!(table.sample(4, 4, &mut a), None);
        let x: f64 = a.gen();
        let y: f64 = b.gen();
        assert_eq!(x, y);
    }

    #[test]
    fn test_duplicate_rework_rows_collapse() {
        let table = ReworkTable::build(
            "B",
            &[
                rework(1, 0.5, 0.6, "A"),
                rework(1, 0.500001, 0.6, "A"),
            ],
            true,
        )
        .unwrap();
        // Without the collapse the key would sum to 1.2 and be rejected.
        assert_eq!(table.sources().count(), 1);
    }

    #[test]
    fn test_strict_order_rejects_descending_rows() {
        let err = ReworkTable::build(
            "B",
            &[rework(1, 0.5, 0.4, "A"), rework(1, 0.5, 0.2, "C")],
            true,
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::UnsortedProbabilities { .. }));
    }

    #[test]
    fn test_lenient_order_sorts_rows() {
        let table = DelayTable::build("A", &[delay(1, 0.4, 1.0), delay(1, 0.2, 2.0)], false)
            .unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        let mut low = 0;
        let mut high = 0;
        for _ in 0..2000 {
            match table.sample(1, &mut rng) {
                Some(w) if w == 2.0 => low += 1,
                Some(w) if w == 1.0 => high += 1,
                _ => {}
            }
        }
        // Sorted: [0.2 -> 2.0, 0.4 -> 1.0], cumulative 0.2 / 0.6
        assert!(low > 300 && low < 500, "low = {low}");
        assert!(high > 700 && high < 900, "high = {high}");
    }

    #[test]
    fn test_probability_overflow_rejected() {
        let err = DelayTable::build("A", &[delay(1, 0.6, 1.0), delay(1, 0.7, 2.0)], true)
            .unwrap_err();
        assert!(matches!(err, ModelError::ProbabilityOverflow { .. }));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            DelayTable::build("A", &[delay(1, 1.5, 1.0)], true),
            Err(ModelError::InvalidProbability { .. })
        ));
        assert!(matches!(
            DelayTable::build("A", &[delay(1, 0.5, -1.0)], true),
            Err(ModelError::InvalidDelayAmount { .. })
        ));
        assert!(matches!(
            ReworkTable::build("A", &[rework(1, 0.5, f64::NAN, "A")], true),
            Err(ModelError::InvalidProbability { .. })
        ));
    }
}
