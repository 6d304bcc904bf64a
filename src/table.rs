use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A confidence level usable as an ordered map key.
///
/// Plain `f64` has no total order. Estimates only ever carry well-formed
/// probabilities in `[0, 1]`, so comparisons involving NaN collapse to
/// `Equal` rather than poisoning the map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Confidence(pub f64);

impl Eq for Confidence {}

impl PartialOrd for Confidence {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Confidence {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0
            .partial_cmp(&other.0)
            .unwrap_or(std::cmp::Ordering::Equal)
    }
}

// Confidence levels key the per-target maps, and JSON only allows string
// map keys, so the wire form is the decimal rendering ("0.95").
impl Serialize for Confidence {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Confidence {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ConfidenceVisitor;

        impl Visitor<'_> for ConfidenceVisitor {
            type Value = Confidence;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a confidence level as a number or decimal string")
            }

            fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
                Ok(Confidence(value))
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
                Ok(Confidence(value as f64))
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
                value.parse().map(Confidence).map_err(de::Error::custom)
            }
        }

        deserializer.deserialize_any(ConfidenceVisitor)
    }
}

/// Fee rates for one confirmation target, keyed by confidence level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetEntry {
    /// The confirmation target in blocks.
    pub blocks: u32,

    /// Confidence level to fee rate in sat/vB.
    pub fee_rates: BTreeMap<Confidence, f64>,
}

impl TargetEntry {
    pub fn new(blocks: u32, fee_rates: BTreeMap<Confidence, f64>) -> Self {
        Self { blocks, fee_rates }
    }

    /// Fee rate at an exact confidence level, if present.
    pub fn fee_rate(&self, confidence: f64) -> Option<f64> {
        self.fee_rates.get(&Confidence(confidence)).copied()
    }
}

/// The estimator's output: block target to confidence level to fee rate.
///
/// # Example
/// ```
/// use fee_compass::FeeTable;
/// use chrono::Utc;
///
/// let table = FeeTable::empty(Utc::now());
/// assert_eq!(table.fee_rate(6, 0.95), None);
/// assert!(table.available_targets().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeTable {
    /// One row per confirmation target, keyed by target.
    pub entries: BTreeMap<u32, TargetEntry>,

    /// When the underlying data was observed: the newest input
    /// snapshot's timestamp, or the computation instant for empty input.
    pub timestamp: DateTime<Utc>,
}

impl FeeTable {
    pub fn new(entries: BTreeMap<u32, TargetEntry>, timestamp: DateTime<Utc>) -> Self {
        Self { entries, timestamp }
    }

    /// A table with no estimates.
    pub fn empty(timestamp: DateTime<Utc>) -> Self {
        Self {
            entries: BTreeMap::new(),
            timestamp,
        }
    }

    /// Fee rate for an exact (target, confidence) pair, if present.
    pub fn fee_rate(&self, target: u32, confidence: f64) -> Option<f64> {
        self.entries
            .get(&target)
            .and_then(|entry| entry.fee_rate(confidence))
    }

    /// The whole confidence row for a target, if present.
    pub fn entries_for_target(&self, target: u32) -> Option<&TargetEntry> {
        self.entries.get(&target)
    }

    /// The available target closest to `target`; ties go to the smaller
    /// candidate. `None` on an empty table.
    pub fn nearest_target(&self, target: u32) -> Option<u32> {
        self.entries
            .keys()
            .min_by_key(|&&candidate| (i64::from(candidate) - i64::from(target)).abs())
            .copied()
    }

    /// All targets with at least one estimate, ascending.
    pub fn available_targets(&self) -> Vec<u32> {
        self.entries.keys().copied().collect()
    }

    /// Union of confidence levels present anywhere in the table,
    /// ascending.
    pub fn available_confidence_levels(&self) -> Vec<f64> {
        let mut levels: BTreeSet<Confidence> = BTreeSet::new();
        for entry in self.entries.values() {
            levels.extend(entry.fee_rates.keys().copied());
        }
        levels.into_iter().map(|level| level.0).collect()
    }
}

impl fmt::Display for FeeTable {
    /// Renders a padded table: targets as rows, confidence levels as
    /// columns, `-` where no estimate exists.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return Ok(());
        }

        let levels = self.available_confidence_levels();

        write!(f, "{:>8}", "blocks")?;
        for level in &levels {
            write!(f, "  {:>10}", format!("{:.1}%", level * 100.0))?;
        }
        writeln!(f)?;

        for (target, entry) in &self.entries {
            write!(f, "{:>8}", target)?;
            for level in &levels {
                match entry.fee_rate(*level) {
                    Some(rate) => write!(f, "  {:>10.4}", rate)?,
                    None => write!(f, "  {:>10}", "-")?,
                }
            }
            writeln!(f)?;
        }

        Ok(())
    }
}
