//! Insertion-ordered security weight vectors.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use super::SecurityId;

/// Mapping from security to fractional weight, preserving insertion order.
///
/// Benchmark and portfolio vectors sum to 1.0 (cash included); active-weight
/// vectors sum to 0.0. The order is the order in which securities were added,
/// which fixes the column and decision-variable order downstream.
///
/// Serializes as a map (`{"TD CN": 0.5, "cash": 0.5}`), keeping document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightVector {
    entries: Vec<(SecurityId, f64)>,
}

impl WeightVector {
    /// Creates an empty vector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a vector from `(id, weight)` pairs; later duplicates overwrite
    /// earlier ones in place.
    #[must_use]
    pub fn from_pairs(pairs: impl IntoIterator<Item = (SecurityId, f64)>) -> Self {
        let mut out = Self::new();
        for (id, w) in pairs {
            out.insert(id, w);
        }
        out
    }

    /// Equal weights over `ids`, scaled so that non-cash names share
    /// `1 - cash_weight` and cash (appended last) holds `cash_weight`.
    #[must_use]
    pub fn equal_weight_with_cash(ids: &[SecurityId], cash_weight: f64) -> Self {
        let names: Vec<&SecurityId> = ids.iter().filter(|id| !id.is_cash()).collect();
        let each = if names.is_empty() {
            0.0
        } else {
            (1.0 - cash_weight) / names.len() as f64
        };
        let mut out: Self = names.into_iter().map(|id| (id.clone(), each)).collect();
        out.insert(SecurityId::cash(), cash_weight);
        out
    }

    /// Sets the weight of `id`, appending it if new.
    pub fn insert(&mut self, id: SecurityId, weight: f64) {
        match self.entries.iter_mut().find(|(k, _)| *k == id) {
            Some(entry) => entry.1 = weight,
            None => self.entries.push((id, weight)),
        }
    }

    /// Weight of `id`.
    #[must_use]
    pub fn get(&self, id: &SecurityId) -> Option<f64> {
        self.entries.iter().find(|(k, _)| k == id).map(|(_, w)| *w)
    }

    /// True if `id` has a weight.
    #[must_use]
    pub fn contains(&self, id: &SecurityId) -> bool {
        self.entries.iter().any(|(k, _)| k == id)
    }

    /// Weight of the cash asset (0 when absent).
    #[must_use]
    pub fn cash_weight(&self) -> f64 {
        self.get(&SecurityId::cash()).unwrap_or(0.0)
    }

    /// Iterates `(id, weight)` in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&SecurityId, f64)> + '_ {
        self.entries.iter().map(|(k, w)| (k, *w))
    }

    /// Security ids in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = &SecurityId> + '_ {
        self.entries.iter().map(|(k, _)| k)
    }

    /// Weights in insertion order.
    #[must_use]
    pub fn values(&self) -> Vec<f64> {
        self.entries.iter().map(|(_, w)| *w).collect()
    }

    /// Number of securities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all weights.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, w)| w).sum()
    }

    /// True if the weights sum to 1 within `tolerance`.
    #[must_use]
    pub fn is_fully_invested(&self, tolerance: f64) -> bool {
        (self.total() - 1.0).abs() <= tolerance
    }

    /// First non-finite weight, if any.
    #[must_use]
    pub fn first_non_finite(&self) -> Option<(&SecurityId, f64)> {
        self.iter().find(|(_, w)| !w.is_finite())
    }

    /// The same weights with cash moved to the end (inserted at 0 if absent).
    #[must_use]
    pub fn with_cash_last(&self) -> Self {
        let cash = self.cash_weight();
        let mut out: Self = self
            .iter()
            .filter(|(k, _)| !k.is_cash())
            .map(|(k, w)| (k.clone(), w))
            .collect();
        out.entries.push((SecurityId::cash(), cash));
        out
    }

    /// Element-wise sum; ids missing on one side count as 0. Order follows
    /// `self`, then new ids from `other`.
    #[must_use]
    pub fn plus(&self, other: &WeightVector) -> Self {
        let mut out = self.clone();
        for (id, w) in other.iter() {
            let current = out.get(id).unwrap_or(0.0);
            out.insert(id.clone(), current + w);
        }
        out
    }

    /// Element-wise difference `self - other` (active weights when `self` is a
    /// portfolio and `other` its benchmark).
    #[must_use]
    pub fn minus(&self, other: &WeightVector) -> Self {
        let negated: Self = other.iter().map(|(k, w)| (k.clone(), -w)).collect();
        self.plus(&negated)
    }

    /// Weights divided by their sum, or `None` if the sum is zero or not finite.
    #[must_use]
    pub fn normalized(&self) -> Option<Self> {
        let total = self.total();
        if !total.is_finite() || total.abs() < f64::EPSILON {
            return None;
        }
        Some(self.iter().map(|(k, w)| (k.clone(), w / total)).collect())
    }
}

impl FromIterator<(SecurityId, f64)> for WeightVector {
    fn from_iter<I: IntoIterator<Item = (SecurityId, f64)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}

impl Serialize for WeightVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, w) in &self.entries {
            map.serialize_entry(id, w)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for WeightVector {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct WeightVisitor;

        impl<'de> Visitor<'de> for WeightVisitor {
            type Value = WeightVector;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of security id to weight")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut out = WeightVector::new();
                while let Some((id, w)) = access.next_entry::<SecurityId, f64>()? {
                    out.insert(id, w);
                }
                Ok(out)
            }
        }

        deserializer.deserialize_map(WeightVisitor)
    }
}
