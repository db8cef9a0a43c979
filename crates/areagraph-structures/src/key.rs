// Copyright 2025 areagraph developers
// SPDX-License-Identifier: Apache-2.0

//! Keys used to address connection matrices and time series.

use crate::AreaId;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// A pair of areas.
///
/// For directed matrices `first` is the source area and `second` the target area. For
/// undirected matrices the pair is stored sorted (`first <= second`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AreaPair {
    pub first: AreaId,
    pub second: AreaId,
}

impl AreaPair {
    /// Ordered pair `source -> target`.
    pub const fn directed(source: AreaId, target: AreaId) -> Self {
        AreaPair {
            first: source,
            second: target,
        }
    }

    /// Pair sorted by area index, so both directions map to the same key.
    pub fn undirected(a: AreaId, b: AreaId) -> Self {
        if a <= b {
            AreaPair { first: a, second: b }
        } else {
            AreaPair { first: b, second: a }
        }
    }

    #[inline]
    pub fn is_self_pair(&self) -> bool {
        self.first == self.second
    }

    #[inline]
    pub fn is_sorted(&self) -> bool {
        self.first <= self.second
    }

    /// The same pair with both ends swapped.
    pub fn reversed(&self) -> Self {
        AreaPair {
            first: self.second,
            second: self.first,
        }
    }

    pub fn contains(&self, area: AreaId) -> bool {
        self.first == area || self.second == area
    }
}

impl Display for AreaPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.first, self.second)
    }
}

impl From<(AreaId, AreaId)> for AreaPair {
    fn from(value: (AreaId, AreaId)) -> Self {
        AreaPair::directed(value.0, value.1)
    }
}

/// Something a time series can follow: a single area or an area pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackedKey {
    Area(AreaId),
    Pair(AreaPair),
}

impl TrackedKey {
    /// All areas this key refers to.
    pub fn areas(&self) -> impl Iterator<Item = AreaId> {
        let (a, b) = match self {
            TrackedKey::Area(area) => (*area, None),
            TrackedKey::Pair(pair) => (pair.first, Some(pair.second)),
        };
        std::iter::once(a).chain(b)
    }
}

impl Display for TrackedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackedKey::Area(area) => write!(f, "{}", area),
            TrackedKey::Pair(pair) => write!(f, "{}", pair),
        }
    }
}

impl From<AreaId> for TrackedKey {
    fn from(area: AreaId) -> Self {
        TrackedKey::Area(area)
    }
}

impl From<AreaPair> for TrackedKey {
    fn from(pair: AreaPair) -> Self {
        TrackedKey::Pair(pair)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undirected_pair_is_sorted() {
        let a = AreaId::new(30);
        let b = AreaId::new(8);
        assert_eq!(AreaPair::undirected(a, b), AreaPair::undirected(b, a));
        assert_eq!(AreaPair::undirected(a, b).first, b);
    }

    #[test]
    fn test_directed_pair_keeps_order() {
        let pair = AreaPair::directed(AreaId::new(30), AreaId::new(8));
        assert!(!pair.is_sorted());
        assert_eq!(pair.reversed(), AreaPair::directed(AreaId::new(8), AreaId::new(30)));
    }

    #[test]
    fn test_tracked_key_areas() {
        let key = TrackedKey::Pair(AreaPair::directed(AreaId::new(1), AreaId::new(2)));
        assert_eq!(key.areas().collect::<Vec<_>>(), vec![AreaId::new(1), AreaId::new(2)]);
        let key = TrackedKey::Area(AreaId::new(5));
        assert_eq!(key.areas().count(), 1);
    }

    #[test]
    fn test_tracked_key_ordering() {
        let mut keys = vec![
            TrackedKey::Pair(AreaPair::undirected(AreaId::new(1), AreaId::new(2))),
            TrackedKey::Area(AreaId::new(9)),
            TrackedKey::Area(AreaId::new(3)),
        ];
        keys.sort();
        assert_eq!(keys[0], TrackedKey::Area(AreaId::new(3)));
        assert_eq!(keys[1], TrackedKey::Area(AreaId::new(9)));
    }
}
