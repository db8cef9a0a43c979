// Copyright 2025 areagraph developers
// SPDX-License-Identifier: Apache-2.0

//! Area identifiers.
//!
//! Areas are named `area_<N>` in simulation output. The numeric suffix is the only thing
//! that matters for identity and ordering, so an [`AreaId`] stores just that number and
//! sorts numerically (`area_2` < `area_10`).

use crate::StructuresError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::Display;
use std::str::FromStr;

/// Typed identifier of a brain area, ordered by its numeric index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AreaId(u32);

impl AreaId {
    /// Literal prefix every area label carries in simulation output.
    pub const LABEL_PREFIX: &'static str = "area_";

    pub const fn new(index: u32) -> Self {
        AreaId(index)
    }

    /// Parse an `area_<N>` label.
    ///
    /// The suffix must be a non-empty run of ASCII digits that fits in a `u32`. Signs,
    /// whitespace and trailing text are rejected.
    pub fn parse_label(label: &str) -> Result<Self, StructuresError> {
        let suffix = label
            .strip_prefix(Self::LABEL_PREFIX)
            .ok_or_else(|| StructuresError::InvalidAreaLabel(label.to_string()))?;

        if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
            return Err(StructuresError::InvalidAreaLabel(label.to_string()));
        }

        suffix
            .parse::<u32>()
            .map(AreaId)
            .map_err(|_| StructuresError::InvalidAreaLabel(label.to_string()))
    }

    /// Whether a roster label follows the area naming convention at all.
    ///
    /// Rows without the prefix are auxiliary entries, not areas, and are dropped before
    /// [`AreaId::parse_label`] is attempted.
    #[inline]
    pub fn is_area_label(label: &str) -> bool {
        label.starts_with(Self::LABEL_PREFIX)
    }

    #[inline]
    pub const fn index(&self) -> u32 {
        self.0
    }

    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl Display for AreaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", Self::LABEL_PREFIX, self.0)
    }
}

impl FromStr for AreaId {
    type Err = StructuresError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AreaId::parse_label(s)
    }
}

impl From<u32> for AreaId {
    fn from(index: u32) -> Self {
        AreaId(index)
    }
}

impl Serialize for AreaId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AreaId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let label = String::deserialize(deserializer)?;
        AreaId::parse_label(&label).map_err(serde::de::Error::custom)
    }
}
