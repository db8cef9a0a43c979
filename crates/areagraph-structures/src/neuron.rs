// Copyright 2025 areagraph developers
// SPDX-License-Identifier: Apache-2.0

//! Neuron identity and position.

use crate::StructuresError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Local neuron id, unique within one simulation rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NeuronId(pub u64);

impl NeuronId {
    pub fn parse_field(field: &str) -> Result<Self, StructuresError> {
        field
            .parse::<u64>()
            .map(NeuronId)
            .map_err(|_| StructuresError::InvalidNeuronId(field.to_string()))
    }
}

impl Display for NeuronId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for NeuronId {
    fn from(id: u64) -> Self {
        NeuronId(id)
    }
}

/// 3-D position in simulation space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub const ORIGIN: Position = Position::new(0.0, 0.0, 0.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Position { x, y, z }
    }

    /// Parse three coordinate fields; non-finite values are rejected.
    pub fn parse_fields(x: &str, y: &str, z: &str) -> Result<Self, StructuresError> {
        Ok(Position {
            x: parse_coordinate(x)?,
            y: parse_coordinate(y)?,
            z: parse_coordinate(z)?,
        })
    }

    pub fn as_array(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<(f64, f64, f64)> for Position {
    fn from(value: (f64, f64, f64)) -> Self {
        Position::new(value.0, value.1, value.2)
    }
}

fn parse_coordinate(field: &str) -> Result<f64, StructuresError> {
    match field.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(StructuresError::InvalidCoordinate(field.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_neuron_id() {
        assert_eq!(NeuronId::parse_field("42").unwrap(), NeuronId(42));
        assert!(NeuronId::parse_field("-1").is_err());
        assert!(NeuronId::parse_field("4.5").is_err());
    }

    #[test]
    fn test_parse_position() {
        let p = Position::parse_fields("1.5", "-2", "3e2").unwrap();
        assert_eq!(p, Position::new(1.5, -2.0, 300.0));
        assert!(Position::parse_fields("1", "nan", "0").is_err());
        assert!(Position::parse_fields("1", "abc", "0").is_err());
    }
}
