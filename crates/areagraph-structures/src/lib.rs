//! The core crate for areagraph. Defines the identifiers and value types used throughout:
//! areas (`area_<N>`), neurons, positions, and the keys that address connection matrices
//! and time series.
//!
//! Area labels are only ever parsed through [`AreaId::parse_label`], so every crate agrees
//! on what counts as an area and on how areas are ordered.

mod area;
mod error;
mod key;
mod neuron;

pub use area::AreaId;
pub use error::StructuresError;
pub use key::{AreaPair, TrackedKey};
pub use neuron::{NeuronId, Position};
