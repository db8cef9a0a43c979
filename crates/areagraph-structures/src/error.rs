use std::error::Error;
use std::fmt::{Display, Formatter};

/// Common error type for areagraph identifier and value parsing.
///
/// Every string that names an area, a neuron, or a coordinate goes through one of the
/// validated constructors in this crate, and they all fail with this type.
///
/// # Examples
/// ```
/// use areagraph_structures::{AreaId, StructuresError};
///
/// assert!(matches!(
///     AreaId::parse_label("region_4"),
///     Err(StructuresError::InvalidAreaLabel(_))
/// ));
/// assert!(AreaId::parse_label("area_4").is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuresError {
    /// Label is not of the form `area_<non-negative integer>`
    InvalidAreaLabel(String),
    /// Neuron id field is not a non-negative integer
    InvalidNeuronId(String),
    /// Coordinate field is not a finite floating point number
    InvalidCoordinate(String),
}

impl Display for StructuresError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StructuresError::InvalidAreaLabel(label) => {
                write!(f, "Invalid area label '{}': expected area_<N>", label)
            }
            StructuresError::InvalidNeuronId(field) => {
                write!(f, "Invalid neuron id '{}': expected a non-negative integer", field)
            }
            StructuresError::InvalidCoordinate(field) => {
                write!(f, "Invalid coordinate '{}': expected a finite number", field)
            }
        }
    }
}

impl Error for StructuresError {}
