// Copyright 2025 areagraph developers
// SPDX-License-Identifier: Apache-2.0

//! Per-area centroids.

use crate::positions::PositionTable;
use areagraph_structures::{AreaId, Position};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Mean position of an area's members.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Centroid {
    pub area: AreaId,
    pub position: Position,
    pub member_count: usize,
}

pub struct CentroidCalculator;

impl CentroidCalculator {
    /// One centroid per area with at least one member, in canonical area order.
    ///
    /// Members are summed in ascending neuron-id order, so the result does not depend
    /// on the order of rows in the roster file.
    pub fn compute(positions: &PositionTable) -> BTreeMap<AreaId, Centroid> {
        let mut sums: BTreeMap<AreaId, ([f64; 3], usize)> = BTreeMap::new();
        for neuron in positions.neurons() {
            let (sum, count) = sums.entry(neuron.area).or_insert(([0.0; 3], 0));
            sum[0] += neuron.position.x;
            sum[1] += neuron.position.y;
            sum[2] += neuron.position.z;
            *count += 1;
        }

        let centroids: BTreeMap<AreaId, Centroid> = sums
            .into_iter()
            .filter(|(_, (_, count))| *count > 0)
            .map(|(area, (sum, count))| {
                let n = count as f64;
                let centroid = Centroid {
                    area,
                    position: Position::new(sum[0] / n, sum[1] / n, sum[2] / n),
                    member_count: count,
                };
                (area, centroid)
            })
            .collect();

        debug!(target: "areagraph-connectome", "Computed {} area centroids", centroids.len());
        centroids
    }
}
