// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Exhaustive ground state simulation (ExGS).
//!
//! Enumerates all `base^N` charge assignments and keeps the physically valid
//! ones. This is the reference the pruned simulators are checked against.

use std::time::Instant;

use rayon::prelude::*;

use super::result::SimulationResult;
use crate::error::SimulationError;
use crate::layout::{ChargeDistribution, ExternalPotentials, PotentialLandscape, SidbLayout};
use crate::physics::{ChargeState, SimulationParameters};

/// Largest layout accepted by the exhaustive simulation.
pub const EXHAUSTIVE_SIDB_LIMIT: usize = 24;

pub fn exhaustive_ground_state_simulation(
    layout: &SidbLayout,
    params: &SimulationParameters,
    external: &ExternalPotentials,
) -> Result<SimulationResult, SimulationError> {
    let landscape = PotentialLandscape::with_external_potentials(layout, params, external)?;
    exhaustive_ground_state_simulation_with_landscape(&landscape)
}

pub fn exhaustive_ground_state_simulation_with_landscape(
    landscape: &PotentialLandscape,
) -> Result<SimulationResult, SimulationError> {
    let n = landscape.num_sidbs();
    if n == 0 {
        return Err(SimulationError::EmptyLayout);
    }
    if n > EXHAUSTIVE_SIDB_LIMIT {
        return Err(SimulationError::TooManySidbs {
            num_sidbs: n,
            limit: EXHAUSTIVE_SIDB_LIMIT,
        });
    }

    let start = Instant::now();
    let base = landscape.base() as u64;
    let num_assignments = base.pow(n as u32);
    clilog::debug!("ExGS enumerates {} charge assignments of {} SiDBs", num_assignments, n);

    let mut charge_distributions: Vec<ChargeDistribution> = (0..num_assignments)
        .into_par_iter()
        .filter_map(|index| {
            let cd = ChargeDistribution::new(landscape, charges_of_index(index, base, n));
            cd.is_physically_valid(landscape).then_some(cd)
        })
        .collect();
    charge_distributions.sort_by_key(|cd| cd.charge_index(landscape.base()));

    let mut result = SimulationResult::new("ExGS", *landscape.params());
    result.charge_distributions = charge_distributions;
    result.simulation_runtime = start.elapsed();
    Ok(result)
}

/// Inverse of [`ChargeDistribution::charge_index`].
fn charges_of_index(mut index: u64, base: u64, n: usize) -> Vec<ChargeState> {
    let mut charges = vec![ChargeState::Neutral; n];
    for cs in charges.iter_mut().rev() {
        let digit = (index % base) as i8;
        index /= base;
        *cs = match ChargeState::from_sign(digit - 1) {
            Some(cs) => cs,
            None => unreachable!("digit {} out of range", digit),
        };
    }
    charges
}
