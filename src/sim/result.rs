// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Simulation results shared by all simulators.

use std::collections::BTreeSet;
use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::layout::ChargeDistribution;
use crate::physics::{SimulationParameters, POP_STABILITY_ERR};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    pub algorithm_name: String,
    pub simulation_runtime: Duration,
    pub simulation_parameters: SimulationParameters,
    /// Algorithm specific settings, in insertion order.
    pub additional_simulation_parameters: IndexMap<String, f64>,
    /// Every physically valid charge distribution found.
    pub charge_distributions: Vec<ChargeDistribution>,
}

impl SimulationResult {
    pub fn new(algorithm_name: &str, simulation_parameters: SimulationParameters) -> Self {
        Self {
            algorithm_name: algorithm_name.to_string(),
            simulation_runtime: Duration::ZERO,
            simulation_parameters,
            additional_simulation_parameters: IndexMap::new(),
            charge_distributions: Vec::new(),
        }
    }

    #[inline]
    pub fn num_charge_distributions(&self) -> usize {
        self.charge_distributions.len()
    }

    pub fn minimum_energy(&self) -> Option<f64> {
        self.charge_distributions
            .iter()
            .map(|cd| cd.system_energy)
            .min_by(f64::total_cmp)
    }

    /// All distributions within the stability margin of the minimum energy.
    pub fn ground_states(&self) -> Vec<&ChargeDistribution> {
        let Some(e_min) = self.minimum_energy() else {
            return vec![];
        };
        self.charge_distributions
            .iter()
            .filter(|cd| cd.system_energy < e_min + POP_STABILITY_ERR)
            .collect()
    }

    pub fn sorted_by_energy(&self) -> Vec<&ChargeDistribution> {
        let mut sorted: Vec<&ChargeDistribution> = self.charge_distributions.iter().collect();
        sorted.sort_by(|a, b| a.system_energy.total_cmp(&b.system_energy));
        sorted
    }

    /// Charge indices of all distributions, the set used to compare results
    /// of different simulators.
    pub fn charge_indices(&self) -> BTreeSet<u64> {
        let base = self.simulation_parameters.base;
        self.charge_distributions
            .iter()
            .map(|cd| cd.charge_index(base))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{PotentialLandscape, SidbLayout};
    use crate::physics::ChargeState;

    fn result_with(charges: &[Vec<ChargeState>]) -> SimulationResult {
        let params = SimulationParameters::new(3, -0.32);
        let layout = SidbLayout::new([(0, 0, 0), (5, 0, 0)]);
        let landscape = PotentialLandscape::new(&layout, &params).unwrap();
        let mut res = SimulationResult::new("test", params);
        res.charge_distributions = charges
            .iter()
            .map(|c| ChargeDistribution::new(&landscape, c.clone()))
            .collect();
        res
    }

    #[test]
    fn test_empty_result() {
        let res = result_with(&[]);
        assert_eq!(res.minimum_energy(), None);
        assert!(res.ground_states().is_empty());
        assert!(res.charge_indices().is_empty());
    }

    #[test]
    fn test_energy_helpers() {
        use ChargeState::*;
        let res = result_with(&[vec![Negative, Negative], vec![Neutral, Negative], vec![Neutral, Neutral]]);
        let sorted = res.sorted_by_energy();
        assert_eq!(sorted.len(), 3);
        assert!(sorted.windows(2).all(|w| w[0].system_energy <= w[1].system_energy));
        // all-neutral carries no energy, a single negative charge none either
        let gs = res.ground_states();
        assert_eq!(gs.len(), 2);
        assert!(gs.iter().all(|cd| cd.count(Negative) < 2));
        assert_eq!(res.charge_indices().len(), 3);
    }
}
