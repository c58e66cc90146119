// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! SiDB layouts and their electrostatic potential landscape.
//!
//! A [`SidbLayout`] is the serializable description of a layout: SiDB
//! positions in SiQAD lattice coordinates plus optional charged atomic
//! defects. [`PotentialLandscape`] evaluates it under a set of
//! [`SimulationParameters`] into the pairwise chargeless potential matrix and
//! the local external potential at every SiDB. [`ChargeDistribution`] is one
//! charge state per SiDB together with its local potentials and energy.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SimulationError;
use crate::physics::{
    chargeless_potential, ChargeState, SimulationParameters, POP_STABILITY_ERR,
};

/// SiQAD lattice coordinate `(x, y, z)`, where `z` selects the dimer atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SiqadCoord(pub i64, pub i64, pub u8);

impl SiqadCoord {
    /// Position in nm on the H-Si(100)-2x1 surface.
    pub fn to_nm(self, params: &SimulationParameters) -> (f64, f64) {
        let SiqadCoord(x, y, z) = self;
        (
            x as f64 * params.lat_a * 0.1,
            y as f64 * params.lat_b * 0.1 + z as f64 * params.lat_c * 0.1,
        )
    }
}

/// A fixed-charge atomic defect near the SiDBs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SidbDefect {
    pub position: SiqadCoord,
    /// Charge in units of the elementary charge.
    pub charge: f64,
    /// Screening of the defect potential. Falls back to the simulation
    /// parameters when absent.
    #[serde(default)]
    pub epsilon_r: Option<f64>,
    #[serde(default)]
    pub lambda_tf: Option<f64>,
}

/// Serializable SiDB layout. The order of `sidbs` defines the SiDB indices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SidbLayout {
    pub sidbs: Vec<SiqadCoord>,
    #[serde(default)]
    pub defects: Vec<SidbDefect>,
}

impl SidbLayout {
    pub fn new(sidbs: impl IntoIterator<Item = (i64, i64, u8)>) -> Self {
        Self {
            sidbs: sidbs
                .into_iter()
                .map(|(x, y, z)| SiqadCoord(x, y, z))
                .collect(),
            defects: vec![],
        }
    }

    pub fn with_defect(mut self, defect: SidbDefect) -> Self {
        self.defects.push(defect);
        self
    }

    pub fn num_sidbs(&self) -> usize {
        self.sidbs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sidbs.is_empty()
    }

    pub fn load_json(path: &Path) -> Result<Self, SimulationError> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}

/// Externally applied potentials on top of the defect potentials.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalPotentials {
    /// SiDB index → local potential in V.
    #[serde(default)]
    pub local: BTreeMap<usize, f64>,
    /// Potential applied uniformly to every SiDB in V.
    #[serde(default)]
    pub global: f64,
}

/// Precomputed electrostatics of a layout under fixed physical parameters.
#[derive(Debug, Clone)]
pub struct PotentialLandscape {
    params: SimulationParameters,
    num_sidbs: usize,
    positions_nm: Vec<(f64, f64)>,
    /// Row-major `num_sidbs × num_sidbs`.
    potentials: Vec<f64>,
    external: Vec<f64>,
}

impl PotentialLandscape {
    pub fn new(layout: &SidbLayout, params: &SimulationParameters) -> Result<Self, SimulationError> {
        Self::with_external_potentials(layout, params, &ExternalPotentials::default())
    }

    pub fn with_external_potentials(
        layout: &SidbLayout,
        params: &SimulationParameters,
        ext: &ExternalPotentials,
    ) -> Result<Self, SimulationError> {
        params.validate()?;
        let n = layout.num_sidbs();
        if let Some((&ix, _)) = ext.local.iter().find(|(&ix, _)| ix >= n) {
            return Err(SimulationError::UnknownSidb(ix));
        }

        let positions_nm: Vec<(f64, f64)> = layout.sidbs.iter().map(|c| c.to_nm(params)).collect();
        let mut potentials = vec![0.0; n * n];
        for i in 0..n {
            for j in (i + 1)..n {
                let d = euclidean(positions_nm[i], positions_nm[j]);
                let v = chargeless_potential(d, params.epsilon_r, params.lambda_tf);
                potentials[i * n + j] = v;
                potentials[j * n + i] = v;
            }
        }

        let mut external = vec![ext.global; n];
        for (&ix, &v) in &ext.local {
            external[ix] += v;
        }
        for defect in &layout.defects {
            let pos = defect.position.to_nm(params);
            let eps = defect.epsilon_r.unwrap_or(params.epsilon_r);
            let lambda = defect.lambda_tf.unwrap_or(params.lambda_tf);
            for (i, &p) in positions_nm.iter().enumerate() {
                external[i] += defect.charge * chargeless_potential(euclidean(pos, p), eps, lambda);
            }
        }

        Ok(Self {
            params: *params,
            num_sidbs: n,
            positions_nm,
            potentials,
            external,
        })
    }

    #[inline]
    pub fn num_sidbs(&self) -> usize {
        self.num_sidbs
    }

    #[inline]
    pub fn params(&self) -> &SimulationParameters {
        &self.params
    }

    #[inline]
    pub fn base(&self) -> u8 {
        self.params.base
    }

    pub fn positions_nm(&self) -> &[(f64, f64)] {
        &self.positions_nm
    }

    /// Chargeless potential between SiDBs `i` and `j` (zero on the diagonal).
    #[inline]
    pub fn potential(&self, i: usize, j: usize) -> f64 {
        self.potentials[i * self.num_sidbs + j]
    }

    /// Defect and applied potentials local to SiDB `i`.
    #[inline]
    pub fn external_potential(&self, i: usize) -> f64 {
        self.external[i]
    }

    /// Local potential at every SiDB for the given charges.
    pub fn local_potentials(&self, charges: &[ChargeState]) -> Vec<f64> {
        assert_eq!(charges.len(), self.num_sidbs);
        (0..self.num_sidbs)
            .map(|i| {
                let row = &self.potentials[i * self.num_sidbs..(i + 1) * self.num_sidbs];
                row.iter()
                    .zip(charges)
                    .map(|(v, cs)| v * cs.sign() as f64)
                    .sum::<f64>()
                    + self.external[i]
            })
            .collect()
    }
}

#[inline]
fn euclidean(a: (f64, f64), b: (f64, f64)) -> f64 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

/// A full charge assignment with its derived local potentials and energy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeDistribution {
    pub charges: Vec<ChargeState>,
    /// Local potential at each SiDB in V, including external contributions.
    pub local_potentials: Vec<f64>,
    /// Electrostatic system energy in eV.
    pub system_energy: f64,
}

impl ChargeDistribution {
    pub fn new(landscape: &PotentialLandscape, charges: Vec<ChargeState>) -> Self {
        let local_potentials = landscape.local_potentials(&charges);
        let mut system_energy = 0.0;
        for (i, cs) in charges.iter().enumerate() {
            let s = cs.sign() as f64;
            let ext = landscape.external_potential(i);
            system_energy += 0.5 * (local_potentials[i] - ext) * s + ext * s;
        }
        Self {
            charges,
            local_potentials,
            system_energy,
        }
    }

    #[inline]
    pub fn num_sidbs(&self) -> usize {
        self.charges.len()
    }

    pub fn count(&self, cs: ChargeState) -> usize {
        self.charges.iter().filter(|&&c| c == cs).count()
    }

    /// Canonical integer id: the charges read as digits `sign + 1` in the
    /// simulation base, most significant first.
    pub fn charge_index(&self, base: u8) -> u64 {
        self.charges
            .iter()
            .fold(0u64, |acc, cs| acc * base as u64 + cs.digit())
    }

    /// No single SiDB can lower the energy by changing its own charge.
    pub fn is_population_stable(&self, params: &SimulationParameters) -> bool {
        let mu_minus = params.mu_minus;
        let mu_plus = params.mu_plus();
        self.charges
            .iter()
            .zip(&self.local_potentials)
            .all(|(cs, &v)| {
                let u = -v;
                match cs {
                    ChargeState::Negative => u + mu_minus < POP_STABILITY_ERR,
                    ChargeState::Positive => u + mu_plus > -POP_STABILITY_ERR,
                    ChargeState::Neutral => {
                        u + mu_minus > -POP_STABILITY_ERR && u + mu_plus < POP_STABILITY_ERR
                    }
                }
            })
    }

    /// No single electron hop from a more negative SiDB to a more positive
    /// one lowers the energy.
    pub fn is_configuration_stable(&self, landscape: &PotentialLandscape) -> bool {
        let n = self.num_sidbs();
        for i in 0..n {
            if self.charges[i] == ChargeState::Positive {
                continue;
            }
            let si = self.charges[i].sign();
            for j in 0..n {
                if self.charges[j].sign() <= si {
                    continue;
                }
                let delta = self.local_potentials[i] - self.local_potentials[j] - landscape.potential(i, j);
                if delta < -POP_STABILITY_ERR {
                    return false;
                }
            }
        }
        true
    }

    pub fn is_physically_valid(&self, landscape: &PotentialLandscape) -> bool {
        self.is_population_stable(landscape.params()) && self.is_configuration_stable(landscape)
    }

    pub fn charge_string(&self) -> String {
        self.charges.iter().map(|cs| cs.symbol()).collect()
    }
}
