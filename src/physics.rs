// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Physical constants, charge states and simulation parameters.
//!
//! Potentials are given in volts (equivalently eV per elementary charge).
//! The charge transition levels follow the usual SiDB model: an SiDB is
//! negative when its local potential lies below `-mu_minus`, positive when it
//! lies above `-mu_plus`, and neutral in between.

use serde::{Deserialize, Serialize};

use crate::error::SimulationError;

/// Coulomb constant in N·m²/C².
pub const K_E: f64 = 8.987_551_792_3e9;

/// Elementary charge in C.
pub const ELEMENTARY_CHARGE: f64 = 1.602_176_634e-19;

/// Error margin applied to every population and configuration stability
/// comparison.
pub const POP_STABILITY_ERR: f64 = 1e-6;

/// Energy gap between the (0/-) and (+/0) transition levels in eV.
pub const MU_GAP: f64 = 0.59;

/// Charge state of a single SiDB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChargeState {
    Negative,
    Neutral,
    Positive,
}

impl ChargeState {
    /// Signed charge in units of the elementary charge.
    #[inline]
    pub fn sign(self) -> i8 {
        match self {
            ChargeState::Negative => -1,
            ChargeState::Neutral => 0,
            ChargeState::Positive => 1,
        }
    }

    #[inline]
    pub fn from_sign(sign: i8) -> Option<Self> {
        match sign {
            -1 => Some(ChargeState::Negative),
            0 => Some(ChargeState::Neutral),
            1 => Some(ChargeState::Positive),
            _ => None,
        }
    }

    /// Digit of this charge state in a charge index (`sign + 1`).
    #[inline]
    pub fn digit(self) -> u64 {
        (self.sign() + 1) as u64
    }

    pub fn symbol(self) -> char {
        match self {
            ChargeState::Negative => '-',
            ChargeState::Neutral => '0',
            ChargeState::Positive => '+',
        }
    }
}

impl std::fmt::Display for ChargeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Charge states admitted by a simulation base, positive first.
pub fn charge_states(base: u8) -> &'static [ChargeState] {
    if base == 3 {
        &[ChargeState::Positive, ChargeState::Neutral, ChargeState::Negative]
    } else {
        &[ChargeState::Neutral, ChargeState::Negative]
    }
}

/// Physical parameters of an SiDB simulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParameters {
    /// 2 for negative/neutral simulation, 3 to also admit positive charges.
    pub base: u8,
    /// (0/-) charge transition level in eV.
    pub mu_minus: f64,
    /// Relative permittivity of the substrate.
    pub epsilon_r: f64,
    /// Thomas-Fermi screening length in nm.
    pub lambda_tf: f64,
    /// Lattice constants in Å.
    pub lat_a: f64,
    pub lat_b: f64,
    pub lat_c: f64,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            base: 3,
            mu_minus: -0.32,
            epsilon_r: 5.6,
            lambda_tf: 5.0,
            lat_a: 3.84,
            lat_b: 7.68,
            lat_c: 2.25,
        }
    }
}

impl SimulationParameters {
    pub fn new(base: u8, mu_minus: f64) -> Self {
        Self {
            base,
            mu_minus,
            ..Default::default()
        }
    }

    /// (+/0) charge transition level in eV.
    #[inline]
    pub fn mu_plus(&self) -> f64 {
        self.mu_minus - MU_GAP
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.base != 2 && self.base != 3 {
            return Err(SimulationError::InvalidParameter(format!(
                "simulation base must be 2 or 3, got {}",
                self.base
            )));
        }
        for (name, value) in [
            ("epsilon_r", self.epsilon_r),
            ("lambda_tf", self.lambda_tf),
            ("lat_a", self.lat_a),
            ("lat_b", self.lat_b),
            ("lat_c", self.lat_c),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(SimulationError::InvalidParameter(format!(
                    "{} must be positive and finite, got {}",
                    name, value
                )));
            }
        }
        if !self.mu_minus.is_finite() {
            return Err(SimulationError::InvalidParameter(format!(
                "mu_minus must be finite, got {}",
                self.mu_minus
            )));
        }
        Ok(())
    }
}

/// Chargeless screened Coulomb potential in V at distance `distance_nm`.
///
/// Returns zero for coinciding positions.
pub fn chargeless_potential(distance_nm: f64, epsilon_r: f64, lambda_tf_nm: f64) -> f64 {
    if distance_nm == 0.0 {
        return 0.0;
    }
    K_E / epsilon_r / (distance_nm * 1e-9) * (-distance_nm / lambda_tf_nm).exp() * ELEMENTARY_CHARGE
}
