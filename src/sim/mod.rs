// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Exact physical simulation of SiDB layouts.
//!
//! - [`clustercomplete`]: unfolds the Ground State Space into all physically valid charge distributions
//! - [`exhaustive`]: brute-force reference enumeration of all charge distributions
//! - [`result`]: the simulation result shared by both engines

pub mod clustercomplete;
pub mod exhaustive;
pub mod result;

pub use clustercomplete::{clustercomplete, clustercomplete_with_stats, CcStats, ClusterCompleteParams};
pub use exhaustive::{exhaustive_ground_state_simulation, EXHAUSTIVE_SIDB_LIMIT};
pub use result::SimulationResult;
