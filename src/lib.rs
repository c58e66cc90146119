// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! sidbsim: exact physical simulation of silicon dangling bond (SiDB) layouts.
//!
//! The ground state of an SiDB layout is found by ClusterComplete: a
//! hierarchical clustering of the SiDBs is pruned bottom-up into the Ground
//! State Space, the set of charge multisets per cluster that survive potential
//! bound analysis, which is then unfolded top-down into every physically valid
//! charge distribution.
//!
//! # Pipeline
//!
//! ```text
//! SidbLayout (JSON)
//!   → PotentialLandscape  (layout: pairwise and external potentials)
//!   → ClusterHierarchy    (cluster: agglomerative clustering of SiDB positions)
//!   → Ground State Space  (ground_state_space: bound-pruned charge spaces)
//!   → unfolding           (sim::clustercomplete: work-stealing thread pool)
//!   → SimulationResult    (sim::result: valid charge distributions)
//! ```
//!
//! # Key modules
//!
//! - [`physics`]: charge states, simulation parameters, screened Coulomb potential
//! - [`layout`]: SiDB layouts, defects, potential landscape and charge distributions
//! - [`bounds`]: lower/upper potential bound stores and pruning thresholds
//! - [`cluster`]: cluster hierarchy, charge multisets and potential projection orders
//! - [`witness`]: validity witness partitioning used by the potential bound analysis
//! - [`ground_state_space`]: bottom-up construction of the Ground State Space
//! - [`sim`]: ClusterComplete and the exhaustive reference simulation

pub mod error;

pub mod physics;

pub mod layout;

pub mod bounds;

pub mod cluster;

pub mod witness;

pub mod ground_state_space;

pub mod sim;
