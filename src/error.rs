// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Errors surfaced by the public simulation entry points.
//!
//! Only invalid input is reported through [`SimulationError`]. Broken
//! internal invariants of the ground state space or its unfolding are bugs
//! and trip assertions instead.

#[derive(Debug, Clone, PartialEq)]
pub enum SimulationError {
    /// The layout contains no SiDBs.
    EmptyLayout,
    /// A physical or algorithmic parameter is out of range.
    InvalidParameter(String),
    /// The requested simulation would enumerate an intractable search space.
    TooManySidbs { num_sidbs: usize, limit: usize },
    /// A referenced SiDB index does not exist in the layout.
    UnknownSidb(usize),
    /// The worker thread pool could not be created.
    ThreadPool(String),
    Io(String),
    Parse(String),
}

impl std::fmt::Display for SimulationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimulationError::EmptyLayout => write!(f, "layout contains no SiDBs"),
            SimulationError::InvalidParameter(msg) => write!(f, "invalid parameter: {}", msg),
            SimulationError::TooManySidbs { num_sidbs, limit } => write!(
                f,
                "layout has {} SiDBs, exhaustive enumeration is limited to {}",
                num_sidbs, limit
            ),
            SimulationError::UnknownSidb(ix) => write!(f, "no SiDB with index {}", ix),
            SimulationError::ThreadPool(msg) => write!(f, "cannot start worker threads: {}", msg),
            SimulationError::Io(msg) => write!(f, "I/O error: {}", msg),
            SimulationError::Parse(msg) => write!(f, "parse error: {}", msg),
        }
    }
}

impl std::error::Error for SimulationError {}

impl From<std::io::Error> for SimulationError {
    fn from(e: std::io::Error) -> Self {
        SimulationError::Io(e.to_string())
    }
}

impl From<rayon::ThreadPoolBuildError> for SimulationError {
    fn from(e: rayon::ThreadPoolBuildError) -> Self {
        SimulationError::ThreadPool(e.to_string())
    }
}

impl From<serde_json::Error> for SimulationError {
    fn from(e: serde_json::Error) -> Self {
        SimulationError::Parse(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(SimulationError::EmptyLayout.to_string(), "layout contains no SiDBs");
        let e = SimulationError::TooManySidbs { num_sidbs: 30, limit: 24 };
        assert!(e.to_string().contains("30"));
        assert!(e.to_string().contains("24"));
    }

    #[test]
    fn test_from_json_error() {
        let err = serde_json::from_str::<u32>("not json").unwrap_err();
        let e: SimulationError = err.into();
        assert!(matches!(e, SimulationError::Parse(_)));
    }
}
