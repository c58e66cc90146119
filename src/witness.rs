// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Potential bound analysis of a multiset charge configuration.
//!
//! Every SiDB of a cluster is a *witness* of each charge state its received
//! potential bounds do not rule out. A configuration with `n-` negative,
//! `n+` positive and `n0` neutral charges needs at least that many witnesses
//! of each state, and a stronger test asks whether the witnesses can be
//! partitioned so that every requirement is met by distinct SiDBs. The
//! partitioning question is solved by backtracking, bounded by
//! [`WitnessLimits`].

use std::collections::BTreeSet;

use crate::bounds::PruningThresholds;
use crate::cluster::ChargeMultiset;

/// Problem size limits for validity witness partitioning. Above either limit
/// only the witness counts are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WitnessLimits {
    pub max_cluster_size: usize,
    pub max_overlapping_witnesses: usize,
}

type WitnessSet = BTreeSet<usize>;

#[derive(Debug, Default)]
struct WitnessPartitioning {
    negative: WitnessSet,
    positive: WitnessSet,
    neutral: WitnessSet,
    required_neg: usize,
    required_pos: usize,
    required_neut: usize,
}

impl WitnessPartitioning {
    fn counts_suffice(&self) -> bool {
        self.negative.len() >= self.required_neg
            && self.positive.len() >= self.required_pos
            && self.neutral.len() >= self.required_neut
    }

    /// Drops witnesses of exactly one charge state, which can be assigned to
    /// that state without loss. Returns `None` if a state has more free
    /// witnesses than it requires, which no assignment of the whole cluster
    /// can accommodate, otherwise the number of SiDBs left that witness more
    /// than one state.
    fn omit_free_witnesses(&mut self) -> Option<usize> {
        fn omit(this: &mut WitnessSet, required: &mut usize, a: &WitnessSet, b: &WitnessSet) -> bool {
            let before = this.len();
            this.retain(|w| a.contains(w) || b.contains(w));
            let free = before - this.len();
            if free > *required {
                return false;
            }
            *required -= free;
            true
        }

        let ok = omit(&mut self.negative, &mut self.required_neg, &self.positive, &self.neutral)
            && omit(&mut self.positive, &mut self.required_pos, &self.negative, &self.neutral)
            && omit(&mut self.neutral, &mut self.required_neut, &self.negative, &self.positive);
        if !ok {
            return None;
        }

        let overlap: WitnessSet = self
            .negative
            .iter()
            .chain(&self.positive)
            .chain(&self.neutral)
            .copied()
            .collect();
        Some(overlap.len())
    }

    /// Searches for disjoint witness subsets meeting every requirement.
    fn find_partitioning(&self) -> bool {
        let negative: Vec<usize> = self.negative.iter().copied().collect();
        let mut taken = WitnessSet::new();
        self.fill_negative(&negative, 0, self.required_neg, &mut taken)
    }

    fn fill_negative(&self, candidates: &[usize], from: usize, left: usize, taken: &mut WitnessSet) -> bool {
        if left == 0 {
            let positive: Vec<usize> = self.positive.difference(taken).copied().collect();
            return self.fill_positive(&positive, 0, self.required_pos, taken);
        }
        for k in from..candidates.len() {
            if candidates.len() - k < left {
                break;
            }
            taken.insert(candidates[k]);
            if self.fill_negative(candidates, k + 1, left - 1, taken) {
                return true;
            }
            taken.remove(&candidates[k]);
        }
        false
    }

    fn fill_positive(&self, candidates: &[usize], from: usize, left: usize, taken: &mut WitnessSet) -> bool {
        if left == 0 {
            return self.neutral.difference(taken).count() >= self.required_neut;
        }
        for k in from..candidates.len() {
            if candidates.len() - k < left {
                break;
            }
            taken.insert(candidates[k]);
            if self.fill_positive(candidates, k + 1, left - 1, taken) {
                return true;
            }
            taken.remove(&candidates[k]);
        }
        false
    }
}

/// Decides whether a cluster with the given SiDBs may take on multiset `m`.
///
/// `received` yields the lower and upper bound on the total received
/// potential at a contained SiDB. Returns `false` only if the bounds prove
/// that no assignment of `m` to the SiDBs is population stable.
pub fn potential_bound_analysis(
    thresholds: &PruningThresholds,
    limits: &WitnessLimits,
    sidbs: &[usize],
    m: ChargeMultiset,
    mut received: impl FnMut(usize) -> (f64, f64),
) -> bool {
    let mut st = WitnessPartitioning {
        required_neg: m.neg_count() as usize,
        required_pos: m.pos_count() as usize,
        required_neut: m.neutral_count(sidbs.len()) as usize,
        ..Default::default()
    };

    for &i in sidbs {
        let (lb, ub) = received(i);
        if st.required_neg != 0 && thresholds.admits_negative(lb) {
            st.negative.insert(i);
        }
        if st.required_pos != 0 && thresholds.admits_positive(ub) {
            st.positive.insert(i);
        }
        if st.required_neut != 0 && thresholds.admits_neutral(lb, ub) {
            st.neutral.insert(i);
        }
    }

    if !st.counts_suffice() {
        return false;
    }

    if sidbs.len() > limits.max_cluster_size {
        return true;
    }

    match st.omit_free_witnesses() {
        None => false,
        Some(overlap) if overlap > limits.max_overlapping_witnesses => true,
        Some(_) => st.find_partitioning(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::SimulationParameters;

    const UNLIMITED: WitnessLimits = WitnessLimits {
        max_cluster_size: usize::MAX,
        max_overlapping_witnesses: usize::MAX,
    };

    const DISABLED: WitnessLimits = WitnessLimits {
        max_cluster_size: 0,
        max_overlapping_witnesses: 0,
    };

    fn thresholds() -> PruningThresholds {
        PruningThresholds::new(&SimulationParameters::new(3, -0.32))
    }

    // received potentials admitting exactly one charge state (mu- = -0.32)
    const ONLY_NEG: (f64, f64) = (0.0, 0.0);
    const ONLY_NEUT: (f64, f64) = (0.5, 0.5);
    const ONLY_POS: (f64, f64) = (1.0, 1.0);
    const NEG_OR_NEUT: (f64, f64) = (0.0, 0.5);
    const ANY: (f64, f64) = (0.0, 1.0);

    fn analyze(limits: &WitnessLimits, recv: &[(f64, f64)], m: ChargeMultiset) -> bool {
        let sidbs: Vec<usize> = (0..recv.len()).collect();
        potential_bound_analysis(&thresholds(), limits, &sidbs, m, |i| recv[i])
    }

    #[test]
    fn test_threshold_fixtures() {
        let t = thresholds();
        assert!(t.admits_negative(ONLY_NEG.0) && !t.admits_neutral(ONLY_NEG.0, ONLY_NEG.1));
        assert!(!t.admits_negative(ONLY_NEUT.0) && t.admits_neutral(ONLY_NEUT.0, ONLY_NEUT.1));
        assert!(!t.admits_positive(ONLY_NEUT.1));
        assert!(t.admits_positive(ONLY_POS.1) && !t.admits_neutral(ONLY_POS.0, ONLY_POS.1));
    }

    #[test]
    fn test_witness_counts() {
        let recv = [ONLY_NEG, ONLY_NEUT];
        assert!(analyze(&DISABLED, &recv, ChargeMultiset::new(1, 0)));
        assert!(!analyze(&DISABLED, &recv, ChargeMultiset::new(2, 0)));
        assert!(!analyze(&DISABLED, &recv, ChargeMultiset::new(0, 0)));
        assert!(!analyze(&DISABLED, &recv, ChargeMultiset::new(1, 1)));
    }

    #[test]
    fn test_partitioning_rejects_shared_witness() {
        // both states are witnessed, but only by the same SiDB
        let recv = [NEG_OR_NEUT, ONLY_POS];
        let m = ChargeMultiset::new(1, 0);
        assert!(analyze(&DISABLED, &recv, m));
        assert!(!analyze(&UNLIMITED, &recv, m));
    }

    #[test]
    fn test_free_witness_overflow() {
        // two SiDBs that can only be neutral cannot host a single neutral charge
        let recv = [ONLY_NEUT, ONLY_NEUT, ANY];
        assert!(!analyze(&UNLIMITED, &recv, ChargeMultiset::new(1, 1)));
        assert!(analyze(&UNLIMITED, &recv, ChargeMultiset::new(1, 0)));
    }

    #[test]
    fn test_partitioning_with_overlap() {
        let recv = [ANY, ANY, NEG_OR_NEUT];
        assert!(analyze(&UNLIMITED, &recv, ChargeMultiset::new(1, 1)));
        assert!(analyze(&UNLIMITED, &recv, ChargeMultiset::new(2, 1)));
        assert!(!analyze(&UNLIMITED, &recv, ChargeMultiset::new(0, 3)));
    }

    #[test]
    fn test_overlap_limit_skips_search() {
        let recv = [NEG_OR_NEUT, ONLY_POS];
        let m = ChargeMultiset::new(1, 0);
        let limits = WitnessLimits {
            max_cluster_size: usize::MAX,
            max_overlapping_witnesses: 0,
        };
        assert!(analyze(&limits, &recv, m));
    }
}
