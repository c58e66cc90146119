// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Multiset charge configurations and their compositions.

use std::ops::{Add, AddAssign, Sub, SubAssign};

use indexmap::IndexMap;
use smallvec::SmallVec;

use super::ClusterId;
use crate::bounds::CompleteBoundStore;
use crate::physics::ChargeState;

/// Unordered charge assignment of a cluster: the number of negative and
/// positive SiDBs packed as `(neg << 32) | pos`. The neutral count follows
/// from the cluster size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChargeMultiset(u64);

impl ChargeMultiset {
    pub const EMPTY: ChargeMultiset = ChargeMultiset(0);

    #[inline]
    pub fn new(neg_count: u32, pos_count: u32) -> Self {
        ChargeMultiset(((neg_count as u64) << 32) | pos_count as u64)
    }

    /// The multiset `{cs}` of a singleton cluster.
    #[inline]
    pub fn singleton(cs: ChargeState) -> Self {
        match cs {
            ChargeState::Negative => Self::new(1, 0),
            ChargeState::Neutral => Self::EMPTY,
            ChargeState::Positive => Self::new(0, 1),
        }
    }

    #[inline]
    pub fn neg_count(self) -> u64 {
        self.0 >> 32
    }

    #[inline]
    pub fn pos_count(self) -> u64 {
        self.0 & 0xffff_ffff
    }

    #[inline]
    pub fn neutral_count(self, cluster_size: usize) -> u64 {
        let charged = self.neg_count() + self.pos_count();
        assert!(
            charged <= cluster_size as u64,
            "multiset {} does not fit a cluster of {} SiDBs",
            self,
            cluster_size
        );
        cluster_size as u64 - charged
    }

    #[inline]
    pub fn count(self, cs: ChargeState, cluster_size: usize) -> u64 {
        match cs {
            ChargeState::Negative => self.neg_count(),
            ChargeState::Neutral => self.neutral_count(cluster_size),
            ChargeState::Positive => self.pos_count(),
        }
    }

    /// Charge state of a singleton cluster carrying this multiset.
    pub fn singleton_charge_state(self) -> ChargeState {
        match (self.neg_count(), self.pos_count()) {
            (1, 0) => ChargeState::Negative,
            (0, 1) => ChargeState::Positive,
            (0, 0) => ChargeState::Neutral,
            _ => panic!("multiset {} is not a singleton charge state", self),
        }
    }
}

impl Add for ChargeMultiset {
    type Output = ChargeMultiset;

    #[inline]
    fn add(self, rhs: ChargeMultiset) -> ChargeMultiset {
        ChargeMultiset::new(
            (self.neg_count() + rhs.neg_count()) as u32,
            (self.pos_count() + rhs.pos_count()) as u32,
        )
    }
}

impl AddAssign for ChargeMultiset {
    #[inline]
    fn add_assign(&mut self, rhs: ChargeMultiset) {
        *self = *self + rhs;
    }
}

impl Sub for ChargeMultiset {
    type Output = ChargeMultiset;

    #[inline]
    fn sub(self, rhs: ChargeMultiset) -> ChargeMultiset {
        assert!(
            self.neg_count() >= rhs.neg_count() && self.pos_count() >= rhs.pos_count(),
            "multiset difference {} - {} is undefined",
            self,
            rhs
        );
        ChargeMultiset::new(
            (self.neg_count() - rhs.neg_count()) as u32,
            (self.pos_count() - rhs.pos_count()) as u32,
        )
    }
}

impl SubAssign for ChargeMultiset {
    #[inline]
    fn sub_assign(&mut self, rhs: ChargeMultiset) {
        *self = *self - rhs;
    }
}

impl std::iter::Sum for ChargeMultiset {
    fn sum<I: Iterator<Item = ChargeMultiset>>(iter: I) -> Self {
        iter.fold(ChargeMultiset::EMPTY, |acc, m| acc + m)
    }
}

impl std::fmt::Display for ChargeMultiset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{-:{}, +:{}}}", self.neg_count(), self.pos_count())
    }
}

/// A cluster assumed to carry a particular multiset charge configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProjectorState {
    pub cluster: ClusterId,
    pub multiset: ChargeMultiset,
}

impl ProjectorState {
    #[inline]
    pub fn new(cluster: ClusterId, multiset: ChargeMultiset) -> Self {
        Self { cluster, multiset }
    }
}

/// One way of composing a parent multiset from one charge space element per
/// child, with potential bounds specific to this combination.
///
/// `pot_bounds` covers every SiDB of the layout once the parent has itself
/// been merged: entries inside the parent are filled when the composition is
/// verified, entries outside when the parent's charge space becomes final.
#[derive(Debug, Clone, Default)]
pub struct ChargeSpaceComposition {
    pub proj_states: SmallVec<[ProjectorState; 2]>,
    pub pot_bounds: CompleteBoundStore,
}

impl ChargeSpaceComposition {
    /// Multiset sum of the children's configurations.
    pub fn multiset(&self) -> ChargeMultiset {
        self.proj_states.iter().map(|pst| pst.multiset).sum()
    }
}

/// Charge space of a cluster: each admissible multiset with the compositions
/// that realise it. Singleton entries carry no compositions.
pub type ChargeSpace = IndexMap<ChargeMultiset, Vec<ChargeSpaceComposition>>;
