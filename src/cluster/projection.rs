// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Potential projections and their ordered collections.
//!
//! A potential projection is the received potential (see [`crate::bounds`])
//! that a cluster in a given multiset charge configuration contributes at one
//! SiDB. Each cluster keeps one [`PotentialProjectionOrder`] per receiving
//! SiDB, from which bounds over the whole charge space, or over a single
//! multiset, are read off the two ends.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::ops::{Add, AddAssign};

use super::multiset::ChargeMultiset;
use crate::bounds::BoundDirection;
use crate::physics::{charge_states, ChargeState};

#[derive(Debug, Clone, Copy)]
pub struct PotentialProjection {
    pub pot_val: f64,
    pub multiset: ChargeMultiset,
}

impl PotentialProjection {
    #[inline]
    pub fn new(pot_val: f64, multiset: ChargeMultiset) -> Self {
        Self { pot_val, multiset }
    }
}

impl Default for PotentialProjection {
    fn default() -> Self {
        Self::new(0.0, ChargeMultiset::EMPTY)
    }
}

impl Add for PotentialProjection {
    type Output = PotentialProjection;

    #[inline]
    fn add(self, rhs: PotentialProjection) -> PotentialProjection {
        PotentialProjection::new(self.pot_val + rhs.pot_val, self.multiset + rhs.multiset)
    }
}

impl AddAssign for PotentialProjection {
    #[inline]
    fn add_assign(&mut self, rhs: PotentialProjection) {
        *self = *self + rhs;
    }
}

impl Ord for PotentialProjection {
    fn cmp(&self, other: &Self) -> Ordering {
        self.pot_val
            .total_cmp(&other.pot_val)
            .then(self.multiset.cmp(&other.multiset))
    }
}

impl PartialOrd for PotentialProjection {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for PotentialProjection {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PotentialProjection {}

/// Potential projections from one cluster onto one SiDB, ordered by value.
#[derive(Debug, Clone, Default)]
pub struct PotentialProjectionOrder {
    order: BTreeSet<PotentialProjection>,
}

impl PotentialProjectionOrder {
    /// Projection of a singleton onto its own SiDB: the local external
    /// received potential, independent of the charge state.
    pub fn self_projection(ext_received_pot: f64, base: u8) -> Self {
        Self {
            order: charge_states(base)
                .iter()
                .map(|&cs| PotentialProjection::new(ext_received_pot, ChargeMultiset::singleton(cs)))
                .collect(),
        }
    }

    /// Projection of a singleton onto another SiDB at chargeless potential
    /// `inter_sidb_pot`.
    pub fn inter_sidb(inter_sidb_pot: f64, base: u8) -> Self {
        Self {
            order: charge_states(base)
                .iter()
                .map(|&cs| {
                    let v = match cs {
                        ChargeState::Negative => inter_sidb_pot,
                        ChargeState::Neutral => 0.0,
                        ChargeState::Positive => -inter_sidb_pot,
                    };
                    PotentialProjection::new(v, ChargeMultiset::singleton(cs))
                })
                .collect(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PotentialProjection> + '_ {
        self.order.iter()
    }

    /// First projection satisfying `pred`, scanning from the extreme in
    /// direction `B`.
    #[inline]
    fn find_from_bound<B: BoundDirection>(
        &self,
        pred: impl FnMut(&&PotentialProjection) -> bool,
    ) -> Option<&PotentialProjection> {
        if B::FROM_FRONT {
            self.order.iter().find(pred)
        } else {
            self.order.iter().rev().find(pred)
        }
    }

    /// Extreme projection in direction `B`, if any.
    #[inline]
    pub fn bound<B: BoundDirection>(&self) -> Option<PotentialProjection> {
        if B::FROM_FRONT {
            self.order.first().copied()
        } else {
            self.order.last().copied()
        }
    }

    /// Value of [`Self::bound`]; an empty order yields the top element.
    #[inline]
    pub fn bound_value<B: BoundDirection>(&self) -> f64 {
        self.bound::<B>().map_or_else(B::top, |pp| pp.pot_val)
    }

    /// The bound that would remain once every projection of the current
    /// bounding multiset is removed.
    pub fn next_bound<B: BoundDirection>(&self) -> Option<PotentialProjection> {
        let bound_m = self.bound::<B>()?.multiset;
        self.find_from_bound::<B>(|pp| pp.multiset != bound_m).copied()
    }

    /// Extreme projection in direction `B` among those of multiset `m`.
    pub fn bound_for_multiset<B: BoundDirection>(&self, m: ChargeMultiset) -> Option<f64> {
        self.find_from_bound::<B>(|pp| pp.multiset == m)
            .map(|pp| pp.pot_val)
    }

    /// Like [`Self::bound_for_multiset`], for multisets known to be present.
    pub fn get_for_multiset<B: BoundDirection>(&self, m: ChargeMultiset) -> f64 {
        match self.bound_for_multiset::<B>(m) {
            Some(v) => v,
            None => panic!("no potential projection recorded for multiset {}", m),
        }
    }

    /// Change to the accumulated bound in direction `B` if multiset `m` were
    /// removed, or `None` if `m` does not form that bound.
    pub fn bound_shift_on_removal<B: BoundDirection>(&self, m: ChargeMultiset) -> Option<f64> {
        let cur = self.bound::<B>()?;
        if cur.multiset != m {
            return None;
        }
        let next = self.next_bound::<B>().map_or_else(B::top, |pp| pp.pot_val);
        Some(next - cur.pot_val)
    }

    pub fn remove_multiset(&mut self, m: ChargeMultiset) {
        self.order.retain(|pp| pp.multiset != m);
    }

    #[inline]
    pub fn add(&mut self, pp: PotentialProjection) {
        self.order.insert(pp);
    }
}
