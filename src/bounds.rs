// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Potential bound arithmetic.
//!
//! Bounds are kept on the *received* potential `U = -V` at an SiDB, the
//! potential energy an electron sees there. A negative charge projects `+v`
//! onto its neighbours, a positive one `-v`.
//!
//! The two bound directions are zero-sized tags so that lower and upper bound
//! bookkeeping share one generic implementation:
//!
//! | direction | domain      | meet | top  |
//! |-----------|-------------|------|------|
//! | [`Lower`] | (-inf, inf] | min  | +inf |
//! | [`Upper`] | [-inf, inf) | max  | -inf |

use std::ops::{AddAssign, SubAssign};

use indexmap::IndexMap;

use crate::physics::{SimulationParameters, POP_STABILITY_ERR};

/// Compile-time tag selecting the lower or upper potential bound.
pub trait BoundDirection: Copy + Default + std::fmt::Debug + Send + Sync + 'static {
    /// Slot of this bound in a `[lower, upper]` pair.
    const SLOT: usize;

    /// Whether the extreme in this direction is the smallest value.
    const FROM_FRONT: bool;

    /// Identity of [`BoundDirection::meet`].
    fn top() -> f64;

    /// Greatest lower bound in this direction's order.
    fn meet(a: f64, b: f64) -> f64;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Lower;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Upper;

impl BoundDirection for Lower {
    const SLOT: usize = 0;
    const FROM_FRONT: bool = true;

    #[inline]
    fn top() -> f64 {
        f64::INFINITY
    }

    #[inline]
    fn meet(a: f64, b: f64) -> f64 {
        a.min(b)
    }
}

impl BoundDirection for Upper {
    const SLOT: usize = 1;
    const FROM_FRONT: bool = false;

    #[inline]
    fn top() -> f64 {
        f64::NEG_INFINITY
    }

    #[inline]
    fn meet(a: f64, b: f64) -> f64 {
        a.max(b)
    }
}

#[inline]
pub fn take_meet<B: BoundDirection>(acc: &mut f64, value: f64) {
    *acc = B::meet(*acc, value);
}

/// Charge transition levels shifted by the stability error margin.
///
/// Every predicate answers "does this bound prove that charge state
/// impossible?". A `true` answer must never be given for a state that some
/// valid charge distribution realises.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PruningThresholds {
    bounds: [f64; 4],
}

impl PruningThresholds {
    pub fn new(params: &SimulationParameters) -> Self {
        let mu_minus = params.mu_minus;
        let mu_plus = params.mu_plus();
        Self {
            bounds: [
                POP_STABILITY_ERR - mu_minus,
                -POP_STABILITY_ERR - mu_minus,
                POP_STABILITY_ERR - mu_plus,
                -POP_STABILITY_ERR - mu_plus,
            ],
        }
    }

    /// `U > e - mu-`
    #[inline]
    pub fn fails_negative(&self, lower: f64) -> bool {
        lower > self.bounds[0]
    }

    /// `U < -e - mu-`
    #[inline]
    pub fn ub_fails_neutral(&self, upper: f64) -> bool {
        upper < self.bounds[1]
    }

    /// `U > e - mu+`
    #[inline]
    pub fn lb_fails_neutral(&self, lower: f64) -> bool {
        lower > self.bounds[2]
    }

    /// `U < -e - mu+`
    #[inline]
    pub fn fails_positive(&self, upper: f64) -> bool {
        upper < self.bounds[3]
    }

    #[inline]
    pub fn admits_negative(&self, lower: f64) -> bool {
        !self.fails_negative(lower)
    }

    #[inline]
    pub fn admits_neutral(&self, lower: f64, upper: f64) -> bool {
        !self.ub_fails_neutral(upper) && !self.lb_fails_neutral(lower)
    }

    #[inline]
    pub fn admits_positive(&self, upper: f64) -> bool {
        !self.fails_positive(upper)
    }
}

/// Potential bounds for every SiDB of the layout, indexed by SiDB.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompleteBoundStore {
    bounds: Vec<[f64; 2]>,
}

impl CompleteBoundStore {
    /// All bounds `(0, 0)`.
    pub fn zeroed(num_sidbs: usize) -> Self {
        Self {
            bounds: vec![[0.0; 2]; num_sidbs],
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    #[inline]
    pub fn get<B: BoundDirection>(&self, sidb: usize) -> f64 {
        self.bounds[sidb][B::SLOT]
    }

    #[inline]
    pub fn get_pair(&self, sidb: usize) -> (f64, f64) {
        let [lb, ub] = self.bounds[sidb];
        (lb, ub)
    }

    #[inline]
    pub fn set(&mut self, sidb: usize, lower: f64, upper: f64) {
        self.bounds[sidb] = [lower, upper];
    }

    #[inline]
    pub fn update(&mut self, sidb: usize, lower_diff: f64, upper_diff: f64) {
        let b = &mut self.bounds[sidb];
        b[0] += lower_diff;
        b[1] += upper_diff;
    }

    #[inline]
    pub fn update_bound<B: BoundDirection>(&mut self, sidb: usize, diff: f64) {
        self.bounds[sidb][B::SLOT] += diff;
    }
}

impl AddAssign<&CompleteBoundStore> for CompleteBoundStore {
    fn add_assign(&mut self, other: &CompleteBoundStore) {
        debug_assert_eq!(self.len(), other.len());
        for (a, b) in self.bounds.iter_mut().zip(&other.bounds) {
            a[0] += b[0];
            a[1] += b[1];
        }
    }
}

impl SubAssign<&CompleteBoundStore> for CompleteBoundStore {
    fn sub_assign(&mut self, other: &CompleteBoundStore) {
        debug_assert_eq!(self.len(), other.len());
        for (a, b) in self.bounds.iter_mut().zip(&other.bounds) {
            a[0] -= b[0];
            a[1] -= b[1];
        }
    }
}

/// Potential bounds for a subset of SiDBs, e.g. those inside one cluster.
/// Absent SiDBs read as `(0, 0)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialBoundStore {
    bounds: IndexMap<usize, [f64; 2]>,
}

impl PartialBoundStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get<B: BoundDirection>(&self, sidb: usize) -> f64 {
        self.bounds.get(&sidb).map_or(0.0, |b| b[B::SLOT])
    }

    #[inline]
    pub fn get_pair(&self, sidb: usize) -> (f64, f64) {
        self.bounds.get(&sidb).map_or((0.0, 0.0), |b| (b[0], b[1]))
    }

    pub fn set(&mut self, sidb: usize, lower: f64, upper: f64) {
        self.bounds.insert(sidb, [lower, upper]);
    }

    pub fn update_bound<B: BoundDirection>(&mut self, sidb: usize, diff: f64) {
        self.bounds.entry(sidb).or_insert([0.0; 2])[B::SLOT] += diff;
    }

    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f64, f64)> + '_ {
        self.bounds.iter().map(|(&i, b)| (i, b[0], b[1]))
    }
}
