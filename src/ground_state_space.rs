// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Ground State Space construction.
//!
//! Starting from a clustering of all singletons, the charge spaces of the
//! clusters in the clustering are pruned by potential bound analysis until a
//! fixed point is reached. Then the smallest pending parent replaces its
//! children in the clustering: every combination of one charge space element
//! per child is verified with composition-specific bounds, and the surviving
//! combinations form the parent's charge space. This repeats until only the
//! top cluster remains.
//!
//! Whenever a multiset is pruned, the bounds that other clusters receive
//! from the pruned cluster tighten, which may in turn prune more multisets
//! elsewhere. Pruning only ever removes multisets that no population stable
//! charge distribution can realise.
//!
//! ```text
//! singletons ─┬─> update until fixed point ─> merge smallest parent ─┐
//!             │                                                    │
//!             └──────────── not a fixed point <── update others <──┘
//! ```

use std::cell::Cell;
use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::bounds::{take_meet, BoundDirection, CompleteBoundStore, Lower, PruningThresholds, Upper};
use crate::cluster::{
    ChargeMultiset, ChargeSpace, ChargeSpaceComposition, Cluster, ClusterHierarchy, ClusterId, Linkage,
    PotentialProjection, ProjectorState,
};
use crate::error::SimulationError;
use crate::layout::{PotentialLandscape, SidbLayout};
use crate::physics::SimulationParameters;
use crate::witness::{potential_bound_analysis, WitnessLimits};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundStateSpaceParams {
    pub simulation_parameters: SimulationParameters,
    /// Largest cluster for which validity witness partitioning is solved.
    pub witness_partitioning_max_cluster_size: usize,
    /// Largest number of overlapping witnesses for which validity witness
    /// partitioning is solved.
    pub num_overlapping_witnesses_limit: usize,
    pub linkage: Linkage,
}

impl Default for GroundStateSpaceParams {
    fn default() -> Self {
        Self {
            simulation_parameters: SimulationParameters::default(),
            witness_partitioning_max_cluster_size: 12,
            num_overlapping_witnesses_limit: 6,
            linkage: Linkage::default(),
        }
    }
}

impl GroundStateSpaceParams {
    fn witness_limits(&self) -> WitnessLimits {
        WitnessLimits {
            max_cluster_size: self.witness_partitioning_max_cluster_size,
            max_overlapping_witnesses: self.num_overlapping_witnesses_limit,
        }
    }
}

/// Counters collected during one construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GssStats {
    pub potential_bound_analyses: u64,
    pub pruned_multisets: u64,
    pub rejected_compositions: u64,
    pub merges: u64,
    pub update_passes: u64,
}

#[derive(Debug, Clone)]
pub struct GroundStateSpaceResult {
    /// The pruned hierarchy. The charge space of its top cluster is empty if
    /// the layout admits no population stable charge distribution.
    pub hierarchy: ClusterHierarchy,
    pub runtime: Duration,
    /// Number of multisets of `N` charges in the simulation base.
    pub maximum_top_level_multisets: u64,
    /// Projector states stored in the compositions of the hierarchy.
    pub projector_state_count: u64,
    pub stats: GssStats,
}

impl GroundStateSpaceResult {
    #[inline]
    pub fn top_cluster(&self) -> &Cluster {
        self.hierarchy.top_cluster()
    }

    pub fn top_level_multisets(&self) -> usize {
        self.top_cluster().charge_space.len()
    }

    pub fn report(&self) {
        clilog::info!(
            "Leaving {} out of {} top level multiset charge configurations",
            self.top_level_multisets(),
            self.maximum_top_level_multisets
        );
        clilog::info!(
            "There are {} projector states in the constructed hierarchy",
            self.projector_state_count
        );
        let secs = self.runtime.as_secs_f64();
        if secs > 1.0 {
            clilog::info!("Ground State Space took {:.4} seconds", secs);
        } else {
            clilog::info!("Ground State Space took {:.4} milliseconds", secs * 1000.0);
        }
        clilog::debug!("Ground State Space statistics: {:?}", self.stats);
    }
}

/// Size of the charge space of a cluster of `num_sidbs` SiDBs before any
/// pruning, `C(N + base - 1, base - 1)`.
pub fn maximum_top_level_multisets(num_sidbs: usize, base: u8) -> u64 {
    let n = num_sidbs as u64;
    if base == 3 {
        (n + 1) * (n + 2) / 2
    } else {
        n + 1
    }
}

/// Constructs the Ground State Space of `layout`.
pub fn ground_state_space(
    layout: &SidbLayout,
    params: &GroundStateSpaceParams,
) -> Result<GroundStateSpaceResult, SimulationError> {
    let landscape = PotentialLandscape::new(layout, &params.simulation_parameters)?;
    ground_state_space_with_landscape(&landscape, params)
}

/// Constructs the Ground State Space over precomputed electrostatics, which
/// carry the external potentials to take into account. The physical
/// parameters of `landscape` are used.
pub fn ground_state_space_with_landscape(
    landscape: &PotentialLandscape,
    params: &GroundStateSpaceParams,
) -> Result<GroundStateSpaceResult, SimulationError> {
    let start = Instant::now();
    let timer = clilog::stimer!("ground state space");

    let hierarchy = ClusterHierarchy::new(landscape, params.linkage)?;
    let num_sidbs = hierarchy.num_sidbs();
    let construction = GroundStateSpace::new(landscape, params.witness_limits(), hierarchy);
    let (hierarchy, projector_state_count, stats) = construction.run();

    clilog::finish!(timer);
    Ok(GroundStateSpaceResult {
        hierarchy,
        runtime: start.elapsed(),
        maximum_top_level_multisets: maximum_top_level_multisets(num_sidbs, landscape.base()),
        projector_state_count,
        stats,
    })
}

struct GroundStateSpace {
    thresholds: PruningThresholds,
    limits: WitnessLimits,
    hierarchy: ClusterHierarchy,
    /// Current clustering, ordered by cluster id.
    clustering: BTreeSet<ClusterId>,
    projector_state_count: u64,
    analyses: Cell<u64>,
    stats: GssStats,
}

impl GroundStateSpace {
    fn new(landscape: &PotentialLandscape, limits: WitnessLimits, hierarchy: ClusterHierarchy) -> Self {
        Self {
            thresholds: PruningThresholds::new(landscape.params()),
            limits,
            clustering: (0..hierarchy.num_sidbs()).collect(),
            hierarchy,
            projector_state_count: 0,
            analyses: Cell::new(0),
            stats: GssStats::default(),
        }
    }

    fn run(mut self) -> (ClusterHierarchy, u64, GssStats) {
        let top = self.hierarchy.top();

        'construction: loop {
            while !self.update_charge_spaces(None) {}

            loop {
                if self.clustering.len() == 1 && self.clustering.contains(&top) {
                    break 'construction;
                }
                let Some(parent) = self.move_up_hierarchy() else {
                    clilog::debug!("no charge distribution survives merging, top charge space left empty");
                    break 'construction;
                };
                if !self.update_charge_spaces(Some(parent)) {
                    continue 'construction;
                }
            }
        }

        self.stats.potential_bound_analyses = self.analyses.get();
        (self.hierarchy, self.projector_state_count, self.stats)
    }

    fn parent_of(&self, c: ClusterId) -> ClusterId {
        match self.hierarchy.parent_of(c) {
            Some(p) => p,
            None => panic!("cluster {} in the clustering has no parent", c),
        }
    }

    /// One pass over the clustering. Returns `true` at a fixed point.
    fn update_charge_spaces(&mut self, skip: Option<ClusterId>) -> bool {
        self.stats.update_passes += 1;
        let pending: Vec<ClusterId> = self.clustering.iter().copied().filter(|&c| Some(c) != skip).collect();
        let mut fixpoint = true;
        for c in pending {
            fixpoint &= self.check_charge_space(c);
        }
        fixpoint
    }

    /// Prunes the charge space of `c`. Returns `true` if nothing was pruned.
    fn check_charge_space(&mut self, c: ClusterId) -> bool {
        let charge_space = &self.hierarchy.cluster(c).charge_space;
        if charge_space.len() <= 1 {
            return true;
        }

        let multisets: Vec<ChargeMultiset> = charge_space.keys().copied().collect();
        let mut removed = Vec::new();
        for m in multisets {
            if !self.analyze_multiset(c, m) {
                self.handle_invalid_state(c, m);
                removed.push(m);
            }
        }

        let cluster = self.hierarchy.cluster_mut(c);
        for m in &removed {
            cluster.charge_space.shift_remove(m);
        }
        self.stats.pruned_multisets += removed.len() as u64;
        removed.is_empty()
    }

    fn analyze_multiset(&self, c: ClusterId, m: ChargeMultiset) -> bool {
        self.analyses.set(self.analyses.get() + 1);
        let cluster = self.hierarchy.cluster(c);
        potential_bound_analysis(&self.thresholds, &self.limits, &cluster.sidbs, m, |i| {
            let (self_lb, self_ub) = cluster.projection_bounds(m, i);
            let (ext_lb, ext_ub) = cluster.received_ext_pot_bounds.get_pair(i);
            (self_lb + ext_lb, self_ub + ext_ub)
        })
    }

    /// Removes `m` of cluster `c` from its projections onto every other
    /// cluster, tightening their received bounds where `m` was a bound.
    fn handle_invalid_state(&mut self, c: ClusterId, m: ChargeMultiset) {
        let others: Vec<ClusterId> = self.clustering.iter().copied().filter(|&o| o != c).collect();
        for o in others {
            for k in 0..self.hierarchy.cluster(o).num_sidbs() {
                let i = self.hierarchy.cluster(o).sidbs[k];
                let order = &self.hierarchy.cluster(c).pot_projs[i];
                let lb_shift = order.bound_shift_on_removal::<Lower>(m);
                let ub_shift = order.bound_shift_on_removal::<Upper>(m);

                let received = &mut self.hierarchy.cluster_mut(o).received_ext_pot_bounds;
                if let Some(d) = lb_shift {
                    received.update_bound::<Lower>(i, d);
                }
                if let Some(d) = ub_shift {
                    received.update_bound::<Upper>(i, d);
                }
                self.hierarchy.cluster_mut(c).pot_projs[i].remove_multiset(m);
            }
        }
    }

    /// Replaces the children of the smallest pending parent by that parent.
    /// Returns `None` if the merged charge space is empty.
    fn move_up_hierarchy(&mut self) -> Option<ClusterId> {
        let parent = self
            .clustering
            .iter()
            .map(|&c| self.parent_of(c))
            .min_by_key(|&p| self.hierarchy.cluster(p).num_sidbs())?;
        let children = self.hierarchy.cluster(parent).children.clone();
        clilog::trace!(
            "merging {:?} into cluster {} of {} SiDBs",
            children,
            parent,
            self.hierarchy.cluster(parent).num_sidbs()
        );

        if children
            .iter()
            .any(|&c| self.hierarchy.cluster(c).charge_space.is_empty())
        {
            return None;
        }

        for c in &children {
            let present = self.clustering.remove(c);
            assert!(present, "child {} of cluster {} is not in the clustering", c, parent);
        }

        self.write_children_complete_stores(&children);
        self.projector_state_count += self.compose_external_bounds_of_saved_compositions(&children);
        self.derive_children_received_bounds_without_siblings(parent, &children);

        let charge_space = self.construct_merged_charge_space(parent, &children);
        if charge_space.is_empty() {
            return None;
        }
        self.hierarchy.cluster_mut(parent).charge_space = charge_space;

        self.construct_merged_potential_projections(parent, &children);
        self.compute_meets_for_internal_pot_bounds(parent);

        self.clustering.insert(parent);
        self.stats.merges += 1;
        Some(parent)
    }

    /// The charge spaces of merged children are final; flatten their
    /// projections into complete stores.
    fn write_children_complete_stores(&mut self, children: &[ClusterId]) {
        let n = self.hierarchy.num_sidbs();
        for &c in children {
            let cluster = self.hierarchy.cluster(c);
            let stores = cluster
                .charge_space
                .keys()
                .map(|&m| {
                    let mut store = CompleteBoundStore::zeroed(n);
                    for i in 0..n {
                        let (lb, ub) = cluster.projection_bounds(m, i);
                        store.set(i, lb, ub);
                    }
                    (m, store)
                })
                .collect();
            self.hierarchy.cluster_mut(c).complete_stores = stores;
        }
    }

    /// Completes the composition stores of the children with the bounds
    /// they project outside themselves. Returns the number of projector
    /// states thereby fixed in the hierarchy.
    fn compose_external_bounds_of_saved_compositions(&mut self, children: &[ClusterId]) -> u64 {
        let mut saved = 0;
        for &c in children {
            let mut charge_space = std::mem::take(&mut self.hierarchy.cluster_mut(c).charge_space);
            let cluster = self.hierarchy.cluster(c);
            for comps in charge_space.values_mut() {
                if comps.is_empty() {
                    saved += 1;
                    continue;
                }
                for comp in comps.iter_mut() {
                    for &j in &cluster.external_sidbs {
                        for pst in &comp.proj_states {
                            let (lb, ub) = self.hierarchy.cluster(pst.cluster).projection_bounds(pst.multiset, j);
                            comp.pot_bounds.update(j, lb, ub);
                        }
                    }
                    saved += comp.proj_states.len() as u64;
                }
            }
            self.hierarchy.cluster_mut(c).charge_space = charge_space;
        }
        saved
    }

    fn derive_children_received_bounds_without_siblings(&mut self, parent: ClusterId, children: &[ClusterId]) {
        for &c in children {
            for k in 0..self.hierarchy.cluster(c).num_sidbs() {
                let i = self.hierarchy.cluster(c).sidbs[k];
                let lb = self.received_without_siblings::<Lower>(c, children, i);
                let ub = self.received_without_siblings::<Upper>(c, children, i);
                self.hierarchy.cluster_mut(parent).received_ext_pot_bounds.set(i, lb, ub);
            }
        }
    }

    fn received_without_siblings<B: BoundDirection>(&self, c: ClusterId, children: &[ClusterId], i: usize) -> f64 {
        let received = self.hierarchy.cluster(c).received_ext_pot_bounds.get::<B>(i);
        children
            .iter()
            .filter(|&&s| s != c)
            .map(|&s| self.hierarchy.cluster(s).pot_projs[i].bound_value::<B>())
            .fold(received, |acc, v| acc - v)
    }

    /// Verifies every combination of one charge space element per child.
    fn construct_merged_charge_space(&mut self, parent: ClusterId, children: &[ClusterId]) -> ChargeSpace {
        let spaces: Vec<Vec<ChargeMultiset>> = children
            .iter()
            .map(|&c| self.hierarchy.cluster(c).charge_space.keys().copied().collect())
            .collect();

        let mut charge_space = ChargeSpace::new();
        let mut digits = vec![0usize; children.len()];
        loop {
            let proj_states = children
                .iter()
                .zip(&spaces)
                .zip(&digits)
                .map(|((&c, space), &d)| ProjectorState::new(c, space[d]))
                .collect();
            match self.verify_composition(parent, proj_states) {
                Some(comp) => charge_space.entry(comp.multiset()).or_default().push(comp),
                None => self.stats.rejected_compositions += 1,
            }

            // odometer, last child fastest
            let mut k = digits.len();
            loop {
                if k == 0 {
                    return charge_space;
                }
                k -= 1;
                digits[k] += 1;
                if digits[k] < spaces[k].len() {
                    break;
                }
                digits[k] = 0;
            }
        }
    }

    /// Analyses each child configuration of a candidate composition with the
    /// bounds specific to that composition.
    fn verify_composition(
        &self,
        parent: ClusterId,
        proj_states: smallvec::SmallVec<[ProjectorState; 2]>,
    ) -> Option<ChargeSpaceComposition> {
        let mut pot_bounds = CompleteBoundStore::zeroed(self.hierarchy.num_sidbs());
        let parent_received = &self.hierarchy.cluster(parent).received_ext_pot_bounds;

        for receiving in &proj_states {
            let receiving_cluster = self.hierarchy.cluster(receiving.cluster);
            for &i in &receiving_cluster.sidbs {
                let (mut lb, mut ub) = (0.0, 0.0);
                for pst in &proj_states {
                    let (l, u) = self.hierarchy.cluster(pst.cluster).projection_bounds(pst.multiset, i);
                    lb += l;
                    ub += u;
                }
                pot_bounds.set(i, lb, ub);
            }

            self.analyses.set(self.analyses.get() + 1);
            let admissible = potential_bound_analysis(
                &self.thresholds,
                &self.limits,
                &receiving_cluster.sidbs,
                receiving.multiset,
                |i| {
                    let (lb, ub) = pot_bounds.get_pair(i);
                    let (ext_lb, ext_ub) = parent_received.get_pair(i);
                    (lb + ext_lb, ub + ext_ub)
                },
            );
            if !admissible {
                return None;
            }
        }

        Some(ChargeSpaceComposition {
            proj_states,
            pot_bounds,
        })
    }

    /// Projections of the new parent onto every other cluster, and the
    /// resulting change in what those clusters receive.
    fn construct_merged_potential_projections(&mut self, parent: ClusterId, children: &[ClusterId]) {
        let others: Vec<ClusterId> = self.clustering.iter().copied().collect();
        for o in others {
            for k in 0..self.hierarchy.cluster(o).num_sidbs() {
                let i = self.hierarchy.cluster(o).sidbs[k];

                let mut projections = Vec::new();
                for (&m, comps) in &self.hierarchy.cluster(parent).charge_space {
                    for comp in comps {
                        let (mut lb, mut ub) = (0.0, 0.0);
                        for pst in &comp.proj_states {
                            let (l, u) = self.hierarchy.cluster(pst.cluster).projection_bounds(pst.multiset, i);
                            lb += l;
                            ub += u;
                        }
                        projections.push(PotentialProjection::new(lb, m));
                        projections.push(PotentialProjection::new(ub, m));
                    }
                }
                let order = &mut self.hierarchy.cluster_mut(parent).pot_projs[i];
                for pp in projections {
                    order.add(pp);
                }

                let lb_diff = self.projection_bound_diff::<Lower>(parent, children, i);
                let ub_diff = self.projection_bound_diff::<Upper>(parent, children, i);
                let received = &mut self.hierarchy.cluster_mut(o).received_ext_pot_bounds;
                received.update_bound::<Lower>(i, lb_diff);
                received.update_bound::<Upper>(i, ub_diff);
            }
        }
    }

    fn projection_bound_diff<B: BoundDirection>(&self, parent: ClusterId, children: &[ClusterId], i: usize) -> f64 {
        let parent_bound = self.hierarchy.cluster(parent).pot_projs[i].bound_value::<B>();
        children
            .iter()
            .map(|&c| self.hierarchy.cluster(c).pot_projs[i].bound_value::<B>())
            .fold(parent_bound, |acc, v| acc - v)
    }

    /// Flattens the composition bounds on the parent's own SiDBs into its
    /// self-projection.
    fn compute_meets_for_internal_pot_bounds(&mut self, parent: ClusterId) {
        let cluster = self.hierarchy.cluster(parent);
        let mut projections = Vec::with_capacity(2 * cluster.charge_space.len() * cluster.num_sidbs());
        for (&m, comps) in &cluster.charge_space {
            for &i in &cluster.sidbs {
                let mut lb_meet = Lower::top();
                let mut ub_meet = Upper::top();
                for comp in comps {
                    take_meet::<Lower>(&mut lb_meet, comp.pot_bounds.get::<Lower>(i));
                    take_meet::<Upper>(&mut ub_meet, comp.pot_bounds.get::<Upper>(i));
                }
                projections.push((i, PotentialProjection::new(lb_meet, m)));
                projections.push((i, PotentialProjection::new(ub_meet, m)));
            }
        }

        let cluster = self.hierarchy.cluster_mut(parent);
        for (i, pp) in projections {
            cluster.pot_projs[i].add(pp);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::ChargeState;

    fn params(base: u8, mu_minus: f64) -> GroundStateSpaceParams {
        GroundStateSpaceParams {
            simulation_parameters: SimulationParameters::new(base, mu_minus),
            ..Default::default()
        }
    }

    fn seven_dbs() -> SidbLayout {
        SidbLayout::new([
            (0, 0, 0),
            (2, 2, 0),
            (4, 1, 0),
            (0, 7, 0),
            (1, 6, 0),
            (6, 5, 1),
            (4, 8, 1),
        ])
    }

    #[test]
    fn test_single_sidb() {
        let layout = SidbLayout::new([(0, 0, 0)]);
        let res = ground_state_space(&layout, &params(3, -0.32)).unwrap();
        assert_eq!(res.maximum_top_level_multisets, 3);
        assert_eq!(res.hierarchy.top(), 1);
        let top = res.top_cluster();
        assert_eq!(top.charge_space.len(), 1);
        assert!(top
            .charge_space
            .contains_key(&ChargeMultiset::singleton(ChargeState::Negative)));
    }

    #[test]
    fn test_close_pair_base_2_is_infeasible() {
        // vertically adjacent SiDBs: neither can be negative next to the other,
        // and both neutral leaves each neutral with a negative-favouring level
        let layout = SidbLayout::new([(0, 0, 0), (0, 0, 1)]);
        let res = ground_state_space(&layout, &params(2, -0.32)).unwrap();
        assert_eq!(res.maximum_top_level_multisets, 3);
        assert!(res.top_cluster().charge_space.is_empty());
    }

    #[test]
    fn test_close_pair_base_3_is_pruned() {
        let layout = SidbLayout::new([(0, 0, 0), (0, 0, 1)]);
        let res = ground_state_space(&layout, &params(3, -0.32)).unwrap();
        let n = res.top_level_multisets();
        assert!(n > 0);
        assert!((n as u64) < res.maximum_top_level_multisets);
        assert!(!res
            .top_cluster()
            .charge_space
            .contains_key(&ChargeMultiset::new(0, 2)));
    }

    #[test]
    fn test_seven_dbs_base_2() {
        let res = ground_state_space(&seven_dbs(), &params(2, -0.32)).unwrap();
        assert_eq!(res.maximum_top_level_multisets, 8);
        let top = res.top_cluster();
        assert!(top.charge_space.contains_key(&ChargeMultiset::new(5, 0)));
        assert!(top.charge_space.len() < 8);
        assert!(res.projector_state_count > 0);
        assert_eq!(res.stats.merges, 6);

        for (i, lb, ub) in top.received_ext_pot_bounds.iter() {
            assert!(lb.abs() < 1e-9, "top cluster receives {} at {}", lb, i);
            assert!(ub.abs() < 1e-9, "top cluster receives {} at {}", ub, i);
        }
    }

    #[test]
    fn test_compositions_sum_to_their_multiset() {
        for base in [2, 3] {
            let res = ground_state_space(&seven_dbs(), &params(base, -0.25)).unwrap();
            assert!(res.hierarchy.compositions_are_consistent());
        }
    }

    #[test]
    fn test_complete_stores_are_written_for_merged_clusters() {
        let res = ground_state_space(&seven_dbs(), &params(3, -0.32)).unwrap();
        let h = &res.hierarchy;
        for (&m, comps) in &h.top_cluster().charge_space {
            for comp in comps {
                assert_eq!(comp.multiset(), m);
                let mut sum = CompleteBoundStore::zeroed(h.num_sidbs());
                for pst in &comp.proj_states {
                    sum += h.complete_store(pst);
                }
                for i in 0..h.num_sidbs() {
                    let (a, b) = sum.get_pair(i);
                    let (c, d) = comp.pot_bounds.get_pair(i);
                    assert!((a - c).abs() < 1e-9 && (b - d).abs() < 1e-9);
                }
            }
        }
    }

    #[test]
    fn test_witness_limit_monotonicity() {
        let layout = seven_dbs();
        let mut sizes = vec![];
        for limit in [0, 3, 7] {
            let p = GroundStateSpaceParams {
                witness_partitioning_max_cluster_size: limit,
                num_overlapping_witnesses_limit: 12,
                ..params(3, -0.28)
            };
            sizes.push(ground_state_space(&layout, &p).unwrap().top_level_multisets());
        }
        assert!(sizes.windows(2).all(|w| w[1] <= w[0]), "{:?}", sizes);
    }

    #[test]
    fn test_identical_positions() {
        let layout = SidbLayout::new([(4, 4, 0), (4, 4, 0), (4, 4, 0)]);
        let res = ground_state_space(&layout, &params(3, -0.32)).unwrap();
        assert_eq!(res.maximum_top_level_multisets, 10);
        assert!(res.hierarchy.compositions_are_consistent());
    }

    #[test]
    fn test_empty_layout() {
        let err = ground_state_space(&SidbLayout::default(), &params(3, -0.32)).unwrap_err();
        assert_eq!(err, SimulationError::EmptyLayout);
    }

    #[test]
    fn test_maximum_top_level_multisets() {
        assert_eq!(maximum_top_level_multisets(1, 2), 2);
        assert_eq!(maximum_top_level_multisets(4, 3), 15);
        assert_eq!(maximum_top_level_multisets(20, 2), 21);
    }
}
