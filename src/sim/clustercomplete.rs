// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! ClusterComplete: exact simulation by unfolding the Ground State Space.
//!
//! A clustering state assigns a multiset to every cluster of a clustering
//! and keeps the potential bounds valid for exactly that assignment. Starting
//! from a composition of the top cluster, the largest cluster of the state is
//! repeatedly replaced by one of its compositions, each replacement adding
//! and subtracting complete bound stores. Branches whose bounds rule out the
//! assigned multisets are cut; states made of singletons only are full
//! charge distributions and are verified exactly.
//!
//! # Work stealing
//!
//! Each worker owns a queue of layers, one per recursion level, holding the
//! compositions it has yet to unfold at that level. The owner pops from the
//! newest layer. Idle workers steal from the oldest layer, which requires the
//! clustering state of that level: the queue keeps the state of its oldest
//! level and one *mole* per newer level, telling which composition was added
//! and which cluster was taken out to descend a level. A thief replays moles
//! until it reaches a non-empty layer, then copies the state.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError, TryLockError};
use std::time::Instant;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::result::SimulationResult;
use crate::bounds::{CompleteBoundStore, Lower, PruningThresholds, Upper};
use crate::cluster::{ChargeSpaceComposition, ClusterHierarchy, Linkage, ProjectorState};
use crate::error::SimulationError;
use crate::ground_state_space::{ground_state_space_with_landscape, GroundStateSpaceParams};
use crate::layout::{ChargeDistribution, ExternalPotentials, PotentialLandscape, SidbLayout};
use crate::physics::{ChargeState, SimulationParameters};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterCompleteParams {
    pub simulation_parameters: SimulationParameters,
    /// SiDB index → locally applied potential in V.
    pub local_external_potential: BTreeMap<usize, f64>,
    /// Potential applied to every SiDB in V.
    pub global_potential: f64,
    /// See [`GroundStateSpaceParams::witness_partitioning_max_cluster_size`].
    pub validity_witness_partitioning_max_cluster_size_gss: usize,
    pub num_overlapping_witnesses_limit_gss: usize,
    /// Worker threads for the unfolding.
    pub available_threads: usize,
    pub report_gss_stats: bool,
    /// Seed of the initial work shuffle; drawn from the OS when absent.
    pub seed: Option<u64>,
    pub linkage: Linkage,
}

impl Default for ClusterCompleteParams {
    fn default() -> Self {
        Self {
            simulation_parameters: SimulationParameters::default(),
            local_external_potential: BTreeMap::new(),
            global_potential: 0.0,
            validity_witness_partitioning_max_cluster_size_gss: 6,
            num_overlapping_witnesses_limit_gss: 6,
            available_threads: std::thread::available_parallelism().map_or(1, |n| n.get()),
            report_gss_stats: false,
            seed: None,
            linkage: Linkage::default(),
        }
    }
}

impl ClusterCompleteParams {
    pub fn ground_state_space_params(&self) -> GroundStateSpaceParams {
        GroundStateSpaceParams {
            simulation_parameters: self.simulation_parameters,
            witness_partitioning_max_cluster_size: self.validity_witness_partitioning_max_cluster_size_gss,
            num_overlapping_witnesses_limit: self.num_overlapping_witnesses_limit_gss,
            linkage: self.linkage,
        }
    }

    pub fn external_potentials(&self) -> ExternalPotentials {
        ExternalPotentials {
            local: self.local_external_potential.clone(),
            global: self.global_potential,
        }
    }
}

/// Counters of one unfolding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CcStats {
    /// Clustering states made of singletons only.
    pub leaves_reached: u64,
    pub leaves_accepted: u64,
    /// Clustering states cut by the population stability bound check.
    pub pruned_branches: u64,
    pub steals: u64,
}

#[derive(Debug, Default)]
struct StatCounters {
    leaves_reached: AtomicU64,
    leaves_accepted: AtomicU64,
    pruned_branches: AtomicU64,
    steals: AtomicU64,
}

impl StatCounters {
    #[inline]
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> CcStats {
        CcStats {
            leaves_reached: self.leaves_reached.load(Ordering::Relaxed),
            leaves_accepted: self.leaves_accepted.load(Ordering::Relaxed),
            pruned_branches: self.pruned_branches.load(Ordering::Relaxed),
            steals: self.steals.load(Ordering::Relaxed),
        }
    }
}

/// Simulates `layout` exactly with ClusterComplete.
pub fn clustercomplete(
    layout: &SidbLayout,
    params: &ClusterCompleteParams,
) -> Result<SimulationResult, SimulationError> {
    clustercomplete_with_stats(layout, params).map(|(result, _)| result)
}

pub fn clustercomplete_with_stats(
    layout: &SidbLayout,
    params: &ClusterCompleteParams,
) -> Result<(SimulationResult, CcStats), SimulationError> {
    let landscape =
        PotentialLandscape::with_external_potentials(layout, &params.simulation_parameters, &params.external_potentials())?;

    let mut result = SimulationResult::new("ClusterComplete", params.simulation_parameters);
    let extra = &mut result.additional_simulation_parameters;
    extra.insert("global_potential".to_string(), params.global_potential);
    extra.insert(
        "validity_witness_partitioning_limit".to_string(),
        params.validity_witness_partitioning_max_cluster_size_gss as f64,
    );
    extra.insert(
        "num_overlapping_witnesses_limit".to_string(),
        params.num_overlapping_witnesses_limit_gss as f64,
    );

    let gss = ground_state_space_with_landscape(&landscape, &params.ground_state_space_params())?;
    if params.report_gss_stats {
        gss.report();
    }

    let start = Instant::now();
    let timer = clilog::stimer!("clustercomplete unfolding");
    let (mut charge_distributions, stats) = if gss.top_cluster().charge_space.is_empty() {
        (vec![], CcStats::default())
    } else {
        unfold_hierarchy(&gss.hierarchy, &landscape, params)?
    };
    clilog::finish!(timer);

    charge_distributions.sort_by_key(|cd| cd.charge_index(landscape.base()));
    clilog::debug!(
        "ClusterComplete found {} physically valid charge distributions ({:?})",
        charge_distributions.len(),
        stats
    );

    result.charge_distributions = charge_distributions;
    result.simulation_runtime = start.elapsed() + gss.runtime;
    Ok((result, stats))
}

/// Projector states partitioning all SiDBs, with potential bounds specific
/// to their combination.
#[derive(Debug, Clone)]
struct ClusteringState {
    proj_states: Vec<ProjectorState>,
    pot_bounds: CompleteBoundStore,
}

impl ClusteringState {
    fn new(num_sidbs: usize) -> Self {
        Self {
            proj_states: Vec::with_capacity(num_sidbs),
            pot_bounds: CompleteBoundStore::zeroed(num_sidbs),
        }
    }

    fn add_composition(&mut self, comp: &ChargeSpaceComposition) {
        self.pot_bounds += &comp.pot_bounds;
        self.proj_states.extend(comp.proj_states.iter().copied());
    }

    fn remove_composition(&mut self, comp: &ChargeSpaceComposition) {
        let len = self.proj_states.len() - comp.proj_states.len();
        self.proj_states.truncate(len);
        self.pot_bounds -= &comp.pot_bounds;
    }

    /// Takes the parent at `ix` out, leaving the last projector state in its
    /// place.
    fn take_parent_out(&mut self, hierarchy: &ClusterHierarchy, ix: usize) -> ProjectorState {
        let parent = self.proj_states.swap_remove(ix);
        self.pot_bounds -= hierarchy.complete_store(&parent);
        parent
    }

    /// Inverse of [`Self::take_parent_out`].
    fn add_parent(&mut self, hierarchy: &ClusterHierarchy, ix: usize, parent: ProjectorState) {
        self.pot_bounds += hierarchy.complete_store(&parent);
        self.proj_states.push(parent);
        let last = self.proj_states.len() - 1;
        self.proj_states.swap(ix, last);
    }
}

/// How the thieves' clustering state descends one level.
#[derive(Debug, Clone, Copy)]
struct Mole<'h> {
    parent_ix: usize,
    composition: &'h ChargeSpaceComposition,
}

enum OwnWork<'h> {
    Work(&'h ChargeSpaceComposition),
    /// Work is left on a lower level.
    Backtrack,
    Exhausted,
}

enum Steal<'h> {
    Locked,
    Empty,
    Success(ClusteringState, &'h ChargeSpaceComposition),
}

#[derive(Debug)]
struct WorkQueue<'h> {
    /// State of the level of the back layer.
    thieves_state: ClusteringState,
    /// One per layer above the back one, oldest first.
    informants: VecDeque<Mole<'h>>,
    /// Newest level at the front.
    layers: VecDeque<VecDeque<&'h ChargeSpaceComposition>>,
    count: usize,
}

impl<'h> WorkQueue<'h> {
    fn new(num_sidbs: usize) -> Self {
        Self {
            thieves_state: ClusteringState::new(num_sidbs),
            informants: VecDeque::new(),
            layers: VecDeque::from([VecDeque::new()]),
            count: 0,
        }
    }

    fn with_work(num_sidbs: usize, work: &[&'h ChargeSpaceComposition]) -> Self {
        let mut queue = Self::new(num_sidbs);
        for &comp in work {
            queue.layers[0].push_front(comp);
        }
        queue.count = work.len();
        queue
    }

    fn initialize_after_stealing(&mut self, state: &ClusteringState) {
        self.thieves_state = state.clone();
        self.informants.clear();
        self.layers.clear();
        self.layers.push_front(VecDeque::new());
        self.count = 0;
    }

    /// Opens a layer with all compositions but the first, which the owner
    /// unfolds right away.
    fn add_to_queue(&mut self, compositions: &'h [ChargeSpaceComposition], informant: Mole<'h>) {
        let mut layer = VecDeque::with_capacity(compositions.len().saturating_sub(1));
        for comp in compositions.iter().skip(1) {
            layer.push_front(comp);
        }
        self.count += layer.len();
        self.layers.push_front(layer);
        self.informants.push_back(informant);
        debug_assert_eq!(self.layers.len(), self.informants.len() + 1);
    }

    fn pop_last_layer(&mut self) {
        if self.informants.is_empty() {
            return;
        }
        self.layers.pop_front();
        self.informants.pop_back();
    }

    fn get_from_this_queue(&mut self) -> OwnWork<'h> {
        if self.count == 0 {
            return OwnWork::Exhausted;
        }
        match self.layers.front_mut().and_then(|layer| layer.pop_front()) {
            Some(comp) => {
                self.count -= 1;
                OwnWork::Work(comp)
            }
            None => OwnWork::Backtrack,
        }
    }

    fn steal(&mut self, hierarchy: &ClusterHierarchy) -> Steal<'h> {
        if self.count == 0 {
            return Steal::Empty;
        }

        // forward-track the thieves' state to the oldest level with work
        while !self.informants.is_empty() && self.layers.back().map_or(true, VecDeque::is_empty) {
            self.layers.pop_back();
            if let Some(mole) = self.informants.pop_front() {
                self.thieves_state.add_composition(mole.composition);
                self.thieves_state.take_parent_out(hierarchy, mole.parent_ix);
            }
        }

        match self.layers.back_mut().and_then(|layer| layer.pop_back()) {
            Some(comp) => {
                self.count -= 1;
                Steal::Success(self.thieves_state.clone(), comp)
            }
            None => unreachable!("work counted in a queue without a non-empty layer"),
        }
    }
}

/// Shared context of one unfolding.
struct Unfolding<'h> {
    hierarchy: &'h ClusterHierarchy,
    landscape: &'h PotentialLandscape,
    thresholds: PruningThresholds,
    queues: Vec<Mutex<WorkQueue<'h>>>,
    results: Mutex<Vec<ChargeDistribution>>,
    stats: StatCounters,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<'h> Unfolding<'h> {
    fn try_steal(&self, victim: usize) -> Steal<'h> {
        let mut queue = match self.queues[victim].try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => return Steal::Locked,
            Err(TryLockError::Poisoned(p)) => p.into_inner(),
        };
        queue.steal(self.hierarchy)
    }

    /// Necessary condition for a population stable charge distribution: each
    /// projector state finds enough SiDBs admitting each of its charges.
    fn meets_population_stability_criterion(&self, state: &ClusteringState) -> bool {
        state.proj_states.iter().all(|pst| {
            let cluster = self.hierarchy.cluster(pst.cluster);
            let mut neg = pst.multiset.neg_count();
            let mut pos = pst.multiset.pos_count();
            let mut neut = pst.multiset.neutral_count(cluster.num_sidbs());

            for &i in &cluster.sidbs {
                let lb = state.pot_bounds.get::<Lower>(i);
                let ub = state.pot_bounds.get::<Upper>(i);
                if neg != 0 && self.thresholds.admits_negative(lb) {
                    neg -= 1;
                }
                if pos != 0 && self.thresholds.admits_positive(ub) {
                    pos -= 1;
                }
                if neut != 0 && self.thresholds.admits_neutral(lb, ub) {
                    neut -= 1;
                }
            }
            neg == 0 && pos == 0 && neut == 0
        })
    }

    fn add_if_configuration_stability_is_met(&self, state: &ClusteringState) {
        StatCounters::bump(&self.stats.leaves_reached);

        let mut charges = vec![ChargeState::Neutral; self.hierarchy.num_sidbs()];
        for pst in &state.proj_states {
            let sidb = self.hierarchy.cluster(pst.cluster).singleton_sidb();
            charges[sidb] = pst.multiset.singleton_charge_state();
        }
        let cd = ChargeDistribution::new(self.landscape, charges);
        if !cd.is_physically_valid(self.landscape) {
            return;
        }

        StatCounters::bump(&self.stats.leaves_accepted);
        lock(&self.results).push(cd);
    }
}

struct Worker<'u, 'h> {
    index: usize,
    state: ClusteringState,
    unfolding: &'u Unfolding<'h>,
}

impl<'u, 'h> Worker<'u, 'h> {
    fn own_queue(&self) -> MutexGuard<'u, WorkQueue<'h>> {
        lock(&self.unfolding.queues[self.index])
    }

    fn obtain_work(&mut self) -> Option<&'h ChargeSpaceComposition> {
        if let OwnWork::Work(comp) = self.own_queue().get_from_this_queue() {
            return Some(comp);
        }

        let me = self.index;
        let num_workers = self.unfolding.queues.len();
        let mut encountered_locked_queue = true;
        while encountered_locked_queue {
            encountered_locked_queue = false;
            for victim in (0..num_workers).filter(|&v| v != me) {
                match self.unfolding.try_steal(victim) {
                    Steal::Success(state, comp) => {
                        self.state = state;
                        self.own_queue().initialize_after_stealing(&self.state);
                        StatCounters::bump(&self.unfolding.stats.steals);
                        clilog::trace!("worker {} stole from worker {}", me, victim);
                        return Some(comp);
                    }
                    Steal::Locked => encountered_locked_queue = true,
                    Steal::Empty => {}
                }
            }
        }
        None
    }

    /// Returns `false` if the own queue ran dry, in which case the state is
    /// left as is and the caller must not backtrack.
    fn unfold_composition(&mut self, comp: &'h ChargeSpaceComposition) -> bool {
        self.state.add_composition(comp);
        if !self.add_physically_valid_charge_configurations(comp) {
            return false;
        }
        self.state.remove_composition(comp);
        true
    }

    fn add_physically_valid_charge_configurations(&mut self, comp: &'h ChargeSpaceComposition) -> bool {
        let unfolding = self.unfolding;
        if !unfolding.meets_population_stability_criterion(&self.state) {
            StatCounters::bump(&unfolding.stats.pruned_branches);
            return true;
        }

        if self.state.proj_states.len() == unfolding.hierarchy.num_sidbs() {
            unfolding.add_if_configuration_stability_is_met(&self.state);
            return true;
        }

        // first cluster of maximum size
        let mut max_ix = 0;
        for (ix, pst) in self.state.proj_states.iter().enumerate() {
            let size = unfolding.hierarchy.cluster(pst.cluster).num_sidbs();
            if size > unfolding.hierarchy.cluster(self.state.proj_states[max_ix].cluster).num_sidbs() {
                max_ix = ix;
            }
        }

        let parent = self.state.take_parent_out(unfolding.hierarchy, max_ix);
        let compositions = match unfolding.hierarchy.cluster(parent.cluster).charge_space.get(&parent.multiset) {
            Some(comps) => comps.as_slice(),
            None => panic!("multiset {} missing from cluster {}", parent.multiset, parent.cluster),
        };
        let mole = Mole {
            parent_ix: max_ix,
            composition: comp,
        };
        if !self.unfold_all_compositions(compositions, mole) {
            return false;
        }

        self.state.add_parent(unfolding.hierarchy, max_ix, parent);
        self.own_queue().pop_last_layer();
        true
    }

    fn unfold_all_compositions(&mut self, compositions: &'h [ChargeSpaceComposition], mole: Mole<'h>) -> bool {
        assert!(!compositions.is_empty(), "projector state without compositions");
        self.own_queue().add_to_queue(compositions, mole);

        if !self.unfold_composition(&compositions[0]) {
            return false;
        }

        loop {
            let work = self.own_queue().get_from_this_queue();
            match work {
                OwnWork::Work(comp) => {
                    if !self.unfold_composition(comp) {
                        return false;
                    }
                }
                OwnWork::Backtrack => return true,
                OwnWork::Exhausted => return false,
            }
        }
    }
}

/// Unfolds the charge space of the top cluster on a dedicated thread pool.
fn unfold_hierarchy(
    hierarchy: &ClusterHierarchy,
    landscape: &PotentialLandscape,
    params: &ClusterCompleteParams,
) -> Result<(Vec<ChargeDistribution>, CcStats), SimulationError> {
    let num_sidbs = hierarchy.num_sidbs();
    let num_threads = params.available_threads.max(1);

    let mut work: Vec<&ChargeSpaceComposition> = hierarchy
        .top_cluster()
        .charge_space
        .values()
        .flatten()
        .collect();
    let mut rng = match params.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    work.shuffle(&mut rng);

    let num_with_work = num_threads.min(work.len());
    let chunk = work.len() / num_with_work;
    let queues = (0..num_threads)
        .map(|i| {
            let queue = if i + 1 < num_with_work {
                WorkQueue::with_work(num_sidbs, &work[i * chunk..(i + 1) * chunk])
            } else if i + 1 == num_with_work {
                WorkQueue::with_work(num_sidbs, &work[i * chunk..])
            } else {
                WorkQueue::new(num_sidbs)
            };
            Mutex::new(queue)
        })
        .collect();
    clilog::debug!(
        "unfolding {} top level compositions on {} threads",
        work.len(),
        num_threads
    );

    let unfolding = Unfolding {
        hierarchy,
        landscape,
        thresholds: PruningThresholds::new(landscape.params()),
        queues,
        results: Mutex::new(Vec::new()),
        stats: StatCounters::default(),
    };

    let pool = rayon::ThreadPoolBuilder::new().num_threads(num_threads).build()?;
    pool.broadcast(|ctx| {
        let mut worker = Worker {
            index: ctx.index(),
            state: ClusteringState::new(num_sidbs),
            unfolding: &unfolding,
        };
        while let Some(comp) = worker.obtain_work() {
            worker.unfold_composition(comp);
        }
    });

    let stats = unfolding.stats.snapshot();
    let results = unfolding
        .results
        .into_inner()
        .unwrap_or_else(PoisonError::into_inner);
    Ok((results, stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{SidbDefect, SiqadCoord};
    use crate::sim::exhaustive::exhaustive_ground_state_simulation;

    fn cc_params(base: u8, mu_minus: f64, threads: usize) -> ClusterCompleteParams {
        ClusterCompleteParams {
            simulation_parameters: SimulationParameters::new(base, mu_minus),
            available_threads: threads,
            seed: Some(7),
            ..Default::default()
        }
    }

    fn assert_matches_exhaustive(layout: &SidbLayout, params: &ClusterCompleteParams) {
        let cc = clustercomplete(layout, params).unwrap();
        let exgs =
            exhaustive_ground_state_simulation(layout, &params.simulation_parameters, &params.external_potentials())
                .unwrap();
        assert_eq!(cc.charge_indices(), exgs.charge_indices());
        assert_eq!(cc.num_charge_distributions(), exgs.num_charge_distributions());
        for (a, b) in cc.charge_distributions.iter().zip(&exgs.charge_distributions) {
            assert!((a.system_energy - b.system_energy).abs() < 1e-9);
        }
    }

    fn scattered_nine() -> SidbLayout {
        SidbLayout::new([
            (0, 0, 0),
            (2, 1, 0),
            (6, 2, 0),
            (8, 3, 0),
            (12, 4, 0),
            (14, 5, 0),
            (9, 7, 1),
            (5, 9, 0),
            (3, 10, 1),
        ])
    }

    fn y_gate() -> SidbLayout {
        SidbLayout::new([
            (6, 2, 0),
            (8, 3, 0),
            (12, 3, 0),
            (14, 2, 0),
            (10, 5, 0),
            (10, 6, 1),
            (10, 8, 1),
            (16, 1, 0),
        ])
    }

    /// Staggered 4×4 grid, truncated to `n` SiDBs.
    fn staggered_grid(n: usize) -> SidbLayout {
        SidbLayout::new((0..n as i64).map(|i| (i % 4 * 5 + (i / 4) % 2, (i / 4) * 3, (i % 2) as u8)))
    }

    #[test]
    fn test_clustering_state_round_trip() {
        let layout = SidbLayout::new([(0, 0, 0), (3, 0, 0), (9, 1, 0)]);
        let gss = crate::ground_state_space::ground_state_space(&layout, &Default::default()).unwrap();
        let h = &gss.hierarchy;
        let comp = &h.top_cluster().charge_space[0][0];

        let mut state = ClusteringState::new(3);
        state.add_composition(comp);
        let before = state.clone();
        let ix = (0..state.proj_states.len())
            .find(|&ix| !h.cluster(state.proj_states[ix].cluster).is_singleton())
            .unwrap_or(0);
        if !h.cluster(state.proj_states[ix].cluster).is_singleton() {
            let parent = state.take_parent_out(h, ix);
            state.add_parent(h, ix, parent);
        }
        assert_eq!(state.proj_states, before.proj_states);
        state.remove_composition(comp);
        assert!(state.proj_states.is_empty());
        for i in 0..3 {
            let (lb, ub) = state.pot_bounds.get_pair(i);
            assert!(lb.abs() < 1e-12 && ub.abs() < 1e-12);
        }
    }

    #[test]
    fn test_matches_exhaustive_base_2() {
        assert_matches_exhaustive(&scattered_nine(), &cc_params(2, -0.32, 2));
        assert_matches_exhaustive(&scattered_nine(), &cc_params(2, -0.25, 2));
    }

    #[test]
    fn test_matches_exhaustive_base_3() {
        let close = SidbLayout::new([(0, 0, 0), (1, 0, 0), (2, 1, 0), (5, 0, 0), (6, 2, 1), (7, 0, 0)]);
        assert_matches_exhaustive(&close, &cc_params(3, -0.32, 3));
        assert_matches_exhaustive(&scattered_nine(), &cc_params(3, -0.28, 3));
    }

    #[test]
    fn test_matches_exhaustive_with_external_potentials() {
        let mut params = cc_params(3, -0.32, 2);
        params.global_potential = -0.1;
        params.local_external_potential.insert(2, 0.2);
        assert_matches_exhaustive(&scattered_nine(), &params);
    }

    #[test]
    fn test_thread_count_invariance() {
        let layout = y_gate();
        let one = clustercomplete(&layout, &cc_params(3, -0.28, 1)).unwrap();
        let four = clustercomplete(&layout, &cc_params(3, -0.28, 4)).unwrap();
        assert_eq!(one.charge_indices(), four.charge_indices());
        assert!(one.num_charge_distributions() > 0);
    }

    #[test]
    fn test_work_stealing_matches_exhaustive() {
        let layout = staggered_grid(14);
        let single = cc_params(3, -0.32, 1);
        let (one, one_stats) = clustercomplete_with_stats(&layout, &single).unwrap();
        assert_eq!(one_stats.steals, 0);

        let many = cc_params(3, -0.32, 8);
        let (eight, eight_stats) = clustercomplete_with_stats(&layout, &many).unwrap();
        assert!(eight_stats.steals > 0);
        assert_eq!(one.charge_indices(), eight.charge_indices());
        assert_eq!(eight_stats.leaves_accepted as usize, eight.num_charge_distributions());
        assert_matches_exhaustive(&layout, &many);
    }

    #[test]
    fn test_full_grid_base_2_matches_exhaustive() {
        let layout = staggered_grid(16);
        assert_matches_exhaustive(&layout, &cc_params(2, -0.32, 1));
        assert_matches_exhaustive(&layout, &cc_params(2, -0.32, 8));
    }

    #[test]
    fn test_idempotence() {
        let layout = scattered_nine();
        let params = ClusterCompleteParams {
            seed: None,
            ..cc_params(3, -0.32, 4)
        };
        let a = clustercomplete(&layout, &params).unwrap();
        let b = clustercomplete(&layout, &params).unwrap();
        assert_eq!(a.charge_indices(), b.charge_indices());
        let energies = |r: &SimulationResult| -> Vec<f64> { r.charge_distributions.iter().map(|cd| cd.system_energy).collect() };
        assert_eq!(energies(&a), energies(&b));
    }

    #[test]
    fn test_y_gate_ground_state() {
        let layout = y_gate();
        let res = clustercomplete(&layout, &cc_params(2, -0.28, 2)).unwrap();
        let gs = res.ground_states();
        assert_eq!(gs.len(), 1);
        let gs = gs[0];
        assert!((gs.system_energy - 0.4662582096).abs() < 1e-6, "{}", gs.system_energy);

        let negative: Vec<SiqadCoord> = layout
            .sidbs
            .iter()
            .zip(&gs.charges)
            .filter(|(_, &cs)| cs == ChargeState::Negative)
            .map(|(&c, _)| c)
            .collect();
        for c in [
            SiqadCoord(6, 2, 0),
            SiqadCoord(12, 3, 0),
            SiqadCoord(10, 8, 1),
            SiqadCoord(10, 6, 1),
            SiqadCoord(16, 1, 0),
        ] {
            assert!(negative.contains(&c), "{:?} not negative", c);
        }
    }

    #[test]
    fn test_single_sidb_with_defect() {
        let defect = SidbDefect {
            position: SiqadCoord(1, 2, 0),
            charge: -1.0,
            epsilon_r: None,
            lambda_tf: None,
        };
        let layout = SidbLayout::new([(1, 3, 0)]).with_defect(defect);
        let res = clustercomplete(&layout, &cc_params(2, -0.25, 1)).unwrap();
        assert_eq!(res.num_charge_distributions(), 1);
        assert_eq!(res.charge_distributions[0].charges, vec![ChargeState::Neutral]);

        // a shorter screening length weakens the defect
        let screened = SidbLayout::new([(1, 3, 0)]).with_defect(SidbDefect {
            lambda_tf: Some(2.0),
            ..defect
        });
        let res = clustercomplete(&screened, &cc_params(2, -0.25, 1)).unwrap();
        assert_eq!(res.num_charge_distributions(), 1);
        assert_eq!(res.charge_distributions[0].charges, vec![ChargeState::Negative]);
    }

    #[test]
    fn test_four_sidbs_with_defect_are_neutral() {
        let layout = SidbLayout::new([(-2, 0, 1), (2, 0, 1), (0, 1, 0), (2, 1, 0)]).with_defect(SidbDefect {
            position: SiqadCoord(0, 0, 1),
            charge: -1.0,
            epsilon_r: None,
            lambda_tf: None,
        });
        let res = clustercomplete(&layout, &cc_params(2, -0.15, 2)).unwrap();
        assert_eq!(res.num_charge_distributions(), 1);
        assert_eq!(res.charge_distributions[0].count(ChargeState::Neutral), 4);
    }

    #[test]
    fn test_four_sidbs_with_positive_charge() {
        let layout = SidbLayout::new([(2, 0, 1), (4, 0, 1), (2, 1, 0), (3, 1, 1)]);
        let base_2 = cc_params(2, -0.32, 2);
        assert_eq!(clustercomplete(&layout, &base_2).unwrap().num_charge_distributions(), 1);
        assert_matches_exhaustive(&layout, &base_2);

        let base_3 = cc_params(3, -0.32, 2);
        assert_eq!(clustercomplete(&layout, &base_3).unwrap().num_charge_distributions(), 2);
        assert_matches_exhaustive(&layout, &base_3);
    }

    #[test]
    fn test_single_sidb_per_base() {
        let layout = SidbLayout::new([(0, 0, 0)]);
        for base in [2, 3] {
            let res = clustercomplete(&layout, &cc_params(base, -0.32, 2)).unwrap();
            assert_eq!(res.num_charge_distributions(), 1);
            assert_eq!(res.charge_distributions[0].charges, vec![ChargeState::Negative]);
        }
    }

    #[test]
    fn test_distant_pair() {
        let layout = SidbLayout::new([(0, 0, 0), (200, 0, 0)]);
        let res = clustercomplete(&layout, &cc_params(2, -0.32, 2)).unwrap();
        assert_eq!(res.num_charge_distributions(), 1);
        assert_eq!(res.charge_distributions[0].count(ChargeState::Negative), 2);
    }

    #[test]
    fn test_close_pair_base_2_has_no_valid_state() {
        let layout = SidbLayout::new([(0, 0, 0), (0, 0, 1)]);
        let res = clustercomplete(&layout, &cc_params(2, -0.32, 2)).unwrap();
        assert_eq!(res.num_charge_distributions(), 0);
    }

    #[test]
    fn test_symmetric_triangle() {
        let layout = SidbLayout::new([(0, 0, 0), (6, 0, 0), (3, 2, 1)]);
        let params = cc_params(3, -0.32, 2);
        let res = clustercomplete(&layout, &params).unwrap();
        let gs = res.ground_states();
        assert!(!gs.is_empty());
        // mirroring the two base SiDBs maps ground states onto ground states
        let indices = res.charge_indices();
        for cd in &gs {
            let mirrored = vec![cd.charges[1], cd.charges[0], cd.charges[2]];
            let landscape = PotentialLandscape::new(&layout, &params.simulation_parameters).unwrap();
            let mirrored = ChargeDistribution::new(&landscape, mirrored);
            assert!(indices.contains(&mirrored.charge_index(3)));
            assert!((mirrored.system_energy - cd.system_energy).abs() < 1e-9);
        }
    }

    #[test]
    fn test_identical_positions() {
        let layout = SidbLayout::new([(3, 3, 0), (3, 3, 0), (8, 3, 0)]);
        assert_matches_exhaustive(&layout, &cc_params(3, -0.32, 2));
    }

    #[test]
    fn test_witness_partitioning_disabled() {
        let mut params = cc_params(3, -0.32, 2);
        params.validity_witness_partitioning_max_cluster_size_gss = 0;
        assert_matches_exhaustive(&scattered_nine(), &params);
    }

    #[test]
    fn test_additional_parameters_and_errors() {
        let layout = SidbLayout::new([(0, 0, 0), (5, 0, 0)]);
        let res = clustercomplete(&layout, &cc_params(2, -0.32, 1)).unwrap();
        assert_eq!(res.algorithm_name, "ClusterComplete");
        let keys: Vec<&str> = res.additional_simulation_parameters.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec![
                "global_potential",
                "validity_witness_partitioning_limit",
                "num_overlapping_witnesses_limit"
            ]
        );

        assert_eq!(
            clustercomplete(&SidbLayout::default(), &cc_params(3, -0.32, 1)).unwrap_err(),
            SimulationError::EmptyLayout
        );
        let mut bad = cc_params(3, -0.32, 1);
        bad.simulation_parameters.epsilon_r = 0.0;
        assert!(matches!(
            clustercomplete(&layout, &bad),
            Err(SimulationError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_stats_are_collected() {
        let (res, stats) = clustercomplete_with_stats(&scattered_nine(), &cc_params(3, -0.32, 2)).unwrap();
        assert_eq!(stats.leaves_accepted as usize, res.num_charge_distributions());
        assert!(stats.leaves_reached >= stats.leaves_accepted);
    }
}
