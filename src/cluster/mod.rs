// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Cluster hierarchy over the SiDBs of a layout.
//!
//! The hierarchy is an arena: a [`Cluster`] is addressed by its
//! [`ClusterId`], which is also its index in [`ClusterHierarchy::clusters`].
//! Singletons come first, so the id of a singleton is the index of its SiDB.
//! Merge `i` of the agglomerative clustering creates cluster `N + i`, and the
//! last cluster is the top cluster containing every SiDB.
//!
//! The tree shape is fixed at construction. Charge spaces and potential
//! bookkeeping are filled in and refined by the ground state space
//! construction and only read afterwards.

pub mod agglomerative;

pub mod multiset;

pub mod projection;

use indexmap::IndexMap;

use crate::bounds::{CompleteBoundStore, Lower, PartialBoundStore, Upper};
use crate::error::SimulationError;
use crate::layout::PotentialLandscape;
use crate::physics::charge_states;

pub use agglomerative::{agglomerative_merges, Linkage};
pub use multiset::{ChargeMultiset, ChargeSpace, ChargeSpaceComposition, ProjectorState};
pub use projection::{PotentialProjection, PotentialProjectionOrder};

pub type ClusterId = usize;

#[derive(Debug, Clone, Default)]
pub struct Cluster {
    pub uid: ClusterId,
    /// Contained SiDBs, ascending.
    pub sidbs: Vec<usize>,
    /// SiDBs of the layout not contained, ascending.
    pub external_sidbs: Vec<usize>,
    pub parent: Option<ClusterId>,
    pub children: Vec<ClusterId>,
    pub charge_space: ChargeSpace,
    /// Bounds on the potential each contained SiDB receives from outside
    /// this cluster, given the current clustering.
    pub received_ext_pot_bounds: PartialBoundStore,
    /// Projections of this cluster onto every SiDB of the layout, indexed by
    /// the receiving SiDB. Onto a contained SiDB this is the self-projection.
    pub pot_projs: Vec<PotentialProjectionOrder>,
    /// Flattened projections per multiset, written once the charge space is
    /// final.
    pub complete_stores: IndexMap<ChargeMultiset, CompleteBoundStore>,
}

impl Cluster {
    #[inline]
    pub fn num_sidbs(&self) -> usize {
        self.sidbs.len()
    }

    #[inline]
    pub fn is_singleton(&self) -> bool {
        self.children.is_empty()
    }

    /// The SiDB of a singleton cluster.
    pub fn singleton_sidb(&self) -> usize {
        assert!(self.is_singleton(), "cluster {} is not a singleton", self.uid);
        self.sidbs[0]
    }

    /// Bounds on the potential that this cluster in configuration `m`
    /// projects onto `sidb`.
    #[inline]
    pub fn projection_bounds(&self, m: ChargeMultiset, sidb: usize) -> (f64, f64) {
        let order = &self.pot_projs[sidb];
        (
            order.get_for_multiset::<Lower>(m),
            order.get_for_multiset::<Upper>(m),
        )
    }
}

#[derive(Debug, Clone)]
pub struct ClusterHierarchy {
    pub clusters: Vec<Cluster>,
    num_sidbs: usize,
    top: ClusterId,
}

impl ClusterHierarchy {
    /// Clusters the SiDBs of `landscape` and initialises every singleton with
    /// its full charge space and potential projections.
    pub fn new(landscape: &PotentialLandscape, linkage: Linkage) -> Result<Self, SimulationError> {
        let n = landscape.num_sidbs();
        if n == 0 {
            return Err(SimulationError::EmptyLayout);
        }
        let merges = if n == 1 {
            vec![]
        } else {
            agglomerative_merges(landscape.positions_nm(), linkage)
        };
        let mut hierarchy = Self::from_merges(n, &merges);
        hierarchy.initialize_singletons(landscape);
        clilog::debug!(
            "cluster hierarchy over {} SiDBs has {} clusters, top cluster {}",
            n,
            hierarchy.clusters.len(),
            hierarchy.top
        );
        Ok(hierarchy)
    }

    /// Builds the tree shape from a merge sequence as produced by
    /// [`agglomerative_merges`]. A single SiDB gets a top cluster of its own
    /// with the singleton as its only child.
    pub fn from_merges(num_sidbs: usize, merges: &[(usize, usize)]) -> Self {
        assert!(num_sidbs > 0);
        assert_eq!(merges.len(), num_sidbs.saturating_sub(1));

        let mut clusters: Vec<Cluster> = (0..num_sidbs)
            .map(|i| Cluster {
                uid: i,
                sidbs: vec![i],
                ..Default::default()
            })
            .collect();

        let child_pairs: Vec<Vec<ClusterId>> = if num_sidbs == 1 {
            vec![vec![0]]
        } else {
            merges.iter().map(|&(a, b)| vec![a, b]).collect()
        };

        for children in child_pairs {
            let uid = clusters.len();
            let mut sidbs: Vec<usize> = children
                .iter()
                .flat_map(|&c| clusters[c].sidbs.iter().copied())
                .collect();
            sidbs.sort_unstable();
            for &c in &children {
                assert!(clusters[c].parent.is_none(), "cluster {} merged twice", c);
                clusters[c].parent = Some(uid);
            }
            clusters.push(Cluster {
                uid,
                sidbs,
                children,
                ..Default::default()
            });
        }

        for c in clusters.iter_mut() {
            c.external_sidbs = (0..num_sidbs)
                .filter(|i| c.sidbs.binary_search(i).is_err())
                .collect();
            c.pot_projs = vec![PotentialProjectionOrder::default(); num_sidbs];
        }

        let top = clusters.len() - 1;
        assert_eq!(clusters[top].num_sidbs(), num_sidbs);
        Self {
            clusters,
            num_sidbs,
            top,
        }
    }

    fn initialize_singletons(&mut self, landscape: &PotentialLandscape) {
        let n = self.num_sidbs;
        let base = landscape.base();
        for i in 0..n {
            let others = (0..n).filter(|&j| j != i);
            let recv_ub: f64 = others.clone().map(|j| landscape.potential(i, j)).sum();
            let recv_lb = if base == 3 { -recv_ub } else { 0.0 };

            let c = &mut self.clusters[i];
            c.charge_space = charge_states(base)
                .iter()
                .map(|&cs| (ChargeMultiset::singleton(cs), vec![]))
                .collect();
            c.received_ext_pot_bounds.set(i, recv_lb, recv_ub);
            c.pot_projs[i] = PotentialProjectionOrder::self_projection(-landscape.external_potential(i), base);
            for j in others {
                c.pot_projs[j] = PotentialProjectionOrder::inter_sidb(landscape.potential(i, j), base);
            }
        }
    }

    #[inline]
    pub fn num_sidbs(&self) -> usize {
        self.num_sidbs
    }

    #[inline]
    pub fn top(&self) -> ClusterId {
        self.top
    }

    #[inline]
    pub fn top_cluster(&self) -> &Cluster {
        &self.clusters[self.top]
    }

    #[inline]
    pub fn cluster(&self, id: ClusterId) -> &Cluster {
        &self.clusters[id]
    }

    #[inline]
    pub fn cluster_mut(&mut self, id: ClusterId) -> &mut Cluster {
        &mut self.clusters[id]
    }

    #[inline]
    pub fn parent_of(&self, id: ClusterId) -> Option<ClusterId> {
        self.clusters[id].parent
    }

    /// Flattened projections of a projector state onto every SiDB.
    pub fn complete_store(&self, pst: &ProjectorState) -> &CompleteBoundStore {
        match self.clusters[pst.cluster].complete_stores.get(&pst.multiset) {
            Some(store) => store,
            None => panic!(
                "no complete potential bound store for multiset {} of cluster {}",
                pst.multiset, pst.cluster
            ),
        }
    }

    /// Checks that every stored composition sums to the multiset it is
    /// listed under and references children of the composing cluster.
    pub fn compositions_are_consistent(&self) -> bool {
        self.clusters.iter().all(|c| {
            c.charge_space.iter().all(|(&m, comps)| {
                comps.iter().all(|comp| {
                    comp.multiset() == m
                        && comp.proj_states.len() == c.children.len()
                        && comp
                            .proj_states
                            .iter()
                            .zip(&c.children)
                            .all(|(pst, &child)| pst.cluster == child)
                })
            })
        })
    }
}
