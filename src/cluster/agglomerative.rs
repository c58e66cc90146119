// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Hierarchical agglomerative clustering of SiDB positions.
//!
//! A straightforward Lance–Williams implementation over a dense distance
//! matrix. Layouts simulated exactly are small enough that the cubic cost is
//! irrelevant next to the ground state space construction.

use serde::{Deserialize, Serialize};

/// Inter-cluster distance used when two clusters are merged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Linkage {
    Complete,
    Single,
    UnweightedAverage,
    WeightedAverage,
    /// Ward's method.
    #[default]
    MinimumVariance,
}

impl Linkage {
    /// Lance–Williams update of `d(k, i ∪ j)`.
    ///
    /// For [`Linkage::MinimumVariance`] the arguments and result are squared
    /// distances.
    fn update(self, d_ki: f64, d_kj: f64, d_ij: f64, n_i: usize, n_j: usize, n_k: usize) -> f64 {
        match self {
            Linkage::Complete => d_ki.max(d_kj),
            Linkage::Single => d_ki.min(d_kj),
            Linkage::UnweightedAverage => {
                (n_i as f64 * d_ki + n_j as f64 * d_kj) / (n_i + n_j) as f64
            }
            Linkage::WeightedAverage => 0.5 * (d_ki + d_kj),
            Linkage::MinimumVariance => {
                let (n_i, n_j, n_k) = (n_i as f64, n_j as f64, n_k as f64);
                ((n_i + n_k) * d_ki + (n_j + n_k) * d_kj - n_k * d_ij) / (n_i + n_j + n_k)
            }
        }
    }
}

/// Merge sequence of `points` under `linkage`.
///
/// Returns `points.len() - 1` pairs of node labels. Labels below
/// `points.len()` denote the points themselves, label `points.len() + i`
/// denotes the node created by merge `i`. Each pair is ordered ascending.
pub fn agglomerative_merges(points: &[(f64, f64)], linkage: Linkage) -> Vec<(usize, usize)> {
    let n = points.len();
    if n < 2 {
        return vec![];
    }

    let mut dist = vec![0.0; n * n];
    for i in 0..n {
        for j in (i + 1)..n {
            let (dx, dy) = (points[i].0 - points[j].0, points[i].1 - points[j].1);
            let d2 = dx * dx + dy * dy;
            let d = match linkage {
                Linkage::MinimumVariance => d2,
                _ => d2.sqrt(),
            };
            dist[i * n + j] = d;
            dist[j * n + i] = d;
        }
    }

    // slot -> (label, size); slots of merged nodes are reused by the result
    let mut labels: Vec<usize> = (0..n).collect();
    let mut sizes = vec![1usize; n];
    let mut active = vec![true; n];
    let mut merges = Vec::with_capacity(n - 1);

    for step in 0..n - 1 {
        let mut best: Option<(f64, usize, usize)> = None;
        for i in (0..n).filter(|&i| active[i]) {
            for j in ((i + 1)..n).filter(|&j| active[j]) {
                let d = dist[i * n + j];
                if best.map_or(true, |(bd, _, _)| d < bd) {
                    best = Some((d, i, j));
                }
            }
        }
        let (d_ij, i, j) = match best {
            Some(b) => b,
            None => unreachable!("fewer than two active clusters before the last merge"),
        };

        let (a, b) = (labels[i].min(labels[j]), labels[i].max(labels[j]));
        merges.push((a, b));

        for k in (0..n).filter(|&k| active[k] && k != i && k != j) {
            let d = linkage.update(
                dist[k * n + i],
                dist[k * n + j],
                d_ij,
                sizes[i],
                sizes[j],
                sizes[k],
            );
            dist[k * n + i] = d;
            dist[i * n + k] = d;
        }
        labels[i] = n + step;
        sizes[i] += sizes[j];
        active[j] = false;
    }

    merges
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Linkage; 5] = [
        Linkage::Complete,
        Linkage::Single,
        Linkage::UnweightedAverage,
        Linkage::WeightedAverage,
        Linkage::MinimumVariance,
    ];

    /// Every label below the final one is merged exactly once.
    fn assert_complete_tree(n: usize, merges: &[(usize, usize)]) {
        assert_eq!(merges.len(), n - 1);
        let mut used = vec![false; 2 * n - 1];
        for (step, &(a, b)) in merges.iter().enumerate() {
            assert!(a < b);
            assert!(b < n + step, "merge {} refers to a future node", step);
            assert!(!used[a] && !used[b]);
            used[a] = true;
            used[b] = true;
        }
        assert!(used[..2 * n - 2].iter().all(|&u| u));
        assert!(!used[2 * n - 2]);
    }

    #[test]
    fn test_trivial_inputs() {
        assert!(agglomerative_merges(&[], Linkage::Single).is_empty());
        assert!(agglomerative_merges(&[(1.0, 1.0)], Linkage::Single).is_empty());
        assert_eq!(
            agglomerative_merges(&[(0.0, 0.0), (3.0, 4.0)], Linkage::Complete),
            vec![(0, 1)]
        );
    }

    #[test]
    fn test_closest_pair_first() {
        let pts = [(0.0, 0.0), (10.0, 0.0), (0.5, 0.0)];
        for linkage in ALL {
            let merges = agglomerative_merges(&pts, linkage);
            assert_eq!(merges, vec![(0, 2), (1, 3)], "{:?}", linkage);
        }
    }

    #[test]
    fn test_two_groups() {
        let pts = [(0.0, 0.0), (20.0, 0.0), (0.4, 0.0), (20.5, 0.0), (0.0, 0.9)];
        for linkage in ALL {
            let merges = agglomerative_merges(&pts, linkage);
            assert_complete_tree(pts.len(), &merges);
            assert_eq!(merges[0], (0, 2), "{:?}", linkage);
            assert_eq!(merges[1], (1, 3), "{:?}", linkage);
            assert_eq!(merges[2], (4, 5), "{:?}", linkage);
            assert_eq!(merges[3], (6, 7), "{:?}", linkage);
        }
    }

    #[test]
    fn test_identical_positions_terminate() {
        let pts = vec![(1.0, 2.0); 6];
        for linkage in ALL {
            let merges = agglomerative_merges(&pts, linkage);
            assert_complete_tree(pts.len(), &merges);
            assert_eq!(merges[0], (0, 1));
        }
    }
}
