// Melvin - emergent associative graph engine.
// Copyright (C) 2024-2025 Melvin Engine Team
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Iterative (never recursive — a front/next-frontier loop keeps stack
//! depth independent of how far activation spreads) multi-step wave
//! propagation.

use std::collections::HashSet;

use crate::edge_formation::{apply_l2, apply_l3, apply_l4};
use crate::graph::Graph;
use crate::node::NodeIndex;
use crate::stats::population_variance;

pub struct WaveResult {
    /// Every node that was ever in a front, in the order first seen,
    /// including the initial seed front. Becomes the graph's next
    /// `last_activated`.
    pub all_fronted: Vec<NodeIndex>,
    pub steps_run: usize,
}

/// Run wave propagation starting from `seed_front` (the union of this
/// call's freshly-ingested nodes and the previous call's residual
/// `last_activated`). Mutates edge weights and node weights as it goes
/// and applies L2/L3/L4 to newly-activated nodes along the way.
pub fn propagate(graph: &mut Graph, seed_front: &[NodeIndex]) -> WaveResult {
    let mut front: Vec<NodeIndex> = seed_front.to_vec();
    let mut seen: HashSet<NodeIndex> = seed_front.iter().copied().collect();
    let mut all_fronted: Vec<NodeIndex> = seed_front.to_vec();

    let initial_energy: f32 = front.iter().map(|&n| graph.node(n).activation_strength).sum();
    let mut steps_run = 0usize;

    loop {
        let mut next: Vec<NodeIndex> = Vec::new();
        let mut next_seen: HashSet<NodeIndex> = HashSet::new();

        for &n in &front {
            let strength = graph.compute_activation_strength(n);
            graph.update_node_weight(n);
            let local_avg = graph.local_avg(n);

            if strength < 0.5 * local_avg {
                continue;
            }

            let out_edges = graph.ordered_outgoing(n);
            if out_edges.is_empty() {
                continue;
            }

            let transforms: Vec<f32> = out_edges.iter().map(|&e| graph.edge_transform(e, strength)).collect();
            let t_max = transforms.iter().cloned().fold(0.0f32, f32::max);
            let weights = graph.outgoing_weights(n);
            let variance = population_variance(&weights);
            let exploration_factor = variance / (variance + 1.0);
            let t_thr = t_max * exploration_factor;

            let alpha = graph.local_learning_rate(n);
            for (idx, &e) in out_edges.iter().enumerate() {
                if transforms[idx] < t_thr {
                    continue;
                }
                let w0 = graph.edge(e).weight;
                graph.update_edge_weight(e, w0 + alpha * (1.0 - w0));
                graph.edge_mut(e).activation = true;

                let to = graph.edge(e).to;
                if next_seen.insert(to) {
                    next.push(to);
                    if seen.insert(to) {
                        all_fronted.push(to);
                    }
                }
            }
        }

        steps_run += 1;
        crate::metrics::WAVE_STEPS_RUN.inc();

        if next.is_empty() {
            break;
        }

        apply_l3(graph, &next);
        for &n in &next {
            apply_l2(graph, n);
            apply_l4(graph, n);
        }

        let current_energy: f32 = next.iter().map(|&n| graph.node(n).activation_strength).sum();
        if current_energy < 0.1 * initial_energy {
            break;
        }

        front = next;
    }

    WaveResult { all_fronted, steps_run }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::EdgeKind;

    #[test]
    fn propagation_with_isolated_node_terminates_immediately() {
        let mut g = Graph::new();
        let a = g.add_node(vec![b'a']);
        let result = propagate(&mut g, &[a]);
        assert_eq!(result.steps_run, 1);
        assert_eq!(result.all_fronted, vec![a]);
    }

    #[test]
    fn propagation_spreads_across_a_strong_edge() {
        let mut g = Graph::new();
        let a = g.add_node(vec![b'a']);
        let b = g.add_node(vec![b'b']);
        let e = g.add_edge(a, b, EdgeKind::CoActivation);
        g.update_edge_weight(e, 0.9);
        g.node_mut(a).activation_strength = 1.0;
        g.node_mut(a).weight = 1.0;
        let result = propagate(&mut g, &[a]);
        assert!(result.all_fronted.contains(&b));
    }

    #[test]
    fn propagation_never_exceeds_node_count_steps_by_much() {
        let mut g = Graph::new();
        let mut prev = g.add_node(vec![0]);
        for i in 1..6u8 {
            let next = g.add_node(vec![i]);
            let e = g.add_edge(prev, next, EdgeKind::CoActivation);
            g.update_edge_weight(e, 0.95);
            prev = next;
        }
        g.node_mut(0).activation_strength = 1.0;
        g.node_mut(0).weight = 1.0;
        let result = propagate(&mut g, &[0]);
        assert!(result.steps_run <= 10);
    }
}
