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

//! Output readiness gating and autoregressive output collection.
//!
//! Only co-activation edges are ever walked when generating output —
//! similarity, context and homeostatic edges exist to help the graph
//! organize itself, not to speak.

use rand::Rng;

use crate::edge::EdgeKind;
use crate::graph::Graph;
use crate::node::NodeIndex;
use crate::stats::population_variance;

/// `(readiness, threshold)`. Output is emitted only when
/// `readiness >= threshold`.
pub fn compute_readiness(graph: &Graph, initial: &[NodeIndex]) -> (f32, f32) {
    let mut coact_sum = 0.0f32;
    let mut coact_count = 0usize;
    let mut max_edge = 0.0f32;

    for &n in initial {
        for &e in &graph.node(n).outgoing {
            let edge = graph.edge(e);
            max_edge = max_edge.max(edge.weight);
            if edge.kind == EdgeKind::CoActivation {
                coact_sum += edge.weight;
                coact_count += 1;
            }
        }
    }

    let avg_coact = if coact_count > 0 { coact_sum / coact_count as f32 } else { 0.0 };
    let readiness = if (max_edge + avg_coact) > 0.0 {
        avg_coact / (max_edge + avg_coact)
    } else {
        0.0
    };

    let local_context = if !initial.is_empty() {
        initial.iter().map(|&n| graph.outgoing_avg(n)).sum::<f32>() / initial.len() as f32
    } else {
        0.0
    };
    let threshold = local_context / (local_context + 1.0);

    (readiness, threshold)
}

/// Collect output bytes by walking co-activation edges autoregressively
/// from the last node in the initial activation set, sampling among
/// above-average candidates with a temperature shaped by the local
/// variance of their weights. Empty when readiness does not clear its
/// threshold, or when a step runs out of eligible candidates.
///
/// Also returns the readiness score that gated the walk, so a caller
/// that needs it (e.g. for logging) doesn't have to recompute it.
pub fn collect_output(graph: &mut Graph, initial: &[NodeIndex], rng: &mut impl Rng) -> (Vec<u8>, f32) {
    let (readiness, threshold) = compute_readiness(graph, initial);
    if readiness <= 0.0 || readiness < threshold {
        return (Vec::new(), readiness);
    }

    let Some(&seed) = initial.last() else {
        return (Vec::new(), readiness);
    };

    let avg_payload_len: f32 =
        initial.iter().map(|&n| graph.node(n).payload.len() as f32).sum::<f32>() / initial.len() as f32;
    let l_out_max = ((2.0 * avg_payload_len).round().max(1.0)) as usize;

    let mut current = seed;
    let mut out = Vec::new();

    for _ in 0..l_out_max {
        let oavg = graph.outgoing_avg(current);
        let candidates: Vec<_> = graph
            .node(current)
            .outgoing
            .iter()
            .copied()
            .filter(|&e| graph.edge(e).kind == EdgeKind::CoActivation)
            .filter(|&e| graph.edge(e).weight > oavg)
            .collect();
        if candidates.is_empty() {
            break;
        }

        let cur_activation = graph.node(current).activation_strength;
        let mut scores: Vec<f32> = candidates
            .iter()
            .map(|&e| {
                let to = graph.edge(e).to;
                graph.node(to).activation_strength.max(0.0) * graph.edge_transform(e, cur_activation)
            })
            .collect();

        let variance = population_variance(&scores);
        let temperature = (0.5 + variance / (variance + 1.0)).clamp(0.5, 1.5);
        for s in scores.iter_mut() {
            *s = s.max(0.0).powf(1.0 / temperature);
        }

        let total: f32 = scores.iter().sum();
        if total <= 0.0 {
            break;
        }

        let draw: f32 = rng.gen::<f32>() * total;
        let mut acc = 0.0f32;
        let mut chosen = scores.len() - 1;
        for (i, &s) in scores.iter().enumerate() {
            acc += s;
            if draw <= acc {
                chosen = i;
                break;
            }
        }

        let chosen_edge = candidates[chosen];
        let next_node = graph.edge(chosen_edge).to;
        out.extend_from_slice(&graph.node(next_node).payload);
        current = next_node;
    }

    (out, readiness)
}

/// Convenience wrapper over [`collect_output`] for callers that don't
/// need the readiness score back.
pub fn maybe_collect_output(graph: &mut Graph, initial: &[NodeIndex], rng: &mut impl Rng) -> Vec<u8> {
    collect_output(graph, initial, rng).0
}
