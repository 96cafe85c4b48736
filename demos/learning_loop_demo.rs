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

//! Feeds the same six-byte port-tagged message to a fresh, in-memory
//! engine repeatedly and prints how the graph and its output evolve.
//! Run with `cargo run --example learning_loop_demo`.

use melvin_core::{Engine, EngineConfig};

fn main() {
    melvin_core::logging::init_logging("info");

    let mut engine = Engine::new(EngineConfig::default());
    let message: &[u8] = &[1, b'h', b'e', b'l', b'l', b'o'];

    for round in 0..10 {
        let outcome = engine.process_input(message).expect("process_input");
        println!(
            "round {round:>2}: nodes={:<4} edges={:<4} output={:?}",
            engine.graph.node_count(),
            engine.graph.edge_count(),
            String::from_utf8_lossy(&outcome.output),
        );
    }
}
