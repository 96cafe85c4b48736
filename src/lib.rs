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

//! Melvin is a byte-in, byte-out associative graph engine: feed it a
//! stream of bytes tagged with a port id, and it grows a directed
//! weighted graph of the patterns it has seen, spreads activation
//! through that graph, and — once enough of the graph agrees it is
//! ready to — emits bytes of its own.
//!
//! Nothing in here ever consults graph-wide statistics. Every threshold,
//! average, and learning rate a module computes is derived from a single
//! node's own 1- or 2-hop neighborhood.

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const BRAIN_FILE_VERSION: u32 = brainfile::VERSION;

pub mod brainfile;
pub mod config;
pub mod edge;
pub mod edge_formation;
pub mod engine;
pub mod error;
pub mod frame;
pub mod graph;
pub mod hierarchy;
pub mod ingest;
pub mod logging;
pub mod metrics;
pub mod node;
pub mod output;
pub mod panic_handler;
pub mod rng;
pub mod rolling;
pub mod stats;
pub mod wave;

pub use config::EngineConfig;
pub use engine::{Engine, ProcessOutcome, SharedEngine};
pub use error::{EngineError, EngineResult};
pub use frame::PortFrame;
pub use graph::Graph;
