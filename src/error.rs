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

//! Error types for the engine.
//!
//! `EngineError` covers both the non-recoverable persistence failures and
//! the contained-at-the-call-boundary failures from `process_input`.

use std::io;

/// Errors the engine can raise.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Magic mismatch, truncated section, or an edge endpoint that does not
    /// resolve to a node. Non-recoverable at the `open` call.
    #[error("invalid brain file: {0}")]
    InvalidBrainFile(String),

    /// Read/write on the brain file failed.
    #[error("brain file io failure: {0}")]
    Io(#[from] io::Error),

    /// A collection failed to grow. The in-flight mutation was rolled back;
    /// the graph is left exactly as it was before the call.
    #[error("allocation failure: {0}")]
    AllocationFailure(String),

    /// Input buffer too short to contain port-id + timestamp + size.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
