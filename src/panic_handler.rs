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

//! Panic containment for the outermost call boundary a host wraps a port
//! driver's `process_input` call in. `process_input` itself has no async
//! surface (it runs synchronously to completion per the engine's
//! single-threaded cooperative scheduling model), so only the synchronous
//! variant is carried.

use std::panic::{self, UnwindSafe};
use tracing::error;

pub type PanicResult<T> = Result<T, PanicError>;

#[derive(Debug, Clone)]
pub struct PanicError {
    pub message: String,
}

impl std::fmt::Display for PanicError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "panic: {}", self.message)
    }
}

impl std::error::Error for PanicError {}

/// Catch a panic in a closure and turn it into a `Result`.
pub fn catch_panic<F, T>(operation_name: &str, f: F) -> PanicResult<T>
where
    F: FnOnce() -> T + UnwindSafe,
{
    match panic::catch_unwind(f) {
        Ok(result) => Ok(result),
        Err(payload) => {
            let message = extract_panic_message(&payload);
            error!(operation = operation_name, %message, "panic recovered");
            Err(PanicError {
                message: format!("{operation_name}: {message}"),
            })
        }
    }
}

fn extract_panic_message(payload: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Install a global panic hook that logs location and message via `tracing`
/// before the default hook runs. Intended to be called once at host
/// startup, not by the engine itself.
pub fn install_panic_hook() {
    panic::set_hook(Box::new(|panic_info| {
        let location = panic_info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_else(|| "unknown location".to_string());

        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic message".to_string()
        };

        error!(%location, %message, "panic");
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catch_panic_returns_ok_on_success() {
        let result = catch_panic("test", || 42);
        assert_eq!(result.unwrap(), 42);
    }

    #[test]
    fn catch_panic_returns_err_on_panic() {
        let result = catch_panic("test", || -> i32 { panic!("boom") });
        let err = result.unwrap_err();
        assert!(err.message.contains("boom"));
    }
}
