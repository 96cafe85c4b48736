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

//! Reference CLI for driving an `Engine` from a shell: create a brain
//! file, reopen one, feed it bytes on a port, or dump its stats. Argument
//! parsing is hand-rolled rather than pulled in via a CLI crate — this
//! binary exists for manual poking and test fixtures, not as a product
//! surface worth a dependency.

use std::path::PathBuf;
use std::process::ExitCode;

use melvin_core::{Engine, EngineConfig};

fn usage() -> &'static str {
    "usage: melvin <command> [args]\n\n\
commands:\n\
  create-file <path>                    create an empty brain file\n\
  open-file <path>                      open a brain file and print its stats\n\
  process-bytes <path> <port> <hex>     feed hex-encoded bytes on a port, print output\n\
  dump-stats <path>                     print node/edge counts and adaptation count\n\
  route <in_port> <out_port> <path>     alias for process-bytes reading stdin as hex\n"
}

fn parse_hex(s: &str) -> Result<Vec<u8>, String> {
    if s.len() % 2 != 0 {
        return Err(format!("hex string {s:?} has odd length"));
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).map_err(|e| e.to_string()))
        .collect()
}

fn run(args: &[String]) -> Result<(), String> {
    let Some(command) = args.first() else {
        return Err(usage().to_string());
    };

    match command.as_str() {
        "create-file" => {
            let path: PathBuf = args.get(1).ok_or("create-file requires <path>")?.into();
            let mut engine = Engine::new(EngineConfig::default());
            engine.save_to_path(&path).map_err(|e| e.to_string())?;
            println!("created brain file at {}", path.display());
            Ok(())
        }
        "open-file" => {
            let path: PathBuf = args.get(1).ok_or("open-file requires <path>")?.into();
            let engine = Engine::open_from_path(&path, EngineConfig::default()).map_err(|e| e.to_string())?;
            println!(
                "opened {}: {} nodes, {} edges, adaptation_count={}",
                path.display(),
                engine.graph.node_count(),
                engine.graph.edge_count(),
                engine.adaptation_count()
            );
            Ok(())
        }
        "process-bytes" => {
            let path: PathBuf = args.get(1).ok_or("process-bytes requires <path>")?.into();
            let port: u8 = args
                .get(2)
                .ok_or("process-bytes requires <port>")?
                .parse()
                .map_err(|_| "port must be a u8".to_string())?;
            let hex = args.get(3).ok_or("process-bytes requires <hex>")?;
            let data = parse_hex(hex)?;

            let mut engine = if path.exists() {
                Engine::open_from_path(&path, EngineConfig::default()).map_err(|e| e.to_string())?
            } else {
                Engine::new(EngineConfig::default())
            };

            let mut buf = Vec::with_capacity(1 + data.len());
            buf.push(port);
            buf.extend_from_slice(&data);
            let outcome = engine.process_input(&buf).map_err(|e| e.to_string())?;
            engine.save_to_path(&path).map_err(|e| e.to_string())?;

            println!("output: {}", hex_encode(&outcome.output));
            Ok(())
        }
        "dump-stats" => {
            let path: PathBuf = args.get(1).ok_or("dump-stats requires <path>")?.into();
            let engine = Engine::open_from_path(&path, EngineConfig::default()).map_err(|e| e.to_string())?;
            println!("nodes: {}", engine.graph.node_count());
            println!("edges: {}", engine.graph.edge_count());
            println!("adaptation_count: {}", engine.adaptation_count());
            Ok(())
        }
        "route" => {
            let in_port: u8 = args.get(1).ok_or("route requires <in_port>")?.parse().map_err(|_| "bad in_port")?;
            let _out_port: u8 = args.get(2).ok_or("route requires <out_port>")?.parse().map_err(|_| "bad out_port")?;
            let path: PathBuf = args.get(3).ok_or("route requires <path>")?.into();

            let mut hex_input = String::new();
            std::io::stdin().read_line(&mut hex_input).map_err(|e| e.to_string())?;
            let data = parse_hex(hex_input.trim())?;

            let mut engine = if path.exists() {
                Engine::open_from_path(&path, EngineConfig::default()).map_err(|e| e.to_string())?
            } else {
                Engine::new(EngineConfig::default())
            };
            let mut buf = vec![in_port];
            buf.extend_from_slice(&data);
            let outcome = engine.process_input(&buf).map_err(|e| e.to_string())?;
            engine.save_to_path(&path).map_err(|e| e.to_string())?;
            println!("{}", hex_encode(&outcome.output));
            Ok(())
        }
        "help" | "--help" | "-h" => {
            println!("{}", usage());
            Ok(())
        }
        other => Err(format!("unknown command {other:?}\n\n{}", usage())),
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn main() -> ExitCode {
    melvin_core::logging::init_logging("info");
    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}
