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

//! The binary brain-file format: one flat, versioned, little-endian
//! layout holding the whole graph plus the universal input/output
//! buffers. Every multi-byte field is written and read explicitly via
//! `to_le_bytes`/`from_le_bytes` rather than a serialization crate, so the
//! on-disk shape is exactly the one this module describes — nothing a
//! derive macro might silently change across a dependency bump.
//!
//! Cached sums are never trusted from disk; [`open`] always finishes with
//! [`Graph::recompute_cached_sums`].

use std::io::{Read, Seek, SeekFrom, Write};

use crate::edge::{Edge, EdgeKind};
use crate::error::{EngineError, EngineResult};
use crate::graph::Graph;
use crate::node::Node;

pub const MAGIC: [u8; 8] = *b"MELVIN\0\0";
pub const VERSION: u32 = 1;
pub const HEADER_SIZE: usize = 104;

/// 33 bytes fixed + the payload: id(8)+null(1)+activation(4)+weight(4)+
/// bias(4)+abstraction_level(4)+payload_size(8).
const NODE_FIXED_LEN: usize = 33;
/// 25 bytes: from_id(9)+to_id(9)+direction(1)+activation(1)+weight(4)+kind(1).
const EDGE_FIXED_LEN: usize = 25;

#[derive(Debug, Clone)]
pub struct BrainFileHeader {
    pub version: u32,
    pub flags: u32,
    pub node_count: u64,
    pub edge_count: u64,
    pub input_size: u64,
    pub input_offset: u64,
    pub output_size: u64,
    pub output_offset: u64,
    pub nodes_offset: u64,
    pub edges_offset: u64,
    pub payloads_offset: u64,
    pub last_modified: u64,
    pub adaptation_count: u64,
}

impl BrainFileHeader {
    fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut b = [0u8; HEADER_SIZE];
        b[0..8].copy_from_slice(&MAGIC);
        b[8..12].copy_from_slice(&self.version.to_le_bytes());
        b[12..16].copy_from_slice(&self.flags.to_le_bytes());
        b[16..24].copy_from_slice(&self.node_count.to_le_bytes());
        b[24..32].copy_from_slice(&self.edge_count.to_le_bytes());
        b[32..40].copy_from_slice(&self.input_size.to_le_bytes());
        b[40..48].copy_from_slice(&self.input_offset.to_le_bytes());
        b[48..56].copy_from_slice(&self.output_size.to_le_bytes());
        b[56..64].copy_from_slice(&self.output_offset.to_le_bytes());
        b[64..72].copy_from_slice(&self.nodes_offset.to_le_bytes());
        b[72..80].copy_from_slice(&self.edges_offset.to_le_bytes());
        b[80..88].copy_from_slice(&self.payloads_offset.to_le_bytes());
        b[88..96].copy_from_slice(&self.last_modified.to_le_bytes());
        b[96..104].copy_from_slice(&self.adaptation_count.to_le_bytes());
        b
    }

    fn from_bytes(b: &[u8]) -> EngineResult<Self> {
        if b.len() < HEADER_SIZE {
            return Err(EngineError::InvalidBrainFile("truncated header".into()));
        }
        if b[0..8] != MAGIC {
            return Err(EngineError::InvalidBrainFile("magic bytes do not match".into()));
        }
        let version = u32::from_le_bytes(b[8..12].try_into().unwrap());
        if version != VERSION {
            return Err(EngineError::InvalidBrainFile(format!(
                "unsupported brain file version {version}, expected {VERSION}"
            )));
        }
        Ok(Self {
            version,
            flags: u32::from_le_bytes(b[12..16].try_into().unwrap()),
            node_count: u64::from_le_bytes(b[16..24].try_into().unwrap()),
            edge_count: u64::from_le_bytes(b[24..32].try_into().unwrap()),
            input_size: u64::from_le_bytes(b[32..40].try_into().unwrap()),
            input_offset: u64::from_le_bytes(b[40..48].try_into().unwrap()),
            output_size: u64::from_le_bytes(b[48..56].try_into().unwrap()),
            output_offset: u64::from_le_bytes(b[56..64].try_into().unwrap()),
            nodes_offset: u64::from_le_bytes(b[64..72].try_into().unwrap()),
            edges_offset: u64::from_le_bytes(b[72..80].try_into().unwrap()),
            payloads_offset: u64::from_le_bytes(b[80..88].try_into().unwrap()),
            last_modified: u64::from_le_bytes(b[88..96].try_into().unwrap()),
            adaptation_count: u64::from_le_bytes(b[96..104].try_into().unwrap()),
        })
    }
}

pub struct LoadedBrain {
    pub graph: Graph,
    pub input_buf: Vec<u8>,
    pub output_buf: Vec<u8>,
    pub adaptation_count: u64,
}

fn encode_node(node: &Node) -> Vec<u8> {
    let mut buf = Vec::with_capacity(NODE_FIXED_LEN + node.payload.len());
    buf.extend_from_slice(&node.id.to_le_bytes());
    buf.push(0); // null pad byte
    buf.extend_from_slice(&node.activation_strength.to_le_bytes());
    buf.extend_from_slice(&node.weight.to_le_bytes());
    buf.extend_from_slice(&node.bias.to_le_bytes());
    buf.extend_from_slice(&node.abstraction_level.to_le_bytes());
    buf.extend_from_slice(&(node.payload.len() as u64).to_le_bytes());
    buf.extend_from_slice(&node.payload);
    buf
}

fn decode_node<R: Read>(r: &mut R) -> EngineResult<Node> {
    let mut fixed = [0u8; NODE_FIXED_LEN];
    r.read_exact(&mut fixed)
        .map_err(|e| EngineError::InvalidBrainFile(format!("truncated node record: {e}")))?;
    let id = u64::from_le_bytes(fixed[0..8].try_into().unwrap());
    let activation_strength = f32::from_le_bytes(fixed[9..13].try_into().unwrap());
    let weight = f32::from_le_bytes(fixed[13..17].try_into().unwrap());
    let bias = f32::from_le_bytes(fixed[17..21].try_into().unwrap());
    let abstraction_level = u32::from_le_bytes(fixed[21..25].try_into().unwrap());
    let payload_size = u64::from_le_bytes(fixed[25..33].try_into().unwrap()) as usize;

    let mut payload = vec![0u8; payload_size];
    r.read_exact(&mut payload)
        .map_err(|e| EngineError::InvalidBrainFile(format!("truncated node payload: {e}")))?;

    let mut node = Node::new(id, payload);
    node.activation_strength = activation_strength;
    node.weight = weight;
    node.bias = bias;
    node.abstraction_level = abstraction_level;
    Ok(node)
}

fn edge_kind_byte(kind: EdgeKind) -> u8 {
    match kind {
        EdgeKind::CoActivation => 0,
        EdgeKind::Similarity => 1,
        EdgeKind::Context => 2,
        EdgeKind::Homeostatic => 3,
    }
}

fn edge_kind_from_byte(b: u8) -> EngineResult<EdgeKind> {
    match b {
        0 => Ok(EdgeKind::CoActivation),
        1 => Ok(EdgeKind::Similarity),
        2 => Ok(EdgeKind::Context),
        3 => Ok(EdgeKind::Homeostatic),
        other => Err(EngineError::InvalidBrainFile(format!("unknown edge kind byte {other}"))),
    }
}

fn encode_edge(from_id: u64, to_id: u64, edge: &Edge) -> Vec<u8> {
    let mut buf = Vec::with_capacity(EDGE_FIXED_LEN);
    buf.extend_from_slice(&from_id.to_le_bytes());
    buf.push(0);
    buf.extend_from_slice(&to_id.to_le_bytes());
    buf.push(0);
    buf.push(edge.direction as u8);
    buf.push(edge.activation as u8);
    buf.extend_from_slice(&edge.weight.to_le_bytes());
    buf.push(edge_kind_byte(edge.kind));
    buf
}

struct DecodedEdge {
    from_id: u64,
    to_id: u64,
    direction: bool,
    activation: bool,
    weight: f32,
    kind: EdgeKind,
}

fn decode_edge<R: Read>(r: &mut R) -> EngineResult<DecodedEdge> {
    let mut fixed = [0u8; EDGE_FIXED_LEN];
    r.read_exact(&mut fixed)
        .map_err(|e| EngineError::InvalidBrainFile(format!("truncated edge record: {e}")))?;
    let from_id = u64::from_le_bytes(fixed[0..8].try_into().unwrap());
    let to_id = u64::from_le_bytes(fixed[9..17].try_into().unwrap());
    let direction = fixed[18] != 0;
    let activation = fixed[19] != 0;
    let weight = f32::from_le_bytes(fixed[20..24].try_into().unwrap());
    let kind = edge_kind_from_byte(fixed[24])?;
    Ok(DecodedEdge { from_id, to_id, direction, activation, weight, kind })
}

fn read_sized_section<R: Read>(r: &mut R) -> EngineResult<Vec<u8>> {
    let mut len_buf = [0u8; 8];
    r.read_exact(&mut len_buf)
        .map_err(|e| EngineError::InvalidBrainFile(format!("truncated section length: {e}")))?;
    let len = u64::from_le_bytes(len_buf) as usize;
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)
        .map_err(|e| EngineError::InvalidBrainFile(format!("truncated section body: {e}")))?;
    Ok(buf)
}

fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Write the whole graph plus the universal input/output buffers to `w`.
pub fn save<W: Write>(
    graph: &Graph,
    input_buf: &[u8],
    output_buf: &[u8],
    adaptation_count: u64,
    mut w: W,
) -> EngineResult<()> {
    let node_count = graph.node_count() as u64;
    let edge_count = graph.edge_count() as u64;

    let nodes_offset = HEADER_SIZE as u64;
    let mut node_section = Vec::new();
    node_section.extend_from_slice(&node_count.to_le_bytes());
    for node in graph.nodes_iter() {
        node_section.extend_from_slice(&encode_node(node));
    }

    let edges_offset = nodes_offset + node_section.len() as u64;
    let mut edge_section = Vec::new();
    edge_section.extend_from_slice(&edge_count.to_le_bytes());
    for edge in graph.edges_iter() {
        let from_id = graph.node(edge.from).id;
        let to_id = graph.node(edge.to).id;
        edge_section.extend_from_slice(&encode_edge(from_id, to_id, edge));
    }

    let input_offset = edges_offset + edge_section.len() as u64;
    let input_size = input_buf.len() as u64;
    let output_offset = input_offset + 8 + input_size;
    let output_size = output_buf.len() as u64;

    let header = BrainFileHeader {
        version: VERSION,
        flags: 0,
        node_count,
        edge_count,
        input_size,
        input_offset,
        output_size,
        output_offset,
        nodes_offset,
        edges_offset,
        payloads_offset: 0,
        last_modified: unix_now(),
        adaptation_count,
    };

    w.write_all(&header.to_bytes())?;
    w.write_all(&node_section)?;
    w.write_all(&edge_section)?;
    w.write_all(&input_size.to_le_bytes())?;
    w.write_all(input_buf)?;
    w.write_all(&output_size.to_le_bytes())?;
    w.write_all(output_buf)?;
    Ok(())
}

/// Read a graph plus its input/output buffers back from `r`. Edges whose
/// endpoints cannot be resolved against a loaded node id are reported as
/// [`EngineError::InvalidBrainFile`]; cached weight sums are recomputed
/// from scratch rather than trusted from disk.
pub fn open<R: Read + Seek>(mut r: R) -> EngineResult<LoadedBrain> {
    let mut header_bytes = [0u8; HEADER_SIZE];
    r.read_exact(&mut header_bytes)?;
    let header = BrainFileHeader::from_bytes(&header_bytes)?;

    r.seek(SeekFrom::Start(header.nodes_offset))?;
    let mut count_buf = [0u8; 8];
    r.read_exact(&mut count_buf)?;
    let node_count = u64::from_le_bytes(count_buf);

    let mut graph = Graph::with_capacity(node_count.max(1) as usize, header.edge_count.max(1) as usize);
    let mut max_id: Option<u64> = None;
    for _ in 0..node_count {
        let node = decode_node(&mut r)?;
        max_id = Some(max_id.map_or(node.id, |m| m.max(node.id)));
        graph.restore_node(node);
    }
    graph.set_next_id(max_id.map_or(0, |m| m + 1));

    r.seek(SeekFrom::Start(header.edges_offset))?;
    r.read_exact(&mut count_buf)?;
    let edge_count = u64::from_le_bytes(count_buf);
    for _ in 0..edge_count {
        let decoded = decode_edge(&mut r)?;
        let from_idx = graph
            .index_for_id(decoded.from_id)
            .ok_or_else(|| EngineError::InvalidBrainFile(format!("edge references unknown from_id {}", decoded.from_id)))?;
        let to_idx = graph
            .index_for_id(decoded.to_id)
            .ok_or_else(|| EngineError::InvalidBrainFile(format!("edge references unknown to_id {}", decoded.to_id)))?;
        let mut edge = Edge::new(from_idx, to_idx, decoded.kind);
        edge.direction = decoded.direction;
        edge.activation = decoded.activation;
        edge.weight = decoded.weight;
        graph.restore_edge(from_idx, to_idx, edge);
    }
    graph.recompute_cached_sums();

    r.seek(SeekFrom::Start(header.input_offset))?;
    let input_buf = read_sized_section(&mut r)?;
    r.seek(SeekFrom::Start(header.output_offset))?;
    let output_buf = read_sized_section(&mut r)?;

    Ok(LoadedBrain {
        graph,
        input_buf,
        output_buf,
        adaptation_count: header.adaptation_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::EdgeKind;
    use std::io::Cursor;

    #[test]
    fn round_trip_preserves_node_and_edge_fields() {
        let mut g = Graph::new();
        let a = g.add_node(b"ab".to_vec());
        let b = g.add_node(b"cd".to_vec());
        g.node_mut(a).abstraction_level = 2;
        g.node_mut(a).bias = -0.25;
        let e = g.add_edge(a, b, EdgeKind::CoActivation);
        g.update_edge_weight(e, 0.75);

        let mut buf = Vec::new();
        save(&g, b"input", b"output", 7, &mut buf).unwrap();

        let loaded = open(Cursor::new(buf)).unwrap();
        assert_eq!(loaded.graph.node_count(), 2);
        assert_eq!(loaded.graph.edge_count(), 1);
        assert_eq!(loaded.input_buf, b"input");
        assert_eq!(loaded.output_buf, b"output");
        assert_eq!(loaded.adaptation_count, 7);

        let loaded_a = loaded.graph.index_for_id(0).unwrap();
        assert_eq!(loaded.graph.node(loaded_a).payload, b"ab");
        assert_eq!(loaded.graph.node(loaded_a).abstraction_level, 2);
        assert!((loaded.graph.node(loaded_a).bias - (-0.25)).abs() < 1e-6);

        let loaded_b = loaded.graph.index_for_id(1).unwrap();
        let edge_idx = loaded.graph.edge_between(loaded_a, loaded_b).unwrap();
        assert!((loaded.graph.edge(edge_idx).weight - 0.75).abs() < 1e-6);
        assert_eq!(loaded.graph.edge(edge_idx).kind, EdgeKind::CoActivation);
    }

    #[test]
    fn open_rejects_bad_magic() {
        let buf = vec![0u8; HEADER_SIZE];
        let err = open(Cursor::new(buf)).unwrap_err();
        assert!(matches!(err, EngineError::InvalidBrainFile(_)));
    }

    #[test]
    fn open_rejects_truncated_header() {
        let buf = vec![0u8; 10];
        let err = open(Cursor::new(buf)).unwrap_err();
        assert!(matches!(err, EngineError::Io(_)));
    }

    #[test]
    fn empty_graph_round_trips() {
        let g = Graph::new();
        let mut buf = Vec::new();
        save(&g, &[], &[], 0, &mut buf).unwrap();
        let loaded = open(Cursor::new(buf)).unwrap();
        assert_eq!(loaded.graph.node_count(), 0);
        assert_eq!(loaded.graph.edge_count(), 0);
    }

    #[test]
    fn next_id_resumes_after_max_loaded_id() {
        let mut g = Graph::new();
        g.add_node(vec![b'a']);
        g.add_node(vec![b'b']);
        let mut buf = Vec::new();
        save(&g, &[], &[], 0, &mut buf).unwrap();
        let mut loaded = open(Cursor::new(buf)).unwrap().graph;
        let next = loaded.add_node(vec![b'c']);
        assert_eq!(loaded.node(next).id, 2);
    }
}
