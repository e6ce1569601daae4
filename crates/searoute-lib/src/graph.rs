//! Routing graph compiled from a triplicated network.
//!
//! Consecutive coordinates of every routable line become an undirected edge.
//! Coordinates that round to the same grid cell (at the configured tolerance)
//! share a vertex, which is how separate features connect into one network.
//!
//! # Serialization Format
//!
//! ```text
//! Header (16 bytes):
//!   - Magic: b"SRGR" (4 bytes)
//!   - Version: u8 (1 byte)
//!   - Flags: u8 (1 byte) - bit 0: edges carry feature ids
//!   - Vertex count: u32 (4 bytes)
//!   - Edge count: u32 (4 bytes)
//!   - Reserved: 2 bytes
//!
//! Body:
//!   - postcard-serialized graph (tolerance, network fingerprint, vertices, edges)
//!   - zstd compressed
//!
//! Footer (32 bytes):
//!   - SHA-256 checksum of compressed body
//! ```

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::geodesy::Coordinate;
use crate::network::Network;
use crate::weight::{EdgeData, WeightFn};

/// Default vertex merge tolerance in degrees.
pub const DEFAULT_TOLERANCE: f64 = 1e-5;

const GRAPH_MAGIC: &[u8; 4] = b"SRGR";

const GRAPH_VERSION: u8 = 2;

const FLAG_HAS_FEATURE_IDS: u8 = 0x01;

const HEADER_SIZE: usize = 16;

const CHECKSUM_SIZE: usize = 32;

/// zstd compression level (balanced speed/ratio).
const COMPRESSION_LEVEL: i32 = 3;

type VertexKey = (i64, i64);

/// Undirected edge between two vertices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: usize,
    pub target: usize,
    pub data: EdgeData,
}

#[derive(Serialize, Deserialize)]
struct GraphArtifact {
    tolerance: f64,
    fingerprint: [u8; 32],
    vertices: Vec<Coordinate>,
    edges: Vec<GraphEdge>,
}

/// Compiled, immutable routing graph.
pub struct RoutingGraph {
    tolerance: f64,
    /// Fingerprint of the network the graph was compiled from.
    fingerprint: [u8; 32],
    /// Artifact file the graph was loaded from.
    source: Option<PathBuf>,
    vertices: Vec<Coordinate>,
    edges: Vec<GraphEdge>,
    /// `(neighbour, edge index)` pairs per vertex.
    adjacency: Vec<Vec<(usize, usize)>>,
    lookup: HashMap<VertexKey, usize>,
}

impl RoutingGraph {
    /// Compile every `LineString`/`MultiLineString` of `network` into a graph.
    pub fn compile(network: &Network, tolerance: f64) -> Result<Self> {
        validate_tolerance(tolerance)?;

        let mut vertices = Vec::new();
        let mut lookup = HashMap::new();
        let mut edges = Vec::new();

        for feature in &network.features {
            let data = EdgeData {
                fid: feature.fid,
                feature: feature.id,
                wrap_shift: feature.wrap_shift,
            };
            for line in feature.lines() {
                let mut previous: Option<usize> = None;
                for coordinate in line {
                    let key = vertex_key(coordinate, tolerance);
                    let vertex = *lookup.entry(key).or_insert_with(|| {
                        vertices.push(coordinate);
                        vertices.len() - 1
                    });
                    if let Some(source) = previous {
                        if source != vertex {
                            edges.push(GraphEdge {
                                source,
                                target: vertex,
                                data,
                            });
                        }
                    }
                    previous = Some(vertex);
                }
            }
        }

        let graph = Self::assemble(tolerance, network.fingerprint(), vertices, edges, lookup);
        info!(
            vertex_count = graph.vertex_count(),
            edge_count = graph.edge_count(),
            feature_count = network.len(),
            "compiled routing graph"
        );
        Ok(graph)
    }

    fn assemble(
        tolerance: f64,
        fingerprint: [u8; 32],
        vertices: Vec<Coordinate>,
        edges: Vec<GraphEdge>,
        lookup: HashMap<VertexKey, usize>,
    ) -> Self {
        let mut adjacency = vec![Vec::new(); vertices.len()];
        for (index, edge) in edges.iter().enumerate() {
            adjacency[edge.source].push((edge.target, index));
            adjacency[edge.target].push((edge.source, index));
        }
        Self {
            tolerance,
            fingerprint,
            source: None,
            vertices,
            edges,
            adjacency,
            lookup,
        }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// [`Network::fingerprint`] of the network this graph was compiled from.
    pub fn fingerprint(&self) -> [u8; 32] {
        self.fingerprint
    }

    /// Whether the graph was compiled from `network`.
    pub fn matches(&self, network: &Network) -> bool {
        self.fingerprint == network.fingerprint()
    }

    /// Artifact path, when the graph came from [`load`](Self::load).
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn vertex(&self, index: usize) -> Option<Coordinate> {
        self.vertices.get(index).copied()
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    /// Vertex matching `coordinate` within the graph tolerance.
    pub fn vertex_at(&self, coordinate: Coordinate) -> Option<usize> {
        self.lookup
            .get(&vertex_key(coordinate, self.tolerance))
            .copied()
    }

    /// Neighbours of a vertex as `(vertex, edge index)` pairs.
    pub fn neighbours(&self, vertex: usize) -> &[(usize, usize)] {
        self.adjacency
            .get(vertex)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Evaluate `weight_fn` once per edge.
    pub fn edge_weights(&self, weight_fn: &WeightFn) -> Vec<f64> {
        self.edges
            .iter()
            .map(|edge| {
                weight_fn(
                    self.vertices[edge.source],
                    self.vertices[edge.target],
                    &edge.data,
                )
            })
            .collect()
    }

    /// Serialize the graph to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        info!(
            path = %path.display(),
            vertices = self.vertices.len(),
            edges = self.edges.len(),
            "saving routing graph"
        );

        let artifact = GraphArtifact {
            tolerance: self.tolerance,
            fingerprint: self.fingerprint,
            vertices: self.vertices.clone(),
            edges: self.edges.clone(),
        };
        let serialized =
            postcard::to_allocvec(&artifact).map_err(|e| Error::GraphArtifactSerialize {
                message: format!("postcard serialization failed: {}", e),
            })?;

        let compressed =
            zstd::encode_all(serialized.as_slice(), COMPRESSION_LEVEL).map_err(|e| {
                Error::GraphArtifactSerialize {
                    message: format!("zstd compression failed: {}", e),
                }
            })?;

        let checksum = Sha256::digest(&compressed);

        let has_fids = self.edges.iter().any(|edge| edge.data.fid.is_some());
        let flags = if has_fids { FLAG_HAS_FEATURE_IDS } else { 0 };
        let vertex_count = count_field(self.vertices.len(), "vertex")?;
        let edge_count = count_field(self.edges.len(), "edge")?;

        let mut header = [0u8; HEADER_SIZE];
        header[0..4].copy_from_slice(GRAPH_MAGIC);
        header[4] = GRAPH_VERSION;
        header[5] = flags;
        header[6..10].copy_from_slice(&vertex_count.to_le_bytes());
        header[10..14].copy_from_slice(&edge_count.to_le_bytes());

        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(&header)?;
        writer.write_all(&compressed)?;
        writer.write_all(&checksum)?;
        writer.flush()?;

        info!(
            file_size = HEADER_SIZE + compressed.len() + CHECKSUM_SIZE,
            compressed_size = compressed.len(),
            "routing graph saved"
        );
        Ok(())
    }

    /// Load a graph saved with [`save`](Self::save).
    ///
    /// Any missing, truncated or corrupted file is reported as
    /// [`Error::GraphArtifactLoad`].
    pub fn load(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading routing graph");
        let load_error = |message: String| Error::GraphArtifactLoad {
            path: path.to_path_buf(),
            message,
        };

        let file =
            File::open(path).map_err(|e| load_error(format!("failed to open file: {}", e)))?;
        let file_size = file
            .metadata()
            .map_err(|e| load_error(format!("failed to read metadata: {}", e)))?
            .len() as usize;
        if file_size < HEADER_SIZE + CHECKSUM_SIZE {
            return Err(load_error(format!("file too small ({file_size} bytes)")));
        }
        let mut reader = BufReader::new(file);

        let mut header = [0u8; HEADER_SIZE];
        reader
            .read_exact(&mut header)
            .map_err(|e| load_error(format!("failed to read header: {}", e)))?;

        if &header[0..4] != GRAPH_MAGIC {
            return Err(load_error("invalid magic bytes".to_string()));
        }

        let version = header[4];
        if version != GRAPH_VERSION {
            return Err(load_error(format!(
                "unsupported version {} (expected {})",
                version, GRAPH_VERSION
            )));
        }

        let vertex_count = u32::from_le_bytes([header[6], header[7], header[8], header[9]]);
        let edge_count = u32::from_le_bytes([header[10], header[11], header[12], header[13]]);

        let mut compressed = vec![0u8; file_size - HEADER_SIZE - CHECKSUM_SIZE];
        reader
            .read_exact(&mut compressed)
            .map_err(|e| load_error(format!("failed to read compressed data: {}", e)))?;

        let mut stored_checksum = [0u8; CHECKSUM_SIZE];
        reader
            .read_exact(&mut stored_checksum)
            .map_err(|e| load_error(format!("failed to read checksum: {}", e)))?;

        let computed_checksum = Sha256::digest(&compressed);
        if computed_checksum.as_slice() != stored_checksum {
            return Err(load_error(
                "checksum mismatch - file may be corrupted".to_string(),
            ));
        }

        let decompressed = zstd::decode_all(compressed.as_slice())
            .map_err(|e| load_error(format!("zstd decompression failed: {}", e)))?;

        let artifact: GraphArtifact = postcard::from_bytes(&decompressed)
            .map_err(|e| load_error(format!("postcard deserialization failed: {}", e)))?;

        if artifact.vertices.len() != vertex_count as usize
            || artifact.edges.len() != edge_count as usize
        {
            warn!(
                expected_vertices = vertex_count,
                actual_vertices = artifact.vertices.len(),
                expected_edges = edge_count,
                actual_edges = artifact.edges.len(),
                "count mismatch in routing graph header"
            );
        }

        validate_tolerance(artifact.tolerance).map_err(|e| load_error(e.to_string()))?;
        let vertex_total = artifact.vertices.len();
        if let Some(edge) = artifact
            .edges
            .iter()
            .find(|edge| edge.source >= vertex_total || edge.target >= vertex_total)
        {
            return Err(load_error(format!(
                "edge {} -> {} references a missing vertex",
                edge.source, edge.target
            )));
        }

        let lookup = artifact
            .vertices
            .iter()
            .enumerate()
            .map(|(index, coordinate)| (vertex_key(*coordinate, artifact.tolerance), index))
            .collect();
        let mut graph = Self::assemble(
            artifact.tolerance,
            artifact.fingerprint,
            artifact.vertices,
            artifact.edges,
            lookup,
        );
        graph.source = Some(path.to_path_buf());

        info!(
            vertex_count = graph.vertex_count(),
            edge_count = graph.edge_count(),
            "loaded routing graph"
        );
        Ok(graph)
    }
}

impl std::fmt::Debug for RoutingGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutingGraph")
            .field("tolerance", &self.tolerance)
            .field("vertex_count", &self.vertices.len())
            .field("edge_count", &self.edges.len())
            .finish()
    }
}

/// Vertex merge tolerance must be a finite, positive number of degrees.
pub fn validate_tolerance(tolerance: f64) -> Result<()> {
    if tolerance.is_finite() && tolerance > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidOption {
            option: "tolerance",
            message: format!("expected a finite positive number of degrees, got {tolerance}"),
        })
    }
}

fn vertex_key(coordinate: Coordinate, tolerance: f64) -> VertexKey {
    (
        (coordinate.lon / tolerance).round() as i64,
        (coordinate.lat / tolerance).round() as i64,
    )
}

fn count_field(count: usize, what: &str) -> Result<u32> {
    u32::try_from(count).map_err(|_| Error::GraphArtifactSerialize {
        message: format!("{what} count {count} does not fit the header"),
    })
}
