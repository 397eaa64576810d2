//! Error types for tessel.
//!
//! This module defines all error types used throughout the library.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`MeshError`].
pub type Result<T> = std::result::Result<T, MeshError>;

/// Errors that can occur during mesh operations.
#[derive(Error, Debug)]
pub enum MeshError {
    /// The mesh has no faces.
    #[error("mesh has no faces")]
    EmptyMesh,

    /// A face references an invalid vertex index.
    #[error("face {face} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The face index.
        face: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// A face has fewer than three corners or repeats a vertex.
    #[error("face {face} is degenerate (fewer than 3 or duplicate vertices)")]
    DegenerateFace {
        /// The face index.
        face: usize,
    },

    /// The mesh has non-manifold topology.
    #[error("mesh has non-manifold topology: {details}")]
    NonManifold {
        /// Description of the non-manifold condition.
        details: String,
    },

    /// A new face would touch a vertex that has no boundary gap left.
    #[error("vertex {vertex} is not on the boundary; cannot attach another face")]
    ComplexVertex {
        /// The vertex index.
        vertex: usize,
    },

    /// A new face would reuse a half-edge that already has a face.
    #[error("half-edge ({v0}, {v1}) already has an incident face")]
    ComplexEdge {
        /// Origin vertex of the half-edge.
        v0: usize,
        /// Destination vertex of the half-edge.
        v1: usize,
    },

    /// No free boundary gap was found to move a patch around a vertex.
    #[error("failed to re-link boundary around vertex {vertex}")]
    PatchRelinkFailed {
        /// The vertex index.
        vertex: usize,
    },

    /// A face handle is out of range or refers to a deleted face.
    #[error("face {face} does not exist or has been deleted")]
    InvalidFace {
        /// The face index.
        face: usize,
    },

    /// A polygon to triangulate has a non-manifold corner.
    #[error("face {face} is a non-manifold polygon (vertex {vertex})")]
    NonManifoldPolygon {
        /// The face index.
        face: usize,
        /// The first non-manifold vertex found on its boundary.
        vertex: usize,
    },

    /// Every triangulation of the polygon needs an edge that already exists.
    #[error("face {face} has no triangulation without duplicating an existing edge")]
    UnsatisfiablePolygon {
        /// The face index.
        face: usize,
    },

    /// A polygon exceeds the configured degree limit.
    #[error("face {face} has {degree} sides, limit is {max}")]
    PolygonTooLarge {
        /// The face index.
        face: usize,
        /// Number of sides of the face.
        degree: usize,
        /// The configured limit.
        max: usize,
    },

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error loading mesh from file.
    #[error("failed to load mesh from {path}: {message}")]
    LoadError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Error saving mesh to file.
    #[error("failed to save mesh to {path}: {message}")]
    SaveError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Unsupported file format.
    #[error("unsupported file format: {extension}")]
    UnsupportedFormat {
        /// The file extension.
        extension: String,
    },

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },
}

impl MeshError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        MeshError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }
}
