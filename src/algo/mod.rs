//! Mesh processing algorithms.
//!
//! - **Triangulation**: minimum-weight triangulation of polygon faces that
//!   never duplicates an existing edge ([`triangulate`])
//!
//! Long-running operations report through [`Progress`].

pub mod progress;
pub mod triangulate;

pub use progress::Progress;
