//! Strand-based meshing of branching plant skeletons.
//!
//! Main components:
//! - [`graph`]: the input skeleton and its traversals.
//! - [`frame`]: per-node coordinate frames.
//! - [`placement`]: leaf strand generation and bundle merging.
//! - [`pbd`]: position-based-dynamics packing of node bundles.
//! - [`attractor`]: attraction points driving the packer.
//! - [`strand`]: strands, particles and the per-node particle index.
//! - [`spline`]: centripetal Catmull-Rom resampling.
//! - [`plane`]: least-squares plane fitting.
//! - [`cross_section`]: planar slices through the bundle.
//! - [`triangulate`]: Delaunay triangulation and boundary loops.
//! - [`mesh`] / [`normals`]: mesh assembly and vertex normals.
//! - [`pipeline`]: the end-to-end run.
//! - [`config`] / [`error`] / [`types`]: parameters, errors, shared ids.

pub mod attractor;
pub mod config;
pub mod cross_section;
pub mod error;
pub mod frame;
pub mod graph;
pub mod mesh;
pub mod normals;
pub mod pbd;
pub mod pipeline;
pub mod placement;
pub mod plane;
pub mod spline;
pub mod strand;
pub mod triangulate;
pub mod types;

pub use config::Config;
pub use error::StrandError;
pub use graph::PlantGraph;
pub use mesh::Mesh;
pub use pipeline::{PipelineOutput, StrandPipeline};
