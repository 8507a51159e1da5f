//! Error types for the strand pipeline.
//!
//! Precondition violations (unknown node or strand ids) panic through slice
//! indexing. Everything listed here is either rejected up front
//! ([`ConfigError`]) or recoverable: the pipeline records it in
//! [`crate::pipeline::PipelineOutput::diagnostics`] and keeps going.

use thiserror::Error;

use crate::types::{NodeId, StrandId};

/// Invalid [`crate::config::Config`] parameter.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("`{0}` must be positive")]
    NotPositive(&'static str),

    #[error("`{name}` is out of range: {value}")]
    OutOfRange { name: &'static str, value: f32 },

    #[error("leaf profile radius {profile} must exceed particle radius {particle}")]
    ProfileTooSmall { profile: f32, particle: f32 },
}

/// Failure of a geometric primitive on degenerate input.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("at least {needed} points required, got {got}")]
    TooFewPoints { needed: usize, got: usize },

    #[error("points are collinear, no unique plane")]
    Collinear,

    #[error("triangulation produced no triangles for {points} points")]
    DegenerateTriangulation { points: usize },
}

/// Boundary vertex without a counterpart in the adjacent section.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("strand {strand} has no vertex in the adjacent section of segment ending at node {node}")]
pub struct StitchError {
    pub node: NodeId,
    pub strand: StrandId,
}

/// Top-level error of a pipeline run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StrandError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("cross-section {section} of segment ending at node {node}: {source}")]
    Section {
        node: NodeId,
        section: usize,
        #[source]
        source: GeometryError,
    },

    #[error("base section of node {node}: {source}")]
    Base {
        node: NodeId,
        #[source]
        source: GeometryError,
    },

    #[error(transparent)]
    Stitch(#[from] StitchError),

    #[error("strand {strand} has no particle at node {node}")]
    MissingParticle { strand: StrandId, node: NodeId },
}
