//! Error types.
//!
//! Structural and configuration errors are returned synchronously. Render,
//! input and layout failures are caught per node by the pipeline, logged and
//! degraded, so they never escape a frame.

use thiserror::Error;

use crate::engine::NodeId;

/// Errors produced by spark-panels.
#[derive(Error, Debug)]
pub enum Error {
    /// A node id that is not (or no longer) in the tree.
    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),

    /// A node was added as its own child.
    #[error("node {0:?} cannot be its own child")]
    SelfChild(NodeId),

    /// Adding the child would make it an ancestor of itself.
    #[error("adding {child:?} under {parent:?} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },

    /// Children were added to a node that is not a panel.
    #[error("node {0:?} is not a panel")]
    NotAPanel(NodeId),

    /// A grid track token could not be parsed.
    #[error("invalid grid track {token:?}: expected N, N*, * or auto")]
    InvalidTrack { token: String },

    /// The registry has no constructor for this kind.
    #[error("unknown widget kind {0:?}")]
    UnknownKind(String),

    /// Widget configuration could not be read.
    #[error("invalid widget configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// A widget failed while drawing itself.
    #[error("render failed: {0}")]
    Render(String),

    /// A widget failed while handling input.
    #[error("input handling failed: {0}")]
    Input(String),

    /// A data source could not produce rows.
    #[error("data source failed: {0}")]
    Data(String),

    /// Writing CSV export output failed.
    #[error("csv export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
