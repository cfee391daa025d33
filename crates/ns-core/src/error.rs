//! Error taxonomy shared by every NetSketch crate.
//!
//! - [`FormatError`]: a persisted topology that is malformed or semantically
//!   invalid. Surfaced to the user; the canvas is left untouched.
//! - [`StateError`]: an internal invariant violation. These are bugs in the
//!   caller, never user errors.
//! - [`StoreError`]: storage failure while saving or loading a topology file.
//! - [`LaunchError`]: the emulator process could not be started.

use std::path::PathBuf;

use crate::name::{NodeKind, NodeName};

/// A persisted topology that cannot be accepted.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("invalid topology JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("edge #{index} has {len} endpoints, expected 2")]
    Arity { index: usize, len: usize },

    #[error("edge #{index} connects {id} to itself")]
    SelfLoop { index: usize, id: String },

    #[error(
        "edge #{index} references invalid node id {id:?} (expected h<N> or s<N> with 1 <= N <= 18446744073709551615)"
    )]
    InvalidId { index: usize, id: String },
}

/// Internal bookkeeping invariant violated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    #[error("{0} was never allocated")]
    NotAllocated(NodeName),

    #[error("{0} is already in the free pool")]
    AlreadyReleased(NodeName),

    #[error("{0} is already assigned to a live node")]
    AlreadyAllocated(NodeName),

    #[error("every {0} number has been issued")]
    Exhausted(NodeKind),

    #[error("node handle {0} does not exist")]
    UnknownNode(usize),

    #[error("link handle {0} does not exist")]
    UnknownLink(usize),

    #[error("text handle {0} does not exist")]
    UnknownText(u32),

    #[error("link {link} is not incident on node {node}")]
    LinkNotIncident { node: usize, link: usize },

    #[error("link {link} is already registered on node {node}")]
    LinkAlreadyRegistered { node: usize, link: usize },

    #[error("a link cannot connect node {0} to itself")]
    SelfLink(usize),

    #[error("node {node} still has {count} incident link(s)")]
    NodeHasLinks { node: usize, count: usize },

    #[error("link {0} is still registered on an endpoint")]
    LinkStillRegistered(usize),
}

/// Failure while reading or writing a topology file.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to finalize {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not a valid topology: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: FormatError,
    },
}

/// The emulator hand-off failed before the external process started.
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("emulator command is empty")]
    EmptyCommand,

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Umbrella error for callers that do not care which layer failed.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Launch(#[from] LaunchError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
