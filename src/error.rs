//! Error types for tree construction and tick-time port resolution.
//!
//! Construction problems are fatal and surface as [`BuildError`]. Anything
//! that goes wrong during a tick is expressed as a node status instead; the
//! only tick-time error object is [`PortResolutionError`], which leaves carry
//! into a `Failure` result rather than propagate.

use crate::symbol::Symbol;
use thiserror::Error;

/// Fatal error while parsing or instantiating a tree description.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BuildError {
    #[error("syntax error near {near:?}")]
    Syntax { near: String },
    #[error("tree {0:?} does not exist")]
    MissingTree(String),
    #[error("tree {0:?} is defined more than once")]
    DuplicateTree(String),
    #[error("node type or subtree name not found: {0:?}")]
    UnknownNode(String),
    #[error("node type {0:?} is already registered")]
    DuplicateNode(String),
    #[error("node {node:?} does not declare a port named {port:?}")]
    UnknownPort { node: String, port: String },
    #[error("port {port:?} on node {node:?} is bound against its declared direction")]
    PortDirection { node: String, port: String },
    #[error("required input port {port:?} on node {node:?} is not bound")]
    UnboundPort { node: String, port: String },
    #[error("could not add a child to {node}")]
    AddChild {
        #[source]
        source: AddChildError,
        node: String,
    },
    #[error("subtree {0:?} recursively includes itself")]
    InfiniteRecursion(String),
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

/// A node refused a child in [`crate::BehaviorNode::add_child`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AddChildError {
    #[error("attempted to add more children than the node accepts")]
    TooManyChildren,
    #[error("the node does not take children")]
    LeafNode,
}

/// A required input port had no usable value at tick time.
///
/// Leaves turn this into a `Failure` status; it never crosses `tick` as an
/// `Err` and never panics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("input port {port:?} could not be resolved")]
pub struct PortResolutionError {
    pub port: Symbol,
}
