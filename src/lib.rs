//! # tick-tree
//!
//! A behavior tree execution engine: a node/status model, a blackboard with
//! typed port bindings, a declarative tree description format, and a tick
//! engine that drives a tree to completion.
//!
//! A behavior tree arbitrates between actions by propagating tick results
//! through composites (Sequence, Fallback, Parallel) and decorators. Leaves
//! do the actual work; everything above them is pure control flow.
//!
//! ## Defining a node
//!
//! Implement [`BehaviorNode`] for your type. A node reads and writes
//! blackboard values through the [`Context`], under whatever port names the
//! surrounding tree bound for it.
//!
//! ```rust
//! use tick_tree::{BehaviorCallback, BehaviorNode, Context, NodeStatus, PortSpec};
//!
//! struct IsWarm;
//!
//! impl BehaviorNode for IsWarm {
//!     fn provided_ports(&self) -> Vec<PortSpec> {
//!         vec![PortSpec::new_in("temperature")]
//!     }
//!
//!     fn tick(&mut self, _arg: BehaviorCallback, ctx: &mut Context) -> NodeStatus {
//!         match ctx.get_parse::<i32>("temperature") {
//!             Some(t) if t > 20 => NodeStatus::Success,
//!             _ => NodeStatus::Failure,
//!         }
//!     }
//! }
//! ```
//!
//! ## Describing a tree
//!
//! Trees are usually written in the description format and instantiated
//! against a [`Registry`] of node constructors:
//!
//! ```text
//! tree main = Sequence {
//!     IsWarm (temperature <- "25")
//!     OpenWindow
//! }
//! ```
//!
//! ```rust
//! use tick_tree::{
//!     boxify, load, parse_source, BehaviorCallback, BehaviorNode, Context,
//!     NodeStatus, Registry, TickEngine,
//! };
//!
//! # struct IsWarm;
//! # impl BehaviorNode for IsWarm {
//! #     fn tick(&mut self, _: BehaviorCallback, _: &mut Context) -> NodeStatus {
//! #         NodeStatus::Success
//! #     }
//! # }
//! # struct OpenWindow;
//! # impl BehaviorNode for OpenWindow {
//! #     fn tick(&mut self, _: BehaviorCallback, _: &mut Context) -> NodeStatus {
//! #         NodeStatus::Success
//! #     }
//! # }
//! # fn main() -> Result<(), tick_tree::error::BuildError> {
//! let source = parse_source(
//!     r#"tree main = Sequence {
//!     IsWarm (temperature <- "25")
//!     OpenWindow
//! }"#,
//! )?;
//!
//! let mut registry = Registry::default();
//! registry.register("IsWarm", boxify(|| IsWarm))?;
//! registry.register("OpenWindow", boxify(|| OpenWindow))?;
//!
//! let mut tree = load(&source, &registry, false)?;
//! let mut ctx = Context::default();
//! let outcome = TickEngine::with_budget(10).run(tree.as_mut(), &mut |_| None, &mut ctx);
//! assert!(outcome.succeeded());
//! # Ok(())
//! # }
//! ```
//!
//! ## Talking to the environment
//!
//! The first argument to `tick` is a [`BehaviorCallback`], a closure the host
//! supplies for nodes to exchange data with the environment without going
//! through the blackboard. Unlike blackboard values, the payloads are not
//! required to be `'static`, so a node can hand out references to stack data
//! for the duration of the call.
//!
//! ```rust
//! # use tick_tree::*;
//! # let mut tree = nodes::SequenceNode::default();
//! tree.tick(
//!     &mut |v: &dyn std::any::Any| {
//!         if let Some(msg) = v.downcast_ref::<&str>() {
//!             println!("{msg}");
//!         }
//!         None
//!     },
//!     &mut Context::default(),
//! );
//! ```
//!
//! ## Port access through symbols
//!
//! Blackboard keys are interned [`Symbol`]s. Nodes that tick frequently can
//! cache the interning with [`Lazy`]:
//!
//! ```rust
//! use tick_tree::{BehaviorCallback, BehaviorNode, Context, Lazy, NodeStatus, Symbol};
//!
//! struct CheckDoor;
//!
//! impl BehaviorNode for CheckDoor {
//!     fn tick(&mut self, _: BehaviorCallback, ctx: &mut Context) -> NodeStatus {
//!         static DOOR: Lazy<Symbol> = Lazy::new(|| "door".into());
//!         if ctx.get::<bool>(*DOOR).copied().unwrap_or(false) {
//!             NodeStatus::Success
//!         } else {
//!             NodeStatus::Failure
//!         }
//!     }
//! }
//! ```

mod bound;
mod context;
pub mod engine;
pub mod error;
pub mod nodes;
pub mod parser;
mod port;
mod registry;
mod symbol;

use std::any::Any;
use std::collections::HashMap;
use std::rc::Rc;

pub use crate::bound::BoundNode;
pub use crate::context::Context;
pub use crate::engine::{RunOutcome, TickEngine};
pub use crate::error::AddChildError;
pub use crate::nodes::{FallbackNode, SequenceNode, SubtreeNode};
pub use crate::parser::{load, load_yaml, parse_source, write_source, TreeSource};
pub use crate::port::{PortSpec, PortType};
pub use crate::registry::{boxify, Constructor, Registry};
pub use crate::symbol::Symbol;
pub use once_cell::sync::Lazy;

/// Result of ticking a node.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum NodeStatus {
    /// The node has never been ticked, or was halted. `tick` never returns
    /// this; it is the resting state between runs.
    Idle,
    /// The node needs more ticks to reach a result.
    Running,
    Success,
    Failure,
}

impl NodeStatus {
    /// Success or Failure; the statuses that end a run.
    pub fn is_terminal(self) -> bool {
        matches!(self, NodeStatus::Success | NodeStatus::Failure)
    }

    /// Swaps Success and Failure, leaving Running and Idle untouched.
    pub fn invert(self) -> Self {
        match self {
            NodeStatus::Success => NodeStatus::Failure,
            NodeStatus::Failure => NodeStatus::Success,
            other => other,
        }
    }
}

/// How a node port is bound in a tree description: either to a blackboard
/// key with a direction, or to a literal string usable on input ports only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortBinding {
    Ref(Symbol, PortType),
    Literal(String),
}

impl From<&str> for PortBinding {
    fn from(s: &str) -> Self {
        Self::Literal(s.to_owned())
    }
}

/// The key-value store nodes communicate through.
///
/// Values are behind `Rc` rather than `Box` because subtree parameter
/// passing copies entries across blackboard boundaries, and `Clone` is not
/// object safe. `Rc` gives a cheap object-safe copy without demanding
/// anything of the stored type beyond `Any`.
pub type Blackboard = HashMap<Symbol, Rc<dyn Any>>;

/// Per-node port bindings, keyed by the node's local port name.
pub type BBMap = HashMap<Symbol, PortBinding>;

/// Callback for nodes to exchange non-`'static` data with the host
/// environment during a tick.
pub type BehaviorCallback<'a> = &'a mut dyn FnMut(&dyn Any) -> Option<Box<dyn Any>>;

/// A single node in a behavior tree.
///
/// Composites and decorators accept children through [`add_child`]; the
/// default implementation refuses, which is the correct behavior for leaves.
/// Arity rules live in each implementation, so a decorator rejects a second
/// child and `if` rejects a fourth.
///
/// [`add_child`]: BehaviorNode::add_child
pub trait BehaviorNode {
    /// Ports this node reads or writes. The loader checks bindings in the
    /// description against this list when port checking is enabled.
    fn provided_ports(&self) -> Vec<PortSpec> {
        vec![]
    }

    /// Advances the node. Must not block; a node waiting on the environment
    /// returns [`NodeStatus::Running`] and is ticked again later.
    fn tick(&mut self, arg: BehaviorCallback, ctx: &mut Context) -> NodeStatus;

    /// Abandons any in-progress work and returns the node to its resting
    /// state. Must be idempotent. Composites forward this to their children.
    fn halt(&mut self) {}

    /// Attaches a child with its port bindings.
    fn add_child(
        &mut self,
        _node: Box<dyn BehaviorNode>,
        _ports: BBMap,
    ) -> Result<(), AddChildError> {
        Err(AddChildError::LeafNode)
    }
}

/// Shorthand for building a [`BBMap`] or [`Blackboard`] inline.
#[macro_export]
macro_rules! hash_map {
    () => {
        std::collections::HashMap::default()
    };
    ($($key:literal => $val:expr),+ $(,)?) => {{
        let mut ret = std::collections::HashMap::default();
        $(ret.insert($key.into(), $val.into());)+
        ret
    }};
}
