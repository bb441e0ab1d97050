//! Parsing, loading and rendering of tree descriptions.
//!
//! [`parse_source`] turns text into a [`TreeSource`], [`load`] instantiates
//! its `main` tree against a [`Registry`](crate::Registry), and
//! [`write_source`] renders a structural form back into text. [`load_yaml`]
//! offers the same instantiation for the simpler YAML format.

mod grammar;
mod loader;
mod writer;
mod yaml;

pub use self::grammar::{
    parse_source, NodeExpr, ParamDecl, PortAssign, PortTarget, TreeDecl, TreeSource,
};
pub use self::loader::load;
pub use self::writer::write_source;
pub use self::yaml::load_yaml;
