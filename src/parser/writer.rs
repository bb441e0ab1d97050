use std::fmt::{self, Display, Formatter};

use super::grammar::{PortAssign, PortTarget, TreeSource};
use crate::PortType;

/// Renders a structural form back into description syntax.
///
/// The output is canonical rather than a copy of any original text:
/// conditional sugar and variable initializers appear in their desugared
/// form, indentation is normalized and comments are gone. Parsing the output
/// reproduces the same structural form, which also makes the renderer usable
/// for trees that were never parsed from text.
pub fn write_source(source: &TreeSource) -> String {
    source.to_string()
}

impl Display for TreeSource<'_> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        for (i, tree) in self.trees.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "tree {}", tree.name)?;
            if !tree.params.is_empty() {
                f.write_str("(")?;
                for (i, param) in tree.params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    let dir = match param.direction {
                        PortType::Input => "in",
                        PortType::Output => "out",
                        PortType::InOut => "inout",
                    };
                    write!(f, "{dir} {}", param.name)?;
                }
                f.write_str(")")?;
            }
            f.write_str(" = ")?;
            write_node(f, &tree.root, 0)?;
            writeln!(f)?;
        }
        Ok(())
    }
}

fn write_node(
    f: &mut Formatter,
    node: &super::grammar::NodeExpr,
    depth: usize,
) -> fmt::Result {
    f.write_str(node.ty)?;
    if !node.ports.is_empty() {
        f.write_str("(")?;
        for (i, assign) in node.ports.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write_port(f, assign)?;
        }
        f.write_str(")")?;
    }
    if node.vars.is_empty() && node.children.is_empty() {
        return Ok(());
    }
    f.write_str(" {\n")?;
    let inner = "    ".repeat(depth + 1);
    for var in &node.vars {
        writeln!(f, "{inner}var {var}")?;
    }
    for child in &node.children {
        f.write_str(&inner)?;
        write_node(f, child, depth + 1)?;
        writeln!(f)?;
    }
    write!(f, "{}}}", "    ".repeat(depth))
}

fn write_port(f: &mut Formatter, assign: &PortAssign) -> fmt::Result {
    let arrow = match assign.direction {
        PortType::Input => "<-",
        PortType::Output => "->",
        PortType::InOut => "<->",
    };
    write!(f, "{} {arrow} ", assign.port)?;
    match assign.target {
        PortTarget::Key(key) => f.write_str(key),
        PortTarget::Literal(ref value) => {
            let escaped = value.replace('\\', "\\\\").replace('\n', "\\n");
            write!(f, "\"{escaped}\"")
        }
    }
}
