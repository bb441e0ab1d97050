use std::collections::HashSet;

use super::grammar::{NodeExpr, PortTarget, TreeSource};
use crate::error::BuildError;
use crate::nodes::{IsTrueNode, SubtreeNode, INPUT};
use crate::{BBMap, BehaviorNode, Blackboard, PortBinding, PortSpec, PortType, Registry};

/// Instantiates the `main` tree of a parsed source against a registry of
/// node constructors.
///
/// With `check_ports`, every port binding in the description is validated
/// against the node's [`provided_ports`](BehaviorNode::provided_ports)
/// before instantiation, so a misspelled or misdirected port fails the load
/// instead of misbehaving at tick time. Nodes that do not implement
/// `provided_ports` reject all bindings under checking; leave it off for
/// registries of such nodes.
pub fn load(
    source: &TreeSource,
    registry: &Registry,
    check_ports: bool,
) -> Result<Box<dyn BehaviorNode>, BuildError> {
    let mut names = HashSet::new();
    for tree in &source.trees {
        if !names.insert(tree.name) {
            return Err(BuildError::DuplicateTree(tree.name.to_string()));
        }
    }

    let main = source
        .trees
        .iter()
        .find(|tree| tree.name == "main")
        .ok_or_else(|| BuildError::MissingTree("main".to_string()))?;

    let top = TreeStack {
        name: "main",
        parent: None,
    };
    let scope = VarScope {
        vars: &[],
        parent: None,
    };
    let root = load_recurse(&main.root, registry, source, check_ports, &top, &scope)?;
    tracing::debug!(trees = source.trees.len(), "instantiated tree \"main\"");
    Ok(root)
}

/// Detects recursive subtree instantiation. A linked list threaded through
/// the call stack; walking the parent links enumerates every tree currently
/// being expanded.
///
/// Recursive trees would need lazy instantiation to be loadable at all,
/// since eager expansion of a self-referential tree never terminates. They
/// are rejected instead.
struct TreeStack<'a, 'src> {
    name: &'src str,
    parent: Option<&'a TreeStack<'a, 'src>>,
}

impl TreeStack<'_, '_> {
    fn contains(&self, name: &str) -> bool {
        self.name == name || self.parent.is_some_and(|parent| parent.contains(name))
    }
}

/// Variable names visible at one point of the description, innermost scope
/// first. Like [`TreeStack`], a linked list through the call stack.
struct VarScope<'a, 'src> {
    vars: &'a [&'src str],
    parent: Option<&'a VarScope<'a, 'src>>,
}

impl VarScope<'_, '_> {
    fn contains(&self, name: &str) -> bool {
        self.vars.iter().any(|var| *var == name)
            || self.parent.is_some_and(|parent| parent.contains(name))
    }
}

/// A bare identifier with no ports and no body that names neither a node
/// type nor a tree reads as a reference to an in-scope variable.
fn is_var_ref(
    expr: &NodeExpr,
    registry: &Registry,
    source: &TreeSource,
    scope: &VarScope,
) -> bool {
    expr.ports.is_empty()
        && expr.children.is_empty()
        && expr.vars.is_empty()
        && !registry.contains(expr.ty)
        && !source.trees.iter().any(|tree| tree.name == expr.ty)
        && scope.contains(expr.ty)
}

fn load_recurse(
    expr: &NodeExpr,
    registry: &Registry,
    source: &TreeSource,
    check_ports: bool,
    stack: &TreeStack,
    scope: &VarScope,
) -> Result<Box<dyn BehaviorNode>, BuildError> {
    let mut node = if let Some(node) = registry.build(expr.ty) {
        node
    } else if let Some(tree) = source.trees.iter().find(|tree| tree.name == expr.ty) {
        if stack.contains(expr.ty) {
            return Err(BuildError::InfiniteRecursion(expr.ty.to_string()));
        }
        let frame = TreeStack {
            name: expr.ty,
            parent: Some(stack),
        };
        // Variables do not cross tree boundaries.
        let sub_scope = VarScope {
            vars: &[],
            parent: None,
        };
        let sub_root =
            load_recurse(&tree.root, registry, source, check_ports, &frame, &sub_scope)?;
        let root_ports = bind_ports(&tree.root, &sub_root.provided_ports(), check_ports)?;
        let params = tree
            .params
            .iter()
            .map(|param| match param.direction {
                PortType::Input => PortSpec::new_in(param.name),
                PortType::Output => PortSpec::new_out(param.name),
                PortType::InOut => PortSpec::new_inout(param.name),
            })
            .collect();
        Box::new(SubtreeNode::new(
            sub_root,
            root_ports,
            Blackboard::new(),
            params,
        ))
    } else {
        return Err(BuildError::UnknownNode(expr.ty.to_string()));
    };

    let child_scope = VarScope {
        vars: &expr.vars,
        parent: Some(scope),
    };
    for child in &expr.children {
        let (child_node, ports) = if is_var_ref(child, registry, source, &child_scope) {
            let mut ports = BBMap::new();
            ports.insert(*INPUT, PortBinding::Ref(child.ty.into(), PortType::Input));
            (Box::new(IsTrueNode) as Box<dyn BehaviorNode>, ports)
        } else {
            let child_node =
                load_recurse(child, registry, source, check_ports, stack, &child_scope)?;
            let ports = bind_ports(child, &child_node.provided_ports(), check_ports)?;
            (child_node, ports)
        };
        node.add_child(child_node, ports)
            .map_err(|err| BuildError::AddChild {
                source: err,
                node: expr.ty.to_string(),
            })?;
    }

    Ok(node)
}

/// Converts a node's port assignments into bindings, validating them against
/// the provided port specs when checking is on. Unbound required input ports
/// are an error too, so a tree cannot silently starve a node.
fn bind_ports(
    expr: &NodeExpr,
    provided: &[PortSpec],
    check_ports: bool,
) -> Result<BBMap, BuildError> {
    let mut map = BBMap::new();
    for assign in &expr.ports {
        if check_ports {
            let spec = provided
                .iter()
                .find(|spec| spec.key == assign.port)
                .ok_or_else(|| BuildError::UnknownPort {
                    node: expr.ty.to_string(),
                    port: assign.port.to_string(),
                })?;
            if spec.ty != assign.direction && spec.ty != PortType::InOut {
                return Err(BuildError::PortDirection {
                    node: expr.ty.to_string(),
                    port: assign.port.to_string(),
                });
            }
        }
        map.insert(
            assign.port.into(),
            match assign.target {
                PortTarget::Key(key) => PortBinding::Ref(key.into(), assign.direction),
                PortTarget::Literal(ref value) => PortBinding::Literal(value.clone()),
            },
        );
    }
    if check_ports {
        for spec in provided {
            if spec.required && spec.ty.is_readable() && !map.contains_key(&spec.key) {
                return Err(BuildError::UnboundPort {
                    node: expr.ty.to_string(),
                    port: spec.key.to_string(),
                });
            }
        }
    }
    Ok(map)
}
