use std::collections::HashMap;

use serde::Deserialize;

use crate::error::BuildError;
use crate::{BBMap, BehaviorNode, PortBinding, PortType, Registry, Symbol};

/// One node of a YAML tree description.
#[derive(Debug, Deserialize)]
struct YamlNode {
    #[serde(rename = "type")]
    ty: String,
    #[serde(default)]
    ports: HashMap<String, String>,
    #[serde(default)]
    children: Vec<YamlNode>,
}

#[derive(Debug, Deserialize)]
struct YamlDoc {
    behavior_tree: HashMap<String, YamlNode>,
}

/// Loads a YAML tree description, returning one instantiated root per entry
/// under the `behavior_tree` mapping.
///
/// The YAML format has no direction arrows or literals; every port entry
/// binds a node port to a blackboard key bidirectionally. Subtrees,
/// variables and port checking are only available through the native
/// description syntax.
pub fn load_yaml(
    yaml: &str,
    registry: &Registry,
) -> Result<HashMap<String, Box<dyn BehaviorNode>>, BuildError> {
    let doc: YamlDoc = serde_yaml::from_str(yaml)?;
    doc.behavior_tree
        .into_iter()
        .map(|(name, node)| {
            let (node, _root_ports) = build_node(node, registry)?;
            Ok((name, node))
        })
        .collect()
}

fn build_node(
    node: YamlNode,
    registry: &Registry,
) -> Result<(Box<dyn BehaviorNode>, BBMap), BuildError> {
    let YamlNode { ty, ports, children } = node;
    let mut built = registry
        .build(&ty)
        .ok_or_else(|| BuildError::UnknownNode(ty.clone()))?;
    for child in children {
        let (child_node, child_ports) = build_node(child, registry)?;
        built
            .add_child(child_node, child_ports)
            .map_err(|err| BuildError::AddChild {
                source: err,
                node: ty.clone(),
            })?;
    }
    let map = ports
        .into_iter()
        .map(|(port, key)| {
            (
                Symbol::from(port.as_str()),
                PortBinding::Ref(key.as_str().into(), PortType::InOut),
            )
        })
        .collect();
    Ok((built, map))
}
