use super::*;

fn tree<'src>(name: &'src str, root: NodeExpr<'src>) -> TreeDecl<'src> {
    TreeDecl {
        name,
        params: vec![],
        root,
    }
}

#[test]
fn tree_with_a_child() {
    let source = parse_source(
        "tree main = Sequence {
            DoThing
        }",
    )
    .unwrap();
    assert_eq!(
        source,
        TreeSource {
            trees: vec![tree(
                "main",
                NodeExpr::with_children("Sequence", vec![NodeExpr::leaf("DoThing")]),
            )],
        }
    );
}

#[test]
fn port_arrows_set_directions() {
    let source = parse_source(
        r#"tree main = Node(a <- key, b -> sink, c <-> shared)"#,
    )
    .unwrap();
    assert_eq!(
        source,
        TreeSource {
            trees: vec![tree(
                "main",
                NodeExpr {
                    ty: "Node",
                    ports: vec![
                        PortAssign {
                            direction: PortType::Input,
                            port: "a",
                            target: PortTarget::Key("key"),
                        },
                        PortAssign {
                            direction: PortType::Output,
                            port: "b",
                            target: PortTarget::Key("sink"),
                        },
                        PortAssign {
                            direction: PortType::InOut,
                            port: "c",
                            target: PortTarget::Key("shared"),
                        },
                    ],
                    children: vec![],
                    vars: vec![],
                },
            )],
        }
    );
}

#[test]
fn literals_decode_escapes() {
    let source = parse_source(r#"tree main = Say(message <- "line\none\\two")"#).unwrap();
    assert_eq!(
        source.trees[0].root.ports[0].target,
        PortTarget::Literal("line\none\\two".to_string())
    );
}

#[test]
fn literal_on_an_output_port_is_rejected() {
    assert!(matches!(
        parse_source(r#"tree main = Node(out -> "value")"#),
        Err(BuildError::Syntax { .. })
    ));
}

#[test]
fn subtree_params() {
    let source = parse_source(
        "tree sub(in port, out result, inout state) = Noop",
    )
    .unwrap();
    assert_eq!(
        source.trees[0].params,
        vec![
            ParamDecl {
                direction: PortType::Input,
                name: "port",
            },
            ParamDecl {
                direction: PortType::Output,
                name: "result",
            },
            ParamDecl {
                direction: PortType::InOut,
                name: "state",
            },
        ]
    );
}

#[test]
fn if_else_desugars_to_three_children() {
    let source = parse_source(
        "tree main = Sequence {
            if (Check(door <- front)) {
                Open
            } else {
                Knock
                Wait
            }
        }",
    )
    .unwrap();
    let if_node = &source.trees[0].root.children[0];
    assert_eq!(if_node.ty, "if");
    assert_eq!(if_node.children.len(), 3);
    assert_eq!(if_node.children[0].ty, "Check");
    assert_eq!(
        if_node.children[1],
        NodeExpr::with_children("Sequence", vec![NodeExpr::leaf("Open")])
    );
    assert_eq!(
        if_node.children[2],
        NodeExpr::with_children(
            "Sequence",
            vec![NodeExpr::leaf("Knock"), NodeExpr::leaf("Wait")]
        )
    );
}

#[test]
fn if_without_else_has_two_children() {
    let source = parse_source(
        "tree main = Sequence {
            if (Check) {
                Open
            }
        }",
    )
    .unwrap();
    let if_node = &source.trees[0].root.children[0];
    assert_eq!(if_node.ty, "if");
    assert_eq!(if_node.children.len(), 2);
}

#[test]
fn operators_desugar_with_precedence() {
    // `&&` binds tighter than `||`, `!` tighter than both.
    let source = parse_source("tree main = Fallback { !a || b && c }").unwrap();
    assert_eq!(
        source.trees[0].root.children[0],
        NodeExpr::with_children(
            "Fallback",
            vec![
                NodeExpr::with_children("Inverter", vec![NodeExpr::leaf("a")]),
                NodeExpr::with_children("Sequence", vec![NodeExpr::leaf("b"), NodeExpr::leaf("c")]),
            ],
        )
    );
}

#[test]
fn grouping_overrides_precedence() {
    let source = parse_source("tree main = Sequence { (a || b) && c }").unwrap();
    assert_eq!(
        source.trees[0].root.children[0],
        NodeExpr::with_children(
            "Sequence",
            vec![
                NodeExpr::with_children("Fallback", vec![NodeExpr::leaf("a"), NodeExpr::leaf("b")]),
                NodeExpr::leaf("c"),
            ],
        )
    );
}

#[test]
fn var_with_initializer_desugars_to_set_bool() {
    let source = parse_source(
        "tree main = Sequence {
            var flag = true
            flag
        }",
    )
    .unwrap();
    let root = &source.trees[0].root;
    assert_eq!(root.vars, vec!["flag"]);
    assert_eq!(
        root.children[0],
        NodeExpr {
            ty: "SetBool",
            ports: vec![
                PortAssign {
                    direction: PortType::Input,
                    port: "value",
                    target: PortTarget::Literal("true".to_string()),
                },
                PortAssign {
                    direction: PortType::Output,
                    port: "output",
                    target: PortTarget::Key("flag"),
                },
            ],
            children: vec![],
            vars: vec![],
        }
    );
    // The bare reference is left alone; the loader resolves it.
    assert_eq!(root.children[1], NodeExpr::leaf("flag"));
}

#[test]
fn uninitialized_var_only_declares() {
    let source = parse_source(
        "tree main = Sequence {
            var flag
        }",
    )
    .unwrap();
    let root = &source.trees[0].root;
    assert_eq!(root.vars, vec!["flag"]);
    assert!(root.children.is_empty());
}

#[test]
fn identifiers_may_start_with_keywords() {
    // `iffy` and `variable` must not be cut short by the `if`/`var` tags.
    let source = parse_source(
        "tree main = Sequence {
            iffy
            variable
        }",
    )
    .unwrap();
    assert_eq!(
        source.trees[0].root.children,
        vec![NodeExpr::leaf("iffy"), NodeExpr::leaf("variable")]
    );
}

#[test]
fn comments_and_blank_lines_are_skipped() {
    let source = parse_source(
        "# a header comment
        tree main = Sequence { # trailing comment
            # a lone comment line

            DoThing
        }

        # trailing file comment
        ",
    )
    .unwrap();
    assert_eq!(source.trees.len(), 1);
    assert_eq!(source.trees[0].root.children, vec![NodeExpr::leaf("DoThing")]);
}

#[test]
fn multiple_trees_parse() {
    let source = parse_source(
        "tree main = Sub
        tree Sub = Noop",
    )
    .unwrap();
    assert_eq!(source.trees.len(), 2);
    assert_eq!(source.trees[1].name, "Sub");
}

#[test]
fn trailing_comma_in_ports_is_allowed() {
    let source = parse_source(
        "tree main = Node(
            a <- key,
            b -> sink,
        )",
    )
    .unwrap();
    assert_eq!(source.trees[0].root.ports.len(), 2);
}

#[test]
fn unclosed_brace_reports_the_offending_token() {
    let err = parse_source("tree main = Sequence {").unwrap_err();
    assert!(matches!(err, BuildError::Syntax { ref near } if near == "{"));
}

#[test]
fn garbage_after_a_tree_is_an_error() {
    assert!(matches!(
        parse_source("tree main = Noop ???"),
        Err(BuildError::Syntax { .. })
    ));
}
