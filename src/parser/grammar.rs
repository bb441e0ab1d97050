//! The tree description grammar.
//!
//! A source file is a sequence of `tree name(params) = node` declarations.
//! Nodes take optional port assignments in parentheses and children in
//! braces. Conditional sugar (`if`/`else`, `!`, `&&`, `||`) and variable
//! declarations desugar into plain nodes at parse time, so the loader only
//! ever sees node expressions.

use nom::{
    branch::alt,
    bytes::complete::{is_not, tag},
    character::complete::{alpha1, alphanumeric1, char, multispace0, multispace1, none_of, space0},
    combinator::{map, opt, recognize, value},
    multi::{many0, separated_list0},
    sequence::{delimited, pair, preceded, terminated},
    IResult,
};

use crate::error::BuildError;
use crate::PortType;

/// A parsed description file: the canonical structural form of a set of
/// trees, from which actual node graphs are instantiated.
#[derive(Debug, PartialEq, Eq)]
pub struct TreeSource<'src> {
    pub trees: Vec<TreeDecl<'src>>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct TreeDecl<'src> {
    pub name: &'src str,
    pub params: Vec<ParamDecl<'src>>,
    pub root: NodeExpr<'src>,
}

/// A subtree parameter: `in x`, `out y` or `inout z`.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct ParamDecl<'src> {
    pub direction: PortType,
    pub name: &'src str,
}

#[derive(Debug, PartialEq, Eq)]
pub struct NodeExpr<'src> {
    pub ty: &'src str,
    pub ports: Vec<PortAssign<'src>>,
    pub children: Vec<NodeExpr<'src>>,
    /// Variable names declared in this node's body, usable as bare
    /// references by descendant nodes.
    pub vars: Vec<&'src str>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct PortAssign<'src> {
    pub direction: PortType,
    pub port: &'src str,
    pub target: PortTarget<'src>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum PortTarget<'src> {
    Key(&'src str),
    /// Escapes are decoded at parse time, so the value is owned.
    Literal(String),
}

enum Elem<'src> {
    Node(NodeExpr<'src>),
    Var {
        name: &'src str,
        init: Option<&'src str>,
    },
}

impl<'src> NodeExpr<'src> {
    pub(crate) fn leaf(ty: &'src str) -> Self {
        Self {
            ty,
            ports: vec![],
            children: vec![],
            vars: vec![],
        }
    }

    pub(crate) fn with_children(ty: &'src str, children: Vec<NodeExpr<'src>>) -> Self {
        Self {
            ty,
            ports: vec![],
            children,
            vars: vec![],
        }
    }

    /// Folds body elements into children, desugaring an initialized `var`
    /// declaration into a `SetBool` child and recording the declared name.
    fn from_body(ty: &'src str, ports: Vec<PortAssign<'src>>, elems: Vec<Elem<'src>>) -> Self {
        let mut children = vec![];
        let mut vars = vec![];
        for elem in elems {
            match elem {
                Elem::Node(node) => children.push(node),
                Elem::Var { name, init } => {
                    if let Some(init) = init {
                        children.push(NodeExpr {
                            ty: "SetBool",
                            ports: vec![
                                PortAssign {
                                    direction: PortType::Input,
                                    port: "value",
                                    target: PortTarget::Literal(init.to_string()),
                                },
                                PortAssign {
                                    direction: PortType::Output,
                                    port: "output",
                                    target: PortTarget::Key(name),
                                },
                            ],
                            children: vec![],
                            vars: vec![],
                        });
                    }
                    vars.push(name);
                }
            }
        }
        Self {
            ty,
            ports,
            children,
            vars,
        }
    }
}

fn ident(i: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ))(i)
}

fn line_comment(i: &str) -> IResult<&str, &str> {
    recognize(pair(char('#'), opt(is_not("\n\r"))))(i)
}

/// Any run of whitespace (including newlines) and line comments.
fn blank0(i: &str) -> IResult<&str, ()> {
    value(
        (),
        many0(alt((value((), multispace1), value((), line_comment)))),
    )(i)
}

fn open_paren(i: &str) -> IResult<&str, ()> {
    value((), delimited(space0, char('('), multispace0))(i)
}

fn close_paren(i: &str) -> IResult<&str, ()> {
    value((), delimited(multispace0, char(')'), space0))(i)
}

fn open_brace(i: &str) -> IResult<&str, ()> {
    value((), delimited(space0, char('{'), space0))(i)
}

fn close_brace(i: &str) -> IResult<&str, ()> {
    value((), delimited(space0, char('}'), space0))(i)
}

fn key_target(i: &str) -> IResult<&str, PortTarget> {
    let (i, key) = ident(i)?;
    Ok((i, PortTarget::Key(key)))
}

fn literal_target(i: &str) -> IResult<&str, PortTarget> {
    let (i, chars) = delimited(char('"'), many0(none_of("\"")), char('"'))(i)?;
    let text: String = chars.into_iter().collect();
    Ok((
        i,
        PortTarget::Literal(text.replace("\\\\", "\\").replace("\\n", "\n")),
    ))
}

fn port_assign(i: &str) -> IResult<&str, PortAssign> {
    let (i, port) = ident(i)?;
    let (i, arrow) = delimited(space0, alt((tag("<->"), tag("<-"), tag("->"))), space0)(i)?;
    let (i, target) = alt((key_target, literal_target))(i)?;
    let direction = match arrow {
        "<-" => PortType::Input,
        "->" => PortType::Output,
        _ => PortType::InOut,
    };
    // A literal can never be written to, so only input ports accept one.
    if matches!(target, PortTarget::Literal(_)) && direction != PortType::Input {
        return Err(nom::Err::Failure(nom::error::Error::new(
            i,
            nom::error::ErrorKind::Verify,
        )));
    }
    Ok((
        i,
        PortAssign {
            direction,
            port,
            target,
        },
    ))
}

fn port_assigns(i: &str) -> IResult<&str, Vec<PortAssign>> {
    let (i, list) = separated_list0(
        delimited(multispace0, char(','), multispace0),
        port_assign,
    )(i)?;
    let (i, _) = opt(preceded(multispace0, char(',')))(i)?;
    Ok((i, list))
}

fn node_expr(i: &str) -> IResult<&str, NodeExpr> {
    let (i, ty) = ident(i)?;
    let (i, ports) = opt(delimited(open_paren, port_assigns, close_paren))(i)?;
    let (i, elems) = opt(body)(i)?;
    Ok((
        i,
        NodeExpr::from_body(ty, ports.unwrap_or_default(), elems.unwrap_or_default()),
    ))
}

fn negation(i: &str) -> IResult<&str, NodeExpr> {
    let (i, inner) = preceded(pair(char('!'), space0), cond_factor)(i)?;
    Ok((i, NodeExpr::with_children("Inverter", vec![inner])))
}

fn group(i: &str) -> IResult<&str, NodeExpr> {
    delimited(
        char('('),
        delimited(multispace0, cond_expr, multispace0),
        char(')'),
    )(i)
}

fn cond_factor(i: &str) -> IResult<&str, NodeExpr> {
    preceded(space0, alt((negation, group, node_expr)))(i)
}

fn and_expr(i: &str) -> IResult<&str, NodeExpr> {
    let (i, first) = cond_factor(i)?;
    let (i, rest) = many0(preceded(delimited(space0, tag("&&"), space0), cond_factor))(i)?;
    if rest.is_empty() {
        return Ok((i, first));
    }
    let mut children = vec![first];
    children.extend(rest);
    Ok((i, NodeExpr::with_children("Sequence", children)))
}

/// A child node is implicitly a conditional expression; `&&` is shorthand
/// for a Sequence and `||` for a Fallback.
fn cond_expr(i: &str) -> IResult<&str, NodeExpr> {
    let (i, first) = and_expr(i)?;
    let (i, rest) = many0(preceded(delimited(space0, tag("||"), space0), and_expr))(i)?;
    if rest.is_empty() {
        return Ok((i, first));
    }
    let mut children = vec![first];
    children.extend(rest);
    Ok((i, NodeExpr::with_children("Fallback", children)))
}

fn if_expr(i: &str) -> IResult<&str, NodeExpr> {
    let (i, _) = terminated(tag("if"), space0)(i)?;
    let (i, condition) = delimited(open_paren, cond_expr, close_paren)(i)?;
    let (i, then_elems) = body(i)?;
    let (i, else_elems) = opt(preceded(delimited(space0, tag("else"), space0), body))(i)?;

    let mut children = vec![
        condition,
        NodeExpr::from_body("Sequence", vec![], then_elems),
    ];
    if let Some(else_elems) = else_elems {
        children.push(NodeExpr::from_body("Sequence", vec![], else_elems));
    }
    Ok((i, NodeExpr::with_children("if", children)))
}

fn var_decl(i: &str) -> IResult<&str, Elem> {
    let (i, _) = terminated(tag("var"), multispace1)(i)?;
    let (i, name) = ident(i)?;
    let (i, init) = opt(preceded(
        delimited(space0, char('='), space0),
        alt((tag("true"), tag("false"))),
    ))(i)?;
    Ok((i, Elem::Var { name, init }))
}

fn elem(i: &str) -> IResult<&str, Elem> {
    alt((var_decl, map(if_expr, Elem::Node), map(cond_expr, Elem::Node)))(i)
}

fn body_elems(i: &str) -> IResult<&str, Vec<Elem>> {
    preceded(blank0, many0(terminated(elem, blank0)))(i)
}

fn body(i: &str) -> IResult<&str, Vec<Elem>> {
    delimited(open_brace, body_elems, close_brace)(i)
}

fn param_decl(i: &str) -> IResult<&str, ParamDecl> {
    let (i, dir) = terminated(alt((tag("inout"), tag("in"), tag("out"))), multispace1)(i)?;
    let (i, name) = ident(i)?;
    let direction = match dir {
        "in" => PortType::Input,
        "out" => PortType::Output,
        _ => PortType::InOut,
    };
    Ok((i, ParamDecl { direction, name }))
}

fn params_decl(i: &str) -> IResult<&str, Vec<ParamDecl>> {
    delimited(
        open_paren,
        separated_list0(delimited(multispace0, char(','), multispace0), param_decl),
        close_paren,
    )(i)
}

fn tree_decl(i: &str) -> IResult<&str, TreeDecl> {
    let (i, _) = terminated(tag("tree"), multispace1)(i)?;
    let (i, name) = ident(i)?;
    let (i, params) = opt(params_decl)(i)?;
    let (i, _) = delimited(space0, char('='), space0)(i)?;
    let (i, root) = cond_expr(i)?;
    Ok((
        i,
        TreeDecl {
            name,
            params: params.unwrap_or_default(),
            root,
        },
    ))
}

fn source_file(i: &str) -> IResult<&str, TreeSource> {
    let (i, trees) = preceded(blank0, many0(terminated(tree_decl, blank0)))(i)?;
    Ok((i, TreeSource { trees }))
}

fn snippet(rest: &str) -> String {
    let token: String = rest
        .split_whitespace()
        .next()
        .unwrap_or("")
        .chars()
        .take(32)
        .collect();
    if token.is_empty() {
        "end of input".to_string()
    } else {
        token
    }
}

/// Parses a description file into its structural form. Pure: no nodes are
/// instantiated and nothing is ticked.
pub fn parse_source(i: &str) -> Result<TreeSource<'_>, BuildError> {
    match source_file(i) {
        Ok(("", source)) => Ok(source),
        Ok((rest, _)) => Err(BuildError::Syntax {
            near: snippet(rest),
        }),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(BuildError::Syntax {
            near: snippet(e.input),
        }),
        Err(nom::Err::Incomplete(_)) => Err(BuildError::Syntax {
            near: "end of input".to_string(),
        }),
    }
}

#[cfg(test)]
mod test;
