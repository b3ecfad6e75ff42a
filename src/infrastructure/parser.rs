//! Script parser backed by `tree-sitter-python`.
//!
//! The concrete syntax tree is checked for error and missing nodes first,
//! then lowered into [`domain::ast`](crate::domain::ast). Grammar kinds with
//! no dedicated node lower to [`Expr::Unsupported`], and lowering refuses to
//! nest deeper than [`MAX_NESTING`] so every later walk stays bounded.

use tree_sitter::{Language, Node, Parser};

use crate::domain::ast::{
    BinOp, BoolOp, CmpOp, ComprehensionKind, Constant, ExceptHandler, Expr, Generator, Keyword, Module, Stmt,
    UnaryOp,
};
use crate::domain::error::{ParseError, ParseErrorKind};

/// Deepest statement or expression nesting accepted.
pub const MAX_NESTING: usize = 200;

/// Characters of source quoted in an invalid-syntax error.
const NEAR_CHARS: usize = 20;

type PResult<T> = Result<T, ParseError>;

/// Parse a whole program.
pub fn parse_module(source: &str) -> PResult<Module> {
    let mut parser = Parser::new();
    let language: Language = tree_sitter_python::LANGUAGE.into();
    parser
        .set_language(&language)
        .map_err(|e| ParseError::new(ParseErrorKind::Unavailable(e.to_string()), 1, 1))?;
    let tree = parser
        .parse(source, None)
        .ok_or_else(|| ParseError::new(ParseErrorKind::Unavailable("parse cancelled".into()), 1, 1))?;

    let root = tree.root_node();
    if root.has_error() {
        return Err(syntax_error(root, source));
    }

    let mut lowering = Lowering { source, depth: 0 };
    let body = lowering.block(root)?;
    Ok(Module::new(body))
}

fn syntax_error(root: Node<'_>, source: &str) -> ParseError {
    let Some(node) = first_error(root) else {
        return error_at(root, ParseErrorKind::InvalidSyntax { near: String::new() });
    };
    let kind = if node.is_missing() {
        ParseErrorKind::Missing(node.kind().to_string())
    } else {
        let text = node.utf8_text(source.as_bytes()).unwrap_or("");
        let near = text.lines().next().unwrap_or("").trim().chars().take(NEAR_CHARS).collect();
        ParseErrorKind::InvalidSyntax { near }
    };
    error_at(node, kind)
}

/// Pre-order search for the first error or missing node, descending only
/// into subtrees that contain one.
fn first_error(root: Node<'_>) -> Option<Node<'_>> {
    let mut cursor = root.walk();
    loop {
        let node = cursor.node();
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        if node.has_error() && cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return None;
            }
        }
    }
}

fn error_at(node: Node<'_>, kind: ParseErrorKind) -> ParseError {
    let position = node.start_position();
    ParseError::new(kind, position.row + 1, position.column + 1)
}

/// Named children without comments and other extras.
fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    let nodes = node.named_children(&mut cursor).filter(|c| !c.is_extra()).collect();
    nodes
}

/// All children, anonymous tokens included, without extras.
fn children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    let nodes = node.children(&mut cursor).filter(|c| !c.is_extra()).collect();
    nodes
}

fn field_children<'t>(node: Node<'t>, name: &str) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    let nodes = node.children_by_field_name(name, &mut cursor).collect();
    nodes
}

fn field<'t>(node: Node<'t>, name: &str) -> PResult<Node<'t>> {
    node.child_by_field_name(name)
        .ok_or_else(|| error_at(node, ParseErrorKind::Missing(name.to_string())))
}

fn first_named(node: Node<'_>) -> PResult<Node<'_>> {
    named_children(node)
        .into_iter()
        .next()
        .ok_or_else(|| error_at(node, ParseErrorKind::Missing("expression".into())))
}

fn block_child(node: Node<'_>) -> PResult<Node<'_>> {
    named_children(node)
        .into_iter()
        .find(|c| c.kind() == "block")
        .ok_or_else(|| error_at(node, ParseErrorKind::Missing("block".into())))
}

fn binop(symbol: &str) -> Option<BinOp> {
    Some(match symbol {
        "+" => BinOp::Add,
        "-" => BinOp::Sub,
        "*" => BinOp::Mult,
        "/" => BinOp::Div,
        "//" => BinOp::FloorDiv,
        "%" => BinOp::Mod,
        "**" => BinOp::Pow,
        "@" => BinOp::MatMult,
        "<<" => BinOp::LShift,
        ">>" => BinOp::RShift,
        "|" => BinOp::BitOr,
        "^" => BinOp::BitXor,
        "&" => BinOp::BitAnd,
        _ => return None,
    })
}

fn cmp_op(symbol: &str) -> Option<CmpOp> {
    Some(match symbol {
        "==" => CmpOp::Eq,
        "!=" | "<>" => CmpOp::NotEq,
        "<" => CmpOp::Lt,
        "<=" => CmpOp::LtE,
        ">" => CmpOp::Gt,
        ">=" => CmpOp::GtE,
        "in" => CmpOp::In,
        "not in" => CmpOp::NotIn,
        "is" => CmpOp::Is,
        "is not" => CmpOp::IsNot,
        _ => return None,
    })
}

struct Lowering<'a> {
    source: &'a str,
    depth: usize,
}

impl<'a> Lowering<'a> {
    fn text(&self, node: Node<'_>) -> &'a str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    fn enter(&mut self, node: Node<'_>) -> PResult<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(error_at(node, ParseErrorKind::TooDeeplyNested(MAX_NESTING)));
        }
        Ok(())
    }

    fn block(&mut self, node: Node<'_>) -> PResult<Vec<Stmt>> {
        named_children(node).into_iter().map(|child| self.stmt(child)).collect()
    }

    fn exprs(&mut self, nodes: &[Node<'_>]) -> PResult<Vec<Expr>> {
        nodes.iter().map(|node| self.expr(*node)).collect()
    }

    // ─── Statements ───────────────────────────────────────────────────────

    fn stmt(&mut self, node: Node<'_>) -> PResult<Stmt> {
        self.enter(node)?;
        let stmt = self.stmt_kind(node);
        self.depth -= 1;
        stmt
    }

    fn stmt_kind(&mut self, node: Node<'_>) -> PResult<Stmt> {
        Ok(match node.kind() {
            "expression_statement" => return self.expression_statement(node),
            "if_statement" => return self.if_statement(node),
            "for_statement" => Stmt::For {
                target: self.expr(field(node, "left")?)?,
                iter: self.expr(field(node, "right")?)?,
                body: self.block(field(node, "body")?)?,
                orelse: self.else_body(node)?,
            },
            "while_statement" => Stmt::While {
                test: self.expr(field(node, "condition")?)?,
                body: self.block(field(node, "body")?)?,
                orelse: self.else_body(node)?,
            },
            "try_statement" => return self.try_statement(node),
            "with_statement" => return self.with_statement(node),
            "function_definition" => Stmt::FunctionDef {
                name: self.text(field(node, "name")?).to_string(),
                params: self.params(node.child_by_field_name("parameters")),
                body: self.block(field(node, "body")?)?,
            },
            "class_definition" => Stmt::ClassDef {
                name: self.text(field(node, "name")?).to_string(),
                bases: match node.child_by_field_name("superclasses") {
                    Some(list) => self.call_arguments(list)?.0,
                    None => Vec::new(),
                },
                body: self.block(field(node, "body")?)?,
            },
            "decorated_definition" => return self.stmt(field(node, "definition")?),
            "match_statement" => return self.match_statement(node),
            "return_statement" => Stmt::Return(self.optional_expr(node)?),
            "pass_statement" => Stmt::Pass,
            "break_statement" => Stmt::Break,
            "continue_statement" => Stmt::Continue,
            "import_statement" => {
                let name = field(node, "name")?;
                let module = name.child_by_field_name("name").unwrap_or(name);
                Stmt::Import(self.text(module).to_string())
            }
            "import_from_statement" => Stmt::Import(self.text(field(node, "module_name")?).to_string()),
            "future_import_statement" => Stmt::Import("__future__".to_string()),
            "print_statement" => return self.print_statement(node),
            "assert_statement" => {
                let parts = named_children(node);
                let Some((test, rest)) = parts.split_first() else {
                    return Err(error_at(node, ParseErrorKind::Missing("expression".into())));
                };
                Stmt::Assert {
                    test: self.expr(*test)?,
                    msg: rest.first().map(|m| self.expr(*m)).transpose()?,
                }
            }
            "delete_statement" => match self.expr(first_named(node)?)? {
                Expr::Tuple(targets) => Stmt::Delete(targets),
                target => Stmt::Delete(vec![target]),
            },
            "raise_statement" => Stmt::Raise(self.optional_expr(node)?),
            "global_statement" | "nonlocal_statement" => Stmt::Global(
                named_children(node)
                    .into_iter()
                    .map(|name| self.text(name).to_string())
                    .collect(),
            ),
            other => Stmt::Expr(Expr::Unsupported(other.to_string())),
        })
    }

    fn expression_statement(&mut self, node: Node<'_>) -> PResult<Stmt> {
        let parts = named_children(node);
        match parts.as_slice() {
            [single] if single.kind() == "assignment" => self.assignment(*single),
            [single] if single.kind() == "augmented_assignment" => {
                let symbol = field(*single, "operator")?.kind();
                let op = binop(symbol.trim_end_matches('='))
                    .ok_or_else(|| error_at(*single, ParseErrorKind::InvalidSyntax { near: symbol.to_string() }))?;
                Ok(Stmt::AugAssign {
                    target: self.expr(field(*single, "left")?)?,
                    op,
                    value: self.expr(field(*single, "right")?)?,
                })
            }
            [single] => Ok(Stmt::Expr(self.expr(*single)?)),
            many => Ok(Stmt::Expr(Expr::Tuple(self.exprs(many)?))),
        }
    }

    /// `a = b = value` nests one assignment node per `=`; flatten the chain.
    fn assignment(&mut self, node: Node<'_>) -> PResult<Stmt> {
        let mut targets = Vec::new();
        let mut current = node;
        loop {
            let left = self.expr(field(current, "left")?)?;
            if let Some(annotation) = current.child_by_field_name("type") {
                return Ok(Stmt::AnnAssign {
                    target: left,
                    annotation: self.expr(annotation)?,
                    value: current.child_by_field_name("right").map(|v| self.expr(v)).transpose()?,
                });
            }
            targets.push(left);
            let right = field(current, "right")?;
            if right.kind() != "assignment" {
                return Ok(Stmt::Assign {
                    targets,
                    value: self.expr(right)?,
                });
            }
            current = right;
        }
    }

    fn if_statement(&mut self, node: Node<'_>) -> PResult<Stmt> {
        let test = self.expr(field(node, "condition")?)?;
        let body = self.block(field(node, "consequence")?)?;
        let mut orelse = Vec::new();
        for clause in field_children(node, "alternative").into_iter().rev() {
            orelse = match clause.kind() {
                "elif_clause" => vec![Stmt::If {
                    test: self.expr(field(clause, "condition")?)?,
                    body: self.block(field(clause, "consequence")?)?,
                    orelse,
                }],
                _ => self.block(field(clause, "body")?)?,
            };
        }
        Ok(Stmt::If { test, body, orelse })
    }

    fn else_body(&mut self, node: Node<'_>) -> PResult<Vec<Stmt>> {
        match node.child_by_field_name("alternative") {
            Some(clause) => self.block(field(clause, "body")?),
            None => Ok(Vec::new()),
        }
    }

    fn try_statement(&mut self, node: Node<'_>) -> PResult<Stmt> {
        let body = self.block(field(node, "body")?)?;
        let mut handlers = Vec::new();
        let mut orelse = Vec::new();
        let mut finalbody = Vec::new();
        for clause in named_children(node) {
            match clause.kind() {
                "except_clause" | "except_group_clause" => handlers.push(self.except_clause(clause)?),
                "else_clause" => orelse = self.block(field(clause, "body")?)?,
                "finally_clause" => finalbody = self.block(block_child(clause)?)?,
                _ => {}
            }
        }
        Ok(Stmt::Try {
            body,
            handlers,
            orelse,
            finalbody,
        })
    }

    fn except_clause(&mut self, clause: Node<'_>) -> PResult<ExceptHandler> {
        let mut handler = ExceptHandler {
            kind: None,
            name: None,
            body: Vec::new(),
        };
        for child in named_children(clause) {
            match child.kind() {
                "block" => handler.body = self.block(child)?,
                "as_pattern" => {
                    handler.kind = Some(self.expr(first_named(child)?)?);
                    handler.name = child.child_by_field_name("alias").map(|a| self.text(a).to_string());
                }
                _ if handler.kind.is_none() => handler.kind = Some(self.expr(child)?),
                _ => handler.name = Some(self.text(child).to_string()),
            }
        }
        Ok(handler)
    }

    fn with_statement(&mut self, node: Node<'_>) -> PResult<Stmt> {
        let mut items = Vec::new();
        for clause in named_children(node).into_iter().filter(|c| c.kind() == "with_clause") {
            for item in named_children(clause).into_iter().filter(|c| c.kind() == "with_item") {
                items.push(self.expr(field(item, "value")?)?);
            }
        }
        Ok(Stmt::With {
            items,
            body: self.block(field(node, "body")?)?,
        })
    }

    fn match_statement(&mut self, node: Node<'_>) -> PResult<Stmt> {
        let subjects = field_children(node, "subject");
        let subject = match subjects.as_slice() {
            [single] => self.expr(*single)?,
            many => Expr::Tuple(self.exprs(many)?),
        };
        let mut cases = Vec::new();
        for clause in named_children(field(node, "body")?) {
            if clause.kind() == "case_clause" {
                cases.push(self.block(field(clause, "consequence")?)?);
            }
        }
        Ok(Stmt::Match { subject, cases })
    }

    /// Legacy `print x, y` lowers to the call form.
    fn print_statement(&mut self, node: Node<'_>) -> PResult<Stmt> {
        let arguments = field_children(node, "argument");
        let args = match arguments.as_slice() {
            [only] if matches!(only.kind(), "parenthesized_expression" | "tuple") => match self.expr(*only)? {
                Expr::Tuple(items) => items,
                single => vec![single],
            },
            many => self.exprs(many)?,
        };
        Ok(Stmt::Expr(Expr::call("print", args)))
    }

    fn optional_expr(&mut self, node: Node<'_>) -> PResult<Option<Expr>> {
        named_children(node).first().map(|value| self.expr(*value)).transpose()
    }

    fn params(&self, node: Option<Node<'_>>) -> Vec<String> {
        let Some(node) = node else {
            return Vec::new();
        };
        named_children(node)
            .into_iter()
            .filter_map(|param| self.param_name(param))
            .collect()
    }

    fn param_name(&self, node: Node<'_>) -> Option<String> {
        match node.kind() {
            "identifier" | "tuple_pattern" => Some(self.text(node).to_string()),
            "default_parameter" | "typed_default_parameter" => {
                node.child_by_field_name("name").map(|name| self.text(name).to_string())
            }
            "typed_parameter" | "list_splat_pattern" | "dictionary_splat_pattern" => named_children(node)
                .into_iter()
                .find_map(|inner| self.param_name(inner)),
            _ => None,
        }
    }

    // ─── Expressions ──────────────────────────────────────────────────────

    fn expr(&mut self, node: Node<'_>) -> PResult<Expr> {
        self.enter(node)?;
        let expr = self.expr_kind(node);
        self.depth -= 1;
        expr
    }

    fn expr_kind(&mut self, node: Node<'_>) -> PResult<Expr> {
        Ok(match node.kind() {
            "identifier" => Expr::Name(self.text(node).to_string()),
            "integer" => self.integer(node)?,
            "float" => self.float(node)?,
            "true" => Expr::Constant(Constant::Bool(true)),
            "false" => Expr::Constant(Constant::Bool(false)),
            "none" => Expr::Constant(Constant::None),
            "string" => self.string(node),
            "concatenated_string" => {
                let mut joined = String::new();
                for part in named_children(node) {
                    match self.string(part) {
                        Expr::Constant(Constant::Str(text)) => joined.push_str(&text),
                        _ => return Ok(Expr::FormattedString(self.text(node).to_string())),
                    }
                }
                Expr::Constant(Constant::Str(joined))
            }
            "binary_operator" => {
                let symbol = field(node, "operator")?.kind();
                let op = binop(symbol)
                    .ok_or_else(|| error_at(node, ParseErrorKind::InvalidSyntax { near: symbol.to_string() }))?;
                Expr::BinOp {
                    left: Box::new(self.expr(field(node, "left")?)?),
                    op,
                    right: Box::new(self.expr(field(node, "right")?)?),
                }
            }
            "unary_operator" => {
                let op = match field(node, "operator")?.kind() {
                    "-" => UnaryOp::Neg,
                    "~" => UnaryOp::Invert,
                    _ => UnaryOp::Pos,
                };
                Expr::UnaryOp {
                    op,
                    operand: Box::new(self.expr(field(node, "argument")?)?),
                }
            }
            "not_operator" => Expr::UnaryOp {
                op: UnaryOp::Not,
                operand: Box::new(self.expr(field(node, "argument")?)?),
            },
            "boolean_operator" => self.boolean_operator(node)?,
            "comparison_operator" => self.comparison(node)?,
            "conditional_expression" => {
                let parts = named_children(node);
                let [body, test, orelse] = parts.as_slice() else {
                    return Err(error_at(node, ParseErrorKind::Missing("expression".into())));
                };
                Expr::IfExp {
                    body: Box::new(self.expr(*body)?),
                    test: Box::new(self.expr(*test)?),
                    orelse: Box::new(self.expr(*orelse)?),
                }
            }
            "lambda" => Expr::Lambda {
                params: self.params(node.child_by_field_name("parameters")),
                body: Box::new(self.expr(field(node, "body")?)?),
            },
            "call" => {
                let func = Box::new(self.expr(field(node, "function")?)?);
                let arguments = field(node, "arguments")?;
                let (args, keywords) = if arguments.kind() == "generator_expression" {
                    (vec![self.expr(arguments)?], Vec::new())
                } else {
                    self.call_arguments(arguments)?
                };
                Expr::Call { func, args, keywords }
            }
            "attribute" => Expr::Attribute {
                value: Box::new(self.expr(field(node, "object")?)?),
                attr: self.text(field(node, "attribute")?).to_string(),
            },
            "subscript" => {
                let value = Box::new(self.expr(field(node, "value")?)?);
                let indices = field_children(node, "subscript");
                let index = match indices.as_slice() {
                    [single] => self.expr(*single)?,
                    many => Expr::Tuple(self.exprs(many)?),
                };
                Expr::Subscript {
                    value,
                    index: Box::new(index),
                }
            }
            "slice" => self.slice(node)?,
            "list" | "list_pattern" => Expr::List(self.exprs(&named_children(node))?),
            "tuple" | "expression_list" | "pattern_list" | "tuple_pattern" => {
                Expr::Tuple(self.exprs(&named_children(node))?)
            }
            "set" => Expr::Set(self.exprs(&named_children(node))?),
            "dictionary" => self.dictionary(node)?,
            "list_comprehension" | "set_comprehension" | "dictionary_comprehension" | "generator_expression" => {
                self.comprehension(node)?
            }
            "parenthesized_expression" | "as_pattern" | "type" => self.expr(first_named(node)?)?,
            "list_splat" | "dictionary_splat" | "list_splat_pattern" | "dictionary_splat_pattern" => {
                Expr::Starred(Box::new(self.expr(first_named(node)?)?))
            }
            "named_expression" => Expr::NamedExpr {
                target: self.text(field(node, "name")?).to_string(),
                value: Box::new(self.expr(field(node, "value")?)?),
            },
            "await" => Expr::Await(Box::new(self.expr(first_named(node)?)?)),
            "yield" => Expr::Yield(self.optional_expr(node)?.map(Box::new)),
            other => Expr::Unsupported(other.to_string()),
        })
    }

    /// `a and b and c` is left-nested in the tree; flatten runs of one operator.
    fn boolean_operator(&mut self, node: Node<'_>) -> PResult<Expr> {
        let op = match field(node, "operator")?.kind() {
            "and" => BoolOp::And,
            _ => BoolOp::Or,
        };
        let left = field(node, "left")?;
        let mut values = match (left.kind(), self.expr(left)?) {
            ("boolean_operator", Expr::BoolOp { op: inner, values }) if inner == op => values,
            (_, single) => vec![single],
        };
        values.push(self.expr(field(node, "right")?)?);
        Ok(Expr::BoolOp { op, values })
    }

    /// Operands are the named children; the anonymous tokens between two
    /// operands spell the operator (`not in` and `is not` take two).
    fn comparison(&mut self, node: Node<'_>) -> PResult<Expr> {
        let mut operands = Vec::new();
        let mut ops = Vec::new();
        let mut pending: Vec<&str> = Vec::new();
        for child in children(node) {
            if !child.is_named() {
                pending.push(child.kind());
                continue;
            }
            if !operands.is_empty() {
                let symbol = pending.join(" ");
                let op = cmp_op(&symbol)
                    .ok_or_else(|| error_at(child, ParseErrorKind::InvalidSyntax { near: symbol.clone() }))?;
                ops.push(op);
            }
            pending.clear();
            operands.push(self.expr(child)?);
        }
        let mut operands = operands.into_iter();
        let left = operands
            .next()
            .ok_or_else(|| error_at(node, ParseErrorKind::Missing("expression".into())))?;
        Ok(Expr::Compare {
            left: Box::new(left),
            ops,
            comparators: operands.collect(),
        })
    }

    fn call_arguments(&mut self, list: Node<'_>) -> PResult<(Vec<Expr>, Vec<Keyword>)> {
        let mut args = Vec::new();
        let mut keywords = Vec::new();
        for child in named_children(list) {
            match child.kind() {
                "keyword_argument" => keywords.push(Keyword {
                    name: Some(self.text(field(child, "name")?).to_string()),
                    value: self.expr(field(child, "value")?)?,
                }),
                "dictionary_splat" => keywords.push(Keyword {
                    name: None,
                    value: self.expr(first_named(child)?)?,
                }),
                _ => args.push(self.expr(child)?),
            }
        }
        Ok((args, keywords))
    }

    /// `lower:upper:step`, each part optional; colons pick the slot.
    fn slice(&mut self, node: Node<'_>) -> PResult<Expr> {
        let mut parts: [Option<Box<Expr>>; 3] = [None, None, None];
        let mut slot = 0;
        for child in children(node) {
            if child.kind() == ":" {
                slot += 1;
            } else if child.is_named() && slot < parts.len() {
                parts[slot] = Some(Box::new(self.expr(child)?));
            }
        }
        let [lower, upper, step] = parts;
        Ok(Expr::Slice { lower, upper, step })
    }

    fn dictionary(&mut self, node: Node<'_>) -> PResult<Expr> {
        let mut keys = Vec::new();
        let mut values = Vec::new();
        for entry in named_children(node) {
            if entry.kind() == "pair" {
                keys.push(self.expr(field(entry, "key")?)?);
                values.push(self.expr(field(entry, "value")?)?);
            } else {
                // `**mapping` has no key of its own.
                keys.push(Expr::Unsupported(entry.kind().to_string()));
                values.push(self.expr(entry)?);
            }
        }
        Ok(Expr::Dict { keys, values })
    }

    fn comprehension(&mut self, node: Node<'_>) -> PResult<Expr> {
        let kind = match node.kind() {
            "list_comprehension" => ComprehensionKind::List,
            "set_comprehension" => ComprehensionKind::Set,
            "dictionary_comprehension" => ComprehensionKind::Dict,
            _ => ComprehensionKind::Generator,
        };
        let body = field(node, "body")?;
        let element = if body.kind() == "pair" {
            Expr::Tuple(vec![self.expr(field(body, "key")?)?, self.expr(field(body, "value")?)?])
        } else {
            self.expr(body)?
        };

        let mut generators: Vec<Generator> = Vec::new();
        for clause in named_children(node) {
            match clause.kind() {
                "for_in_clause" => {
                    let target = self.expr(field(clause, "left")?)?;
                    let sources = field_children(clause, "right");
                    let iter = match sources.as_slice() {
                        [single] => self.expr(*single)?,
                        many => Expr::Tuple(self.exprs(many)?),
                    };
                    generators.push(Generator {
                        target,
                        iter,
                        conditions: Vec::new(),
                    });
                }
                "if_clause" => {
                    let condition = self.expr(first_named(clause)?)?;
                    if let Some(last) = generators.last_mut() {
                        last.conditions.push(condition);
                    }
                }
                _ => {}
            }
        }
        Ok(Expr::Comprehension {
            kind,
            element: Box::new(element),
            generators,
        })
    }

    // ─── Literals ─────────────────────────────────────────────────────────

    fn integer(&self, node: Node<'_>) -> PResult<Expr> {
        let raw = self.text(node);
        let lowered = raw.replace('_', "").to_ascii_lowercase();
        if lowered.ends_with('j') {
            return Ok(Expr::Unsupported("complex".to_string()));
        }
        let clean = lowered.trim_end_matches('l');
        let (digits, radix) = if let Some(hex) = clean.strip_prefix("0x") {
            (hex, 16)
        } else if let Some(oct) = clean.strip_prefix("0o") {
            (oct, 8)
        } else if let Some(bin) = clean.strip_prefix("0b") {
            (bin, 2)
        } else {
            (clean, 10)
        };
        if let Ok(value) = i64::from_str_radix(digits, radix) {
            return Ok(Expr::int(value));
        }
        // Past the i64 range the literal degrades to a float.
        let wide = if radix == 10 {
            digits.parse::<f64>().ok()
        } else {
            u128::from_str_radix(digits, radix).ok().map(|v| v as f64)
        };
        wide.map(|x| Expr::Constant(Constant::Float(x)))
            .ok_or_else(|| error_at(node, ParseErrorKind::InvalidNumber(raw.to_string())))
    }

    fn float(&self, node: Node<'_>) -> PResult<Expr> {
        let raw = self.text(node);
        let clean = raw.replace('_', "").to_ascii_lowercase();
        if clean.ends_with('j') {
            return Ok(Expr::Unsupported("complex".to_string()));
        }
        clean
            .parse::<f64>()
            .map(|x| Expr::Constant(Constant::Float(x)))
            .map_err(|_| error_at(node, ParseErrorKind::InvalidNumber(raw.to_string())))
    }

    /// A single string literal: prefix letters, then one or three quotes.
    /// f-strings keep their raw body; raw strings skip escape decoding.
    fn string(&self, node: Node<'_>) -> Expr {
        let raw = self.text(node);
        let prefix_len = raw.find(['\'', '"']).unwrap_or(raw.len());
        let prefix = raw[..prefix_len].to_ascii_lowercase();
        let quoted = &raw[prefix_len..];
        let quote_len = if quoted.starts_with("'''") || quoted.starts_with("\"\"\"") {
            3
        } else {
            1
        };
        let body = if quoted.len() >= 2 * quote_len {
            &quoted[quote_len..quoted.len() - quote_len]
        } else {
            ""
        };

        if prefix.contains('f') {
            Expr::FormattedString(body.to_string())
        } else if prefix.contains('r') {
            Expr::Constant(Constant::Str(body.to_string()))
        } else {
            Expr::Constant(Constant::Str(unescape(body)))
        }
    }
}

fn unescape(body: &str) -> String {
    let mut value = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            value.push(c);
            continue;
        }
        let Some(escaped) = chars.next() else {
            value.push('\\');
            break;
        };
        match escaped {
            '\n' => {}
            'n' => value.push('\n'),
            't' => value.push('\t'),
            'r' => value.push('\r'),
            '0' => value.push('\0'),
            '\\' | '\'' | '"' => value.push(escaped),
            'x' => {
                let hex: String = chars.clone().take(2).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) if hex.len() == 2 => {
                        chars.next();
                        chars.next();
                        value.push(decoded);
                    }
                    _ => value.push_str("\\x"),
                }
            }
            other => {
                value.push('\\');
                value.push(other);
            }
        }
    }
    value
}
