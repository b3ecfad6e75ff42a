// AST data structures for Stepwise.
// These types represent a parsed script in a form suitable for static analysis.

/// A parsed program: the top-level statements in document order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Module {
    pub body: Vec<Stmt>,
}

impl Module {
    pub fn new(body: Vec<Stmt>) -> Self {
        Self { body }
    }
}

/// Statement nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `a = b = value`; one entry in `targets` per `=`.
    Assign { targets: Vec<Expr>, value: Expr },
    /// `target += value`
    AugAssign { target: Expr, op: BinOp, value: Expr },
    /// `target: annotation` with an optional `= value`.
    AnnAssign {
        target: Expr,
        annotation: Expr,
        value: Option<Expr>,
    },
    /// A bare expression used as a statement (usually a call).
    Expr(Expr),
    If {
        test: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
    },
    For {
        target: Expr,
        iter: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
    },
    While {
        test: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
    },
    Try {
        body: Vec<Stmt>,
        handlers: Vec<ExceptHandler>,
        orelse: Vec<Stmt>,
        finalbody: Vec<Stmt>,
    },
    /// `with a as x, b:`; only the context expressions are kept.
    With {
        items: Vec<Expr>,
        body: Vec<Stmt>,
    },
    FunctionDef {
        name: String,
        params: Vec<String>,
        body: Vec<Stmt>,
    },
    ClassDef {
        name: String,
        bases: Vec<Expr>,
        body: Vec<Stmt>,
    },
    /// `match subject:` with one body per `case`; patterns are dropped.
    Match {
        subject: Expr,
        cases: Vec<Vec<Stmt>>,
    },
    Return(Option<Expr>),
    /// `import a.b` / `from a import b`; only the module path is kept.
    Import(String),
    Assert {
        test: Expr,
        msg: Option<Expr>,
    },
    Delete(Vec<Expr>),
    /// `global a, b` and `nonlocal a, b`.
    Global(Vec<String>),
    Raise(Option<Expr>),
    Pass,
    Break,
    Continue,
}

impl Stmt {
    /// Nested statement blocks in source order: bodies, handler bodies,
    /// `else` and `finally` blocks. Empty for simple statements.
    pub fn child_blocks(&self) -> Vec<&[Stmt]> {
        match self {
            Stmt::If { body, orelse, .. }
            | Stmt::For { body, orelse, .. }
            | Stmt::While { body, orelse, .. } => vec![body.as_slice(), orelse.as_slice()],
            Stmt::Try {
                body,
                handlers,
                orelse,
                finalbody,
            } => {
                let mut blocks = vec![body.as_slice()];
                blocks.extend(handlers.iter().map(|h| h.body.as_slice()));
                blocks.push(orelse.as_slice());
                blocks.push(finalbody.as_slice());
                blocks
            }
            Stmt::With { body, .. } | Stmt::FunctionDef { body, .. } | Stmt::ClassDef { body, .. } => vec![body.as_slice()],
            Stmt::Match { cases, .. } => cases.iter().map(Vec::as_slice).collect(),
            Stmt::Assign { .. }
            | Stmt::AugAssign { .. }
            | Stmt::AnnAssign { .. }
            | Stmt::Expr(_)
            | Stmt::Return(_)
            | Stmt::Import(_)
            | Stmt::Assert { .. }
            | Stmt::Delete(_)
            | Stmt::Global(_)
            | Stmt::Raise(_)
            | Stmt::Pass
            | Stmt::Break
            | Stmt::Continue => vec![],
        }
    }
}

/// `except kind as name:` clause of a `try` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct ExceptHandler {
    pub kind: Option<Expr>,
    pub name: Option<String>,
    pub body: Vec<Stmt>,
}

/// Expression nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Constant(Constant),
    Name(String),
    BinOp {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    UnaryOp {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    BoolOp {
        op: BoolOp,
        values: Vec<Expr>,
    },
    /// Chained comparison: `left ops[0] comparators[0] ops[1] comparators[1] ...`
    Compare {
        left: Box<Expr>,
        ops: Vec<CmpOp>,
        comparators: Vec<Expr>,
    },
    /// `body if test else orelse`
    IfExp {
        test: Box<Expr>,
        body: Box<Expr>,
        orelse: Box<Expr>,
    },
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
        keywords: Vec<Keyword>,
    },
    Attribute {
        value: Box<Expr>,
        attr: String,
    },
    Subscript {
        value: Box<Expr>,
        index: Box<Expr>,
    },
    Slice {
        lower: Option<Box<Expr>>,
        upper: Option<Box<Expr>>,
        step: Option<Box<Expr>>,
    },
    List(Vec<Expr>),
    Tuple(Vec<Expr>),
    /// Keys and values are kept as parallel sequences; they are paired
    /// positionally when evaluated.
    Dict {
        keys: Vec<Expr>,
        values: Vec<Expr>,
    },
    Set(Vec<Expr>),
    /// `[elt for target in iter if cond ...]` and its set, dict and
    /// generator forms. Dict comprehensions keep `(key, value)` as a tuple.
    Comprehension {
        kind: ComprehensionKind,
        element: Box<Expr>,
        generators: Vec<Generator>,
    },
    Lambda {
        params: Vec<String>,
        body: Box<Expr>,
    },
    /// `*value` in a call or target list.
    Starred(Box<Expr>),
    /// An f-string, kept as its raw text.
    FormattedString(String),
    /// `(name := value)`
    NamedExpr {
        target: String,
        value: Box<Expr>,
    },
    Await(Box<Expr>),
    Yield(Option<Box<Expr>>),
    /// A construct with no dedicated node, tagged by its grammar kind.
    Unsupported(String),
}

impl Expr {
    /// The bare identifier when this expression is a plain name.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Expr::Name(name) => Some(name),
            _ => None,
        }
    }

    /// The callee name and positional arguments when this is a call to a
    /// plain name, e.g. `print(x)`.
    pub fn as_named_call(&self) -> Option<(&str, &[Expr])> {
        match self {
            Expr::Call { func, args, .. } => func.as_name().map(|name| (name, args.as_slice())),
            _ => None,
        }
    }

    pub fn int(value: i64) -> Self {
        Expr::Constant(Constant::Int(value))
    }

    pub fn str(value: &str) -> Self {
        Expr::Constant(Constant::Str(value.to_string()))
    }

    pub fn name(id: &str) -> Self {
        Expr::Name(id.to_string())
    }

    pub fn binop(left: Expr, op: BinOp, right: Expr) -> Self {
        Expr::BinOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    pub fn call(func: &str, args: Vec<Expr>) -> Self {
        Expr::Call {
            func: Box::new(Expr::name(func)),
            args,
            keywords: vec![],
        }
    }
}

/// `name=value` argument in a call; `**mapping` has no name.
#[derive(Debug, Clone, PartialEq)]
pub struct Keyword {
    pub name: Option<String>,
    pub value: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComprehensionKind {
    List,
    Set,
    Dict,
    Generator,
}

/// One `for target in iter if ...` clause of a comprehension.
#[derive(Debug, Clone, PartialEq)]
pub struct Generator {
    pub target: Expr,
    pub iter: Expr,
    pub conditions: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mult,
    Div,
    FloorDiv,
    Mod,
    Pow,
    MatMult,
    LShift,
    RShift,
    BitOr,
    BitXor,
    BitAnd,
}

impl BinOp {
    /// Canonical symbol for the arithmetic operators; `?` for the rest.
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mult => "*",
            BinOp::Div => "/",
            BinOp::FloorDiv => "//",
            BinOp::Mod => "%",
            BinOp::Pow => "**",
            BinOp::MatMult | BinOp::LShift | BinOp::RShift | BinOp::BitOr | BinOp::BitXor | BinOp::BitAnd => "?",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Pos,
    Not,
    Invert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
    In,
    NotIn,
    Is,
    IsNot,
}
