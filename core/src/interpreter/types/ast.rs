//! Abstract Syntax Tree node types

use std::collections::HashSet;
use std::rc::Rc;

/// Statement AST node
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Expr {
        expr: Expr,
    },
    /// `a = b = value`; every target receives the same value
    Assign {
        targets: Vec<Expr>,
        value: Expr,
    },
    AugAssign {
        target: Expr,
        op: BinOp,
        value: Expr,
    },
    If {
        test: Expr,
        then_s: Vec<Stmt>,
        else_s: Vec<Stmt>,
    },
    While {
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
    Try {
        body: Vec<Stmt>,
        handlers: Vec<ExceptHandler>,
        orelse: Vec<Stmt>,
        finalbody: Vec<Stmt>,
    },
    FunctionDef(Rc<FunctionDef>),
    Return {
        value: Option<Expr>,
    },
    Raise {
        exc: Option<Expr>,
    },
    Assert {
        test: Expr,
        msg: Option<Expr>,
    },
    Delete {
        targets: Vec<Expr>,
    },
    Global {
        names: Vec<String>,
    },
    Break,
    Continue,
    Pass,
}

/// One `except` clause of a try statement
#[derive(Debug, Clone, PartialEq)]
pub struct ExceptHandler {
    /// Exception class (or tuple of classes) to match; `None` catches everything
    pub kind: Option<Expr>,
    pub name: Option<String>,
    pub body: Vec<Stmt>,
}

/// A `def` or `lambda`
///
/// `locals` and `globals` are filled in by the semantic pass once the body is
/// built: a name assigned anywhere in the body is local to the whole body
/// unless declared `global`.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
    pub locals: HashSet<String>,
    pub globals: HashSet<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub default: Option<Expr>,
}

/// Expression AST node
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    LitNone,
    LitBool { v: bool },
    LitInt { v: i64 },
    LitFloat { v: f64 },
    LitStr { v: String },
    FString { parts: Vec<FStringPart> },
    Name { name: String },
    List { items: Vec<Expr> },
    Tuple { items: Vec<Expr> },
    Dict { items: Vec<(Expr, Expr)> },
    ListComp {
        elt: Box<Expr>,
        comp: Rc<Comprehension>,
    },
    /// `(elt for ...)`, evaluated one item at a time
    GenExp {
        elt: Rc<Expr>,
        comp: Rc<Comprehension>,
    },
    DictComp {
        key: Box<Expr>,
        value: Box<Expr>,
        comp: Rc<Comprehension>,
    },
    BinOp {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    UnaryOp {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    BoolOp {
        op: BoolOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Chained comparison `a < b <= c`
    Compare {
        left: Box<Expr>,
        ops: Vec<(CmpOp, Expr)>,
    },
    IfExp {
        test: Box<Expr>,
        body: Box<Expr>,
        orelse: Box<Expr>,
    },
    Call {
        func: Box<Expr>,
        args: Vec<Arg>,
    },
    Attribute {
        value: Box<Expr>,
        attr: String,
    },
    Subscript {
        value: Box<Expr>,
        index: Box<Expr>,
    },
    /// Only valid as the index of a subscript
    Slice {
        lower: Option<Box<Expr>>,
        upper: Option<Box<Expr>>,
        step: Option<Box<Expr>>,
    },
    Lambda(Rc<FunctionDef>),
}

/// Call argument
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Positional(Expr),
    Star(Expr),
    Keyword(String, Expr),
}

/// Piece of an f-string
#[derive(Debug, Clone, PartialEq)]
pub enum FStringPart {
    Literal(String),
    Field {
        expr: Expr,
        conversion: Option<char>,
        /// Format spec; may itself hold replacement fields (`{x:.{n}f}`)
        spec: Vec<FStringPart>,
    },
}

/// `for`/`if` clauses of a comprehension, evaluated in their own scope
#[derive(Debug, Clone, PartialEq)]
pub struct Comprehension {
    pub clauses: Vec<CompClause>,
    /// Names bound by the `for` targets
    pub locals: HashSet<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CompClause {
    For { target: Expr, iter: Expr },
    If { test: Expr },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
    BitOr,
    BitXor,
    BitAnd,
    LShift,
    RShift,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::FloorDiv => "//",
            BinOp::Mod => "%",
            BinOp::Pow => "** or pow()",
            BinOp::BitOr => "|",
            BinOp::BitXor => "^",
            BinOp::BitAnd => "&",
            BinOp::LShift => "<<",
            BinOp::RShift => ">>",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Pos,
    Invert,
    Not,
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

impl CmpOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::NotEq => "!=",
            CmpOp::Lt => "<",
            CmpOp::LtE => "<=",
            CmpOp::Gt => ">",
            CmpOp::GtE => ">=",
            CmpOp::In => "in",
            CmpOp::NotIn => "not in",
            CmpOp::Is => "is",
            CmpOp::IsNot => "is not",
        }
    }
}
