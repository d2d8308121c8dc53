//! Type definitions for the interpreter
//!
//! This module contains the core types shared by the parser and executor:
//! - AST nodes (Stmt, Expr, FunctionDef)
//! - Runtime values (Val)
//! - Insertion-ordered dictionaries (Dict)
//! - Control flow signals (Control)

pub mod ast;
pub mod control;
pub mod dict;
pub mod values;

// Re-export all types for convenient access
pub use ast::{
    Arg, BinOp, BoolOp, CmpOp, CompClause, Comprehension, ExceptHandler, Expr, FStringPart,
    FunctionDef, Param, Stmt, UnaryOp,
};
pub use control::Control;
pub use dict::{Dict, DictKey};
pub use values::{BoundMethod, Function, PyType, RangeVal, Val};
