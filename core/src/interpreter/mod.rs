//! Embedded script interpreter
//!
//! Scripts are written in a Python-compatible subset. The pipeline is:
//! - `wrapper` indents the script under an implicit function definition
//! - `parser` turns the wrapped text into an AST (pest grammar + block builder)
//! - `executor` walks the AST, with `stdlib` supplying builtins and methods
//!
//! Nothing in the language reaches the filesystem, network or processes; the
//! only side effect available to a script is `print`, which goes to the
//! interpreter's [`Console`].

pub mod console;
pub mod errors;
pub mod executor;
pub mod parser;
pub mod stdlib;
pub mod types;
pub mod wrapper;

pub use console::Console;
pub use errors::{EvalResult, ExcKind, Exception};
pub use executor::{Interpreter, DEFAULT_MAX_CALL_DEPTH};
pub use parser::{parse_module, ParseError};
pub use types::Val;
pub use wrapper::{define_user_function, wrap_source, USER_FUNCTION};
