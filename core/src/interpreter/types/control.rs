//! Control flow signals between statements

use super::values::Val;

/* ===================== Control Flow ===================== */

/// Non-exceptional control flow leaving a statement
///
/// Exceptions travel separately as the `Err` side of `EvalResult`; this enum
/// only carries the structured exits that loops and calls consume.
#[derive(Debug, Clone)]
pub enum Control {
    None,
    Break,
    Continue,
    Return(Val),
}

impl Control {
    pub fn is_none(&self) -> bool {
        matches!(self, Control::None)
    }
}
