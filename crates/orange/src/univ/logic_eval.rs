//! Evaluation of postfix volume logic.

use orange_ir::logic::{self, LogicInt, MAX_LOGIC_DEPTH};

/// Fixed-capacity stack of booleans packed into a single word.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogicStack {
    data: u64,
    size: usize,
}

impl LogicStack {
    /// Maximum number of values.
    pub const CAPACITY: usize = MAX_LOGIC_DEPTH;

    /// Number of values on the stack.
    pub fn len(&self) -> usize {
        self.size
    }

    /// Whether the stack is empty.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Push a value.
    pub fn push(&mut self, value: bool) {
        debug_assert!(self.size < Self::CAPACITY, "logic stack overflow");
        self.data = (self.data << 1) | u64::from(value);
        self.size += 1;
    }

    /// Remove and return the top value.
    pub fn pop(&mut self) -> bool {
        debug_assert!(self.size > 0, "logic stack underflow");
        let result = self.data & 1 != 0;
        self.data >>= 1;
        self.size -= 1;
        result
    }

    /// Top value.
    pub fn top(&self) -> bool {
        debug_assert!(self.size > 0);
        self.data & 1 != 0
    }

    /// Negate the top value.
    pub fn apply_not(&mut self) {
        debug_assert!(self.size > 0);
        self.data ^= 1;
    }

    /// Replace the top two values with their conjunction.
    pub fn apply_and(&mut self) {
        let a = self.pop();
        self.data &= u64::MAX << 1 | u64::from(a);
    }

    /// Replace the top two values with their disjunction.
    pub fn apply_or(&mut self) {
        let a = self.pop();
        self.data |= u64::from(a);
    }
}

/// Evaluate postfix logic.
///
/// `is_outside(face)` reports whether the point is outside the face with
/// the given index; it may be called lazily and more than once.
pub fn evaluate<F>(logic: &[LogicInt], mut is_outside: F) -> bool
where
    F: FnMut(usize) -> bool,
{
    let mut stack = LogicStack::default();
    for &token in logic {
        match token {
            logic::TRUE => stack.push(true),
            logic::NOT => stack.apply_not(),
            logic::AND => stack.apply_and(),
            logic::OR => stack.apply_or(),
            face => {
                debug_assert!(logic::is_operand_token(face));
                stack.push(is_outside(face as usize));
            }
        }
    }
    debug_assert_eq!(stack.len(), 1, "unbalanced logic expression");
    stack.top()
}
