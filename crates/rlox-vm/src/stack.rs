//! Fixed-capacity operand stack.
//!
//! No execution semantics.

use rlox_core::Value;

use crate::error::Fault;

/// Upper bound on the eager allocation made by [`Stack::new`].
const PREALLOC_LIMIT: usize = 1024;

/// Operand stack.
#[derive(Debug, Clone)]
pub struct Stack {
    values: Vec<Value>,
    max_size: usize,
}

impl Stack {
    /// Create a stack holding at most `max_size` values.
    pub fn new(max_size: usize) -> Self {
        Stack { values: Vec::with_capacity(max_size.min(PREALLOC_LIMIT)), max_size }
    }

    /// Push value onto stack.
    pub fn push(&mut self, value: Value) -> Result<(), Fault> {
        if self.values.len() >= self.max_size {
            return Err(Fault::StackOverflow { capacity: self.max_size });
        }
        self.values.push(value);
        Ok(())
    }

    /// Pop value from stack.
    pub fn pop(&mut self) -> Result<Value, Fault> {
        self.values.pop().ok_or(Fault::StackUnderflow)
    }

    /// Peek at top of stack without removing.
    pub fn peek(&self) -> Option<Value> { self.values.last().copied() }

    /// Values bottom to top.
    pub fn as_slice(&self) -> &[Value] { &self.values }

    /// Current stack size.
    pub fn len(&self) -> usize { self.values.len() }

    /// Check if stack is empty.
    pub fn is_empty(&self) -> bool { self.values.is_empty() }

    /// Configured capacity.
    pub const fn capacity(&self) -> usize { self.max_size }

    /// Drop every value; the allocation is kept.
    pub fn reset(&mut self) { self.values.clear(); }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifo() {
        let mut s = Stack::new(4);
        s.push(Value::from(1)).unwrap();
        s.push(Value::from(2)).unwrap();
        assert_eq!(s.peek(), Some(Value::from(2)));
        assert_eq!(s.pop(), Ok(Value::from(2)));
        assert_eq!(s.pop(), Ok(Value::from(1)));
        assert!(s.is_empty());
    }

    #[test]
    fn overflow_and_underflow_are_faults() {
        let mut s = Stack::new(2);
        s.push(Value::from(1)).unwrap();
        s.push(Value::from(1)).unwrap();
        assert_eq!(s.push(Value::from(1)), Err(Fault::StackOverflow { capacity: 2 }));
        assert_eq!(s.len(), 2);
        s.reset();
        assert_eq!(s.pop(), Err(Fault::StackUnderflow));
    }
}
