use std::ops::Index;
use crate::runtime::{ data_structures::value::Value,
                      error::{ self,
                               ErrorKind,
                               ScriptError } };



/// The deepest the operand stack is allowed to grow.
pub const MAX_STACK_DEPTH: usize = 100;



/// The calculator's bounded operand stack.  The top of the stack is the last item.
///
/// Every mutating operation checks the depth it needs before touching anything, so a failed
/// operation always leaves the stack exactly as it found it.  A push onto a full stack reports
/// `StackOverflow` and the pushed value is discarded.
#[derive(Clone, Default, PartialEq, Debug)]
pub struct ValueStack
{
    items: Vec<Value>
}


impl Index<usize> for ValueStack
{
    type Output = Value;

    /// Index from the bottom of the stack, 0 being the oldest item.
    fn index(&self, index: usize) -> &Value
    {
        &self.items[index]
    }
}


impl ValueStack
{
    pub fn new() -> ValueStack
    {
        ValueStack { items: Vec::with_capacity(20) }
    }

    pub fn len(&self) -> usize
    {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.items.is_empty()
    }

    /// The stack contents, bottom first.
    pub fn items(&self) -> &[Value]
    {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value>
    {
        self.items.iter()
    }

    pub fn clear(&mut self)
    {
        self.items.clear();
    }

    /// Fail with a stack underflow unless at least `count` items are present.
    pub fn require(&self, count: usize) -> error::Result<()>
    {
        if self.items.len() < count
        {
            return ScriptError::bare(ErrorKind::StackUnderflow,
                                     &format!("Stack underflow, {} value(s) needed, {} present.",
                                              count,
                                              self.items.len()));
        }

        Ok(())
    }

    /// Fail with a stack overflow unless `count` more items would fit.
    pub fn require_room(&self, count: usize) -> error::Result<()>
    {
        if self.items.len() + count > MAX_STACK_DEPTH
        {
            return ScriptError::bare(ErrorKind::StackOverflow,
                                     &format!("Stack overflow, the limit is {} values.",
                                              MAX_STACK_DEPTH));
        }

        Ok(())
    }

    /// Push a value.  On overflow the value is dropped.
    pub fn push(&mut self, value: Value) -> error::Result<()>
    {
        self.require_room(1)?;
        self.items.push(value);

        Ok(())
    }

    pub fn pop(&mut self) -> error::Result<Value>
    {
        match self.items.pop()
        {
            Some(value) => Ok(value),
            None => ScriptError::bare(ErrorKind::StackUnderflow, "Stack underflow.")
        }
    }

    /// Look at the top value without removing it.
    pub fn peek(&self) -> error::Result<&Value>
    {
        self.peek_at(0)
    }

    /// Look at the value `depth` slots below the top, the top itself being depth 0.
    pub fn peek_at(&self, depth: usize) -> error::Result<&Value>
    {
        self.require(depth + 1)?;
        Ok(&self.items[self.items.len() - 1 - depth])
    }

    /// `a -- a a`
    pub fn dup(&mut self) -> error::Result<()>
    {
        self.require(1)?;
        self.require_room(1)?;

        let copy = self.items[self.items.len() - 1].clone();
        self.items.push(copy);

        Ok(())
    }

    /// `a b -- b a`
    pub fn swap(&mut self) -> error::Result<()>
    {
        self.require(2)?;

        let len = self.items.len();
        self.items.swap(len - 1, len - 2);

        Ok(())
    }

    /// `a b -- a b a`
    pub fn over(&mut self) -> error::Result<()>
    {
        self.require(2)?;
        self.require_room(1)?;

        let copy = self.items[self.items.len() - 2].clone();
        self.items.push(copy);

        Ok(())
    }

    /// `a b -- b`
    pub fn nip(&mut self) -> error::Result<()>
    {
        self.require(2)?;

        let len = self.items.len();
        let _ = self.items.remove(len - 2);

        Ok(())
    }

    /// `a b -- b a b`
    pub fn tuck(&mut self) -> error::Result<()>
    {
        self.require(2)?;
        self.require_room(1)?;

        let len = self.items.len();
        let copy = self.items[len - 1].clone();
        self.items.insert(len - 2, copy);

        Ok(())
    }

    /// Move the item `depth` slots below the top up to the top, the items above it each move down
    /// one slot.  `roll(0)` does nothing.
    pub fn roll(&mut self, depth: usize) -> error::Result<()>
    {
        self.require(depth + 1)?;

        let index = self.items.len() - 1 - depth;
        let value = self.items.remove(index);
        self.items.push(value);

        Ok(())
    }

    /// Replace the whole contents, used to restore a snapshot.
    pub fn restore(&mut self, snapshot: ValueStack)
    {
        *self = snapshot;
    }
}


#[cfg(test)]
mod tests
{
    use super::*;

    fn reals(values: &[f64]) -> ValueStack
    {
        let mut stack = ValueStack::new();

        for value in values
        {
            stack.push(Value::Real(*value)).unwrap();
        }

        stack
    }

    #[test]
    fn roll_moves_deep_item_to_top()
    {
        let mut stack = reals(&[1.0, 2.0, 3.0]);
        stack.roll(2).unwrap();

        assert_eq!(stack, reals(&[2.0, 3.0, 1.0]));
    }

    #[test]
    fn tuck_copies_top_under_second()
    {
        let mut stack = reals(&[1.0, 2.0]);
        stack.tuck().unwrap();

        assert_eq!(stack, reals(&[2.0, 1.0, 2.0]));
    }

    #[test]
    fn underflow_leaves_stack_alone()
    {
        let mut stack = reals(&[1.0]);
        let error = stack.swap().unwrap_err();

        assert_eq!(error.kind(), ErrorKind::StackUnderflow);
        assert_eq!(stack, reals(&[1.0]));
    }

    #[test]
    fn overflowing_push_is_dropped()
    {
        let mut stack = ValueStack::new();

        for index in 0..MAX_STACK_DEPTH
        {
            stack.push(Value::Real(index as f64)).unwrap();
        }

        let error = stack.push(Value::Real(-1.0)).unwrap_err();

        assert_eq!(error.kind(), ErrorKind::StackOverflow);
        assert_eq!(stack.len(), MAX_STACK_DEPTH);
        assert_eq!(stack.peek().unwrap(), &Value::Real((MAX_STACK_DEPTH - 1) as f64));
    }
}
