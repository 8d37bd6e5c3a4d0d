/// Module contains the Value enumeration and it's implementation.  The value is one of the core
/// data structures of the calculator.  It represents every kind of datum the stack can hold.
pub mod value;

/// The bounded operand stack.
pub mod value_stack;

/// The built-in function table used by the evaluator.
pub mod dictionary;

/// User words and predefined macros.
pub mod definitions;

/// The numbered storage registers and their file format.
pub mod registers;

/// User settings and their `key = value` file.
pub mod config;
