/// Module for managing source text, turning it into tokens and loading stored programs.
#[macro_use]
pub mod lang;

/// Module for the runtime and the data structures used by the calculator.  As well as the
/// interpreter itself.
#[macro_use]
pub mod runtime;
