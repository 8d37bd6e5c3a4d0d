/// Module for managing the original source text.
pub mod source_buffer;

/// Module for turning a line of source text into a lazy stream of tokens.
pub mod tokenizing;

/// Module for loading, listing and representing stored calculator programs.  A program is a list
/// of line based instructions executed by the program machine.
pub mod program;
