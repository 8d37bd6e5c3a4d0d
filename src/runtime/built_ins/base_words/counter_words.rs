use crate::{
    add_native_word,
    runtime::{
        error::{self, script_error, ErrorKind},
        interpreter::Interpreter,
    },
};

/// Set a program counter.  The value is truncated to an integer and must fit in an `i64`.
///
/// Signature: `value index -- `
fn word_set_counter(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.stack().require(2)?;

    let index = interpreter.pop_as_index()?;
    let value = interpreter.pop_as_real()?;

    let range = (i64::MIN as f64)..(i64::MAX as f64);

    if !range.contains(&value.trunc()) {
        return script_error(
            interpreter,
            ErrorKind::InvalidArgument,
            format!("A counter can't be set to {}.", value),
        );
    }

    interpreter.counters_mut().set(index, value.trunc() as i64)
}

/// Signature: `index -- `
fn word_clear_counter(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let index = interpreter.pop_as_index()?;

    interpreter.counters_mut().set(index, 0)
}

/// Signature: `index -- `
fn word_increment_counter(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let index = interpreter.pop_as_index()?;

    interpreter.counters_mut().increment(index)
}

/// Signature: `index -- `
fn word_decrement_counter(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let index = interpreter.pop_as_index()?;

    interpreter.counters_mut().decrement(index)
}

/// Register the program counter words.
pub fn register_counter_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(
        interpreter,
        "set_ctr",
        word_set_counter,
        "Set a counter.",
        "value index -- "
    );

    add_native_word!(
        interpreter,
        "clr_ctr",
        word_clear_counter,
        "Reset a counter to 0.",
        "index -- "
    );

    add_native_word!(
        interpreter,
        "ctr_inc",
        word_increment_counter,
        "Increment a counter.",
        "index -- "
    );

    add_native_word!(
        interpreter,
        "ctr_dec",
        word_decrement_counter,
        "Decrement a counter.",
        "index -- "
    );
}
