use crate::{
    add_native_word,
    runtime::{error, interpreter::Interpreter},
};

/// Drop the top value on the stack.
///
/// Signature: `value -- `
fn word_drop(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let _ = interpreter.pop()?;

    Ok(())
}

/// Clear the whole stack.
///
/// Signature: `... -- `
fn word_clear_stack(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.stack_mut().clear();

    Ok(())
}

/// Swap the top 2 values on the stack.
///
/// Signature: `a b -- b a`
fn word_swap(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.stack_mut().swap()
}

/// Duplicate the top value on the stack.
///
/// Signature: `value -- value value`
fn word_dup(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.stack_mut().dup()
}

/// Drop the second value.
///
/// Signature: `a b -- b`
fn word_nip(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.stack_mut().nip()
}

/// Copy the top value under the second.
///
/// Signature: `a b -- b a b`
fn word_tuck(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.stack_mut().tuck()
}

/// Rotate the top 3 values on the stack.
///
/// Signature: `a b c -- b c a`
fn word_roll(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.stack_mut().roll(2)
}

/// Copy the second value to the top.
///
/// Signature: `a b -- a b a`
fn word_over(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.stack_mut().over()
}

/// Register the stack manipulation words.
pub fn register_stack_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(
        interpreter,
        "drop",
        word_drop,
        "Drop the top value from the stack.",
        "value -- ",
        checked
    );

    add_native_word!(
        interpreter,
        "clst",
        word_clear_stack,
        "Clear the stack.",
        "... -- ",
        checked
    );

    add_native_word!(
        interpreter,
        "swap",
        word_swap,
        "Swap the top 2 values.",
        "a b -- b a",
        checked
    );

    add_native_word!(
        interpreter,
        "dup",
        word_dup,
        "Duplicate the top value.",
        "value -- value value",
        checked
    );

    add_native_word!(
        interpreter,
        "nip",
        word_nip,
        "Drop the second value.",
        "a b -- b",
        checked
    );

    add_native_word!(
        interpreter,
        "tuck",
        word_tuck,
        "Copy the top value under the second.",
        "a b -- b a b",
        checked
    );

    add_native_word!(
        interpreter,
        "roll",
        word_roll,
        "Rotate the third value to the top.",
        "a b c -- b c a",
        checked
    );

    add_native_word!(
        interpreter,
        "over",
        word_over,
        "Copy the second value to the top.",
        "a b -- a b a",
        checked
    );
}
