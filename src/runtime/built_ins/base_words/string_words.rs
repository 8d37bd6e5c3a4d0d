use crate::{
    add_native_word,
    runtime::{
        data_structures::value::{ToValue, Value},
        error::{self, script_error, ErrorKind},
        interpreter::Interpreter,
    },
};

/// Concatenate two strings.
///
/// Signature: `a b -- ab`
fn word_string_concatenate(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.stack().require(2)?;

    let b = interpreter.pop_as_string()?;
    let a = interpreter.pop_as_string()?;

    interpreter.push(Value::String(a + &b))
}

/// Signature: `string -- lowercase`
fn word_string_to_lower(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let string = interpreter.pop_as_string()?;

    interpreter.push(Value::String(string.to_lowercase()))
}

/// Signature: `string -- uppercase`
fn word_string_to_upper(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let string = interpreter.pop_as_string()?;

    interpreter.push(Value::String(string.to_uppercase()))
}

/// Get the length of a string in logical characters.
///
/// Signature: `string -- size`
fn word_string_length(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let string = interpreter.pop_as_string()?;

    interpreter.push(string.chars().count().to_value())
}

/// Reverse a string, character by character.
///
/// Signature: `string -- reversed`
fn word_string_reverse(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let string = interpreter.pop_as_string()?;

    interpreter.push(Value::String(string.chars().rev().collect()))
}

/// The integer part of a real as a string.  The number stays on the stack.
///
/// Signature: `x -- x string`
fn word_int_to_string(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let value = match interpreter.peek()? {
        Value::Real(value) => *value,
        other => {
            return script_error(
                interpreter,
                ErrorKind::TypeMismatch,
                format!("int2str needs a real, found a {}.", other.type_name()),
            );
        }
    };

    if !value.is_finite() {
        return script_error(
            interpreter,
            ErrorKind::InvalidArgument,
            format!("{} has no integer part.", value),
        );
    }

    interpreter.push(Value::String(format!("{}", value.trunc() as i64)))
}

/// Register the string words.
pub fn register_string_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(
        interpreter,
        "scon",
        word_string_concatenate,
        "Concatenate two strings.",
        "a b -- ab"
    );

    add_native_word!(
        interpreter,
        "s2l",
        word_string_to_lower,
        "Convert a string to lowercase.",
        "string -- lowercase"
    );

    add_native_word!(
        interpreter,
        "s2u",
        word_string_to_upper,
        "Convert a string to uppercase.",
        "string -- uppercase"
    );

    add_native_word!(
        interpreter,
        "slen",
        word_string_length,
        "Get the length of a string.",
        "string -- size"
    );

    add_native_word!(
        interpreter,
        "srev",
        word_string_reverse,
        "Reverse a string.",
        "string -- reversed"
    );

    add_native_word!(
        interpreter,
        "int2str",
        word_int_to_string,
        "Integer part of a real as a string.",
        "x -- x string"
    );
}
