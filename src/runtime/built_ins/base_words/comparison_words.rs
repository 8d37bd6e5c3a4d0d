use crate::{
    add_native_word,
    runtime::{
        data_structures::value::{RealMatrix, ToValue, Value},
        error::{self, ErrorKind, ScriptError},
        interpreter::Interpreter,
    },
};
use nalgebra::Complex;

/// A comparison operand reduced to reals.  Complex numbers are compared by magnitude.
enum Magnitudes {
    Scalar(f64),
    Matrix(RealMatrix),
}

fn magnitudes(value: &Value) -> Option<Magnitudes> {
    let result = match value {
        Value::Real(number) => Magnitudes::Scalar(*number),
        Value::Complex(number) => Magnitudes::Scalar(number.norm()),
        Value::MatrixReal(matrix) => Magnitudes::Matrix(matrix.clone()),
        Value::MatrixComplex(matrix) => Magnitudes::Matrix(matrix.map(|entry| entry.norm())),
        Value::String(_) => return None,
    };

    Some(result)
}

fn flag(truth: bool) -> f64 {
    if truth { 1.0 } else { 0.0 }
}

/// Compare two values elementwise, giving 1 for true and 0 for false.  Strings can only be tested
/// for equality with other strings.
pub fn compare(
    name: &str,
    test: fn(f64, f64) -> bool,
    a: &Value,
    b: &Value,
) -> error::Result<Value> {
    if let (Value::String(x), Value::String(y)) = (a, b) {
        return match name {
            "eq" => Ok((x == y).to_value()),
            "neq" => Ok((x != y).to_value()),
            _ => ScriptError::bare(
                ErrorKind::TypeMismatch,
                &format!("Strings can't be compared with {}.", name),
            ),
        };
    }

    let (Some(x), Some(y)) = (magnitudes(a), magnitudes(b)) else {
        return ScriptError::bare(
            ErrorKind::TypeMismatch,
            &format!("Can't compare a {} and a {}.", a.type_name(), b.type_name()),
        );
    };

    let result = match (x, y) {
        (Magnitudes::Scalar(x), Magnitudes::Scalar(y)) => Value::Real(flag(test(x, y))),

        (Magnitudes::Matrix(matrix), Magnitudes::Scalar(y)) => {
            Value::MatrixReal(matrix.map(|x| flag(test(x, y))))
        }

        (Magnitudes::Scalar(x), Magnitudes::Matrix(matrix)) => {
            Value::MatrixReal(matrix.map(|y| flag(test(x, y))))
        }

        (Magnitudes::Matrix(x), Magnitudes::Matrix(y)) => {
            if x.shape() != y.shape() {
                return ScriptError::bare(
                    ErrorKind::DimensionMismatch,
                    &format!(
                        "Can't compare a {} x {} and a {} x {} matrix.",
                        x.nrows(),
                        x.ncols(),
                        y.nrows(),
                        y.ncols()
                    ),
                );
            }

            Value::MatrixReal(x.zip_map(&y, |x, y| flag(test(x, y))))
        }
    };

    Ok(result)
}

fn apply_compare(
    interpreter: &mut dyn Interpreter,
    name: &str,
    test: fn(f64, f64) -> bool,
) -> error::Result<()> {
    interpreter.stack().require(2)?;

    let b = interpreter.pop()?;
    let a = interpreter.pop()?;

    let result = compare(name, test, &a, &b)?;
    interpreter.push(result)
}

macro_rules! comparison_word {
    ($function:ident, $name:literal, $test:expr) => {
        fn $function(interpreter: &mut dyn Interpreter) -> error::Result<()> {
            apply_compare(interpreter, $name, $test)
        }
    };
}

comparison_word!(word_equal, "eq", |a, b| a == b);
comparison_word!(word_not_equal, "neq", |a, b| a != b);
comparison_word!(word_less, "lt", |a, b| a < b);
comparison_word!(word_less_equal, "leq", |a, b| a <= b);
comparison_word!(word_greater, "gt", |a, b| a > b);
comparison_word!(word_greater_equal, "geq", |a, b| a >= b);
comparison_word!(word_and, "and", |a, b| a != 0.0 && b != 0.0);
comparison_word!(word_or, "or", |a, b| a != 0.0 || b != 0.0);

fn logical_not(value: f64) -> f64 {
    flag(value == 0.0)
}

/// Logical not.  Complex values are negated part by part, matrices entry by entry.
///
/// Signature: `value -- !value`
fn word_not(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let result = match interpreter.pop()? {
        Value::Real(number) => Value::Real(logical_not(number)),

        Value::Complex(number) => {
            Value::Complex(Complex::new(logical_not(number.re), logical_not(number.im)))
        }

        Value::MatrixReal(matrix) => Value::MatrixReal(matrix.map(logical_not)),

        Value::MatrixComplex(matrix) => Value::MatrixComplex(
            matrix.map(|entry| Complex::new(logical_not(entry.re), logical_not(entry.im))),
        ),

        Value::String(_) => {
            return ScriptError::bare(ErrorKind::TypeMismatch, "A string has no logical value.");
        }
    };

    interpreter.push(result)
}

/// Register the comparison and logic words.
pub fn register_comparison_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(interpreter, "eq", word_equal, "Equal, 1 or 0.", "a b -- a==b");
    add_native_word!(interpreter, "neq", word_not_equal, "Not equal, 1 or 0.", "a b -- a!=b");
    add_native_word!(interpreter, "lt", word_less, "Less than, 1 or 0.", "a b -- a<b");
    add_native_word!(
        interpreter,
        "leq",
        word_less_equal,
        "Less or equal, 1 or 0.",
        "a b -- a<=b"
    );
    add_native_word!(interpreter, "gt", word_greater, "Greater than, 1 or 0.", "a b -- a>b");
    add_native_word!(
        interpreter,
        "geq",
        word_greater_equal,
        "Greater or equal, 1 or 0.",
        "a b -- a>=b"
    );
    add_native_word!(interpreter, "and", word_and, "Logical and.", "a b -- a&&b");
    add_native_word!(interpreter, "or", word_or, "Logical or.", "a b -- a||b");
    add_native_word!(interpreter, "not", word_not, "Logical not.", "a -- !a");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complex_operands_compare_by_magnitude() {
        let a = Value::Complex(Complex::new(3.0, 4.0));
        let result = compare("gt", |a, b| a > b, &a, &Value::Real(4.0)).unwrap();

        assert_eq!(result, Value::Real(1.0));
    }

    #[test]
    fn matrix_comparison_is_elementwise() {
        let a = Value::MatrixReal(RealMatrix::from_row_slice(1, 3, &[1.0, 2.0, 3.0]));
        let result = compare("lt", |a, b| a < b, &a, &Value::Real(2.5)).unwrap();

        assert_eq!(
            result,
            Value::MatrixReal(RealMatrix::from_row_slice(1, 3, &[1.0, 1.0, 0.0]))
        );
    }
}
