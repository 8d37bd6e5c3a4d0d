use crate::{
    add_native_word,
    runtime::{
        data_structures::value::{to_complex_matrix, Value},
        error::{self, ErrorKind, ScriptError},
        interpreter::Interpreter,
    },
};
use nalgebra::Complex;

type RealFunction = fn(f64) -> f64;
type ComplexFunction = fn(Complex<f64>) -> Complex<f64>;
type Domain = fn(f64) -> bool;

fn not_a_number<T>(name: &str, value: &Value) -> error::Result<T> {
    ScriptError::bare(
        ErrorKind::TypeMismatch,
        &format!("{} needs a number or a matrix, found a {}.", name, value.type_name()),
    )
}

fn everywhere(_: f64) -> bool {
    true
}

fn unit_interval(x: f64) -> bool {
    (-1.0..=1.0).contains(&x)
}

fn at_least_one(x: f64) -> bool {
    x >= 1.0
}

fn non_negative(x: f64) -> bool {
    x >= 0.0
}

/// Apply a function to a number, or to every entry of a matrix.  A real argument outside the real
/// domain of the function is promoted to complex, and a real matrix holding any such entry is
/// promoted as a whole.
pub fn apply_unary(
    name: &str,
    value: Value,
    real: RealFunction,
    complex: ComplexFunction,
    domain: Domain,
) -> error::Result<Value> {
    let result = match value {
        Value::Real(x) if domain(x) => Value::Real(real(x)),
        Value::Real(x) => Value::Complex(complex(Complex::new(x, 0.0))),
        Value::Complex(z) => Value::Complex(complex(z)),

        Value::MatrixReal(matrix) => {
            if matrix.iter().all(|x| domain(*x)) {
                Value::MatrixReal(matrix.map(real))
            } else {
                Value::MatrixComplex(to_complex_matrix(&matrix).map(complex))
            }
        }

        Value::MatrixComplex(matrix) => Value::MatrixComplex(matrix.map(complex)),

        other => return not_a_number(name, &other),
    };

    Ok(result)
}

macro_rules! unary_word {
    ($function:ident, $name:literal, $real:expr, $complex:expr, $domain:expr) => {
        fn $function(interpreter: &mut dyn Interpreter) -> error::Result<()> {
            let value = interpreter.pop()?;
            let result = apply_unary($name, value, $real, $complex, $domain)?;

            interpreter.push(result)
        }
    };
}

unary_word!(word_sin, "sin", f64::sin, |z| z.sin(), everywhere);
unary_word!(word_cos, "cos", f64::cos, |z| z.cos(), everywhere);
unary_word!(word_tan, "tan", f64::tan, |z| z.tan(), everywhere);
unary_word!(word_asin, "asin", f64::asin, |z| z.asin(), unit_interval);
unary_word!(word_acos, "acos", f64::acos, |z| z.acos(), unit_interval);
unary_word!(word_atan, "atan", f64::atan, |z| z.atan(), everywhere);
unary_word!(word_sinh, "sinh", f64::sinh, |z| z.sinh(), everywhere);
unary_word!(word_cosh, "cosh", f64::cosh, |z| z.cosh(), everywhere);
unary_word!(word_tanh, "tanh", f64::tanh, |z| z.tanh(), everywhere);
unary_word!(word_asinh, "asinh", f64::asinh, |z| z.asinh(), everywhere);
unary_word!(word_acosh, "acosh", f64::acosh, |z| z.acosh(), at_least_one);
unary_word!(word_atanh, "atanh", f64::atanh, |z| z.atanh(), unit_interval);
unary_word!(word_exp, "exp", f64::exp, |z| z.exp(), everywhere);
unary_word!(word_change_sign, "chs", |x| -x, |z| -z, everywhere);
unary_word!(word_invert, "inv", |x| 1.0 / x, |z| z.inv(), everywhere);
unary_word!(word_ln, "ln", f64::ln, |z| z.ln(), non_negative);
unary_word!(word_log, "log", f64::log10, |z| z.log10(), non_negative);
unary_word!(word_sqrt, "sqrt", f64::sqrt, |z| z.sqrt(), non_negative);

unary_word!(
    word_fraction,
    "frac",
    f64::fract,
    |z| Complex::new(z.re.fract(), z.im.fract()),
    everywhere
);
unary_word!(
    word_integer,
    "intg",
    f64::trunc,
    |z| Complex::new(z.re.trunc(), z.im.trunc()),
    everywhere
);

unary_word!(word_conjugate, "conj", |x| x, |z| z.conj(), everywhere);

/// Apply a function that takes a number, or every entry of a matrix, to a real.
fn apply_part(
    name: &str,
    value: Value,
    real: RealFunction,
    complex: fn(Complex<f64>) -> f64,
) -> error::Result<Value> {
    let result = match value {
        Value::Real(x) => Value::Real(real(x)),
        Value::Complex(z) => Value::Real(complex(z)),
        Value::MatrixReal(matrix) => Value::MatrixReal(matrix.map(real)),
        Value::MatrixComplex(matrix) => Value::MatrixReal(matrix.map(complex)),
        other => return not_a_number(name, &other),
    };

    Ok(result)
}

macro_rules! part_word {
    ($function:ident, $name:literal, $real:expr, $complex:expr) => {
        fn $function(interpreter: &mut dyn Interpreter) -> error::Result<()> {
            let value = interpreter.pop()?;
            let result = apply_part($name, value, $real, $complex)?;

            interpreter.push(result)
        }
    };
}

part_word!(word_real_part, "re", |x| x, |z| z.re);
part_word!(word_imaginary_part, "im", |_| 0.0, |z| z.im);
part_word!(word_absolute, "abs", f64::abs, |z| z.norm());
part_word!(word_argument, "arg", |x| 0f64.atan2(x), |z| z.arg());

/// Split a complex number into its parts, imaginary on top.  A complex matrix is split into two
/// real matrices.
///
/// Signature: `z -- re im`
fn word_split_complex(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let (re, im) = match interpreter.pop()? {
        Value::Complex(z) => (Value::Real(z.re), Value::Real(z.im)),
        Value::Real(x) => (Value::Real(x), Value::Real(0.0)),

        Value::MatrixComplex(matrix) => (
            Value::MatrixReal(matrix.map(|z| z.re)),
            Value::MatrixReal(matrix.map(|z| z.im)),
        ),

        other => return not_a_number("split_c", &other),
    };

    interpreter.stack().require_room(2)?;
    interpreter.push(re)?;
    interpreter.push(im)
}

/// Join real and imaginary parts into a complex number, or two equally shaped real matrices into
/// a complex matrix.
///
/// Signature: `re im -- z`
fn word_join_complex(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.stack().require(2)?;

    let im = interpreter.pop()?;
    let re = interpreter.pop()?;

    let result = match (&re, &im) {
        (Value::Real(re), Value::Real(im)) => Value::Complex(Complex::new(*re, *im)),

        (Value::MatrixReal(re), Value::MatrixReal(im)) => {
            if re.shape() != im.shape() {
                return ScriptError::bare(
                    ErrorKind::DimensionMismatch,
                    "The real and imaginary matrices must be the same shape.",
                );
            }

            Value::MatrixComplex(re.zip_map(im, Complex::new))
        }

        _ => {
            return ScriptError::bare(
                ErrorKind::TypeMismatch,
                &format!(
                    "j2r needs two reals or two real matrices, found a {} and a {}.",
                    re.type_name(),
                    im.type_name()
                ),
            );
        }
    };

    interpreter.push(result)
}

/// Promote a real, or a real matrix, to complex.
///
/// Signature: `x -- z`
fn word_real_to_complex(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let result = match interpreter.pop()? {
        Value::Real(x) => Value::Complex(Complex::new(x, 0.0)),
        Value::MatrixReal(matrix) => Value::MatrixComplex(to_complex_matrix(&matrix)),
        value @ (Value::Complex(_) | Value::MatrixComplex(_)) => value,
        other => return not_a_number("re2c", &other),
    };

    interpreter.push(result)
}

/// Register the elementary functions.
pub fn register_unary_math_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(interpreter, "sin", word_sin, "Sine.", "x -- sin(x)");
    add_native_word!(interpreter, "cos", word_cos, "Cosine.", "x -- cos(x)");
    add_native_word!(interpreter, "tan", word_tan, "Tangent.", "x -- tan(x)");
    add_native_word!(interpreter, "asin", word_asin, "Arc sine.", "x -- asin(x)");
    add_native_word!(interpreter, "acos", word_acos, "Arc cosine.", "x -- acos(x)");
    add_native_word!(interpreter, "atan", word_atan, "Arc tangent.", "x -- atan(x)");
    add_native_word!(interpreter, "sinh", word_sinh, "Hyperbolic sine.", "x -- sinh(x)");
    add_native_word!(interpreter, "cosh", word_cosh, "Hyperbolic cosine.", "x -- cosh(x)");
    add_native_word!(interpreter, "tanh", word_tanh, "Hyperbolic tangent.", "x -- tanh(x)");
    add_native_word!(interpreter, "asinh", word_asinh, "Area hyperbolic sine.", "x -- asinh(x)");
    add_native_word!(interpreter, "acosh", word_acosh, "Area hyperbolic cosine.", "x -- acosh(x)");
    add_native_word!(interpreter, "atanh", word_atanh, "Area hyperbolic tangent.", "x -- atanh(x)");
    add_native_word!(interpreter, "exp", word_exp, "Exponential.", "x -- e^x");
    add_native_word!(interpreter, "chs", word_change_sign, "Change sign.", "x -- -x");
    add_native_word!(interpreter, "inv", word_invert, "Reciprocal, entry by entry.", "x -- 1/x");
}

/// Register the complex part, logarithm and root words.
pub fn register_complex_part_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(
        interpreter,
        "split_c",
        word_split_complex,
        "Split into real and imaginary parts.",
        "z -- re im"
    );

    add_native_word!(interpreter, "abs", word_absolute, "Absolute value or modulus.", "z -- |z|");
    add_native_word!(interpreter, "re", word_real_part, "Real part.", "z -- re");
    add_native_word!(interpreter, "im", word_imaginary_part, "Imaginary part.", "z -- im");
    add_native_word!(interpreter, "arg", word_argument, "Argument.", "z -- arg(z)");
    add_native_word!(interpreter, "conj", word_conjugate, "Complex conjugate.", "z -- conj(z)");

    add_native_word!(
        interpreter,
        "re2c",
        word_real_to_complex,
        "Promote a real to complex.",
        "x -- z"
    );

    add_native_word!(
        interpreter,
        "j2r",
        word_join_complex,
        "Join real and imaginary parts.",
        "re im -- z"
    );

    add_native_word!(interpreter, "ln", word_ln, "Natural logarithm.", "x -- ln(x)");
    add_native_word!(interpreter, "log", word_log, "Base 10 logarithm.", "x -- log(x)");
    add_native_word!(interpreter, "sqrt", word_sqrt, "Square root.", "x -- sqrt(x)");
}

/// Register `frac` and `intg`.
pub fn register_rounding_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(interpreter, "frac", word_fraction, "Fractional part.", "x -- frac(x)");
    add_native_word!(interpreter, "intg", word_integer, "Integer part.", "x -- intg(x)");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::data_structures::value::{ComplexMatrix, RealMatrix};

    #[test]
    fn negative_square_root_is_complex() {
        let result = apply_unary("sqrt", Value::Real(-4.0), f64::sqrt, |z| z.sqrt(), non_negative);
        assert_eq!(result.unwrap(), Value::Complex(Complex::new(0.0, 2.0)));
    }

    #[test]
    fn matrix_with_negative_entry_is_promoted_whole() {
        let matrix = Value::MatrixReal(RealMatrix::from_row_slice(1, 2, &[4.0, -1.0]));
        let result = apply_unary("sqrt", matrix, f64::sqrt, |z| z.sqrt(), non_negative).unwrap();

        let expected: ComplexMatrix =
            ComplexMatrix::from_row_slice(1, 2, &[Complex::new(2.0, 0.0), Complex::new(0.0, 1.0)]);

        assert_eq!(result, Value::MatrixComplex(expected));
    }
}
