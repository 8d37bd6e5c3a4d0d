use crate::{
    add_native_word,
    runtime::{
        data_structures::value::Value,
        error::{self, ErrorKind, ScriptError},
        interpreter::Interpreter,
    },
};
use nalgebra::{Complex, ComplexField, DMatrix};
use std::fmt::{self, Display, Formatter};

/// The binary arithmetic operators.  `a` is always the second value on the stack and `b` the top.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
    ElementMultiply,
    ElementDivide,
    ElementPower,
}

impl BinaryOp {
    /// The operator for an operator symbol.
    pub fn from_symbol(symbol: &str) -> Option<BinaryOp> {
        let op = match symbol {
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Subtract,
            "*" => BinaryOp::Multiply,
            "/" => BinaryOp::Divide,
            "^" | "pow" => BinaryOp::Power,
            ".*" => BinaryOp::ElementMultiply,
            "./" => BinaryOp::ElementDivide,
            ".^" => BinaryOp::ElementPower,
            _ => return None,
        };

        Some(op)
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Power => "^",
            BinaryOp::ElementMultiply => ".*",
            BinaryOp::ElementDivide => "./",
            BinaryOp::ElementPower => ".^",
        }
    }

    fn is_division(&self) -> bool {
        matches!(self, BinaryOp::Divide | BinaryOp::ElementDivide)
    }
}

impl Display for BinaryOp {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

fn unsupported<T>(op: BinaryOp, a: &Value, b: &Value) -> error::Result<T> {
    ScriptError::bare(
        ErrorKind::TypeMismatch,
        &format!(
            "Can't apply {} to a {} and a {}.",
            op,
            a.type_name(),
            b.type_name()
        ),
    )
}

fn dimension_mismatch<T>(op: BinaryOp, a: (usize, usize), b: (usize, usize)) -> error::Result<T> {
    ScriptError::bare(
        ErrorKind::DimensionMismatch,
        &format!(
            "Can't apply {} to a {} x {} and a {} x {} matrix.",
            op, a.0, a.1, b.0, b.1
        ),
    )
}

/// The principal branch of `a ^ b`, `exp(ln(a) * b)`.  Zero to any non-zero power is zero.
pub fn complex_power(a: Complex<f64>, b: Complex<f64>) -> Complex<f64> {
    let zero = Complex::new(0.0, 0.0);

    if a == zero {
        return if b == zero {
            Complex::new(1.0, 0.0)
        } else {
            zero
        };
    }

    (a.ln() * b).exp()
}

fn is_zero_scalar(value: &Value) -> bool {
    match value {
        Value::Real(number) => *number == 0.0,
        Value::Complex(number) => number.re == 0.0 && number.im == 0.0,
        _ => false,
    }
}

fn real_scalars(op: BinaryOp, a: f64, b: f64) -> Value {
    match op {
        BinaryOp::Add => Value::Real(a + b),
        BinaryOp::Subtract => Value::Real(a - b),
        BinaryOp::Multiply | BinaryOp::ElementMultiply => Value::Real(a * b),
        BinaryOp::Divide | BinaryOp::ElementDivide => Value::Real(a / b),

        BinaryOp::Power | BinaryOp::ElementPower => {
            // A negative base with a fractional exponent only has a complex result.
            if a < 0.0 && b.fract() != 0.0 {
                Value::Complex(complex_power(Complex::new(a, 0.0), Complex::new(b, 0.0)))
            } else {
                Value::Real(a.powf(b))
            }
        }
    }
}

fn complex_scalars(op: BinaryOp, a: Complex<f64>, b: Complex<f64>) -> Value {
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Subtract => a - b,
        BinaryOp::Multiply | BinaryOp::ElementMultiply => a * b,
        BinaryOp::Divide | BinaryOp::ElementDivide => a / b,
        BinaryOp::Power | BinaryOp::ElementPower => complex_power(a, b),
    };

    Value::Complex(result)
}

/// Apply an operator between a matrix and a scalar.  `scalar_first` is true when the scalar was
/// the left operand.
fn matrix_scalar<T>(
    op: BinaryOp,
    matrix: &DMatrix<T>,
    scalar: T,
    scalar_first: bool,
) -> error::Result<DMatrix<T>>
where
    T: ComplexField + Copy,
{
    let result = match (op, scalar_first) {
        (BinaryOp::Add, _) => matrix.map(|entry| entry + scalar),
        (BinaryOp::Subtract, false) => matrix.map(|entry| entry - scalar),
        (BinaryOp::Subtract, true) => matrix.map(|entry| scalar - entry),
        (BinaryOp::Multiply | BinaryOp::ElementMultiply, _) => matrix.map(|entry| entry * scalar),
        (BinaryOp::Divide | BinaryOp::ElementDivide, false) => matrix.map(|entry| entry / scalar),
        (BinaryOp::Divide | BinaryOp::ElementDivide, true) => matrix.map(|entry| scalar / entry),
        (BinaryOp::ElementPower, false) => matrix.map(|entry| entry.powc(scalar)),
        (BinaryOp::ElementPower, true) => matrix.map(|entry| scalar.powc(entry)),

        (BinaryOp::Power, _) => {
            return ScriptError::bare(
                ErrorKind::TypeMismatch,
                "Matrix power needs a matrix base and a real exponent.",
            );
        }
    };

    Ok(result)
}

/// Apply an operator between two matrices.
fn matrix_matrix<T>(op: BinaryOp, a: &DMatrix<T>, b: &DMatrix<T>) -> error::Result<DMatrix<T>>
where
    T: ComplexField + Copy,
{
    match op {
        BinaryOp::Multiply => {
            if a.ncols() != b.nrows() {
                return dimension_mismatch(op, a.shape(), b.shape());
            }

            Ok(a * b)
        }

        BinaryOp::Divide => {
            if !b.is_square() || a.ncols() != b.nrows() {
                return dimension_mismatch(op, a.shape(), b.shape());
            }

            match b.clone().try_inverse() {
                Some(inverse) => Ok(a * inverse),
                None => ScriptError::bare(
                    ErrorKind::DecompositionFailed,
                    "The divisor matrix is singular.",
                ),
            }
        }

        BinaryOp::Power => ScriptError::bare(
            ErrorKind::TypeMismatch,
            "A matrix can't be raised to a matrix power.",
        ),

        _ => {
            if a.shape() != b.shape() {
                return dimension_mismatch(op, a.shape(), b.shape());
            }

            let result = match op {
                BinaryOp::Add => a + b,
                BinaryOp::Subtract => a - b,
                BinaryOp::ElementMultiply => a.component_mul(b),
                BinaryOp::ElementDivide => a.component_div(b),
                _ => a.zip_map(b, |x, y| x.powc(y)),
            };

            Ok(result)
        }
    }
}

/// Raise a square matrix to a non-negative integer power by repeated squaring.
pub fn matrix_power<T>(matrix: &DMatrix<T>, exponent: u64) -> error::Result<DMatrix<T>>
where
    T: ComplexField + Copy,
{
    if !matrix.is_square() {
        return dimension_mismatch(BinaryOp::Power, matrix.shape(), matrix.shape());
    }

    let mut result = DMatrix::<T>::identity(matrix.nrows(), matrix.ncols());
    let mut base = matrix.clone();
    let mut exponent = exponent;

    while exponent > 0 {
        if exponent & 1 == 1 {
            result = &result * &base;
        }

        exponent >>= 1;

        if exponent > 0 {
            base = &base * &base;
        }
    }

    Ok(result)
}

fn matrix_power_value(a: &Value, b: &Value) -> error::Result<Value> {
    let exponent = match b {
        Value::Real(number) if number.is_finite() && *number >= 0.0 && number.fract() == 0.0 => {
            *number as u64
        }

        Value::Real(number) => {
            return ScriptError::bare(
                ErrorKind::InvalidArgument,
                &format!("Matrix power needs a non-negative integer, found {}.", number),
            );
        }

        _ => return unsupported(BinaryOp::Power, a, b),
    };

    match a {
        Value::MatrixReal(matrix) => matrix_power(matrix, exponent).map(Value::MatrixReal),
        Value::MatrixComplex(matrix) => matrix_power(matrix, exponent).map(Value::MatrixComplex),
        _ => unsupported(BinaryOp::Power, a, b),
    }
}

/// Apply a binary operator with the calculator's promotion rules.
///
/// Scalars promote real to complex.  A scalar is broadcast over a matrix, a complex scalar or a
/// complex matrix makes the result complex.  `*`, `/` and `^` between matrices are the matrix
/// product, multiplication by the inverse and the matrix power, the dot forms are always
/// elementwise.  Dividing a scalar by a zero scalar gives the zero divisor back.
pub fn binary_operation(op: BinaryOp, a: &Value, b: &Value) -> error::Result<Value> {
    if a.is_string() || b.is_string() {
        return unsupported(op, a, b);
    }

    if a.is_scalar() && b.is_scalar() {
        if op.is_division() && is_zero_scalar(b) {
            return Ok(b.clone());
        }

        let result = match (a, b) {
            (Value::Real(x), Value::Real(y)) => real_scalars(op, *x, *y),
            _ => complex_scalars(
                op,
                a.as_complex_scalar().unwrap_or_default(),
                b.as_complex_scalar().unwrap_or_default(),
            ),
        };

        return Ok(result);
    }

    if op == BinaryOp::Power {
        return matrix_power_value(a, b);
    }

    match (a, b) {
        (Value::MatrixReal(x), Value::MatrixReal(y)) => {
            matrix_matrix(op, x, y).map(Value::MatrixReal)
        }

        (Value::MatrixReal(matrix), Value::Real(scalar)) => {
            matrix_scalar(op, matrix, *scalar, false).map(Value::MatrixReal)
        }

        (Value::Real(scalar), Value::MatrixReal(matrix)) => {
            matrix_scalar(op, matrix, *scalar, true).map(Value::MatrixReal)
        }

        _ => {
            let result = match (a.as_complex_matrix_widened(), b.as_complex_matrix_widened()) {
                (Some(x), Some(y)) => matrix_matrix(op, &x, &y),

                (Some(matrix), None) => match b.as_complex_scalar() {
                    Some(scalar) => matrix_scalar(op, &matrix, scalar, false),
                    None => unsupported(op, a, b),
                },

                (None, Some(matrix)) => match a.as_complex_scalar() {
                    Some(scalar) => matrix_scalar(op, &matrix, scalar, true),
                    None => unsupported(op, a, b),
                },

                (None, None) => unsupported(op, a, b),
            };

            result.map(Value::MatrixComplex)
        }
    }
}

/// Apply the operator to the top two values and replace them with the result.  The operands are
/// only popped once the result exists, so a failure leaves the stack as it was.
///
/// Signature: `a b -- result`
fn apply_binary(interpreter: &mut dyn Interpreter, op: BinaryOp) -> error::Result<()> {
    let stack = interpreter.stack();
    let result = binary_operation(op, stack.peek_at(1)?, stack.peek_at(0)?)?;

    let _ = interpreter.pop()?;
    let _ = interpreter.pop()?;

    interpreter.push(result)
}

macro_rules! binary_word {
    ($name:ident, $op:expr) => {
        fn $name(interpreter: &mut dyn Interpreter) -> error::Result<()> {
            apply_binary(interpreter, $op)
        }
    };
}

binary_word!(word_add, BinaryOp::Add);
binary_word!(word_subtract, BinaryOp::Subtract);
binary_word!(word_multiply, BinaryOp::Multiply);
binary_word!(word_divide, BinaryOp::Divide);
binary_word!(word_power, BinaryOp::Power);
binary_word!(word_element_multiply, BinaryOp::ElementMultiply);
binary_word!(word_element_divide, BinaryOp::ElementDivide);
binary_word!(word_element_power, BinaryOp::ElementPower);

/// Register the arithmetic operators.  They're looked up by their symbols.
pub fn register_arithmetic_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(interpreter, "+", word_add, "Add two values.", "a b -- a+b", checked);

    add_native_word!(
        interpreter,
        "-",
        word_subtract,
        "Subtract the top value from the second.",
        "a b -- a-b",
        checked
    );

    add_native_word!(
        interpreter,
        "*",
        word_multiply,
        "Multiply, the matrix product for two matrices.",
        "a b -- a*b",
        checked
    );

    add_native_word!(
        interpreter,
        "/",
        word_divide,
        "Divide, multiply by the inverse for two matrices.",
        "a b -- a/b",
        checked
    );

    add_native_word!(
        interpreter,
        "^",
        word_power,
        "Raise to a power, the matrix power for a square matrix.",
        "a b -- a^b",
        checked
    );

    add_native_word!(
        interpreter,
        ".*",
        word_element_multiply,
        "Elementwise multiplication.",
        "a b -- a.*b",
        checked
    );

    add_native_word!(
        interpreter,
        "./",
        word_element_divide,
        "Elementwise division.",
        "a b -- a./b",
        checked
    );

    add_native_word!(
        interpreter,
        ".^",
        word_element_power,
        "Elementwise power.",
        "a b -- a.^b",
        checked
    );

    add_native_word!(
        interpreter,
        "pow",
        word_power,
        "Raise to a power, same as ^.",
        "a b -- a^b",
        checked
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::data_structures::value::RealMatrix;

    #[test]
    fn scalar_division_by_zero_returns_the_divisor() {
        let result = binary_operation(BinaryOp::Divide, &Value::Real(2.0), &Value::Real(0.0));
        assert_eq!(result.unwrap(), Value::Real(0.0));

        let zero = Value::Complex(Complex::new(0.0, 0.0));
        let result = binary_operation(BinaryOp::Divide, &Value::Real(2.0), &zero);
        assert_eq!(result.unwrap(), zero);
    }

    #[test]
    fn matrix_power_zero_is_identity() {
        let matrix = RealMatrix::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        let result = matrix_power(&matrix, 0).unwrap();

        assert_eq!(result, RealMatrix::identity(2, 2));
        assert_eq!(matrix_power(&matrix, 3).unwrap(), &matrix * &matrix * &matrix);
    }

    #[test]
    fn scalar_first_subtraction_is_elementwise() {
        let matrix = Value::MatrixReal(RealMatrix::from_row_slice(1, 2, &[1.0, 5.0]));
        let result = binary_operation(BinaryOp::Subtract, &Value::Real(10.0), &matrix).unwrap();

        assert_eq!(
            result,
            Value::MatrixReal(RealMatrix::from_row_slice(1, 2, &[9.0, 5.0]))
        );
    }
}
