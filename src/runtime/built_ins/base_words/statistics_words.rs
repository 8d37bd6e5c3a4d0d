use crate::{
    add_native_word,
    runtime::{
        data_structures::value::Value,
        error::{self, ErrorKind, ScriptError},
        interpreter::Interpreter,
    },
};
use statrs::{
    distribution::{Continuous, ContinuousCDF, Normal},
    function::{
        beta::{checked_beta, checked_ln_beta},
        gamma::{gamma, ln_gamma},
    },
};
use std::fmt::Display;

fn standard_normal() -> error::Result<Normal> {
    Normal::new(0.0, 1.0).map_err(|error| invalid_argument("normal distribution", error))
}

fn invalid_argument(name: &str, error: impl Display) -> ScriptError {
    ScriptError::new(
        ErrorKind::InvalidArgument,
        None,
        format!("{}: {}.", name, error),
        None,
    )
}

/// Apply a real function to a real, or to every entry of a real matrix.
fn apply_real(name: &str, value: Value, function: impl Fn(f64) -> f64) -> error::Result<Value> {
    match value {
        Value::Real(x) => Ok(Value::Real(function(x))),
        Value::MatrixReal(matrix) => Ok(Value::MatrixReal(matrix.map(function))),

        other => ScriptError::bare(
            ErrorKind::TypeMismatch,
            &format!("{} needs a real or a real matrix, found a {}.", name, other.type_name()),
        ),
    }
}

fn is_probability(p: f64) -> bool {
    (0.0..=1.0).contains(&p)
}

/// Standard normal density.
///
/// Signature: `x -- pdf(x)`
fn word_normal_pdf(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let normal = standard_normal()?;
    let value = interpreter.pop()?;

    interpreter.push(apply_real("npdf", value, |x| normal.pdf(x))?)
}

/// Standard normal cumulative distribution.
///
/// Signature: `x -- cdf(x)`
fn word_normal_cdf(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let normal = standard_normal()?;
    let value = interpreter.pop()?;

    interpreter.push(apply_real("ncdf", value, |x| normal.cdf(x))?)
}

/// Standard normal quantile, the inverse of `ncdf`.  Every probability must lie in `[0, 1]`.
///
/// Signature: `p -- x`
fn word_normal_quantile(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let normal = standard_normal()?;

    let in_range = match interpreter.peek()? {
        Value::Real(p) => is_probability(*p),
        Value::MatrixReal(matrix) => matrix.iter().all(|p| is_probability(*p)),
        _ => true,
    };

    if !in_range {
        return ScriptError::bare(
            ErrorKind::InvalidArgument,
            "nquant needs probabilities between 0 and 1.",
        );
    }

    let value = interpreter.pop()?;

    interpreter.push(apply_real("nquant", value, |p| normal.inverse_cdf(p))?)
}

/// Signature: `x -- gamma(x)`
fn word_gamma(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let value = interpreter.pop()?;

    interpreter.push(apply_real("gamma", value, gamma)?)
}

/// Signature: `x -- ln(gamma(x))`
fn word_ln_gamma(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let value = interpreter.pop()?;

    interpreter.push(apply_real("ln_gamma", value, ln_gamma)?)
}

fn pop_two_reals(interpreter: &mut dyn Interpreter) -> error::Result<(f64, f64)> {
    interpreter.stack().require(2)?;

    let b = interpreter.pop_as_real()?;
    let a = interpreter.pop_as_real()?;

    Ok((a, b))
}

/// The beta function, both arguments positive.
///
/// Signature: `a b -- B(a,b)`
fn word_beta(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let (a, b) = pop_two_reals(interpreter)?;
    let result = checked_beta(a, b).map_err(|error| invalid_argument("beta", error))?;

    interpreter.push(Value::Real(result))
}

/// Signature: `a b -- ln(B(a,b))`
fn word_ln_beta(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let (a, b) = pop_two_reals(interpreter)?;
    let result = checked_ln_beta(a, b).map_err(|error| invalid_argument("ln_beta", error))?;

    interpreter.push(Value::Real(result))
}

/// Register the normal distribution and the gamma and beta functions.
pub fn register_statistics_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(
        interpreter,
        "npdf",
        word_normal_pdf,
        "Standard normal density.",
        "x -- pdf(x)"
    );

    add_native_word!(
        interpreter,
        "ncdf",
        word_normal_cdf,
        "Standard normal cumulative distribution.",
        "x -- cdf(x)"
    );

    add_native_word!(
        interpreter,
        "nquant",
        word_normal_quantile,
        "Standard normal quantile.",
        "p -- x"
    );

    add_native_word!(interpreter, "gamma", word_gamma, "The gamma function.", "x -- gamma(x)");

    add_native_word!(
        interpreter,
        "ln_gamma",
        word_ln_gamma,
        "Natural log of the gamma function.",
        "x -- ln(gamma(x))"
    );

    add_native_word!(interpreter, "beta", word_beta, "The beta function.", "a b -- B(a,b)");

    add_native_word!(
        interpreter,
        "ln_beta",
        word_ln_beta,
        "Natural log of the beta function.",
        "a b -- ln(B(a,b))"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::data_structures::value::RealMatrix;

    #[test]
    fn matrices_are_mapped_entry_by_entry() {
        let matrix = Value::MatrixReal(RealMatrix::from_row_slice(1, 3, &[1.0, 2.0, 5.0]));
        let result = apply_real("gamma", matrix, gamma).unwrap();

        let Value::MatrixReal(result) = result else {
            panic!("expected a real matrix, found {:?}", result);
        };

        assert!((result[(0, 2)] - 24.0).abs() < 1e-9);
        assert!((result[(0, 1)] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn complex_arguments_are_refused() {
        let value = Value::Complex(nalgebra::Complex::new(1.0, 1.0));
        let error = apply_real("npdf", value, |x| x).unwrap_err();

        assert_eq!(error.kind(), ErrorKind::TypeMismatch);
    }
}
