use crate::{
    add_native_word,
    runtime::{
        data_structures::{
            config::tolerance_in_range,
            value::{ComplexMatrix, RealMatrix, Value},
        },
        error::{self, script_error, ErrorKind},
        interpreter::Interpreter,
    },
};
use nalgebra::Complex;

/// Romberg refinement levels before `integrate` settles for its best estimate.
const MAX_ROMBERG_LEVELS: usize = 20;

/// Bisection steps before `fzero` gives up narrowing the bracket.
const MAX_BISECTIONS: usize = 200;

/// The polynomial coefficients held by a matrix value, highest power first, read row by row.
fn coefficients(interpreter: &dyn Interpreter, value: &Value) -> error::Result<Vec<Complex<f64>>> {
    let coefficients: Vec<Complex<f64>> = match value {
        Value::MatrixReal(matrix) => matrix
            .transpose()
            .iter()
            .map(|entry| Complex::new(*entry, 0.0))
            .collect(),

        Value::MatrixComplex(matrix) => matrix.transpose().iter().copied().collect(),

        other => {
            return script_error(
                interpreter,
                ErrorKind::TypeMismatch,
                format!("Polynomial coefficients must be a matrix, found a {}.", other.type_name()),
            );
        }
    };

    if coefficients.is_empty() {
        return script_error(
            interpreter,
            ErrorKind::InvalidArgument,
            "The coefficient matrix is empty.".to_string(),
        );
    }

    Ok(coefficients)
}

/// Evaluate a polynomial by Horner's rule.
pub fn horner(coefficients: &[Complex<f64>], x: Complex<f64>) -> Complex<f64> {
    coefficients
        .iter()
        .fold(Complex::new(0.0, 0.0), |sum, coefficient| sum * x + coefficient)
}

/// The roots of a real polynomial, highest power first, as the eigenvalues of its companion
/// matrix.  Leading zeros are ignored.
pub fn polynomial_roots(coefficients: &[f64]) -> Option<Vec<Complex<f64>>> {
    let first = coefficients.iter().position(|coefficient| *coefficient != 0.0)?;
    let coefficients = &coefficients[first..];
    let degree = coefficients.len().checked_sub(1)?;

    if degree == 0 {
        return None;
    }

    let lead = coefficients[0];
    let mut companion = RealMatrix::zeros(degree, degree);

    for col in 0..degree {
        companion[(0, col)] = -coefficients[col + 1] / lead;
    }

    for row in 1..degree {
        companion[(row, row - 1)] = 1.0;
    }

    Some(companion.complex_eigenvalues().iter().copied().collect())
}

/// Evaluate the polynomial at x.
///
/// Signature: `coefficients x -- p(x)`
fn word_polynomial_value(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.stack().require(2)?;

    let x = interpreter.pop()?;
    let matrix = interpreter.pop()?;

    let x = match x.as_complex_scalar() {
        Some(x) => x,
        None => {
            return script_error(
                interpreter,
                ErrorKind::TypeMismatch,
                format!("pval needs a scalar x, found a {}.", x.type_name()),
            );
        }
    };

    let coefficients = coefficients(interpreter, &matrix)?;
    let result = horner(&coefficients, x);

    if result.im == 0.0 {
        interpreter.push(Value::Real(result.re))
    } else {
        interpreter.push(Value::Complex(result))
    }
}

/// Find the roots of a real polynomial.
///
/// Signature: `coefficients -- roots`
fn word_roots(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let matrix = interpreter.pop_as_real_matrix()?;
    let coefficients: Vec<f64> = matrix.transpose().iter().copied().collect();

    match polynomial_roots(&coefficients) {
        Some(roots) => {
            let roots = ComplexMatrix::from_row_slice(1, roots.len(), &roots);
            interpreter.push(Value::MatrixComplex(roots))
        }

        None => script_error(
            interpreter,
            ErrorKind::InvalidArgument,
            "The polynomial must have degree 1 or more.".to_string(),
        ),
    }
}

/// The body and name of the selected user word.
fn selected_word(interpreter: &dyn Interpreter) -> error::Result<(String, String)> {
    let index = interpreter.config().selected_function;

    match interpreter.words().get(index) {
        Some(definition) => Ok((definition.name.clone(), definition.body.clone())),
        None => script_error(
            interpreter,
            ErrorKind::InvalidArgument,
            format!("No user word {} is defined to use as the function.", index),
        ),
    }
}

/// Evaluate the selected word on a scratch stack holding only `x`.  The real left on top is the
/// function's value.  The caller's stack is always put back.
fn evaluate_selected(
    interpreter: &mut dyn Interpreter,
    name: &str,
    body: &str,
    x: f64,
) -> error::Result<f64> {
    let saved = std::mem::take(interpreter.stack_mut());

    let result = interpreter
        .push(Value::Real(x))
        .and_then(|_| interpreter.evaluate_line(name, body));

    let value = match interpreter.stack().peek() {
        Ok(Value::Real(value)) => Some(*value),
        _ => None,
    };

    interpreter.stack_mut().restore(saved);
    result?;

    match value {
        Some(value) => Ok(value),
        None => script_error(
            interpreter,
            ErrorKind::TypeMismatch,
            format!("Word {} did not leave a real on the stack.", name),
        ),
    }
}

/// Romberg integration of the selected word.
fn romberg(
    interpreter: &mut dyn Interpreter,
    name: &str,
    body: &str,
    low: f64,
    high: f64,
    tolerance: f64,
) -> error::Result<f64> {
    let mut previous: Vec<f64> = Vec::with_capacity(MAX_ROMBERG_LEVELS);
    let width = high - low;

    let f_low = evaluate_selected(interpreter, name, body, low)?;
    let f_high = evaluate_selected(interpreter, name, body, high)?;

    previous.push(0.5 * width * (f_low + f_high));

    for level in 1..MAX_ROMBERG_LEVELS {
        let steps = 1usize << (level - 1);
        let step = width / (steps as f64);
        let mut sum = 0.0;

        for index in 0..steps {
            sum += evaluate_selected(interpreter, name, body, low + (index as f64 + 0.5) * step)?;
        }

        let mut current = Vec::with_capacity(level + 1);
        current.push(0.5 * previous[0] + 0.5 * step * sum);

        for order in 1..=level {
            let factor = 4f64.powi(order as i32);
            let refined =
                (factor * current[order - 1] - previous[order - 1]) / (factor - 1.0);

            current.push(refined);
        }

        let estimate = current[level];
        let last = previous[level - 1];

        if (estimate - last).abs() <= tolerance * estimate.abs().max(1.0) {
            return Ok(estimate);
        }

        previous = current;
    }

    Ok(previous[previous.len() - 1])
}

/// Integrate the selected user word between two limits.
///
/// Signature: `low high -- area`
fn word_integrate(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.stack().require(2)?;

    let high = interpreter.pop_as_real()?;
    let low = interpreter.pop_as_real()?;
    let (name, body) = selected_word(interpreter)?;
    let tolerance = interpreter.config().integration_tolerance;

    let area = romberg(interpreter, &name, &body, low, high, tolerance)?;

    interpreter.push(Value::Real(area))
}

/// Find a root of the selected user word by bisection.  The function must change sign over the
/// interval.
///
/// Signature: `low high -- root`
fn word_find_zero(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.stack().require(2)?;

    let mut high = interpreter.pop_as_real()?;
    let mut low = interpreter.pop_as_real()?;
    let (name, body) = selected_word(interpreter)?;
    let tolerance = interpreter.config().root_tolerance;

    let mut f_low = evaluate_selected(interpreter, &name, &body, low)?;
    let f_high = evaluate_selected(interpreter, &name, &body, high)?;

    if f_low == 0.0 {
        return interpreter.push(Value::Real(low));
    }

    if f_high == 0.0 {
        return interpreter.push(Value::Real(high));
    }

    if f_low.signum() == f_high.signum() {
        return script_error(
            interpreter,
            ErrorKind::InvalidArgument,
            format!("Word {} doesn't change sign between {} and {}.", name, low, high),
        );
    }

    for _ in 0..MAX_BISECTIONS {
        if (high - low).abs() < tolerance {
            break;
        }

        let middle = 0.5 * (low + high);
        let f_middle = evaluate_selected(interpreter, &name, &body, middle)?;

        if f_middle == 0.0 {
            low = middle;
            high = middle;
            break;
        }

        if f_middle.signum() == f_low.signum() {
            low = middle;
            f_low = f_middle;
        } else {
            high = middle;
        }
    }

    interpreter.push(Value::Real(0.5 * (low + high)))
}

fn pop_tolerance(interpreter: &mut dyn Interpreter) -> error::Result<f64> {
    let tolerance = interpreter.pop_as_real()?;

    if !tolerance_in_range(tolerance) {
        return script_error(
            interpreter,
            ErrorKind::InvalidArgument,
            format!("Tolerance {} is out of range.", tolerance),
        );
    }

    Ok(tolerance)
}

/// Set the relative tolerance used by `integrate`.
///
/// Signature: `tolerance -- `
fn word_set_integration_tolerance(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let tolerance = pop_tolerance(interpreter)?;

    interpreter.config_mut().integration_tolerance = tolerance;
    Ok(())
}

/// Set the bracket width at which `fzero` stops.
///
/// Signature: `tolerance -- `
fn word_set_root_tolerance(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let tolerance = pop_tolerance(interpreter)?;

    interpreter.config_mut().root_tolerance = tolerance;
    Ok(())
}

/// Register the polynomial, integration and root finding words.
pub fn register_calculus_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(
        interpreter,
        "pval",
        word_polynomial_value,
        "Evaluate a polynomial, coefficients highest power first.",
        "coefficients x -- p(x)"
    );

    add_native_word!(
        interpreter,
        "roots",
        word_roots,
        "Roots of a real polynomial as a complex row.",
        "coefficients -- roots"
    );

    add_native_word!(
        interpreter,
        "integrate",
        word_integrate,
        "Integrate the selected word.",
        "low high -- area"
    );

    add_native_word!(
        interpreter,
        "fzero",
        word_find_zero,
        "Find a root of the selected word by bisection.",
        "low high -- root"
    );

    add_native_word!(
        interpreter,
        "set_intg_tol",
        word_set_integration_tolerance,
        "Set the integration tolerance.",
        "tolerance -- "
    );

    add_native_word!(
        interpreter,
        "set_f0_tol",
        word_set_root_tolerance,
        "Set the root finding tolerance.",
        "tolerance -- "
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn horner_evaluates_highest_power_first() {
        let coefficients = [1.0, -3.0, 2.0].map(|c| Complex::new(c, 0.0));

        assert_eq!(horner(&coefficients, Complex::new(3.0, 0.0)), Complex::new(2.0, 0.0));
    }

    #[test]
    fn quadratic_roots() {
        let mut roots = polynomial_roots(&[1.0, -3.0, 2.0]).unwrap();
        roots.sort_by(|a, b| a.re.total_cmp(&b.re));

        assert!((roots[0].re - 1.0).abs() < 1e-9);
        assert!((roots[1].re - 2.0).abs() < 1e-9);
    }

    #[test]
    fn constant_polynomial_has_no_roots() {
        assert!(polynomial_roots(&[0.0, 5.0]).is_none());
    }
}
