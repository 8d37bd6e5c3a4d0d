use crate::{
    add_native_word,
    runtime::{
        data_structures::{
            config::{Config, MAX_PRINT_PRECISION},
            value::{ComplexMatrix, RealMatrix, Value},
            value_stack::ValueStack,
        },
        error::{self, script_error, ErrorKind},
        interpreter::Interpreter,
    },
};
use nalgebra::Complex;

fn trim_fraction(text: &str) -> String {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text.to_string()
    }
}

/// Format a real the way C's `%.*g` does, `precision` significant digits with trailing zeros
/// removed, switching to exponent form for very large or very small magnitudes.
pub fn format_general(value: f64, precision: usize) -> String {
    if !value.is_finite() || value == 0.0 {
        return format!("{}", value);
    }

    let precision = precision.max(1);
    let exponent = value.abs().log10().floor() as i32;

    if exponent < -4 || exponent >= precision as i32 {
        let text = format!("{:.*e}", precision - 1, value);

        match text.split_once('e') {
            Some((mantissa, power)) => format!("{}e{}", trim_fraction(mantissa), power),
            None => text,
        }
    } else {
        let decimals = (precision as i32 - 1 - exponent).max(0) as usize;
        trim_fraction(&format!("{:.*}", decimals, value))
    }
}

/// Format a real per the display settings.
pub fn format_real(value: f64, config: &Config) -> String {
    if config.fixed_point {
        format!("{:.*}", config.print_precision, value)
    } else {
        format_general(value, config.print_precision)
    }
}

/// Format a single stack slot, `[index] kind : value`.
pub fn format_slot(index: usize, value: &Value, config: &Config) -> String {
    match value {
        Value::Real(number) => format!("[{}] ℝ : {}", index, format_real(*number, config)),

        Value::Complex(number) => format!(
            "[{}] ℂ : ({}, {}i)",
            index,
            format_real(number.re, config),
            format_real(number.im, config)
        ),

        Value::String(text) => format!("[{}] 𝒮 : {}", index, Value::stringify(text)),

        Value::MatrixReal(matrix) => format!(
            "[{}] Mℝ: {} x {} matrix",
            index,
            matrix.nrows(),
            matrix.ncols()
        ),

        Value::MatrixComplex(matrix) => format!(
            "[{}] Mℂ: {} x {} matrix",
            index,
            matrix.nrows(),
            matrix.ncols()
        ),
    }
}

/// Format the whole stack, bottom first, one slot per line.  An empty stack is shown as `{}`.
pub fn format_stack(stack: &ValueStack, config: &Config) -> String {
    if stack.is_empty() {
        return "{}".to_string();
    }

    stack
        .iter()
        .enumerate()
        .map(|(index, value)| format_slot(index, value, config))
        .collect::<Vec<_>>()
        .join("\n")
}

fn needs_exponent(value: f64) -> bool {
    value.abs() > 1e5 || (value != 0.0 && value.abs() < 1e-4)
}

fn format_entry(value: f64) -> String {
    if needs_exponent(value) {
        format!("{:.4e}", value)
    } else {
        format!("{:.4}", value)
    }
}

fn format_complex_entry(value: &Complex<f64>) -> String {
    if needs_exponent(value.re) || needs_exponent(value.im) {
        format!("({:.4e},{:.4e})", value.re, value.im)
    } else {
        format!("({:.4},{:.4})", value.re, value.im)
    }
}

fn format_grid(rows: usize, cols: usize, entry: impl Fn(usize, usize) -> String) -> String {
    let cells: Vec<Vec<String>> = (0..rows)
        .map(|row| (0..cols).map(|col| entry(row, col)).collect())
        .collect();

    let widths: Vec<usize> = (0..cols)
        .map(|col| cells.iter().map(|row| row[col].len()).max().unwrap_or(0))
        .collect();

    let mut text = String::new();

    for row in cells.iter() {
        text.push_str("| ");

        for (col, cell) in row.iter().enumerate() {
            text.push_str(&format!("{:>width$} ", cell, width = widths[col]));
        }

        text.push_str("|\n");
    }

    text
}

/// Render a real matrix as aligned rows.
pub fn format_real_matrix(matrix: &RealMatrix) -> String {
    format_grid(matrix.nrows(), matrix.ncols(), |row, col| {
        format_entry(matrix[(row, col)])
    })
}

/// Render a complex matrix as aligned rows of `(re,im)` pairs.
pub fn format_complex_matrix(matrix: &ComplexMatrix) -> String {
    format_grid(matrix.nrows(), matrix.ncols(), |row, col| {
        format_complex_entry(&matrix[(row, col)])
    })
}

/// Print the matrix on top of the stack.  The stack itself isn't printed after this line.
///
/// Signature: `M -- M`
fn word_print_matrix(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let text = match interpreter.peek()? {
        Value::MatrixReal(matrix) => format_real_matrix(matrix),
        Value::MatrixComplex(matrix) => format_complex_matrix(matrix),
        other => {
            let message = format!("pm needs a matrix, found a {}.", other.type_name());
            return script_error(interpreter, ErrorKind::TypeMismatch, message);
        }
    };

    print!("{}", text);
    interpreter.suppress_stack_print();

    Ok(())
}

/// Print the stack.
///
/// Signature: ` -- `
fn word_print_stack(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    println!("{}", format_stack(interpreter.stack(), interpreter.config()));
    Ok(())
}

/// Print the top value, a matrix in full.
///
/// Signature: `value -- value`
fn word_print(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let text = match interpreter.peek()? {
        Value::MatrixReal(matrix) => format_real_matrix(matrix),
        Value::MatrixComplex(matrix) => format_complex_matrix(matrix),
        value => format!("{}\n", format_slot(interpreter.stack().len() - 1, value, interpreter.config())),
    };

    print!("{}", text);
    Ok(())
}

/// Set how many digits are printed.
///
/// Signature: `digits -- `
fn word_set_precision(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let digits = interpreter.pop_as_index()?;

    if digits > MAX_PRINT_PRECISION {
        return script_error(
            interpreter,
            ErrorKind::InvalidArgument,
            format!("Precision {} is more than {}.", digits, MAX_PRINT_PRECISION),
        );
    }

    interpreter.config_mut().print_precision = digits;
    Ok(())
}

/// Toggle between fixed point and general display.
///
/// Signature: ` -- `
fn word_switch_fixed_scientific(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let config = interpreter.config_mut();

    config.fixed_point = !config.fixed_point;
    Ok(())
}

/// List every built-in function with its signature and description.
///
/// Signature: ` -- `
fn word_list_functions(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    print!("{}", interpreter.dictionary());
    Ok(())
}

/// Put the stack back the way it was before the last line of input.
///
/// Signature: ` -- `
fn word_undo(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.undo();
    Ok(())
}

/// Register the printing and display setting words.
pub fn register_display_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(
        interpreter,
        "pm",
        word_print_matrix,
        "Print the matrix on top of the stack.",
        "M -- M"
    );

    add_native_word!(
        interpreter,
        "ps",
        word_print_stack,
        "Print the stack.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "print",
        word_print,
        "Print the top value.",
        "value -- value"
    );

    add_native_word!(
        interpreter,
        "setprec",
        word_set_precision,
        "Set the number of printed digits.",
        "digits -- "
    );

    add_native_word!(
        interpreter,
        "sfs",
        word_switch_fixed_scientific,
        "Toggle fixed point and general display.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "listfcns",
        word_list_functions,
        "List the built-in functions.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "undo",
        word_undo,
        "Restore the stack from before the last line.",
        " -- "
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn general_format_trims_and_switches_to_exponent() {
        assert_eq!(format_general(0.5, 6), "0.5");
        assert_eq!(format_general(1234567.0, 6), "1.23457e6");
        assert_eq!(format_general(0.00001, 6), "1e-5");
        assert_eq!(format_general(100.0, 6), "100");
    }

    #[test]
    fn stack_lines_follow_display_settings() {
        let mut stack = ValueStack::new();
        let config = Config::default();

        assert_eq!(format_stack(&stack, &config), "{}");

        stack.push(Value::Real(2.5)).unwrap();
        stack.push(Value::Complex(Complex::new(1.0, -1.0))).unwrap();

        assert_eq!(
            format_stack(&stack, &config),
            "[0] ℝ : 2.500000\n[1] ℂ : (1.000000, -1.000000i)"
        );
    }
}
