use crate::runtime::{
    data_structures::value::{matrix_entry_count, ComplexMatrix, RealMatrix, Value},
    error::{self, ErrorKind, ScriptError},
};
use nalgebra::Complex;
use std::{
    fmt::{self, Display, Formatter},
    fs::{read_to_string, write},
};

/// How many storage registers are available.
pub const REGISTER_COUNT: usize = 64;

/// The calculator's numbered storage registers.  Each register is either empty or owns a copy of a
/// value.  Storing and recalling always copy, so a register never shares data with the stack.
#[derive(Clone, Debug, PartialEq)]
pub struct Registers {
    slots: Vec<Option<Value>>,
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

/// Occupancy grid, eight registers to a line.
impl Display for Registers {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        writeln!(f, "Register status ({} total):", REGISTER_COUNT)?;

        for (index, slot) in self.slots.iter().enumerate() {
            write!(f, "[{}]", if slot.is_some() { 'x' } else { ' ' })?;

            if (index + 1) % 8 == 0 {
                writeln!(f, " -> R[{:2}-{:2}]", index - 7, index)?;
            }
        }

        Ok(())
    }
}

impl Registers {
    pub fn new() -> Registers {
        Registers {
            slots: vec![None; REGISTER_COUNT],
        }
    }

    fn check_index(index: usize) -> error::Result<()> {
        if index >= REGISTER_COUNT {
            return ScriptError::bare(
                ErrorKind::InvalidArgument,
                &format!("Invalid register index: {}.", index),
            );
        }

        Ok(())
    }

    /// Store a value, replacing whatever the register held.
    pub fn store(&mut self, index: usize, value: Value) -> error::Result<()> {
        Registers::check_index(index)?;
        self.slots[index] = Some(value);

        Ok(())
    }

    /// Get a copy of a register's value.
    pub fn recall(&self, index: usize) -> error::Result<Value> {
        Registers::check_index(index)?;

        match &self.slots[index] {
            Some(value) => Ok(value.clone()),
            None => ScriptError::bare(
                ErrorKind::InvalidArgument,
                &format!("Register {} is empty.", index),
            ),
        }
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.slots.get(index).and_then(|slot| slot.as_ref())
    }

    /// The lowest numbered empty register, if there is one.
    pub fn first_free(&self) -> Option<usize> {
        self.slots.iter().position(|slot| slot.is_none())
    }

    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
    }

    /// Render the occupied registers in the register file format, one `REG` record per line.
    pub fn to_text(&self) -> String {
        let mut text = String::new();

        for (index, slot) in self.slots.iter().enumerate() {
            if let Some(value) = slot {
                text.push_str(&format!("REG {} {}\n", index, record_payload(value)));
            }
        }

        text
    }

    /// Read registers from the register file format.  Records that can't be parsed, or that name
    /// an out of range register, are skipped.
    pub fn parse(text: &str) -> Registers {
        let mut registers = Registers::new();

        for line in text.lines() {
            if let Some((index, value)) = parse_record(line)
                && index < REGISTER_COUNT
            {
                registers.slots[index] = Some(value);
            }
        }

        registers
    }

    pub fn save_to_file(&self, path: &str) -> error::Result<()> {
        write(path, self.to_text())?;
        Ok(())
    }

    /// Replace every register with the contents of the file.
    pub fn load_from_file(&mut self, path: &str) -> error::Result<()> {
        let text = read_to_string(path).map_err(|error| {
            ScriptError::new(
                ErrorKind::Io,
                None,
                format!("Could not read registers from {}: {}", path, error),
                None,
            )
        })?;

        *self = Registers::parse(&text);
        Ok(())
    }
}

fn format_complex(value: &Complex<f64>) -> String {
    format!("({},{})", value.re, value.im)
}

fn record_payload(value: &Value) -> String {
    match value {
        Value::Real(value) => format!("REAL {}", value),
        Value::Complex(value) => format!("COMPLEX {}", format_complex(value)),
        Value::String(value) => format!("STRING \"{}\"", value),

        Value::MatrixReal(matrix) => {
            let mut text = format!("MATRIX_REAL {} {}", matrix.nrows(), matrix.ncols());

            for row in 0..matrix.nrows() {
                for col in 0..matrix.ncols() {
                    text.push_str(&format!(" {}", matrix[(row, col)]));
                }
            }

            text
        }

        Value::MatrixComplex(matrix) => {
            let mut text = format!("MATRIX_COMPLEX {} {}", matrix.nrows(), matrix.ncols());

            for row in 0..matrix.nrows() {
                for col in 0..matrix.ncols() {
                    text.push(' ');
                    text.push_str(&format_complex(&matrix[(row, col)]));
                }
            }

            text
        }
    }
}

fn parse_complex(text: &str) -> Option<Complex<f64>> {
    let inner = text.trim().strip_prefix('(')?.strip_suffix(')')?;
    let (re, im) = inner.split_once(',')?;

    Some(Complex::new(re.trim().parse().ok()?, im.trim().parse().ok()?))
}

fn parse_shape<'a>(parts: &mut impl Iterator<Item = &'a str>) -> Option<(usize, usize)> {
    let rows = parts.next()?.parse().ok()?;
    let cols = parts.next()?.parse().ok()?;
    matrix_entry_count(rows, cols)?;

    Some((rows, cols))
}

fn parse_record(line: &str) -> Option<(usize, Value)> {
    let rest = line.trim().strip_prefix("REG ")?;
    let (index, rest) = rest.trim_start().split_once(' ')?;
    let index: usize = index.parse().ok()?;
    let (kind, payload) = rest.trim_start().split_once(' ').unwrap_or((rest.trim(), ""));

    let value = match kind {
        "REAL" => Value::Real(payload.trim().parse().ok()?),

        "COMPLEX" => Value::Complex(parse_complex(payload)?),

        "STRING" => {
            let text = payload.trim();
            let text = text.strip_prefix('"').unwrap_or(text);
            let text = text.strip_suffix('"').unwrap_or(text);

            Value::String(text.to_string())
        }

        "MATRIX_REAL" => {
            let mut parts = payload.split_whitespace();
            let (rows, cols) = parse_shape(&mut parts)?;
            let entries: Vec<f64> = parts.map(|part| part.parse().ok()).collect::<Option<_>>()?;

            if entries.len() != rows * cols {
                return None;
            }

            Value::MatrixReal(RealMatrix::from_row_slice(rows, cols, &entries))
        }

        "MATRIX_COMPLEX" => {
            let mut parts = payload.split_whitespace();
            let (rows, cols) = parse_shape(&mut parts)?;
            let entries: Vec<Complex<f64>> = parts.map(parse_complex).collect::<Option<_>>()?;

            if entries.len() != rows * cols {
                return None;
            }

            Value::MatrixComplex(ComplexMatrix::from_row_slice(rows, cols, &entries))
        }

        _ => return None,
    };

    Some((index, value))
}
