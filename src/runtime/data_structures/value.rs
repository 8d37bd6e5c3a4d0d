use std::fmt::{ self,
                 Display,
                 Formatter };
use nalgebra::{ Complex,
                DMatrix };
use crate::{ lang::tokenizing::{ MatrixKind,
                                 MatrixLiteral },
             runtime::{ error::{ self,
                                 script_error,
                                 ErrorKind },
                        interpreter::Interpreter } };



/// A dynamically sized matrix of reals.
pub type RealMatrix = DMatrix<f64>;

/// A dynamically sized matrix of complex numbers.
pub type ComplexMatrix = DMatrix<Complex<f64>>;



/// Core value enumeration used by the calculator.  Every slot on the stack and in the registers
/// holds exactly one of these.
///
/// All payloads are owned by the value itself, so `clone()` is always a deep copy.  Two stack slots
/// never share a matrix or a string.
#[derive(Clone, PartialEq, Debug)]
pub enum Value
{
    /// A real scalar.
    Real(f64),

    /// A complex scalar.
    Complex(Complex<f64>),

    /// A string, used for file names, dates and labels.
    String(String),

    /// A matrix of reals.
    MatrixReal(RealMatrix),

    /// A matrix of complex numbers.
    MatrixComplex(ComplexMatrix)
}


/// Convert an arbitrary data type to a Value.
pub trait ToValue
{
    /// Implement to handle the actual conversion.
    fn to_value(&self) -> Value;
}


/// Convert a borrowed string into a Value.
impl ToValue for &str
{
    fn to_value(&self) -> Value
    {
        Value::String(self.to_string())
    }
}


/// Define implementations for converting between Values and the raw data types they represent.
macro_rules! value_conversion
{
    ($data_type:ty , $variant:ident , $as_ident:ident) =>
    {
        #[doc = concat!("Convert a value to ", stringify!($data_type), ".")]
        impl Value
        {
            pub fn $as_ident(&self, interpreter: &dyn Interpreter) -> error::Result<&$data_type>
            {
                match self
                {
                    Value::$variant(value) => Ok(value),
                    _ => script_error(interpreter,
                                      ErrorKind::TypeMismatch,
                                      format!("Expected a {}, found a {}.",
                                              stringify!($variant),
                                              self.type_name()))
                }
            }
        }


        #[doc = concat!("Allow conversion from ", stringify!($data_type), " to a Value.")]
        impl ToValue for $data_type
        {
            fn to_value(&self) -> Value
            {
                Value::$variant(self.clone())
            }
        }


        #[doc = concat!("Support converting from a ", stringify!($data_type), " to a Value.")]
        impl From<$data_type> for Value
        {
            fn from(original: $data_type) -> Value
            {
                Value::$variant(original)
            }
        }
    };
}


// Implement the simple conversions for the value enumeration types.
value_conversion!(f64,           Real,          as_real);
value_conversion!(Complex<f64>,  Complex,       as_complex);
value_conversion!(String,        String,        as_string);
value_conversion!(RealMatrix,    MatrixReal,    as_real_matrix);
value_conversion!(ComplexMatrix, MatrixComplex, as_complex_matrix);


/// Counts and indices are pushed as reals.
impl ToValue for usize
{
    fn to_value(&self) -> Value
    {
        Value::Real(*self as f64)
    }
}


/// Truth values are pushed as the reals 1 and 0.
impl ToValue for bool
{
    fn to_value(&self) -> Value
    {
        Value::Real(if *self { 1.0 } else { 0.0 })
    }
}


/// Build the matrix an inline literal describes.  Real literals give a real matrix, anything with a
/// complex entry gives a complex one.
impl From<&MatrixLiteral> for Value
{
    fn from(literal: &MatrixLiteral) -> Value
    {
        match literal.kind
        {
            MatrixKind::Real =>
                {
                    let entries: Vec<f64> = literal.entries.iter().map(|entry| entry.re).collect();
                    RealMatrix::from_row_slice(literal.rows, literal.cols, &entries).into()
                },

            MatrixKind::Complex | MatrixKind::Mixed =>
                {
                    ComplexMatrix::from_row_slice(literal.rows, literal.cols, &literal.entries)
                        .into()
                }
        }
    }
}


/// Handily implement variant checks for the types the Value enumeration supports.
macro_rules! is_variant
{
    ($name:ident , $either_name:ident , $variant:ident) =>
    {
        #[doc = concat!("Check if the value is the variant ", stringify!($variant), ".")]
        pub fn $name(&self) -> bool
        {
            matches!(self, Value::$variant(_))
        }

        #[doc = concat!("Check if either of the two values are the variant ",
                        stringify!($variant),
                        ".")]
        pub fn $either_name(a: &Value, b: &Value) -> bool
        {
            a.$name() || b.$name()
        }
    };
}


impl Value
{
    is_variant!(is_real,           either_is_real,           Real);
    is_variant!(is_complex,        either_is_complex,        Complex);
    is_variant!(is_string,         either_is_string,         String);
    is_variant!(is_real_matrix,    either_is_real_matrix,    MatrixReal);
    is_variant!(is_complex_matrix, either_is_complex_matrix, MatrixComplex);

    /// Is the value a real or complex scalar?
    pub fn is_scalar(&self) -> bool
    {
        self.is_real() || self.is_complex()
    }

    /// Is the value a real or complex matrix?
    pub fn is_matrix(&self) -> bool
    {
        self.is_real_matrix() || self.is_complex_matrix()
    }

    /// A short human readable name of the variant, used in error messages.
    pub fn type_name(&self) -> &'static str
    {
        match self
        {
            Value::Real(_)          => "real",
            Value::Complex(_)       => "complex",
            Value::String(_)        => "string",
            Value::MatrixReal(_)    => "real matrix",
            Value::MatrixComplex(_) => "complex matrix"
        }
    }

    /// The matrix shape as rows, columns.  Scalars and strings are reported as 1 x 1.
    pub fn shape(&self) -> ( usize, usize )
    {
        match self
        {
            Value::MatrixReal(matrix)    => matrix.shape(),
            Value::MatrixComplex(matrix) => matrix.shape(),
            _                            => ( 1, 1 )
        }
    }

    /// Widen a real scalar to a complex one, if the value is a scalar.
    pub fn as_complex_scalar(&self) -> Option<Complex<f64>>
    {
        match self
        {
            Value::Real(value)    => Some(Complex::new(*value, 0.0)),
            Value::Complex(value) => Some(*value),
            _                     => None
        }
    }

    /// Widen a real matrix to a complex one, if the value is a matrix.
    pub fn as_complex_matrix_widened(&self) -> Option<ComplexMatrix>
    {
        match self
        {
            Value::MatrixReal(matrix)    => Some(to_complex_matrix(matrix)),
            Value::MatrixComplex(matrix) => Some(matrix.clone()),
            _                            => None
        }
    }

    /// Convert a string to a string that could be used directly within source text.  The string is
    /// enclosed in double quotes.
    ///
    /// Mainly used for stack and register printing.
    pub fn stringify(text: &str) -> String
    {
        let mut result = String::with_capacity(text.len() + 2);

        result.push('"');
        result.push_str(text);
        result.push('"');

        result
    }
}


/// The most entries any one matrix may hold.
pub const MAX_MATRIX_ENTRIES: usize = 1 << 24;


/// The entry count of a `rows x cols` matrix, or `None` when it would overflow or exceed
/// `MAX_MATRIX_ENTRIES`.
pub fn matrix_entry_count(rows: usize, cols: usize) -> Option<usize>
{
    rows.checked_mul(cols).filter(|count| *count <= MAX_MATRIX_ENTRIES)
}


/// Promote a real matrix to a complex matrix with zero imaginary parts.
pub fn to_complex_matrix(matrix: &RealMatrix) -> ComplexMatrix
{
    matrix.map(|value| Complex::new(value, 0.0))
}


/// Plain formatting of a value.  The stack printer applies the configured precision instead.
impl Display for Value
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result
    {
        match self
        {
            Value::Real(value)           => write!(f, "{}", value),
            Value::Complex(value)        => write!(f, "({}, {}i)", value.re, value.im),
            Value::String(value)         => write!(f, "{}", Value::stringify(value)),
            Value::MatrixReal(matrix)    => write!(f, "{} x {} matrix", matrix.nrows(), matrix.ncols()),
            Value::MatrixComplex(matrix) => write!(f, "{} x {} complex matrix",
                                                   matrix.nrows(),
                                                   matrix.ncols())
        }
    }
}
