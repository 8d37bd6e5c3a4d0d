use crate::lang::source_buffer::{SourceBuffer, SourceLocation};
use lazy_static::lazy_static;
use nalgebra::Complex;
use std::{
    collections::HashSet,
    fmt::{self, Debug, Display, Formatter},
};

lazy_static! {
    /// The fixed set of built-in names.  An alphanumeric run that matches one of these becomes a
    /// function token, anything else is an identifier that is looked up in the macro and word
    /// tables.
    pub static ref FUNCTION_NAMES: HashSet<&'static str> = [
        // Evaluation of strings, batch files and programs.
        "eval", "batch", "run",
        // Constants.
        "gravity", "pi", "e", "inf", "nan",
        // Display.
        "pm", "ps", "print", "setprec", "sfs", "listfcns", "undo",
        // Dates.
        "ddays", "today", "dateplus", "dow", "edmy",
        // Stack.
        "drop", "clst", "swap", "dup", "nip", "tuck", "roll", "over",
        "pow",
        // Polynomials and calculus.
        "pval", "roots", "integrate", "fzero", "set_intg_tol", "set_f0_tol",
        // Comparison and logic.
        "eq", "neq", "lt", "leq", "gt", "geq", "and", "or", "not",
        "frac", "intg",
        // Registers.
        "ffr", "rcl", "sto", "pr", "saveregs", "loadregs", "clregs",
        // Strings.
        "scon", "s2l", "s2u", "slen", "srev", "int2str",
        // User words and macros.
        "listmacros", "listwords", "loadwords", "savewords", "clrwords", "selword", "delword",
        // Matrices.
        "minv", "pinv", "det", "eig", "tran", "'", "reshape", "get_aij", "set_aij", "kron",
        "diag", "to_diag", "chol", "svd", "dim", "eye", "ones", "rrange", "zeroes", "rand",
        "randn", "join_v", "join_h", "cumsum_r", "cumsum_c", "split_mat",
        // Unary math.
        "sin", "cos", "tan", "asin", "acos", "atan", "sinh", "cosh", "tanh", "asinh", "acosh",
        "atanh", "exp", "chs", "inv",
        // Complex parts, logs and roots.
        "split_c", "abs", "re", "im", "arg", "conj", "re2c", "j2r", "ln", "log", "sqrt",
        // Normal distribution and special functions.
        "npdf", "ncdf", "nquant", "gamma", "ln_gamma", "beta", "ln_beta",
        // Reductions.
        "cmean", "rmean", "csum", "rsum", "cvar", "rvar", "cmin", "rmin", "cmax", "rmax",
        // Program counters.
        "set_ctr", "clr_ctr", "ctr_inc", "ctr_dec",
    ]
    .into_iter()
    .collect();
}

/// Is the name one of the fixed built-in function names?
pub fn is_function_name(name: &str) -> bool {
    FUNCTION_NAMES.contains(name)
}

/// The punctuation tokens of the language.  The first eight are the arithmetic operators, the rest
/// only have meaning inside a word definition.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Operator {
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    DotStar,
    DotSlash,
    DotCaret,
    Less,
    Greater,
    Bar,
    Colon,
    Semicolon,
}

impl Operator {
    /// The operator as it is written in the source text.
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Plus => "+",
            Operator::Minus => "-",
            Operator::Star => "*",
            Operator::Slash => "/",
            Operator::Caret => "^",
            Operator::DotStar => ".*",
            Operator::DotSlash => "./",
            Operator::DotCaret => ".^",
            Operator::Less => "<",
            Operator::Greater => ">",
            Operator::Bar => "|",
            Operator::Colon => ":",
            Operator::Semicolon => ";",
        }
    }

    /// Does the operator combine the top two values of the stack?
    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            Operator::Plus
                | Operator::Minus
                | Operator::Star
                | Operator::Slash
                | Operator::Caret
                | Operator::DotStar
                | Operator::DotSlash
                | Operator::DotCaret
        )
    }

    fn from_char(next: char) -> Option<Operator> {
        match next {
            '+' => Some(Operator::Plus),
            '-' => Some(Operator::Minus),
            '*' => Some(Operator::Star),
            '/' => Some(Operator::Slash),
            '^' => Some(Operator::Caret),
            '<' => Some(Operator::Less),
            '>' => Some(Operator::Greater),
            '|' => Some(Operator::Bar),
            ':' => Some(Operator::Colon),
            ';' => Some(Operator::Semicolon),
            _ => None,
        }
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// What kinds of entries an inline matrix literal holds.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum MatrixKind {
    /// Only plain numbers.
    Real,

    /// Only parenthesised complex numbers.
    Complex,

    /// A mix of both, the matrix is built as a complex one.
    Mixed,
}

/// An inline matrix literal, `[rows cols $ entries...]`.  The entries are kept in row-major order.
#[derive(Clone, PartialEq, Debug)]
pub struct MatrixLiteral {
    pub kind: MatrixKind,
    pub rows: usize,
    pub cols: usize,
    pub entries: Vec<Complex<f64>>,

    /// The literal as it appeared in the source.
    pub text: String,
}

/// A token is a single unit of calculator input.  Every token also holds the location in the
/// original source text where it was found.
#[derive(Clone, PartialEq)]
pub enum Token {
    /// A real number.
    Number(SourceLocation, f64),

    /// A parenthesised complex number, `(re,im)`.
    Complex(SourceLocation, Complex<f64>),

    /// A double quoted string.
    String(SourceLocation, String),

    /// A reference to a real matrix stored in a text file, `[rows,cols,"file"]`.
    MatrixFileRef(SourceLocation, usize, usize, String),

    /// An inline matrix.
    MatrixLiteral(SourceLocation, MatrixLiteral),

    /// One of the punctuation operators.
    Operator(SourceLocation, Operator),

    /// A name that isn't a built-in, to be looked up as a macro or a word.
    Identifier(SourceLocation, String),

    /// One of the fixed built-in names.
    Function(SourceLocation, String),

    /// The input has been used up.
    Eof(SourceLocation),

    /// A character that couldn't start any other token.
    Unknown(SourceLocation, char),
}

/// A list of tokens found in the source text.
pub type TokenList = Vec<Token>;

impl Display for Token {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Token::Number(_, number) => write!(f, "{}", number),
            Token::Complex(_, number) => write!(f, "({},{})", number.re, number.im),
            Token::String(_, text) => write!(f, "\"{}\"", text),
            Token::MatrixFileRef(_, rows, cols, file) => {
                write!(f, "[{},{},\"{}\"]", rows, cols, file)
            }
            Token::MatrixLiteral(_, literal) => write!(f, "{}", literal.text),
            Token::Operator(_, operator) => write!(f, "{}", operator),
            Token::Identifier(_, name) => write!(f, "{}", name),
            Token::Function(_, name) => write!(f, "{}", name),
            Token::Eof(_) => write!(f, "<EOF>"),
            Token::Unknown(_, next) => write!(f, "{}", next),
        }
    }
}

impl Debug for Token {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let kind = match self {
            Token::Number(_, _) => "Number",
            Token::Complex(_, _) => "Complex",
            Token::String(_, _) => "String",
            Token::MatrixFileRef(_, _, _, _) => "MatrixFileRef",
            Token::MatrixLiteral(_, _) => "MatrixLiteral",
            Token::Operator(_, _) => "Operator",
            Token::Identifier(_, _) => "Identifier",
            Token::Function(_, _) => "Function",
            Token::Eof(_) => "Eof",
            Token::Unknown(_, _) => "Unknown",
        };

        write!(f, "{}: {}({})", self.location(), kind, self)
    }
}

impl Token {
    /// Get the token's location in the original source text.
    pub fn location(&self) -> &SourceLocation {
        match self {
            Token::Number(location, _) => location,
            Token::Complex(location, _) => location,
            Token::String(location, _) => location,
            Token::MatrixFileRef(location, _, _, _) => location,
            Token::MatrixLiteral(location, _) => location,
            Token::Operator(location, _) => location,
            Token::Identifier(location, _) => location,
            Token::Function(location, _) => location,
            Token::Eof(location) => location,
            Token::Unknown(location, _) => location,
        }
    }

    /// Check if the token marks the end of the input.
    pub fn is_eof(&self) -> bool {
        matches!(self, Token::Eof(_))
    }
}

/// Does a number start at the cursor?  Either a digit or a minus sign directly followed by one.
fn number_starts(buffer: &SourceBuffer) -> bool {
    match buffer.peek_next() {
        Some(next) if next.is_ascii_digit() => true,
        Some('-') => matches!(buffer.peek_at(1), Some(next) if next.is_ascii_digit()),
        _ => false,
    }
}

/// Consume a run of ascii digits.
fn skip_digits(buffer: &mut SourceBuffer) {
    while let Some(next) = buffer.peek_next()
        && next.is_ascii_digit()
    {
        let _ = buffer.next_char();
    }
}

/// Scan a number: an optional minus, digits, an optional fraction and an optional exponent.  The
/// exponent is only taken when digits follow the `e`.
fn process_number(buffer: &mut SourceBuffer) -> Option<f64> {
    if !number_starts(buffer) {
        return None;
    }

    let start = buffer.mark();

    let _ = buffer.next_if('-');
    skip_digits(buffer);

    if buffer.next_if('.') {
        skip_digits(buffer);
    }

    if let Some('e' | 'E') = buffer.peek_next() {
        let has_exponent = match buffer.peek_at(1) {
            Some(next) if next.is_ascii_digit() => true,
            Some('+' | '-') => matches!(buffer.peek_at(2), Some(next) if next.is_ascii_digit()),
            _ => false,
        };

        if has_exponent {
            let _ = buffer.next_char();

            if !buffer.next_if('+') {
                let _ = buffer.next_if('-');
            }

            skip_digits(buffer);
        }
    }

    buffer.text_since(&start).parse().ok()
}

/// Scan a non-negative whole number used as a matrix dimension.
fn process_dimension(buffer: &mut SourceBuffer) -> Option<usize> {
    let number = process_number(buffer)?;

    if number < 0.0 || number.fract() != 0.0 || number > u32::MAX as f64 {
        return None;
    }

    Some(number as usize)
}

/// Scan `(re,im)`, the opening parenthesis included.  On failure the cursor position is left
/// wherever scanning stopped, the caller rewinds.
fn process_complex(buffer: &mut SourceBuffer) -> Option<Complex<f64>> {
    if !buffer.next_if('(') {
        return None;
    }

    buffer.skip_whitespace();
    let re = process_number(buffer)?;
    buffer.skip_whitespace();

    if !buffer.next_if(',') {
        return None;
    }

    buffer.skip_whitespace();
    let im = process_number(buffer)?;
    buffer.skip_whitespace();

    if !buffer.next_if(')') {
        return None;
    }

    Some(Complex::new(re, im))
}

/// Scan a string literal.  A missing closing quote simply ends the string at the end of input.
fn process_string(buffer: &mut SourceBuffer) -> String {
    let _ = buffer.next_char();
    let mut text = String::new();

    while let Some(next) = buffer.next_char() {
        if next == '"' {
            break;
        }

        text.push(next);
    }

    text
}

/// Look past the `[` without consuming anything to decide between a file reference and an inline
/// literal.  A comma after the first number means a file reference.
fn looks_like_file_ref(buffer: &SourceBuffer) -> bool {
    let rest = buffer.remaining();
    let rest = rest.strip_prefix('[').unwrap_or(rest).trim_start();

    if !rest.starts_with(|next: char| next.is_ascii_digit() || next == '-') {
        return false;
    }

    let after_number = rest.trim_start_matches(|next: char| {
        next.is_ascii_digit() || matches!(next, '.' | '-' | '+' | 'e' | 'E')
    });

    after_number.trim_start().starts_with(',')
}

/// Scan `[rows,cols,"file"]`.
fn process_matrix_file_ref(buffer: &mut SourceBuffer) -> Option<(usize, usize, String)> {
    let _ = buffer.next_char();
    buffer.skip_whitespace();

    let rows = process_dimension(buffer)?;
    buffer.skip_whitespace();

    if !buffer.next_if(',') {
        return None;
    }

    buffer.skip_whitespace();
    let cols = process_dimension(buffer)?;
    buffer.skip_whitespace();

    if !buffer.next_if(',') {
        return None;
    }

    buffer.skip_whitespace();

    if buffer.peek_next() != Some('"') {
        return None;
    }

    let file = process_string(buffer);
    buffer.skip_whitespace();

    if !buffer.next_if(']') {
        return None;
    }

    Some((rows, cols, file))
}

/// Scan `[rows cols $ entries...]` where each entry is a number or a complex number.
fn process_matrix_literal(buffer: &mut SourceBuffer) -> Option<MatrixLiteral> {
    let start = buffer.mark();

    let _ = buffer.next_char();
    buffer.skip_whitespace();

    let rows = process_dimension(buffer)?;
    buffer.skip_whitespace();
    let cols = process_dimension(buffer)?;
    buffer.skip_whitespace();

    if !buffer.next_if('$') {
        return None;
    }

    let mut entries = Vec::new();
    let mut has_real = false;
    let mut has_complex = false;

    loop {
        buffer.skip_whitespace();

        match buffer.peek_next() {
            Some(']') => {
                let _ = buffer.next_char();
                break;
            }

            Some('(') => {
                entries.push(process_complex(buffer)?);
                has_complex = true;
            }

            _ if number_starts(buffer) => {
                entries.push(Complex::new(process_number(buffer)?, 0.0));
                has_real = true;
            }

            _ => return None,
        }
    }

    if entries.len() != rows * cols {
        return None;
    }

    let kind = match (has_real, has_complex) {
        (true, true) => MatrixKind::Mixed,
        (false, true) => MatrixKind::Complex,
        _ => MatrixKind::Real,
    };

    Some(MatrixLiteral {
        kind,
        rows,
        cols,
        entries,
        text: buffer.text_since(&start).to_string(),
    })
}

/// A lazy, cursor based tokenizer over a single piece of source text.  Tokens are produced one at
/// a time on request and the stream can't be restarted.  Once the text is used up every further
/// request returns `Token::Eof`.
pub struct Tokenizer<'a> {
    buffer: SourceBuffer<'a>,
}

impl<'a> Tokenizer<'a> {
    /// Create a tokenizer over the text.  The path is used to tag token locations, for example
    /// "\<repl\>" for interactive input.
    pub fn new(path: &str, source: &'a str) -> Self {
        Tokenizer {
            buffer: SourceBuffer::new(path, source),
        }
    }

    /// Produce the next token from the text.
    pub fn next_token(&mut self) -> Token {
        self.buffer.skip_whitespace();

        let location = self.buffer.location().clone();

        let next = match self.buffer.peek_next() {
            Some(next) => next,
            None => return Token::Eof(location),
        };

        if number_starts(&self.buffer) {
            if let Some(number) = process_number(&mut self.buffer) {
                return Token::Number(location, number);
            }
        }

        match next {
            '(' => {
                let start = self.buffer.mark();

                if let Some(number) = process_complex(&mut self.buffer) {
                    return Token::Complex(location, number);
                }

                self.buffer.rewind(start);
                let _ = self.buffer.next_char();

                Token::Unknown(location, '(')
            }

            '[' => {
                let start = self.buffer.mark();

                if looks_like_file_ref(&self.buffer) {
                    if let Some((rows, cols, file)) = process_matrix_file_ref(&mut self.buffer) {
                        return Token::MatrixFileRef(location, rows, cols, file);
                    }
                } else if let Some(literal) = process_matrix_literal(&mut self.buffer) {
                    return Token::MatrixLiteral(location, literal);
                }

                self.buffer.rewind(start);
                let _ = self.buffer.next_char();

                Token::Unknown(location, '[')
            }

            _ if next.is_ascii_alphabetic() || next == '_' => {
                let start = self.buffer.mark();

                while let Some(next) = self.buffer.peek_next()
                    && (next.is_ascii_alphanumeric() || next == '_')
                {
                    let _ = self.buffer.next_char();
                }

                let name = self.buffer.text_since(&start).to_string();

                if is_function_name(&name) {
                    Token::Function(location, name)
                } else {
                    Token::Identifier(location, name)
                }
            }

            '"' => Token::String(location, process_string(&mut self.buffer)),

            '.' if matches!(self.buffer.peek_at(1), Some('*' | '/' | '^')) => {
                let _ = self.buffer.next_char();

                let operator = match self.buffer.next_char() {
                    Some('*') => Operator::DotStar,
                    Some('/') => Operator::DotSlash,
                    _ => Operator::DotCaret,
                };

                Token::Operator(location, operator)
            }

            '\'' => {
                let _ = self.buffer.next_char();
                Token::Function(location, "'".to_string())
            }

            _ => {
                let _ = self.buffer.next_char();

                match Operator::from_char(next) {
                    Some(operator) => Token::Operator(location, operator),
                    None => Token::Unknown(location, next),
                }
            }
        }
    }
}

/// Iterate over the tokens up to, but not including, the end of input.
impl Iterator for Tokenizer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        match self.next_token() {
            Token::Eof(_) => None,
            token => Some(token),
        }
    }
}

/// Tokenize a whole piece of source text at once.
pub fn tokenize_from_source(path: &str, source: &str) -> TokenList {
    Tokenizer::new(path, source).collect()
}
