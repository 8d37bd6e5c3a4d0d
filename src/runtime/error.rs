use std::{ error::Error,
           process::Termination,
           fmt::{ self, Debug, Display, Formatter }, process::ExitCode };
use crate::{ runtime::interpreter::CallStack,
             lang::source_buffer::SourceLocation };

use super::interpreter::Interpreter;



pub type Result<T> = std::result::Result<T, ScriptError>;



/// The category of a calculator error.  Most kinds are recovered locally by reporting them and
/// moving on to the next token.  A few abort a larger unit of work, see `aborts_line` and
/// `aborts_program`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum ErrorKind
{
    /// An operation needed more values than the stack holds.
    StackUnderflow,

    /// A push would have taken the stack past its maximum depth.
    StackOverflow,

    /// The operands on the stack are of the wrong kind for the operation.
    TypeMismatch,

    /// Matrix operands have incompatible shapes.
    DimensionMismatch,

    /// An identifier was neither a macro nor a word.
    UnknownIdentifier,

    /// A program test line named a predicate that does not exist.
    UnknownPredicate,

    /// A program jumped to a label that was never defined.
    LabelNotFound,

    /// A program executed `RTN` without a matching `GOSUB`.
    CallStackUnderflow,

    /// Too many nested `GOSUB`s.
    CallStackOverflow,

    /// A numeric decomposition (inverse, Cholesky, eigen, ...) did not succeed.
    DecompositionFailed,

    /// An inline matrix or file matrix could not be turned into a value.
    MalformedLiteral,

    /// Word, macro, or script expansion nested deeper than the configured limit.
    RecursionLimit,

    /// A token was found where it has no meaning.
    UnexpectedToken,

    /// An argument was of the right kind but out of range.
    InvalidArgument,

    /// A file could not be read or written.
    Io,

    /// Text read from a file or the stack could not be parsed.
    Parse
}


impl ErrorKind
{
    /// Errors of this kind stop evaluation of the whole line they occur in, including every
    /// enclosing word expansion.
    pub fn aborts_line(&self) -> bool
    {
        matches!(self, ErrorKind::RecursionLimit)
    }

    /// Errors of this kind stop the current program run.
    pub fn aborts_program(&self) -> bool
    {
        matches!(self,
                 ErrorKind::LabelNotFound
                 | ErrorKind::CallStackUnderflow
                 | ErrorKind::CallStackOverflow
                 | ErrorKind::RecursionLimit)
    }
}


impl Display for ErrorKind
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result
    {
        let name = match self
            {
                ErrorKind::StackUnderflow      => "stack underflow",
                ErrorKind::StackOverflow       => "stack overflow",
                ErrorKind::TypeMismatch        => "type mismatch",
                ErrorKind::DimensionMismatch   => "dimension mismatch",
                ErrorKind::UnknownIdentifier   => "unknown identifier",
                ErrorKind::UnknownPredicate    => "unknown predicate",
                ErrorKind::LabelNotFound       => "label not found",
                ErrorKind::CallStackUnderflow  => "call stack underflow",
                ErrorKind::CallStackOverflow   => "call stack overflow",
                ErrorKind::DecompositionFailed => "decomposition failed",
                ErrorKind::MalformedLiteral    => "malformed literal",
                ErrorKind::RecursionLimit      => "recursion limit",
                ErrorKind::UnexpectedToken     => "unexpected token",
                ErrorKind::InvalidArgument     => "invalid argument",
                ErrorKind::Io                  => "i/o",
                ErrorKind::Parse               => "parse"
            };

        write!(f, "{}", name)
    }
}



/// Any error that occurs while evaluating calculator input.
#[derive(Clone)]
pub struct ScriptError
{
    /// What category of failure this is.
    kind: ErrorKind,

    /// The location in the source text the error occurred, if available.
    location: Option<SourceLocation>,

    /// The description of the error.
    error: String,

    /// The word expansion stack at the time of the error, if available.
    call_stack: Option<CallStack>
}


impl Error for ScriptError
{
}


/// When returned from main, convert the error result to an operating system exit code.
impl Termination for ScriptError
{
    /// Because this type represents an error, the exit code is always FAILURE.
    fn report(self) -> ExitCode
    {
        eprintln!("Error: {}", self);
        ExitCode::FAILURE
    }
}


/// Pretty print the ScriptError, including where it happened and which words were being expanded
/// at the time.
impl Display for ScriptError
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result
    {
        match &self.location
        {
            Some(location) => write!(f, "{}: {}", location, self.error)?,
            None => write!(f, "{}", self.error)?
        }

        if let Some(call_stack) = &self.call_stack
        {
            if !call_stack.is_empty()
            {
                write!(f, "\n\nCall stack\n")?;

                for item in call_stack.iter().rev()
                {
                    writeln!(f, "  {}", item)?;
                }
            }
        }

        Ok(())
    }
}


impl Debug for ScriptError
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result
    {
        write!(f, "[{}] {}", self.kind, self)
    }
}


impl ScriptError
{
    /// Create a new ScriptError.
    pub fn new(kind: ErrorKind,
               location: Option<SourceLocation>,
               error: String,
               call_stack: Option<CallStack>) -> ScriptError
    {
        ScriptError
            {
                kind,
                location,
                error,
                call_stack
            }
    }

    /// Create a new Script Error and wrap it in a Result::Err.
    pub fn new_as_result<T>(kind: ErrorKind,
                            location: Option<SourceLocation>,
                            error: String,
                            call_stack: Option<CallStack>) -> Result<T>
    {
        Err(ScriptError::new(kind, location, error, call_stack))
    }

    /// Create an error that carries no location.  Used by the data structures that don't have
    /// access to the interpreter.
    pub fn bare<T>(kind: ErrorKind, error: &str) -> Result<T>
    {
        ScriptError::new_as_result(kind, None, error.to_string(), None)
    }

    /// What category of error this is.
    pub fn kind(&self) -> ErrorKind
    {
        self.kind
    }

    /// If available, the location in the source text the error occurred.
    pub fn location(&self) -> &Option<SourceLocation>
    {
        &self.location
    }

    /// The description of the error.
    pub fn error(&self) -> &String
    {
        &self.error
    }

    /// If available, the word expansion stack at the time of the error.
    pub fn call_stack(&self) -> &Option<CallStack>
    {
        &self.call_stack
    }

    /// Fill in the location and call stack from the interpreter if the error was raised somewhere
    /// that didn't know them.
    pub fn locate(mut self, interpreter: &dyn Interpreter) -> ScriptError
    {
        if self.location.is_none()
        {
            self.location = interpreter.current_location().clone();
        }

        if self.call_stack.is_none()
        {
            self.call_stack = Some(interpreter.call_stack().clone());
        }

        self
    }
}


/// Allow for the conversion of a std::io::Error into a ScriptError.
impl From<std::io::Error> for ScriptError
{
    fn from(error: std::io::Error) -> ScriptError
    {
        ScriptError::new(ErrorKind::Io, None, format!("I/O error: {}", error), None)
    }
}



/// A convenience function for creating a ScriptError and wrapping in in a Result::Err using the
/// interpreter's current location and call stack.
pub fn script_error<T>(interpreter: &dyn Interpreter, kind: ErrorKind, message: String) -> Result<T>
{
    let location = interpreter.current_location().clone();
    let call_stack = interpreter.call_stack().clone();

    ScriptError::new_as_result(kind, location, message, Some(call_stack))
}



pub fn script_error_str<T>(interpreter: &dyn Interpreter, kind: ErrorKind, message: &str) -> Result<T>
{
    script_error(interpreter, kind, message.to_string())
}
