use crate::{
    lang::{source_buffer::SourceLocation, tokenizing::Token},
    runtime::{
        data_structures::{
            config::Config,
            definitions::DefinitionList,
            dictionary::{Dictionary, WordInfo},
            registers::Registers,
            value::{RealMatrix, Value},
            value_stack::ValueStack,
        },
        error::{self, ScriptError},
        interpreter::program_machine::Counters,
    },
};
use std::{
    fmt::{self, Display, Formatter},
    rc::Rc,
};

pub mod calc_interpreter;
pub mod program_machine;

/// A call stack item is a record of the word, macro or script being expanded and the location
/// within the source text from which it was found.  These items are read-only and the fields are
/// accessed by member functions.
#[derive(Clone, Debug)]
pub struct CallItem {
    location: SourceLocation,
    word: String,
}

impl CallItem {
    /// Create a new call stack item.
    pub fn new(word: String, location: SourceLocation) -> CallItem {
        CallItem { location, word }
    }

    /// Where in the source text was the expansion of this word found?
    pub fn location(&self) -> &SourceLocation {
        &self.location
    }

    // The name of the word being expanded.
    pub fn word(&self) -> &String {
        &self.word
    }
}

/// Make sure that this item can be nicely displayed to the user in event of an error.
impl Display for CallItem {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.word)
    }
}

/// Type to represent a call stack.  This is the stack of expansions currently being evaluated by
/// the interpreter, used to give the user a trace when something goes wrong.
pub type CallStack = Vec<CallItem>;

/// Trait for managing the interpreter's operand stack.  Intended to be called by the built-in
/// words.
///
/// The `pop_as_*` helpers check the kind of the top value before removing it, so a type mismatch
/// leaves the stack untouched.
pub trait InterpreterStack {
    /// Examine the full operand stack, bottom first.
    fn stack(&self) -> &ValueStack;

    /// Direct access to the operand stack for the stack manipulation words.
    fn stack_mut(&mut self) -> &mut ValueStack;

    /// Push a value onto the stack.  If the stack is full the value is dropped and a stack
    /// overflow error is returned.
    fn push(&mut self, value: Value) -> error::Result<()>;

    /// Pop a value from the stack.  If the stack is empty a stack underflow error is returned.
    fn pop(&mut self) -> error::Result<Value>;

    /// Look at the top value without removing it.
    fn peek(&self) -> error::Result<&Value>;

    /// Pop the top value as a real.
    fn pop_as_real(&mut self) -> error::Result<f64>;

    /// Pop the top value as an index.  It has to be a real, it is truncated toward zero and it
    /// can't be negative.
    fn pop_as_index(&mut self) -> error::Result<usize>;

    /// Pop the top value as a string.
    fn pop_as_string(&mut self) -> error::Result<String>;

    /// Pop the top value as a real matrix.
    fn pop_as_real_matrix(&mut self) -> error::Result<RealMatrix>;
}

/// Trait for evaluating calculator input.  Every kind of nested evaluation, word bodies, macro
/// bodies, `eval` strings, batch files and programs, goes through here so the expansion depth can
/// be limited in one place.
pub trait Evaluation {
    /// Evaluate one line of input.  A `: name body ;` line defines a new word, anything else is
    /// tokenized and evaluated token by token.
    ///
    /// Errors from individual tokens are reported and evaluation continues with the next token.
    /// Only errors that abort the whole line are returned.
    ///
    /// The path parameter is used to tag token locations in error reports.  For example, the repl
    /// uses a path of "\<repl\>" to represent input entered by the user.
    fn evaluate_line(&mut self, path: &str, text: &str) -> error::Result<()>;

    /// Evaluate a single token against the current stack.
    fn evaluate_token(&mut self, token: Token) -> error::Result<()>;

    /// Evaluate every line of a text file as if it had been typed in.
    fn run_batch_file(&mut self, path: &str) -> error::Result<()>;

    /// Load a program file, list it when verbose, and run it on the program machine.
    fn run_program_file(&mut self, path: &str) -> error::Result<()>;

    /// Enter one more level of nested evaluation.  Fails with a recursion limit error when the
    /// configured depth would be exceeded.
    fn enter_expansion(&mut self) -> error::Result<()>;

    /// Leave a level of nested evaluation.
    fn leave_expansion(&mut self);
}

/// Definition of a word handler function.  This is the function that is called when a built-in
/// function is to be executed.  Can be a lambda, a callable object or a Rust function.
pub type WordHandler = dyn Fn(&mut dyn Interpreter) -> error::Result<()>;

/// Information about a word handler.  Once created it's fields are read-only and accessed by member
/// methods.
#[derive(Clone)]
pub struct WordHandlerInfo {
    name: String,
    location: SourceLocation,
    handler: Rc<WordHandler>,
    checked: bool,
}

/// Core implementation of WordHandlerInfo's methods.
impl WordHandlerInfo {
    /// Create a new WordHandlerInfo instance.
    pub fn new(
        name: String,
        location: SourceLocation,
        handler: Rc<WordHandler>,
    ) -> WordHandlerInfo {
        WordHandlerInfo {
            name,
            location,
            handler,
            checked: false,
        }
    }

    /// The name of the function itself.
    pub fn name(&self) -> &String {
        &self.name
    }

    /// Where this function was registered in the Rust source code.
    pub fn location(&self) -> &SourceLocation {
        &self.location
    }

    /// The Handler function for the function.
    pub fn handler(&self) -> Rc<WordHandler> {
        self.handler.clone()
    }

    /// A checked handler validates its operands before it touches the stack, so the interpreter
    /// doesn't snapshot the stack before calling it.
    pub fn is_checked(&self) -> bool {
        self.checked
    }

    pub fn set_checked(&mut self) {
        self.checked = true;
    }
}

/// Simplify registering a native built-in function with the interpreter.
///
/// Required parameters are, the interpreter instance to register with.  The name of the function
/// to register.  The function handler to execute.  A simple description of the function.  As well
/// as the function's stack signature.  A trailing `checked` marks a handler that never changes the
/// stack when it fails.
///
/// Evaluates to true if the name was new.
#[macro_export]
macro_rules! add_native_word {
    (
        $interpreter:expr ,
        $name:expr ,
        $function:expr ,
        $description:expr ,
        $signature:expr ,
        checked
    ) => {{
        let added = $crate::add_native_word!(
            $interpreter,
            $name,
            $function,
            $description,
            $signature
        );

        if added {
            $interpreter.mark_word_checked($name);
        }

        added
    }};

    (
        $interpreter:expr ,
        $name:expr ,
        $function:expr ,
        $description:expr ,
        $signature:expr
    ) => {{
        use std::rc::Rc;

        // Register the function while recording where in the source code it was registered
        // from.
        $interpreter.add_word(
            file!().to_string(), // Original source location that this
            line!() as usize,    //  function was registered from.
            column!() as usize,
            $name.to_string(),        // Name.
            Rc::new($function),       // Function handler.
            $description.to_string(), // Function description.
            $signature.to_string(),   // Function signature.
        )
    }};
}

/// Trait for managing and executing the built-in functions and user definitions known to the
/// interpreter.
pub trait WordManagement {
    /// If currently set, this represents the current executing location in the source text.
    fn current_location(&self) -> &Option<SourceLocation>;

    /// Update the current executing location.
    fn set_current_location(&mut self, location: Option<SourceLocation>);

    /// Add a new built-in function to the interpreter's table.  A name that is already registered
    /// keeps its original handler and false is returned.
    #[allow(clippy::too_many_arguments)]
    fn add_word(
        &mut self,
        file: String,
        line: usize,
        column: usize,
        name: String,
        handler: Rc<WordHandler>,
        description: String,
        signature: String,
    ) -> bool;

    /// Mark the handler registered under the name as checked, see `WordHandlerInfo::is_checked`.
    fn mark_word_checked(&mut self, name: &str);

    //// Find a built-in function by name.
    fn find_word(&self, word: &str) -> Option<&WordInfo>;

    /// Get a function's execution information from it's handler index.
    fn word_handler_info(&self, index: usize) -> Option<&WordHandlerInfo>;

    /// Execute a function handler by it's handler information.  If the handler fails the stack is
    /// put back exactly as it was before the call, by a snapshot unless the handler is checked.
    fn execute_word_handler(
        &mut self,
        location: &SourceLocation,
        word_handler_info: &WordHandlerInfo,
    ) -> error::Result<()>;

    /// Execute a built-in function by WordInfo.
    fn execute_word(&mut self, location: &SourceLocation, word: &WordInfo) -> error::Result<()>;

    /// Find and execute a built-in function by name.  Use the macro `location_here!()` to get the
    /// current location in the Rust source code if the function is executed from native code.
    fn execute_word_named(&mut self, location: &SourceLocation, word: &str) -> error::Result<()>;

    /// Look the identifier up as a macro, then as a user word, and evaluate the body found.
    fn execute_definition(&mut self, location: &SourceLocation, name: &str) -> error::Result<()>;

    /// The user defined words.
    fn words(&self) -> &DefinitionList;

    fn words_mut(&mut self) -> &mut DefinitionList;

    /// The predefined macros.  They are loaded once at start up and not changed afterwards.
    fn macros(&self) -> &DefinitionList;

    /// The current expansion call stack.
    fn call_stack(&self) -> &CallStack;

    /// Push a new name and location onto the call stack.  This information is used to help track
    /// errors reported by the interpreter.
    fn call_stack_push(&mut self, name: String, location: SourceLocation);

    /// Pop the last name and location from the call stack.
    fn call_stack_pop(&mut self) -> error::Result<()>;
}

/// Core interpreter trait.
///
/// This trait brings together stack management, evaluation and the function tables, along with
/// the rest of the calculator's state: settings, registers and program counters.
pub trait Interpreter: InterpreterStack + Evaluation + WordManagement {
    /// The table of built-in functions.
    fn dictionary(&self) -> &Dictionary;

    fn config(&self) -> &Config;

    fn config_mut(&mut self) -> &mut Config;

    fn registers(&self) -> &Registers;

    fn registers_mut(&mut self) -> &mut Registers;

    /// The program machine's conditional counters.
    fn counters(&self) -> &Counters;

    fn counters_mut(&mut self) -> &mut Counters;

    /// The full path of a file in the data directory.
    fn data_path(&self, file_name: &str) -> String;

    /// Find a file, first in the data directory and then relative to the working directory.
    fn find_file(&self, path: &str) -> error::Result<String>;

    /// Report a recovered error.  It is written to stderr and kept until collected with
    /// `take_reported_errors`.
    fn report_error(&mut self, error: ScriptError);

    /// Collect the errors reported since the last call.
    fn take_reported_errors(&mut self) -> Vec<ScriptError>;

    /// Print an informational message when verbose mode is on.
    fn verbose(&self, message: &str);

    /// Ask the repl not to print the stack after the current line.
    fn suppress_stack_print(&mut self);

    /// Restore the stack saved before the last line of input.
    fn undo(&mut self);

    /// Clear the stack, registers, counters and user words back to a fresh state.  Settings and
    /// macros are kept.
    fn reset(&mut self);
}
