use std::{ fs::read_to_string,
           path::{ Path,
                   PathBuf },
           rc::Rc };
use crate::{ lang::{ program::{ pretty_print_program,
                                Program },
                     source_buffer::SourceLocation,
                     tokenizing::{ is_function_name,
                                   Token,
                                   Tokenizer } },
             runtime::{ built_ins::{ base_words::constant_words::constant_value,
                                     register_builtin_words },
                        data_structures::{ config::Config,
                                           definitions::{ parse_definition,
                                                          Definition,
                                                          DefinitionList },
                                           dictionary::{ Dictionary,
                                                         WordInfo },
                                           registers::Registers,
                                           value::{ matrix_entry_count,
                                                    RealMatrix,
                                                    Value,
                                                    MAX_MATRIX_ENTRIES },
                                           value_stack::ValueStack },
                        error::{ self,
                                 script_error,
                                 script_error_str,
                                 ErrorKind,
                                 ScriptError },
                        interpreter::{ program_machine::{ run_program,
                                                          Counters },
                                       CallItem,
                                       CallStack,
                                       Evaluation,
                                       Interpreter,
                                       InterpreterStack,
                                       WordHandler,
                                       WordHandlerInfo,
                                       WordManagement } } };



/// List of function handlers known by the interpreter.
pub type WordList = Vec<WordHandlerInfo>;

/// The path used to tag input typed at the repl.
pub const REPL_PATH: &str = "<repl>";



/// The core interpreter implementation for the calculator.
pub struct CalcInterpreter
{
    /// The operand stack.
    stack: ValueStack,

    /// The stack as it was before the last line of repl input, restored by `undo`.
    undo_stack: ValueStack,

    /// Set when the current line asked for an undo, so the snapshot isn't overwritten.
    undo_requested: bool,


    /// The last known location evaluation has reached in the source text.
    current_location: Option<SourceLocation>,

    /// The stack of word, macro and script expansions currently in progress.
    call_stack: CallStack,

    /// How many nested evaluations are currently running.
    depth: usize,


    /// The table of built-in functions.
    dictionary: Dictionary,

    /// The list of executable function handlers associated with the dictionary.
    word_handlers: WordList,

    /// The user's words.
    words: DefinitionList,

    /// The predefined macros.
    macros: DefinitionList,


    /// The numbered storage registers.
    registers: Registers,

    /// The program machine's counters.
    counters: Counters,

    /// The user settings.
    config: Config,


    /// Errors reported since they were last collected.
    reported_errors: Vec<ScriptError>,

    /// Don't print the stack after the current line.
    stack_print_suppressed: bool,

    /// Record reported errors without writing them to stderr.
    quiet: bool
}


impl Interpreter for CalcInterpreter
{
    fn dictionary(&self) -> &Dictionary
    {
        &self.dictionary
    }

    fn config(&self) -> &Config
    {
        &self.config
    }

    fn config_mut(&mut self) -> &mut Config
    {
        &mut self.config
    }

    fn registers(&self) -> &Registers
    {
        &self.registers
    }

    fn registers_mut(&mut self) -> &mut Registers
    {
        &mut self.registers
    }

    fn counters(&self) -> &Counters
    {
        &self.counters
    }

    fn counters_mut(&mut self) -> &mut Counters
    {
        &mut self.counters
    }

    fn data_path(&self, file_name: &str) -> String
    {
        PathBuf::from(&self.config.path_to_data_and_programs)
            .join(file_name)
            .to_string_lossy()
            .to_string()
    }

    fn find_file(&self, path: &str) -> error::Result<String>
    {
        let in_data = self.data_path(path);

        if Path::new(&in_data).is_file()
        {
            return Ok(in_data);
        }

        if Path::new(path).is_file()
        {
            return Ok(path.to_string());
        }

        script_error(self, ErrorKind::Io, format!("File {} not found.", path))
    }

    fn report_error(&mut self, error: ScriptError)
    {
        let error = error.locate(self);

        if !self.quiet
        {
            eprintln!("Error: {}", error);
        }

        self.reported_errors.push(error);
    }

    fn take_reported_errors(&mut self) -> Vec<ScriptError>
    {
        std::mem::take(&mut self.reported_errors)
    }

    fn verbose(&self, message: &str)
    {
        if self.config.verbose_mode
        {
            println!("{}", message);
        }
    }

    fn suppress_stack_print(&mut self)
    {
        self.stack_print_suppressed = true;
    }

    fn undo(&mut self)
    {
        self.stack = self.undo_stack.clone();
        self.undo_requested = true;
    }

    fn reset(&mut self)
    {
        self.stack.clear();
        self.undo_stack.clear();
        self.registers.clear();
        self.counters.clear();
        self.words.clear();
        self.call_stack.clear();
        self.depth = 0;
    }
}


impl InterpreterStack for CalcInterpreter
{
    fn stack(&self) -> &ValueStack
    {
        &self.stack
    }

    fn stack_mut(&mut self) -> &mut ValueStack
    {
        &mut self.stack
    }

    fn push(&mut self, value: Value) -> error::Result<()>
    {
        self.stack.push(value)
    }

    fn pop(&mut self) -> error::Result<Value>
    {
        self.stack.pop()
    }

    fn peek(&self) -> error::Result<&Value>
    {
        self.stack.peek()
    }

    fn pop_as_real(&mut self) -> error::Result<f64>
    {
        let value = *self.stack.peek()?.as_real(self)?;

        let _ = self.stack.pop()?;
        Ok(value)
    }

    fn pop_as_index(&mut self) -> error::Result<usize>
    {
        let value = *self.stack.peek()?.as_real(self)?;

        if !value.is_finite() || value < 0.0
        {
            return script_error(self,
                                ErrorKind::InvalidArgument,
                                format!("Expected a non-negative index, found {}.", value));
        }

        let _ = self.stack.pop()?;
        Ok(value as usize)
    }

    fn pop_as_string(&mut self) -> error::Result<String>
    {
        let _ = self.stack.peek()?.as_string(self)?;

        match self.stack.pop()?
        {
            Value::String(text) => Ok(text),
            other => script_error(self,
                                  ErrorKind::TypeMismatch,
                                  format!("Expected a string, found a {}.", other.type_name()))
        }
    }

    fn pop_as_real_matrix(&mut self) -> error::Result<RealMatrix>
    {
        let _ = self.stack.peek()?.as_real_matrix(self)?;

        match self.stack.pop()?
        {
            Value::MatrixReal(matrix) => Ok(matrix),
            other => script_error(self,
                                  ErrorKind::TypeMismatch,
                                  format!("Expected a real matrix, found a {}.",
                                          other.type_name()))
        }
    }
}


impl CalcInterpreter
{
    /// Record a new user word from a `: name body ;` line.
    fn define_word(&mut self, mut definition: Definition) -> error::Result<()>
    {
        let typed_name = definition.name.clone();

        if definition.shorten_name()
        {
            let message = format!("Word name {} is too long, it was shortened to {}.",
                                  typed_name,
                                  definition.name);

            self.report_error(ScriptError::new(ErrorKind::InvalidArgument, None, message, None));
        }

        if is_function_name(&definition.name)
        {
            return script_error(self,
                                ErrorKind::InvalidArgument,
                                format!("{} is a built-in function name.", definition.name));
        }

        let message = format!("New word {} <- {}", definition.name, definition.body);
        let _ = self.words.add(definition)?;

        self.verbose(&message);
        Ok(())
    }

    /// Tokenize a line and evaluate it token by token, reporting the recoverable errors.
    fn evaluate_tokens(&mut self, path: &str, text: &str) -> error::Result<()>
    {
        if let Some(definition) = parse_definition(text)
        {
            if let Err(error) = self.define_word(definition)
            {
                self.report_error(error);
            }

            return Ok(());
        }

        let mut tokenizer = Tokenizer::new(path, text);

        loop
        {
            let token = tokenizer.next_token();

            if token.is_eof()
            {
                break;
            }

            if let Err(error) = self.evaluate_token(token)
            {
                if error.kind().aborts_line()
                {
                    return Err(error.locate(self));
                }

                self.report_error(error);
            }
        }

        Ok(())
    }

    /// The functions handled by the evaluator itself rather than the function table.  They don't
    /// take a stack snapshot because they run arbitrary nested evaluation.
    fn execute_meta_function(&mut self, name: &str) -> Option<error::Result<()>>
    {
        let result = match name
            {
                "eval" =>
                    {
                        self.pop_as_string().and_then(|text| self.evaluate_line("<eval>", &text))
                    },

                "batch" =>
                    {
                        self.pop_as_string().and_then(|path| self.run_batch_file(&path))
                    },

                "run" =>
                    {
                        self.pop_as_string().and_then(|path| self.run_program_file(&path))
                    },

                _ => return None
            };

        Some(result)
    }

    /// Dispatch a function token: meta functions, then constants, then the function table.
    fn execute_function(&mut self, location: &SourceLocation, name: &str) -> error::Result<()>
    {
        if let Some(result) = self.execute_meta_function(name)
        {
            return result;
        }

        if let Some(value) = constant_value(name)
        {
            return self.push(value);
        }

        self.execute_word_named(location, name)
    }

    /// Read a whitespace separated matrix file, filling the matrix row by row.  Extra entries are
    /// ignored.
    fn load_matrix_file(&self, rows: usize, cols: usize, file: &str) -> error::Result<Value>
    {
        let Some(count) = matrix_entry_count(rows, cols)
        else
        {
            return script_error(self,
                                ErrorKind::MalformedLiteral,
                                format!("A {} x {} matrix is larger than {} entries.",
                                        rows,
                                        cols,
                                        MAX_MATRIX_ENTRIES));
        };

        let path = self.find_file(file)?;
        let text = read_to_string(&path)?;

        let mut entries = Vec::new();

        for word in text.split_whitespace().take(count)
        {
            match word.parse::<f64>()
            {
                Ok(number) => entries.push(number),
                Err(_) => return script_error(self,
                                              ErrorKind::MalformedLiteral,
                                              format!("Bad matrix entry {} in {}.", word, path))
            }
        }

        if entries.len() < count
        {
            return script_error(self,
                                ErrorKind::MalformedLiteral,
                                format!("{} holds {} entries, a {} x {} matrix needs {}.",
                                        path,
                                        entries.len(),
                                        rows,
                                        cols,
                                        count));
        }

        Ok(Value::MatrixReal(RealMatrix::from_row_slice(rows, cols, &entries)))
    }
}


impl Evaluation for CalcInterpreter
{
    fn evaluate_line(&mut self, path: &str, text: &str) -> error::Result<()>
    {
        self.enter_expansion()?;

        let result = self.evaluate_tokens(path, text);

        self.leave_expansion();
        result
    }

    fn evaluate_token(&mut self, token: Token) -> error::Result<()>
    {
        self.current_location = Some(token.location().clone());

        match token
        {
            Token::Number(_, number)        => self.push(Value::Real(number)),
            Token::Complex(_, number)       => self.push(Value::Complex(number)),
            Token::String(_, text)          => self.push(Value::String(text)),

            Token::MatrixFileRef(_, rows, cols, file) =>
                {
                    let value = self.load_matrix_file(rows, cols, &file)?;
                    self.push(value)
                },

            Token::MatrixLiteral(_, literal) => self.push(Value::from(&literal)),

            Token::Operator(location, operator) =>
                {
                    if operator.is_arithmetic()
                    {
                        self.execute_word_named(&location, operator.symbol())
                    }
                    else
                    {
                        script_error(self,
                                     ErrorKind::UnexpectedToken,
                                     format!("Unexpected {} outside of a definition.", operator))
                    }
                },

            Token::Identifier(location, name) => self.execute_definition(&location, &name),

            Token::Function(location, name) => self.execute_function(&location, &name),

            Token::Eof(_) => Ok(()),

            Token::Unknown(_, character) =>
                {
                    script_error(self,
                                 ErrorKind::UnexpectedToken,
                                 format!("Unexpected character '{}'.", character))
                }
        }
    }

    fn run_batch_file(&mut self, path: &str) -> error::Result<()>
    {
        let full_path = self.find_file(path)?;
        let text = read_to_string(&full_path)?;

        self.enter_expansion()?;
        self.call_stack_push(path.to_string(),
                             self.current_location.clone().unwrap_or_default());

        println!("Running batch: {}", path);

        for line in text.lines()
        {
            if let Err(error) = self.evaluate_line(&full_path, line)
            {
                self.report_error(error);
            }
        }

        let _ = self.call_stack.pop();
        self.leave_expansion();
        self.suppress_stack_print();

        Ok(())
    }

    fn run_program_file(&mut self, path: &str) -> error::Result<()>
    {
        let full_path = self.find_file(path)?;
        let program = Program::load_from_file(&full_path)?;

        self.verbose(&pretty_print_program(&program));

        self.enter_expansion()?;
        self.call_stack_push(path.to_string(),
                             self.current_location.clone().unwrap_or_default());

        let result = run_program(self, &program);

        let _ = self.call_stack.pop();
        self.leave_expansion();

        result
    }

    fn enter_expansion(&mut self) -> error::Result<()>
    {
        if self.depth >= self.config.recursion_limit
        {
            return script_error(self,
                                ErrorKind::RecursionLimit,
                                format!("Expansion nested deeper than {} levels.",
                                        self.config.recursion_limit));
        }

        self.depth += 1;
        Ok(())
    }

    fn leave_expansion(&mut self)
    {
        self.depth = self.depth.saturating_sub(1);
    }
}


impl WordManagement for CalcInterpreter
{
    fn current_location(&self) -> &Option<SourceLocation>
    {
        &self.current_location
    }

    fn set_current_location(&mut self, location: Option<SourceLocation>)
    {
        self.current_location = location;
    }

    fn add_word(&mut self,
                file: String,
                line: usize,
                column: usize,
                name: String,
                handler: Rc<WordHandler>,
                description: String,
                signature: String) -> bool
    {
        if self.dictionary.try_get(&name).is_some()
        {
            return false;
        }

        let location = SourceLocation::new_from_info(&file, line, column);
        let mut word_info = WordInfo::new(location.clone());

        let info = WordHandlerInfo::new(name.clone(), location, handler);

        self.word_handlers.push(info);

        word_info.name = name.clone();
        word_info.description = description;
        word_info.signature = signature;
        word_info.handler_index = self.word_handlers.len() - 1;

        self.dictionary.insert(name, word_info)
    }

    fn mark_word_checked(&mut self, name: &str)
    {
        let index = match self.dictionary.try_get(name)
            {
                Some(word) => word.handler_index,
                None => return
            };

        if let Some(info) = self.word_handlers.get_mut(index)
        {
            info.set_checked();
        }
    }

    fn find_word(&self, word: &str) -> Option<&WordInfo>
    {
        self.dictionary.try_get(word)
    }

    fn word_handler_info(&self, index: usize) -> Option<&WordHandlerInfo>
    {
        self.word_handlers.get(index)
    }

    fn execute_word_handler(&mut self,
                            location: &SourceLocation,
                            word_handler_info: &WordHandlerInfo) -> error::Result<()>
    {
        self.current_location = Some(location.clone());
        self.call_stack.push(CallItem::new(word_handler_info.name().clone(), location.clone()));

        let snapshot = if word_handler_info.is_checked() { None } else { Some(self.stack.clone()) };

        let result = (*word_handler_info.handler())(self);

        if result.is_err()
            && let Some(snapshot) = snapshot
        {
            self.stack.restore(snapshot);
        }

        let result = result.map_err(|error| error.locate(self));

        let _ = self.call_stack.pop();
        result
    }

    fn execute_word(&mut self,
                    location: &SourceLocation,
                    word: &WordInfo) -> error::Result<()>
    {
        let handler_info = self.word_handler_info(word.handler_index);

        if let Some(handler_info) = handler_info
        {
            self.execute_word_handler(location, &handler_info.clone())
        }
        else
        {
            script_error(self,
                         ErrorKind::UnknownIdentifier,
                         format!("Handler for function {}, ({}) not found.",
                                 word.name,
                                 word.handler_index))
        }
    }

    fn execute_word_named(&mut self,
                          location: &SourceLocation,
                          word: &str) -> error::Result<()>
    {
        let word_info = self.dictionary.try_get(word);

        if let Some(word_info) = word_info
        {
            self.execute_word(location, &word_info.clone())
        }
        else
        {
            script_error(self,
                         ErrorKind::UnknownIdentifier,
                         format!("Function {} has no handler.", word))
        }
    }

    fn execute_definition(&mut self, location: &SourceLocation, name: &str) -> error::Result<()>
    {
        let body = match self.macros.find(name).or_else(|| self.words.find(name))
            {
                Some(definition) => definition.body.clone(),
                None => return script_error(self,
                                            ErrorKind::UnknownIdentifier,
                                            format!("Unknown identifier {}.", name))
            };

        self.call_stack_push(name.to_string(), location.clone());

        let result = self.evaluate_line(name, &body);

        let _ = self.call_stack.pop();
        result
    }

    fn words(&self) -> &DefinitionList
    {
        &self.words
    }

    fn words_mut(&mut self) -> &mut DefinitionList
    {
        &mut self.words
    }

    fn macros(&self) -> &DefinitionList
    {
        &self.macros
    }

    fn call_stack(&self) -> &CallStack
    {
        &self.call_stack
    }

    fn call_stack_push(&mut self, name: String, location: SourceLocation)
    {
        self.call_stack.push(CallItem::new(name, location));
    }

    fn call_stack_pop(&mut self) -> error::Result<()>
    {
        if self.call_stack.is_empty()
        {
            script_error_str(self, ErrorKind::CallStackUnderflow, "Call stack underflow.")?;
        }

        let _ = self.call_stack.pop();
        Ok(())
    }
}


impl CalcInterpreter
{
    /// Create an interpreter with default settings and every built-in function registered.
    pub fn new() -> CalcInterpreter
    {
        let mut interpreter = CalcInterpreter
            {
                stack: ValueStack::new(),
                undo_stack: ValueStack::new(),
                undo_requested: false,

                current_location: None,
                call_stack: CallStack::with_capacity(40),
                depth: 0,

                dictionary: Dictionary::new(),
                word_handlers: WordList::new(),
                words: DefinitionList::new(),
                macros: DefinitionList::new(),

                registers: Registers::new(),
                counters: Counters::default(),
                config: Config::default(),

                reported_errors: Vec::new(),
                stack_print_suppressed: false,
                quiet: false
            };

        register_builtin_words(&mut interpreter);
        interpreter
    }

    /// Create an interpreter that uses the given settings.
    pub fn with_config(config: Config) -> CalcInterpreter
    {
        let mut interpreter = CalcInterpreter::new();

        interpreter.config = config;
        interpreter
    }

    /// Stop writing reported errors to stderr.  They are still recorded.
    pub fn set_quiet(&mut self, quiet: bool)
    {
        self.quiet = quiet;
    }

    /// Replace the predefined macros.
    pub fn set_macros(&mut self, macros: DefinitionList)
    {
        self.macros = macros;
    }

    /// Load the macro file from the data directory.
    pub fn load_macros(&mut self, file_name: &str) -> error::Result<()>
    {
        let path = self.data_path(file_name);
        let mut macros = DefinitionList::new();

        macros.load_from_file(&path)?;
        self.verbose(&format!("Loaded {} macros from {}.", macros.len(), path));

        self.macros = macros;
        Ok(())
    }

    /// Evaluate a line of user input as the repl does.  The stack is snapshotted first so that
    /// `undo` on a later line can go back to it.  Any error is reported, never returned.
    pub fn evaluate_input(&mut self, text: &str)
    {
        let snapshot = self.stack.clone();

        self.undo_requested = false;
        self.stack_print_suppressed = false;

        if let Err(error) = self.evaluate_line(REPL_PATH, text)
        {
            self.report_error(error);
        }

        self.call_stack.clear();
        self.depth = 0;

        if !self.undo_requested
        {
            self.undo_stack = snapshot;
        }
    }

    /// Check and clear the request to skip printing the stack after the last line.
    pub fn take_stack_print_suppressed(&mut self) -> bool
    {
        std::mem::take(&mut self.stack_print_suppressed)
    }
}


impl Default for CalcInterpreter
{
    fn default() -> Self
    {
        Self::new()
    }
}
