use crate::{
    lang::source_buffer::SourceLocation,
    runtime::error::{self, ErrorKind, ScriptError},
};
use std::{
    collections::HashMap,
    fmt::{self, Display, Formatter},
    fs::read_to_string,
};

/// The most instructions a single program may hold.
pub const MAX_PROGRAM: usize = 1024;

/// The most labels a single program may define.
pub const MAX_LABELS: usize = 128;

/// The operations of the program machine.  Every non-empty line of a program file becomes one.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Op {
    /// A line of ordinary calculator input, handed to the evaluator.
    Word(String),

    /// `LBL name`, a jump target.  Does nothing when executed.
    Label(String),

    /// `GOTO name`, an unconditional jump.
    Goto(String),

    /// `GOSUB name`, a jump that remembers where to come back to.
    Gosub(String),

    /// `RTN`, go back to the instruction after the last `GOSUB`.
    Return,

    /// `END`, stop the program.
    End,

    /// A predicate line, any line containing a `?`.  When the predicate is false execution
    /// continues at `skip_target`, skipping the instruction that follows the test.
    Test {
        predicate: String,
        skip_target: usize,
    },
}

/// A single program instruction along with the line it was loaded from.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Instruction {
    pub location: SourceLocation,
    pub op: Op,
}

impl Instruction {
    pub fn new(location: SourceLocation, op: Op) -> Instruction {
        Instruction { location, op }
    }
}

/// The listing form of an instruction, kind first then argument.
impl Display for Instruction {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let (kind, argument) = match &self.op {
            Op::Word(text) => ("WORD", text.as_str()),
            Op::Label(name) => ("LBL", name.as_str()),
            Op::Goto(name) => ("GOTO", name.as_str()),
            Op::Gosub(name) => ("GOSUB", name.as_str()),
            Op::Return => ("RTN", ""),
            Op::End => ("END", ""),
            Op::Test { predicate, .. } => ("TEST", predicate.as_str()),
        };

        write!(f, "{:<6} {}", kind, argument)
    }
}

/// A loaded program, the instruction list and a table from label name to instruction index.
#[derive(Clone, Default, Debug)]
pub struct Program {
    instructions: Vec<Instruction>,
    labels: HashMap<String, usize>,
}

impl Program {
    /// Build a program from source text.  The path is only used to tag instruction locations.
    pub fn parse(path: &str, source: &str) -> error::Result<Program> {
        let mut program = Program::default();

        for (line_index, raw_line) in source.lines().enumerate() {
            let line = raw_line.trim();

            if line.is_empty() {
                continue;
            }

            let location = SourceLocation::new_from_info(path, line_index + 1, 1);
            let index = program.instructions.len();

            if index >= MAX_PROGRAM {
                return ScriptError::new_as_result(
                    ErrorKind::Parse,
                    Some(location),
                    format!("Program is too long, the limit is {} instructions.", MAX_PROGRAM),
                    None,
                );
            }

            let op = if let Some(name) = line.strip_prefix("LBL ") {
                let name = name.trim().to_string();

                if program.labels.len() >= MAX_LABELS {
                    return ScriptError::new_as_result(
                        ErrorKind::Parse,
                        Some(location),
                        format!("Too many labels, the limit is {}.", MAX_LABELS),
                        None,
                    );
                }

                // A repeated label keeps pointing at its first definition.
                let _ = program.labels.entry(name.clone()).or_insert(index);
                Op::Label(name)
            } else if let Some(name) = line.strip_prefix("GOTO ") {
                Op::Goto(name.trim().to_string())
            } else if let Some(name) = line.strip_prefix("GOSUB ") {
                Op::Gosub(name.trim().to_string())
            } else if line == "RTN" {
                Op::Return
            } else if line == "END" {
                Op::End
            } else if line.contains('?') {
                Op::Test {
                    predicate: line.to_string(),
                    skip_target: index + 2,
                }
            } else {
                Op::Word(line.to_string())
            };

            program.instructions.push(Instruction::new(location, op));
        }

        Ok(program)
    }

    /// Read and parse a program file.
    pub fn load_from_file(path: &str) -> error::Result<Program> {
        let source = read_to_string(path).map_err(|error| {
            ScriptError::new(
                ErrorKind::Io,
                None,
                format!("Could not read program {}: {}", path, error),
                None,
            )
        })?;

        Program::parse(path, &source)
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// The instruction index of a label.
    pub fn label_index(&self, name: &str) -> Option<usize> {
        self.labels.get(name).copied()
    }
}

/// Pretty print the program listing, one numbered instruction per line.
pub fn pretty_print_program(program: &Program) -> String {
    use std::fmt::Write;

    let mut result = String::with_capacity(program.len() * 20);

    result.push_str("--- Program Listing ---\n");

    for (index, instruction) in program.instructions.iter().enumerate() {
        let _ = writeln!(&mut result, "{:3}: {}", index, instruction);
    }

    result
}
