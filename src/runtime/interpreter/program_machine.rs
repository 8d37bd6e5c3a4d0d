use crate::{
    lang::program::{Op, Program},
    runtime::{
        data_structures::{value::Value, value_stack::ValueStack},
        error::{self, ErrorKind, ScriptError},
        interpreter::Interpreter,
    },
};
use lazy_static::lazy_static;
use std::collections::HashMap;

/// How many conditional counters the program machine has.
pub const COUNTER_COUNT: usize = 32;

/// How deeply `GOSUB`s may nest.
pub const MAX_CALL_DEPTH: usize = 64;

/// The program machine's integer counters, all starting at zero.  They live in the interpreter so
/// that they survive between program runs and can be set up from the repl.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct Counters {
    values: [i64; COUNTER_COUNT],
}

impl Counters {
    fn check_index(index: usize) -> error::Result<()> {
        if index >= COUNTER_COUNT {
            return ScriptError::bare(
                ErrorKind::InvalidArgument,
                &format!("Invalid counter index: {}.", index),
            );
        }

        Ok(())
    }

    pub fn get(&self, index: usize) -> Option<i64> {
        self.values.get(index).copied()
    }

    pub fn set(&mut self, index: usize, value: i64) -> error::Result<()> {
        Counters::check_index(index)?;
        self.values[index] = value;

        Ok(())
    }

    pub fn increment(&mut self, index: usize) -> error::Result<()> {
        self.step(index, 1)
    }

    pub fn decrement(&mut self, index: usize) -> error::Result<()> {
        self.step(index, -1)
    }

    fn step(&mut self, index: usize, delta: i64) -> error::Result<()> {
        Counters::check_index(index)?;

        match self.values[index].checked_add(delta) {
            Some(value) => {
                self.values[index] = value;
                Ok(())
            }

            None => ScriptError::bare(
                ErrorKind::InvalidArgument,
                &format!("Counter {} is out of range.", index),
            ),
        }
    }

    pub fn clear(&mut self) {
        self.values = [0; COUNTER_COUNT];
    }
}

/// A test predicate.  Predicates only look at the stack and counters, they never change them.
pub type Predicate = fn(&ValueStack, &Counters) -> bool;

fn top_real(stack: &ValueStack) -> Option<f64> {
    match stack.peek() {
        Ok(Value::Real(value)) => Some(*value),
        _ => None,
    }
}

fn top_two_reals(stack: &ValueStack) -> Option<(f64, f64)> {
    match (stack.peek_at(1), stack.peek_at(0)) {
        (Ok(Value::Real(a)), Ok(Value::Real(b))) => Some((*a, *b)),
        _ => None,
    }
}

fn top_counter(stack: &ValueStack, counters: &Counters) -> Option<i64> {
    let index = top_real(stack)?;

    if index < 0.0 {
        return None;
    }

    counters.get(index as usize)
}

macro_rules! top_zero_test {
    ($name:ident, $op:tt) => {
        fn $name(stack: &ValueStack, _counters: &Counters) -> bool {
            top_real(stack).is_some_and(|value| value $op 0.0)
        }
    };
}

macro_rules! top_two_test {
    ($name:ident, $op:tt) => {
        fn $name(stack: &ValueStack, _counters: &Counters) -> bool {
            top_two_reals(stack).is_some_and(|(a, b)| a $op b)
        }
    };
}

macro_rules! counter_zero_test {
    ($name:ident, $op:tt) => {
        fn $name(stack: &ValueStack, counters: &Counters) -> bool {
            top_counter(stack, counters).is_some_and(|value| value $op 0)
        }
    };
}

top_zero_test!(top_eq0, ==);
top_zero_test!(top_neq0, !=);
top_zero_test!(top_gt0, >);
top_zero_test!(top_lt0, <);
top_zero_test!(top_gte0, >=);
top_zero_test!(top_lte0, <=);

top_two_test!(top_eq, ==);
top_two_test!(top_neq, !=);
top_two_test!(top_gt, >);
top_two_test!(top_lt, <);
top_two_test!(top_gte, >=);
top_two_test!(top_lte, <=);

counter_zero_test!(ctr_eq0, ==);
counter_zero_test!(ctr_neq0, !=);
counter_zero_test!(ctr_gt0, >);
counter_zero_test!(ctr_lt0, <);
counter_zero_test!(ctr_gte0, >=);
counter_zero_test!(ctr_lte0, <=);

lazy_static! {
    /// The predicates a program test line may name.
    ///
    /// `top_*0?` compare the top real with zero, `top_*?` compare the second real with the top
    /// one, and `ctr_*0?` treat the top real as a counter index and compare that counter with zero.
    /// A predicate whose operands are missing or of the wrong kind is false.
    static ref PREDICATES: HashMap<&'static str, Predicate> = {
        let table: [(&'static str, Predicate); 18] = [
            ("top_eq0?", top_eq0),
            ("top_neq0?", top_neq0),
            ("top_gt0?", top_gt0),
            ("top_lt0?", top_lt0),
            ("top_gte0?", top_gte0),
            ("top_lte0?", top_lte0),
            ("top_eq?", top_eq),
            ("top_neq?", top_neq),
            ("top_gt?", top_gt),
            ("top_lt?", top_lt),
            ("top_gte?", top_gte),
            ("top_lte?", top_lte),
            ("ctr_eq0?", ctr_eq0),
            ("ctr_neq0?", ctr_neq0),
            ("ctr_gt0?", ctr_gt0),
            ("ctr_lt0?", ctr_lt0),
            ("ctr_gte0?", ctr_gte0),
            ("ctr_lte0?", ctr_lte0),
        ];

        table.into_iter().collect()
    };
}

/// Evaluate a named predicate.  `None` if there is no such predicate.
pub fn evaluate_predicate(name: &str, stack: &ValueStack, counters: &Counters) -> Option<bool> {
    PREDICATES
        .get(name.trim())
        .map(|predicate| predicate(stack, counters))
}

/// All the predicate names, sorted.
pub fn predicate_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = PREDICATES.keys().copied().collect();

    names.sort_unstable();
    names
}

fn jump_target(
    interpreter: &mut dyn Interpreter,
    program: &Program,
    label: &str,
) -> error::Result<usize> {
    match program.label_index(label) {
        Some(index) => Ok(index),
        None => error::script_error(
            interpreter,
            ErrorKind::LabelNotFound,
            format!("Label {} not found.", label),
        ),
    }
}

/// Run a loaded program to completion.
///
/// Word lines are handed to the evaluator, which reports their errors itself.  A failed test
/// predicate skips the instruction after the test.  An unknown predicate is reported and counts as
/// false.  Missing labels, call stack problems and the recursion limit stop the run and are
/// returned.
pub fn run_program(interpreter: &mut dyn Interpreter, program: &Program) -> error::Result<()> {
    let mut return_stack: Vec<usize> = Vec::new();
    let mut pc = 0;

    while pc < program.len() {
        let instruction = &program.instructions()[pc];

        interpreter.set_current_location(Some(instruction.location.clone()));

        match &instruction.op {
            Op::Word(text) => {
                interpreter.evaluate_line(instruction.location.path(), text)?;
                pc += 1;
            }

            Op::Label(_) => pc += 1,

            Op::Goto(label) => pc = jump_target(interpreter, program, label)?,

            Op::Gosub(label) => {
                if return_stack.len() >= MAX_CALL_DEPTH {
                    return error::script_error(
                        interpreter,
                        ErrorKind::CallStackOverflow,
                        format!("GOSUB nested deeper than {}.", MAX_CALL_DEPTH),
                    );
                }

                let target = jump_target(interpreter, program, label)?;

                return_stack.push(pc + 1);
                pc = target;
            }

            Op::Return => match return_stack.pop() {
                Some(return_to) => pc = return_to,
                None => {
                    return error::script_error_str(
                        interpreter,
                        ErrorKind::CallStackUnderflow,
                        "RTN without a matching GOSUB.",
                    );
                }
            },

            Op::End => break,

            Op::Test {
                predicate,
                skip_target,
            } => {
                let outcome =
                    evaluate_predicate(predicate, interpreter.stack(), interpreter.counters());

                pc = match outcome {
                    Some(true) => pc + 1,
                    Some(false) => *skip_target,
                    None => {
                        let error = ScriptError::new(
                            ErrorKind::UnknownPredicate,
                            Some(instruction.location.clone()),
                            format!("Unknown predicate {}.", predicate),
                            None,
                        );

                        interpreter.report_error(error);
                        *skip_target
                    }
                };
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack_of(values: &[f64]) -> ValueStack {
        let mut stack = ValueStack::new();

        for value in values {
            stack.push(Value::Real(*value)).unwrap();
        }

        stack
    }

    #[test]
    fn comparisons_are_second_against_top() {
        let counters = Counters::default();
        let stack = stack_of(&[3.0, 5.0]);

        assert_eq!(evaluate_predicate("top_lt?", &stack, &counters), Some(true));
        assert_eq!(evaluate_predicate("top_gt?", &stack, &counters), Some(false));
        assert_eq!(evaluate_predicate("top_gt0?", &stack, &counters), Some(true));
    }

    #[test]
    fn counters_refuse_to_wrap() {
        let mut counters = Counters::default();
        counters.set(0, i64::MAX).unwrap();
        counters.set(1, i64::MIN).unwrap();

        assert_eq!(counters.increment(0).unwrap_err().kind(), ErrorKind::InvalidArgument);
        assert_eq!(counters.decrement(1).unwrap_err().kind(), ErrorKind::InvalidArgument);
        assert_eq!(counters.get(0), Some(i64::MAX));
        assert_eq!(counters.get(1), Some(i64::MIN));
    }

    #[test]
    fn counter_predicates_use_top_as_index() {
        let mut counters = Counters::default();
        counters.set(2, 4).unwrap();

        assert_eq!(evaluate_predicate("ctr_gt0?", &stack_of(&[2.0]), &counters), Some(true));
        assert_eq!(evaluate_predicate("ctr_eq0?", &stack_of(&[1.0]), &counters), Some(true));
        assert_eq!(evaluate_predicate("ctr_eq0?", &stack_of(&[99.0]), &counters), Some(false));
    }

    #[test]
    fn missing_operands_are_false_and_unknown_is_none() {
        let counters = Counters::default();

        assert_eq!(evaluate_predicate("top_eq0?", &ValueStack::new(), &counters), Some(false));
        assert_eq!(evaluate_predicate("bogus?", &ValueStack::new(), &counters), None);
    }
}
