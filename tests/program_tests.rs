use rpncalc::lang::program::{Op, Program, pretty_print_program};
use rpncalc::runtime::data_structures::value::Value;
use rpncalc::runtime::error::ErrorKind;
use rpncalc::runtime::interpreter::calc_interpreter::CalcInterpreter;
use rpncalc::runtime::interpreter::program_machine::run_program;
use rpncalc::runtime::interpreter::{Interpreter, InterpreterStack};
use std::fs::write;
use test_case::test_case;

const COUNTER_LOOP: &str = "\
0
5 0 set_ctr
LBL top
1 +
0 ctr_dec
0
ctr_gt0?
GOTO again
drop
END
LBL again
drop
GOTO top
";

fn calculator() -> CalcInterpreter {
    let mut interp = CalcInterpreter::new();
    interp.set_quiet(true);
    interp
}

fn run_source(interp: &mut CalcInterpreter, source: &str) -> rpncalc::runtime::error::Result<()> {
    let program = Program::parse("<program>", source)?;
    run_program(interp, &program)
}

#[test]
fn lines_become_instructions() {
    let program = Program::parse("<program>", COUNTER_LOOP).unwrap();
    let ops: Vec<&Op> = program.instructions().iter().map(|i| &i.op).collect();

    assert_eq!(program.len(), 13);
    assert_eq!(ops[2], &Op::Label("top".to_string()));
    assert_eq!(ops[7], &Op::Goto("again".to_string()));
    assert_eq!(ops[9], &Op::End);
    assert!(matches!(ops[6], Op::Test { skip_target: 8, .. }));
    assert_eq!(program.label_index("again"), Some(10));
}

#[test]
fn counter_loop_terminates() {
    let mut interp = calculator();

    run_source(&mut interp, COUNTER_LOOP).unwrap();

    assert_eq!(interp.stack().items().to_vec(), vec![Value::Real(5.0)]);
    assert_eq!(interp.counters().get(0), Some(0));
    assert!(interp.take_reported_errors().is_empty());
}

#[test]
fn subroutines_return() {
    let mut interp = calculator();
    let source = "1\nGOSUB double\nGOSUB double\nEND\nLBL double\n2 *\nRTN\n";

    run_source(&mut interp, source).unwrap();

    assert_eq!(interp.stack().items().to_vec(), vec![Value::Real(4.0)]);
}

#[test_case("top_gt0?", 1.0, true ; "positive top")]
#[test_case("top_gt0?", -1.0, false ; "negative top")]
#[test_case("top_eq0?", 0.0, true ; "zero top")]
#[test_case("top_lte0?", 3.0, false ; "not less or equal")]
fn predicates_pick_the_branch(predicate: &str, top: f64, taken: bool) {
    let mut interp = calculator();
    let source = format!("{}\n{}\n\"yes\"\nEND\n", top, predicate);

    run_source(&mut interp, &source).unwrap();

    let pushed = interp.stack().len() == 2;
    assert_eq!(pushed, taken);
}

#[test]
fn missing_label_stops_the_run() {
    let mut interp = calculator();
    let error = run_source(&mut interp, "1\nGOTO nowhere\n2\n").unwrap_err();

    assert_eq!(error.kind(), ErrorKind::LabelNotFound);
    assert_eq!(interp.stack().items().to_vec(), vec![Value::Real(1.0)]);
}

#[test]
fn return_without_gosub_is_an_error() {
    let mut interp = calculator();
    let error = run_source(&mut interp, "RTN\n").unwrap_err();

    assert_eq!(error.kind(), ErrorKind::CallStackUnderflow);
}

#[test]
fn runaway_gosub_overflows() {
    let mut interp = calculator();
    let error = run_source(&mut interp, "LBL again\nGOSUB again\n").unwrap_err();

    assert_eq!(error.kind(), ErrorKind::CallStackOverflow);
}

#[test]
fn unknown_predicate_is_reported_and_false() {
    let mut interp = calculator();

    run_source(&mut interp, "1\nmaybe?\n2\n3\n").unwrap();

    let errors = interp.take_reported_errors();

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind(), ErrorKind::UnknownPredicate);
    assert_eq!(
        interp.stack().items().to_vec(),
        vec![Value::Real(1.0), Value::Real(3.0)]
    );
}

#[test]
fn programs_run_from_files() {
    let directory = std::env::temp_dir().join(format!("rpncalc_program_{}", std::process::id()));
    std::fs::create_dir_all(&directory).unwrap();

    let path = directory.join("count.txt");
    write(&path, COUNTER_LOOP).unwrap();

    let mut interp = calculator();
    interp.evaluate_input(&format!("\"{}\" run", path.to_string_lossy()));

    assert!(interp.take_reported_errors().is_empty());
    assert_eq!(interp.stack().items().to_vec(), vec![Value::Real(5.0)]);

    let _ = std::fs::remove_dir_all(&directory);
}

#[test]
fn listing_shows_every_instruction() {
    let program = Program::parse("<program>", COUNTER_LOOP).unwrap();
    let listing = pretty_print_program(&program);

    assert_eq!(listing.lines().count(), program.len() + 1);
    assert!(listing.contains("GOTO"));
}

#[test_case("1e300 0 set_ctr" ; "too large")]
#[test_case("-1e300 0 set_ctr" ; "too small")]
#[test_case("inf 0 set_ctr" ; "infinite")]
fn counters_only_take_integers_in_range(line: &str) {
    let mut interp = calculator();
    interp.evaluate_input(line);

    let errors: Vec<ErrorKind> = interp
        .take_reported_errors()
        .iter()
        .map(|error| error.kind())
        .collect();

    assert_eq!(errors, vec![ErrorKind::InvalidArgument]);
    assert_eq!(interp.counters().get(0), Some(0));
}

#[test]
fn counters_stop_at_their_limits() {
    let mut interp = calculator();
    interp.counters_mut().set(0, i64::MAX).unwrap();
    interp.evaluate_input("0 ctr_inc");

    assert_eq!(interp.take_reported_errors().len(), 1);
    assert_eq!(interp.counters().get(0), Some(i64::MAX));
}
