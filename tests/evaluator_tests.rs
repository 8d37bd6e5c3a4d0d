// Scenario tests for the evaluator, each runs one or more repl lines against a fresh calculator.

use nalgebra::Complex;
use rpncalc::lang::tokenizing::FUNCTION_NAMES;
use rpncalc::runtime::built_ins::base_words::constant_words::constant_value;
use rpncalc::runtime::data_structures::definitions::{Definition, DefinitionList};
use rpncalc::runtime::data_structures::value::{ComplexMatrix, RealMatrix, Value};
use rpncalc::runtime::error::ErrorKind;
use rpncalc::runtime::interpreter::calc_interpreter::CalcInterpreter;
use rpncalc::runtime::interpreter::{Interpreter, InterpreterStack, WordManagement};
use std::rc::Rc;
use test_case::test_case;

fn calculator() -> CalcInterpreter {
    let mut interp = CalcInterpreter::new();
    interp.set_quiet(true);
    interp
}

fn run_lines(interp: &mut CalcInterpreter, lines: &[&str]) -> Vec<ErrorKind> {
    for line in lines {
        interp.evaluate_input(line);
    }

    interp
        .take_reported_errors()
        .iter()
        .map(|error| error.kind())
        .collect()
}

fn eval_and_stack(lines: &[&str]) -> Vec<Value> {
    let mut interp = calculator();
    let errors = run_lines(&mut interp, lines);

    assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
    interp.stack().items().to_vec()
}

fn eval_reals(lines: &[&str]) -> Vec<f64> {
    eval_and_stack(lines)
        .into_iter()
        .map(|value| match value {
            Value::Real(number) => number,
            other => panic!("expected a real, found {:?}", other),
        })
        .collect()
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {}, found {}",
        expected,
        actual
    );
}

#[test_case("3 4 +", 7.0 ; "addition")]
#[test_case("10 4 -", 6.0 ; "subtraction")]
#[test_case("6 7 *", 42.0 ; "multiplication")]
#[test_case("9 2 /", 4.5 ; "division")]
#[test_case("2 10 ^", 1024.0 ; "power")]
#[test_case("2 3 pow", 8.0 ; "power word")]
#[test_case("2 0 /", 0.0 ; "division by zero gives the divisor")]
#[test_case("5 chs", -5.0 ; "change sign")]
#[test_case("4 inv", 0.25 ; "inverse")]
#[test_case("2.75 frac", 0.75 ; "fraction")]
#[test_case("-2.75 intg", -2.0 ; "integer part")]
#[test_case("3 4 gt", 0.0 ; "comparison")]
#[test_case("1 0 or", 1.0 ; "logic")]
#[test_case("0 not", 1.0 ; "not")]
fn scalar_results(line: &str, expected: f64) {
    let result = eval_reals(&[line]);

    assert_eq!(result.len(), 1);
    assert_close(result[0], expected);
}

#[test]
fn complex_addition() {
    let stack = eval_and_stack(&["(1,2) (3,-1) +"]);

    assert_eq!(stack, vec![Value::Complex(Complex::new(4.0, 1.0))]);
}

#[test]
fn real_and_complex_promote() {
    let stack = eval_and_stack(&["2 (0,1) *"]);

    assert_eq!(stack, vec![Value::Complex(Complex::new(0.0, 2.0))]);
}

#[test]
fn square_root_of_negative_is_complex() {
    let stack = eval_and_stack(&["-4 sqrt"]);

    match &stack[..] {
        [Value::Complex(root)] => {
            assert_close(root.re, 0.0);
            assert_close(root.im, 2.0);
        }
        other => panic!("unexpected stack {:?}", other),
    }
}

#[test]
fn split_and_join_complex() {
    let stack = eval_and_stack(&["(3,4) split_c"]);
    assert_eq!(stack, vec![Value::Real(3.0), Value::Real(4.0)]);

    let stack = eval_and_stack(&["(3,4) split_c j2r"]);
    assert_eq!(stack, vec![Value::Complex(Complex::new(3.0, 4.0))]);
}

#[test]
fn complex_parts() {
    let result = eval_reals(&["(3,4) abs", "(3,4) re", "(3,4) im"]);

    assert_eq!(result, vec![5.0, 3.0, 4.0]);
}

#[test]
fn word_definition_and_use() {
    let result = eval_reals(&[": sq dup * ;", "5 sq"]);

    assert_eq!(result, vec![25.0]);
}

#[test]
fn oldest_duplicate_word_wins() {
    let result = eval_reals(&[": f 1 ;", ": f 2 ;", "f"]);

    assert_eq!(result, vec![1.0]);
}

#[test]
fn words_can_use_other_words() {
    let result = eval_reals(&[": sq dup * ;", ": quad sq sq ;", "3 quad"]);

    assert_eq!(result, vec![81.0]);
}

#[test]
fn function_names_cannot_be_redefined() {
    let mut interp = calculator();
    let errors = run_lines(&mut interp, &[": sin 1 ;"]);

    assert_eq!(errors, vec![ErrorKind::InvalidArgument]);
    assert!(interp.words().is_empty());
}

#[test]
fn long_word_names_are_shortened_with_a_warning() {
    let mut interp = calculator();
    let errors = run_lines(&mut interp, &[": averyveryverylongname 7 ;", "averyveryverylo"]);

    assert_eq!(errors, vec![ErrorKind::InvalidArgument]);
    assert_eq!(interp.words().get(0).map(|word| word.name.as_str()), Some("averyveryverylo"));
    assert_eq!(interp.stack().items().to_vec(), vec![Value::Real(7.0)]);
}

#[test]
fn self_reference_hits_the_recursion_limit() {
    let mut interp = calculator();
    let errors = run_lines(&mut interp, &[": loop loop ;", "loop"]);

    assert!(errors.contains(&ErrorKind::RecursionLimit));
}

#[test]
fn unknown_identifier_is_reported() {
    let mut interp = calculator();
    let errors = run_lines(&mut interp, &["1 nosuchword 2"]);

    assert_eq!(errors, vec![ErrorKind::UnknownIdentifier]);
    assert_eq!(
        interp.stack().items().to_vec(),
        vec![Value::Real(1.0), Value::Real(2.0)]
    );
}

#[test]
fn macros_are_found_before_words() {
    let mut interp = calculator();
    let mut macros = DefinitionList::new();

    macros.add(Definition::new("twice", "2 *")).unwrap();
    interp.set_macros(macros);

    let errors = run_lines(&mut interp, &[": twice 3 * ;", "5 twice"]);

    assert!(errors.is_empty());
    assert_eq!(interp.stack().items().to_vec(), vec![Value::Real(10.0)]);
}

#[test]
fn matrix_literals_are_pushed() {
    let stack = eval_and_stack(&["[2 2 $ 1 2 3 4]"]);

    assert_eq!(
        stack,
        vec![Value::MatrixReal(RealMatrix::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 4.0]))]
    );
}

#[test]
fn complex_matrix_literal() {
    let stack = eval_and_stack(&["[1 2 $ (1,1) (2,0)]"]);

    assert_eq!(
        stack,
        vec![Value::MatrixComplex(ComplexMatrix::from_row_slice(
            1,
            2,
            &[Complex::new(1.0, 1.0), Complex::new(2.0, 0.0)]
        ))]
    );
}

#[test]
fn mismatched_matrices_leave_the_stack_alone() {
    let mut interp = calculator();
    let errors = run_lines(
        &mut interp,
        &["[2 2 $ 1 2 3 4] [3 3 $ 1 2 3 4 5 6 7 8 9] +"],
    );

    assert_eq!(errors, vec![ErrorKind::DimensionMismatch]);
    assert_eq!(interp.stack().len(), 2);
    assert_eq!(interp.stack().items()[0].shape(), (2, 2));
    assert_eq!(interp.stack().items()[1].shape(), (3, 3));
}

#[test]
fn string_arithmetic_is_a_type_mismatch() {
    let mut interp = calculator();
    let errors = run_lines(&mut interp, &["\"a\" 1 +"]);

    assert_eq!(errors, vec![ErrorKind::TypeMismatch]);
    assert_eq!(interp.stack().len(), 2);
}

#[test]
fn underflow_is_reported() {
    let mut interp = calculator();
    let errors = run_lines(&mut interp, &["1 +"]);

    assert_eq!(errors, vec![ErrorKind::StackUnderflow]);
    assert_eq!(interp.stack().items().to_vec(), vec![Value::Real(1.0)]);
}

#[test]
fn matrix_products() {
    let stack = eval_and_stack(&["[2 2 $ 1 2 3 4] [2 1 $ 1 1] *"]);

    assert_eq!(
        stack,
        vec![Value::MatrixReal(RealMatrix::from_row_slice(2, 1, &[3.0, 7.0]))]
    );
}

#[test]
fn matrix_inverse_and_determinant() {
    let result = eval_and_stack(&["[2 2 $ 4 7 2 6] det"]);

    match &result[..] {
        [Value::Real(det)] => assert_close(*det, 10.0),
        other => panic!("unexpected stack {:?}", other),
    }

    let mut interp = calculator();
    let errors = run_lines(&mut interp, &["[2 2 $ 1 2 2 4] minv"]);

    assert_eq!(errors, vec![ErrorKind::DecompositionFailed]);
}

#[test]
fn matrix_entries_are_zero_based() {
    let stack = eval_and_stack(&["[2 2 $ 1 2 3 4] 1 0 get_aij"]);

    assert_eq!(stack.len(), 2);
    assert_eq!(stack[1], Value::Real(3.0));
}

#[test]
fn matrix_reductions() {
    let stack = eval_and_stack(&["[2 3 $ 1 2 3 4 5 6] csum", "[2 3 $ 1 2 3 4 5 6] rmax"]);

    assert_eq!(
        stack,
        vec![
            Value::MatrixReal(RealMatrix::from_row_slice(1, 3, &[5.0, 7.0, 9.0])),
            Value::MatrixReal(RealMatrix::from_row_slice(2, 1, &[3.0, 6.0])),
        ]
    );
}

#[test]
fn row_range_and_split() {
    let result = eval_reals(&["3 rrange split_mat"]);

    assert_eq!(result, vec![0.0, 1.0, 2.0]);
}

#[test]
fn diagonal_of_non_square_matrices() {
    let stack = eval_and_stack(&["[2 3 $ 1 2 3 4 5 6] diag", "[3 2 $ 1 2 3 4 5 6] diag"]);

    assert_eq!(
        stack,
        vec![
            Value::MatrixReal(RealMatrix::from_row_slice(1, 2, &[1.0, 5.0])),
            Value::MatrixReal(RealMatrix::from_row_slice(1, 2, &[1.0, 4.0])),
        ]
    );
}

#[test_case("[1 1 $ 1] 1e19 1e19 reshape", ErrorKind::DimensionMismatch, 3 ; "reshape overflow")]
#[test_case("1e10 1e10 ones", ErrorKind::InvalidArgument, 2 ; "ones too large")]
#[test_case("1e10 1e10 randn", ErrorKind::InvalidArgument, 2 ; "randn too large")]
#[test_case("1e19 rrange", ErrorKind::InvalidArgument, 1 ; "rrange too large")]
#[test_case("5000 eye", ErrorKind::InvalidArgument, 1 ; "eye too large")]
#[test_case("[4294967295,4294967295,\"none.txt\"]", ErrorKind::MalformedLiteral, 0 ; "file ref too large")]
fn oversized_matrices_are_refused(line: &str, kind: ErrorKind, depth: usize) {
    let mut interp = calculator();
    let errors = run_lines(&mut interp, &[line]);

    assert_eq!(errors, vec![kind]);
    assert_eq!(interp.stack().len(), depth);
}

#[test_case("0 npdf", 0.398_942_280_401_432_7 ; "normal density")]
#[test_case("0 ncdf", 0.5 ; "normal distribution")]
#[test_case("0.975 nquant", 1.959_963_984_540_054 ; "normal quantile")]
#[test_case("5 gamma", 24.0 ; "gamma")]
#[test_case("10 ln_gamma", 12.801_827_480_081_469 ; "log gamma")]
#[test_case("2 3 beta", 1.0 / 12.0 ; "beta")]
#[test_case("2 3 ln_beta", -2.484_906_649_788_000_4 ; "log beta")]
fn statistics_functions(line: &str, expected: f64) {
    let result = eval_reals(&[line]);

    assert_eq!(result.len(), 1);
    assert_close(result[0], expected);
}

#[test_case("1.5 nquant", ErrorKind::InvalidArgument, 1 ; "probability above one")]
#[test_case("0 3 beta", ErrorKind::InvalidArgument, 2 ; "beta of zero")]
#[test_case("(1,1) npdf", ErrorKind::TypeMismatch, 1 ; "complex density")]
fn statistics_failures_keep_the_stack(line: &str, kind: ErrorKind, depth: usize) {
    let mut interp = calculator();
    let errors = run_lines(&mut interp, &[line]);

    assert_eq!(errors, vec![kind]);
    assert_eq!(interp.stack().len(), depth);
}

#[test]
fn statistics_map_over_real_matrices() {
    let stack = eval_and_stack(&["[1 2 $ 0 100] ncdf"]);

    match &stack[..] {
        [Value::MatrixReal(m)] => {
            assert_close(m[(0, 0)], 0.5);
            assert_close(m[(0, 1)], 1.0);
        }
        other => panic!("unexpected stack {:?}", other),
    }
}

#[test]
fn symmetric_eigenvalues_are_real() {
    let stack = eval_and_stack(&["[2 2 $ 2 0 0 3] eig"]);

    match &stack[..] {
        [Value::MatrixReal(_), Value::MatrixReal(values)] => {
            let mut diagonal: Vec<f64> = values.diagonal().iter().copied().collect();
            diagonal.sort_by(f64::total_cmp);

            assert_close(diagonal[0], 2.0);
            assert_close(diagonal[1], 3.0);
        }
        other => panic!("unexpected stack {:?}", other),
    }
}

#[test]
fn polynomial_value() {
    let result = eval_reals(&["[1 3 $ 1 -3 2] 3 pval"]);

    assert_eq!(result, vec![2.0]);
}

#[test]
fn integrate_selected_word() {
    let result = eval_reals(&[": sq dup * ;", "0 selword", "0 3 integrate"]);

    assert_eq!(result.len(), 1);
    assert!((result[0] - 9.0).abs() < 1e-6);
}

#[test]
fn find_zero_of_selected_word() {
    let result = eval_reals(&[": f dup * 2 - ;", "0 selword", "0 2 fzero"]);

    assert_eq!(result.len(), 1);
    assert!((result[0] - 2f64.sqrt()).abs() < 1e-4);
}

#[test]
fn string_words() {
    let stack = eval_and_stack(&["\"ab\" \"cd\" scon s2u srev", "\"hello\" slen"]);

    assert_eq!(
        stack,
        vec![Value::String("DCBA".to_string()), Value::Real(5.0)]
    );
}

#[test]
fn eval_runs_a_string() {
    let result = eval_reals(&["\"2 3 *\" eval"]);

    assert_eq!(result, vec![6.0]);
}

#[test]
fn date_words() {
    let stack = eval_and_stack(&[
        "\"28.02.2024\" 1 dateplus",
        "\"01.01.2024\" \"01.03.2024\" ddays",
        "\"29.02.2024\" dow",
    ]);

    assert_eq!(
        stack,
        vec![
            Value::String("29.02.2024".to_string()),
            Value::Real(60.0),
            Value::String("Thursday".to_string()),
        ]
    );
}

#[test]
fn registers_store_and_recall() {
    let stack = eval_and_stack(&["3 (1,2) sto", "3 rcl", "ffr"]);

    assert_eq!(
        stack,
        vec![Value::Complex(Complex::new(1.0, 2.0)), Value::Real(0.0)]
    );
}

#[test]
fn stack_words() {
    let result = eval_reals(&["1 2 3 roll", "swap over"]);

    assert_eq!(result, vec![2.0, 1.0, 3.0, 1.0]);
}

#[test]
fn dup_then_drop_changes_nothing() {
    let before = eval_and_stack(&["[2 2 $ 1 2 3 4] (1,2) \"s\""]);
    let after = eval_and_stack(&["[2 2 $ 1 2 3 4] (1,2) \"s\"", "dup drop"]);

    assert_eq!(before, after);
}

#[test]
fn undo_restores_the_previous_line() {
    let mut interp = calculator();
    let errors = run_lines(&mut interp, &["1 2", "+", "undo"]);

    assert!(errors.is_empty());
    assert_eq!(
        interp.stack().items().to_vec(),
        vec![Value::Real(1.0), Value::Real(2.0)]
    );
}

#[test]
fn stack_overflow_is_reported() {
    let mut interp = calculator();
    let errors = run_lines(&mut interp, &["1 98 ones split_mat"]);

    assert!(errors.is_empty());
    assert_eq!(interp.stack().len(), 98);

    let errors = run_lines(&mut interp, &["1 3 ones split_mat"]);

    assert_eq!(errors, vec![ErrorKind::StackOverflow]);
    assert_eq!(interp.stack().len(), 99);
}

fn replacement_drop(interp: &mut dyn Interpreter) -> rpncalc::runtime::error::Result<()> {
    interp.stack_mut().clear();
    Ok(())
}

#[test]
fn first_registration_wins() {
    let mut interp = calculator();

    interp.add_word(
        file!().to_string(),
        line!() as usize,
        column!() as usize,
        "drop".to_string(),
        Rc::new(replacement_drop),
        "Replacement.".to_string(),
        " -- ".to_string(),
    );

    let errors = run_lines(&mut interp, &["1 2 drop"]);

    assert!(errors.is_empty());
    assert_eq!(interp.stack().items().to_vec(), vec![Value::Real(1.0)]);
}

#[test]
fn operators_and_stack_words_are_checked() {
    let interp = calculator();
    let checked = |name: &str| {
        let word = interp.find_word(name).unwrap();
        interp.word_handler_info(word.handler_index).unwrap().is_checked()
    };

    assert!(checked("+"));
    assert!(checked(".^"));
    assert!(checked("dup"));
    assert!(!checked("minv"));
}

#[test]
fn checked_operators_keep_their_operands_on_failure() {
    let mut interp = calculator();
    let errors = run_lines(&mut interp, &["[2 2 $ 1 2 3 4] \"x\" ^", "[2 3 $ 1 2 3 4 5 6] 2 ^"]);

    assert_eq!(errors, vec![ErrorKind::TypeMismatch, ErrorKind::DimensionMismatch]);
    assert_eq!(interp.stack().len(), 4);
    assert_eq!(interp.stack().items()[1], Value::String("x".to_string()));
    assert_eq!(interp.stack().items()[3], Value::Real(2.0));
}

#[test]
fn every_function_name_has_a_meaning() {
    let interp = calculator();

    for name in FUNCTION_NAMES.iter() {
        let meta = matches!(*name, "eval" | "batch" | "run");
        let known = meta
            || constant_value(name).is_some()
            || interp.dictionary().try_get(name).is_some();

        assert!(known, "function {} has no implementation", name);
    }
}
