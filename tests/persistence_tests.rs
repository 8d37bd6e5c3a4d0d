use nalgebra::Complex;
use rpncalc::runtime::data_structures::config::Config;
use rpncalc::runtime::data_structures::definitions::{Definition, DefinitionList};
use rpncalc::runtime::data_structures::registers::Registers;
use rpncalc::runtime::data_structures::value::{ComplexMatrix, RealMatrix, Value};
use rpncalc::runtime::interpreter::calc_interpreter::CalcInterpreter;
use rpncalc::runtime::interpreter::{Interpreter, InterpreterStack, WordManagement};
use std::path::PathBuf;

/// A scratch directory unique to one test.
fn scratch_directory(name: &str) -> PathBuf {
    let directory = std::env::temp_dir().join(format!("rpncalc_{}_{}", name, std::process::id()));

    std::fs::create_dir_all(&directory).unwrap();
    directory
}

fn calculator_in(directory: &PathBuf) -> CalcInterpreter {
    let mut config = Config::default();
    config.path_to_data_and_programs = directory.to_string_lossy().to_string();

    let mut interp = CalcInterpreter::with_config(config);
    interp.set_quiet(true);
    interp
}

#[test]
fn registers_survive_a_file_round_trip() {
    let directory = scratch_directory("registers");
    let path = directory.join("registers.txt").to_string_lossy().to_string();

    let mut registers = Registers::new();

    registers.store(0, Value::Real(-1.5)).unwrap();
    registers.store(5, Value::Complex(Complex::new(2.0, -3.0))).unwrap();
    registers.store(7, Value::String("hello world".to_string())).unwrap();
    registers
        .store(9, Value::MatrixReal(RealMatrix::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 4.0])))
        .unwrap();
    registers
        .store(
            63,
            Value::MatrixComplex(ComplexMatrix::from_row_slice(
                1,
                2,
                &[Complex::new(1.0, 1.0), Complex::new(0.0, -2.0)],
            )),
        )
        .unwrap();

    registers.save_to_file(&path).unwrap();

    let mut loaded = Registers::new();
    loaded.load_from_file(&path).unwrap();

    assert_eq!(loaded, registers);

    let _ = std::fs::remove_dir_all(&directory);
}

#[test]
fn register_index_is_checked() {
    let mut registers = Registers::new();

    assert!(registers.store(64, Value::Real(1.0)).is_err());
    assert!(registers.recall(3).is_err());
}

#[test]
fn words_survive_a_file_round_trip() {
    let directory = scratch_directory("words");
    let path = directory.join("user_words.txt").to_string_lossy().to_string();

    let mut words = DefinitionList::new();
    words.add(Definition::new("sq", "dup *")).unwrap();
    words.add(Definition::new("hyp", "sq swap sq + sqrt")).unwrap();
    words.save_to_file(&path).unwrap();

    let mut loaded = DefinitionList::new();
    loaded.load_from_file(&path).unwrap();

    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded.get(1), Some(&Definition::new("hyp", "sq swap sq + sqrt")));

    let _ = std::fs::remove_dir_all(&directory);
}

#[test]
fn config_survives_a_file_round_trip() {
    let directory = scratch_directory("config");
    let path = directory.join("config.txt").to_string_lossy().to_string();

    let mut config = Config::default();
    config.print_precision = 9;
    config.verbose_mode = true;
    config.recursion_limit = 32;
    config.integration_tolerance = 1e-7;
    config.save_to_file(&path).unwrap();

    let mut loaded = Config::default();
    loaded.load_from_file(&path).unwrap();

    assert_eq!(loaded, config);

    let _ = std::fs::remove_dir_all(&directory);
}

#[test]
fn register_words_use_the_data_directory() {
    let directory = scratch_directory("saveregs");
    let mut interp = calculator_in(&directory);

    for line in ["1 (2,3) sto", "saveregs", "clregs", "loadregs", "1 rcl"] {
        interp.evaluate_input(line);
    }

    assert!(interp.take_reported_errors().is_empty());
    assert!(directory.join("registers.txt").is_file());
    assert_eq!(
        interp.stack().items().to_vec(),
        vec![Value::Complex(Complex::new(2.0, 3.0))]
    );

    let _ = std::fs::remove_dir_all(&directory);
}

#[test]
fn word_words_use_the_data_directory() {
    let directory = scratch_directory("savewords");
    let mut interp = calculator_in(&directory);

    for line in [": sq dup * ;", "savewords", "clrwords", "loadwords", "4 sq"] {
        interp.evaluate_input(line);
    }

    assert!(interp.take_reported_errors().is_empty());
    assert_eq!(interp.words().len(), 1);
    assert_eq!(interp.stack().items().to_vec(), vec![Value::Real(16.0)]);

    let _ = std::fs::remove_dir_all(&directory);
}

#[test]
fn matrix_file_references_load_row_by_row() {
    let directory = scratch_directory("matrix");
    std::fs::write(directory.join("m.txt"), "1 2\n3 4\n").unwrap();

    let mut interp = calculator_in(&directory);
    interp.evaluate_input("[2,2,\"m.txt\"]");

    assert!(interp.take_reported_errors().is_empty());
    assert_eq!(
        interp.stack().items().to_vec(),
        vec![Value::MatrixReal(RealMatrix::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 4.0]))]
    );

    let _ = std::fs::remove_dir_all(&directory);
}

#[test]
fn batch_files_run_line_by_line() {
    let directory = scratch_directory("batch");
    std::fs::write(directory.join("b.txt"), "1 2 +\nnosuchword\n10 *\n").unwrap();

    let mut interp = calculator_in(&directory);
    interp.evaluate_input("\"b.txt\" batch");

    let errors = interp.take_reported_errors();

    assert_eq!(errors.len(), 1);
    assert_eq!(interp.stack().items().to_vec(), vec![Value::Real(30.0)]);
    assert!(interp.take_stack_print_suppressed());

    let _ = std::fs::remove_dir_all(&directory);
}
