use crate::{
    add_native_word,
    runtime::{
        built_ins::base_words::display_words::format_slot,
        data_structures::{registers::REGISTER_COUNT, value::ToValue},
        error::{self, script_error, ErrorKind},
        interpreter::Interpreter,
    },
};

/// The register file kept in the data directory.
pub const REGISTER_FILE_NAME: &str = "registers.txt";

/// Store a copy of a value in a register.
///
/// Signature: `index value -- `
fn word_store(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.stack().require(2)?;

    let value = interpreter.pop()?;
    let index = interpreter.pop_as_index()?;

    interpreter.registers_mut().store(index, value)
}

/// Push a copy of a register's value.
///
/// Signature: `index -- value`
fn word_recall(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let index = interpreter.pop_as_index()?;
    let value = interpreter.registers().recall(index)?;

    interpreter.push(value)
}

/// Find the first free register.
///
/// Signature: ` -- index`
fn word_first_free_register(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    match interpreter.registers().first_free() {
        Some(index) => interpreter.push(index.to_value()),
        None => script_error(
            interpreter,
            ErrorKind::InvalidArgument,
            "Every register is in use.".to_string(),
        ),
    }
}

/// Print the register occupancy and every occupied register.
///
/// Signature: ` -- `
fn word_print_registers(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let registers = interpreter.registers();
    let config = interpreter.config();
    let mut text = registers.to_string();

    for index in 0..REGISTER_COUNT {
        if let Some(value) = registers.get(index) {
            text.push_str(&format_slot(index, value, config));
            text.push('\n');
        }
    }

    print!("{}", text);
    interpreter.suppress_stack_print();

    Ok(())
}

/// Signature: ` -- `
fn word_save_registers(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let path = interpreter.data_path(REGISTER_FILE_NAME);

    interpreter.registers().save_to_file(&path)?;
    interpreter.verbose(&format!("Registers saved to {}.", path));

    Ok(())
}

/// Replace every register with the contents of the register file.
///
/// Signature: ` -- `
fn word_load_registers(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let path = interpreter.data_path(REGISTER_FILE_NAME);

    interpreter.registers_mut().load_from_file(&path)?;
    interpreter.verbose(&format!("Registers loaded from {}.", path));

    Ok(())
}

/// Signature: ` -- `
fn word_clear_registers(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.registers_mut().clear();

    Ok(())
}

/// Register the storage register words.
pub fn register_register_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(
        interpreter,
        "ffr",
        word_first_free_register,
        "Index of the first free register.",
        " -- index"
    );

    add_native_word!(
        interpreter,
        "rcl",
        word_recall,
        "Recall a register.",
        "index -- value"
    );

    add_native_word!(
        interpreter,
        "sto",
        word_store,
        "Store a value in a register.",
        "index value -- "
    );

    add_native_word!(
        interpreter,
        "pr",
        word_print_registers,
        "Print the registers.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "saveregs",
        word_save_registers,
        "Save the registers to the data directory.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "loadregs",
        word_load_registers,
        "Load the registers from the data directory.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "clregs",
        word_clear_registers,
        "Clear every register.",
        " -- "
    );
}
