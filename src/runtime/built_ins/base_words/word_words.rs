use crate::{
    add_native_word,
    runtime::{
        error::{self, script_error, ErrorKind},
        interpreter::Interpreter,
    },
};

/// The user word file kept in the data directory.
pub const USER_WORDS_FILE_NAME: &str = "user_words.txt";

/// Signature: ` -- `
fn word_list_macros(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    print!("{}", interpreter.macros());
    interpreter.suppress_stack_print();

    Ok(())
}

/// List the user words with their index.  The selected word is the one `integrate` and `fzero`
/// use.
///
/// Signature: ` -- `
fn word_list_words(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let words = interpreter.words();

    if words.is_empty() {
        println!("No user words are defined.");
    } else {
        print!("{}", words);
        println!("Selected function: {}", interpreter.config().selected_function);
    }

    interpreter.suppress_stack_print();
    Ok(())
}

/// Replace the user words with the contents of the user word file.
///
/// Signature: ` -- `
fn word_load_words(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let path = interpreter.data_path(USER_WORDS_FILE_NAME);

    interpreter.words_mut().load_from_file(&path)?;
    interpreter.verbose(&format!("User words loaded from {}.", path));

    Ok(())
}

/// Signature: ` -- `
fn word_save_words(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let path = interpreter.data_path(USER_WORDS_FILE_NAME);

    interpreter.words().save_to_file(&path)?;
    interpreter.verbose(&format!("User words saved to {}.", path));

    Ok(())
}

/// Signature: ` -- `
fn word_clear_words(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.words_mut().clear();
    interpreter.config_mut().selected_function = 0;

    Ok(())
}

fn pop_word_index(interpreter: &mut dyn Interpreter, name: &str) -> error::Result<usize> {
    let index = interpreter.pop_as_index()?;

    if index >= interpreter.words().len() {
        return script_error(
            interpreter,
            ErrorKind::InvalidArgument,
            format!(
                "{}: there is no user word {}, {} are defined.",
                name,
                index,
                interpreter.words().len()
            ),
        );
    }

    Ok(index)
}

/// Select the user word that `integrate` and `fzero` evaluate.
///
/// Signature: `index -- `
fn word_select_word(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let index = pop_word_index(interpreter, "selword")?;

    interpreter.config_mut().selected_function = index;
    Ok(())
}

/// Delete a user word.  Later words move up one place, and the selection follows the word it
/// pointed at where it can.
///
/// Signature: `index -- `
fn word_delete_word(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let index = pop_word_index(interpreter, "delword")?;
    let removed = interpreter.words_mut().remove(index)?;
    let selected = interpreter.config().selected_function;

    if selected > index {
        interpreter.config_mut().selected_function = selected - 1;
    } else if selected == index {
        interpreter.config_mut().selected_function = 0;
    }

    interpreter.verbose(&format!("Deleted word {}.", removed.name));
    Ok(())
}

/// Register the user word management words.
pub fn register_word_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(
        interpreter,
        "listmacros",
        word_list_macros,
        "List the predefined macros.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "listwords",
        word_list_words,
        "List the user words.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "loadwords",
        word_load_words,
        "Load the user words from the data directory.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "savewords",
        word_save_words,
        "Save the user words to the data directory.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "clrwords",
        word_clear_words,
        "Delete every user word.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "selword",
        word_select_word,
        "Select the word used by integrate and fzero.",
        "index -- "
    );

    add_native_word!(
        interpreter,
        "delword",
        word_delete_word,
        "Delete a user word.",
        "index -- "
    );
}
