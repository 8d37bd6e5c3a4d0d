/// The core words of the calculator.
pub mod base_words;

/// Calendar words.
pub mod date_words;

use crate::runtime::{
    built_ins::{
        base_words::{
            arithmetic_words::register_arithmetic_words,
            calculus_words::register_calculus_words,
            comparison_words::register_comparison_words,
            counter_words::register_counter_words,
            display_words::register_display_words,
            math_words::{
                register_complex_part_words, register_rounding_words, register_unary_math_words,
            },
            matrix_words::{register_matrix_words, register_reduction_words},
            register_words::register_register_words,
            stack_words::register_stack_words,
            statistics_words::register_statistics_words,
            string_words::register_string_words,
            word_words::register_word_words,
        },
        date_words::register_date_words,
    },
    interpreter::Interpreter,
};

/// Register every built-in word.  The dictionary keeps the first registration of a name, so this
/// order decides which family owns a name registered twice.
pub fn register_builtin_words(interpreter: &mut dyn Interpreter) {
    register_display_words(interpreter);
    register_date_words(interpreter);
    register_stack_words(interpreter);
    register_arithmetic_words(interpreter);
    register_calculus_words(interpreter);
    register_comparison_words(interpreter);
    register_rounding_words(interpreter);
    register_register_words(interpreter);
    register_string_words(interpreter);
    register_word_words(interpreter);
    register_matrix_words(interpreter);
    register_unary_math_words(interpreter);
    register_complex_part_words(interpreter);
    register_statistics_words(interpreter);
    register_reduction_words(interpreter);
    register_counter_words(interpreter);
}
