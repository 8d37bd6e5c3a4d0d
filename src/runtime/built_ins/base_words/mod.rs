/// Named constants, pushed when their name is evaluated.
pub mod constant_words;

/// Stack printing and print settings.
pub mod display_words;

/// Words that manipulate the data stack.
pub mod stack_words;

/// The binary arithmetic operators and their promotion rules.
pub mod arithmetic_words;

/// Polynomials, integration and root finding.
pub mod calculus_words;

/// Comparison and logic, results are 1 or 0.
pub mod comparison_words;

/// Elementwise math on numbers and matrices.
pub mod math_words;

/// The storage registers.
pub mod register_words;

/// Words that work with strings.
pub mod string_words;

/// Words that work with the user's words and the macros.
pub mod word_words;

/// Matrix construction, decomposition and reduction.
pub mod matrix_words;

/// The normal distribution and the gamma and beta functions.
pub mod statistics_words;

/// The program machine's counters.
pub mod counter_words;
