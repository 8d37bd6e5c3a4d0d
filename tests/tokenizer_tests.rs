use nalgebra::Complex;
use rpncalc::lang::tokenizing::{MatrixKind, Operator, Token, Tokenizer, tokenize_from_source};
use test_case::test_case;

fn tokens(source: &str) -> Vec<Token> {
    tokenize_from_source("<test>", source)
        .into_iter()
        .filter(|token| !token.is_eof())
        .collect()
}

fn single(source: &str) -> Token {
    let mut found = tokens(source);

    assert_eq!(found.len(), 1, "expected one token in {:?}, found {:?}", source, found);
    found.remove(0)
}

#[test_case("42", 42.0 ; "integer")]
#[test_case("-3.5", -3.5 ; "negative")]
#[test_case("1e3", 1000.0 ; "exponent")]
#[test_case("2.5E-1", 0.25 ; "negative exponent")]
fn numbers(source: &str, expected: f64) {
    match single(source) {
        Token::Number(_, number) => assert_eq!(number, expected),
        other => panic!("expected a number, found {:?}", other),
    }
}

#[test]
fn complex_number() {
    match single("(1.5,-2)") {
        Token::Complex(_, number) => assert_eq!(number, Complex::new(1.5, -2.0)),
        other => panic!("expected a complex number, found {:?}", other),
    }
}

#[test]
fn quoted_string() {
    match single("\"hello world\"") {
        Token::String(_, text) => assert_eq!(text, "hello world"),
        other => panic!("expected a string, found {:?}", other),
    }
}

#[test]
fn real_matrix_literal() {
    match single("[2 2 $ 1 2 3 4]") {
        Token::MatrixLiteral(_, literal) => {
            assert_eq!(literal.kind, MatrixKind::Real);
            assert_eq!((literal.rows, literal.cols), (2, 2));
            assert_eq!(
                literal.entries,
                [1.0, 2.0, 3.0, 4.0].map(|x| Complex::new(x, 0.0)).to_vec()
            );
        }
        other => panic!("expected a matrix literal, found {:?}", other),
    }
}

#[test]
fn complex_matrix_literal() {
    match single("[1 2 $ (1,1) (0,-1)]") {
        Token::MatrixLiteral(_, literal) => {
            assert_eq!(literal.kind, MatrixKind::Complex);
            assert_eq!(literal.entries[1], Complex::new(0.0, -1.0));
        }
        other => panic!("expected a matrix literal, found {:?}", other),
    }
}

#[test]
fn matrix_file_reference() {
    match single("[2,2,\"f.txt\"]") {
        Token::MatrixFileRef(_, rows, cols, file) => {
            assert_eq!((rows, cols), (2, 2));
            assert_eq!(file, "f.txt");
        }
        other => panic!("expected a matrix file reference, found {:?}", other),
    }
}

#[test]
fn functions_and_identifiers_are_told_apart() {
    let found = tokens("sin mything");

    assert!(matches!(&found[0], Token::Function(_, name) if name == "sin"));
    assert!(matches!(&found[1], Token::Identifier(_, name) if name == "mything"));
}

#[test_case("+", Operator::Plus ; "plus")]
#[test_case("-", Operator::Minus ; "minus")]
#[test_case("*", Operator::Star ; "star")]
#[test_case("/", Operator::Slash ; "slash")]
#[test_case("^", Operator::Caret ; "caret")]
#[test_case(".*", Operator::DotStar ; "dot star")]
#[test_case("./", Operator::DotSlash ; "dot slash")]
#[test_case(".^", Operator::DotCaret ; "dot caret")]
fn operators(source: &str, expected: Operator) {
    match single(source) {
        Token::Operator(_, operator) => assert_eq!(operator, expected),
        other => panic!("expected an operator, found {:?}", other),
    }
}

#[test]
fn minus_between_numbers_is_an_operator() {
    let found = tokens("3 - 4");

    assert_eq!(found.len(), 3);
    assert!(matches!(found[1], Token::Operator(_, Operator::Minus)));
}

#[test]
fn tokenizer_is_lazy_and_ends_with_eof() {
    let mut tokenizer = Tokenizer::new("<test>", "1 2");

    assert!(matches!(tokenizer.next_token(), Token::Number(_, n) if n == 1.0));
    assert!(matches!(tokenizer.next_token(), Token::Number(_, n) if n == 2.0));
    assert!(tokenizer.next_token().is_eof());
    assert!(tokenizer.next_token().is_eof());
}

#[test]
fn locations_track_columns() {
    let found = tokens("1  22");

    assert_eq!(found[1].location().line(), 1);
    assert_eq!(found[1].location().column(), 4);
}

#[test]
fn unknown_characters_are_kept() {
    let found = tokens("1 # 2");

    assert!(matches!(found[1], Token::Unknown(_, '#')));
}

#[test_case("(1,2 3", '(' ; "complex without closing paren")]
#[test_case("(1 2)", '(' ; "complex without comma")]
#[test_case("[2 2 $ 1 2 3]", '[' ; "literal with too few entries")]
#[test_case("[1 2 $ 1 2 3]", '[' ; "literal with too many entries")]
#[test_case("[2 2 1 2 3 4]", '[' ; "literal without dollar")]
#[test_case("[2,2,f.txt]", '[' ; "file reference without quotes")]
#[test_case("[2,2,\"f.txt\"", '[' ; "file reference without closing bracket")]
fn malformed_literals_fall_back_one_character(source: &str, opener: char) {
    let found = tokens(source);

    assert!(
        matches!(found[0], Token::Unknown(_, c) if c == opener),
        "expected Unknown({:?}), found {:?}",
        opener,
        found[0]
    );
    assert_eq!(found[1].location().column(), 2);
}

#[test]
fn scanning_resumes_after_a_malformed_complex() {
    let found = tokens("(1,2 3");

    assert_eq!(found.len(), 5);
    assert!(matches!(found[1], Token::Number(_, n) if n == 1.0));
    assert!(matches!(found[2], Token::Unknown(_, ',')));
    assert!(matches!(found[3], Token::Number(_, n) if n == 2.0));
    assert!(matches!(found[4], Token::Number(_, n) if n == 3.0));
}

#[test]
fn unterminated_string_runs_to_the_end() {
    match single("\"no closing quote") {
        Token::String(_, text) => assert_eq!(text, "no closing quote"),
        other => panic!("expected a string, found {:?}", other),
    }
}

#[test]
fn mixed_matrix_literal() {
    match single("[1 2 $ 1 (0,1)]") {
        Token::MatrixLiteral(_, literal) => {
            assert_eq!(literal.kind, MatrixKind::Mixed);
            assert_eq!(literal.entries, vec![Complex::new(1.0, 0.0), Complex::new(0.0, 1.0)]);
        }
        other => panic!("expected a matrix literal, found {:?}", other),
    }
}

#[test]
fn statistics_names_are_functions() {
    for name in ["npdf", "ncdf", "nquant", "gamma", "ln_gamma", "beta", "ln_beta"] {
        assert!(matches!(single(name), Token::Function(_, found) if found == name));
    }
}
