use super::*;

fn lex(source: &str) -> Vec<Token> {
    Token::lexer(source).filter_map(|t| t.ok()).collect()
}

#[test]
fn test_keywords_are_case_insensitive() {
    assert_eq!(
        lex("IF a THEN goto 1 End"),
        vec![
            Token::KwIf,
            Token::Identifier,
            Token::KwThen,
            Token::KwGoto,
            Token::Number,
            Token::KwEnd
        ]
    );
}

#[test]
fn test_keyword_prefix_is_identifier() {
    assert_eq!(lex("iffy ended"), vec![Token::Identifier, Token::Identifier]);
}

#[test]
fn test_globals_and_numbers() {
    assert_eq!(
        lex(":out=12.5"),
        vec![Token::GlobalIdentifier, Token::Eq, Token::Number]
    );
}

#[test]
fn test_compound_operators() {
    assert_eq!(
        lex("a+=1 b-- c!=d e<=f"),
        vec![
            Token::Identifier,
            Token::PlusEq,
            Token::Number,
            Token::Identifier,
            Token::MinusMinus,
            Token::Identifier,
            Token::NotEq,
            Token::Identifier,
            Token::Identifier,
            Token::LtEq,
            Token::Identifier,
        ]
    );
}

#[test]
fn test_comment_and_division() {
    assert_eq!(
        lex("a=b/c // done"),
        vec![
            Token::Identifier,
            Token::Eq,
            Token::Identifier,
            Token::Slash,
            Token::Identifier,
            Token::Comment
        ]
    );
}

#[test]
fn test_strings_keep_contents() {
    let mut lexer = Token::lexer("\"if then\"");
    assert_eq!(lexer.next(), Some(Ok(Token::String)));
    assert_eq!(lexer.slice(), "\"if then\"");
}

#[test]
fn test_nolol_keyword_classification() {
    assert!(Token::KwWhile.is_nolol_keyword());
    assert!(!Token::KwIf.is_nolol_keyword());
    assert!(Token::KwAtan.is_keyword_function());
    assert!(Token::CaretEq.is_assignment());
}
