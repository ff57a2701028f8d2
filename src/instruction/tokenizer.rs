//! logos-based tokenizer for navigation URLs.
//!
//! The grammar only has seven punctuation tokens; everything between them is a
//! [`Token::Text`] run. Reserved characters inside names or parameter values
//! must be percent-encoded.

use logos::Logos;

/// Navigation URL token.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r\f]+")]
pub enum Token {
    /// `/`: parent → child.
    #[token("/")]
    Slash,

    /// `+`: sibling.
    #[token("+")]
    Plus,

    /// `(`: parameter list or segment group.
    #[token("(")]
    ParenOpen,

    /// `)`
    #[token(")")]
    ParenClose,

    /// `@`: viewport target.
    #[token("@")]
    At,

    /// `,`: parameter separator.
    #[token(",")]
    Comma,

    /// `=`: named parameter.
    #[token("=")]
    Equals,

    /// Component name, viewport name, parameter key or value, or `-`.
    #[regex(r"[^/+()@,= \t\n\r\f]+")]
    Text,
}

/// Tokenize a URL into `(Token, text)` pairs.
pub fn tokenize(input: &str) -> Vec<(Token, String)> {
    let lexer = Token::lexer(input);
    lexer
        .spanned()
        .filter_map(|(result, span)| result.ok().map(|token| (token, input[span].to_string())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        tokenize(input).into_iter().map(|(t, _)| t).collect()
    }

    #[test]
    fn punctuation() {
        assert_eq!(
            tokens("/ + ( ) @ , ="),
            vec![
                Token::Slash,
                Token::Plus,
                Token::ParenOpen,
                Token::ParenClose,
                Token::At,
                Token::Comma,
                Token::Equals,
            ]
        );
    }

    #[test]
    fn segment_with_params_and_viewport() {
        let result = tokenize("user(42,tab=info)@main");
        assert_eq!(result[0], (Token::Text, "user".into()));
        assert_eq!(result[1], (Token::ParenOpen, "(".into()));
        assert_eq!(result[2], (Token::Text, "42".into()));
        assert_eq!(result[3], (Token::Comma, ",".into()));
        assert_eq!(result[4], (Token::Text, "tab".into()));
        assert_eq!(result[5], (Token::Equals, "=".into()));
        assert_eq!(result[6], (Token::Text, "info".into()));
        assert_eq!(result[7], (Token::ParenClose, ")".into()));
        assert_eq!(result[8], (Token::At, "@".into()));
        assert_eq!(result[9], (Token::Text, "main".into()));
    }

    #[test]
    fn clear_segment() {
        let result = tokenize("-@left");
        assert_eq!(result[0], (Token::Text, "-".into()));
        assert_eq!(result[1], (Token::At, "@".into()));
        assert_eq!(result[2], (Token::Text, "left".into()));
    }

    #[test]
    fn hyphenated_names_stay_whole() {
        assert_eq!(tokenize("my-page")[0], (Token::Text, "my-page".into()));
    }

    #[test]
    fn percent_encoded_text_is_one_token() {
        assert_eq!(tokens("a%2Fb"), vec![Token::Text]);
    }

    #[test]
    fn whitespace_is_skipped() {
        assert_eq!(
            tokens(" a / b "),
            vec![Token::Text, Token::Slash, Token::Text]
        );
    }

    #[test]
    fn empty_input() {
        assert!(tokens("").is_empty());
    }
}
