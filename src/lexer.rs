use thiserror::Error;

use crate::token::{Span, Token, TokenKind};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LexError {
    #[error("Unexpected character '{character}' at position {position}")]
    UnexpectedCharacter { character: char, position: usize },
    #[error("Invalid integer literal '{literal}' at position {position}")]
    InvalidIntegerLiteral { literal: String, position: usize },
}

pub type LexResult<T> = Result<T, LexError>;

pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    pub fn next_token(&mut self) -> LexResult<Token<'a>> {
        self.skip_whitespace();

        let start = self.current_index();
        let Some(ch) = self.peek_char() else {
            return Ok(Token::new(TokenKind::EOF, Span { start, end: start }));
        };

        if let Some(token) = self.try_consume_operator(ch, start) {
            return Ok(token);
        }

        match ch {
            c if c.is_alphabetic() || c == '_' => Ok(self.read_identifier(start)),
            c if c.is_ascii_digit() => self.read_integer(start),
            _ => Err(LexError::UnexpectedCharacter {
                character: ch,
                position: start,
            }),
        }
    }

    fn try_consume_operator(&mut self, ch: char, start: usize) -> Option<Token<'a>> {
        // Two-character operators first: `==` and `!=` share a prefix with
        // `=` (invalid on its own) and `!`.
        let (kind, length) = match ch {
            '=' if self.char_at(start + 1) == Some('=') => (TokenKind::Eq, 2),
            '!' if self.char_at(start + 1) == Some('=') => (TokenKind::NotEq, 2),
            '!' => (TokenKind::Bang, 1),
            '+' => (TokenKind::Plus, 1),
            '-' => (TokenKind::Minus, 1),
            '*' => (TokenKind::Asterisk, 1),
            '/' => (TokenKind::Slash, 1),
            '<' => (TokenKind::Less, 1),
            '>' => (TokenKind::Greater, 1),
            ';' => (TokenKind::Semicolon, 1),
            '(' => (TokenKind::LParen, 1),
            ')' => (TokenKind::RParen, 1),
            '{' => (TokenKind::LBrace, 1),
            '}' => (TokenKind::RBrace, 1),
            _ => return None,
        };

        for _ in 0..length {
            self.consume_char();
        }
        Some(Token::new(
            kind,
            Span {
                start,
                end: start + length,
            },
        ))
    }

    fn read_identifier(&mut self, start: usize) -> Token<'a> {
        self.consume_while(|c| c.is_alphanumeric() || c == '_');
        let end_idx = self.current_index();

        let ident = &self.input[start..end_idx];
        let kind = match ident {
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "return" => TokenKind::Return,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            _ => TokenKind::Identifier(ident),
        };
        Token::new(
            kind,
            Span {
                start,
                end: end_idx,
            },
        )
    }

    fn read_integer(&mut self, start: usize) -> LexResult<Token<'a>> {
        self.consume_while(|c| c.is_ascii_digit());
        let end_idx = self.current_index();

        let num_str = &self.input[start..end_idx];
        let num = num_str
            .parse::<i64>()
            .map_err(|_| LexError::InvalidIntegerLiteral {
                literal: num_str.to_string(),
                position: start,
            })?;
        Ok(Token::new(
            TokenKind::Integer(num),
            Span {
                start,
                end: end_idx,
            },
        ))
    }

    fn skip_whitespace(&mut self) {
        self.consume_while(|c| c.is_ascii_whitespace());
    }

    fn consume_while<P>(&mut self, keep_predicate: P) -> usize
    where
        P: Fn(char) -> bool,
    {
        let start = self.pos;
        while let Some(c) = self.peek_char() {
            if !keep_predicate(c) {
                break;
            }
            self.consume_char();
        }
        self.pos - start
    }

    fn char_at(&self, index: usize) -> Option<char> {
        if index >= self.input.len() {
            None
        } else {
            self.input[index..].chars().next()
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.char_at(self.pos)
    }

    fn consume_char(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn current_index(&self) -> usize {
        self.pos
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = LexResult<Token<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_token() {
            Ok(token) => Some(Ok(token)),
            Err(e) => Some(Err(e)),
        }
    }
}

pub fn tokenize<'a>(input: &'a str) -> LexResult<Vec<Token<'a>>> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let is_eof = matches!(token.kind, TokenKind::EOF);
        tokens.push(token);
        if is_eof {
            break;
        }
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind<'_>> {
        tokenize(input)
            .expect("tokenize should succeed")
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    #[test]
    fn tokenizes_operators_and_literals() {
        let actual = kinds("5 + 10 * 2 - 15 / 3;");
        let expected = vec![
            TokenKind::Integer(5),
            TokenKind::Plus,
            TokenKind::Integer(10),
            TokenKind::Asterisk,
            TokenKind::Integer(2),
            TokenKind::Minus,
            TokenKind::Integer(15),
            TokenKind::Slash,
            TokenKind::Integer(3),
            TokenKind::Semicolon,
            TokenKind::EOF,
        ];
        assert_eq!(actual, expected);
    }

    #[test]
    fn tokenizes_two_character_operators() {
        let actual = kinds("1 == 2; 1 != 2; !true");
        let expected = vec![
            TokenKind::Integer(1),
            TokenKind::Eq,
            TokenKind::Integer(2),
            TokenKind::Semicolon,
            TokenKind::Integer(1),
            TokenKind::NotEq,
            TokenKind::Integer(2),
            TokenKind::Semicolon,
            TokenKind::Bang,
            TokenKind::True,
            TokenKind::EOF,
        ];
        assert_eq!(actual, expected);
    }

    #[test]
    fn tokenizes_conditional_keywords_and_delimiters() {
        let actual = kinds("if (1 < 2) { 10 } else { 20 }");
        let expected = vec![
            TokenKind::If,
            TokenKind::LParen,
            TokenKind::Integer(1),
            TokenKind::Less,
            TokenKind::Integer(2),
            TokenKind::RParen,
            TokenKind::LBrace,
            TokenKind::Integer(10),
            TokenKind::RBrace,
            TokenKind::Else,
            TokenKind::LBrace,
            TokenKind::Integer(20),
            TokenKind::RBrace,
            TokenKind::EOF,
        ];
        assert_eq!(actual, expected);
    }

    #[test]
    fn tokenizes_return_statement() {
        let actual = kinds("return 2 * 5;");
        let expected = vec![
            TokenKind::Return,
            TokenKind::Integer(2),
            TokenKind::Asterisk,
            TokenKind::Integer(5),
            TokenKind::Semicolon,
            TokenKind::EOF,
        ];
        assert_eq!(actual, expected);
    }

    #[test]
    fn keeps_unknown_words_as_identifiers() {
        let actual = kinds("foobar");
        assert_eq!(
            actual,
            vec![TokenKind::Identifier("foobar"), TokenKind::EOF]
        );
    }

    #[test]
    fn errors_on_invalid_character() {
        let err = tokenize("1 @ 2").expect_err("expected lexing failure");
        assert_eq!(
            err,
            LexError::UnexpectedCharacter {
                character: '@',
                position: 2
            }
        );
    }

    #[test]
    fn errors_on_bare_assignment_operator() {
        let err = tokenize("1 = 2").expect_err("expected lexing failure");
        assert_eq!(
            err,
            LexError::UnexpectedCharacter {
                character: '=',
                position: 2
            }
        );
    }

    #[test]
    fn errors_on_integer_overflow() {
        let err = tokenize("99999999999999999999999999").expect_err("expected overflow");
        assert!(err.to_string().contains("Invalid integer literal"));
    }
}
