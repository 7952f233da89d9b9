use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A name, possibly dotted (`user.name` is one token).
    Ident(String),
    Number(f64),
    Str(String),
    Op(char),
    LParen,
    RParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(name) => f.write_str(name),
            Token::Number(n) => write!(f, "{n}"),
            Token::Str(s) => write!(f, "{s:?}"),
            Token::Op(c) => write!(f, "{c}"),
            Token::LParen => f.write_str("("),
            Token::RParen => f.write_str(")"),
        }
    }
}

/// Splits `src` into tokens. Never fails: bytes that start no token are
/// skipped, and an unterminated string runs to the end of input.
pub fn tokenize(src: &str) -> Vec<Token> {
    let chars: Vec<char> = src.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '.')
                {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            c if c.is_ascii_digit() => {
                let start = i;
                let mut seen_dot = false;
                while i < chars.len() {
                    match chars[i] {
                        d if d.is_ascii_digit() => i += 1,
                        '.' if !seen_dot => {
                            seen_dot = true;
                            i += 1;
                        }
                        _ => break,
                    }
                }
                let text: String = chars[start..i].iter().collect();
                // "12." parses fine as f64
                tokens.push(Token::Number(text.parse().unwrap_or_default()));
            }
            '"' | '\'' => {
                let quote = c;
                let start = i + 1;
                i = start;
                while i < chars.len() && chars[i] != quote {
                    i += 1;
                }
                tokens.push(Token::Str(chars[start..i].iter().collect()));
                // skip the closing quote when present
                i += 1;
            }
            '+' | '-' | '*' | '/' => {
                tokens.push(Token::Op(c));
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            _ => i += 1,
        }
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotted_paths_are_single_identifiers() {
        assert_eq!(
            tokenize("user.name+_x1"),
            vec![
                Token::Ident("user.name".into()),
                Token::Op('+'),
                Token::Ident("_x1".into()),
            ]
        );
    }

    #[test]
    fn numbers_take_one_decimal_point() {
        assert_eq!(
            tokenize("3.25 1.2.5"),
            vec![Token::Number(3.25), Token::Number(1.2), Token::Number(5.0)]
        );
    }

    #[test]
    fn strings_use_matching_quotes() {
        assert_eq!(
            tokenize(r#"'it"s' + "x'y""#),
            vec![
                Token::Str("it\"s".into()),
                Token::Op('+'),
                Token::Str("x'y".into()),
            ]
        );
        assert_eq!(tokenize("'open"), vec![Token::Str("open".into())]);
    }

    #[test]
    fn unknown_bytes_are_skipped() {
        assert_eq!(
            tokenize("a % b # ? 2"),
            vec![
                Token::Ident("a".into()),
                Token::Ident("b".into()),
                Token::Number(2.0)
            ]
        );
    }
}
