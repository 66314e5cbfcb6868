use crate::error::CompileError;

#[derive(Debug, Clone, PartialEq)]
pub enum Tok {
    // Keywords
    If,
    Else,
    For,
    In,
    Let,
    True,
    False,
    Null,
    And,
    Or,

    // Symbols
    PlusAssign, // +=
    Assign,     // =
    EqEq,       // ==
    NotEq,      // !=
    Le,         // <=
    Ge,         // >=
    Lt,         // <
    Gt,         // >
    AndAnd,     // &&
    OrOr,       // ||
    Not,        // !
    Plus,       // +
    Minus,      // -
    Dot,        // .
    LParen,     // (
    RParen,     // )
    LBrace,     // {
    RBrace,     // }
    LBracket,   // [
    RBracket,   // ]
    Semi,       // ;

    // Data
    Ident(String),
    StringLit(String),
    IntLit(i64),
    FloatLit(f64),
}

/// A token plus the 1-based source-body line it was lexed from.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub tok: Tok,
    pub line: usize,
}

/// Tokenize one generated source-body line.
///
/// Lines are lexed independently so every token stays attached to the segment
/// it came from; a multi-line statement directive is still one line here, and
/// raw newlines (inside string literals or directive text) never move tokens
/// to a different line.
pub fn tokenize(line: &str, line_no: usize) -> Result<Vec<Token>, CompileError> {
    let two_char = [
        ("+=", Tok::PlusAssign),
        ("==", Tok::EqEq),
        ("!=", Tok::NotEq),
        ("<=", Tok::Le),
        (">=", Tok::Ge),
        ("&&", Tok::AndAnd),
        ("||", Tok::OrOr),
    ];
    let one_char = [
        ('=', Tok::Assign),
        ('<', Tok::Lt),
        ('>', Tok::Gt),
        ('!', Tok::Not),
        ('+', Tok::Plus),
        ('-', Tok::Minus),
        ('.', Tok::Dot),
        ('(', Tok::LParen),
        (')', Tok::RParen),
        ('{', Tok::LBrace),
        ('}', Tok::RBrace),
        ('[', Tok::LBracket),
        (']', Tok::RBracket),
        (';', Tok::Semi),
    ];

    let mut tokens = Vec::new();
    let mut rest = line;

    'outer: while !rest.trim_start().is_empty() {
        rest = rest.trim_start();
        let mut push = |tok| tokens.push(Token { tok, line: line_no });

        for (sym, tok) in &two_char {
            if let Some(after) = rest.strip_prefix(sym) {
                push(tok.clone());
                rest = after;
                continue 'outer;
            }
        }

        let first = match rest.chars().next() {
            Some(c) => c,
            None => break,
        };

        for (sym, tok) in &one_char {
            if first == *sym {
                push(tok.clone());
                rest = &rest[first.len_utf8()..];
                continue 'outer;
            }
        }

        // Strings: both quote styles, with escapes. Raw newlines are legal
        // inside a string literal.
        if first == '\'' || first == '"' {
            let quote = first;
            let mut s = String::new();
            let mut consumed = None;
            let mut chars = rest.char_indices().skip(1);
            while let Some((i, c)) = chars.next() {
                if c == quote {
                    consumed = Some(i + c.len_utf8());
                    break;
                }
                if c == '\\' {
                    match chars.next() {
                        Some((_, 'n')) => s.push('\n'),
                        Some((_, 't')) => s.push('\t'),
                        Some((_, esc)) => s.push(esc),
                        None => break,
                    }
                } else {
                    s.push(c);
                }
            }
            match consumed {
                Some(n) => {
                    push(Tok::StringLit(s));
                    rest = &rest[n..];
                    continue;
                }
                None => {
                    return Err(syntax_error(line_no, line, "unterminated string literal"));
                }
            }
        }

        // Numbers: integer, or integer '.' integer.
        if first.is_ascii_digit() {
            let mut end = rest
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(rest.len());
            let mut is_float = false;
            if rest[end..].starts_with('.')
                && rest[end + 1..].starts_with(|c: char| c.is_ascii_digit())
            {
                is_float = true;
                let frac = &rest[end + 1..];
                end += 1 + frac
                    .find(|c: char| !c.is_ascii_digit())
                    .unwrap_or(frac.len());
            }
            let text = &rest[..end];
            let tok = if is_float {
                match text.parse::<f64>() {
                    Ok(f) => Tok::FloatLit(f),
                    Err(_) => return Err(syntax_error(line_no, line, "malformed number literal")),
                }
            } else {
                match text.parse::<i64>() {
                    Ok(i) => Tok::IntLit(i),
                    Err(_) => return Err(syntax_error(line_no, line, "integer literal out of range")),
                }
            };
            push(tok);
            rest = &rest[end..];
            continue;
        }

        // Identifiers / keywords.
        if first.is_alphabetic() || first == '_' {
            let end = rest
                .find(|c: char| !c.is_alphanumeric() && c != '_')
                .unwrap_or(rest.len());
            let word = &rest[..end];
            let tok = match word {
                "if" => Tok::If,
                "else" => Tok::Else,
                "for" => Tok::For,
                "in" => Tok::In,
                "let" => Tok::Let,
                "true" => Tok::True,
                "false" => Tok::False,
                "null" => Tok::Null,
                "and" => Tok::And,
                "or" => Tok::Or,
                _ => Tok::Ident(word.to_string()),
            };
            push(tok);
            rest = &rest[end..];
            continue;
        }

        return Err(syntax_error(
            line_no,
            line,
            &format!("unexpected character `{first}`"),
        ));
    }

    Ok(tokens)
}

fn syntax_error(line: usize, source: &str, message: &str) -> CompileError {
    CompileError::Syntax {
        line,
        source_line: source.to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(line: &str) -> Vec<Tok> {
        tokenize(line, 1)
            .unwrap()
            .into_iter()
            .map(|t| t.tok)
            .collect()
    }

    #[test]
    fn append_statement() {
        assert_eq!(
            toks("__out__ += 'hi';"),
            vec![
                Tok::Ident("__out__".to_string()),
                Tok::PlusAssign,
                Tok::StringLit("hi".to_string()),
                Tok::Semi,
            ]
        );
    }

    #[test]
    fn string_escapes() {
        assert_eq!(
            toks(r"'it\'s \\ fine\n'"),
            vec![Tok::StringLit("it's \\ fine\n".to_string())]
        );
    }

    #[test]
    fn raw_newline_inside_string() {
        assert_eq!(toks("'a\nb'"), vec![Tok::StringLit("a\nb".to_string())]);
    }

    #[test]
    fn numbers() {
        assert_eq!(
            toks("1 23.5 0"),
            vec![Tok::IntLit(1), Tok::FloatLit(23.5), Tok::IntLit(0)]
        );
    }

    #[test]
    fn plus_assign_wins_over_plus() {
        assert_eq!(toks("+ +="), vec![Tok::Plus, Tok::PlusAssign]);
    }

    #[test]
    fn keywords_and_idents() {
        assert_eq!(
            toks("if elsewhere in_x let"),
            vec![
                Tok::If,
                Tok::Ident("elsewhere".to_string()),
                Tok::Ident("in_x".to_string()),
                Tok::Let,
            ]
        );
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let err = tokenize("'oops", 7).unwrap_err();
        match err {
            CompileError::Syntax { line, source_line: source, .. } => {
                assert_eq!(line, 7);
                assert_eq!(source, "'oops");
            }
            other => panic!("expected Syntax, got {other:?}"),
        }
    }

    #[test]
    fn unknown_character_is_an_error() {
        assert!(tokenize("a @ b", 1).is_err());
    }
}
