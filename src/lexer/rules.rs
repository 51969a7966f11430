//! The ordered rule table driving the lexer.
//!
//! Rules are tried in order at every offset and the first one that matches wins,
//! so a multi-character operator has to be listed before any operator that is a
//! prefix of it, and the hexadecimal rule before the decimal ones.

use std::sync::OnceLock;

use lazy_regex::{regex, Regex};

use super::token::{Keyword, Operator, Token};

pub(super) enum Matcher {
    /// An anchored regular expression.
    Pattern(&'static Regex),
    Literal(&'static str),
    /// Returns the byte length of the match at the start of the input.
    Scan(fn(&str) -> Option<usize>),
}

impl Matcher {
    pub(super) fn match_len(&self, rest: &str) -> Option<usize> {
        match self {
            Matcher::Pattern(regex) => regex.find(rest).map(|m| m.end()),
            Matcher::Literal(literal) => rest.starts_with(literal).then_some(literal.len()),
            Matcher::Scan(scan) => scan(rest),
        }
        .filter(|len| *len > 0)
    }
}

pub(super) enum Action {
    Ignore,
    Emit(Token),
    /// Builds the token from the matched lexeme, `None` rejects the lexeme.
    Derive(fn(&str) -> Option<Token>),
}

pub(super) struct Rule {
    pub matcher: Matcher,
    pub action: Action,
}

impl Rule {
    fn ignore(matcher: Matcher) -> Self {
        Self {
            matcher,
            action: Action::Ignore,
        }
    }

    fn derive(matcher: Matcher, derive: fn(&str) -> Option<Token>) -> Self {
        Self {
            matcher,
            action: Action::Derive(derive),
        }
    }

    fn operator(literal: &'static str, operator: Operator) -> Self {
        Self {
            matcher: Matcher::Literal(literal),
            action: Action::Emit(Token::Operator(operator)),
        }
    }
}

static RULES: OnceLock<Vec<Rule>> = OnceLock::new();

pub(super) fn rules() -> &'static [Rule] {
    RULES.get_or_init(build_rules)
}

fn build_rules() -> Vec<Rule> {
    use Operator::*;

    vec![
        Rule::ignore(Matcher::Pattern(regex!(r"^\s+"))),
        Rule::derive(Matcher::Pattern(regex!(r"^0[xX][0-9a-fA-F]+")), hex_number),
        Rule::derive(Matcher::Pattern(regex!(r"^[a-zA-Z_]\w*")), identifier),
        Rule::derive(Matcher::Pattern(regex!(r"^\d+\.?\d*[eE][+-]?\d+")), number),
        Rule::derive(Matcher::Pattern(regex!(r"^\d+\.?\d*")), number),
        Rule::derive(Matcher::Pattern(regex!(r#"^"(?:[^"\\\n]|\\\r\n|\\(?s:.))*""#)), quoted_string),
        Rule::derive(Matcher::Pattern(regex!(r#"^'(?:[^'\\\n]|\\\r\n|\\(?s:.))*'"#)), quoted_string),
        Rule::ignore(Matcher::Scan(long_comment)),
        Rule::ignore(Matcher::Pattern(regex!(r"^--[^\n]*"))),
        Rule::derive(Matcher::Scan(long_bracket), long_string),
        Rule::operator("::", DoubleColon),
        Rule::operator(":", Colon),
        Rule::operator("?", Optional),
        Rule::operator("==", DoubleEqual),
        Rule::operator("~=", NotEqual),
        Rule::operator("<=", LessThanEqual),
        Rule::operator(">=", GreaterThanEqual),
        Rule::operator("...", VarArg),
        Rule::operator("..", Concatenate),
        Rule::operator("+=", PlusEqual),
        Rule::operator("-=", MinusEqual),
        Rule::operator("*=", MultiplyEqual),
        Rule::operator("/=", DivideEqual),
        Rule::operator("%=", ModulusEqual),
        Rule::operator("^=", ExponentEqual),
        Rule::operator("=", Equal),
        Rule::operator("+", Plus),
        Rule::operator("*", Multiply),
        Rule::operator("-", Minus),
        Rule::operator("#", Hash),
        Rule::operator("/", Divide),
        Rule::operator("%", Modulus),
        Rule::operator("^", Exponent),
        Rule::operator(">", GreaterThan),
        Rule::operator("<", LessThan),
        Rule::operator(".", Dot),
        Rule::operator("[", SquareBracketLeft),
        Rule::operator("]", SquareBracketRight),
        Rule::operator("(", RoundBracketLeft),
        Rule::operator(")", RoundBracketRight),
        Rule::operator("{", CurlyBracketLeft),
        Rule::operator("}", CurlyBracketRight),
        Rule::operator(",", Comma),
        Rule::operator(";", Semicolon),
    ]
}

/// `[==[ ... ]==]` where the closing bracket repeats the exact `=` run of the opening one.
fn long_bracket(rest: &str) -> Option<usize> {
    let after_open = rest.strip_prefix('[')?;
    let level = after_open.bytes().take_while(|b| *b == b'=').count();
    let body = after_open[level..].strip_prefix('[')?;
    let close = format!("]{}]", "=".repeat(level));
    let body_len = body.find(&close)?;
    Some(level + 2 + body_len + close.len())
}

fn long_comment(rest: &str) -> Option<usize> {
    let bracket = rest.strip_prefix("--")?;
    long_bracket(bracket).map(|len| len + 2)
}

/// Digits past 64 bits keep scaling the value instead of failing.
fn hex_number(lexeme: &str) -> Option<Token> {
    lexeme[2..]
        .chars()
        .try_fold(0.0, |value: f64, digit| {
            digit.to_digit(16).map(|d| value * 16.0 + f64::from(d))
        })
        .map(Token::Number)
}

fn number(lexeme: &str) -> Option<Token> {
    lexeme.parse().ok().map(Token::Number)
}

fn identifier(lexeme: &str) -> Option<Token> {
    Some(match Keyword::from_identifier(lexeme) {
        Some(keyword) => Token::Keyword(keyword),
        None => Token::Identifier(lexeme.to_owned()),
    })
}

fn quoted_string(lexeme: &str) -> Option<Token> {
    unescape(&lexeme[1..lexeme.len() - 1]).map(Token::String)
}

fn long_string(lexeme: &str) -> Option<Token> {
    let level = lexeme[1..].bytes().take_while(|b| *b == b'=').count();
    let body = &lexeme[level + 2..lexeme.len() - level - 2];
    let body = body
        .strip_prefix("\r\n")
        .or_else(|| body.strip_prefix('\n'))
        .unwrap_or(body);
    Some(Token::String(body.to_owned()))
}

fn unescape(body: &str) -> Option<String> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            'n' | '\n' => out.push('\n'),
            '\r' => {
                chars.next_if_eq(&'\n');
                out.push('\n');
            }
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'a' => out.push('\x07'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0C'),
            'v' => out.push('\x0B'),
            '\\' => out.push('\\'),
            '"' => out.push('"'),
            '\'' => out.push('\''),
            'x' => {
                let hex: String = [chars.next()?, chars.next()?].iter().collect();
                out.push(char::from(u8::from_str_radix(&hex, 16).ok()?));
            }
            'z' => {
                while chars.next_if(|c| c.is_whitespace()).is_some() {}
            }
            digit @ '0'..='9' => {
                let mut value = digit.to_digit(10)?;
                for _ in 0..2 {
                    match chars.next_if(char::is_ascii_digit) {
                        Some(d) => value = value * 10 + d.to_digit(10)?,
                        None => break,
                    }
                }
                out.push(char::from(u8::try_from(value).ok()?));
            }
            _ => return None,
        }
    }
    Some(out)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn long_bracket_requires_matching_level() {
        assert_eq!(long_bracket("[[abc]]"), Some(7));
        assert_eq!(long_bracket("[==[a]]b]==] rest"), Some(12));
        assert_eq!(long_bracket("[==[abc]=]"), None);
        assert_eq!(long_bracket("[=abc"), None);
    }

    #[test]
    fn escapes() {
        assert_eq!(unescape(r"a\tb\n").as_deref(), Some("a\tb\n"));
        assert_eq!(unescape(r"\65\x42\\").as_deref(), Some("AB\\"));
        assert_eq!(unescape("a\\z   \n  b").as_deref(), Some("ab"));
        assert_eq!(unescape("a\\\r\nb").as_deref(), Some("a\nb"));
        assert_eq!(unescape("a\\\rb").as_deref(), Some("a\nb"));
        assert_eq!(unescape(r"\q"), None);
        assert_eq!(unescape(r"\300"), None);
    }

    #[test]
    fn wide_hex_literals() {
        assert_eq!(hex_number("0xff"), Some(Token::Number(255.0)));
        assert_eq!(
            hex_number("0x10000000000000000"),
            Some(Token::Number(18446744073709551616.0))
        );
    }

    #[test]
    fn operators_are_listed_before_their_prefixes() {
        let literals: Vec<&str> = rules()
            .iter()
            .filter_map(|rule| match rule.matcher {
                Matcher::Literal(literal) => Some(literal),
                _ => None,
            })
            .collect();
        for (i, short) in literals.iter().enumerate() {
            for long in &literals[i + 1..] {
                assert!(
                    !(long.len() > short.len() && long.starts_with(short)),
                    "'{long}' is shadowed by '{short}'"
                );
            }
        }
    }
}
