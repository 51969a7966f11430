use std::fmt::{Display, Formatter};

use phf::phf_map;

#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    Number(f64),
    String(String),
    Identifier(String),
    Keyword(Keyword),
    Operator(Operator),
}

impl Token {
    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        matches!(self, Token::Keyword(k) if *k == keyword)
    }

    pub fn is_operator(&self, operator: Operator) -> bool {
        matches!(self, Token::Operator(o) if *o == operator)
    }

    pub fn identifier(&self) -> Option<&str> {
        match self {
            Token::Identifier(name) => Some(name),
            _ => None,
        }
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Number(num) => write!(f, "number {num}"),
            Token::String(s) => write!(f, "string {s:?}"),
            Token::Identifier(name) => write!(f, "identifier '{name}'"),
            Token::Keyword(keyword) => write!(f, "keyword '{}'", keyword.as_str()),
            Token::Operator(op) => write!(f, "'{}'", op.as_str()),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Keyword {
    And,
    Break,
    Do,
    Else,
    Elseif,
    End,
    False,
    For,
    Function,
    Goto,
    If,
    In,
    Local,
    Nil,
    Not,
    Or,
    Repeat,
    Return,
    Then,
    True,
    Until,
    While,
    Class,
    Protocol,
    Enum,
    Typealias,
    Default,
    Is,
}

static KEYWORDS: phf::Map<&'static str, Keyword> = phf_map! {
    "and" => Keyword::And,
    "break" => Keyword::Break,
    "do" => Keyword::Do,
    "else" => Keyword::Else,
    "elseif" => Keyword::Elseif,
    "end" => Keyword::End,
    "false" => Keyword::False,
    "for" => Keyword::For,
    "function" => Keyword::Function,
    "goto" => Keyword::Goto,
    "if" => Keyword::If,
    "in" => Keyword::In,
    "local" => Keyword::Local,
    "nil" => Keyword::Nil,
    "not" => Keyword::Not,
    "or" => Keyword::Or,
    "repeat" => Keyword::Repeat,
    "return" => Keyword::Return,
    "then" => Keyword::Then,
    "true" => Keyword::True,
    "until" => Keyword::Until,
    "while" => Keyword::While,
    "class" => Keyword::Class,
    "protocol" => Keyword::Protocol,
    "enum" => Keyword::Enum,
    "typealias" => Keyword::Typealias,
    "default" => Keyword::Default,
    "is" => Keyword::Is,
};

impl Keyword {
    pub fn from_identifier(identifier: &str) -> Option<Self> {
        KEYWORDS.get(identifier).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::And => "and",
            Keyword::Break => "break",
            Keyword::Do => "do",
            Keyword::Else => "else",
            Keyword::Elseif => "elseif",
            Keyword::End => "end",
            Keyword::False => "false",
            Keyword::For => "for",
            Keyword::Function => "function",
            Keyword::Goto => "goto",
            Keyword::If => "if",
            Keyword::In => "in",
            Keyword::Local => "local",
            Keyword::Nil => "nil",
            Keyword::Not => "not",
            Keyword::Or => "or",
            Keyword::Repeat => "repeat",
            Keyword::Return => "return",
            Keyword::Then => "then",
            Keyword::True => "true",
            Keyword::Until => "until",
            Keyword::While => "while",
            Keyword::Class => "class",
            Keyword::Protocol => "protocol",
            Keyword::Enum => "enum",
            Keyword::Typealias => "typealias",
            Keyword::Default => "default",
            Keyword::Is => "is",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Operator {
    DoubleColon,
    Colon,
    Optional,
    DoubleEqual,
    NotEqual,
    LessThanEqual,
    GreaterThanEqual,
    VarArg,
    Concatenate,
    PlusEqual,
    MinusEqual,
    MultiplyEqual,
    DivideEqual,
    ModulusEqual,
    ExponentEqual,
    Equal,
    Plus,
    Multiply,
    Minus,
    Hash,
    Divide,
    Modulus,
    Exponent,
    GreaterThan,
    LessThan,
    Dot,
    SquareBracketLeft,
    SquareBracketRight,
    RoundBracketLeft,
    RoundBracketRight,
    CurlyBracketLeft,
    CurlyBracketRight,
    Comma,
    Semicolon,
}

impl Operator {
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::DoubleColon => "::",
            Operator::Colon => ":",
            Operator::Optional => "?",
            Operator::DoubleEqual => "==",
            Operator::NotEqual => "~=",
            Operator::LessThanEqual => "<=",
            Operator::GreaterThanEqual => ">=",
            Operator::VarArg => "...",
            Operator::Concatenate => "..",
            Operator::PlusEqual => "+=",
            Operator::MinusEqual => "-=",
            Operator::MultiplyEqual => "*=",
            Operator::DivideEqual => "/=",
            Operator::ModulusEqual => "%=",
            Operator::ExponentEqual => "^=",
            Operator::Equal => "=",
            Operator::Plus => "+",
            Operator::Multiply => "*",
            Operator::Minus => "-",
            Operator::Hash => "#",
            Operator::Divide => "/",
            Operator::Modulus => "%",
            Operator::Exponent => "^",
            Operator::GreaterThan => ">",
            Operator::LessThan => "<",
            Operator::Dot => ".",
            Operator::SquareBracketLeft => "[",
            Operator::SquareBracketRight => "]",
            Operator::RoundBracketLeft => "(",
            Operator::RoundBracketRight => ")",
            Operator::CurlyBracketLeft => "{",
            Operator::CurlyBracketRight => "}",
            Operator::Comma => ",",
            Operator::Semicolon => ";",
        }
    }
}
