//! Tokenizer and recursive-descent parser.

use super::eval::Scalar;
use super::{BinOp, CmpOp, Expr, Func, Var};

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Int(i64),
    Float(f64),
    Ident(String),
    Op(&'static str),
    LParen,
    RParen,
    Comma,
    Dot,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Int(v) => v.to_string(),
            Token::Float(v) => v.to_string(),
            Token::Ident(name) => name.clone(),
            Token::Op(op) => (*op).to_string(),
            Token::LParen => "(".to_string(),
            Token::RParen => ")".to_string(),
            Token::Comma => ",".to_string(),
            Token::Dot => ".".to_string(),
        }
    }
}

const KEYWORDS: &[&str] = &["and", "or", "not", "if", "else"];

/// Parse a complete expression.
pub(crate) fn parse(source: &str) -> Result<Expr, String> {
    let tokens = tokenize(source)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_expr()?;
    match parser.peek() {
        None => Ok(expr),
        Some(token) => Err(format!("unexpected '{}'", token.describe())),
    }
}

fn tokenize(source: &str) -> Result<Vec<Token>, String> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }

        let starts_fraction = c == '.' && chars.get(i + 1).is_some_and(char::is_ascii_digit);
        if c.is_ascii_digit() || starts_fraction {
            let (token, next) = lex_number(&chars, i)?;
            tokens.push(token);
            i = next;
            continue;
        }

        if c.is_ascii_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            tokens.push(Token::Ident(chars[start..i].iter().collect()));
            continue;
        }

        let pair = match (c, chars.get(i + 1)) {
            ('/', Some('/')) => Some("//"),
            ('*', Some('*')) => Some("**"),
            ('<', Some('=')) => Some("<="),
            ('>', Some('=')) => Some(">="),
            ('=', Some('=')) => Some("=="),
            ('!', Some('=')) => Some("!="),
            _ => None,
        };
        if let Some(op) = pair {
            tokens.push(Token::Op(op));
            i += 2;
            continue;
        }

        let token = match c {
            '+' => Token::Op("+"),
            '-' => Token::Op("-"),
            '*' => Token::Op("*"),
            '/' => Token::Op("/"),
            '%' => Token::Op("%"),
            '<' => Token::Op("<"),
            '>' => Token::Op(">"),
            '(' => Token::LParen,
            ')' => Token::RParen,
            ',' => Token::Comma,
            '.' => Token::Dot,
            other => return Err(format!("unexpected character '{other}' at position {i}")),
        };
        tokens.push(token);
        i += 1;
    }

    Ok(tokens)
}

fn lex_number(chars: &[char], start: usize) -> Result<(Token, usize), String> {
    let mut i = start;
    let mut is_float = false;
    let digits = |i: &mut usize| {
        while *i < chars.len() && chars[*i].is_ascii_digit() {
            *i += 1;
        }
    };

    digits(&mut i);
    if i < chars.len() && chars[i] == '.' {
        is_float = true;
        i += 1;
        digits(&mut i);
    }
    if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
        let mut j = i + 1;
        if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
            j += 1;
        }
        if j < chars.len() && chars[j].is_ascii_digit() {
            is_float = true;
            i = j;
            digits(&mut i);
        }
    }

    let text: String = chars[start..i].iter().collect();
    let token = if is_float {
        Token::Float(
            text.parse()
                .map_err(|_| format!("invalid number literal '{text}'"))?,
        )
    } else {
        Token::Int(
            text.parse()
                .map_err(|_| format!("integer literal '{text}' is too large"))?,
        )
    };
    Ok((token, i))
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_op(&mut self, op: &str) -> bool {
        let hit = matches!(self.peek(), Some(Token::Op(o)) if *o == op);
        if hit {
            self.pos += 1;
        }
        hit
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        let hit = matches!(self.peek(), Some(Token::Ident(name)) if name == keyword);
        if hit {
            self.pos += 1;
        }
        hit
    }

    fn expect(&mut self, expected: Token) -> Result<(), String> {
        if self.eat(&expected) {
            return Ok(());
        }
        match self.peek() {
            Some(token) => Err(format!(
                "expected '{}', found '{}'",
                expected.describe(),
                token.describe()
            )),
            None => Err(format!(
                "expected '{}' before end of expression",
                expected.describe()
            )),
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, String> {
        let value = self.parse_or()?;
        if !self.eat_keyword("if") {
            return Ok(value);
        }
        let cond = self.parse_or()?;
        if !self.eat_keyword("else") {
            return Err("conditional expression is missing 'else'".to_string());
        }
        let otherwise = self.parse_expr()?;
        Ok(Expr::IfElse {
            cond: Box::new(cond),
            then: Box::new(value),
            otherwise: Box::new(otherwise),
        })
    }

    fn parse_or(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_and()?;
        while self.eat_keyword("or") {
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_not()?;
        while self.eat_keyword("and") {
            let right = self.parse_not()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr, String> {
        if self.eat_keyword("not") {
            return Ok(Expr::Not(Box::new(self.parse_not()?)));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, String> {
        let first = self.parse_arith()?;
        let mut rest = Vec::new();
        while let Some(op) = self.peek_comparison() {
            self.pos += 1;
            rest.push((op, self.parse_arith()?));
        }
        if rest.is_empty() {
            Ok(first)
        } else {
            Ok(Expr::Compare(Box::new(first), rest))
        }
    }

    fn peek_comparison(&self) -> Option<CmpOp> {
        match self.peek() {
            Some(Token::Op("<")) => Some(CmpOp::Lt),
            Some(Token::Op("<=")) => Some(CmpOp::Le),
            Some(Token::Op(">")) => Some(CmpOp::Gt),
            Some(Token::Op(">=")) => Some(CmpOp::Ge),
            Some(Token::Op("==")) => Some(CmpOp::Eq),
            Some(Token::Op("!=")) => Some(CmpOp::Ne),
            _ => None,
        }
    }

    fn parse_arith(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_term()?;
        loop {
            let op = if self.eat_op("+") {
                BinOp::Add
            } else if self.eat_op("-") {
                BinOp::Sub
            } else {
                return Ok(left);
            };
            let right = self.parse_term()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn parse_term(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_factor()?;
        loop {
            let op = if self.eat_op("*") {
                BinOp::Mul
            } else if self.eat_op("/") {
                BinOp::Div
            } else if self.eat_op("//") {
                BinOp::FloorDiv
            } else if self.eat_op("%") {
                BinOp::Mod
            } else {
                return Ok(left);
            };
            let right = self.parse_factor()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn parse_factor(&mut self) -> Result<Expr, String> {
        if self.eat_op("-") {
            return Ok(Expr::Neg(Box::new(self.parse_factor()?)));
        }
        if self.eat_op("+") {
            return Ok(Expr::Pos(Box::new(self.parse_factor()?)));
        }
        self.parse_power()
    }

    fn parse_power(&mut self) -> Result<Expr, String> {
        let base = self.parse_primary()?;
        if self.eat_op("**") {
            let exponent = self.parse_factor()?;
            return Ok(Expr::Binary(BinOp::Pow, Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Expr, String> {
        match self.advance() {
            Some(Token::Int(v)) => Ok(Expr::Literal(Scalar::Int(v))),
            Some(Token::Float(v)) => Ok(Expr::Literal(Scalar::Float(v))),
            Some(Token::LParen) => {
                let inner = self.parse_expr()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Some(Token::Ident(name)) => self.parse_name(&name),
            Some(token) => Err(format!("unexpected '{}'", token.describe())),
            None => Err("unexpected end of expression".to_string()),
        }
    }

    fn parse_name(&mut self, name: &str) -> Result<Expr, String> {
        match name {
            "True" | "true" => return Ok(Expr::Literal(Scalar::Bool(true))),
            "False" | "false" => return Ok(Expr::Literal(Scalar::Bool(false))),
            "None" | "null" => return Ok(Expr::Literal(Scalar::None)),
            _ if KEYWORDS.contains(&name) => return Err(format!("unexpected '{name}'")),
            _ => {}
        }

        if name == "math" {
            self.expect(Token::Dot)?;
            let attr = match self.advance() {
                Some(Token::Ident(attr)) => attr,
                _ => return Err("expected a name after 'math.'".to_string()),
            };
            return self.parse_math(&attr);
        }

        if self.peek() == Some(&Token::LParen) {
            let func = Func::lookup(name).ok_or_else(|| format!("function '{name}' is not allowed"))?;
            return self.parse_call(func);
        }

        let var = match name {
            "prev" => Var::Prev,
            "count" => Var::Count,
            "random" => Var::Random,
            "time" => Var::Time,
            "pi" => Var::Pi,
            "e" => Var::E,
            _ => return Err(format!("name '{name}' is not allowed")),
        };
        Ok(Expr::Var(var))
    }

    fn parse_math(&mut self, attr: &str) -> Result<Expr, String> {
        if self.peek() == Some(&Token::LParen) {
            let func = Func::lookup_math(attr)
                .ok_or_else(|| format!("function 'math.{attr}' is not allowed"))?;
            return self.parse_call(func);
        }
        match attr {
            "pi" => Ok(Expr::Var(Var::Pi)),
            "e" => Ok(Expr::Var(Var::E)),
            _ => Err(format!("name 'math.{attr}' is not allowed")),
        }
    }

    fn parse_call(&mut self, func: Func) -> Result<Expr, String> {
        self.expect(Token::LParen)?;
        let mut args = Vec::new();
        if !self.eat(&Token::RParen) {
            loop {
                args.push(self.parse_expr()?);
                if self.eat(&Token::Comma) {
                    continue;
                }
                self.expect(Token::RParen)?;
                break;
            }
        }

        let (min, max) = func.arity();
        let too_many = max.is_some_and(|max| args.len() > max);
        if args.len() < min || too_many {
            let expected = match max {
                Some(max) if max == min => format!("{min}"),
                Some(max) => format!("{min} to {max}"),
                None => format!("at least {min}"),
            };
            return Err(format!(
                "{}() takes {expected} arguments, got {}",
                func.name(),
                args.len()
            ));
        }
        Ok(Expr::Call(func, args))
    }
}
