//! Recursive-descent parser for the embedded script language
//!
//! Statements are parsed by recursive descent; binary expressions use
//! precedence climbing over [`BinaryOp::precedence`]. A statement ends at a
//! `;`, before a `}`, at end of input, or where the next token starts on a
//! later line.

use super::ast::{AssignOp, BinaryOp, Expr, PathSegment, Place, Program, Stmt, UnaryOp};
use super::lexer::{tokenize, Token, TokenKind};
use super::SyntaxError;
use crate::value::Value;

type Result<T> = std::result::Result<T, SyntaxError>;

/// Words that cannot name a variable
const KEYWORDS: &[&str] = &[
    "let", "const", "var", "if", "else", "for", "while", "break", "continue", "return", "true",
    "false", "null", "undefined", "typeof", "in", "of",
];

/// Deepest nesting of statements and expressions the parser accepts
pub const MAX_NESTING: usize = 128;

/// Parse program text into a [`Program`]
pub fn parse(source: &str) -> Result<Program> {
    let tokens = tokenize(source)?;
    Parser::new(tokens).program()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    loop_depth: usize,
    depth: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            loop_depth: 0,
            depth: 0,
        }
    }

    // ========================================================================
    // Token helpers
    // ========================================================================

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_at(&self, ahead: usize) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.pos + ahead).min(last)]
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn at_eof(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn eat_punct(&mut self, p: &str) -> bool {
        if self.peek().is_punct(p) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_ident(&mut self, name: &str) -> bool {
        if self.peek().is_ident(name) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, p: &str) -> Result<()> {
        if self.eat_punct(p) {
            Ok(())
        } else {
            let token = self.peek();
            Err(SyntaxError::new(
                token.location.line,
                format!("Expected '{}' but found {}", p, token.describe()),
            ))
        }
    }

    fn unexpected(&self, context: &str) -> SyntaxError {
        let token = self.peek();
        SyntaxError::new(
            token.location.line,
            format!("Unexpected {} {}", token.describe(), context),
        )
    }

    /// Go one nesting level deeper, failing past [`MAX_NESTING`]
    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(SyntaxError::new(
                self.peek().location.line,
                "Expression nested too deeply",
            ));
        }
        Ok(())
    }

    /// Run `parse` one nesting level deeper
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let depth = self.depth;
        let result = self.enter().and_then(|()| parse(self));
        self.depth = depth;
        result
    }

    /// Variable name (keywords rejected)
    fn binding_name(&mut self) -> Result<String> {
        match &self.peek().kind {
            TokenKind::Ident(name) if !KEYWORDS.contains(&name.as_str()) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected("where a variable name was expected")),
        }
    }

    /// Property name after `.` (keywords allowed)
    fn property_name(&mut self) -> Result<String> {
        match &self.peek().kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected("where a property name was expected")),
        }
    }

    fn end_statement(&mut self) -> Result<()> {
        if self.eat_punct(";") || self.peek().is_punct("}") || self.at_eof() {
            return Ok(());
        }
        let prev_line = self.tokens[self.pos.saturating_sub(1)].location.line;
        if self.peek().location.line > prev_line {
            Ok(())
        } else {
            Err(self.unexpected("after statement"))
        }
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn program(mut self) -> Result<Program> {
        let mut body = Vec::new();
        while !self.at_eof() {
            if self.peek().is_punct("}") {
                return Err(self.unexpected("outside of a block"));
            }
            body.push(self.statement()?);
        }
        Ok(Program { body })
    }

    fn statement(&mut self) -> Result<Stmt> {
        self.nested(Self::statement_at_depth)
    }

    fn statement_at_depth(&mut self) -> Result<Stmt> {
        if self.eat_punct(";") {
            return Ok(Stmt::Empty);
        }
        if self.peek().is_punct("{") {
            return Ok(Stmt::Block(self.block()?));
        }

        let keyword = match &self.peek().kind {
            TokenKind::Ident(name) => name.clone(),
            _ => String::new(),
        };
        let line = self.peek().location.line;

        match keyword.as_str() {
            "if" => self.if_statement(),
            "for" => self.for_statement(),
            "while" => self.while_statement(),
            "break" | "continue" => {
                if self.loop_depth == 0 {
                    return Err(SyntaxError::new(
                        line,
                        format!("Illegal '{}' outside of a loop", keyword),
                    ));
                }
                self.advance();
                self.end_statement()?;
                Ok(if keyword == "break" {
                    Stmt::Break
                } else {
                    Stmt::Continue
                })
            }
            "return" => {
                self.advance();
                let next = self.peek();
                let value = if next.is_punct(";")
                    || next.is_punct("}")
                    || next.kind == TokenKind::Eof
                    || next.location.line > line
                {
                    None
                } else {
                    Some(self.expression()?)
                };
                self.end_statement()?;
                Ok(Stmt::Return(value))
            }
            _ => {
                let stmt = self.simple_statement()?;
                self.end_statement()?;
                Ok(stmt)
            }
        }
    }

    /// Declaration, assignment or expression, without its terminator
    fn simple_statement(&mut self) -> Result<Stmt> {
        if self.peek().is_ident("let") || self.peek().is_ident("const") || self.peek().is_ident("var") {
            return self.declaration();
        }

        let expr = self.expression()?;
        let op = match &self.peek().kind {
            TokenKind::Punct("=") => Some(AssignOp::Assign),
            TokenKind::Punct("+=") => Some(AssignOp::AddAssign),
            TokenKind::Punct("-=") => Some(AssignOp::SubAssign),
            _ => None,
        };

        if let Some(op) = op {
            let line = self.advance().location.line;
            let target = to_place(expr, line)?;
            let value = self.expression()?;
            return Ok(Stmt::Assign { target, op, value });
        }

        if self.peek().is_punct("++") || self.peek().is_punct("--") {
            let token = self.advance();
            let op = if token.is_punct("++") {
                AssignOp::AddAssign
            } else {
                AssignOp::SubAssign
            };
            let target = to_place(expr, token.location.line)?;
            return Ok(Stmt::Assign {
                target,
                op,
                value: Expr::Literal(Value::Int(1)),
            });
        }

        Ok(Stmt::Expr(expr))
    }

    fn declaration(&mut self) -> Result<Stmt> {
        let function_scoped = self.advance().is_ident("var");
        let mut bindings = Vec::new();
        loop {
            let name = self.binding_name()?;
            let init = if self.eat_punct("=") {
                Some(self.expression()?)
            } else {
                None
            };
            bindings.push((name, init));
            if !self.eat_punct(",") {
                break;
            }
        }
        Ok(Stmt::Declare {
            function_scoped,
            bindings,
        })
    }

    fn block(&mut self) -> Result<Vec<Stmt>> {
        self.expect_punct("{")?;
        let mut body = Vec::new();
        while !self.eat_punct("}") {
            if self.at_eof() {
                return Err(self.unexpected("inside a block: missing '}'"));
            }
            body.push(self.statement()?);
        }
        Ok(body)
    }

    /// A braced block, or a single statement
    fn body(&mut self) -> Result<Vec<Stmt>> {
        if self.peek().is_punct("{") {
            self.block()
        } else {
            Ok(vec![self.statement()?])
        }
    }

    fn loop_body(&mut self) -> Result<Vec<Stmt>> {
        self.loop_depth += 1;
        let body = self.body();
        self.loop_depth -= 1;
        body
    }

    fn if_statement(&mut self) -> Result<Stmt> {
        self.advance();
        let mut branches = vec![(self.expression()?, self.body()?)];
        let mut otherwise = None;

        while self.eat_ident("else") {
            if self.eat_ident("if") {
                branches.push((self.expression()?, self.body()?));
            } else {
                otherwise = Some(self.body()?);
                break;
            }
        }

        Ok(Stmt::If {
            branches,
            otherwise,
        })
    }

    fn while_statement(&mut self) -> Result<Stmt> {
        self.advance();
        let test = self.expression()?;
        let body = self.loop_body()?;
        Ok(Stmt::While { test, body })
    }

    fn for_statement(&mut self) -> Result<Stmt> {
        self.advance();
        let parenthesized = self.eat_punct("(");

        if self.is_for_in_head() {
            self.eat_declaration_keyword();
            let first = self.binding_name()?;
            let second = if self.eat_punct(",") {
                Some(self.binding_name()?)
            } else {
                None
            };
            if !(self.eat_ident("in") || self.eat_ident("of")) {
                return Err(self.unexpected("in loop head: expected 'in' or 'of'"));
            }
            let iterable = self.expression()?;
            if parenthesized {
                self.expect_punct(")")?;
            }
            let body = self.loop_body()?;
            return Ok(Stmt::ForIn {
                first,
                second,
                iterable,
                body,
            });
        }

        if !parenthesized {
            return Err(self.unexpected("in loop head"));
        }

        let init = if self.peek().is_punct(";") {
            None
        } else {
            Some(Box::new(self.simple_statement()?))
        };
        self.expect_punct(";")?;
        let test = if self.peek().is_punct(";") {
            None
        } else {
            Some(self.expression()?)
        };
        self.expect_punct(";")?;
        let update = if self.peek().is_punct(")") {
            None
        } else {
            Some(Box::new(self.simple_statement()?))
        };
        self.expect_punct(")")?;
        let body = self.loop_body()?;

        Ok(Stmt::ForLoop {
            init,
            test,
            update,
            body,
        })
    }

    /// Whether the tokens ahead read `[let] name [, name] (in|of)`
    fn is_for_in_head(&self) -> bool {
        let mut i = 0;
        if ["let", "const", "var"].iter().any(|k| self.peek_at(i).is_ident(k)) {
            i += 1;
        }
        if !matches!(self.peek_at(i).kind, TokenKind::Ident(_)) {
            return false;
        }
        i += 1;
        if self.peek_at(i).is_punct(",") {
            i += 2;
        }
        self.peek_at(i).is_ident("in") || self.peek_at(i).is_ident("of")
    }

    fn eat_declaration_keyword(&mut self) {
        let _ = self.eat_ident("let") || self.eat_ident("const") || self.eat_ident("var");
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn expression(&mut self) -> Result<Expr> {
        self.nested(Self::conditional)
    }

    fn conditional(&mut self) -> Result<Expr> {
        let test = self.binary(1)?;
        if !self.eat_punct("?") {
            return Ok(test);
        }
        let consequent = self.expression()?;
        self.expect_punct(":")?;
        let alternate = self.expression()?;
        Ok(Expr::Conditional {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        })
    }

    /// Precedence climbing over left-associative levels
    ///
    /// Every operator folded into the left operand counts as one nesting
    /// level, since evaluation recurses down the chain.
    fn binary(&mut self, min_precedence: u8) -> Result<Expr> {
        let depth = self.depth;
        let result = self.operator_chain(min_precedence);
        self.depth = depth;
        result
    }

    fn operator_chain(&mut self, min_precedence: u8) -> Result<Expr> {
        let mut left = self.unary()?;

        loop {
            let op = match self.peek().kind {
                TokenKind::Punct(p) => BinaryOp::from_punct(p),
                _ => None,
            };
            let Some(op) = op.filter(|op| op.precedence() >= min_precedence) else {
                break;
            };
            self.advance();
            self.enter()?;
            let right = self.binary(op.precedence() + 1)?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr> {
        let op = match &self.peek().kind {
            TokenKind::Punct("!") => Some(UnaryOp::Not),
            TokenKind::Punct("-") => Some(UnaryOp::Neg),
            TokenKind::Punct("+") => Some(UnaryOp::Plus),
            TokenKind::Ident(name) if name == "typeof" => Some(UnaryOp::TypeOf),
            _ => None,
        };

        match op {
            Some(op) => {
                self.advance();
                let operand = self.nested(Self::unary)?;
                Ok(Expr::Unary {
                    op,
                    operand: Box::new(operand),
                })
            }
            None => self.postfix(),
        }
    }

    fn postfix(&mut self) -> Result<Expr> {
        let depth = self.depth;
        let result = self.postfix_chain();
        self.depth = depth;
        result
    }

    fn postfix_chain(&mut self) -> Result<Expr> {
        let mut expr = self.primary()?;

        loop {
            if matches!(self.peek().kind, TokenKind::Punct("." | "[" | "(")) {
                self.enter()?;
            }
            if self.eat_punct(".") {
                let name = self.property_name()?;
                expr = Expr::Member {
                    object: Box::new(expr),
                    name,
                };
            } else if self.eat_punct("[") {
                let index = self.expression()?;
                self.expect_punct("]")?;
                expr = Expr::Index {
                    object: Box::new(expr),
                    index: Box::new(index),
                };
            } else if self.eat_punct("(") {
                let args = self.list(")")?;
                expr = Expr::Call {
                    callee: Box::new(expr),
                    args,
                };
            } else {
                return Ok(expr);
            }
        }
    }

    /// Comma separated expressions up to `close`, trailing comma allowed
    fn list(&mut self, close: &str) -> Result<Vec<Expr>> {
        let mut items = Vec::new();
        while !self.eat_punct(close) {
            items.push(self.expression()?);
            if !self.eat_punct(",") {
                self.expect_punct(close)?;
                break;
            }
        }
        Ok(items)
    }

    fn primary(&mut self) -> Result<Expr> {
        let token = self.peek().clone();
        let expr = match token.kind {
            TokenKind::Int(n) => Expr::Literal(Value::Int(n)),
            TokenKind::Float(n) => Expr::Literal(Value::Float(n)),
            TokenKind::Str(s) => Expr::Literal(Value::String(s)),
            TokenKind::Ident(name) => match name.as_str() {
                "true" => Expr::Literal(Value::Bool(true)),
                "false" => Expr::Literal(Value::Bool(false)),
                "null" | "undefined" => Expr::Literal(Value::Nil),
                _ if KEYWORDS.contains(&name.as_str()) => {
                    return Err(self.unexpected("in expression"));
                }
                _ => Expr::Ident(name),
            },
            TokenKind::Punct("(") => {
                self.advance();
                let inner = self.expression()?;
                self.expect_punct(")")?;
                return Ok(inner);
            }
            TokenKind::Punct("[") => {
                self.advance();
                return Ok(Expr::Array(self.list("]")?));
            }
            TokenKind::Punct("{") => {
                self.advance();
                return self.object();
            }
            _ => return Err(self.unexpected("in expression")),
        };
        self.advance();
        Ok(expr)
    }

    fn object(&mut self) -> Result<Expr> {
        let mut entries = Vec::new();
        while !self.eat_punct("}") {
            let key = match self.peek().kind.clone() {
                TokenKind::Ident(name) => name,
                TokenKind::Str(s) => s,
                TokenKind::Int(n) => n.to_string(),
                _ => return Err(self.unexpected("where an object key was expected")),
            };
            self.advance();

            let value = if self.eat_punct(":") {
                self.expression()?
            } else {
                Expr::Ident(key.clone())
            };
            entries.push((key, value));

            if !self.eat_punct(",") {
                self.expect_punct("}")?;
                break;
            }
        }
        Ok(Expr::Object(entries))
    }
}

/// Convert a parsed expression into an assignment target
fn to_place(expr: Expr, line: u32) -> Result<Place> {
    match expr {
        Expr::Ident(root) => Ok(Place {
            root,
            path: Vec::new(),
        }),
        Expr::Member { object, name } => {
            let mut place = to_place(*object, line)?;
            place.path.push(PathSegment::Name(name));
            Ok(place)
        }
        Expr::Index { object, index } => {
            let mut place = to_place(*object, line)?;
            place.path.push(PathSegment::Index(*index));
            Ok(place)
        }
        _ => Err(SyntaxError::new(line, "Invalid assignment target")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr(source: &str) -> Expr {
        match parse(source).unwrap().body.remove(0) {
            Stmt::Expr(e) => e,
            other => panic!("expected expression statement, got {:?}", other),
        }
    }

    fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    fn int(n: i64) -> Expr {
        Expr::Literal(Value::Int(n))
    }

    #[test]
    fn test_precedence() {
        assert_eq!(
            expr("1 + 2 * 3"),
            binary(BinaryOp::Add, int(1), binary(BinaryOp::Mul, int(2), int(3)))
        );
    }

    #[test]
    fn test_left_associativity() {
        assert_eq!(
            expr("1 - 2 - 3"),
            binary(BinaryOp::Sub, binary(BinaryOp::Sub, int(1), int(2)), int(3))
        );
    }

    #[test]
    fn test_logical_binds_loosest() {
        let e = expr("a == 1 || b < 2 && c");
        let Expr::Binary { op, .. } = e else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Or);
    }

    #[test]
    fn test_member_call_chain() {
        assert_eq!(
            expr("user.name.toUpperCase()"),
            Expr::Call {
                callee: Box::new(Expr::Member {
                    object: Box::new(Expr::Member {
                        object: Box::new(Expr::Ident("user".into())),
                        name: "name".into(),
                    }),
                    name: "toUpperCase".into(),
                }),
                args: vec![],
            }
        );
    }

    #[test]
    fn test_statements_split_on_newlines() {
        let program = parse("__out += \"a\"\n__out += \"b\"").unwrap();
        assert_eq!(program.body.len(), 2);
    }

    #[test]
    fn test_statements_on_one_line_need_separator() {
        let err = parse("a = 1 b = 2").unwrap_err();
        assert_eq!(err.line, 1);
    }

    #[test]
    fn test_if_else_chain() {
        let program = parse("if x { a = 1 } else if (y) b = 2; else { c = 3 }").unwrap();
        let Stmt::If { branches, otherwise } = &program.body[0] else {
            panic!("expected if");
        };
        assert_eq!(branches.len(), 2);
        assert!(otherwise.is_some());
    }

    #[test]
    fn test_for_forms() {
        for source in [
            "for x in xs { }",
            "for k, v in xs { }",
            "for (const x of xs) { }",
            "for (let i = 0; i < 3; i++) { }",
        ] {
            assert!(parse(source).is_ok(), "failed to parse {}", source);
        }
    }

    #[test]
    fn test_break_outside_loop() {
        let err = parse("x = 1\nbreak").unwrap_err();
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_invalid_assignment_target() {
        let err = parse("f() = 1").unwrap_err();
        assert_eq!(err.message, "Invalid assignment target");
    }

    #[test]
    fn test_error_line_of_dangling_operator() {
        let err = parse("let a = 1\nlet b = (1 + )\n").unwrap_err();
        assert_eq!(err.line, 2);
        assert!(err.message.contains("')'"));
    }

    #[test]
    fn test_missing_closing_brace() {
        assert!(parse("if x {\n a = 1\n").is_err());
    }

    #[test]
    fn test_object_literal() {
        assert_eq!(
            expr("({ a: 1, 'b': 2, c })"),
            Expr::Object(vec![
                ("a".into(), int(1)),
                ("b".into(), int(2)),
                ("c".into(), Expr::Ident("c".into())),
            ])
        );
    }

    #[test]
    fn test_conditional() {
        assert!(matches!(expr("a ? 1 : 2"), Expr::Conditional { .. }));
    }

    #[test]
    fn test_moderate_nesting_parses() {
        let source = format!("{}1{}", "(".repeat(100), ")".repeat(100));
        assert_eq!(expr(&source), int(1));
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let deep = 10_000;
        for source in [
            format!("{}1{}", "(".repeat(deep), ")".repeat(deep)),
            format!("{}x", "!".repeat(deep)),
            format!("{}1{}", "[".repeat(deep), "]".repeat(deep)),
            format!("1{}", " + 1".repeat(deep)),
            format!("a{}", ".b".repeat(deep)),
            "if x { ".repeat(deep),
        ] {
            let err = parse(&source).unwrap_err();
            assert_eq!(err.message, "Expression nested too deeply");
            assert_eq!(err.line, 1);
        }
    }
}
