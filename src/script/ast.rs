//! Syntax tree of the embedded script language

use crate::value::Value;

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `!`
    Not,
    /// `-`
    Neg,
    /// `+`
    Plus,
    /// `typeof`
    TypeOf,
}

/// Binary operators, including the short-circuiting logical ones
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `||`
    Or,
    /// `&&`
    And,
    /// `==` / `===`
    Eq,
    /// `!=` / `!==`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Rem,
}

impl BinaryOp {
    /// Operator for a punctuation token
    pub fn from_punct(p: &str) -> Option<Self> {
        Some(match p {
            "||" => BinaryOp::Or,
            "&&" => BinaryOp::And,
            "==" | "===" => BinaryOp::Eq,
            "!=" | "!==" => BinaryOp::Ne,
            "<" => BinaryOp::Lt,
            "<=" => BinaryOp::Le,
            ">" => BinaryOp::Gt,
            ">=" => BinaryOp::Ge,
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::Div,
            "%" => BinaryOp::Rem,
            _ => return None,
        })
    }

    /// Binding strength; higher binds tighter. All levels are left-associative.
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::Or => 1,
            BinaryOp::And => 2,
            BinaryOp::Eq | BinaryOp::Ne => 3,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => 4,
            BinaryOp::Add | BinaryOp::Sub => 5,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 6,
        }
    }
}

/// An expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal value
    Literal(Value),
    /// Bare identifier
    Ident(String),
    /// `[a, b]`
    Array(Vec<Expr>),
    /// `{ key: value }`
    Object(Vec<(String, Expr)>),
    /// `object.name`
    Member {
        /// Receiver
        object: Box<Expr>,
        /// Property name
        name: String,
    },
    /// `object[index]`
    Index {
        /// Receiver
        object: Box<Expr>,
        /// Index or key
        index: Box<Expr>,
    },
    /// `callee(args)`
    Call {
        /// Called expression
        callee: Box<Expr>,
        /// Arguments
        args: Vec<Expr>,
    },
    /// Prefix operator
    Unary {
        /// Operator
        op: UnaryOp,
        /// Operand
        operand: Box<Expr>,
    },
    /// Infix operator
    Binary {
        /// Operator
        op: BinaryOp,
        /// Left operand
        left: Box<Expr>,
        /// Right operand
        right: Box<Expr>,
    },
    /// `test ? consequent : alternate`
    Conditional {
        /// Condition
        test: Box<Expr>,
        /// Value when truthy
        consequent: Box<Expr>,
        /// Value when falsy
        alternate: Box<Expr>,
    },
}

/// One step below the root of an assignment target
#[derive(Debug, Clone, PartialEq)]
pub enum PathSegment {
    /// `.name`
    Name(String),
    /// `[expr]`
    Index(Expr),
}

/// Assignment target: a local variable, optionally followed by a path
#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    /// Variable name
    pub root: String,
    /// Member and index steps
    pub path: Vec<PathSegment>,
}

/// Assignment operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    /// `=`
    Assign,
    /// `+=`
    AddAssign,
    /// `-=`
    SubAssign,
}

/// A statement
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `let`/`const`/`var` declaration list
    Declare {
        /// `var` declares in the outermost scope
        function_scoped: bool,
        /// Names and optional initializers
        bindings: Vec<(String, Option<Expr>)>,
    },
    /// Assignment
    Assign {
        /// Target
        target: Place,
        /// Operator
        op: AssignOp,
        /// Right-hand side
        value: Expr,
    },
    /// `if` / `else if` / `else`
    If {
        /// Conditions with their bodies, in order
        branches: Vec<(Expr, Vec<Stmt>)>,
        /// Final `else` body
        otherwise: Option<Vec<Stmt>>,
    },
    /// `for x in xs` / `for k, v in xs` / `for (x of xs)`
    ForIn {
        /// First binding (element, or key/index when `second` is set)
        first: String,
        /// Second binding (element)
        second: Option<String>,
        /// Iterated value
        iterable: Expr,
        /// Body
        body: Vec<Stmt>,
    },
    /// `for (init; test; update)`
    ForLoop {
        /// Initializer
        init: Option<Box<Stmt>>,
        /// Condition, absent means always
        test: Option<Expr>,
        /// Step
        update: Option<Box<Stmt>>,
        /// Body
        body: Vec<Stmt>,
    },
    /// `while`
    While {
        /// Condition
        test: Expr,
        /// Body
        body: Vec<Stmt>,
    },
    /// `break`
    Break,
    /// `continue`
    Continue,
    /// `return`
    Return(Option<Expr>),
    /// `{ ... }`
    Block(Vec<Stmt>),
    /// Expression evaluated for its effects
    Expr(Expr),
    /// Lone `;`
    Empty,
}

/// A parsed program
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    /// Top-level statements
    pub body: Vec<Stmt>,
}
