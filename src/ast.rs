#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    StringLit(String),
    IntLit(i64),
    FloatLit(f64),
    BoolLit(bool),
    NullLit,
    Var(String),
    Attribute(Box<Expr>, String), // foo.bar
    Index(Box<Expr>, Box<Expr>),  // foo['bar'], xs[0]
    Unary(UnOp, Box<Expr>),
    BinOp(Box<Expr>, BinOp, Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `target += expr;` — append a display-coerced value to the accumulator.
    Append { target: String, value: Expr },
    /// `let name = expr;`
    Let { name: String, value: Expr },
    If {
        cases: Vec<(Expr, Vec<Stmt>)>, // (condition, body). Includes if and else-ifs.
        else_body: Option<Vec<Stmt>>,
    },
    For {
        target: String,
        iterable: Expr,
        body: Vec<Stmt>,
    },
}

pub type Program = Vec<Stmt>;
