//! Syntax tree of the formula language.
use quire_types::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Formula {
    Literal(Value),
    /// A `[name]` reference resolved against the data row.
    Field(String),
    Unary(UnaryOp, Box<Formula>),
    Binary(BinaryOp, Box<Formula>, Box<Formula>),
    /// A call such as `IF(c; a; b)`. Names are stored upper-case.
    Call { name: String, args: Vec<Formula> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Concat,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    And,
    Or,
}

impl Formula {
    /// Field names referenced anywhere in the formula, in order of appearance.
    pub fn fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Formula::Literal(_) => {}
            Formula::Field(name) => out.push(name),
            Formula::Unary(_, inner) => inner.collect_fields(out),
            Formula::Binary(_, l, r) => {
                l.collect_fields(out);
                r.collect_fields(out);
            }
            Formula::Call { args, .. } => args.iter().for_each(|a| a.collect_fields(out)),
        }
    }
}
