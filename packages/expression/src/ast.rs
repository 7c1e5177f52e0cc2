/// Expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Ast {
    Variable(String),
    Number(f64),
    String(String),
    Bool(bool),
    Unary {
        op: UnaryOp,
        operand: Box<Ast>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Ast>,
        right: Box<Ast>,
    },
    /// Bracketed value list, e.g. `anyof [1, 2, 3]`
    List(Vec<Ast>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Empty,
    NotEmpty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    And,
    Or,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Contains,
    AnyOf,
    AllOf,
}

impl Ast {
    /// Variable names referenced anywhere in the tree, in order of first
    /// appearance, deduplicated.
    pub fn variables(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables(&self, out: &mut Vec<String>) {
        match self {
            Ast::Variable(name) => {
                if !out.iter().any(|n| n == name) {
                    out.push(name.clone());
                }
            }
            Ast::Unary { operand, .. } => operand.collect_variables(out),
            Ast::Binary { left, right, .. } => {
                left.collect_variables(out);
                right.collect_variables(out);
            }
            Ast::List(items) => {
                for item in items {
                    item.collect_variables(out);
                }
            }
            Ast::Number(_) | Ast::String(_) | Ast::Bool(_) => {}
        }
    }
}
