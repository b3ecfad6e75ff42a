//! Complexity Estimator
//!
//! Classifies a module by the deepest nesting of loop constructs along any
//! root-to-statement path. Sibling loops do not compound.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::domain::ast::{Module, Stmt};

/// Coarse time-complexity label derived from loop nesting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Complexity {
    /// The source could not be parsed.
    Unknown,
    /// `O(n^depth)`; depth 0 is `O(1)`.
    Polynomial(usize),
}

impl Complexity {
    pub fn from_depth(depth: usize) -> Self {
        Complexity::Polynomial(depth)
    }

    pub fn depth(&self) -> Option<usize> {
        match self {
            Complexity::Polynomial(depth) => Some(*depth),
            Complexity::Unknown => None,
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Complexity::Unknown => f.write_str("O(?)"),
            Complexity::Polynomial(0) => f.write_str("O(1)"),
            Complexity::Polynomial(1) => f.write_str("O(n)"),
            Complexity::Polynomial(k) => write!(f, "O(n^{})", k),
        }
    }
}

impl Serialize for Complexity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

pub struct ComplexityEstimator;

impl ComplexityEstimator {
    pub fn estimate(module: &Module) -> Complexity {
        Complexity::from_depth(Self::max_depth(&module.body, 0))
    }

    /// Maximum loop depth reached inside `body`, starting from `depth`.
    pub fn max_depth(body: &[Stmt], depth: usize) -> usize {
        body.iter()
            .map(|stmt| Self::stmt_depth(stmt, depth))
            .max()
            .unwrap_or(depth)
    }

    fn stmt_depth(stmt: &Stmt, depth: usize) -> usize {
        let inner = match stmt {
            Stmt::For { .. } | Stmt::While { .. } => depth + 1,
            _ => depth,
        };
        stmt.child_blocks()
            .into_iter()
            .map(|block| Self::max_depth(block, inner))
            .max()
            .unwrap_or(depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ast::Expr;

    fn for_loop(body: Vec<Stmt>) -> Stmt {
        Stmt::For {
            target: Expr::name("x"),
            iter: Expr::name("xs"),
            body,
            orelse: vec![],
        }
    }

    fn while_loop(body: Vec<Stmt>) -> Stmt {
        Stmt::While {
            test: Expr::name("go"),
            body,
            orelse: vec![],
        }
    }

    fn estimate(body: Vec<Stmt>) -> String {
        ComplexityEstimator::estimate(&Module::new(body)).to_string()
    }

    #[test]
    fn test_labels() {
        assert_eq!(Complexity::from_depth(0).to_string(), "O(1)");
        assert_eq!(Complexity::from_depth(1).to_string(), "O(n)");
        assert_eq!(Complexity::from_depth(2).to_string(), "O(n^2)");
        assert_eq!(Complexity::from_depth(3).to_string(), "O(n^3)");
        assert_eq!(Complexity::from_depth(6).to_string(), "O(n^6)");
        assert_eq!(Complexity::Unknown.to_string(), "O(?)");
    }

    #[test]
    fn test_no_loops_is_constant() {
        assert_eq!(estimate(vec![Stmt::Pass]), "O(1)");
        assert_eq!(estimate(vec![]), "O(1)");
    }

    #[test]
    fn test_siblings_do_not_multiply() {
        assert_eq!(estimate(vec![for_loop(vec![]), while_loop(vec![])]), "O(n)");
    }

    #[test]
    fn test_nesting_counts_mixed_loops() {
        let body = vec![for_loop(vec![while_loop(vec![for_loop(vec![for_loop(vec![])])])])];
        assert_eq!(estimate(body), "O(n^4)");
    }

    #[test]
    fn test_depth_inherited_through_branches_and_defs() {
        let body = vec![Stmt::FunctionDef {
            name: "f".into(),
            params: vec![],
            body: vec![for_loop(vec![Stmt::If {
                test: Expr::name("c"),
                body: vec![],
                orelse: vec![while_loop(vec![])],
            }])],
        }];
        assert_eq!(estimate(body), "O(n^2)");
    }

    #[test]
    fn test_loop_else_branch_is_nested() {
        let body = vec![Stmt::For {
            target: Expr::name("x"),
            iter: Expr::name("xs"),
            body: vec![],
            orelse: vec![for_loop(vec![])],
        }];
        assert_eq!(estimate(body), "O(n^2)");
    }

    #[test]
    fn test_try_with_and_class_bodies_keep_depth() {
        use crate::domain::ast::ExceptHandler;

        let guarded = Stmt::Try {
            body: vec![],
            handlers: vec![ExceptHandler {
                kind: None,
                name: None,
                body: vec![for_loop(vec![])],
            }],
            orelse: vec![],
            finalbody: vec![],
        };
        assert_eq!(estimate(vec![guarded.clone(), for_loop(vec![])]), "O(n)");

        let body = vec![Stmt::ClassDef {
            name: "Grid".into(),
            bases: vec![],
            body: vec![Stmt::With {
                items: vec![Expr::name("lock")],
                body: vec![for_loop(vec![guarded])],
            }],
        }];
        assert_eq!(estimate(body), "O(n^2)");
    }

    #[test]
    fn test_serializes_as_label() {
        let json = serde_json::to_string(&Complexity::from_depth(2)).unwrap();
        assert_eq!(json, "\"O(n^2)\"");
    }
}
