//! Symbolic rendering of conduit compositions.
//!
//! `>>` denotes sequential chaining and `&` concurrent grouping. `>>` binds
//! tighter than `&`, so groups nested in a chain are parenthesised while
//! chains nested in a group are not.

use std::fmt;

/// A composed conduit expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    /// A single named leaf
    Atom(String),
    /// Stages composed in sequence, upstream first
    Chain(Vec<Expression>),
    /// Branches composed concurrently, in enumeration order
    Group(Vec<Expression>),
}

impl Expression {
    pub fn atom<S: Into<String>>(name: S) -> Self {
        Expression::Atom(name.into())
    }

    /// `self >> other`, flattening nested chains
    pub fn then(self, other: Expression) -> Self {
        let mut stages = self.into_chain();
        stages.extend(other.into_chain());
        Expression::Chain(stages)
    }

    /// `self & other`, flattening nested groups
    pub fn and(self, other: Expression) -> Self {
        let mut branches = self.into_group();
        branches.extend(other.into_group());
        Expression::Group(branches)
    }

    fn into_chain(self) -> Vec<Expression> {
        match self {
            Expression::Chain(stages) => stages,
            other => vec![other],
        }
    }

    fn into_group(self) -> Vec<Expression> {
        match self {
            Expression::Group(branches) => branches,
            other => vec![other],
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Atom(name) => f.write_str(name),
            Expression::Chain(stages) => {
                for (i, stage) in stages.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" >> ")?;
                    }
                    match stage {
                        Expression::Group(_) => write!(f, "({stage})")?,
                        _ => write!(f, "{stage}")?,
                    }
                }
                Ok(())
            }
            Expression::Group(branches) => {
                for (i, branch) in branches.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" & ")?;
                    }
                    write!(f, "{branch}")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence() {
        let expr = Expression::atom("a")
            .then(Expression::atom("b").and(Expression::atom("c")))
            .then(Expression::atom("d"));
        assert_eq!(expr.to_string(), "a >> (b & c) >> d");

        let expr = Expression::atom("a")
            .then(Expression::atom("b"))
            .and(Expression::atom("c"));
        assert_eq!(expr.to_string(), "a >> b & c");
    }

    #[test]
    fn test_nested_composition_flattens() {
        let left = Expression::atom("a").and(Expression::atom("b"));
        let expr = left.and(Expression::atom("c"));
        assert_eq!(
            expr,
            Expression::Group(vec![
                Expression::atom("a"),
                Expression::atom("b"),
                Expression::atom("c"),
            ])
        );
    }
}
