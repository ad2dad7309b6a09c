//! Expression capability consumed by the metadata model.
//!
//! The metadata never inspects the expressions it stores. It only needs
//! them to be persistable, to combine two predicates by conjunction, and to
//! report the parameters bound inside them. That capability set is the
//! [`Expression`] trait.
//!
//! [`Expr`] is the stock implementation: a plain data tree of paths,
//! constants, parameters and operations.
//!
//! # Example
//!
//! ```rust
//! use oxide_query_core::expr::path;
//!
//! let name = path("name");
//! let predicate = name.clone().eq("b").and(name.is_not_empty());
//! assert_eq!(predicate.to_string(), "and(eq(name, \"b\"), is_not_empty(name))");
//! ```

use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::codec::Persistable;
use crate::error::{QueryError, Result};
use crate::params::ParamKey;
use crate::value::{SqlValue, ToSqlValue};

/// Capabilities the metadata requires from the expressions it stores.
pub trait Expression: Persistable {
    /// Combines two predicates into `self AND other`.
    ///
    /// Must be purely syntactic: no flattening, no simplification.
    #[must_use]
    fn and(self, other: Self) -> Self;

    /// Returns the parameters bound inside this expression, depth first,
    /// left to right.
    fn bound_params(&self) -> Vec<(ParamKey, SqlValue)>;
}

/// Collects the arguments of a one-or-more call, rejecting a missing
/// value or an empty argument list before anything is applied.
pub(crate) fn require_all<E, I>(what: &str, items: I) -> Result<Vec<E>>
where
    I: IntoIterator,
    I::Item: Into<Option<E>>,
{
    let items = items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            item.into().ok_or_else(|| {
                QueryError::invalid_argument(format!("{what}: argument {i} is missing"))
            })
        })
        .collect::<Result<Vec<E>>>()?;
    if items.is_empty() {
        return Err(QueryError::invalid_argument(format!(
            "{what}: at least one argument is required"
        )));
    }
    Ok(items)
}

/// Folds predicates into `slot` by left-associative conjunction.
pub(crate) fn fold_conjunction<E: Expression>(slot: &mut Option<E>, predicates: Vec<E>) {
    for predicate in predicates {
        *slot = Some(match slot.take() {
            Some(current) => current.and(predicate),
            None => predicate,
        });
    }
}

/// Creates a path (column or entity reference).
#[must_use]
pub fn path(name: &str) -> Expr {
    Expr::Path(Path::new(name))
}

/// Creates a constant expression.
#[must_use]
pub fn constant<T: ToSqlValue>(value: T) -> Expr {
    Expr::Constant {
        value: value.to_sql_value(),
    }
}

/// Creates an unbound parameter.
#[must_use]
pub fn param(name: &str) -> Param {
    Param {
        key: ParamKey::new(name),
        value: None,
    }
}

/// A path reference, optionally qualified by its parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Path {
    /// Optional parent qualifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Path name.
    pub name: String,
}

impl Path {
    /// Creates an unqualified path.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            parent: None,
            name: String::from(name),
        }
    }

    /// Creates a qualified path.
    #[must_use]
    pub fn qualified(parent: &str, name: &str) -> Self {
        Self {
            parent: Some(String::from(parent)),
            name: String::from(name),
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.parent {
            Some(parent) => write!(f, "{parent}.{}", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// A named query parameter, optionally bound to a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    /// Parameter identity.
    pub key: ParamKey,
    /// Bound value, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<SqlValue>,
}

impl Param {
    /// Binds a value to this parameter.
    #[must_use]
    pub fn bind<T: ToSqlValue>(mut self, value: T) -> Self {
        self.value = Some(value.to_sql_value());
        self
    }
}

/// Operators understood by [`Expr::Operation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    // Comparison
    Eq,
    Ne,
    Lt,
    LtEq,
    Gt,
    GtEq,

    // Logical
    And,
    Or,
    Not,

    // Null checks
    IsNull,
    IsNotNull,

    // String
    Like,
    Concat,
    IsEmpty,
    IsNotEmpty,
}

impl Operator {
    /// Returns the operator name used in the debug rendering.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Lt => "lt",
            Self::LtEq => "lt_eq",
            Self::Gt => "gt",
            Self::GtEq => "gt_eq",
            Self::And => "and",
            Self::Or => "or",
            Self::Not => "not",
            Self::IsNull => "is_null",
            Self::IsNotNull => "is_not_null",
            Self::Like => "like",
            Self::Concat => "concat",
            Self::IsEmpty => "is_empty",
            Self::IsNotEmpty => "is_not_empty",
        }
    }

    /// Returns the number of operands the operator takes.
    #[must_use]
    pub const fn arity(&self) -> usize {
        match self {
            Self::Not | Self::IsNull | Self::IsNotNull | Self::IsEmpty | Self::IsNotEmpty => 1,
            _ => 2,
        }
    }

    /// Returns `true` if the operator produces a boolean.
    #[must_use]
    pub const fn is_predicate(&self) -> bool {
        !matches!(self, Self::Concat)
    }
}

/// A structural expression node.
///
/// A left-leaning chain of binary `and` operations is encoded as one flat
/// `conjunction` record, so folding many predicates does not deepen the
/// encoded document.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A path reference.
    Path(Path),
    /// A constant.
    Constant {
        /// The constant value.
        value: SqlValue,
    },
    /// A named parameter.
    Param(Param),
    /// An operator applied to its operands.
    Operation {
        /// The operator.
        op: Operator,
        /// Operands, in order.
        args: Vec<Expr>,
    },
}

impl Expr {
    fn operation(op: Operator, args: Vec<Self>) -> Self {
        Self::Operation { op, args }
    }

    fn binary(self, op: Operator, right: impl Into<Self>) -> Self {
        Self::operation(op, vec![self, right.into()])
    }

    fn unary(self, op: Operator) -> Self {
        Self::operation(op, vec![self])
    }

    /// Creates an AND expression.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        self.binary(Operator::And, other)
    }

    /// Creates an OR expression.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        self.binary(Operator::Or, other)
    }

    /// Negates the expression.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        self.unary(Operator::Not)
    }

    /// Creates an equality expression.
    #[must_use]
    pub fn eq(self, right: impl Into<Self>) -> Self {
        self.binary(Operator::Eq, right)
    }

    /// Creates an inequality expression.
    #[must_use]
    pub fn ne(self, right: impl Into<Self>) -> Self {
        self.binary(Operator::Ne, right)
    }

    /// Creates a less-than expression.
    #[must_use]
    pub fn lt(self, right: impl Into<Self>) -> Self {
        self.binary(Operator::Lt, right)
    }

    /// Creates a less-than-or-equal expression.
    #[must_use]
    pub fn lt_eq(self, right: impl Into<Self>) -> Self {
        self.binary(Operator::LtEq, right)
    }

    /// Creates a greater-than expression.
    #[must_use]
    pub fn gt(self, right: impl Into<Self>) -> Self {
        self.binary(Operator::Gt, right)
    }

    /// Creates a greater-than-or-equal expression.
    #[must_use]
    pub fn gt_eq(self, right: impl Into<Self>) -> Self {
        self.binary(Operator::GtEq, right)
    }

    /// Creates an IS NULL check.
    #[must_use]
    pub fn is_null(self) -> Self {
        self.unary(Operator::IsNull)
    }

    /// Creates an IS NOT NULL check.
    #[must_use]
    pub fn is_not_null(self) -> Self {
        self.unary(Operator::IsNotNull)
    }

    /// Creates a pattern match.
    #[must_use]
    pub fn like(self, pattern: impl Into<Self>) -> Self {
        self.binary(Operator::Like, pattern)
    }

    /// Concatenates a suffix to a string expression.
    #[must_use]
    pub fn append(self, suffix: impl Into<Self>) -> Self {
        self.binary(Operator::Concat, suffix)
    }

    /// Creates an empty-string check.
    #[must_use]
    pub fn is_empty(self) -> Self {
        self.unary(Operator::IsEmpty)
    }

    /// Creates a non-empty-string check.
    #[must_use]
    pub fn is_not_empty(self) -> Self {
        self.unary(Operator::IsNotEmpty)
    }

    /// Orders by this expression ascending.
    #[must_use]
    pub const fn asc(self) -> OrderSpecifier<Self> {
        OrderSpecifier::new(self, OrderDirection::Asc)
    }

    /// Orders by this expression descending.
    #[must_use]
    pub const fn desc(self) -> OrderSpecifier<Self> {
        OrderSpecifier::new(self, OrderDirection::Desc)
    }

    fn collect_params(&self, out: &mut Vec<(ParamKey, SqlValue)>) {
        match self {
            Self::Param(Param {
                key,
                value: Some(value),
            }) => out.push((key.clone(), value.clone())),
            Self::Operation { args, .. } => {
                for arg in args {
                    arg.collect_params(out);
                }
            }
            Self::Path(_) | Self::Constant { .. } | Self::Param(_) => {}
        }
    }
}

impl Expression for Expr {
    fn and(self, other: Self) -> Self {
        self.binary(Operator::And, other)
    }

    fn bound_params(&self) -> Vec<(ParamKey, SqlValue)> {
        let mut out = Vec::new();
        self.collect_params(&mut out);
        out
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{path}"),
            Self::Constant { value } => write!(f, "{value}"),
            Self::Param(param) => write!(f, "{}", param.key),
            Self::Operation { op, args } => {
                write!(f, "{}(", op.as_str())?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
        }
    }
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum ExprRef<'a> {
    Path(&'a Path),
    Constant { value: &'a SqlValue },
    Param(&'a Param),
    Operation { op: Operator, args: &'a [Expr] },
    Conjunction { terms: Vec<&'a Expr> },
}

#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum ExprRecord {
    Path(Path),
    Constant { value: SqlValue },
    Param(Param),
    Operation { op: Operator, args: Vec<Expr> },
    Conjunction { terms: Vec<Expr> },
}

impl Expr {
    /// Unwinds the left spine of binary `and` nodes, returning the terms in
    /// fold order, or `None` if `self` is not a binary `and`.
    fn conjunction_terms(&self) -> Option<Vec<&Self>> {
        let mut terms = Vec::new();
        let mut current = self;
        while let Self::Operation {
            op: Operator::And,
            args,
        } = current
        {
            let [left, right] = args.as_slice() else {
                break;
            };
            terms.push(right);
            current = left;
        }
        if terms.is_empty() {
            return None;
        }
        terms.push(current);
        terms.reverse();
        Some(terms)
    }
}

impl Serialize for Expr {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let record = match self {
            Self::Path(path) => ExprRef::Path(path),
            Self::Constant { value } => ExprRef::Constant { value },
            Self::Param(param) => ExprRef::Param(param),
            Self::Operation { op, args } => match self.conjunction_terms() {
                Some(terms) => ExprRef::Conjunction { terms },
                None => ExprRef::Operation { op: *op, args },
            },
        };
        record.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Expr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Ok(match ExprRecord::deserialize(deserializer)? {
            ExprRecord::Path(path) => Self::Path(path),
            ExprRecord::Constant { value } => Self::Constant { value },
            ExprRecord::Param(param) => Self::Param(param),
            ExprRecord::Operation { op, args } => Self::Operation { op, args },
            ExprRecord::Conjunction { terms } => {
                if terms.len() < 2 {
                    return Err(D::Error::custom("conjunction needs at least two terms"));
                }
                terms
                    .into_iter()
                    .reduce(Expression::and)
                    .ok_or_else(|| D::Error::custom("empty conjunction"))?
            }
        })
    }
}

impl From<Path> for Expr {
    fn from(path: Path) -> Self {
        Self::Path(path)
    }
}

impl From<Param> for Expr {
    fn from(param: Param) -> Self {
        Self::Param(param)
    }
}

impl From<SqlValue> for Expr {
    fn from(value: SqlValue) -> Self {
        Self::Constant { value }
    }
}

macro_rules! constant_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Expr {
                fn from(value: $ty) -> Self {
                    constant(value)
                }
            }
        )*
    };
}

constant_from!(bool, i64, i32, f64, String, &str);

/// Sort direction of an [`OrderSpecifier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderDirection {
    /// Ascending order (default).
    #[default]
    Asc,
    /// Descending order.
    Desc,
}

/// Placement of nulls in an [`OrderSpecifier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NullOrdering {
    /// NULLs come first.
    First,
    /// NULLs come last.
    Last,
}

/// An ORDER BY entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSpecifier<E> {
    /// The expression to order by.
    pub target: E,
    /// The direction.
    pub direction: OrderDirection,
    /// Null placement, left to the backend when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nulls: Option<NullOrdering>,
}

impl<E> OrderSpecifier<E> {
    /// Creates an order specifier.
    #[must_use]
    pub const fn new(target: E, direction: OrderDirection) -> Self {
        Self {
            target,
            direction,
            nulls: None,
        }
    }

    /// Puts nulls first.
    #[must_use]
    pub fn nulls_first(mut self) -> Self {
        self.nulls = Some(NullOrdering::First);
        self
    }

    /// Puts nulls last.
    #[must_use]
    pub fn nulls_last(mut self) -> Self {
        self.nulls = Some(NullOrdering::Last);
        self
    }

    /// Returns `true` for ascending order.
    #[must_use]
    pub const fn is_ascending(&self) -> bool {
        matches!(self.direction, OrderDirection::Asc)
    }
}

impl<E: fmt::Display> fmt::Display for OrderSpecifier<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let direction = match self.direction {
            OrderDirection::Asc => "asc",
            OrderDirection::Desc => "desc",
        };
        write!(f, "{} {direction}", self.target)?;
        match self.nulls {
            Some(NullOrdering::First) => write!(f, " nulls first"),
            Some(NullOrdering::Last) => write!(f, " nulls last"),
            None => Ok(()),
        }
    }
}
