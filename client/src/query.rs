use std::fmt::Display;

/// Characters that carry meaning in the standard query parser syntax.
const QUERY_METACHARACTERS: &[char] = &[
    '+', '-', '&', '|', '!', '(', ')', '{', '}', '[', ']', '^', '"', '~', '*', '?', ':', '\\',
];

/// Backslash-escape every query-syntax metacharacter in `value`.
pub fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if QUERY_METACHARACTERS.contains(&ch) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Query builder for constructing field-scoped select expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryExpr {
    /// A quoted phrase scoped to a single field
    Phrase { field: String, value: String },
    /// Logical AND operation
    And(Box<QueryExpr>, Box<QueryExpr>),
    /// Logical OR operation
    Or(Box<QueryExpr>, Box<QueryExpr>),
}

impl QueryExpr {
    /// Create a field-scoped phrase expression
    pub fn phrase<F: Into<String>, V: Into<String>>(field: F, value: V) -> Self {
        QueryExpr::Phrase {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Create an AND expression with another expression
    pub fn and(self, other: QueryExpr) -> Self {
        QueryExpr::And(Box::new(self), Box::new(other))
    }

    /// Create an OR expression with another expression
    pub fn or(self, other: QueryExpr) -> Self {
        QueryExpr::Or(Box::new(self), Box::new(other))
    }

    /// OR together every expression, `None` when there are none
    pub fn any_of<I: IntoIterator<Item = QueryExpr>>(exprs: I) -> Option<QueryExpr> {
        exprs.into_iter().reduce(QueryExpr::or)
    }

    /// AND together every expression, `None` when there are none
    pub fn all_of<I: IntoIterator<Item = QueryExpr>>(exprs: I) -> Option<QueryExpr> {
        exprs.into_iter().reduce(QueryExpr::and)
    }

    /// Convert the expression to a query string for the `q` parameter
    pub fn to_query_string(&self) -> String {
        match self {
            QueryExpr::Phrase { field, value } => format!("{}:\"{}\"", field, escape(value)),
            QueryExpr::And(left, right) => format!(
                "({} AND {})",
                left.to_query_string(),
                right.to_query_string()
            ),
            QueryExpr::Or(left, right) => format!(
                "({} OR {})",
                left.to_query_string(),
                right.to_query_string()
            ),
        }
    }
}

impl Display for QueryExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_query_string())
    }
}

/// Builder for constructing conjunctive queries fluently
pub struct QueryBuilder {
    expr: Option<QueryExpr>,
}

impl QueryBuilder {
    /// Create a new empty query builder
    pub fn new() -> Self {
        Self { expr: None }
    }

    /// Add an AND condition with a complex expression
    pub fn and_expr(mut self, expr: QueryExpr) -> Self {
        self.expr = Some(match self.expr {
            Some(existing) => existing.and(expr),
            None => expr,
        });
        self
    }

    /// Add an OR condition with a complex expression
    pub fn or_expr(mut self, expr: QueryExpr) -> Self {
        self.expr = Some(match self.expr {
            Some(existing) => existing.or(expr),
            None => expr,
        });
        self
    }

    /// Build the final query expression
    pub fn build(self) -> Option<QueryExpr> {
        self.expr
    }

    /// Build and convert to query string
    pub fn to_query_string(self) -> Option<String> {
        self.expr.map(|expr| expr.to_query_string())
    }
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
