//! Fluent SQL builder
//!
//! Builds the SELECT statements the query clients emit. The rendered
//! string is opaque to the rest of the core; it is handed to the
//! coordinator's execution backend as-is.

use std::fmt::Write as _;

use vt_core::schema::SortKey;

/// A SQL expression tree
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Quoted column reference
    Column(String),
    /// Literal value
    Literal(Literal),
    /// `CAST(expr AS type)`
    Cast { expr: Box<Expr>, ty: String },
    /// `count(*)`
    CountStar,
    /// `row_number() OVER (ORDER BY ...)`; empty keys render `OVER ()`
    RowNumberOver(Vec<SortKey>),
    /// `expr AS alias`
    Alias { expr: Box<Expr>, alias: String },
    /// Binary comparison or connective
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Escape hatch for predicates the tree does not model
    Raw(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    fn as_sql(&self) -> &'static str {
        match self {
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Null,
}

/// Quoted column reference
pub fn column(name: impl Into<String>) -> Expr {
    Expr::Column(name.into())
}

/// `CAST(expr AS type)`
pub fn cast(expr: Expr, ty: impl Into<String>) -> Expr {
    Expr::Cast {
        expr: Box::new(expr),
        ty: ty.into(),
    }
}

/// `count(*)`
pub fn count_star() -> Expr {
    Expr::CountStar
}

/// `row_number() OVER (ORDER BY <keys>)`
pub fn row_number_over(keys: Vec<SortKey>) -> Expr {
    Expr::RowNumberOver(keys)
}

pub fn lit_int(v: i64) -> Expr {
    Expr::Literal(Literal::Int(v))
}

pub fn lit_str(v: impl Into<String>) -> Expr {
    Expr::Literal(Literal::Str(v.into()))
}

impl Expr {
    pub fn alias(self, alias: impl Into<String>) -> Expr {
        Expr::Alias {
            expr: Box::new(self),
            alias: alias.into(),
        }
    }

    pub fn eq(self, other: Expr) -> Expr {
        self.binary(BinaryOp::Eq, other)
    }

    pub fn ne(self, other: Expr) -> Expr {
        self.binary(BinaryOp::Ne, other)
    }

    pub fn gt(self, other: Expr) -> Expr {
        self.binary(BinaryOp::Gt, other)
    }

    pub fn ge(self, other: Expr) -> Expr {
        self.binary(BinaryOp::Ge, other)
    }

    pub fn lt(self, other: Expr) -> Expr {
        self.binary(BinaryOp::Lt, other)
    }

    pub fn le(self, other: Expr) -> Expr {
        self.binary(BinaryOp::Le, other)
    }

    pub fn and(self, other: Expr) -> Expr {
        self.binary(BinaryOp::And, other)
    }

    pub fn or(self, other: Expr) -> Expr {
        self.binary(BinaryOp::Or, other)
    }

    pub fn raw(sql: impl Into<String>) -> Expr {
        Expr::Raw(sql.into())
    }

    fn binary(self, op: BinaryOp, other: Expr) -> Expr {
        Expr::Binary {
            op,
            left: Box::new(self),
            right: Box::new(other),
        }
    }

    pub fn to_sql(&self) -> String {
        match self {
            Expr::Column(name) => quote_ident(name),
            Expr::Literal(lit) => render_literal(lit),
            Expr::Cast { expr, ty } => format!("CAST({} AS {})", expr.to_sql(), ty),
            Expr::CountStar => "count(*)".to_string(),
            Expr::RowNumberOver(keys) => {
                if keys.is_empty() {
                    "row_number() OVER ()".to_string()
                } else {
                    format!("row_number() OVER (ORDER BY {})", render_sort(keys))
                }
            }
            Expr::Alias { expr, alias } => {
                format!("{} AS {}", expr.to_sql(), quote_ident(alias))
            }
            Expr::Binary { op, left, right } => {
                format!("({} {} {})", left.to_sql(), op.as_sql(), right.to_sql())
            }
            Expr::Raw(sql) => sql.clone(),
        }
    }
}

/// A SELECT statement under construction
#[derive(Debug, Clone)]
pub struct Query {
    table: String,
    projections: Vec<Expr>,
    filter: Option<Expr>,
    order_by: Vec<SortKey>,
    limit: Option<usize>,
    offset: Option<usize>,
}

impl Query {
    pub fn from(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            projections: Vec::new(),
            filter: None,
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    pub fn select(mut self, projections: Vec<Expr>) -> Self {
        self.projections = projections;
        self
    }

    pub fn filter(mut self, filter: Option<Expr>) -> Self {
        self.filter = filter;
        self
    }

    pub fn order_by(mut self, keys: Vec<SortKey>) -> Self {
        self.order_by = keys;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn to_sql(&self) -> String {
        let mut sql = String::from("SELECT ");
        if self.projections.is_empty() {
            sql.push('*');
        } else {
            let rendered: Vec<String> = self.projections.iter().map(|p| p.to_sql()).collect();
            sql.push_str(&rendered.join(", "));
        }
        let _ = write!(sql, " FROM {}", quote_ident(&self.table));
        if let Some(filter) = &self.filter {
            let _ = write!(sql, " WHERE {}", filter.to_sql());
        }
        if !self.order_by.is_empty() {
            let _ = write!(sql, " ORDER BY {}", render_sort(&self.order_by));
        }
        if let Some(limit) = self.limit {
            let _ = write!(sql, " LIMIT {limit}");
        }
        if let Some(offset) = self.offset {
            let _ = write!(sql, " OFFSET {offset}");
        }
        sql
    }
}

fn render_sort(keys: &[SortKey]) -> String {
    keys.iter()
        .map(|key| {
            if key.desc {
                format!("{} DESC", quote_ident(&key.column))
            } else {
                quote_ident(&key.column)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_literal(lit: &Literal) -> String {
    match lit {
        Literal::Int(v) => v.to_string(),
        Literal::Float(v) => v.to_string(),
        Literal::Str(v) => format!("'{}'", v.replace('\'', "''")),
        Literal::Bool(v) => if *v { "TRUE" } else { "FALSE" }.to_string(),
        Literal::Null => "NULL".to_string(),
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_query_shape() {
        let sql = Query::from("people")
            .select(vec![count_star().alias("count")])
            .filter(Some(Expr::raw("age > 30")))
            .to_sql();
        assert_eq!(
            sql,
            "SELECT count(*) AS \"count\" FROM \"people\" WHERE age > 30"
        );
    }

    #[test]
    fn row_window_query_shape() {
        use vt_core::schema::SortKey;

        let sort = vec![SortKey::desc("age"), SortKey::asc("name")];
        let sql = Query::from("people")
            .select(vec![
                column("name"),
                cast(column("id"), "TEXT").alias("id"),
                row_number_over(sort.clone()).alias("__oid"),
            ])
            .order_by(sort)
            .limit(100)
            .offset(40)
            .to_sql();
        assert_eq!(
            sql,
            "SELECT \"name\", CAST(\"id\" AS TEXT) AS \"id\", \
             row_number() OVER (ORDER BY \"age\" DESC, \"name\") AS \"__oid\" \
             FROM \"people\" ORDER BY \"age\" DESC, \"name\" LIMIT 100 OFFSET 40"
        );
    }

    #[test]
    fn unsorted_row_number_renders_empty_over() {
        assert_eq!(row_number_over(vec![]).to_sql(), "row_number() OVER ()");
    }

    #[test]
    fn comparison_and_connectives() {
        let filter = column("age").gt(lit_int(30)).and(column("city").eq(lit_str("Oslo")));
        assert_eq!(filter.to_sql(), "((\"age\" > 30) AND (\"city\" = 'Oslo'))");
    }

    #[test]
    fn string_literals_are_escaped() {
        assert_eq!(lit_str("O'Brien").to_sql(), "'O''Brien'");
    }
}
