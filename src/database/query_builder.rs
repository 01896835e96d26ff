use sqlx::postgres::{PgArguments, PgRow};
use sqlx::{self, FromRow};

use crate::database::manager::DatabaseError;

/// Bound parameter value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlParam {
    Int(i64),
    Text(String),
}

impl From<i64> for SqlParam {
    fn from(v: i64) -> Self {
        SqlParam::Int(v)
    }
}

impl From<String> for SqlParam {
    fn from(v: String) -> Self {
        SqlParam::Text(v)
    }
}

impl From<&str> for SqlParam {
    fn from(v: &str) -> Self {
        SqlParam::Text(v.to_string())
    }
}

impl From<&String> for SqlParam {
    fn from(v: &String) -> Self {
        SqlParam::Text(v.clone())
    }
}

/// Typed WHERE condition over a single column.
///
/// `EqualsAny` renders as `("col" = $1 OR "col" = $2 ...)`, `EqualsAll` as
/// `("col" = $1 AND "col" = $2 ...)`. An empty `EqualsAny` matches nothing and
/// an empty `EqualsAll` matches everything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    EqualsAny { field: String, values: Vec<SqlParam> },
    EqualsAll { field: String, values: Vec<SqlParam> },
}

impl Condition {
    pub fn equals_any<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlParam>,
    {
        Condition::EqualsAny {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn equals_all<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlParam>,
    {
        Condition::EqualsAll {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn equals(field: impl Into<String>, value: impl Into<SqlParam>) -> Self {
        Self::equals_all(field, [value.into()])
    }

    fn render(&self, params: &mut Vec<SqlParam>) -> Result<String, DatabaseError> {
        let (field, values, joiner, empty) = match self {
            Condition::EqualsAny { field, values } => (field, values, " OR ", "FALSE"),
            Condition::EqualsAll { field, values } => (field, values, " AND ", "TRUE"),
        };
        validate_identifier(field)?;
        if values.is_empty() {
            return Ok(empty.to_string());
        }
        let parts: Vec<String> = values
            .iter()
            .map(|v| {
                params.push(v.clone());
                format!("\"{}\" = ${}", field, params.len())
            })
            .collect();
        Ok(format!("({})", parts.join(joiner)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<SqlParam>,
}

fn validate_identifier(name: &str) -> Result<(), DatabaseError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => (first.is_ascii_alphabetic() || first == '_') && chars.all(|c| c.is_ascii_alphanumeric() || c == '_'),
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(DatabaseError::QueryError(format!("Invalid identifier: {:?}", name)))
    }
}

fn where_clause(conditions: &[Condition], params: &mut Vec<SqlParam>) -> Result<String, DatabaseError> {
    if conditions.is_empty() {
        return Ok(String::new());
    }
    let parts = conditions
        .iter()
        .map(|c| c.render(params))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(format!("WHERE {}", parts.join(" AND ")))
}

fn quoted_columns(columns: &[String]) -> Result<String, DatabaseError> {
    if columns.is_empty() {
        return Ok("*".to_string());
    }
    for c in columns {
        validate_identifier(c)?;
    }
    Ok(columns.iter().map(|c| format!("\"{}\"", c)).collect::<Vec<_>>().join(", "))
}

/// SELECT builder; conditions are AND-joined
#[derive(Debug, Clone)]
pub struct SelectQuery {
    table_name: String,
    columns: Vec<String>,
    conditions: Vec<Condition>,
    order: Vec<(String, SortDirection)>,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl SelectQuery {
    pub fn from(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            columns: vec![],
            conditions: vec![],
            order: vec![],
            limit: None,
            offset: None,
        }
    }

    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, direction: SortDirection) -> Self {
        self.order.push((column.into(), direction));
        self
    }

    pub fn limit(mut self, limit: i64, offset: Option<i64>) -> Self {
        self.limit = Some(limit);
        self.offset = offset;
        self
    }

    pub fn to_sql(&self) -> Result<SqlResult, DatabaseError> {
        validate_identifier(&self.table_name)?;
        let mut params = vec![];
        let where_sql = where_clause(&self.conditions, &mut params)?;

        let order_sql = if self.order.is_empty() {
            String::new()
        } else {
            let parts = self
                .order
                .iter()
                .map(|(c, d)| validate_identifier(c).map(|_| format!("\"{}\" {}", c, d.to_sql())))
                .collect::<Result<Vec<_>, _>>()?;
            format!("ORDER BY {}", parts.join(", "))
        };

        let limit_sql = match (self.limit, self.offset) {
            (Some(l), Some(o)) => format!("LIMIT {} OFFSET {}", l, o),
            (Some(l), None) => format!("LIMIT {}", l),
            _ => String::new(),
        };

        let query = [
            format!("SELECT {}", quoted_columns(&self.columns)?),
            format!("FROM \"{}\"", self.table_name),
            where_sql,
            order_sql,
            limit_sql,
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        Ok(SqlResult { query, params })
    }
}

/// INSERT builder with optional RETURNING column
#[derive(Debug, Clone)]
pub struct InsertQuery {
    table_name: String,
    values: Vec<(String, SqlParam)>,
    returning: Option<String>,
}

impl InsertQuery {
    pub fn into_table(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            values: vec![],
            returning: None,
        }
    }

    pub fn value(mut self, column: impl Into<String>, value: impl Into<SqlParam>) -> Self {
        self.values.push((column.into(), value.into()));
        self
    }

    pub fn returning(mut self, column: impl Into<String>) -> Self {
        self.returning = Some(column.into());
        self
    }

    pub fn to_sql(&self) -> Result<SqlResult, DatabaseError> {
        validate_identifier(&self.table_name)?;
        if self.values.is_empty() {
            return Err(DatabaseError::QueryError("INSERT requires at least one value".to_string()));
        }
        let columns: Vec<String> = self.values.iter().map(|(c, _)| c.clone()).collect();
        let placeholders: Vec<String> = (1..=self.values.len()).map(|i| format!("${}", i)).collect();
        let mut query = format!(
            "INSERT INTO \"{}\" ({}) VALUES ({})",
            self.table_name,
            quoted_columns(&columns)?,
            placeholders.join(", ")
        );
        if let Some(ref col) = self.returning {
            validate_identifier(col)?;
            query.push_str(&format!(" RETURNING \"{}\"", col));
        }
        Ok(SqlResult {
            query,
            params: self.values.iter().map(|(_, v)| v.clone()).collect(),
        })
    }
}

/// UPDATE builder; refuses to run without a condition
#[derive(Debug, Clone)]
pub struct UpdateQuery {
    table_name: String,
    assignments: Vec<(String, SqlParam)>,
    conditions: Vec<Condition>,
}

impl UpdateQuery {
    pub fn table(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            assignments: vec![],
            conditions: vec![],
        }
    }

    pub fn set(mut self, column: impl Into<String>, value: impl Into<SqlParam>) -> Self {
        self.assignments.push((column.into(), value.into()));
        self
    }

    pub fn condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn to_sql(&self) -> Result<SqlResult, DatabaseError> {
        validate_identifier(&self.table_name)?;
        if self.assignments.is_empty() {
            return Err(DatabaseError::QueryError("UPDATE requires at least one assignment".to_string()));
        }
        if self.conditions.is_empty() {
            return Err(DatabaseError::QueryError("UPDATE without condition is not allowed".to_string()));
        }
        let mut params = vec![];
        let mut sets = vec![];
        for (column, value) in &self.assignments {
            validate_identifier(column)?;
            params.push(value.clone());
            sets.push(format!("\"{}\" = ${}", column, params.len()));
        }
        let where_sql = where_clause(&self.conditions, &mut params)?;
        Ok(SqlResult {
            query: format!("UPDATE \"{}\" SET {} {}", self.table_name, sets.join(", "), where_sql),
            params,
        })
    }
}

/// DELETE builder; refuses to run without a condition
#[derive(Debug, Clone)]
pub struct DeleteQuery {
    table_name: String,
    conditions: Vec<Condition>,
}

impl DeleteQuery {
    pub fn from(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            conditions: vec![],
        }
    }

    pub fn condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn to_sql(&self) -> Result<SqlResult, DatabaseError> {
        validate_identifier(&self.table_name)?;
        if self.conditions.is_empty() {
            return Err(DatabaseError::QueryError("DELETE without condition is not allowed".to_string()));
        }
        let mut params = vec![];
        let where_sql = where_clause(&self.conditions, &mut params)?;
        Ok(SqlResult {
            query: format!("DELETE FROM \"{}\" {}", self.table_name, where_sql),
            params,
        })
    }
}

pub(crate) fn bind_param_query<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    v: &'q SqlParam,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match v {
        SqlParam::Int(i) => q.bind(*i),
        SqlParam::Text(s) => q.bind(s.as_str()),
    }
}

pub(crate) fn bind_param_query_as<'q, O>(
    q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>,
    v: &'q SqlParam,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, PgRow>,
{
    match v {
        SqlParam::Int(i) => q.bind(*i),
        SqlParam::Text(s) => q.bind(s.as_str()),
    }
}

pub(crate) fn bind_param_query_scalar<'q, O>(
    q: sqlx::query::QueryScalar<'q, sqlx::Postgres, O, PgArguments>,
    v: &'q SqlParam,
) -> sqlx::query::QueryScalar<'q, sqlx::Postgres, O, PgArguments> {
    match v {
        SqlParam::Int(i) => q.bind(*i),
        SqlParam::Text(s) => q.bind(s.as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equals_any_renders_or_group() {
        let sql = SelectQuery::from("protected_pages")
            .columns(["pid", "path"])
            .condition(Condition::equals_any("path", ["/node/12", "/secret"]))
            .order_by("pid", SortDirection::Asc)
            .limit(1, None)
            .to_sql()
            .unwrap();
        assert_eq!(
            sql.query,
            "SELECT \"pid\", \"path\" FROM \"protected_pages\" WHERE (\"path\" = $1 OR \"path\" = $2) ORDER BY \"pid\" ASC LIMIT 1"
        );
        assert_eq!(sql.params, vec![SqlParam::from("/node/12"), SqlParam::from("/secret")]);
    }

    #[test]
    fn conditions_are_and_joined_with_continuous_placeholders() {
        let sql = SelectQuery::from("protected_pages")
            .condition(Condition::equals_any("path", ["/a", "/b"]))
            .condition(Condition::equals("pid", 3_i64))
            .to_sql()
            .unwrap();
        assert_eq!(
            sql.query,
            "SELECT * FROM \"protected_pages\" WHERE (\"path\" = $1 OR \"path\" = $2) AND (\"pid\" = $3)"
        );
        assert_eq!(sql.params.len(), 3);
    }

    #[test]
    fn empty_value_lists_short_circuit() {
        let none: Vec<String> = vec![];
        let sql = SelectQuery::from("t")
            .condition(Condition::equals_any("path", none.clone()))
            .condition(Condition::equals_all("path", none))
            .to_sql()
            .unwrap();
        assert_eq!(sql.query, "SELECT * FROM \"t\" WHERE FALSE AND TRUE");
        assert!(sql.params.is_empty());
    }

    #[test]
    fn rejects_injected_identifiers() {
        let err = SelectQuery::from("protected_pages")
            .condition(Condition::equals("path\" OR 1=1 --", "/x"))
            .to_sql();
        assert!(matches!(err, Err(DatabaseError::QueryError(_))));
        assert!(SelectQuery::from("bad table").to_sql().is_err());
    }

    #[test]
    fn update_places_assignments_before_conditions() {
        let sql = UpdateQuery::table("protected_pages")
            .set("path", "/new")
            .set("password", "hash")
            .condition(Condition::equals("pid", 9_i64))
            .to_sql()
            .unwrap();
        assert_eq!(
            sql.query,
            "UPDATE \"protected_pages\" SET \"path\" = $1, \"password\" = $2 WHERE (\"pid\" = $3)"
        );
        assert_eq!(sql.params[2], SqlParam::Int(9));
    }

    #[test]
    fn unconditioned_writes_are_refused() {
        assert!(UpdateQuery::table("t").set("path", "/x").to_sql().is_err());
        assert!(DeleteQuery::from("t").to_sql().is_err());
    }

    #[test]
    fn insert_returns_pid() {
        let sql = InsertQuery::into_table("protected_pages")
            .value("path", "/secret")
            .value("password", "hash")
            .returning("pid")
            .to_sql()
            .unwrap();
        assert_eq!(
            sql.query,
            "INSERT INTO \"protected_pages\" (\"path\", \"password\") VALUES ($1, $2) RETURNING \"pid\""
        );
    }
}
