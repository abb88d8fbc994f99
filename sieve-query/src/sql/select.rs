//! Rendered select statements.

use super::criteria::{JoinClause, ROOT_ALIAS};
use super::{DatabaseType, quote_identifier};
use crate::filter::{Expr, Filter, FilterValue};
use crate::pagination::PageRequest;
use crate::types::OrderByField;

/// A parameterized page query plus the matching count query.
///
/// Both statements share `params`.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    /// `SELECT ... LIMIT ... OFFSET ...`
    pub sql: String,
    /// `SELECT COUNT(*) ...` over the same constraint, without ordering joins.
    pub count_sql: String,
    /// Values to bind, in placeholder order.
    pub params: Vec<FilterValue>,
}

impl SelectQuery {
    pub(super) fn build(
        table: &str,
        joins: &[JoinClause],
        filter_joins: usize,
        constraint: &Filter,
        order: &[(OrderByField, Expr)],
        page: &PageRequest,
        db: DatabaseType,
    ) -> Self {
        let mut params = Vec::new();
        let mut where_clause = String::new();
        if !constraint.is_none() {
            where_clause.push_str(" WHERE ");
            constraint.write_sql(&mut where_clause, &mut params, db);
        }

        let from = format!("{} {}", quote_identifier(table, db), ROOT_ALIAS);

        let mut sql = format!("SELECT {}.* FROM {}", ROOT_ALIAS, from);
        write_joins(&mut sql, joins, db);
        sql.push_str(&where_clause);
        if !order.is_empty() {
            sql.push_str(" ORDER BY ");
            for (i, (field, expr)) in order.iter().enumerate() {
                if i > 0 {
                    sql.push_str(", ");
                }
                field.write_sql(&mut sql, &expr.to_sql(db));
            }
        }
        sql.push(' ');
        page.write_sql(&mut sql);

        let mut count_sql = format!("SELECT COUNT(*) FROM {}", from);
        write_joins(&mut count_sql, &joins[..filter_joins.min(joins.len())], db);
        count_sql.push_str(&where_clause);

        Self {
            sql,
            count_sql,
            params,
        }
    }
}

fn write_joins(buf: &mut String, joins: &[JoinClause], db: DatabaseType) {
    for join in joins {
        buf.push(' ');
        buf.push_str(join.join_type.as_sql());
        buf.push(' ');
        buf.push_str(&quote_identifier(&join.table, db));
        buf.push(' ');
        buf.push_str(&join.alias);
        buf.push_str(" ON ");
        buf.push_str(&join.on);
    }
}
