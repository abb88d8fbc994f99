//! Integration tests for rendered SQL.
//!
//! These tests verify full statements produced by compiling a filter and
//! finishing the SQL criteria: joins, placeholders per dialect, ordering
//! through relation joins, and the count statement.

use insta::assert_snapshot;
use pretty_assertions::assert_eq;

use sieve::prelude::*;
use sieve::sql::{DatabaseType, RelationSpec, SqlCriteria};
use sieve::spec::Operation;
use sieve::NullsOrder;

#[derive(Default)]
struct PersonFilter {
    name: Option<String>,
    status: Option<String>,
    tipo_sexo_descricao: Option<String>,
    tags: Option<i64>,
}

sieve::filter_spec!(PersonFilter {
    name => StartsWith,
    status => Equal @ "account.status",
    tipo_sexo_descricao as "tipoSexoDescricao" => Like @ "tipoSexo.nome",
    tags => SizeGt,
});

fn render(
    compiler: &SpecificationCompiler,
    filter: &PersonFilter,
    page: &PageRequest,
    mut criteria: SqlCriteria,
) -> sieve::sql::SelectQuery {
    let compiled = compiler.compile(filter, page, &mut criteria).unwrap();
    criteria.finish(&compiled.constraint, &compiled.page).unwrap()
}

#[test]
fn test_page_with_relation_sort() {
    let filter = PersonFilter {
        name: Some("Jo".into()),
        status: Some("ACTIVE".into()),
        ..Default::default()
    };
    let page = PageRequest::of(2, 25).with_sort([OrderByField::desc("status")]);
    let query = render(
        &SpecificationCompiler::default(),
        &filter,
        &page,
        SqlCriteria::new("people"),
    );

    assert_snapshot!(query.sql, @"SELECT t0.* FROM people t0 LEFT JOIN account j1 ON t0.account_id = j1.id WHERE (LOWER(t0.name) LIKE $1 AND j1.status = $2) ORDER BY j1.status DESC LIMIT 25 OFFSET 50");
    assert_snapshot!(query.count_sql, @"SELECT COUNT(*) FROM people t0 LEFT JOIN account j1 ON t0.account_id = j1.id WHERE (LOWER(t0.name) LIKE $1 AND j1.status = $2)");
    assert_eq!(query.params, vec![FilterValue::from("jo%"), FilterValue::from("ACTIVE")]);
}

#[test]
fn test_sort_only_join_is_left_out_of_count() {
    let page = PageRequest::of(0, 10).with_sort([
        OrderByField::asc("tipoSexoDescricao"),
        OrderByField::desc("name"),
    ]);
    let query = render(
        &SpecificationCompiler::default(),
        &PersonFilter::default(),
        &page,
        SqlCriteria::new("people"),
    );

    assert_snapshot!(query.sql, @"SELECT t0.* FROM people t0 LEFT JOIN tipoSexo j1 ON t0.tipoSexo_id = j1.id ORDER BY j1.nome ASC, t0.name DESC LIMIT 10");
    assert_snapshot!(query.count_sql, @"SELECT COUNT(*) FROM people t0");
}

#[test]
fn test_mysql_inner_join_registered_relation() {
    let compiler =
        SpecificationCompiler::new(CompilerConfig::new().join_type(JoinType::Inner)).unwrap();
    let criteria = SqlCriteria::new("people")
        .with_database(DatabaseType::MySQL)
        .with_relation(
            "account",
            RelationSpec::many_to_one("account", "accounts")
                .fields(["account_ref"])
                .references(["uuid"]),
        );
    let filter = PersonFilter {
        status: Some("LOCKED".into()),
        ..Default::default()
    };
    let page = PageRequest::of(0, 20).with_sort([OrderByField::asc("name").nulls(NullsOrder::Last)]);
    let query = render(&compiler, &filter, &page, criteria);

    assert_snapshot!(query.sql, @"SELECT t0.* FROM people t0 INNER JOIN accounts j1 ON t0.account_ref = j1.uuid WHERE j1.status = ? ORDER BY t0.name ASC NULLS LAST LIMIT 20");
}

#[test]
fn test_collection_size_per_dialect() {
    let filter = PersonFilter {
        tags: Some(3),
        ..Default::default()
    };
    let compiler = SpecificationCompiler::default();
    let page = PageRequest::of(0, 5);

    let postgres = render(
        &compiler,
        &filter,
        &page,
        SqlCriteria::new("people").with_collection("tags"),
    );
    assert_snapshot!(postgres.sql, @"SELECT t0.* FROM people t0 WHERE CARDINALITY(t0.tags) > $1 LIMIT 5");

    let sqlite = render(
        &compiler,
        &filter,
        &page,
        SqlCriteria::new("people")
            .with_database(DatabaseType::SQLite)
            .with_collection("tags"),
    );
    assert_snapshot!(sqlite.sql, @"SELECT t0.* FROM people t0 WHERE json_array_length(t0.tags) > ? LIMIT 5");
}

#[test]
fn test_reserved_names_are_quoted() {
    #[derive(Default)]
    struct OrderFilter {
        group: Option<String>,
    }
    sieve::filter_spec!(OrderFilter {
        group => Equal @ "user.group",
    });

    let mut criteria = SqlCriteria::new("order");
    let filter = OrderFilter {
        group: Some("staff".into()),
    };
    let compiled = SpecificationCompiler::default()
        .compile(&filter, &PageRequest::of(0, 1), &mut criteria)
        .unwrap();
    let query = criteria.finish(&compiled.constraint, &compiled.page).unwrap();

    assert_snapshot!(query.sql, @r#"SELECT t0.* FROM "order" t0 LEFT JOIN "user" j1 ON t0.user_id = j1.id WHERE j1."group" = $1 LIMIT 1"#);
}

#[test]
fn test_mysql_quotes_with_backticks() {
    #[derive(Default)]
    struct OrderFilter {
        order: Option<String>,
        group: Option<String>,
    }
    sieve::filter_spec!(OrderFilter {
        order => Equal,
        group => Equal @ "key.group",
    });

    let filter = OrderFilter {
        order: Some("A1".into()),
        group: Some("staff".into()),
    };
    let mut criteria = SqlCriteria::new("user").with_database(DatabaseType::MySQL);
    let compiled = SpecificationCompiler::default()
        .compile(
            &filter,
            &PageRequest::of(0, 5).with_sort([OrderByField::asc("order")]),
            &mut criteria,
        )
        .unwrap();
    let query = criteria.finish(&compiled.constraint, &compiled.page).unwrap();

    assert_snapshot!(query.sql, @"SELECT t0.* FROM `user` t0 LEFT JOIN `key` j1 ON t0.key_id = j1.id WHERE (t0.`order` = ? AND j1.`group` = ?) ORDER BY t0.`order` ASC LIMIT 5");
    assert!(!query.count_sql.contains('"'));
}

#[test]
fn test_operation_names_for_request_parsing() {
    let op: Operation = "not_between".parse().unwrap();
    assert_eq!(op, Operation::NotBetween);
    assert_eq!(op.to_string(), "NOT_BETWEEN");
}
