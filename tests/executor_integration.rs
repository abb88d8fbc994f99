//! Integration tests for the execution seam and custom criteria backends.

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use std::sync::Mutex;

use sieve::prelude::*;
use sieve::sql::{SelectQuery, SqlCriteria};

#[derive(Debug, Clone, PartialEq)]
struct Person {
    id: i64,
    name: String,
}

/// Serves fixed rows, slicing them by the requested page.
struct InMemoryExecutor {
    rows: Vec<Person>,
    statements: Mutex<Vec<String>>,
}

#[async_trait]
impl SpecificationExecutor<Person> for InMemoryExecutor {
    async fn find_page(&self, query: &SelectQuery, page: &PageRequest) -> QueryResult<Page<Person>> {
        let mut statements = self
            .statements
            .lock()
            .map_err(|_| QueryError::internal("statement log poisoned"))?;
        statements.push(query.sql.clone());
        statements.push(query.count_sql.clone());

        let items = self
            .rows
            .iter()
            .skip(page.offset() as usize)
            .take(page.size() as usize)
            .cloned()
            .collect();
        Ok(Page::new(items, page.clone(), self.rows.len() as u64))
    }
}

#[derive(Default)]
struct PersonFilter {
    name: Option<String>,
    status: Option<String>,
}

sieve::filter_spec!(PersonFilter {
    name => Like,
    status => Equal @ "account.status",
});

fn executor() -> InMemoryExecutor {
    InMemoryExecutor {
        rows: (1..=7)
            .map(|id| Person {
                id,
                name: format!("person-{}", id),
            })
            .collect(),
        statements: Mutex::new(Vec::new()),
    }
}

#[tokio::test]
async fn test_find_pages_through_executor() {
    let executor = executor();
    let compiler = SpecificationCompiler::default();
    let filter = PersonFilter {
        status: Some("ACTIVE".into()),
        ..Default::default()
    };

    let page = executor
        .find(
            &compiler,
            &filter,
            &PageRequest::of(1, 3),
            SqlCriteria::new("people"),
        )
        .await
        .unwrap();

    assert_eq!(page.items.iter().map(|p| p.id).collect::<Vec<_>>(), vec![4, 5, 6]);
    assert_eq!(page.total, 7);
    assert_eq!(page.total_pages(), 3);
    assert!(page.has_next());

    let names = page.map(|p| p.name);
    assert_eq!(names.items[0], "person-4");

    let statements = executor.statements.lock().unwrap();
    assert_eq!(
        statements[0],
        "SELECT t0.* FROM people t0 LEFT JOIN account j1 ON t0.account_id = j1.id \
         WHERE j1.status = $1 LIMIT 3 OFFSET 3"
    );
    assert_eq!(
        statements[1],
        "SELECT COUNT(*) FROM people t0 LEFT JOIN account j1 ON t0.account_id = j1.id \
         WHERE j1.status = $1"
    );
}

#[tokio::test]
async fn test_compile_error_skips_execution() {
    #[derive(Default)]
    struct BadFilter {
        name: Option<i64>,
    }
    sieve::filter_spec!(BadFilter {
        name => Like,
    });

    let executor = executor();
    let err = executor
        .find(
            &SpecificationCompiler::default(),
            &BadFilter { name: Some(1) },
            &PageRequest::default(),
            SqlCriteria::new("people"),
        )
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::InvalidFilterValue);
    assert!(executor.statements.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_deep_sort_key_is_rejected() {
    let executor = executor();
    let compiler =
        SpecificationCompiler::new(CompilerConfig::new().max_relation_depth(2)).unwrap();
    let deep = (0..50).map(|i| format!("r{}", i)).collect::<Vec<_>>().join(".");

    let err = executor
        .find(
            &compiler,
            &PersonFilter::default(),
            &PageRequest::of(0, 5).with_sort([OrderByField::asc(deep)]),
            SqlCriteria::new("people"),
        )
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::InvalidRelationPath);
    assert!(err.is_configuration_error());
    assert!(executor.statements.lock().unwrap().is_empty());
}

/// Renders predicates as plain text, resolving joins by relation name only.
#[derive(Default)]
struct TextCriteria {
    joins: Vec<String>,
}

impl CriteriaBuilder for TextCriteria {
    type Attr = String;
    type Join = String;
    type Predicate = String;

    fn root_attr(&mut self, name: &str) -> QueryResult<String> {
        Ok(name.to_string())
    }

    fn join_attr(&mut self, join: &String, name: &str) -> QueryResult<String> {
        Ok(format!("{}.{}", join, name))
    }

    fn join_root(&mut self, relation: &str, join_type: JoinType) -> QueryResult<String> {
        self.joins.push(format!("{} {}", join_type, relation));
        Ok(relation.to_string())
    }

    fn join_from(&mut self, parent: &String, relation: &str, join_type: JoinType) -> QueryResult<String> {
        let path = format!("{}.{}", parent, relation);
        self.joins.push(format!("{} {}", join_type, path));
        Ok(path)
    }

    fn lower(&self, attr: &String) -> String {
        format!("lower({})", attr)
    }

    fn as_instant(&self, attr: &String) -> String {
        format!("instant({})", attr)
    }

    fn size(&self, attr: &String) -> QueryResult<String> {
        Err(QueryError::not_a_collection(attr.clone()))
    }

    fn equal(&self, attr: &String, value: FilterValue) -> String {
        format!("{} = {:?}", attr, value)
    }

    fn not_equal(&self, attr: &String, value: FilterValue) -> String {
        format!("{} != {:?}", attr, value)
    }

    fn greater_than(&self, attr: &String, value: FilterValue) -> String {
        format!("{} > {:?}", attr, value)
    }

    fn greater_or_equal(&self, attr: &String, value: FilterValue) -> String {
        format!("{} >= {:?}", attr, value)
    }

    fn less_than(&self, attr: &String, value: FilterValue) -> String {
        format!("{} < {:?}", attr, value)
    }

    fn less_or_equal(&self, attr: &String, value: FilterValue) -> String {
        format!("{} <= {:?}", attr, value)
    }

    fn like(&self, attr: &String, pattern: String) -> String {
        format!("{} like '{}'", attr, pattern)
    }

    fn is_in(&self, attr: &String, values: Vec<FilterValue>) -> String {
        format!("{} in {:?}", attr, values)
    }

    fn between(&self, attr: &String, low: FilterValue, high: FilterValue) -> String {
        format!("{} between {:?} and {:?}", attr, low, high)
    }

    fn is_null(&self, attr: &String) -> String {
        format!("{} is null", attr)
    }

    fn is_not_null(&self, attr: &String) -> String {
        format!("{} is not null", attr)
    }

    fn and(&self, predicates: Vec<String>) -> String {
        if predicates.is_empty() {
            "true".to_string()
        } else {
            predicates.join(" and ")
        }
    }

    fn or(&self, predicates: Vec<String>) -> String {
        format!("({})", predicates.join(" or "))
    }

    fn not(&self, predicate: String) -> String {
        format!("not ({})", predicate)
    }
}

#[test]
fn test_custom_backend() {
    let filter = PersonFilter {
        name: Some("Ana".into()),
        status: Some("ACTIVE".into()),
    };
    let mut criteria = TextCriteria::default();
    let compiled = SpecificationCompiler::default()
        .compile(&filter, &PageRequest::default(), &mut criteria)
        .unwrap();

    assert_eq!(
        compiled.constraint,
        "lower(name) like '%ana%' and account.status = String(\"ACTIVE\")"
    );
    assert_eq!(criteria.joins, vec!["left account".to_string()]);

    let mut empty = TextCriteria::default();
    let constraint = SpecificationCompiler::default()
        .constraint(&PersonFilter::default(), &mut empty)
        .unwrap();
    assert_eq!(constraint, "true");
}
