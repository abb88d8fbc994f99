//! The execution seam implemented by storage crates.

use async_trait::async_trait;
use tracing::debug;

use crate::error::QueryResult;
use crate::pagination::{Page, PageRequest};
use crate::spec::{FilterSpec, SpecificationCompiler};
use crate::sql::{SelectQuery, SqlCriteria};

/// Runs rendered select queries and maps rows to `T`.
///
/// Implementations run `query.sql` for the rows and `query.count_sql` for the
/// total, binding `query.params` to both.
#[async_trait]
pub trait SpecificationExecutor<T: Send>: Send + Sync {
    /// Fetch one page.
    async fn find_page(&self, query: &SelectQuery, page: &PageRequest) -> QueryResult<Page<T>>;

    /// Compile `filter` against `criteria`, then fetch the requested page.
    async fn find<F>(
        &self,
        compiler: &SpecificationCompiler,
        filter: &F,
        page: &PageRequest,
        criteria: SqlCriteria,
    ) -> QueryResult<Page<T>>
    where
        F: FilterSpec + Sync,
    {
        let mut criteria = criteria.with_max_relation_depth(compiler.config().max_relation_depth);
        let compiled = compiler.compile(filter, page, &mut criteria)?;
        let query = criteria.finish(&compiled.constraint, &compiled.page)?;
        debug!(sql = %query.sql, params = query.params.len(), "executing specification query");
        self.find_page(&query, &compiled.page).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterValue;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<SelectQuery>>,
    }

    #[async_trait]
    impl SpecificationExecutor<String> for Recorder {
        async fn find_page(&self, query: &SelectQuery, page: &PageRequest) -> QueryResult<Page<String>> {
            self.seen.lock().unwrap().push(query.clone());
            Ok(Page::new(vec!["Joana".to_string()], page.clone(), 41))
        }
    }

    #[derive(Default)]
    struct NameFilter {
        name: Option<String>,
    }

    crate::filter_spec!(NameFilter {
        name => StartsWith,
    });

    #[tokio::test]
    async fn test_find_compiles_and_delegates() {
        let executor = Recorder::default();
        let filter = NameFilter {
            name: Some("Jo".into()),
        };
        let page = executor
            .find(
                &SpecificationCompiler::default(),
                &filter,
                &PageRequest::of(0, 20),
                SqlCriteria::new("people"),
            )
            .await
            .unwrap();

        assert_eq!(page.items, vec!["Joana".to_string()]);
        assert_eq!(page.total_pages(), 3);
        assert!(page.has_next());

        let seen = executor.seen.lock().unwrap();
        assert_eq!(
            seen[0].sql,
            "SELECT t0.* FROM people t0 WHERE LOWER(t0.name) LIKE $1 LIMIT 20"
        );
        assert_eq!(seen[0].params, vec![FilterValue::String("jo%".into())]);
    }
}
