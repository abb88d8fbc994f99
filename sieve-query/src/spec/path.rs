//! Relation path resolution.
//!
//! A path such as `account.owner.name` joins `account` from the root, then
//! `owner` from that join, and resolves `name` on the last join. A path with a
//! single segment resolves directly on the root.

use tracing::trace;

use crate::criteria::{CriteriaBuilder, JoinType};
use crate::error::{QueryError, QueryResult};

/// Where the next segment is resolved from.
enum Position<J> {
    Root,
    Join(J),
}

/// Split a relation path into its segments, rejecting empty ones.
pub fn segments(path: &str) -> QueryResult<Vec<&str>> {
    if path.is_empty() {
        return Err(QueryError::invalid_relation_path(path, "empty path"));
    }
    let segments: Vec<&str> = path.split('.').collect();
    if let Some(index) = segments.iter().position(|s| s.trim().is_empty()) {
        return Err(QueryError::invalid_relation_path(
            path,
            format!("segment {} is empty", index + 1),
        ));
    }
    Ok(segments)
}

/// Resolve `path` to an attribute, materializing one join per relation segment.
pub fn resolve<B: CriteriaBuilder>(
    builder: &mut B,
    path: &str,
    join_type: JoinType,
    max_depth: usize,
) -> QueryResult<B::Attr> {
    let segments = segments(path)?;
    let Some((leaf, relations)) = segments.split_last() else {
        return Err(QueryError::invalid_relation_path(path, "empty path"));
    };
    if relations.len() > max_depth {
        return Err(QueryError::invalid_relation_path(
            path,
            format!("{} joins exceed the maximum depth of {}", relations.len(), max_depth),
        )
        .with_help("Raise max_relation_depth in CompilerConfig if the model really nests this deep"));
    }

    let mut position = Position::Root;
    for relation in relations {
        let join = match &position {
            Position::Root => builder.join_root(relation, join_type),
            Position::Join(parent) => builder.join_from(parent, relation, join_type),
        }
        .map_err(|e| e.with_relation_path(path))?;
        trace!(path = %path, relation = %relation, join = ?join, "joined relation");
        position = Position::Join(join);
    }

    match &position {
        Position::Root => builder.root_attr(leaf),
        Position::Join(join) => builder.join_attr(join, leaf),
    }
    .map_err(|e| e.with_relation_path(path))
}
