//! Field scanning: which declared fields of a filter object carry a value.

use tracing::debug;

use super::declaration::{Declarations, FilterDeclaration, FilterSpec};
use super::value::FilterInput;
use crate::error::QueryResult;

/// The declared fields of `F`, inherited ones included, in declaration order.
pub fn scan<F: FilterSpec>() -> Declarations<F> {
    let declarations = F::declarations();
    debug!(
        filter = std::any::type_name::<F>(),
        fields = declarations.len(),
        "scanned filter declarations"
    );
    declarations
}

/// Read every declared field, keeping those that hold a value.
///
/// Unset fields and explicit nulls are skipped. A failing accessor aborts
/// the scan with the field name attached.
pub fn active_fields<'d, F>(
    filter: &F,
    declarations: &'d Declarations<F>,
) -> QueryResult<Vec<(&'d FilterDeclaration, FilterInput)>> {
    let mut active = Vec::new();
    for descriptor in declarations.iter() {
        match descriptor.read(filter)? {
            Some(input) if !input.is_null() => active.push((descriptor.declaration(), input)),
            _ => {}
        }
    }
    Ok(active)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorCode, QueryError};
    use crate::filter::FilterValue;
    use crate::spec::declaration::Operation;
    use crate::spec::value::ToFilterInput;

    #[derive(Default)]
    struct Base {
        code: Option<String>,
    }

    impl FilterSpec for Base {
        fn declarations() -> Declarations<Self> {
            Declarations::new().field(FilterDeclaration::new("code", Operation::Equal), |f: &Self| {
                f.code.to_filter_input()
            })
        }
    }

    #[derive(Default)]
    struct Child {
        base: Base,
        name: Option<String>,
        note: Option<FilterValue>,
    }

    impl FilterSpec for Child {
        fn declarations() -> Declarations<Self> {
            Declarations::inherit(|f: &Self| &f.base)
                .field(FilterDeclaration::new("name", Operation::Like), |f: &Self| {
                    f.name.to_filter_input()
                })
                .field(FilterDeclaration::new("note", Operation::Equal), |f: &Self| {
                    f.note.to_filter_input()
                })
        }
    }

    struct Empty;

    impl FilterSpec for Empty {
        fn declarations() -> Declarations<Self> {
            Declarations::new()
        }
    }

    #[test]
    fn test_inherited_fields_come_first() {
        let decls = scan::<Child>();
        let names: Vec<_> = decls.iter().map(|d| d.declaration().field.to_string()).collect();
        assert_eq!(names, vec!["code", "name", "note"]);
    }

    #[test]
    fn test_no_declarations() {
        assert!(scan::<Empty>().is_empty());
        assert!(active_fields(&Empty, &scan::<Empty>()).unwrap().is_empty());
    }

    #[test]
    fn test_unset_and_null_fields_skipped() {
        let filter = Child {
            base: Base {
                code: Some("X1".into()),
            },
            name: None,
            note: Some(FilterValue::Null),
        };
        let decls = scan::<Child>();
        let active = active_fields(&filter, &decls).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].0.field, "code");
        assert_eq!(active[0].1, FilterInput::from("X1"));
    }

    struct Failing;

    impl FilterSpec for Failing {
        fn declarations() -> Declarations<Self> {
            Declarations::new().field(FilterDeclaration::new("secret", Operation::Equal), |_: &Self| {
                Err(QueryError::internal("not readable"))
            })
        }
    }

    #[test]
    fn test_accessor_error_aborts() {
        let err = active_fields(&Failing, &scan::<Failing>()).unwrap_err();
        assert_eq!(err.code, ErrorCode::FieldAccess);
        assert_eq!(err.context.field.as_deref(), Some("secret"));
    }
}
