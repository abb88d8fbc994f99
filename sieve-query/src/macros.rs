//! Declaration macros.
//!
//! [`filter_spec!`](crate::filter_spec) implements [`FilterSpec`](crate::spec::FilterSpec)
//! for a filter struct whose fields are `Option<T>` values.
//!
//! # Examples
//!
//! ```rust
//! use sieve_query::spec::{FilterSpec, Operation};
//!
//! #[derive(Default)]
//! struct PersonFilter {
//!     name: Option<String>,
//!     tipo_sexo: Option<String>,
//! }
//!
//! sieve_query::filter_spec!(PersonFilter {
//!     name => Like,
//!     tipo_sexo as "tipoSexoDescricao" => Equal @ "tipoSexo.nome",
//! });
//!
//! let declarations = PersonFilter::declarations();
//! assert_eq!(declarations.len(), 2);
//! let tipo = declarations.get("tipoSexoDescricao").unwrap();
//! assert_eq!(tipo.operation, Operation::Equal);
//! assert_eq!(tipo.relation_path, "tipoSexo.nome");
//! ```

/// Implement `FilterSpec` for a struct.
///
/// # Syntax
///
/// - `field => Op` - filter the root attribute named like the field
/// - `field => Op @ "a.b.c"` - filter the attribute at a relation path
/// - `field as "name" => Op` - declare the field under another name, used to match sort keys
/// - `Type extends base { ... }` - start from the declarations of the embedded filter in `base`
///
/// Operators are the [`Operation`](crate::spec::Operation) variant names. Fields
/// must implement [`ToFilterInput`](crate::spec::ToFilterInput), which every
/// `Option<T>` of a convertible `T` does.
///
/// # Examples
///
/// ```rust
/// #[derive(Default)]
/// struct AuditFilter {
///     created_on: Option<chrono::NaiveDate>,
/// }
///
/// #[derive(Default)]
/// struct OrderFilter {
///     audit: AuditFilter,
///     status: Option<Vec<String>>,
///     archived: Option<bool>,
/// }
///
/// sieve_query::filter_spec!(AuditFilter {
///     created_on => OnDate,
/// });
///
/// sieve_query::filter_spec!(OrderFilter extends audit {
///     status => In,
///     archived => IsNull,
/// });
/// ```
#[macro_export]
macro_rules! filter_spec {
    (@base) => {
        $crate::spec::Declarations::<Self>::new()
    };
    (@base $base:ident) => {
        $crate::spec::Declarations::<Self>::inherit(|filter: &Self| &filter.$base)
    };

    (@name $field:ident) => {
        stringify!($field)
    };
    (@name $field:ident, $name:literal) => {
        $name
    };

    (@path $decl:expr) => {
        $decl
    };
    (@path $decl:expr, $path:literal) => {
        $decl.with_relation($path)
    };

    ($ty:ident $(extends $base:ident)? {
        $( $field:ident $(as $name:literal)? => $op:ident $(@ $path:literal)? ),* $(,)?
    }) => {
        impl $crate::spec::FilterSpec for $ty {
            fn declarations() -> $crate::spec::Declarations<Self> {
                $crate::filter_spec!(@base $($base)?)
                $(
                    .field(
                        $crate::filter_spec!(@path
                            $crate::spec::FilterDeclaration::new(
                                $crate::filter_spec!(@name $field $(, $name)?),
                                $crate::spec::Operation::$op,
                            )
                            $(, $path)?
                        ),
                        |filter: &Self| $crate::spec::ToFilterInput::to_filter_input(&filter.$field),
                    )
                )*
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::spec::{FilterInput, FilterSpec, Operation};

    #[derive(Default)]
    struct Base {
        code: Option<String>,
        name: Option<String>,
    }

    crate::filter_spec!(Base {
        code => Equal,
        name => Like,
    });

    #[derive(Default)]
    struct Child {
        base: Base,
        name: Option<String>,
        status: Option<String>,
        tipo_sexo: Option<String>,
    }

    crate::filter_spec!(Child extends base {
        name => StartsWith,
        status => Equal @ "account.status",
        tipo_sexo as "tipoSexoDescricao" => Like @ "tipoSexo.nome",
    });

    #[test]
    fn test_declaration_order_and_override() {
        let declarations = Child::declarations();
        let fields: Vec<_> = declarations
            .iter()
            .map(|d| (d.declaration().field.to_string(), d.declaration().operation))
            .collect();
        assert_eq!(
            fields,
            vec![
                ("code".to_string(), Operation::Equal),
                ("name".to_string(), Operation::StartsWith),
                ("status".to_string(), Operation::Equal),
                ("tipoSexoDescricao".to_string(), Operation::Like),
            ]
        );
    }

    #[test]
    fn test_relation_paths() {
        let declarations = Child::declarations();
        assert!(!declarations.get("code").unwrap().has_relation());
        assert_eq!(declarations.get("status").unwrap().relation_path, "account.status");
    }

    #[test]
    fn test_inherited_accessor_reads_embedded_value() {
        let filter = Child {
            base: Base {
                code: Some("C-1".into()),
                name: Some("ignored".into()),
            },
            ..Default::default()
        };
        let declarations = Child::declarations();
        let values: Vec<_> = declarations
            .iter()
            .map(|d| d.read(&filter).unwrap())
            .collect();
        assert_eq!(values[0], Some(FilterInput::from("C-1")));
        // the child's own `name` replaced the inherited one
        assert_eq!(values[1], None);
    }
}
