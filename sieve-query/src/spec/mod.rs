//! Declarative filter specifications.
//!
//! A filter struct declares, per field, an [`Operation`] and optionally the
//! relation path of the attribute it constrains. [`SpecificationCompiler`]
//! reads the set fields of such a struct and combines one predicate per field
//! into a single constraint through a [`crate::CriteriaBuilder`].

mod assembler;
mod declaration;
mod registry;
mod scanner;
mod value;

pub mod path;

pub use assembler::{Clock, Compiled, SpecificationCompiler, rewrite_sort};
pub use declaration::{Declarations, FieldDescriptor, FilterDeclaration, FilterSpec, Operation};
pub use registry::{BuildContext, build as build_predicate, start_of_day};
pub use scanner::{active_fields, scan};
pub use value::{FilterInput, ListValue, RangeValue, ToFilterInput};
