//! Schema compilation.
//!
//! Fragments are merged into one type-definition document ([`merge`]), turned
//! into an executable dynamic schema ([`SchemaCompiler`]) and cached for the
//! registry lifetime ([`LazySchema`]).

mod compiler;
mod lazy;
pub mod merge;

pub use compiler::{SchemaCompiler, TYPENAME_KEY};
pub use lazy::{LazySchema, SchemaState};
pub use merge::{TypeDefinitions, merge_type_definitions, quote_string};
