//! SQL Server statement compilation.
//!
//! Turns structured tool arguments into parameterized SQL. Identifiers are
//! validated and bracket-quoted; every value travels as a `?` parameter.

pub mod builder;
pub mod filter;
pub mod ident;
pub mod order;

pub use builder::{
    CompiledBatch, CompiledQuery, ReadQuery, SelectBuilder, UNORDERED_PAGINATION_ADVISORY,
    build_delete, build_insert, build_update,
};
pub use filter::{Operator, WhereClause, compile_equality_filters, compile_filters};
pub use ident::{IdentKind, is_valid_identifier};
pub use order::{Direction, NEUTRAL_ORDER, compile_order, compile_pagination};
