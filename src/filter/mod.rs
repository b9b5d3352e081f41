//! Row filtering
//!
//! Filters are expressed as [`Expr`] trees evaluated with Arrow compute
//! kernels, plus the special-purpose [`ExpiryFilter`] for relationship
//! expiry dates.

pub mod core;
pub mod date;
pub mod expr;

pub use self::core::{BatchFilter, apply_filters, filter_record_batch, filter_table, filter_table_with_mask};
pub use date::{ExpiryFilter, control_date_from_table, resolve_control_date};
pub use expr::{ExpressionFilter, Expr, LiteralValue};
