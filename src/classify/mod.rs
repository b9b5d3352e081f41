//! Classification rules: range tables, ordered rule sets and match codes.

pub mod matching;
pub mod range;
pub mod rules;
pub mod tables;

pub use matching::{MatchClass, add_match_columns, match_type};
pub use range::{Range, RangeTable};
pub use rules::{Output, RuleSet};
pub use tables::{account_type_ranges, loan_type_ranges, zip_state_ranges};
