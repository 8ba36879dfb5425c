//! Quote tables keyed by (maturity, tenor) offsets.

mod table;

pub use table::{QuoteEntry, QuoteTable, TableConvention};
