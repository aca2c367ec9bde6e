//! Value normalisation helpers.

pub mod datetime;
pub mod encoding;
pub mod units;
