pub mod number_base;
pub mod units;
