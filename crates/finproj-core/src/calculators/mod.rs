#[cfg(feature = "lending")]
pub mod apr;
#[cfg(feature = "lending")]
pub mod auto_loan;
#[cfg(feature = "commission")]
pub mod commission;
#[cfg(feature = "lending")]
pub mod loan;
#[cfg(feature = "housing")]
pub mod rent_vs_buy;
