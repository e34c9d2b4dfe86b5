//! Command implementations.

mod run;
mod validate;

pub use run::run_delivery;
pub use validate::run_validate;
