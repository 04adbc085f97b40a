//! Pull-based evaluation: frame context, the recursive resolver, and the
//! frame/substep driver.

pub mod context;
pub mod driver;
pub mod resolve;
