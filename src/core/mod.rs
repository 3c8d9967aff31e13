pub mod evaluator;
pub mod profit;

pub use evaluator::{PricePathEvaluator, ValidationResult};
