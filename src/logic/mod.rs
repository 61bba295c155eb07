pub mod grouping;
pub mod pre_pack;
pub mod scale;
pub mod shopping_list;

pub use grouping::*;
pub use pre_pack::*;
pub use scale::*;
pub use shopping_list::*;

use serde::{Deserialize, Serialize};

/// Errors raised by the aggregation engine. `NotFound` is not represented
/// here: a missing menu surfaces as `Ok(None)` from the store and the API
/// layer maps it to 404.
#[derive(Debug, thiserror::Error)]
pub enum AggregationError {
    /// An invariant of the stored data was violated (e.g. a dish with a
    /// zero baseline portion). Indicates corrupted upstream data, not bad
    /// user input; never masked as Infinity or NaN in a result.
    #[error("data integrity violation: {0}")]
    DataIntegrity(String),
}

/// One `{amount, unit}` line inside a grocery or pre-pack bucket. Lines
/// with the same unit are summed; differing units stay separate. The
/// engine performs no unit conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantityLine {
    pub amount: f64,
    pub unit: String,
}

impl QuantityLine {
    pub fn new(amount: f64, unit: &str) -> Self {
        Self {
            amount,
            unit: unit.to_string(),
        }
    }
}

/// Add `amount` to the existing line with a matching unit, or append a new
/// line. Summation is plain addition, so the final totals are independent
/// of the order the contributions arrive in.
pub(crate) fn merge_quantity(lines: &mut Vec<QuantityLine>, amount: f64, unit: &str) {
    if let Some(line) = lines.iter_mut().find(|line| line.unit == unit) {
        line.amount += amount;
    } else {
        lines.push(QuantityLine::new(amount, unit));
    }
}
