//! Solutions Data

use rust_decimal::Decimal;

use crate::domain::solutions::records::SolutionUuid;

/// New Solution Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewSolution {
    pub uuid: SolutionUuid,
    pub title: String,
    pub description: Option<String>,
    pub price: Decimal,
}
