use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::CarClass;

/// Units one salesman sold of one brand and class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesLine {
    pub salesman_id: i64,
    pub brand: String,
    pub car_class: CarClass,
    pub units_sold: u32,
    /// Per-unit price basis for the percentage commission.
    pub price: Decimal,
}

impl SalesLine {
    pub fn new(
        salesman_id: i64,
        brand: impl Into<String>,
        car_class: CarClass,
        units_sold: u32,
        price: Decimal,
    ) -> Self {
        Self {
            salesman_id,
            brand: brand.into(),
            car_class,
            units_sold,
            price,
        }
    }
}
