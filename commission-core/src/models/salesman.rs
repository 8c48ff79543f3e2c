use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Salesman {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub previous_year_sales: Decimal,
}

impl Salesman {
    pub fn new(
        id: i64,
        name: impl Into<String>,
        code: impl Into<String>,
        previous_year_sales: Decimal,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            code: code.into(),
            previous_year_sales,
        }
    }
}
