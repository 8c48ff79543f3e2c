use std::io::Read;

use commission_core::{
    CarClass, CommissionRepository, CommissionRule, RepositoryError, SalesLine, Salesman,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur when loading rules, salesmen or sales lines.
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Invalid record on line {line}: {reason}")]
    InvalidRecord { line: u64, reason: String },

    #[error("Salesman {0} not found in database (load salesmen before sales)")]
    SalesmanNotFound(i64),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<csv::Error> for LoaderError {
    fn from(err: csv::Error) -> Self {
        LoaderError::CsvParse(err.to_string())
    }
}

/// Deserializes every record of a headed CSV, pairing each with the file
/// line it starts on (the header is line 1). Quoted fields may span lines.
fn read_records<T, R>(reader: R) -> Result<Vec<(u64, T)>, LoaderError>
where
    T: DeserializeOwned,
    R: Read,
{
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let mut records = Vec::new();

    for result in csv_reader.records() {
        let record = result?;
        let line = record.position().map_or(0, |pos| pos.line());
        records.push((line, record.deserialize(Some(&headers))?));
    }

    Ok(records)
}

fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// A single record from the commission rules CSV file.
///
/// Columns: `brand,fixed_commission,price_threshold,class_a_percent,class_b_percent,class_c_percent`.
/// A blank class percentage means the brand carries no rule for that class.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CommissionRuleRecord {
    pub brand: String,
    pub fixed_commission: Decimal,
    pub price_threshold: Decimal,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub class_a_percent: Option<Decimal>,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub class_b_percent: Option<Decimal>,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub class_c_percent: Option<Decimal>,
}

impl CommissionRuleRecord {
    pub fn to_rule(&self) -> CommissionRule {
        let class_percent = [
            (CarClass::A, self.class_a_percent),
            (CarClass::B, self.class_b_percent),
            (CarClass::C, self.class_c_percent),
        ]
        .into_iter()
        .filter_map(|(car_class, percent)| percent.map(|p| (car_class, p)))
        .collect();

        CommissionRule {
            brand: self.brand.clone(),
            fixed_commission: self.fixed_commission,
            price_threshold: self.price_threshold,
            class_percent,
        }
    }
}

/// Loader for the commission rule catalog.
pub struct RuleLoader;

impl RuleLoader {
    /// Parse and validate rule records from a CSV reader.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<CommissionRuleRecord>, LoaderError> {
        let records = read_records::<CommissionRuleRecord, _>(reader)?;

        for (line, record) in &records {
            record
                .to_rule()
                .validate()
                .map_err(|e| LoaderError::InvalidRecord {
                    line: *line,
                    reason: e.to_string(),
                })?;
        }

        Ok(records.into_iter().map(|(_, record)| record).collect())
    }

    /// Upsert each rule by brand. Returns the number of rules written.
    pub async fn load<R>(
        repo: &R,
        records: &[CommissionRuleRecord],
    ) -> Result<usize, LoaderError>
    where
        R: CommissionRepository + ?Sized,
    {
        for record in records {
            repo.upsert_commission_rule(&record.to_rule()).await?;
            debug!(brand = %record.brand, "upserted commission rule");
        }

        info!(count = records.len(), "loaded commission rules");
        Ok(records.len())
    }
}

/// A single record from the salesmen CSV file.
///
/// Columns: `id,name,code,previous_year_sales`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SalesmanRecord {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub previous_year_sales: Decimal,
}

impl SalesmanRecord {
    pub fn to_salesman(&self) -> Salesman {
        Salesman::new(self.id, &self.name, &self.code, self.previous_year_sales)
    }
}

/// Loader for the salesman roster.
pub struct SalesmanLoader;

impl SalesmanLoader {
    pub fn parse<R: Read>(reader: R) -> Result<Vec<SalesmanRecord>, LoaderError> {
        let records = read_records::<SalesmanRecord, _>(reader)?;

        for (line, record) in &records {
            if record.name.is_empty() || record.code.is_empty() {
                return Err(LoaderError::InvalidRecord {
                    line: *line,
                    reason: "name and code must not be blank".to_string(),
                });
            }
            if record.previous_year_sales < Decimal::ZERO {
                return Err(LoaderError::InvalidRecord {
                    line: *line,
                    reason: format!(
                        "previous_year_sales must be non-negative, got {}",
                        record.previous_year_sales
                    ),
                });
            }
        }

        Ok(records.into_iter().map(|(_, record)| record).collect())
    }

    /// Upsert each salesman by id. Returns the number of salesmen written.
    pub async fn load<R>(
        repo: &R,
        records: &[SalesmanRecord],
    ) -> Result<usize, LoaderError>
    where
        R: CommissionRepository + ?Sized,
    {
        for record in records {
            repo.upsert_salesman(&record.to_salesman()).await?;
        }

        info!(count = records.len(), "loaded salesmen");
        Ok(records.len())
    }
}

/// Raw sales ledger row; the class is kept as text until [`SalesLineLoader::parse`]
/// can report a bad value with its line number.
#[derive(Debug, Deserialize)]
struct RawSalesLine {
    salesman_id: i64,
    brand: String,
    car_class: String,
    units_sold: u32,
    price: Decimal,
}

/// A single record from the sales ledger CSV file.
///
/// Columns: `salesman_id,brand,car_class,units_sold,price`. `car_class`
/// accepts `A`, `B`, `C` or their `A-Class` style labels.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesLineRecord {
    pub salesman_id: i64,
    pub brand: String,
    pub car_class: CarClass,
    pub units_sold: u32,
    pub price: Decimal,
}

impl SalesLineRecord {
    pub fn to_sales_line(&self) -> SalesLine {
        SalesLine::new(
            self.salesman_id,
            &self.brand,
            self.car_class,
            self.units_sold,
            self.price,
        )
    }
}

/// Loader for the sales ledger.
pub struct SalesLineLoader;

impl SalesLineLoader {
    pub fn parse<R: Read>(reader: R) -> Result<Vec<SalesLineRecord>, LoaderError> {
        read_records::<RawSalesLine, _>(reader)?
            .into_iter()
            .map(|(line, raw)| {
                let invalid = |reason: String| LoaderError::InvalidRecord { line, reason };
                let car_class = raw
                    .car_class
                    .parse::<CarClass>()
                    .map_err(|e| invalid(e.to_string()))?;
                if raw.units_sold == 0 {
                    return Err(invalid("units_sold must be positive".to_string()));
                }
                if raw.price < Decimal::ZERO {
                    return Err(invalid(format!("price must be non-negative, got {}", raw.price)));
                }
                Ok(SalesLineRecord {
                    salesman_id: raw.salesman_id,
                    brand: raw.brand,
                    car_class,
                    units_sold: raw.units_sold,
                    price: raw.price,
                })
            })
            .collect()
    }

    /// Replace the ledger of every salesman present in `records`.
    ///
    /// Every salesman is looked up before anything is written; the ledgers
    /// are then rewritten in one repository call, grouped by first
    /// appearance and in file order within a salesman. Loading the same file
    /// twice leaves the same ledger, and a failed load changes nothing.
    /// Returns the number of lines inserted.
    pub async fn load<R>(
        repo: &R,
        records: &[SalesLineRecord],
    ) -> Result<usize, LoaderError>
    where
        R: CommissionRepository + ?Sized,
    {
        let mut salesman_ids: Vec<i64> = Vec::new();
        for record in records {
            if !salesman_ids.contains(&record.salesman_id) {
                salesman_ids.push(record.salesman_id);
            }
        }

        for &salesman_id in &salesman_ids {
            repo.get_salesman(salesman_id).await.map_err(|e| match e {
                RepositoryError::NotFound => LoaderError::SalesmanNotFound(salesman_id),
                other => LoaderError::Repository(other),
            })?;
        }

        let lines: Vec<SalesLine> = salesman_ids
            .iter()
            .flat_map(|id| records.iter().filter(move |r| r.salesman_id == *id))
            .map(SalesLineRecord::to_sales_line)
            .collect();
        let inserted = repo.replace_sales_lines(&salesman_ids, &lines).await?;
        debug!(salesmen = salesman_ids.len(), "replaced sales ledgers");

        info!(count = inserted, "loaded sales lines");
        Ok(lines.len())
    }
}
