use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use commission_core::{
    CarClass, CommissionRepository, CommissionRule, RepositoryError, SalesLine, Salesman,
};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use tracing::{debug, info};

use crate::decimal::{decimal_to_text, get_decimal, get_optional_decimal};

const IN_MEMORY: &str = ":memory:";

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Open a database from a bare file path, a `sqlite:` URL or `:memory:`.
    ///
    /// File databases are created when missing. An in-memory database lives
    /// on a single pooled connection that is never recycled, so every query
    /// sees the same data.
    pub async fn new(connection: &str) -> Result<Self> {
        let pool = if is_in_memory(connection) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(SqliteConnectOptions::from_str("sqlite::memory:")?)
                .await
        } else {
            let options = if connection.starts_with("sqlite:") {
                SqliteConnectOptions::from_str(connection)
                    .with_context(|| format!("Invalid database URL: {}", connection))?
            } else {
                SqliteConnectOptions::new().filename(connection)
            };
            SqlitePoolOptions::new()
                .connect_with(options.create_if_missing(true).foreign_keys(true))
                .await
        };
        let pool =
            pool.with_context(|| format!("Failed to connect to database: {}", connection))?;

        debug!(connection, "opened sqlite database");
        Ok(Self { pool })
    }

    pub async fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    /// Load and execute all SQL seed files from the specified directory.
    /// Files are executed in alphabetical order by filename.
    pub async fn run_seeds(
        &self,
        seeds_dir: &Path,
    ) -> Result<()> {
        let mut entries: Vec<_> = std::fs::read_dir(seeds_dir)
            .with_context(|| format!("Failed to read seeds directory '{}'", seeds_dir.display()))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "sql"))
            .collect();

        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let path = entry.path();
            let sql = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read seed file '{}'", path.display()))?;

            sqlx::raw_sql(&sql)
                .execute(&self.pool)
                .await
                .with_context(|| format!("Failed to execute seed file '{}'", path.display()))?;
            info!(seed = %path.display(), "applied seed file");
        }

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn is_in_memory(connection: &str) -> bool {
    matches!(connection.trim(), IN_MEMORY | "sqlite::memory:" | "sqlite://:memory:")
}

fn db_error(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Database(e.to_string())
}

fn row_to_commission_rule(row: &SqliteRow) -> Result<CommissionRule, RepositoryError> {
    let mut class_percent = BTreeMap::new();
    for (car_class, column) in [
        (CarClass::A, "class_a_percent"),
        (CarClass::B, "class_b_percent"),
        (CarClass::C, "class_c_percent"),
    ] {
        if let Some(percent) = get_optional_decimal(row, column)? {
            class_percent.insert(car_class, percent);
        }
    }

    Ok(CommissionRule {
        brand: row.try_get("brand").map_err(db_error)?,
        fixed_commission: get_decimal(row, "fixed_commission")?,
        price_threshold: get_decimal(row, "price_threshold")?,
        class_percent,
    })
}

fn row_to_salesman(row: &SqliteRow) -> Result<Salesman, RepositoryError> {
    Ok(Salesman {
        id: row.try_get("id").map_err(db_error)?,
        name: row.try_get("name").map_err(db_error)?,
        code: row.try_get("code").map_err(db_error)?,
        previous_year_sales: get_decimal(row, "previous_year_sales")?,
    })
}

fn row_to_sales_line(row: &SqliteRow) -> Result<SalesLine, RepositoryError> {
    let car_class: String = row.try_get("car_class").map_err(db_error)?;
    let car_class = car_class
        .parse::<CarClass>()
        .map_err(|e| RepositoryError::Database(e.to_string()))?;
    let units_sold: i64 = row.try_get("units_sold").map_err(db_error)?;
    let units_sold = u32::try_from(units_sold).map_err(|_| {
        RepositoryError::Database(format!("Invalid units_sold: {}", units_sold))
    })?;

    Ok(SalesLine {
        salesman_id: row.try_get("salesman_id").map_err(db_error)?,
        brand: row.try_get("brand").map_err(db_error)?,
        car_class,
        units_sold,
        price: get_decimal(row, "price")?,
    })
}

#[async_trait]
impl CommissionRepository for SqliteRepository {
    async fn list_commission_rules(&self) -> Result<Vec<CommissionRule>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT brand, fixed_commission, price_threshold,
                    class_a_percent, class_b_percent, class_c_percent
             FROM commission_rule ORDER BY rowid",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.iter().map(row_to_commission_rule).collect()
    }

    async fn get_commission_rule(
        &self,
        brand: &str,
    ) -> Result<CommissionRule, RepositoryError> {
        let row = sqlx::query(
            "SELECT brand, fixed_commission, price_threshold,
                    class_a_percent, class_b_percent, class_c_percent
             FROM commission_rule WHERE brand = ?",
        )
        .bind(brand)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .ok_or(RepositoryError::NotFound)?;

        row_to_commission_rule(&row)
    }

    async fn upsert_commission_rule(
        &self,
        rule: &CommissionRule,
    ) -> Result<(), RepositoryError> {
        let percent = |car_class| rule.percent_for(car_class).map(decimal_to_text);

        sqlx::query(
            "INSERT INTO commission_rule
                (brand, fixed_commission, price_threshold,
                 class_a_percent, class_b_percent, class_c_percent)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT (brand) DO UPDATE SET
                fixed_commission = excluded.fixed_commission,
                price_threshold = excluded.price_threshold,
                class_a_percent = excluded.class_a_percent,
                class_b_percent = excluded.class_b_percent,
                class_c_percent = excluded.class_c_percent",
        )
        .bind(&rule.brand)
        .bind(decimal_to_text(rule.fixed_commission))
        .bind(decimal_to_text(rule.price_threshold))
        .bind(percent(CarClass::A))
        .bind(percent(CarClass::B))
        .bind(percent(CarClass::C))
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(())
    }

    async fn list_salesmen(&self) -> Result<Vec<Salesman>, RepositoryError> {
        let rows =
            sqlx::query("SELECT id, name, code, previous_year_sales FROM salesman ORDER BY id")
                .fetch_all(&self.pool)
                .await
                .map_err(db_error)?;

        rows.iter().map(row_to_salesman).collect()
    }

    async fn get_salesman(
        &self,
        id: i64,
    ) -> Result<Salesman, RepositoryError> {
        let row =
            sqlx::query("SELECT id, name, code, previous_year_sales FROM salesman WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?
                .ok_or(RepositoryError::NotFound)?;

        row_to_salesman(&row)
    }

    async fn upsert_salesman(
        &self,
        salesman: &Salesman,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO salesman (id, name, code, previous_year_sales)
             VALUES (?, ?, ?, ?)
             ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                code = excluded.code,
                previous_year_sales = excluded.previous_year_sales",
        )
        .bind(salesman.id)
        .bind(&salesman.name)
        .bind(&salesman.code)
        .bind(decimal_to_text(salesman.previous_year_sales))
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(())
    }

    async fn list_sales_lines(
        &self,
        salesman_id: Option<i64>,
    ) -> Result<Vec<SalesLine>, RepositoryError> {
        let rows = match salesman_id {
            Some(id) => {
                sqlx::query(
                    "SELECT salesman_id, brand, car_class, units_sold, price
                     FROM sales_line WHERE salesman_id = ? ORDER BY id",
                )
                .bind(id)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    "SELECT salesman_id, brand, car_class, units_sold, price
                     FROM sales_line ORDER BY id",
                )
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(db_error)?;

        rows.iter().map(row_to_sales_line).collect()
    }

    async fn insert_sales_line(
        &self,
        line: &SalesLine,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO sales_line (salesman_id, brand, car_class, units_sold, price)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(line.salesman_id)
        .bind(&line.brand)
        .bind(line.car_class.as_str())
        .bind(i64::from(line.units_sold))
        .bind(decimal_to_text(line.price))
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(())
    }

    async fn delete_sales_lines(
        &self,
        salesman_id: i64,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM sales_line WHERE salesman_id = ?")
            .bind(salesman_id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(result.rows_affected())
    }

    async fn replace_sales_lines(
        &self,
        salesman_ids: &[i64],
        lines: &[SalesLine],
    ) -> Result<u64, RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        for salesman_id in salesman_ids {
            let removed = sqlx::query("DELETE FROM sales_line WHERE salesman_id = ?")
                .bind(salesman_id)
                .execute(&mut *tx)
                .await
                .map_err(db_error)?
                .rows_affected();
            debug!(salesman_id, removed, "cleared existing sales lines");
        }

        let mut inserted = 0;
        for line in lines {
            sqlx::query(
                "INSERT INTO sales_line (salesman_id, brand, car_class, units_sold, price)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(line.salesman_id)
            .bind(&line.brand)
            .bind(line.car_class.as_str())
            .bind(i64::from(line.units_sold))
            .bind(decimal_to_text(line.price))
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
            inserted += 1;
        }

        // Dropping `tx` on any error above rolls everything back.
        tx.commit().await.map_err(db_error)?;
        Ok(inserted)
    }
}
