use std::fmt;

use chrono::NaiveDate;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{OptionalExtension, Row};
use tracing::debug;

use crate::db::Database;
use crate::error::Result;

const SELECT_TRANSACTION: &str = "SELECT id, user_id, description, amount, transaction_type, category, date, \
     created_at, is_recurring, recurrence_type, account_id FROM transactions";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "income" => Some(Self::Income),
            "expense" => Some(Self::Expense),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        Self::parse(s).ok_or_else(|| FromSqlError::Other(format!("unknown transaction type: {s}").into()))
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

/// Recurrence tag on a repeating transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recurrence {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Recurrence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            "monthly" => Some(Self::Monthly),
            "yearly" => Some(Self::Yearly),
            _ => None,
        }
    }
}

impl FromSql for Recurrence {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        Self::parse(s).ok_or_else(|| FromSqlError::Other(format!("unknown recurrence: {s}").into()))
    }
}

impl ToSql for Recurrence {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

/// Sort order for listing. A closed set so no caller text reaches the SQL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransactionOrder {
    #[default]
    DateDesc,
    DateAsc,
    AmountDesc,
    AmountAsc,
    CreatedDesc,
}

impl TransactionOrder {
    fn sql(&self) -> &'static str {
        match self {
            Self::DateDesc => "date DESC, id DESC",
            Self::DateAsc => "date ASC, id ASC",
            Self::AmountDesc => "amount DESC, id DESC",
            Self::AmountAsc => "amount ASC, id ASC",
            Self::CreatedDesc => "created_at DESC, id DESC",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Transaction {
    pub id: Option<i64>,
    pub user_id: i64,
    pub description: String,
    pub amount: f64,
    pub transaction_type: TransactionType,
    pub category: Option<String>,
    pub date: NaiveDate,
    pub created_at: Option<String>,
    pub is_recurring: bool,
    pub recurrence_type: Option<Recurrence>,
    pub account_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthlySummary {
    pub income: f64,
    pub expenses: f64,
}

impl MonthlySummary {
    pub fn net(&self) -> f64 {
        self.income - self.expenses
    }
}

impl Transaction {
    pub fn new(
        user_id: i64,
        description: impl Into<String>,
        amount: f64,
        transaction_type: TransactionType,
        date: NaiveDate,
    ) -> Self {
        Self {
            id: None,
            user_id,
            description: description.into(),
            amount,
            transaction_type,
            category: None,
            date,
            created_at: None,
            is_recurring: false,
            recurrence_type: None,
            account_id: None,
        }
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            description: row.get(2)?,
            amount: row.get::<_, Option<f64>>(3)?.unwrap_or(0.0),
            transaction_type: row.get(4)?,
            category: row.get(5)?,
            date: row.get(6)?,
            created_at: row.get(7)?,
            is_recurring: row.get::<_, Option<bool>>(8)?.unwrap_or(false),
            recurrence_type: row.get(9)?,
            account_id: row.get(10)?,
        })
    }

    pub fn save(&mut self, db: &Database) -> Result<()> {
        let conn = db.connect()?;
        match self.id {
            Some(id) => {
                conn.execute(
                    "UPDATE transactions SET description=?1, amount=?2, transaction_type=?3, category=?4, \
                     date=?5, is_recurring=?6, recurrence_type=?7, account_id=?8 WHERE id=?9",
                    rusqlite::params![
                        self.description,
                        self.amount,
                        self.transaction_type,
                        self.category,
                        self.date,
                        self.is_recurring,
                        self.recurrence_type,
                        self.account_id,
                        id,
                    ],
                )?;
                debug!(transaction_id = id, "updated transaction");
            }
            None => {
                conn.execute(
                    "INSERT INTO transactions (user_id, description, amount, transaction_type, category, \
                     date, is_recurring, recurrence_type, account_id) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    rusqlite::params![
                        self.user_id,
                        self.description,
                        self.amount,
                        self.transaction_type,
                        self.category,
                        self.date,
                        self.is_recurring,
                        self.recurrence_type,
                        self.account_id,
                    ],
                )?;
                let id = conn.last_insert_rowid();
                self.id = Some(id);
                debug!(transaction_id = id, user_id = self.user_id, "inserted transaction");
            }
        }
        Ok(())
    }

    pub fn get_by_user_id(
        db: &Database,
        user_id: i64,
        limit: Option<u32>,
        order: TransactionOrder,
    ) -> Result<Vec<Transaction>> {
        let conn = db.connect()?;
        // a limit of 0 means "all"; LIMIT -1 is SQLite's no-limit
        let limit = limit.filter(|&n| n > 0).map(i64::from).unwrap_or(-1);
        let sql = format!("{SELECT_TRANSACTION} WHERE user_id = ?1 ORDER BY {} LIMIT ?2", order.sql());
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(rusqlite::params![user_id, limit], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// With `user_id` set, a row owned by someone else is a miss.
    pub fn get_by_id(db: &Database, id: i64, user_id: Option<i64>) -> Result<Option<Transaction>> {
        let conn = db.connect()?;
        let row = match user_id {
            Some(uid) => conn
                .query_row(
                    &format!("{SELECT_TRANSACTION} WHERE id = ?1 AND user_id = ?2"),
                    [id, uid],
                    Self::from_row,
                )
                .optional()?,
            None => conn
                .query_row(&format!("{SELECT_TRANSACTION} WHERE id = ?1"), [id], Self::from_row)
                .optional()?,
        };
        Ok(row)
    }

    pub fn count_by_user_id(db: &Database, user_id: i64) -> Result<i64> {
        let conn = db.connect()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM transactions WHERE user_id = ?1",
            [user_id],
            |r| r.get(0),
        )?;
        Ok(count)
    }

    pub fn get_monthly_summary(db: &Database, user_id: i64, month: u32, year: i32) -> Result<MonthlySummary> {
        let conn = db.connect()?;
        let month = format!("{month:02}");
        let year = format!("{year:04}");
        let sum_for = |kind: TransactionType| -> rusqlite::Result<f64> {
            conn.query_row(
                "SELECT COALESCE(SUM(amount), 0) FROM transactions \
                 WHERE user_id = ?1 AND transaction_type = ?2 \
                 AND strftime('%m', date) = ?3 AND strftime('%Y', date) = ?4",
                rusqlite::params![user_id, kind, month, year],
                |r| r.get(0),
            )
        };
        Ok(MonthlySummary {
            income: sum_for(TransactionType::Income)?,
            expenses: sum_for(TransactionType::Expense)?,
        })
    }

    /// Returns whether a row owned by `user_id` was removed.
    pub fn delete(db: &Database, id: i64, user_id: i64) -> Result<bool> {
        let conn = db.connect()?;
        let n = conn.execute("DELETE FROM transactions WHERE id = ?1 AND user_id = ?2", [id, user_id])?;
        if n > 0 {
            debug!(transaction_id = id, "deleted transaction");
        }
        Ok(n > 0)
    }
}
