//! Payables and receivables. An "account" here is a single amount owed to or by
//! the business, not a bank account.

use std::fmt;

use chrono::NaiveDate;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{OptionalExtension, Row};
use tracing::debug;

use crate::db::Database;
use crate::error::Result;

const SELECT_ACCOUNT: &str =
    "SELECT id, user_id, name, account_type, amount, due_date, status, created_at FROM accounts";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountType {
    Receivable,
    Payable,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Receivable => "receivable",
            Self::Payable => "payable",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "receivable" => Some(Self::Receivable),
            "payable" => Some(Self::Payable),
            _ => None,
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromSql for AccountType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        Self::parse(s).ok_or_else(|| FromSqlError::Other(format!("unknown account type: {s}").into()))
    }
}

impl ToSql for AccountType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AccountStatus {
    #[default]
    Pending,
    Paid,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "paid" | "settled" => Some(Self::Paid),
            _ => None,
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromSql for AccountStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        Self::parse(s).ok_or_else(|| FromSqlError::Other(format!("unknown account status: {s}").into()))
    }
}

impl ToSql for AccountStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

#[derive(Debug, Clone)]
pub struct Account {
    pub id: Option<i64>,
    pub user_id: i64,
    pub name: String,
    pub account_type: AccountType,
    pub amount: f64,
    pub due_date: Option<NaiveDate>,
    pub status: AccountStatus,
    pub created_at: Option<String>,
}

impl Account {
    pub fn new(user_id: i64, name: impl Into<String>, account_type: AccountType, amount: f64) -> Self {
        Self {
            id: None,
            user_id,
            name: name.into(),
            account_type,
            amount,
            due_date: None,
            status: AccountStatus::Pending,
            created_at: None,
        }
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            name: row.get(2)?,
            account_type: row.get(3)?,
            amount: row.get::<_, Option<f64>>(4)?.unwrap_or(0.0),
            due_date: row.get(5)?,
            status: row.get::<_, Option<AccountStatus>>(6)?.unwrap_or_default(),
            created_at: row.get(7)?,
        })
    }

    pub fn save(&mut self, db: &Database) -> Result<()> {
        let conn = db.connect()?;
        match self.id {
            Some(id) => {
                conn.execute(
                    "UPDATE accounts SET name=?1, account_type=?2, amount=?3, due_date=?4, status=?5 WHERE id=?6",
                    rusqlite::params![self.name, self.account_type, self.amount, self.due_date, self.status, id],
                )?;
                debug!(account_id = id, "updated account");
            }
            None => {
                conn.execute(
                    "INSERT INTO accounts (user_id, name, account_type, amount, due_date, status) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    rusqlite::params![
                        self.user_id,
                        self.name,
                        self.account_type,
                        self.amount,
                        self.due_date,
                        self.status,
                    ],
                )?;
                let id = conn.last_insert_rowid();
                self.id = Some(id);
                debug!(account_id = id, user_id = self.user_id, "inserted account");
            }
        }
        Ok(())
    }

    pub fn get_by_user_id(db: &Database, user_id: i64, account_type: Option<AccountType>) -> Result<Vec<Account>> {
        let conn = db.connect()?;
        let rows = match account_type {
            Some(kind) => {
                let mut stmt = conn.prepare(&format!(
                    "{SELECT_ACCOUNT} WHERE user_id = ?1 AND account_type = ?2 ORDER BY due_date, id"
                ))?;
                let rows = stmt
                    .query_map(rusqlite::params![user_id, kind], Self::from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                rows
            }
            None => {
                let mut stmt = conn.prepare(&format!("{SELECT_ACCOUNT} WHERE user_id = ?1 ORDER BY due_date, id"))?;
                let rows = stmt
                    .query_map([user_id], Self::from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                rows
            }
        };
        Ok(rows)
    }

    pub fn get_by_id(db: &Database, id: i64, user_id: Option<i64>) -> Result<Option<Account>> {
        let conn = db.connect()?;
        let row = match user_id {
            Some(uid) => conn
                .query_row(&format!("{SELECT_ACCOUNT} WHERE id = ?1 AND user_id = ?2"), [id, uid], Self::from_row)
                .optional()?,
            None => conn
                .query_row(&format!("{SELECT_ACCOUNT} WHERE id = ?1"), [id], Self::from_row)
                .optional()?,
        };
        Ok(row)
    }

    /// Sum of still-pending items of one type. Zero when nothing matches.
    pub fn get_pending_total(db: &Database, user_id: i64, account_type: AccountType) -> Result<f64> {
        let conn = db.connect()?;
        let total = conn.query_row(
            "SELECT COALESCE(SUM(amount), 0) FROM accounts \
             WHERE user_id = ?1 AND account_type = ?2 AND status = 'pending'",
            rusqlite::params![user_id, account_type],
            |r| r.get(0),
        )?;
        Ok(total)
    }

    pub fn mark_paid(&mut self, db: &Database) -> Result<()> {
        self.status = AccountStatus::Paid;
        self.save(db)
    }

    pub fn is_overdue_on(&self, today: NaiveDate) -> bool {
        self.status == AccountStatus::Pending && self.due_date.is_some_and(|due| due < today)
    }
}
