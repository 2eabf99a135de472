use chrono::NaiveDate;
use rusqlite::{OptionalExtension, Row};
use tracing::debug;

use crate::db::Database;
use crate::error::Result;

const SELECT_GOAL: &str = "SELECT id, user_id, title, target_amount, current_amount, target_date, created_at, \
     is_completed FROM financial_goals";

#[derive(Debug, Clone)]
pub struct FinancialGoal {
    pub id: Option<i64>,
    pub user_id: i64,
    pub title: String,
    pub target_amount: f64,
    pub current_amount: f64,
    pub target_date: Option<NaiveDate>,
    pub created_at: Option<String>,
    pub is_completed: bool,
}

impl FinancialGoal {
    pub fn new(user_id: i64, title: impl Into<String>, target_amount: f64) -> Self {
        Self {
            id: None,
            user_id,
            title: title.into(),
            target_amount,
            current_amount: 0.0,
            target_date: None,
            created_at: None,
            is_completed: false,
        }
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            title: row.get(2)?,
            target_amount: row.get::<_, Option<f64>>(3)?.unwrap_or(0.0),
            current_amount: row.get::<_, Option<f64>>(4)?.unwrap_or(0.0),
            target_date: row.get(5)?,
            created_at: row.get(6)?,
            is_completed: row.get::<_, Option<bool>>(7)?.unwrap_or(false),
        })
    }

    /// Progress towards the target, capped at 100. A zero target reports 0.
    pub fn progress_percentage(&self) -> f64 {
        if self.target_amount == 0.0 {
            return 0.0;
        }
        (self.current_amount / self.target_amount * 100.0).min(100.0)
    }

    pub fn save(&mut self, db: &Database) -> Result<()> {
        let conn = db.connect()?;
        match self.id {
            Some(id) => {
                conn.execute(
                    "UPDATE financial_goals SET title=?1, target_amount=?2, current_amount=?3, target_date=?4, \
                     is_completed=?5 WHERE id=?6",
                    rusqlite::params![
                        self.title,
                        self.target_amount,
                        self.current_amount,
                        self.target_date,
                        self.is_completed,
                        id,
                    ],
                )?;
                debug!(goal_id = id, "updated goal");
            }
            None => {
                conn.execute(
                    "INSERT INTO financial_goals (user_id, title, target_amount, current_amount, target_date, is_completed) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    rusqlite::params![
                        self.user_id,
                        self.title,
                        self.target_amount,
                        self.current_amount,
                        self.target_date,
                        self.is_completed,
                    ],
                )?;
                let id = conn.last_insert_rowid();
                self.id = Some(id);
                debug!(goal_id = id, user_id = self.user_id, "inserted goal");
            }
        }
        Ok(())
    }

    /// Add `amount` to the saved total, completing the goal once it reaches the target.
    pub fn contribute(&mut self, db: &Database, amount: f64) -> Result<()> {
        self.current_amount += amount;
        if self.target_amount > 0.0 && self.current_amount >= self.target_amount {
            self.is_completed = true;
        }
        self.save(db)
    }

    pub fn get_by_user_id(db: &Database, user_id: i64, is_completed: Option<bool>) -> Result<Vec<FinancialGoal>> {
        let conn = db.connect()?;
        let rows = match is_completed {
            Some(done) => {
                let mut stmt = conn.prepare(&format!(
                    "{SELECT_GOAL} WHERE user_id = ?1 AND is_completed = ?2 ORDER BY id"
                ))?;
                let rows = stmt
                    .query_map(rusqlite::params![user_id, done], Self::from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                rows
            }
            None => {
                let mut stmt = conn.prepare(&format!("{SELECT_GOAL} WHERE user_id = ?1 ORDER BY id"))?;
                let rows = stmt
                    .query_map([user_id], Self::from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                rows
            }
        };
        Ok(rows)
    }

    pub fn get_by_id(db: &Database, id: i64, user_id: Option<i64>) -> Result<Option<FinancialGoal>> {
        let conn = db.connect()?;
        let row = match user_id {
            Some(uid) => conn
                .query_row(&format!("{SELECT_GOAL} WHERE id = ?1 AND user_id = ?2"), [id, uid], Self::from_row)
                .optional()?,
            None => conn
                .query_row(&format!("{SELECT_GOAL} WHERE id = ?1"), [id], Self::from_row)
                .optional()?,
        };
        Ok(row)
    }
}
