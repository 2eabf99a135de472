use chrono::{DateTime, Duration, Utc};
use rusqlite::{OptionalExtension, Row};
use tracing::{debug, info};

use crate::db::Database;
use crate::error::{Result, TallyError};
use crate::password::{hash_password, verify_password};
use crate::plans::{LimitCheck, Plan, PlanFeatures, SubscriptionStatus};
use crate::transactions::Transaction;

pub const DEFAULT_TRIAL_DAYS: i64 = 7;

/// `from` shifted by `days`, or an error when the result leaves chrono's range.
pub fn days_after(from: DateTime<Utc>, days: i64) -> Result<DateTime<Utc>> {
    Duration::try_days(days)
        .and_then(|d| from.checked_add_signed(d))
        .ok_or_else(|| TallyError::Other(format!("{days} days is out of range")))
}

const SELECT_USER: &str = "SELECT id, username, email, password_hash, full_name, phone, created_at, active, \
     trial_start_date, trial_end_date, subscription_plan, subscription_status, subscription_end_date \
     FROM users";

#[derive(Debug, Clone)]
pub struct User {
    pub id: Option<i64>,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub created_at: Option<String>,
    pub active: bool,
    pub trial_start_date: Option<DateTime<Utc>>,
    pub trial_end_date: Option<DateTime<Utc>>,
    pub subscription_plan: Plan,
    pub subscription_status: SubscriptionStatus,
    pub subscription_end_date: Option<DateTime<Utc>>,
}

/// Registration input, before hashing.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone: Option<String>,
}

impl User {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            password_hash: row.get(3)?,
            full_name: row.get(4)?,
            phone: row.get(5)?,
            created_at: row.get(6)?,
            active: row.get::<_, Option<bool>>(7)?.unwrap_or(true),
            trial_start_date: row.get(8)?,
            trial_end_date: row.get(9)?,
            subscription_plan: row.get::<_, Option<Plan>>(10)?.unwrap_or_default(),
            subscription_status: row.get::<_, Option<SubscriptionStatus>>(11)?.unwrap_or_default(),
            subscription_end_date: row.get(12)?,
        })
    }

    /// Register a user with a trial window of `DEFAULT_TRIAL_DAYS`.
    #[allow(dead_code)]
    pub fn create(db: &Database, new: NewUser) -> Result<User> {
        Self::create_with_trial(db, new, DEFAULT_TRIAL_DAYS)
    }

    pub fn create_with_trial(db: &Database, new: NewUser, trial_days: i64) -> Result<User> {
        let now = Utc::now();
        let trial_end = days_after(now, trial_days)?;
        let password_hash = hash_password(&new.password)?;

        let id = {
            let conn = db.connect()?;
            conn.execute(
                "INSERT INTO users (username, email, password_hash, full_name, phone, trial_start_date, trial_end_date) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![new.username, new.email, password_hash, new.full_name, new.phone, now, trial_end],
            )?;
            conn.last_insert_rowid()
        };
        info!(user_id = id, username = %new.username, "registered user");

        Self::get_by_id(db, id)?
            .ok_or_else(|| TallyError::NotFound(format!("user {id}")))
    }

    pub fn get_by_id(db: &Database, id: i64) -> Result<Option<User>> {
        Self::fetch_one(db, "id = ?1", &id)
    }

    pub fn get_by_email(db: &Database, email: &str) -> Result<Option<User>> {
        Self::fetch_one(db, "email = ?1", &email)
    }

    pub fn get_by_username(db: &Database, username: &str) -> Result<Option<User>> {
        Self::fetch_one(db, "username = ?1", &username)
    }

    fn fetch_one(db: &Database, clause: &str, key: &dyn rusqlite::ToSql) -> Result<Option<User>> {
        let conn = db.connect()?;
        let user = conn
            .query_row(&format!("{SELECT_USER} WHERE {clause}"), [key], Self::from_row)
            .optional()?;
        Ok(user)
    }

    /// Insert when `id` is unset, otherwise update every mutable column.
    pub fn save(&mut self, db: &Database) -> Result<()> {
        let conn = db.connect()?;
        match self.id {
            Some(id) => {
                conn.execute(
                    "UPDATE users SET username=?1, email=?2, password_hash=?3, full_name=?4, phone=?5, \
                     active=?6, trial_end_date=?7, subscription_plan=?8, subscription_status=?9, \
                     subscription_end_date=?10 WHERE id=?11",
                    rusqlite::params![
                        self.username,
                        self.email,
                        self.password_hash,
                        self.full_name,
                        self.phone,
                        self.active,
                        self.trial_end_date,
                        self.subscription_plan,
                        self.subscription_status,
                        self.subscription_end_date,
                        id,
                    ],
                )?;
                debug!(user_id = id, "updated user");
            }
            None => {
                conn.execute(
                    "INSERT INTO users (username, email, password_hash, full_name, phone, active, \
                     trial_end_date, subscription_plan, subscription_status, subscription_end_date) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                    rusqlite::params![
                        self.username,
                        self.email,
                        self.password_hash,
                        self.full_name,
                        self.phone,
                        self.active,
                        self.trial_end_date,
                        self.subscription_plan,
                        self.subscription_status,
                        self.subscription_end_date,
                    ],
                )?;
                let id = conn.last_insert_rowid();
                self.id = Some(id);
                debug!(user_id = id, "inserted user");
            }
        }
        Ok(())
    }

    pub fn set_password(&mut self, password: &str) -> Result<()> {
        self.password_hash = hash_password(password)?;
        Ok(())
    }

    pub fn check_password(&self, password: &str) -> bool {
        verify_password(password, &self.password_hash).unwrap_or(false)
    }

    /// Soft delete. Rows are never removed by the application.
    pub fn deactivate(&mut self, db: &Database) -> Result<()> {
        self.active = false;
        self.save(db)
    }

    pub fn subscribe(&mut self, db: &Database, plan: Plan, until: DateTime<Utc>) -> Result<()> {
        self.subscription_plan = plan;
        self.subscription_status = SubscriptionStatus::Active;
        self.subscription_end_date = Some(until);
        self.save(db)
    }

    pub fn cancel_subscription(&mut self, db: &Database) -> Result<()> {
        self.subscription_status = SubscriptionStatus::Cancelled;
        self.save(db)
    }

    pub fn is_trial_expired(&self) -> bool {
        self.is_trial_expired_at(Utc::now())
    }

    /// Expired strictly after the stored end; a user with no trial end never expires.
    pub fn is_trial_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.trial_end_date {
            Some(end) => now > end,
            None => false,
        }
    }

    pub fn is_subscription_active(&self) -> bool {
        self.is_subscription_active_at(Utc::now())
    }

    pub fn is_subscription_active_at(&self, now: DateTime<Utc>) -> bool {
        match self.subscription_status {
            SubscriptionStatus::Trial => !self.is_trial_expired_at(now),
            SubscriptionStatus::Active => self.subscription_end_date.is_some_and(|end| now <= end),
            SubscriptionStatus::Cancelled | SubscriptionStatus::Expired => false,
        }
    }

    pub fn plan_features(&self) -> PlanFeatures {
        self.subscription_plan.features()
    }

    pub fn transaction_limit_check(&self, db: &Database) -> Result<LimitCheck> {
        let id = self.require_id()?;
        let count = Transaction::count_by_user_id(db, id)?;
        Ok(self.plan_features().check_transaction_limit(count))
    }

    /// Active subscription and room under the plan's transaction cap.
    pub fn can_add_transaction(&self, db: &Database) -> Result<bool> {
        if !self.is_subscription_active() {
            return Ok(false);
        }
        Ok(self.transaction_limit_check(db)?.allowed)
    }

    pub fn require_id(&self) -> Result<i64> {
        self.id
            .ok_or_else(|| TallyError::Other(format!("user '{}' has not been saved", self.username)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;
    use crate::transactions::TransactionType;
    use chrono::NaiveDate;

    fn new_user(name: &str) -> NewUser {
        NewUser {
            username: name.to_string(),
            email: format!("{name}@example.com"),
            password: "hunter22".to_string(),
            full_name: "Maria Silva".to_string(),
            phone: Some("+55 11 99999-0000".to_string()),
        }
    }

    #[test]
    fn test_create_sets_trial_window() {
        let (_dir, db) = test_db();
        let before = Utc::now();
        let user = User::create(&db, new_user("maria")).unwrap();
        assert!(user.id.is_some());
        assert!(user.active);
        assert_eq!(user.subscription_plan, Plan::Trial);
        assert_eq!(user.subscription_status, SubscriptionStatus::Trial);
        let end = user.trial_end_date.unwrap();
        assert!(end >= before + Duration::days(7));
        assert!(end <= Utc::now() + Duration::days(7));
        assert!(user.is_subscription_active());
    }

    #[test]
    fn test_password_is_hashed_and_checked() {
        let (_dir, db) = test_db();
        let user = User::create(&db, new_user("maria")).unwrap();
        assert_ne!(user.password_hash, "hunter22");
        assert!(user.check_password("hunter22"));
        assert!(!user.check_password("hunter23"));
    }

    #[test]
    fn test_lookups() {
        let (_dir, db) = test_db();
        let user = User::create(&db, new_user("maria")).unwrap();
        let id = user.id.unwrap();
        assert_eq!(User::get_by_id(&db, id).unwrap().unwrap().username, "maria");
        assert_eq!(User::get_by_email(&db, "maria@example.com").unwrap().unwrap().id, Some(id));
        assert_eq!(User::get_by_username(&db, "maria").unwrap().unwrap().email, "maria@example.com");
    }

    #[test]
    fn test_lookup_miss_is_none() {
        let (_dir, db) = test_db();
        assert!(User::get_by_id(&db, 42).unwrap().is_none());
        assert!(User::get_by_email(&db, "nobody@example.com").unwrap().is_none());
        assert!(User::get_by_username(&db, "nobody").unwrap().is_none());
    }

    #[test]
    fn test_oversized_trial_is_an_error() {
        let (_dir, db) = test_db();
        let err = User::create_with_trial(&db, new_user("maria"), 1_000_000_000).unwrap_err();
        assert!(matches!(err, TallyError::Other(_)));
        assert!(User::get_by_username(&db, "maria").unwrap().is_none());
        assert!(days_after(Utc::now(), i64::MAX).is_err());
    }

    #[test]
    fn test_duplicate_email_surfaces_db_error() {
        let (_dir, db) = test_db();
        User::create(&db, new_user("maria")).unwrap();
        let mut dup = new_user("maria2");
        dup.email = "maria@example.com".to_string();
        let err = User::create(&db, dup).unwrap_err();
        assert!(matches!(err, TallyError::Db(_)));
    }

    #[test]
    fn test_save_reload_roundtrip() {
        let (_dir, db) = test_db();
        let mut user = User::create(&db, new_user("maria")).unwrap();
        let until = Utc::now() + Duration::days(30);
        user.full_name = "Maria S. Souza".to_string();
        user.phone = None;
        user.subscribe(&db, Plan::Professional, until).unwrap();

        let reloaded = User::get_by_id(&db, user.id.unwrap()).unwrap().unwrap();
        assert_eq!(reloaded.full_name, "Maria S. Souza");
        assert_eq!(reloaded.phone, None);
        assert_eq!(reloaded.subscription_plan, Plan::Professional);
        assert_eq!(reloaded.subscription_status, SubscriptionStatus::Active);
        assert_eq!(reloaded.subscription_end_date, Some(until));
        assert_eq!(reloaded.password_hash, user.password_hash);
    }

    #[test]
    fn test_save_inserts_without_id() {
        let (_dir, db) = test_db();
        let mut user = User {
            id: None,
            username: "joao".to_string(),
            email: "joao@example.com".to_string(),
            password_hash: hash_password("pw1234").unwrap(),
            full_name: "Joao".to_string(),
            phone: None,
            created_at: None,
            active: true,
            trial_start_date: None,
            trial_end_date: None,
            subscription_plan: Plan::Mei,
            subscription_status: SubscriptionStatus::Trial,
            subscription_end_date: None,
        };
        user.save(&db).unwrap();
        let reloaded = User::get_by_id(&db, user.id.unwrap()).unwrap().unwrap();
        assert_eq!(reloaded.subscription_plan, Plan::Mei);
        assert!(reloaded.created_at.is_some());
    }

    #[test]
    fn test_deactivate_is_soft() {
        let (_dir, db) = test_db();
        let mut user = User::create(&db, new_user("maria")).unwrap();
        user.deactivate(&db).unwrap();
        let reloaded = User::get_by_id(&db, user.id.unwrap()).unwrap().unwrap();
        assert!(!reloaded.active);
    }

    #[test]
    fn test_trial_expiry_boundary() {
        let end = Utc::now();
        let user = User {
            id: None,
            username: "u".into(),
            email: "u@x.com".into(),
            password_hash: String::new(),
            full_name: "U".into(),
            phone: None,
            created_at: None,
            active: true,
            trial_start_date: None,
            trial_end_date: Some(end),
            subscription_plan: Plan::Trial,
            subscription_status: SubscriptionStatus::Trial,
            subscription_end_date: None,
        };
        assert!(!user.is_trial_expired_at(end));
        assert!(user.is_subscription_active_at(end));
        assert!(user.is_trial_expired_at(end + Duration::milliseconds(1)));
        assert!(!user.is_subscription_active_at(end + Duration::seconds(1)));
    }

    #[test]
    fn test_missing_trial_end_never_expires() {
        let (_dir, db) = test_db();
        let mut user = User::create(&db, new_user("maria")).unwrap();
        user.trial_end_date = None;
        assert!(!user.is_trial_expired_at(Utc::now() + Duration::days(3650)));
    }

    #[test]
    fn test_active_subscription_window() {
        let (_dir, db) = test_db();
        let mut user = User::create(&db, new_user("maria")).unwrap();
        let until = Utc::now() + Duration::days(30);
        user.subscribe(&db, Plan::Mei, until).unwrap();
        assert!(user.is_subscription_active_at(until));
        assert!(!user.is_subscription_active_at(until + Duration::seconds(1)));

        user.subscription_end_date = None;
        assert!(!user.is_subscription_active_at(Utc::now()));

        user.subscription_end_date = Some(until);
        user.cancel_subscription(&db).unwrap();
        assert!(!user.is_subscription_active());
    }

    #[test]
    fn test_transaction_cap_gates_new_entries() {
        let (_dir, db) = test_db();
        let user = User::create(&db, new_user("maria")).unwrap();
        let uid = user.id.unwrap();
        for i in 0..10 {
            let mut t = Transaction::new(
                uid,
                format!("Sale {i}"),
                10.0,
                TransactionType::Income,
                NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            );
            assert!(user.can_add_transaction(&db).unwrap());
            t.save(&db).unwrap();
        }
        assert!(!user.can_add_transaction(&db).unwrap());
        let check = user.transaction_limit_check(&db).unwrap();
        assert_eq!(check.current, 10);
        assert_eq!(check.limit, Some(10));
    }

    #[test]
    fn test_expired_trial_cannot_add() {
        let (_dir, db) = test_db();
        let mut user = User::create(&db, new_user("maria")).unwrap();
        user.trial_end_date = Some(Utc::now() - Duration::days(1));
        user.save(&db).unwrap();
        assert!(!user.can_add_transaction(&db).unwrap());
    }
}
