//! Submission schemas for the account, transaction and goal screens.
//!
//! Each form holds the raw submitted strings. Validation checks every field and
//! collects all failures; within one field, checks stop at the first failure
//! (a missing value is reported as required, not also as too short).

use std::fmt;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::accounts::{Account, AccountType};
use crate::goals::FinancialGoal;
use crate::transactions::{Transaction, TransactionType};
use crate::users::NewUser;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s.]+$").expect("invalid email regex"));

const MIN_AMOUNT: f64 = 0.01;

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    Required { field: &'static str },
    TooShort { field: &'static str, min: usize },
    TooLong { field: &'static str, max: usize },
    BelowMinimum { field: &'static str, min: f64 },
    InvalidNumber { field: &'static str },
    InvalidDate { field: &'static str },
    InvalidEmail { field: &'static str },
    InvalidChoice { field: &'static str, value: String },
    Mismatch { field: &'static str, other: &'static str },
}

impl ValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            Self::Required { field }
            | Self::TooShort { field, .. }
            | Self::TooLong { field, .. }
            | Self::BelowMinimum { field, .. }
            | Self::InvalidNumber { field }
            | Self::InvalidDate { field }
            | Self::InvalidEmail { field }
            | Self::InvalidChoice { field, .. }
            | Self::Mismatch { field, .. } => field,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required { field } => write!(f, "{field} is required"),
            Self::TooShort { field, min } => write!(f, "{field} must be at least {min} characters"),
            Self::TooLong { field, max } => write!(f, "{field} must be at most {max} characters"),
            Self::BelowMinimum { field, min } => write!(f, "{field} must be at least {min:.2}"),
            Self::InvalidNumber { field } => write!(f, "{field} is not a valid amount"),
            Self::InvalidDate { field } => write!(f, "{field} must be a date in YYYY-MM-DD format"),
            Self::InvalidEmail { field } => write!(f, "{field} is not a valid email address"),
            Self::InvalidChoice { field, value } => write!(f, "'{value}' is not a valid {field}"),
            Self::Mismatch { field, other } => write!(f, "{field} must match {other}"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Every failure from one submission.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormErrors(Vec<ValidationError>);

impl FormErrors {
    #[allow(dead_code)]
    pub fn errors(&self) -> &[ValidationError] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[allow(dead_code)]
    pub fn for_field(&self, field: &str) -> Option<&ValidationError> {
        self.0.iter().find(|e| e.field() == field)
    }

    fn check<T>(&mut self, result: Result<T, ValidationError>) -> Option<T> {
        match result {
            Ok(v) => Some(v),
            Err(e) => {
                self.0.push(e);
                None
            }
        }
    }

    fn into_result<T>(self, value: Option<T>) -> Result<T, FormErrors> {
        match value {
            Some(v) if self.is_empty() => Ok(v),
            _ => Err(self),
        }
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msgs: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        f.write_str(&msgs.join("; "))
    }
}

impl std::error::Error for FormErrors {}

pub trait Validate {
    fn validate(&self) -> Result<(), FormErrors>;
}

// ---------------------------------------------------------------------------
// Field checks
// ---------------------------------------------------------------------------

fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str, ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::Required { field })
    } else {
        Ok(value)
    }
}

fn length<'a>(
    field: &'static str,
    value: &'a str,
    min: Option<usize>,
    max: Option<usize>,
) -> Result<&'a str, ValidationError> {
    let len = value.chars().count();
    if let Some(min) = min {
        if len < min {
            return Err(ValidationError::TooShort { field, min });
        }
    }
    if let Some(max) = max {
        if len > max {
            return Err(ValidationError::TooLong { field, max });
        }
    }
    Ok(value)
}

fn email<'a>(field: &'static str, value: &'a str) -> Result<&'a str, ValidationError> {
    let value = value.trim();
    if EMAIL_RE.is_match(value) {
        Ok(value)
    } else {
        Err(ValidationError::InvalidEmail { field })
    }
}

fn amount_at_least(field: &'static str, value: &str, min: f64) -> Result<f64, ValidationError> {
    let parsed: f64 = value
        .trim()
        .parse()
        .map_err(|_| ValidationError::InvalidNumber { field })?;
    if !parsed.is_finite() {
        return Err(ValidationError::InvalidNumber { field });
    }
    if parsed < min {
        return Err(ValidationError::BelowMinimum { field, min });
    }
    Ok(parsed)
}

fn date(field: &'static str, value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| ValidationError::InvalidDate { field })
}

fn choice<T>(field: &'static str, value: &str, parse: impl Fn(&str) -> Option<T>) -> Result<T, ValidationError> {
    parse(value.trim()).ok_or_else(|| ValidationError::InvalidChoice {
        field,
        value: value.to_string(),
    })
}

fn optional(value: &str) -> Option<&str> {
    let v = value.trim();
    (!v.is_empty()).then_some(v)
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Sales,
    Services,
    Marketing,
    Suppliers,
    Taxes,
    GeneralExpenses,
    Other,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Sales,
        Category::Services,
        Category::Marketing,
        Category::Suppliers,
        Category::Taxes,
        Category::GeneralExpenses,
        Category::Other,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::Sales => "sales",
            Self::Services => "services",
            Self::Marketing => "marketing",
            Self::Suppliers => "suppliers",
            Self::Taxes => "taxes",
            Self::GeneralExpenses => "general_expenses",
            Self::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Sales => "Sales",
            Self::Services => "Services",
            Self::Marketing => "Marketing",
            Self::Suppliers => "Suppliers",
            Self::Taxes => "Taxes",
            Self::GeneralExpenses => "General Expenses",
            Self::Other => "Other",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.key() == key)
    }
}

// ---------------------------------------------------------------------------
// Forms
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    #[allow(dead_code)]
    pub remember_me: bool,
}

impl Validate for LoginForm {
    fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::default();
        errors.check(required("email", &self.email).and_then(|v| email("email", v)));
        errors.check(required("password", &self.password));
        errors.into_result(Some(()))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegistrationForm {
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub password2: String,
}

impl RegistrationForm {
    pub fn to_new_user(&self) -> Result<NewUser, FormErrors> {
        let mut errors = FormErrors::default();
        let full_name = errors.check(
            required("full_name", &self.full_name).and_then(|v| length("full_name", v.trim(), Some(2), Some(120))),
        );
        let username = errors.check(
            required("username", &self.username).and_then(|v| length("username", v.trim(), Some(4), Some(64))),
        );
        let email = errors.check(required("email", &self.email).and_then(|v| email("email", v)));
        let phone = errors.check(length("phone", self.phone.trim(), None, Some(20)));
        let password = errors.check(
            required("password", &self.password).and_then(|v| length("password", v, Some(6), None)),
        );
        errors.check(required("password2", &self.password2).and_then(|v| {
            if v == self.password {
                Ok(v)
            } else {
                Err(ValidationError::Mismatch { field: "password2", other: "password" })
            }
        }));

        let new_user = match (full_name, username, email, phone, password) {
            (Some(full_name), Some(username), Some(email), Some(phone), Some(password)) => Some(NewUser {
                username: username.to_string(),
                email: email.to_string(),
                password: password.to_string(),
                full_name: full_name.to_string(),
                phone: optional(phone).map(str::to_string),
            }),
            _ => None,
        };
        errors.into_result(new_user)
    }
}

impl Validate for RegistrationForm {
    fn validate(&self) -> Result<(), FormErrors> {
        self.to_new_user().map(|_| ())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ForgotPasswordForm {
    pub email: String,
}

impl Validate for ForgotPasswordForm {
    fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::default();
        errors.check(required("email", &self.email).and_then(|v| email("email", v)));
        errors.into_result(Some(()))
    }
}

/// New password plus confirmation, with the registration rules.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewPasswordForm {
    pub password: String,
    pub password2: String,
}

impl Validate for NewPasswordForm {
    fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::default();
        errors.check(required("password", &self.password).and_then(|v| length("password", v, Some(6), None)));
        errors.check(required("password2", &self.password2).and_then(|v| {
            if v == self.password {
                Ok(v)
            } else {
                Err(ValidationError::Mismatch { field: "password2", other: "password" })
            }
        }));
        errors.into_result(Some(()))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TransactionForm {
    pub description: String,
    pub amount: String,
    pub transaction_type: String,
    pub category: String,
    pub date: String,
}

impl TransactionForm {
    pub fn to_transaction(&self, user_id: i64) -> Result<Transaction, FormErrors> {
        let mut errors = FormErrors::default();
        let description = errors.check(
            required("description", &self.description).and_then(|v| length("description", v.trim(), None, Some(200))),
        );
        let amount = errors.check(
            required("amount", &self.amount).and_then(|v| amount_at_least("amount", v, MIN_AMOUNT)),
        );
        let kind = errors.check(
            required("transaction_type", &self.transaction_type)
                .and_then(|v| choice("transaction_type", v, TransactionType::parse)),
        );
        // category is optional; when given it must be one of the fixed choices
        let category = errors.check(match optional(&self.category) {
            Some(v) => choice("category", v, Category::from_key).map(Some),
            None => Ok(None),
        });
        let on = errors.check(required("date", &self.date).and_then(|v| date("date", v)));

        let txn = match (description, amount, kind, category, on) {
            (Some(description), Some(amount), Some(kind), Some(category), Some(on)) => {
                let mut t = Transaction::new(user_id, description, amount, kind, on);
                t.category = category.map(|c| c.key().to_string());
                Some(t)
            }
            _ => None,
        };
        errors.into_result(txn)
    }
}

impl Validate for TransactionForm {
    fn validate(&self) -> Result<(), FormErrors> {
        self.to_transaction(0).map(|_| ())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AccountForm {
    pub name: String,
    pub account_type: String,
    pub amount: String,
    pub due_date: String,
}

impl AccountForm {
    pub fn to_account(&self, user_id: i64) -> Result<Account, FormErrors> {
        let mut errors = FormErrors::default();
        let name = errors.check(required("name", &self.name).and_then(|v| length("name", v.trim(), None, Some(100))));
        let kind = errors.check(
            required("account_type", &self.account_type).and_then(|v| choice("account_type", v, AccountType::parse)),
        );
        let amount = errors.check(
            required("amount", &self.amount).and_then(|v| amount_at_least("amount", v, MIN_AMOUNT)),
        );
        let due = errors.check(required("due_date", &self.due_date).and_then(|v| date("due_date", v)));

        let account = match (name, kind, amount, due) {
            (Some(name), Some(kind), Some(amount), Some(due)) => {
                let mut a = Account::new(user_id, name, kind, amount);
                a.due_date = Some(due);
                Some(a)
            }
            _ => None,
        };
        errors.into_result(account)
    }
}

impl Validate for AccountForm {
    fn validate(&self) -> Result<(), FormErrors> {
        self.to_account(0).map(|_| ())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GoalForm {
    pub title: String,
    pub target_amount: String,
    pub current_amount: String,
    pub target_date: String,
}

impl GoalForm {
    pub fn to_goal(&self, user_id: i64) -> Result<FinancialGoal, FormErrors> {
        let mut errors = FormErrors::default();
        let title = errors.check(required("title", &self.title).and_then(|v| length("title", v.trim(), None, Some(100))));
        let target = errors.check(
            required("target_amount", &self.target_amount)
                .and_then(|v| amount_at_least("target_amount", v, MIN_AMOUNT)),
        );
        let current = errors.check(match optional(&self.current_amount) {
            Some(v) => amount_at_least("current_amount", v, 0.0),
            None => Ok(0.0),
        });
        let target_date = errors.check(match optional(&self.target_date) {
            Some(v) => date("target_date", v).map(Some),
            None => Ok(None),
        });

        let goal = match (title, target, current, target_date) {
            (Some(title), Some(target), Some(current), Some(target_date)) => {
                let mut g = FinancialGoal::new(user_id, title, target);
                g.current_amount = current;
                g.target_date = target_date;
                g.is_completed = current >= target;
                Some(g)
            }
            _ => None,
        };
        errors.into_result(goal)
    }
}

impl Validate for GoalForm {
    fn validate(&self) -> Result<(), FormErrors> {
        self.to_goal(0).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration() -> RegistrationForm {
        RegistrationForm {
            full_name: "Maria Silva".into(),
            username: "maria".into(),
            email: "maria@example.com".into(),
            phone: "".into(),
            password: "secret1".into(),
            password2: "secret1".into(),
        }
    }

    #[test]
    fn test_login_requires_fields() {
        let errs = LoginForm::default().validate().unwrap_err();
        assert_eq!(errs.errors().len(), 2);
        assert!(matches!(errs.for_field("email"), Some(ValidationError::Required { .. })));
        assert!(matches!(errs.for_field("password"), Some(ValidationError::Required { .. })));
    }

    #[test]
    fn test_email_shape() {
        let form = LoginForm { email: "not-an-email".into(), password: "x".into(), remember_me: false };
        let errs = form.validate().unwrap_err();
        assert!(matches!(errs.for_field("email"), Some(ValidationError::InvalidEmail { .. })));
        let ok = LoginForm { email: "a@b.co".into(), password: "x".into(), remember_me: true };
        assert!(ok.validate().is_ok());
        assert!(ForgotPasswordForm { email: "a b@c.d".into() }.validate().is_err());
    }

    #[test]
    fn test_new_password_rules() {
        let ok = NewPasswordForm { password: "hunter22".into(), password2: "hunter22".into() };
        assert!(ok.validate().is_ok());
        let errs = NewPasswordForm { password: "abc".into(), password2: "abd".into() }.validate().unwrap_err();
        assert_eq!(errs.errors().len(), 2);
        assert!(matches!(errs.for_field("password"), Some(ValidationError::TooShort { min: 6, .. })));
    }

    #[test]
    fn test_registration_valid() {
        let user = registration().to_new_user().unwrap();
        assert_eq!(user.username, "maria");
        assert_eq!(user.phone, None);
    }

    #[test]
    fn test_registration_collects_all_errors() {
        let form = RegistrationForm {
            full_name: "M".into(),
            username: "abc".into(),
            email: "bad".into(),
            phone: "1".repeat(21),
            password: "12345".into(),
            password2: "54321".into(),
        };
        let errs = form.to_new_user().unwrap_err();
        assert_eq!(errs.errors().len(), 6);
        assert_eq!(errs.for_field("full_name"), Some(&ValidationError::TooShort { field: "full_name", min: 2 }));
        assert_eq!(errs.for_field("username"), Some(&ValidationError::TooShort { field: "username", min: 4 }));
        assert_eq!(errs.for_field("phone"), Some(&ValidationError::TooLong { field: "phone", max: 20 }));
        assert_eq!(errs.for_field("password"), Some(&ValidationError::TooShort { field: "password", min: 6 }));
        assert_eq!(
            errs.for_field("password2"),
            Some(&ValidationError::Mismatch { field: "password2", other: "password" })
        );
    }

    #[test]
    fn test_registration_length_bounds() {
        let mut form = registration();
        form.username = "u".repeat(64);
        form.full_name = "n".repeat(120);
        assert!(form.validate().is_ok());
        form.username = "u".repeat(65);
        let errs = form.validate().unwrap_err();
        assert_eq!(errs.for_field("username"), Some(&ValidationError::TooLong { field: "username", max: 64 }));
    }

    #[test]
    fn test_required_short_circuits_field() {
        let mut form = registration();
        form.full_name = "   ".into();
        let errs = form.validate().unwrap_err();
        assert_eq!(errs.errors().len(), 1);
        assert_eq!(errs.for_field("full_name"), Some(&ValidationError::Required { field: "full_name" }));
    }

    #[test]
    fn test_transaction_form_converts() {
        let form = TransactionForm {
            description: "Cake order".into(),
            amount: "150.00".into(),
            transaction_type: "income".into(),
            category: "sales".into(),
            date: "2025-02-14".into(),
        };
        let t = form.to_transaction(7).unwrap();
        assert_eq!(t.user_id, 7);
        assert_eq!(t.amount, 150.0);
        assert_eq!(t.transaction_type, TransactionType::Income);
        assert_eq!(t.category.as_deref(), Some("sales"));
        assert_eq!(t.date, NaiveDate::from_ymd_opt(2025, 2, 14).unwrap());
    }

    #[test]
    fn test_transaction_form_rejects_bad_values() {
        let form = TransactionForm {
            description: "d".repeat(201),
            amount: "0".into(),
            transaction_type: "refund".into(),
            category: "gifts".into(),
            date: "14/02/2025".into(),
        };
        let errs = form.validate().unwrap_err();
        assert_eq!(errs.errors().len(), 5);
        assert!(matches!(errs.for_field("amount"), Some(ValidationError::BelowMinimum { .. })));
        assert!(matches!(errs.for_field("transaction_type"), Some(ValidationError::InvalidChoice { .. })));
        assert!(matches!(errs.for_field("category"), Some(ValidationError::InvalidChoice { .. })));
        assert!(matches!(errs.for_field("date"), Some(ValidationError::InvalidDate { .. })));
    }

    #[test]
    fn test_amount_minimum_boundary() {
        let mut form = AccountForm {
            name: "Supplier".into(),
            account_type: "payable".into(),
            amount: "0.01".into(),
            due_date: "2025-06-01".into(),
        };
        assert!(form.validate().is_ok());
        form.amount = "0.009".into();
        assert!(form.validate().is_err());
        form.amount = "abc".into();
        let errs = form.validate().unwrap_err();
        assert!(matches!(errs.for_field("amount"), Some(ValidationError::InvalidNumber { .. })));
    }

    #[test]
    fn test_account_form_converts() {
        let form = AccountForm {
            name: "Client invoice".into(),
            account_type: "receivable".into(),
            amount: "980.5".into(),
            due_date: "2025-06-01".into(),
        };
        let a = form.to_account(3).unwrap();
        assert_eq!(a.account_type, AccountType::Receivable);
        assert_eq!(a.due_date, NaiveDate::from_ymd_opt(2025, 6, 1));
    }

    #[test]
    fn test_goal_form_optional_fields() {
        let form = GoalForm { title: "Van".into(), target_amount: "50000".into(), ..Default::default() };
        let g = form.to_goal(1).unwrap();
        assert_eq!(g.current_amount, 0.0);
        assert_eq!(g.target_date, None);
        assert!(!g.is_completed);

        let bad = GoalForm { title: "Van".into(), target_amount: "50000".into(), current_amount: "-1".into(), target_date: "soon".into() };
        assert_eq!(bad.validate().unwrap_err().errors().len(), 2);
    }

    #[test]
    fn test_form_deserializes_with_missing_fields() {
        let form: LoginForm = serde_json::from_str(r#"{"email": "a@b.co"}"#).unwrap();
        assert!(form.password.is_empty());
        assert!(!form.remember_me);
    }

    #[test]
    fn test_errors_display() {
        let errs = LoginForm::default().validate().unwrap_err();
        assert_eq!(errs.to_string(), "email is required; password is required");
    }
}
