//! Subscription tiers and the feature limits attached to each one.
//!
//! Everything here is a pure lookup; nothing touches the database.

use std::fmt;

use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef};

/// Named subscription tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Plan {
    #[default]
    Trial,
    Mei,
    Professional,
    Enterprise,
}

impl Plan {
    pub const ALL: [Plan; 4] = [Plan::Trial, Plan::Mei, Plan::Professional, Plan::Enterprise];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trial => "trial",
            Self::Mei => "mei",
            Self::Professional => "professional",
            Self::Enterprise => "enterprise",
        }
    }

    /// Unknown plan names fall back to the trial tier.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "mei" => Self::Mei,
            "professional" => Self::Professional,
            "enterprise" => Self::Enterprise,
            _ => Self::Trial,
        }
    }

    pub fn features(&self) -> PlanFeatures {
        match self {
            Self::Trial => PlanFeatures {
                name: "Free Trial",
                transactions_limit: Some(10),
                reports: false,
                automation: false,
                multi_user: false,
            },
            Self::Mei => PlanFeatures {
                name: "MEI Plan",
                transactions_limit: Some(100),
                reports: true,
                automation: false,
                multi_user: false,
            },
            Self::Professional => PlanFeatures {
                name: "Professional Plan",
                transactions_limit: Some(500),
                reports: true,
                automation: true,
                multi_user: false,
            },
            Self::Enterprise => PlanFeatures {
                name: "Enterprise Plan",
                transactions_limit: None,
                reports: true,
                automation: true,
                multi_user: true,
            },
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromSql for Plan {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str().map(Plan::from_name)
    }
}

impl ToSql for Plan {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

/// Gated capabilities beyond the transaction cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    Reports,
    Automation,
    MultiUser,
}

/// Limits for one plan. `transactions_limit` of `None` means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanFeatures {
    pub name: &'static str,
    pub transactions_limit: Option<u32>,
    pub reports: bool,
    pub automation: bool,
    pub multi_user: bool,
}

/// Outcome of checking a count against a plan limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitCheck {
    pub allowed: bool,
    pub current: i64,
    pub limit: Option<u32>,
}

impl PlanFeatures {
    pub fn allows(&self, feature: Feature) -> bool {
        match feature {
            Feature::Reports => self.reports,
            Feature::Automation => self.automation,
            Feature::MultiUser => self.multi_user,
        }
    }

    /// Whether one more transaction fits given `current` existing ones.
    pub fn check_transaction_limit(&self, current: i64) -> LimitCheck {
        let allowed = match self.transactions_limit {
            Some(limit) => current < i64::from(limit),
            None => true,
        };
        LimitCheck {
            allowed,
            current,
            limit: self.transactions_limit,
        }
    }
}

/// Stored subscription state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SubscriptionStatus {
    #[default]
    Trial,
    Active,
    Cancelled,
    Expired,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trial => "trial",
            Self::Active => "active",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
        }
    }

    /// Unrecognised stored text is treated as expired so it never grants access.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "trial" => Self::Trial,
            "active" => Self::Active,
            "cancelled" | "canceled" => Self::Cancelled,
            _ => Self::Expired,
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromSql for SubscriptionStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str().map(SubscriptionStatus::from_name)
    }
}

impl ToSql for SubscriptionStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}
