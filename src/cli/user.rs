use chrono::Utc;
use colored::Colorize;

use crate::cli::{acting_user, open_db};
use crate::error::{Result, TallyError};
use crate::plans::Plan;
use crate::users::days_after;

pub fn show(username: Option<&str>) -> Result<()> {
    let db = open_db()?;
    let user = acting_user(&db, username)?;
    let features = user.plan_features();
    let usage = user.transaction_limit_check(&db)?;

    println!("User:         {} <{}>", user.username, user.email);
    println!("Name:         {}", user.full_name);
    println!("Phone:        {}", user.phone.as_deref().unwrap_or("(not set)"));
    println!("Plan:         {} ({})", features.name, user.subscription_status);
    if let Some(end) = user.trial_end_date {
        let label = if user.is_trial_expired() { "expired".red() } else { "ends".normal() };
        println!("Trial:        {label} {}", end.format("%Y-%m-%d"));
    }
    if let Some(end) = user.subscription_end_date {
        println!("Subscription: until {}", end.format("%Y-%m-%d"));
    }
    let access = if user.is_subscription_active() { "active".green() } else { "inactive".red() };
    println!("Access:       {access}");
    match usage.limit {
        Some(limit) => println!("Transactions: {} of {limit}", usage.current),
        None => println!("Transactions: {} (unlimited)", usage.current),
    }
    Ok(())
}

pub fn subscribe(username: Option<&str>, plan: &str, days: i64) -> Result<()> {
    if days <= 0 {
        return Err(TallyError::Other("--days must be positive".to_string()));
    }
    let chosen = Plan::from_name(plan);
    if chosen == Plan::Trial {
        return Err(TallyError::Other(format!(
            "'{plan}' is not a paid plan (choose mei, professional or enterprise)"
        )));
    }
    let db = open_db()?;
    let mut user = acting_user(&db, username)?;
    let until = days_after(Utc::now(), days).map_err(|_| TallyError::Other("--days out of range".to_string()))?;
    user.subscribe(&db, chosen, until)?;
    println!(
        "Subscribed {} to {} until {}",
        user.username,
        chosen.features().name,
        until.format("%Y-%m-%d")
    );
    Ok(())
}

pub fn cancel(username: Option<&str>) -> Result<()> {
    let db = open_db()?;
    let mut user = acting_user(&db, username)?;
    user.cancel_subscription(&db)?;
    println!("Cancelled subscription for {}", user.username);
    Ok(())
}

pub fn deactivate(username: Option<&str>) -> Result<()> {
    let db = open_db()?;
    let mut user = acting_user(&db, username)?;
    user.deactivate(&db)?;
    println!("Deactivated {}", user.username);
    Ok(())
}
