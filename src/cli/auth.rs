use tracing::info;
use zeroize::Zeroize;

use crate::cli::open_db;
use crate::error::{Result, TallyError};
use crate::forms::{ForgotPasswordForm, LoginForm, NewPasswordForm, RegistrationForm, Validate};
use crate::settings::load_settings;
use crate::users::User;

fn prompt(label: &str) -> Result<String> {
    Ok(rpassword::prompt_password(label)?)
}

pub fn register(
    username: &str,
    email: &str,
    full_name: &str,
    phone: Option<&str>,
    password: Option<String>,
) -> Result<()> {
    let db = open_db()?;
    let (password, password2) = match password {
        Some(p) => (p.clone(), p),
        None => (prompt("Password: ")?, prompt("Confirm password: ")?),
    };

    let mut form = RegistrationForm {
        full_name: full_name.to_string(),
        username: username.to_string(),
        email: email.to_string(),
        phone: phone.unwrap_or_default().to_string(),
        password,
        password2,
    };
    let result = form.to_new_user();
    form.password.zeroize();
    form.password2.zeroize();
    let mut new_user = result?;

    let trial_days = load_settings().trial_days;
    let created = User::create_with_trial(&db, new_user.clone(), trial_days);
    new_user.password.zeroize();
    let user = created?;

    println!("Registered {} <{}>", user.username, user.email);
    if let Some(end) = user.trial_end_date {
        println!("Free trial ends {}", end.format("%Y-%m-%d %H:%M UTC"));
    }
    Ok(())
}

pub fn login(email: &str, password: Option<String>) -> Result<()> {
    let db = open_db()?;
    let password = match password {
        Some(p) => p,
        None => prompt("Password: ")?,
    };
    let mut form = LoginForm {
        email: email.to_string(),
        password,
        remember_me: false,
    };
    let outcome = authenticate(&db, &form);
    form.password.zeroize();
    let user = outcome?;

    println!("Welcome, {}", user.full_name);
    let features = user.plan_features();
    if user.is_subscription_active() {
        println!("Plan: {} ({})", features.name, user.subscription_status);
    } else {
        println!("Plan: {} (inactive). Subscribe with `tally user subscribe`.", features.name);
    }
    Ok(())
}

/// Local reset: there is no mail delivery, so whoever runs the binary against
/// the data directory may replace the hash.
pub fn reset_password(email: &str, password: Option<String>) -> Result<()> {
    let db = open_db()?;
    let lookup = ForgotPasswordForm { email: email.to_string() };
    lookup.validate()?;
    let mut user = User::get_by_email(&db, lookup.email.trim())?
        .ok_or_else(|| TallyError::NotFound(format!("no user registered with {}", lookup.email.trim())))?;

    let (password, password2) = match password {
        Some(p) => (p.clone(), p),
        None => (prompt("New password: ")?, prompt("Confirm password: ")?),
    };
    let mut form = NewPasswordForm { password, password2 };
    let outcome = form.validate().map_err(TallyError::from).and_then(|_| user.set_password(&form.password));
    form.password.zeroize();
    form.password2.zeroize();
    outcome?;

    user.save(&db)?;
    info!(user_id = ?user.id, "password reset");
    println!("Password updated for {}", user.username);
    Ok(())
}

fn authenticate(db: &crate::db::Database, form: &LoginForm) -> Result<User> {
    form.validate()?;
    let user = User::get_by_email(db, form.email.trim())?.ok_or(TallyError::InvalidCredentials)?;
    if !user.active || !user.check_password(&form.password) {
        return Err(TallyError::InvalidCredentials);
    }
    Ok(user)
}
