use chrono::Local;
use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::accounts::{Account, AccountStatus, AccountType};
use crate::cli::{acting_user, open_db};
use crate::error::{Result, TallyError};
use crate::fmt::money;
use crate::forms::AccountForm;

pub fn add(username: Option<&str>, name: &str, account_type: &str, amount: &str, due_date: &str) -> Result<()> {
    let db = open_db()?;
    let user = acting_user(&db, username)?;
    let form = AccountForm {
        name: name.to_string(),
        account_type: account_type.to_string(),
        amount: amount.to_string(),
        due_date: due_date.to_string(),
    };
    let mut account = form.to_account(user.require_id()?)?;
    account.save(&db)?;
    println!(
        "Added {}: {} {} (#{})",
        account.account_type,
        account.name,
        money(account.amount),
        account.id.unwrap_or_default()
    );
    Ok(())
}

pub fn list(username: Option<&str>, account_type: Option<&str>) -> Result<()> {
    let db = open_db()?;
    let user = acting_user(&db, username)?;
    let filter = match account_type {
        Some(t) => Some(AccountType::parse(t).ok_or_else(|| TallyError::Other(format!("unknown account type: {t}")))?),
        None => None,
    };
    let rows = Account::get_by_user_id(&db, user.require_id()?, filter)?;
    let today = Local::now().date_naive();

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Type", "Due", "Status", "Amount"]);
    for a in &rows {
        let status = match a.status {
            AccountStatus::Paid => a.status.as_str().green().to_string(),
            AccountStatus::Pending if a.is_overdue_on(today) => "overdue".red().bold().to_string(),
            AccountStatus::Pending => a.status.as_str().to_string(),
        };
        table.add_row(vec![
            Cell::new(a.id.unwrap_or_default()),
            Cell::new(&a.name),
            Cell::new(a.account_type),
            Cell::new(a.due_date.map(|d| d.to_string()).unwrap_or_default()),
            Cell::new(status),
            Cell::new(money(a.amount)),
        ]);
    }
    println!("Payables & Receivables\n{table}");
    Ok(())
}

pub fn pay(username: Option<&str>, id: i64) -> Result<()> {
    let db = open_db()?;
    let user = acting_user(&db, username)?;
    let mut account = Account::get_by_id(&db, id, Some(user.require_id()?))?
        .ok_or_else(|| TallyError::NotFound(format!("account {id}")))?;
    if account.status == AccountStatus::Paid {
        return Err(TallyError::Other(format!("account {id} is already paid")));
    }
    account.mark_paid(&db)?;
    println!("Marked '{}' as paid", account.name);
    Ok(())
}

pub fn pending(username: Option<&str>) -> Result<()> {
    let db = open_db()?;
    let user = acting_user(&db, username)?;
    let user_id = user.require_id()?;
    let receivable = Account::get_pending_total(&db, user_id, AccountType::Receivable)?;
    let payable = Account::get_pending_total(&db, user_id, AccountType::Payable)?;

    let mut table = Table::new();
    table.set_header(vec!["Pending", "Amount"]);
    table.add_row(vec![Cell::new("To receive"), Cell::new(money(receivable))]);
    table.add_row(vec![Cell::new("To pay"), Cell::new(money(payable))]);
    table.add_row(vec![Cell::new("Balance".bold()), Cell::new(money(receivable - payable))]);
    println!("{table}");
    Ok(())
}
