use chrono::{Datelike, Local};
use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::accounts::Account;
use crate::cli::{acting_user, open_db, parse_month_opt};
use crate::error::{Result, TallyError};
use crate::fmt::money;
use crate::forms::{Category, TransactionForm};
use crate::transactions::{Recurrence, Transaction, TransactionOrder, TransactionType};

#[allow(clippy::too_many_arguments)]
pub fn add(
    username: Option<&str>,
    description: &str,
    amount: &str,
    transaction_type: &str,
    category: &str,
    date: Option<&str>,
    recurring: Option<&str>,
    account: Option<i64>,
) -> Result<()> {
    let db = open_db()?;
    let user = acting_user(&db, username)?;
    let user_id = user.require_id()?;

    if !user.can_add_transaction(&db)? {
        if !user.is_subscription_active() {
            return Err(TallyError::SubscriptionInactive);
        }
        let check = user.transaction_limit_check(&db)?;
        return Err(TallyError::LimitReached {
            limit: check.limit.unwrap_or_default(),
        });
    }

    let today = Local::now().date_naive().format("%Y-%m-%d").to_string();
    let form = TransactionForm {
        description: description.to_string(),
        amount: amount.to_string(),
        transaction_type: transaction_type.to_string(),
        category: category.to_string(),
        date: date.map(str::to_string).unwrap_or(today),
    };
    let mut txn = form.to_transaction(user_id)?;

    if let Some(r) = recurring {
        let recurrence = Recurrence::parse(r).ok_or_else(|| TallyError::Other(format!("unknown recurrence: {r}")))?;
        txn.is_recurring = true;
        txn.recurrence_type = Some(recurrence);
    }
    if let Some(account_id) = account {
        Account::get_by_id(&db, account_id, Some(user_id))?
            .ok_or_else(|| TallyError::NotFound(format!("account {account_id}")))?;
        txn.account_id = Some(account_id);
    }

    txn.save(&db)?;
    println!(
        "Recorded {} {} on {} (#{})",
        txn.transaction_type,
        money(txn.amount),
        txn.date,
        txn.id.unwrap_or_default()
    );
    Ok(())
}

fn parse_order(order: &str) -> Result<TransactionOrder> {
    match order {
        "date" => Ok(TransactionOrder::DateDesc),
        "date-asc" => Ok(TransactionOrder::DateAsc),
        "amount" => Ok(TransactionOrder::AmountDesc),
        "amount-asc" => Ok(TransactionOrder::AmountAsc),
        "created" => Ok(TransactionOrder::CreatedDesc),
        other => Err(TallyError::Other(format!("unknown order: {other}"))),
    }
}

pub fn list(username: Option<&str>, limit: Option<u32>, order: &str) -> Result<()> {
    let db = open_db()?;
    let user = acting_user(&db, username)?;
    let rows = Transaction::get_by_user_id(&db, user.require_id()?, limit, parse_order(order)?)?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Date", "Description", "Category", "Amount", "Recurs"]);
    for t in &rows {
        let amount = match t.transaction_type {
            TransactionType::Income => money(t.amount).green().to_string(),
            TransactionType::Expense => money(t.amount).red().to_string(),
        };
        table.add_row(vec![
            Cell::new(t.id.unwrap_or_default()),
            Cell::new(t.date),
            Cell::new(&t.description),
            Cell::new(t.category.as_deref().map(|k| Category::from_key(k).map_or(k, |c| c.label())).unwrap_or_default()),
            Cell::new(amount),
            Cell::new(t.recurrence_type.map(|r| r.as_str()).unwrap_or_default()),
        ]);
    }
    println!("Transactions\n{table}");
    Ok(())
}

pub fn summary(username: Option<&str>, month: Option<String>) -> Result<()> {
    let db = open_db()?;
    let user = acting_user(&db, username)?;
    let now = Local::now();
    let (year, month_num) = match parse_month_opt(&month) {
        (Some(y), Some(m)) if (1..=12).contains(&m) => (y, m),
        _ if month.is_some() => return Err(TallyError::Other("--month must be YYYY-MM".to_string())),
        _ => (now.year(), now.month()),
    };

    let s = Transaction::get_monthly_summary(&db, user.require_id()?, month_num, year)?;
    let net = s.net();
    let net_label = if net >= 0.0 { "Net".green().bold() } else { "Net".red().bold() };

    let mut table = Table::new();
    table.set_header(vec![format!("{year:04}-{month_num:02}"), "Amount".to_string()]);
    table.add_row(vec![Cell::new("Income"), Cell::new(money(s.income))]);
    table.add_row(vec![Cell::new("Expenses"), Cell::new(money(s.expenses))]);
    table.add_row(vec![Cell::new(net_label), Cell::new(money(net))]);
    println!("Monthly Summary\n{table}");
    Ok(())
}

pub fn delete(username: Option<&str>, id: i64) -> Result<()> {
    let db = open_db()?;
    let user = acting_user(&db, username)?;
    let user_id = user.require_id()?;
    let txn = Transaction::get_by_id(&db, id, Some(user_id))?
        .ok_or_else(|| TallyError::NotFound(format!("transaction {id}")))?;
    if !Transaction::delete(&db, id, user_id)? {
        return Err(TallyError::NotFound(format!("transaction {id}")));
    }
    println!("Deleted transaction {id} ({}, {})", txn.description, money(txn.amount));
    Ok(())
}
