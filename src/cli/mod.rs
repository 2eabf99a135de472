pub mod accounts;
pub mod auth;
pub mod backup;
pub mod goals;
pub mod init;
pub mod plans;
pub mod status;
pub mod transactions;
pub mod user;

use clap::{Parser, Subcommand};

use crate::db::Database;
use crate::error::{Result, TallyError};
use crate::settings::load_settings;
use crate::users::User;

pub(crate) fn open_db() -> Result<Database> {
    let settings = load_settings();
    let path = settings.db_path();
    if !path.exists() {
        return Err(TallyError::Settings(format!(
            "No database found at {}\nRun `tally init` to create one.",
            path.display()
        )));
    }
    Database::open(path)
}

/// Resolve the acting user from `--user`; deactivated users are refused.
pub(crate) fn acting_user(db: &Database, username: Option<&str>) -> Result<User> {
    let username = username.ok_or_else(|| TallyError::Other("this command needs --user <username>".to_string()))?;
    let user = User::get_by_username(db, username)?.ok_or_else(|| TallyError::UnknownUser(username.to_string()))?;
    if !user.active {
        return Err(TallyError::Other(format!("user '{username}' is deactivated")));
    }
    Ok(user)
}

pub(crate) fn parse_month_opt(month: &Option<String>) -> (Option<i32>, Option<u32>) {
    if let Some(m) = month {
        let parts: Vec<&str> = m.split('-').collect();
        if parts.len() == 2 {
            let year = parts[0].parse().ok();
            let month = parts[1].parse().ok();
            return (year, month);
        }
    }
    (None, None)
}

#[derive(Parser)]
#[command(name = "tally", about = "Income, expense, payables and savings-goal tracking for small businesses.")]
pub struct Cli {
    /// Username to act as
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Choose a data directory and initialize the database.
    Init {
        /// Path for tally data (default: ~/.local/share/tally)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Register a new user with a free trial.
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        /// Full name
        #[arg(long)]
        name: String,
        #[arg(long)]
        phone: Option<String>,
        /// Password (prompted when omitted)
        #[arg(long)]
        password: Option<String>,
    },
    /// Check credentials and show subscription state.
    Login {
        #[arg(long)]
        email: String,
        /// Password (prompted when omitted)
        #[arg(long)]
        password: Option<String>,
    },
    /// Set a new password for the account registered under an email.
    ResetPassword {
        #[arg(long)]
        email: String,
        /// New password (prompted when omitted)
        #[arg(long)]
        password: Option<String>,
    },
    /// Manage the acting user's profile and subscription.
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
    /// Record and report income and expenses.
    Tx {
        #[command(subcommand)]
        command: TxCommands,
    },
    /// Manage payables and receivables.
    Accounts {
        #[command(subcommand)]
        command: AccountsCommands,
    },
    /// Manage savings goals.
    Goals {
        #[command(subcommand)]
        command: GoalsCommands,
    },
    /// Show the available plans and their limits.
    Plans,
    /// Show current database and summary statistics.
    Status,
    /// Back up the database.
    Backup {
        /// Output path (default: <data_dir>/backups/tally-YYYYMMDD-HHMMSS.db)
        #[arg(long)]
        output: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Show profile, plan and subscription state.
    Show,
    /// Subscribe to a plan.
    Subscribe {
        /// Plan: mei, professional, enterprise
        plan: String,
        /// Subscription length in days
        #[arg(long, default_value = "30")]
        days: i64,
    },
    /// Cancel the current subscription.
    Cancel,
    /// Deactivate the user (data is kept).
    Deactivate,
}

#[derive(Subcommand)]
pub enum TxCommands {
    /// Record a transaction.
    Add {
        description: String,
        /// Amount (positive)
        #[arg(long)]
        amount: String,
        /// Type: income, expense
        #[arg(long = "type")]
        transaction_type: String,
        /// Category: sales, services, marketing, suppliers, taxes, general_expenses, other
        #[arg(long, default_value = "")]
        category: String,
        /// Date: YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,
        /// Recurrence: daily, weekly, monthly, yearly
        #[arg(long)]
        recurring: Option<String>,
        /// Link to a payable/receivable by ID
        #[arg(long)]
        account: Option<i64>,
    },
    /// List transactions, newest first.
    List {
        #[arg(long)]
        limit: Option<u32>,
        /// Order: date, date-asc, amount, amount-asc, created
        #[arg(long, default_value = "date")]
        order: String,
    },
    /// Monthly income/expense summary.
    Summary {
        /// Month: YYYY-MM (default: current month)
        #[arg(long)]
        month: Option<String>,
    },
    /// Delete a transaction by ID.
    Delete { id: i64 },
}

#[derive(Subcommand)]
pub enum AccountsCommands {
    /// Add a payable or receivable.
    Add {
        name: String,
        /// Type: receivable, payable
        #[arg(long = "type")]
        account_type: String,
        #[arg(long)]
        amount: String,
        /// Due date: YYYY-MM-DD
        #[arg(long = "due")]
        due_date: String,
    },
    /// List payables and receivables.
    List {
        /// Filter by type: receivable, payable
        #[arg(long = "type")]
        account_type: Option<String>,
    },
    /// Mark an item as paid.
    Pay { id: i64 },
    /// Totals still pending, by type.
    Pending,
}

#[derive(Subcommand)]
pub enum GoalsCommands {
    /// Add a savings goal.
    Add {
        title: String,
        #[arg(long)]
        target: String,
        /// Amount already saved
        #[arg(long, default_value = "")]
        current: String,
        /// Target date: YYYY-MM-DD
        #[arg(long = "by", default_value = "")]
        target_date: String,
    },
    /// List goals.
    List {
        /// Only completed goals
        #[arg(long, conflicts_with = "open")]
        completed: bool,
        /// Only open goals
        #[arg(long)]
        open: bool,
    },
    /// Add money to a goal.
    Contribute {
        id: i64,
        #[arg(long)]
        amount: f64,
    },
}
