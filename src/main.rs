mod accounts;
mod cli;
mod db;
mod error;
mod fmt;
mod forms;
mod goals;
mod logging;
mod password;
mod plans;
mod settings;
mod transactions;
mod users;

use clap::Parser;

use cli::{AccountsCommands, Cli, Commands, GoalsCommands, TxCommands, UserCommands};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init_tracing(cli.verbose, &settings::load_settings().log_level) {
        eprintln!("Warning: {e}");
    }

    let user = cli.user.as_deref();
    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Register {
            username,
            email,
            name,
            phone,
            password,
        } => cli::auth::register(&username, &email, &name, phone.as_deref(), password),
        Commands::Login { email, password } => cli::auth::login(&email, password),
        Commands::ResetPassword { email, password } => cli::auth::reset_password(&email, password),
        Commands::User { command } => match command {
            UserCommands::Show => cli::user::show(user),
            UserCommands::Subscribe { plan, days } => cli::user::subscribe(user, &plan, days),
            UserCommands::Cancel => cli::user::cancel(user),
            UserCommands::Deactivate => cli::user::deactivate(user),
        },
        Commands::Tx { command } => match command {
            TxCommands::Add {
                description,
                amount,
                transaction_type,
                category,
                date,
                recurring,
                account,
            } => cli::transactions::add(
                user,
                &description,
                &amount,
                &transaction_type,
                &category,
                date.as_deref(),
                recurring.as_deref(),
                account,
            ),
            TxCommands::List { limit, order } => cli::transactions::list(user, limit, &order),
            TxCommands::Summary { month } => cli::transactions::summary(user, month),
            TxCommands::Delete { id } => cli::transactions::delete(user, id),
        },
        Commands::Accounts { command } => match command {
            AccountsCommands::Add {
                name,
                account_type,
                amount,
                due_date,
            } => cli::accounts::add(user, &name, &account_type, &amount, &due_date),
            AccountsCommands::List { account_type } => cli::accounts::list(user, account_type.as_deref()),
            AccountsCommands::Pay { id } => cli::accounts::pay(user, id),
            AccountsCommands::Pending => cli::accounts::pending(user),
        },
        Commands::Goals { command } => match command {
            GoalsCommands::Add {
                title,
                target,
                current,
                target_date,
            } => cli::goals::add(user, &title, &target, &current, &target_date),
            GoalsCommands::List { completed, open } => cli::goals::list(user, completed, open),
            GoalsCommands::Contribute { id, amount } => cli::goals::contribute(user, id, amount),
        },
        Commands::Plans => cli::plans::run(),
        Commands::Status => cli::status::run(),
        Commands::Backup { output } => cli::backup::run(output),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
