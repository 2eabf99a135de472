use crate::db::get_connection;
use crate::error::Result;
use crate::fmt::format_bytes;
use crate::settings::load_settings;

pub fn run() -> Result<()> {
    let settings = load_settings();
    let db_path = settings.db_path();

    println!("Data dir:   {}", settings.data_dir);
    println!("Database:   {}", db_path.display());

    if db_path.exists() {
        let size = std::fs::metadata(&db_path)?.len();
        println!("DB size:    {}", format_bytes(size));

        let conn = get_connection(&db_path)?;
        let count = |table: &str| -> rusqlite::Result<i64> {
            conn.query_row(&format!("SELECT count(*) FROM {table}"), [], |r| r.get(0))
        };
        let active: i64 = conn.query_row("SELECT count(*) FROM users WHERE active = 1", [], |r| r.get(0))?;

        println!();
        println!("Users:         {} ({active} active)", count("users")?);
        println!("Transactions:  {}", count("transactions")?);
        println!("Accounts:      {}", count("accounts")?);
        println!("Goals:         {}", count("financial_goals")?);
    } else {
        println!();
        println!("Database not found. Run `tally init` to set up.");
    }

    Ok(())
}
