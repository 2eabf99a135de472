use comfy_table::{Cell, Table};

use crate::cli::{acting_user, open_db};
use crate::error::{Result, TallyError};
use crate::fmt::money;
use crate::forms::GoalForm;
use crate::goals::FinancialGoal;

pub fn add(username: Option<&str>, title: &str, target: &str, current: &str, target_date: &str) -> Result<()> {
    let db = open_db()?;
    let user = acting_user(&db, username)?;
    let form = GoalForm {
        title: title.to_string(),
        target_amount: target.to_string(),
        current_amount: current.to_string(),
        target_date: target_date.to_string(),
    };
    let mut goal = form.to_goal(user.require_id()?)?;
    goal.save(&db)?;
    println!("Added goal '{}' (#{})", goal.title, goal.id.unwrap_or_default());
    Ok(())
}

pub fn list(username: Option<&str>, completed: bool, open: bool) -> Result<()> {
    let db = open_db()?;
    let user = acting_user(&db, username)?;
    let filter = match (completed, open) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    };
    let goals = FinancialGoal::get_by_user_id(&db, user.require_id()?, filter)?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Goal", "Saved", "Target", "Progress", "By"]);
    for g in &goals {
        let progress = if g.is_completed {
            "done".to_string()
        } else {
            format!("{:.1}%", g.progress_percentage())
        };
        table.add_row(vec![
            Cell::new(g.id.unwrap_or_default()),
            Cell::new(&g.title),
            Cell::new(money(g.current_amount)),
            Cell::new(money(g.target_amount)),
            Cell::new(progress),
            Cell::new(g.target_date.map(|d| d.to_string()).unwrap_or_default()),
        ]);
    }
    println!("Goals\n{table}");
    Ok(())
}

pub fn contribute(username: Option<&str>, id: i64, amount: f64) -> Result<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(TallyError::Other("--amount must be positive".to_string()));
    }
    let db = open_db()?;
    let user = acting_user(&db, username)?;
    let mut goal = FinancialGoal::get_by_id(&db, id, Some(user.require_id()?))?
        .ok_or_else(|| TallyError::NotFound(format!("goal {id}")))?;
    goal.contribute(&db, amount)?;
    println!(
        "'{}': {} of {} ({:.1}%)",
        goal.title,
        money(goal.current_amount),
        money(goal.target_amount),
        goal.progress_percentage()
    );
    if goal.is_completed {
        println!("Goal reached!");
    }
    Ok(())
}
