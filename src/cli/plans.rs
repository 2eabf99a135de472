use comfy_table::{Cell, Table};

use crate::error::Result;
use crate::plans::{Feature, Plan};

fn yes_no(b: bool) -> &'static str {
    if b {
        "yes"
    } else {
        "no"
    }
}

pub fn run() -> Result<()> {
    let mut table = Table::new();
    table.set_header(vec!["Plan", "Key", "Transactions", "Reports", "Automation", "Multi-user"]);
    for plan in Plan::ALL {
        let f = plan.features();
        table.add_row(vec![
            Cell::new(f.name),
            Cell::new(plan.as_str()),
            Cell::new(f.transactions_limit.map(|l| l.to_string()).unwrap_or_else(|| "unlimited".to_string())),
            Cell::new(yes_no(f.allows(Feature::Reports))),
            Cell::new(yes_no(f.allows(Feature::Automation))),
            Cell::new(yes_no(f.allows(Feature::MultiUser))),
        ]);
    }
    println!("Plans\n{table}");
    Ok(())
}
