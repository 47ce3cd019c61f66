use anyhow::Result;
use std::process;

use sugarwise_core::SugarService;
use sugarwise_core::models::SugarEntry;

use super::helpers::{json_error, print_entry_table, print_food_table};

pub(crate) fn cmd_history(svc: &SugarService, json: bool) -> Result<()> {
    let history = svc.history();

    if json {
        println!("{}", serde_json::to_string_pretty(&history)?);
        return Ok(());
    }

    if history.is_empty() {
        eprintln!("No entries yet. Use `sugarwise log <food>...` to add one.");
        process::exit(2);
    }

    let limit = svc.daily_limit();
    println!("Daily limit: {limit}g\n");
    print_entry_table(&history);
    Ok(())
}

/// Find an entry by full id or by an unambiguous id prefix.
fn find_entry<'a>(svc: &'a SugarService, id: &str) -> Option<&'a SugarEntry> {
    let ledger = svc.ledger();
    if let Some(entry) = ledger.get(id) {
        return Some(entry);
    }
    let mut candidates = ledger.list().iter().filter(|e| e.id.starts_with(id));
    match (candidates.next(), candidates.next()) {
        (Some(entry), None) if !id.is_empty() => Some(entry),
        _ => None,
    }
}

pub(crate) fn cmd_show(svc: &SugarService, entry_id: &str, json: bool) -> Result<()> {
    let Some(entry) = find_entry(svc, entry_id) else {
        if json {
            println!("{}", json_error(&format!("No entry matching '{entry_id}'")));
        } else {
            eprintln!("No entry matching '{entry_id}'");
        }
        process::exit(2);
    };
    let view = svc.entry_view(entry);

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    let date = entry.date.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M");
    let id = &entry.id;
    println!("=== {date} ({id}) ===\n");
    let foods: Vec<_> = entry.foods.iter().collect();
    print_food_table(&foods);
    let total = entry.total_sugar;
    let limit = svc.daily_limit();
    let pct = view.percentage;
    let status = view.status;
    println!("\n  TOTAL: {total:.1}g of {limit}g ({pct:.0}%), {status}");
    Ok(())
}
