use anyhow::{Context, Result, bail};
use serde::Serialize;
use std::io::{self, BufRead, Write};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use sugarwise_core::models::{FoodItem, MealPlan};
use sugarwise_core::service::EntryView;
use sugarwise_core::{Mutation, SugarService, WriteOutcome};

/// Split a `--custom` argument of the form `NAME=GRAMS` into an inline food.
pub(crate) fn parse_custom_food(s: &str) -> Result<FoodItem> {
    let Some((name, grams)) = s.rsplit_once('=') else {
        bail!("Invalid custom food '{s}'. Use NAME=GRAMS (e.g. 'Granola bar=12')");
    };
    Ok(FoodItem::inline(name, grams)?)
}

pub(crate) fn prompt_choice(count: usize) -> Result<usize> {
    eprint!("\nSelect a food (1-{count}): ");
    io::stderr().flush()?;
    let stdin = io::stdin();
    let line = stdin.lock().lines().next().context("No input")??;
    let n: usize = line.trim().parse().context("Invalid number")?;
    if n < 1 || n > count {
        bail!("Selection out of range");
    }
    Ok(n - 1)
}

/// Ask a yes/no question on stderr. An empty answer or closed stdin gives
/// `default`.
pub(crate) fn confirm(question: &str, default: bool) -> Result<bool> {
    let hint = if default { "[Y/n]" } else { "[y/N]" };
    eprint!("{question} {hint}: ");
    io::stderr().flush()?;
    let stdin = io::stdin();
    let Some(line) = stdin.lock().lines().next() else {
        return Ok(default);
    };
    Ok(parse_answer(&line?, default))
}

fn parse_answer(answer: &str, default: bool) -> bool {
    match answer.trim().to_lowercase().as_str() {
        "y" | "yes" => true,
        "n" | "no" => false,
        _ => default,
    }
}

/// Fail unless someone is signed in.
pub(crate) fn require_session(svc: &SugarService) -> Result<()> {
    svc.session().require_user()?;
    Ok(())
}

/// Tell the user when a change only made it into memory.
pub(crate) fn report_write<T>(mutation: &Mutation<T>) {
    if let WriteOutcome::Failed { key, message } = &mutation.write {
        eprintln!("Warning: could not save {key} ({message}). The change will be lost on exit.");
    }
}

pub(crate) fn print_food_table(foods: &[&FoodItem]) {
    #[derive(Tabled)]
    struct FoodRow {
        #[tabled(rename = "#")]
        idx: usize,
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Sugar (g)")]
        sugar: String,
        #[tabled(rename = "Healthy")]
        healthy: &'static str,
    }

    let rows: Vec<FoodRow> = foods
        .iter()
        .enumerate()
        .map(|(i, f)| FoodRow {
            idx: i + 1,
            id: truncate(&f.id, 10),
            name: truncate(&f.name, 35),
            sugar: format!("{:.1}", f.sugar_content),
            healthy: if f.is_healthy { "yes" } else { "" },
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..4)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn print_entry_table(entries: &[EntryView]) {
    #[derive(Tabled)]
    struct EntryRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Foods")]
        foods: String,
        #[tabled(rename = "Sugar (g)")]
        sugar: String,
        #[tabled(rename = "%")]
        percentage: String,
        #[tabled(rename = "Status")]
        status: String,
    }

    let rows: Vec<EntryRow> = entries
        .iter()
        .map(|v| EntryRow {
            id: short_id(&v.entry.id).to_string(),
            date: v
                .entry
                .date
                .with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M")
                .to_string(),
            foods: truncate(&food_names(&v.entry.foods), 40),
            sugar: format!("{:.1}", v.entry.total_sugar),
            percentage: format!("{:.0}", v.percentage),
            status: v.status.to_string(),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..5)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn print_plan_table(plans: &[MealPlan]) {
    #[derive(Tabled)]
    struct PlanRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Foods")]
        foods: String,
        #[tabled(rename = "Sugar (g)")]
        sugar: String,
        #[tabled(rename = "Saved")]
        saved: String,
    }

    let rows: Vec<PlanRow> = plans
        .iter()
        .map(|p| PlanRow {
            id: short_id(&p.id).to_string(),
            name: truncate(&p.name, 25),
            foods: truncate(&food_names(&p.foods), 40),
            sugar: format!("{:.1}", p.total_sugar),
            saved: p.date.with_timezone(&chrono::Local).format("%Y-%m-%d").to_string(),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..4)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn food_names(foods: &[FoodItem]) -> String {
    foods
        .iter()
        .map(|f| f.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// First block of a UUID, enough to tell entries apart on screen.
pub(crate) fn short_id(id: &str) -> &str {
    id.split('-').next().unwrap_or(id)
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}
