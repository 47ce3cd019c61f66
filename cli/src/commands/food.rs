use anyhow::Result;
use std::process;

use sugarwise_core::SugarService;
use sugarwise_core::models::NewFoodItem;

use super::helpers::{print_food_table, report_write, require_session};

pub(crate) fn cmd_food_add(
    svc: &mut SugarService,
    name: &str,
    sugar: f64,
    healthy: bool,
    json: bool,
) -> Result<()> {
    require_session(svc)?;
    let mutation = svc.add_food(NewFoodItem {
        name: name.to_string(),
        sugar_content: sugar,
        is_healthy: healthy,
    })?;
    report_write(&mutation);
    let food = mutation.value;

    if json {
        println!("{}", serde_json::to_string_pretty(&food)?);
    } else {
        let name = &food.name;
        let id = &food.id;
        println!("Added food: {name} ({sugar}g sugar, id: {id})");
    }
    Ok(())
}

pub(crate) fn cmd_food_list(
    svc: &SugarService,
    search: Option<&str>,
    healthy_only: bool,
    json: bool,
) -> Result<()> {
    let foods = svc.catalog().browse(search.unwrap_or(""), healthy_only);

    if foods.is_empty() {
        if json {
            println!("[]");
        } else {
            eprintln!("No foods found");
        }
        process::exit(2);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&foods)?);
    } else {
        print_food_table(&foods);
    }
    Ok(())
}
