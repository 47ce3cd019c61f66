use anyhow::Result;
use std::process;

use sugarwise_core::SugarService;

use super::helpers::{json_error, report_write};

pub(crate) fn cmd_login(svc: &mut SugarService, email: &str, password: &str, json: bool) -> Result<()> {
    let mutation = svc.login(email, password)?;
    report_write(&mutation);
    let user = mutation.value;

    if json {
        println!("{}", serde_json::to_string_pretty(&user)?);
    } else {
        let username = &user.username;
        println!("Logged in as {username}");
    }
    Ok(())
}

pub(crate) fn cmd_register(
    svc: &mut SugarService,
    username: &str,
    email: &str,
    password: &str,
    json: bool,
) -> Result<()> {
    let mutation = svc.register(username, email, password)?;
    report_write(&mutation);
    let user = mutation.value;

    if json {
        println!("{}", serde_json::to_string_pretty(&user)?);
    } else {
        let username = &user.username;
        let email = &user.email;
        println!("Registered {username} <{email}>");
    }
    Ok(())
}

pub(crate) fn cmd_logout(svc: &mut SugarService, json: bool) -> Result<()> {
    let mutation = svc.logout();
    report_write(&mutation);
    let previous = mutation.value;

    if json {
        println!("{}", serde_json::json!({ "loggedOut": previous.is_some() }));
    } else if let Some(user) = previous {
        let username = &user.username;
        println!("Logged out {username}");
    } else {
        eprintln!("Not logged in");
    }
    Ok(())
}

pub(crate) fn cmd_whoami(svc: &SugarService, json: bool) -> Result<()> {
    let Some(user) = svc.session().current_user() else {
        if json {
            println!("{}", json_error("Not logged in"));
        } else {
            eprintln!("Not logged in");
        }
        process::exit(2);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(user)?);
    } else {
        let username = &user.username;
        let email = &user.email;
        println!("{username} <{email}>");
    }
    Ok(())
}
