// Output formatting and display for CLI

use crate::config::ResolvedEcosystem;
use crate::launch::LaunchPlan;
use colored::*;
use std::collections::BTreeMap;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

/// Print an error message to stderr
pub fn print_error(error: &str) {
    eprintln!("{} {}", "✗ Error:".red().bold(), error);
}

/// Print a success message
pub fn print_success_msg(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print a formatted table of resolved apps
pub fn print_app_table(ecosystem: &ResolvedEcosystem) {
    #[derive(Tabled)]
    struct AppRow {
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Script")]
        script: String,
        #[tabled(rename = "Interpreter")]
        interpreter: String,
        #[tabled(rename = "Instances")]
        instances: String,
        #[tabled(rename = "Autorestart")]
        autorestart: String,
        #[tabled(rename = "Watch")]
        watch: String,
        #[tabled(rename = "Max Memory")]
        memory: String,
        #[tabled(rename = "Env")]
        env: String,
    }

    let rows: Vec<AppRow> = ecosystem
        .apps()
        .iter()
        .map(|app| AppRow {
            name: truncate(app.name(), 24),
            script: app.script().display().to_string(),
            interpreter: app.interpreter().display().to_string(),
            instances: app.instances().to_string(),
            autorestart: format_flag(app.autorestart()),
            watch: format_flag(app.watch()),
            memory: app
                .max_memory_restart()
                .map(|m| m.to_string())
                .unwrap_or_else(|| "-".to_string()),
            env: format_env(app.env()),
        })
        .collect();

    let mut table = Table::new(rows);
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));

    println!("\n{}\n", table);
    println!(
        "{}",
        format!(
            "Total: {} app(s), resolved for {}",
            ecosystem.apps().len(),
            ecosystem.platform()
        )
        .dimmed()
        .italic()
    );
}

/// Print the launch command of every instance
pub fn print_plans(plans: &[LaunchPlan]) {
    for plan in plans {
        println!(
            "{} {} {}",
            format!("[{}#{}]", plan.app(), plan.instance()).cyan().bold(),
            plan.command_line(),
            format!("({})", plan.mode()).dimmed()
        );
    }
}

fn format_flag(value: bool) -> String {
    if value {
        "yes".green().to_string()
    } else {
        "no".bright_black().to_string()
    }
}

fn format_env(env: &BTreeMap<String, String>) -> String {
    if env.is_empty() {
        return "-".to_string();
    }
    env.iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Truncate a string to a maximum length
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_env() {
        let mut env = BTreeMap::new();
        assert_eq!(format_env(&env), "-");
        env.insert("NODE_ENV".to_string(), "production".to_string());
        env.insert("A".to_string(), "1".to_string());
        assert_eq!(format_env(&env), "A=1\nNODE_ENV=production");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("this is a very long string", 10), "this is...");
    }
}
