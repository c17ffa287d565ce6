//! Dry-run command line for the task parser.
//!
//! # Responsibility
//! - Route one utterance, classify add requests, and print the result as JSON.
//! - Never write to storage: this is a dry run of the intake pipeline.

use chrono::{Local, NaiveDateTime};
use clap::Parser;
use log::error;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::process::ExitCode;
use taskmind_core::{
    classify, extract_task_references, load_config, route_intent, Intent, RoleContext,
};

const NOW_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Parser)]
#[command(name = "taskmind_cli")]
#[command(about = "Parse a free-text task and print the draft as JSON", long_about = None)]
struct Cli {
    /// Text to route and classify
    text: String,

    /// Reference time as "YYYY-MM-DD HH:MM" (defaults to local now)
    #[arg(long)]
    now: Option<String>,

    /// Config file providing profile defaults and custom projects
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let now = match cli.now.as_deref() {
        Some(raw) => match NaiveDateTime::parse_from_str(raw.trim(), NOW_FORMAT) {
            Ok(now) => now,
            Err(err) => {
                eprintln!("invalid --now `{raw}` (expected {NOW_FORMAT}): {err}");
                return ExitCode::from(2);
            }
        },
        None => Local::now().naive_local(),
    };

    let role_context = match cli.config.as_deref().map(load_config) {
        Some(Ok(config)) => {
            if let Err(err) = taskmind_core::init_from_config(&config.logging) {
                eprintln!("logging disabled: {err}");
            }
            config.profile.role_context()
        }
        Some(Err(err)) => {
            error!("event=cli_config module=cli status=error error={err}");
            eprintln!("cannot load config: {err}");
            return ExitCode::from(2);
        }
        None => RoleContext::default(),
    };

    let output = render(&cli.text, now, &role_context);

    match serde_json::to_string_pretty(&output) {
        Ok(rendered) => {
            println!("{rendered}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("cannot render output: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Routed intent plus, for add requests only, the classified draft.
fn render(text: &str, now: NaiveDateTime, role_context: &RoleContext) -> Value {
    let intent = route_intent(text);
    match intent {
        Intent::Add => match classify(text, now, role_context) {
            Ok(draft) => json!({
                "intent": intent.as_str(),
                "priority": draft.priority().value(),
                "draft": draft,
            }),
            Err(err) => json!({
                "intent": intent.as_str(),
                "error": err.to_string(),
                "message": err.user_message(),
            }),
        },
        Intent::Delete | Intent::Complete | Intent::Update => json!({
            "intent": intent.as_str(),
            "references": extract_task_references(text),
        }),
        Intent::Chat => json!({ "intent": intent.as_str() }),
    }
}

#[cfg(test)]
mod tests {
    use super::render;
    use chrono::NaiveDate;
    use serde_json::json;
    use taskmind_core::RoleContext;

    fn now() -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    #[test]
    fn chat_prints_only_the_intent() {
        let output = render("明天天气怎么样", now(), &RoleContext::default());
        assert_eq!(output, json!({ "intent": "chat" }));
    }

    #[test]
    fn add_prints_draft_with_priority() {
        let output = render("添加任务：明天上午9点开会，很重要", now(), &RoleContext::default());
        assert_eq!(output["intent"], "add");
        assert_eq!(output["priority"], 1);
        assert_eq!(output["draft"]["due_date"], "2024-01-02");
    }
}
