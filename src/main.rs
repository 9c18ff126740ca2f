mod cli;

use clap::Parser;
use cli::Args;
use inquire::{InquireError, Select, Text};
use nu_ansi_term::Color;
use querychat::config::{Config, ConfigError};
use querychat::executor::QueryOutcome;
use querychat::format::render_result_table;
use querychat::pipeline::{BlockingPipeline, PipelineResult, QueryPipeline};
use std::process::ExitCode;

/// Fixed user-facing message for every failure path; the underlying cause
/// only goes to the tracing output.
const APOLOGY: &str =
    "Sorry, we couldn't find what you are looking for. Please rephrase the question with more information.";

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("querychat: {e}");
            return ExitCode::FAILURE;
        }
    };

    let _guard = querychat::logging::init(&config.logging);

    let result = match args.query.clone() {
        Some(query) => run_once(&config, &args, &query),
        None => interactive(&config, &args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "pipeline failed");
            println!("{APOLOGY}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(args: &Args) -> Result<Config, ConfigError> {
    match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

fn default_user(config: &Config, args: &Args) -> String {
    args.user
        .clone()
        .or_else(|| config.users.first().cloned())
        .unwrap_or_default()
}

/// One-shot mode for scripts: blocking flavor of the pipeline
fn run_once(config: &Config, args: &Args, query: &str) -> PipelineResult<()> {
    let pipeline = BlockingPipeline::from_config(config)?;
    let user = default_user(config, args);

    let outcome = match args.intent.as_deref() {
        Some(intent) => pipeline.run_intent(intent, query, &user)?,
        None => pipeline.run_special(&format!("The mandateId is {user}, looking for {query}"))?,
    };

    present(&outcome);
    Ok(())
}

fn present(outcome: &QueryOutcome) {
    match outcome.rows() {
        Some(set) if !set.is_empty() => println!("{}", render_result_table(set)),
        _ => println!("{APOLOGY}"),
    }
}

fn select_user(config: &Config, args: &Args) -> Option<String> {
    if let Some(user) = &args.user {
        return Some(user.clone());
    }

    let prompt_result = if config.users.is_empty() {
        Text::new("USER").prompt()
    } else {
        Select::new("USER", config.users.clone()).prompt()
    };

    match prompt_result {
        Ok(user) => Some(user),
        Err(_) => None,
    }
}

/// Interactive chat loop: concurrent-capable flavor of the pipeline
fn interactive(config: &Config, args: &Args) -> PipelineResult<()> {
    println!("{}", Color::Cyan.bold().paint("QueryChat"));
    println!("Ask about your data in plain language. Type 'exit' to quit.");

    let Some(user) = select_user(config, args) else {
        return Ok(());
    };

    let runtime = tokio::runtime::Runtime::new()?;
    let pipeline = QueryPipeline::from_config(config)?;

    loop {
        let line = match Text::new("Enter your query..").prompt() {
            Ok(line) => line,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(e) => {
                tracing::warn!(error = %e, "input error");
                break;
            }
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed == "exit" || trimmed == "quit" {
            break;
        }

        let request = format!("The mandateId is {user}, looking for {trimmed}");
        match runtime.block_on(pipeline.run_special(&request)) {
            Ok(outcome) => present(&outcome),
            Err(e) => {
                tracing::warn!(error = %e, "pipeline failure");
                println!("{APOLOGY}");
            }
        }
    }

    Ok(())
}
