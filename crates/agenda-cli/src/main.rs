use clap::Parser;
use owo_colors::{OwoColorize, Style};

use agenda_core::db;
use agenda_core::error::CoreError;
use agenda_core::repository::SqliteRepository;

mod cli;
mod commands;
mod config;
mod util;
mod views;

#[tokio::main]
async fn main() {
    let config = config::Config::new().unwrap_or_default();

    let pool = match db::establish_connection(&config.database_path).await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    };
    let repository = SqliteRepository::new(pool);

    let cli = cli::Cli::parse();

    let result = match cli.command {
        cli::Commands::Add(command) => commands::add::add_item(&repository, command).await,
        cli::Commands::Agenda(command) => {
            commands::agenda::show_agenda(&repository, command, &config).await
        }
        cli::Commands::Done(command) => commands::done::toggle_done(&repository, command).await,
        cli::Commands::Edit(command) => commands::edit::edit_item(&repository, command).await,
        cli::Commands::Delete(command) => {
            commands::delete::delete_item(&repository, command).await
        }
    };

    if let Err(e) = result {
        handle_error(e);
        std::process::exit(1);
    }
}

fn handle_error(err: anyhow::Error) {
    let error_style = Style::new().red().bold();

    if let Some(core_error) = err.downcast_ref::<CoreError>() {
        match core_error {
            CoreError::NotFound(s) => {
                eprintln!("{} {}", "Error:".style(error_style), s);
            }
            CoreError::InvalidInput(s) => {
                eprintln!("{} Invalid input: {}", "Error:".style(error_style), s);
            }
            CoreError::InvalidRecurrence(s) => {
                eprintln!(
                    "{} Invalid recurrence: {}",
                    "Error:".style(error_style),
                    s.yellow()
                );
            }
            _ => eprintln!("{} {}", "Error:".style(error_style), err),
        }
    } else {
        eprintln!("{} {}", "Error:".style(error_style), err);
    }
}
