mod cli;
mod config;
mod models;
mod remote;
mod sync;
mod tasks;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use cli::{Cli, Commands};
use config::Config;
use remote::RemoteStore;
use ui::run_tui;

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = Config::from_env().with_override(cli.api_url);
    let store = RemoteStore::new(&config);
    let rt = tokio::runtime::Runtime::new()?;

    match cli.command {
        Some(Commands::List) => {
            let tasks = rt.block_on(store.list_tasks())?;
            if tasks.is_empty() {
                println!("No tasks.");
            }
            for task in tasks {
                let mark = if task.completed { "x" } else { " " };
                println!("[{}] {:>4}  {}", mark, task.id, task.description);
            }
        }
        Some(Commands::Add { text }) => {
            let text = text.trim();
            if text.is_empty() {
                println!("Nothing to add.");
                return Ok(());
            }
            rt.block_on(store.create_task(text))?;
            println!("Added \"{}\"", text);
        }
        Some(Commands::Done { id }) => {
            rt.block_on(store.set_completed(id, true))?;
            println!("Task {} marked as completed", id);
        }
        Some(Commands::Rm { id }) => {
            rt.block_on(store.delete_task(id))?;
            println!("Task {} deleted", id);
        }
        Some(Commands::Completions { shell }) => {
            use clap_complete::{generate, Shell};
            let shell = shell.to_lowercase();
            let shell_enum = match shell.as_str() {
                "bash" => Shell::Bash,
                "zsh" => Shell::Zsh,
                "fish" => Shell::Fish,
                "elvish" => Shell::Elvish,
                "powershell" => Shell::PowerShell,
                _ => {
                    println!("Unsupported shell: {}", shell);
                    return Ok(());
                }
            };
            let mut cmd = Cli::command();
            generate(shell_enum, &mut cmd, "tareas", &mut std::io::stdout());
        }
        Some(Commands::Tui) | None => {
            run_tui(&rt, store)?;
        }
    }

    Ok(())
}
