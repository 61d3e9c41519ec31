use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Base URL of the task server (overrides TAREAS_API_URL)
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print all tasks
    List,
    /// Create a new task
    Add {
        #[arg(value_name = "TEXT")]
        text: String,
    },
    /// Mark a task as completed
    Done {
        #[arg(value_name = "ID")]
        id: u64,
    },
    /// Delete a task
    Rm {
        #[arg(value_name = "ID")]
        id: u64,
    },
    /// Launch the interactive task list
    Tui,
    /// Generate shell completions
    Completions {
        #[arg(value_name = "SHELL")]
        shell: String,
    },
}
