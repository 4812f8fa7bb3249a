//! CLI module for Mentor
//!
//! Provides command-line interface parsing for the mentor-server binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod output;

use clap::{Parser, Subcommand};

/// Mentor - professional development agent server
///
/// Routes employee questions about skills, training history, budget and
/// company policy to specialised LLM agents.
#[derive(Parser, Debug)]
#[command(
    name = "mentor-server",
    version,
    about = "Mentor - professional development agent server",
    long_about = "Routes employee questions about skills development, training history, remaining\n\
                  training budget and company policy to specialised LLM agents backed by\n\
                  BigQuery, Vertex AI Search and web search.\n\n\
                  Configuration is read from the environment (and a .env file).",
    after_help = "EXAMPLES:\n    \
                  mentor-server                     # Start the server\n    \
                  mentor-server serve --port 9000   # Start on another port\n    \
                  mentor-server agents list         # List declared agents\n    \
                  mentor-server config --validate   # Check the environment"
)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute (defaults to `serve`)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        /// Host address to bind (overrides HOST)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind (overrides PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show configuration information
    Config {
        /// Only validate, print nothing on success
        #[arg(long)]
        validate: bool,
    },

    /// Inspect agents
    #[command(subcommand)]
    Agents(AgentCommands),
}

/// Agent inspection subcommands
#[derive(Subcommand, Debug)]
pub enum AgentCommands {
    /// List all declared agents
    List,

    /// Show details for a specific agent
    Show {
        /// Name of the agent
        name: String,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
