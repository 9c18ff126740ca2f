use clap::Parser;

/// QueryChat - chat with your database in natural language
#[derive(Parser, Debug, Clone)]
#[command(name = "querychat")]
#[command(version, long_about = None)]
#[command(about = "Natural-language-to-SQL assistant")]
pub struct Args {
    /// Path to the configuration file
    /// (defaults to ~/.config/querychat/config.toml)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Run a single request non-interactively and exit
    #[arg(short, long)]
    pub query: Option<String>,

    /// Intent label for the per-intent flow (only with --query; without
    /// it the full-schema flow is used)
    #[arg(short, long)]
    pub intent: Option<String>,

    /// User identifier forwarded to the model
    #[arg(short, long)]
    pub user: Option<String>,
}
