mod commands;
mod util;

use chrono_tz::Tz;
use clap::{Parser, Subcommand};
use nova_core::agents::AgentKind;
use nova_sync::SyncConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "nova_sync=info,nova_cli=info";

#[derive(Parser, Debug)]
#[command(name = "nova", version, about = "Nova CLI: talk to the health agents and view synced telemetry")]
struct Cli {
    /// Agent backend base URL
    #[arg(long, env = "NOVA_API_URL")]
    api_url: Option<String>,

    /// User ID from the user directory (see `nova users`)
    #[arg(long, env = "NOVA_USER_ID")]
    user_id: Option<String>,

    /// IANA timezone for chart labels
    #[arg(long, env = "NOVA_TIMEZONE", default_value = "UTC", value_parser = util::parse_timezone)]
    timezone: Tz,

    /// Log as JSON lines on stderr
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the user directory
    Users,
    /// Ask the greeting agent to say hello
    Greet,
    /// Log how you feel (e.g. "happy", "a bit anxious")
    Mood { text: String },
    /// Log a glucose reading in mg/dL (80-300)
    Cgm { reading: String },
    /// Log a meal by description
    Food { text: String },
    /// Generate a meal plan for today
    Mealplan,
    /// Ask a free-form question
    Ask { query: String },
    /// Print the synced dashboard
    Dashboard,
}

impl Commands {
    /// Agent and raw input for commands that write through an agent.
    fn agent_input(&self) -> Option<(AgentKind, &str)> {
        match self {
            Commands::Greet => Some((AgentKind::Greeting, "")),
            Commands::Mood { text } => Some((AgentKind::Mood, text.as_str())),
            Commands::Cgm { reading } => Some((AgentKind::Cgm, reading.as_str())),
            Commands::Food { text } => Some((AgentKind::Food, text.as_str())),
            Commands::Mealplan => Some((AgentKind::Mealplan, "")),
            Commands::Ask { query } => Some((AgentKind::Interrupt, query.as_str())),
            Commands::Users | Commands::Dashboard => None,
        }
    }
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn sync_config(cli: &Cli) -> SyncConfig {
    let config = SyncConfig::from_env().with_timezone(cli.timezone);
    match &cli.api_url {
        Some(url) if !url.trim().is_empty() => config.with_api_url(url.trim()),
        _ => config,
    }
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = sync_config(&cli);
    let code = match &cli.command {
        Commands::Users => commands::users::run(&config).await,
        command => {
            let user_id = cli.user_id.as_deref().unwrap_or_else(|| {
                util::exit_usage(
                    "user_id is required for this command",
                    Some("Set --user-id or NOVA_USER_ID; list ids with `nova users`"),
                )
            });
            match command.agent_input() {
                Some((kind, raw)) => commands::agent::run(config, user_id, kind, raw).await,
                None => commands::dashboard::run(config, user_id).await,
            }
        }
    };
    std::process::exit(code);
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn write_commands_map_to_agents() {
        let cli = Cli::try_parse_from(["nova", "--user-id", "4", "cgm", "120"]).unwrap();
        assert_eq!(cli.command.agent_input(), Some((AgentKind::Cgm, "120")));
        let cli = Cli::try_parse_from(["nova", "ask", "what is HbA1c?"]).unwrap();
        assert_eq!(cli.command.agent_input(), Some((AgentKind::Interrupt, "what is HbA1c?")));
        let cli = Cli::try_parse_from(["nova", "dashboard"]).unwrap();
        assert!(cli.command.agent_input().is_none());
    }

    #[test]
    fn timezone_flag_is_parsed() {
        let cli = Cli::try_parse_from(["nova", "--timezone", "Europe/Berlin", "users"]).unwrap();
        assert_eq!(cli.timezone, chrono_tz::Europe::Berlin);
        assert!(Cli::try_parse_from(["nova", "--timezone", "Mars/Base", "users"]).is_err());
    }

    #[test]
    fn explicit_api_url_overrides_environment() {
        let cli = Cli::try_parse_from(["nova", "--api-url", "http://backend:9000/", "users"]).unwrap();
        assert_eq!(sync_config(&cli).api_url, "http://backend:9000");
    }
}
