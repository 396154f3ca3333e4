use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use ticketboard::commands::{
    CreateOptions, EditOptions, OutputOptions, cmd_board, cmd_config_set_token,
    cmd_config_set_url, cmd_config_show, cmd_create, cmd_delete, cmd_edit, cmd_history,
    cmd_login, cmd_logout, cmd_move, cmd_progress, cmd_users,
};
use ticketboard::types::{
    ProjectId, TicketId, TicketPriority, TicketStatus, UserId, VALID_PRIORITIES, VALID_STATUSES,
};

#[derive(Parser)]
#[command(name = "ticketboard")]
#[command(about = "Kanban board client for the ticket API")]
#[command(version)]
struct Cli {
    /// Log filter, e.g. `debug` or `ticketboard=trace`
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// API base URL (overrides config and TICKETBOARD_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a project's board
    #[command(visible_alias = "b")]
    Board {
        /// Project ID
        project: ProjectId,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show per-column counts and completion
    Progress {
        /// Project ID
        project: ProjectId,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Move a ticket to another column
    #[command(visible_alias = "mv")]
    Move {
        /// Project ID
        project: ProjectId,

        /// Ticket ID (`12` or `#12`)
        ticket: TicketId,

        /// Target column (To Do, In Progress, Done)
        #[arg(value_parser = parse_status)]
        column: TicketStatus,
    },

    /// Create a ticket in the first column
    #[command(visible_alias = "c")]
    Create {
        /// Project ID
        project: ProjectId,

        /// Ticket title
        title: String,

        /// Description text
        #[arg(short, long)]
        description: Option<String>,

        /// Priority: Low, Medium, High (default: Medium)
        #[arg(short, long, default_value = "Medium", value_parser = parse_priority)]
        priority: TicketPriority,

        /// Assignee user ID
        #[arg(short, long)]
        assignee: Option<UserId>,
    },

    /// Change a ticket's fields
    Edit {
        /// Project ID
        project: ProjectId,

        /// Ticket ID
        ticket: TicketId,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// New description
        #[arg(short, long)]
        description: Option<String>,

        /// New priority
        #[arg(short, long, value_parser = parse_priority)]
        priority: Option<TicketPriority>,

        /// Assign to a user ID
        #[arg(short, long, conflicts_with = "unassign")]
        assignee: Option<UserId>,

        /// Remove the assignee
        #[arg(long)]
        unassign: bool,
    },

    /// Delete a ticket
    #[command(visible_alias = "rm")]
    Delete {
        /// Project ID
        project: ProjectId,

        /// Ticket ID
        ticket: TicketId,
    },

    /// Show a ticket's change log
    History {
        /// Ticket ID
        ticket: TicketId,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List a project's users
    Users {
        /// Project ID
        project: ProjectId,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Sign in and store the session token
    Login {
        /// Account email
        email: String,

        /// Password (read from stdin when omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// Forget the stored session token
    Logout,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Set the API base URL
    SetUrl {
        /// http(s) URL, without the `/api` suffix
        url: String,
    },

    /// Store the bearer token
    SetToken {
        /// Token value
        token: String,
    },
}

fn parse_priority(s: &str) -> Result<TicketPriority, String> {
    s.parse().map_err(|_| {
        format!(
            "Invalid priority. Must be one of: {}",
            VALID_PRIORITIES.join(", ")
        )
    })
}

fn parse_status(s: &str) -> Result<TicketStatus, String> {
    s.parse().map_err(|_| {
        format!(
            "Invalid column. Must be one of: {}",
            VALID_STATUSES.join(", ")
        )
    })
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let api_url = cli.api_url.as_deref();

    let result = match cli.command {
        Commands::Board { project, json } => {
            cmd_board(api_url, project, OutputOptions { json }).await
        }
        Commands::Progress { project, json } => {
            cmd_progress(api_url, project, OutputOptions { json }).await
        }
        Commands::Move {
            project,
            ticket,
            column,
        } => cmd_move(api_url, project, ticket, column).await,
        Commands::Create {
            project,
            title,
            description,
            priority,
            assignee,
        } => {
            cmd_create(
                api_url,
                CreateOptions {
                    project,
                    title,
                    description,
                    priority,
                    assignee,
                },
            )
            .await
        }
        Commands::Edit {
            project,
            ticket,
            title,
            description,
            priority,
            assignee,
            unassign,
        } => {
            cmd_edit(
                api_url,
                project,
                ticket,
                EditOptions {
                    title,
                    description,
                    priority,
                    assignee,
                    unassign,
                },
            )
            .await
        }
        Commands::Delete { project, ticket } => cmd_delete(api_url, project, ticket).await,
        Commands::History { ticket, json } => {
            cmd_history(api_url, ticket, OutputOptions { json }).await
        }
        Commands::Users { project, json } => {
            cmd_users(api_url, project, OutputOptions { json }).await
        }
        Commands::Login { email, password } => cmd_login(api_url, &email, password).await,
        Commands::Logout => cmd_logout(),
        Commands::Config { action } => match action {
            ConfigAction::Show { json } => cmd_config_show(OutputOptions { json }),
            ConfigAction::SetUrl { url } => cmd_config_set_url(&url),
            ConfigAction::SetToken { token } => cmd_config_set_token(&token),
        },
    };

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
