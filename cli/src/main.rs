use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use asistente_cli::backend::HttpBackend;
use asistente_cli::commands::event::EventArgs;
use asistente_cli::commands::session::SessionCommands;
use asistente_cli::commands::{auth, chat, email, event, send, session};
use asistente_cli::config::{Config, DEFAULT_API_URL};
use asistente_cli::controller::Controller;
use asistente_cli::session::SessionManager;
use asistente_cli::store::{AUTH_COOKIE_KEY, FileStore, KeyValueStore};
use asistente_cli::util::exit_error;
use asistente_cli::view::{NullView, TerminalView, View};
use asistente_core::payload::{DEFAULT_TIMEZONE, EmailForm};
use asistente_core::session::DEFAULT_NAMESPACE;

#[derive(Parser)]
#[command(
    name = "asistente",
    version,
    about = "Terminal client for the asistente agent: chat, send email, create calendar events"
)]
struct Cli {
    /// Backend base URL
    #[arg(long, env = "ASISTENTE_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// State file holding the session id and auth cookie
    #[arg(long, env = "ASISTENTE_STATE_FILE")]
    state_file: Option<PathBuf>,

    /// Timezone label sent with calendar events (IANA name)
    #[arg(long, env = "ASISTENTE_TIMEZONE", default_value = DEFAULT_TIMEZONE)]
    timezone: String,

    /// Namespace prefix of generated session ids
    #[arg(long, env = "ASISTENTE_SESSION_PREFIX", default_value = DEFAULT_NAMESPACE)]
    session_prefix: String,

    /// Emit logs as JSON lines on stderr
    #[arg(long, env = "ASISTENTE_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive conversation (default)
    Chat,
    /// Send one message and print the agent's reply
    Send {
        /// Message text
        text: String,
    },
    /// Send an email through the backend (requires a stored auth cookie)
    Email {
        #[arg(long)]
        to: String,
        #[arg(long)]
        subject: String,
        #[arg(long)]
        body: String,
    },
    /// Create a calendar event (requires a stored auth cookie)
    Event {
        #[arg(long)]
        summary: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Local start time, YYYY-MM-DDTHH:MM (defaults to now)
        #[arg(long)]
        start: Option<String>,
        /// Local end time, YYYY-MM-DDTHH:MM (defaults to now + 1h)
        #[arg(long)]
        end: Option<String>,
    },
    /// Session id operations
    Session {
        #[command(subcommand)]
        command: SessionCommands,
    },
    /// Open Google sign-in, or store the session cookie obtained from it
    Login {
        /// Cookie set by the backend after sign-in, as name=value
        #[arg(long)]
        cookie: Option<String>,
    },
    /// Forget the stored auth cookie
    Logout,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "asistente_cli=warn".into());
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn build_controller(config: &Config, view: Arc<dyn View>) -> Controller<HttpBackend> {
    let store = FileStore::open(&config.state_file);
    let cookie = store.get(AUTH_COOKIE_KEY);
    let backend = HttpBackend::new(config, cookie.as_deref())
        .unwrap_or_else(|e| exit_error(&format!("failed to build HTTP client: {e}"), None));
    let sessions = SessionManager::new(Box::new(store), config.session_prefix.clone());
    Controller::new(backend, sessions, view, config.timezone.clone()).unwrap_or_else(|e| {
        exit_error(
            &e.to_string(),
            Some("Check ASISTENTE_STATE_FILE points to a writable location."),
        )
    })
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = Config::new(
        &cli.api_url,
        &cli.timezone,
        &cli.session_prefix,
        cli.state_file,
    )
    .unwrap_or_else(|e| exit_error(&e.to_string(), None));
    tracing::debug!(api_url = %config.api_base(), state_file = %config.state_file.display(), "config loaded");

    let code = match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            let view = Arc::new(TerminalView { echo_user: false });
            let controller = Arc::new(build_controller(&config, view));
            chat::run(controller, &config).await
        }
        Commands::Send { text } => {
            let controller = build_controller(&config, Arc::new(NullView));
            send::run(&controller, &text).await
        }
        Commands::Email { to, subject, body } => {
            let controller = build_controller(&config, Arc::new(NullView));
            email::run(&controller, EmailForm { to, subject, body }).await
        }
        Commands::Event {
            summary,
            description,
            start,
            end,
        } => {
            let controller = build_controller(&config, Arc::new(NullView));
            event::run(
                &controller,
                EventArgs {
                    summary,
                    description,
                    start,
                    end,
                },
            )
            .await
        }
        Commands::Session { command } => session::run(&config, command),
        Commands::Login { cookie } => auth::login(&config, cookie.as_deref()),
        Commands::Logout => auth::logout(&config),
    };

    std::process::exit(code);
}
