use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use secrecy::SecretString;
use url::Url;

use gitbot::bot::{
    BotContext, BotState, CommandParser, CommandPrefix, EventRouter, ReportServices,
};
use gitbot::chat::showdown::{
    create_showdown_client, ShowdownConfig, DEFAULT_LOGIN_URL, DEFAULT_SERVER_URL,
};
use gitbot::config::RepositoryNames;
use gitbot::github::server::{create_app, create_bot_process, create_event_queue, ServerState};
use gitbot::github::shortener::{HttpUrlShortener, DEFAULT_SHORTENER_URL};
use gitbot::github::WebhookSecret;
use gitbot::utils::logging::init_logging;
use gitbot::utils::timing::SystemClock;

/// How long to wait before reconnecting to the chat server.
const RECONNECT_DELAY: Duration = Duration::from_secs(10);

#[derive(clap::Parser)]
struct Opts {
    /// Port of the webhook HTTP server.
    #[arg(long, env = "PORT")]
    port: u16,

    /// Secret used to authenticate webhooks.
    #[arg(long, env = "WEBHOOK_SECRET")]
    webhook_secret: String,

    /// Websocket URL of the Showdown server.
    #[arg(long, env = "SHOWDOWN_URL", default_value = DEFAULT_SERVER_URL)]
    showdown_url: Url,

    /// URL of the Showdown login server.
    #[arg(long, env = "SHOWDOWN_LOGIN_URL", default_value = DEFAULT_LOGIN_URL)]
    login_url: Url,

    /// Nickname of the bot in chat.
    #[arg(long, env = "SHOWDOWN_NICKNAME")]
    nickname: String,

    /// Password of the nickname, if it is registered.
    #[arg(long, env = "SHOWDOWN_PASSWORD")]
    password: Option<String>,

    /// Room where activity is reported.
    #[arg(long, env = "SHOWDOWN_ROOM", default_value = "development")]
    room: String,

    /// Endpoint of the URL shortener.
    #[arg(long, env = "SHORTENER_URL", default_value = DEFAULT_SHORTENER_URL)]
    shortener_url: Url,

    /// TOML file with additional repository display names.
    #[arg(long, env = "REPO_ALIASES")]
    repo_aliases: Option<PathBuf>,

    /// Character that starts a chat command.
    #[arg(long, env = "COMMAND_PREFIX", default_value_t = '.')]
    command_prefix: char,
}

fn load_repository_names(path: Option<&PathBuf>) -> anyhow::Result<RepositoryNames> {
    match path {
        Some(path) => Ok(RepositoryNames::load(path)?),
        None => Ok(RepositoryNames::default()),
    }
}

async fn server(port: u16, state: ServerState) -> anyhow::Result<()> {
    let app = create_app(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Cannot bind to {addr}"))?;
    tracing::info!("Listening for webhooks on {addr}");

    axum::serve(listener, app).await?;
    Ok(())
}

fn try_main(opts: Opts) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Cannot build tokio runtime")?;

    let services = ReportServices {
        repo_names: Arc::new(load_repository_names(opts.repo_aliases.as_ref())?),
        shortener: Arc::new(HttpUrlShortener::new(opts.shortener_url)?),
        clock: Arc::new(SystemClock),
    };

    runtime.block_on(async move {
        let chat_config = ShowdownConfig {
            server_url: opts.showdown_url,
            login_url: opts.login_url,
            nickname: opts.nickname,
            password: opts.password.map(SecretString::new),
            room: opts.room,
            reconnect_delay: RECONNECT_DELAY,
        };

        // Room messages arrive on the same queue as webhooks.
        let (event_tx, event_rx) = create_event_queue();
        let (chat, chat_process) = create_showdown_client(chat_config, event_tx.clone());

        let ctx = BotContext::new(
            CommandParser::new(CommandPrefix::new(opts.command_prefix)),
            EventRouter::new(services),
            Arc::new(chat),
        );
        let bot_process = create_bot_process(ctx, BotState::default(), event_rx);

        let state = ServerState::new(event_tx, WebhookSecret::new(opts.webhook_secret));
        let server_process = server(opts.port, state);

        tokio::select! {
            () = bot_process => {
                tracing::warn!("Bot process has ended");
                Ok(())
            },
            () = chat_process => {
                tracing::warn!("Chat connection has ended");
                Ok(())
            },
            res = server_process => {
                tracing::warn!("Server has ended: {res:?}");
                res
            }
        }
    })?;

    Ok(())
}

fn main() {
    init_logging();

    let opts = Opts::parse();
    if let Err(error) = try_main(opts) {
        eprintln!("Error: {error:?}");
        std::process::exit(1);
    }
}
