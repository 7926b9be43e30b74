use anyhow::{Context, Result};
use broadsheet::app::App;
use broadsheet::cache::ArticleCache;
use broadsheet::config::{Config, Paths, HOME_ENV};
use broadsheet::daemon::{
    DaemonClient, DaemonError, DaemonLauncher, DaemonServer, FetchSession, ProcessLauncher,
};
use broadsheet::error::FetchError;
use broadsheet::fetch::{FetchOptions, FetchOrchestrator};
use broadsheet::headlines::{self, Format};
use broadsheet::layout::DEFAULT_WIDTH;
use broadsheet::source::{sections, ArticleSource, FixtureSource, HttpSource};
use broadsheet::theme::ThemeVariant;
use broadsheet::ui::{self, reader, Scheduler};
use broadsheet::util::validate_article_url;
use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::path::Path;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

/// How long `serve --stop` waits for the socket to disappear.
const STOP_WAIT: Duration = Duration::from_secs(5);

#[derive(Parser, Debug)]
#[command(
    name = "broadsheet",
    version,
    about = "Terminal reader for a sectioned news site"
)]
struct Cli {
    /// Bypass the article cache, show fetch timings and log verbosely
    #[arg(long, global = true)]
    debug: bool,

    /// Disable colours
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Browse a section interactively (the default)
    Browse {
        /// Section name or alias; defaults to `default_section` from the config
        section: Option<String>,
    },
    /// Browse built-in sample content without touching the network
    Demo,
    /// Print a section's latest headlines without the interactive UI
    Headlines {
        /// Section name or alias; defaults to `default_section` from the config
        section: Option<String>,

        /// Number of headlines to show, 0 for all
        #[arg(short = 'n', long = "number", value_name = "N", default_value_t = 10)]
        limit: usize,

        /// Only headlines whose title or description fuzzily match this term
        #[arg(short, long, value_name = "TERM")]
        search: Option<String>,

        /// Print a JSON array
        #[arg(long, conflicts_with = "plain")]
        json: bool,

        /// Print `title<TAB>url` lines
        #[arg(long)]
        plain: bool,
    },
    /// Fetch one article and print it
    Read {
        url: String,

        /// Print markdown instead of laid out text
        #[arg(long)]
        raw: bool,

        /// Terminal width to lay the article out for
        #[arg(long, value_name = "N")]
        wrap: Option<usize>,
    },
    /// List section names and their aliases
    Sections,
    /// Run the background fetch daemon in the foreground
    Serve {
        /// Report whether a daemon is answering
        #[arg(long, conflicts_with = "stop")]
        status: bool,

        /// Ask a running daemon to shut down
        #[arg(long)]
        stop: bool,
    },
}

impl Command {
    fn is_interactive(&self) -> bool {
        matches!(self, Command::Browse { .. } | Command::Demo)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<FetchError>() {
                Some(fetch) if fetch.is_user_actionable() => eprintln!("broadsheet: {fetch}"),
                _ => eprintln!("broadsheet: {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let command = cli.command.unwrap_or(Command::Browse { section: None });
    let flags = Flags {
        debug: cli.debug,
        no_color: cli.no_color,
    };

    let paths = Paths::from_env()?;
    paths
        .ensure()
        .with_context(|| format!("Failed to create config directory {}", paths.root.display()))?;

    let log_file = command.is_interactive().then(|| paths.ui_log());
    let default_level = match (&command, cli.debug) {
        (_, true) => "debug",
        (Command::Serve { .. }, false) => "info",
        (_, false) if log_file.is_some() => "info",
        _ => "warn",
    };
    init_tracing(default_level, log_file.as_deref())?;

    let config = Config::load(&paths.config_file()).context("Failed to load config.toml")?;
    tracing::debug!(?config, root = %paths.root.display(), "Starting");

    match command {
        Command::Browse { section } => {
            let source = live_source(&config)?;
            let fetcher = orchestrator(&paths, source.clone(), cli.debug);
            let section = section.unwrap_or_else(|| config.default_section.clone());
            browse(&config, &flags, source, fetcher, &section).await
        }
        Command::Demo => {
            let source: Arc<dyn ArticleSource> = Arc::new(FixtureSource::new());
            let fetcher = FetchOrchestrator::new(source.clone())
                .with_options(FetchOptions { debug: cli.debug });
            browse(&config, &flags, source, fetcher, sections::DEFAULT_SECTION).await
        }
        Command::Headlines {
            section,
            limit,
            search,
            json,
            plain,
        } => {
            let section = section.unwrap_or_else(|| config.default_section.clone());
            let format = match (json, plain) {
                (true, _) => Format::Json,
                (_, true) => Format::Plain,
                _ => Format::Pretty,
            };
            let query = search.unwrap_or_default();
            print_headlines(&config, &flags, &section, &query, limit, format).await
        }
        Command::Read { url, raw, wrap } => read(&paths, &config, cli.debug, &url, raw, wrap).await,
        Command::Sections => {
            list_sections();
            Ok(())
        }
        Command::Serve { status, stop } => {
            let client = DaemonClient::new(paths.socket());
            if status {
                print_status(&client).await;
                Ok(())
            } else if stop {
                stop_daemon(&client).await
            } else {
                serve(&paths, &config).await
            }
        }
    }
}

/// The flags `browse` needs from the command line.
struct Flags {
    debug: bool,
    no_color: bool,
}

/// Logs to `log_file` when given, else stderr.
fn init_tracing(default_level: &str, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("broadsheet={default_level}")));

    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

fn live_source(config: &Config) -> Result<Arc<dyn ArticleSource>> {
    let source = HttpSource::new(config.source_options()).context("Failed to set up HTTP client")?;
    Ok(Arc::new(source))
}

/// Cache, then the daemon (started on demand), then `source`.
fn orchestrator(paths: &Paths, source: Arc<dyn ArticleSource>, debug: bool) -> FetchOrchestrator {
    let launcher: Option<Arc<dyn DaemonLauncher>> =
        match ProcessLauncher::current_exe(paths.serve_log()) {
            Ok(launcher) => Some(Arc::new(
                launcher.env(HOME_ENV, paths.root.display().to_string()),
            )),
            Err(e) => {
                tracing::warn!(error = %e, "Cannot locate own executable, daemon autostart disabled");
                None
            }
        };

    FetchOrchestrator::new(source)
        .with_cache(ArticleCache::new(paths.cache_dir()))
        .with_daemon(DaemonClient::new(paths.socket()), launcher)
        .with_options(FetchOptions { debug })
}

async fn browse(
    config: &Config,
    flags: &Flags,
    source: Arc<dyn ArticleSource>,
    fetcher: FetchOrchestrator,
    section: &str,
) -> Result<()> {
    let palette = ThemeVariant::detect(flags.no_color, Some(&config.theme)).palette();
    let mut app = App::new(palette);
    app.multi_column = config.two_column;
    app.debug = flags.debug;
    let initial = app.request_section(section);

    let (event_tx, event_rx) = mpsc::channel(32);
    let scheduler = Scheduler::new(source, Arc::new(fetcher), event_tx);
    ui::run(&mut app, scheduler, event_rx, initial).await
}

async fn read(
    paths: &Paths,
    config: &Config,
    debug: bool,
    url: &str,
    raw: bool,
    wrap: Option<usize>,
) -> Result<()> {
    validate_article_url(url).with_context(|| format!("Cannot read {url}"))?;
    let fetcher = orchestrator(paths, live_source(config)?, debug);
    let article = fetcher.fetch_article(url).await?;

    if raw {
        print!("{}", article.to_markdown());
        return Ok(());
    }

    let width = wrap.unwrap_or_else(terminal_width);
    let lines = reader::article_lines(&article, width, false, &ThemeVariant::Plain.palette());
    print!("{}", reader::lines_to_text(&lines));
    if let Some(path) = &article.debug_artifact_path {
        eprintln!("debug artifact: {path}");
    }
    Ok(())
}

async fn print_headlines(
    config: &Config,
    flags: &Flags,
    section: &str,
    query: &str,
    limit: usize,
    format: Format,
) -> Result<()> {
    let section = section.trim().to_ascii_lowercase();
    let listing = live_source(config)?.section(&section).await?;
    let items = headlines::select(&listing.items, query, limit);
    tracing::debug!(section = %section, total = listing.items.len(), shown = items.len(), "Headlines");

    match format {
        Format::Json => {
            let json = headlines::to_json(&items, &section).context("Failed to encode headlines")?;
            println!("{json}");
        }
        Format::Plain => print!("{}", headlines::to_plain(&items)),
        Format::Pretty => {
            let styled = std::io::stdout().is_terminal()
                && ThemeVariant::detect(flags.no_color, Some(&config.theme)) != ThemeVariant::Plain;
            let heading = headlines::heading(&listing.title, &section, query);
            print!(
                "{}",
                headlines::to_pretty(&items, &heading, terminal_width(), styled)
            );
        }
    }
    Ok(())
}

fn terminal_width() -> usize {
    crossterm::terminal::size()
        .map(|(w, _)| w as usize)
        .unwrap_or(DEFAULT_WIDTH)
}

fn list_sections() {
    for info in sections::section_list() {
        let others: Vec<&str> = info
            .aliases
            .iter()
            .copied()
            .filter(|alias| *alias != info.name && *alias != info.path)
            .collect();
        if others.is_empty() {
            println!("{:<18} {}", info.name, info.path);
        } else {
            println!("{:<18} {} (also: {})", info.name, info.path, others.join(", "));
        }
    }
}

async fn print_status(client: &DaemonClient) {
    match client.health().await {
        Ok(rtt) => println!(
            "running on {} (health round trip {} ms)",
            client.socket_path().display(),
            rtt.as_millis()
        ),
        Err(e) => {
            tracing::debug!(error = %e, "Health check failed");
            println!("not running");
        }
    }
}

async fn stop_daemon(client: &DaemonClient) -> Result<()> {
    match client.stop(STOP_WAIT).await {
        Ok(true) => {
            println!("stopped");
            Ok(())
        }
        Ok(false) => anyhow::bail!(
            "daemon acknowledged shutdown but {} is still present after {}s",
            client.socket_path().display(),
            STOP_WAIT.as_secs()
        ),
        Err(DaemonError::NotRunning | DaemonError::Timeout) => {
            println!("not running");
            Ok(())
        }
        Err(e) => Err(e).context("Failed to stop the fetch daemon"),
    }
}

async fn serve(paths: &Paths, config: &Config) -> Result<()> {
    let session = FetchSession::new(live_source(config)?, paths.debug_dir());
    let server = DaemonServer::bind(&paths.socket(), session)
        .await
        .context("Failed to start the fetch daemon")?;

    let shutdown = server.shutdown_handle();
    tokio::spawn(async move {
        wait_for_signal().await;
        shutdown.notify_one();
    });

    server.run().await?;
    Ok(())
}

async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => tracing::info!("Received SIGTERM"),
                    _ = tokio::signal::ctrl_c() => tracing::info!("Received SIGINT"),
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Cannot listen for SIGTERM");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
