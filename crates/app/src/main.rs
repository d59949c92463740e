use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use services::{AppServices, Clock, PracticeConfig};
use storage::catalog::InMemoryCatalog;
use storage::repository::ContentCatalog;
use tracing_subscriber::EnvFilter;

mod commands;

const DEMO_CATALOG: &str = include_str!("../assets/demo_catalog.json");

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingFlag { flag: &'static str },
    UnknownArg(String),
    InvalidNumber { flag: &'static str, raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingFlag { flag } => write!(f, "{flag} is required for this command"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_number<T: std::str::FromStr>(value: String, flag: &'static str) -> Result<T, ArgsError> {
    value
        .trim()
        .parse()
        .map_err(|_| ArgsError::InvalidNumber { flag, raw: value })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  practice [status]    [--db <sqlite_url>]");
    eprintln!("  practice topics      [--catalog <path>]");
    eprintln!("  practice signin      --name <name> --email <email>");
    eprintln!("  practice onboarding");
    eprintln!("  practice quiz        --topic <id> [--seconds-per-question <n>] [--tick-ms <ms>] [--shuffle]");
    eprintln!("  practice flashcards  --topic <id>");
    eprintln!("  practice logout");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://practice.sqlite3");
    eprintln!("  --catalog <built-in demo catalog>");
    eprintln!("  --seconds-per-question 90, --tick-ms 1000");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  PRACTICE_DB_URL, PRACTICE_CATALOG, PRACTICE_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Status,
    Topics,
    SignIn,
    Onboarding,
    Quiz,
    Flashcards,
    Logout,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "status" => Some(Self::Status),
            "topics" => Some(Self::Topics),
            "signin" => Some(Self::SignIn),
            "onboarding" => Some(Self::Onboarding),
            "quiz" => Some(Self::Quiz),
            "flashcards" => Some(Self::Flashcards),
            "logout" => Some(Self::Logout),
            _ => None,
        }
    }
}

struct Args {
    db_url: String,
    catalog: Option<PathBuf>,
    topic: Option<String>,
    name: Option<String>,
    email: Option<String>,
    seconds_per_question: Option<u32>,
    tick_ms: Option<u64>,
    shuffle: bool,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self {
            db_url: std::env::var("PRACTICE_DB_URL")
                .ok()
                .map_or_else(|| "sqlite://practice.sqlite3".into(), normalize_sqlite_url),
            catalog: std::env::var_os("PRACTICE_CATALOG").map(PathBuf::from),
            topic: None,
            name: None,
            email: None,
            seconds_per_question: None,
            tick_ms: None,
            shuffle: false,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    parsed.db_url = normalize_sqlite_url(value);
                }
                "--catalog" => {
                    parsed.catalog = Some(PathBuf::from(require_value(args, "--catalog")?));
                }
                "--topic" => parsed.topic = Some(require_value(args, "--topic")?),
                "--name" => parsed.name = Some(require_value(args, "--name")?),
                "--email" => parsed.email = Some(require_value(args, "--email")?),
                "--seconds-per-question" => {
                    let value = require_value(args, "--seconds-per-question")?;
                    parsed.seconds_per_question =
                        Some(parse_number(value, "--seconds-per-question")?);
                }
                "--tick-ms" => {
                    let value = require_value(args, "--tick-ms")?;
                    parsed.tick_ms = Some(parse_number(value, "--tick-ms")?);
                }
                "--shuffle" => parsed.shuffle = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(parsed)
    }

    fn practice_config(&self) -> PracticeConfig {
        let mut config = PracticeConfig::default().with_shuffle_questions(self.shuffle);
        if let Some(seconds) = self.seconds_per_question {
            config = config.with_seconds_per_question(seconds);
        }
        if let Some(ms) = self.tick_ms {
            config = config.with_tick_period(Duration::from_millis(ms));
        }
        config
    }

    fn required_topic(&self) -> Result<&str, ArgsError> {
        self.topic
            .as_deref()
            .ok_or(ArgsError::MissingFlag { flag: "--topic" })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn load_catalog(path: Option<&PathBuf>) -> Result<InMemoryCatalog, Box<dyn std::error::Error>> {
    let catalog = match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)?;
            InMemoryCatalog::from_json(&json)?
        }
        None => InMemoryCatalog::from_json(DEMO_CATALOG)?,
    };
    Ok(catalog)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("PRACTICE_LOG")
        .unwrap_or_else(|_| EnvFilter::new("warn,services=info,storage=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Default behavior: show status when no subcommand is provided.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Status,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Status,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let parsed = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let catalog: Arc<dyn ContentCatalog> = Arc::new(load_catalog(parsed.catalog.as_ref())?);
    dispatch(cmd, &parsed, catalog).await
}

async fn dispatch(
    cmd: Command,
    parsed: &Args,
    catalog: Arc<dyn ContentCatalog>,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        // Listing topics only needs the catalog, so no database is opened.
        Command::Topics => commands::topics(catalog.as_ref()).await,
        Command::Status => commands::status(&open_services(parsed, catalog).await?),
        Command::SignIn => {
            let name = parsed.name.as_deref().ok_or(ArgsError::MissingFlag { flag: "--name" })?;
            let email = parsed
                .email
                .as_deref()
                .ok_or(ArgsError::MissingFlag { flag: "--email" })?;
            let app = open_services(parsed, catalog).await?;
            commands::sign_in(&app, name, email).await
        }
        Command::Onboarding => {
            let app = open_services(parsed, catalog).await?;
            commands::onboarding(&app).await
        }
        Command::Quiz => {
            let topic = parsed.required_topic()?;
            commands::quiz(&open_services(parsed, catalog).await?, topic).await
        }
        Command::Flashcards => {
            let topic = parsed.required_topic()?;
            commands::flashcards(&open_services(parsed, catalog).await?, topic).await
        }
        Command::Logout => {
            open_services(parsed, catalog)
                .await?
                .progress()
                .reset_session()
                .await?;
            println!("Signed out. Progress has been reset.");
            Ok(())
        }
    }
}

/// Open and migrate `SQLite` and wire the services over it. Kept in the binary
/// glue so core and services stay free of filesystem setup.
async fn open_services(
    parsed: &Args,
    catalog: Arc<dyn ContentCatalog>,
) -> Result<AppServices, Box<dyn std::error::Error>> {
    prepare_sqlite_file(&parsed.db_url)?;
    let app = AppServices::new_sqlite(
        &parsed.db_url,
        Clock::system(),
        catalog,
        parsed.practice_config(),
    )
    .await?;
    Ok(app)
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, ArgsError> {
        let mut iter = args.iter().map(ToString::to_string);
        Args::parse(&mut iter)
    }

    #[test]
    fn sqlite_urls_become_absolute() {
        assert_eq!(normalize_sqlite_url("sqlite::memory:".into()), "sqlite::memory:");
        assert_eq!(normalize_sqlite_url("sqlite:///tmp/p.db".into()), "sqlite:///tmp/p.db");
        assert_eq!(normalize_sqlite_url("sqlite:/tmp/p.db".into()), "sqlite:///tmp/p.db");
        assert!(normalize_sqlite_url("p.db".into()).starts_with("sqlite:///"));
    }

    #[test]
    fn quiz_flags_feed_the_practice_config() {
        let args = parse(&[
            "--topic",
            "bio-cell",
            "--seconds-per-question",
            "30",
            "--tick-ms",
            "250",
        ])
        .unwrap();
        assert_eq!(args.required_topic().unwrap(), "bio-cell");
        let config = args.practice_config();
        assert_eq!(config.budget_for(4), 120);
        assert_eq!(config.tick_period(), Duration::from_millis(250));
    }

    #[test]
    fn bad_flags_are_reported() {
        assert!(matches!(
            parse(&["--tick-ms", "soon"]),
            Err(ArgsError::InvalidNumber { flag: "--tick-ms", .. })
        ));
        assert!(matches!(
            parse(&["--topic"]),
            Err(ArgsError::MissingValue { flag: "--topic" })
        ));
        assert!(matches!(parse(&["--verbose"]), Err(ArgsError::UnknownArg(_))));
        assert!(matches!(
            parse(&[]).unwrap().required_topic(),
            Err(ArgsError::MissingFlag { flag: "--topic" })
        ));
    }

    #[test]
    fn demo_catalog_parses() {
        let catalog = load_catalog(None).unwrap();
        assert_eq!(catalog.document().topics.len(), 3);
    }

    #[tokio::test]
    async fn topics_never_open_the_database() {
        let mut args = parse(&[]).unwrap();
        args.db_url = "sqlite://".into();
        let catalog: Arc<dyn ContentCatalog> = Arc::new(load_catalog(None).unwrap());

        dispatch(Command::Topics, &args, Arc::clone(&catalog))
            .await
            .unwrap();
        assert!(dispatch(Command::Status, &args, catalog).await.is_err());
    }
}
