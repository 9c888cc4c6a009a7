//! `orgdir`: terminal UI for the organisation directory.
//!
//! # Usage
//!
//! ```text
//! orgdir --config ~/.config/orgdir/config.toml
//! orgdir --departments-url https://crm/rest/department.get \
//!        --users-url https://crm/rest/user.get \
//!        --enrichment-url https://hr/users
//! orgdir search петров
//! orgdir refresh
//! ```

mod app;
mod rows;
mod ui;

use std::{
  io,
  num::NonZeroUsize,
  path::{Path, PathBuf},
  sync::{Arc, Mutex},
  time::Duration,
};

use anyhow::{Context, Result, anyhow, bail};
use app::App;
use clap::{Parser, Subcommand};
use crossterm::{
  event::{self, Event},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use orgdir_cache_sqlite::SqliteCache;
use orgdir_core::{
  cache::{CacheStore, MemoryCache},
  search,
};
use orgdir_crm::{CrmClient, CrmConfig};
use orgdir_directory::{
  Directory, DirectoryLoader, LoadState, Snapshot, SnapshotLoader, debounce::DEFAULT_DELAY,
  loader::DEFAULT_PAGE_SIZE,
};
use ratatui::{Terminal, backend::CrosstermBackend};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "orgdir", about = "Browse and search the organisation directory")]
struct Args {
  /// Path to a TOML config file.
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Paginated department catalog endpoint.
  #[arg(long, env = "ORGDIR_DEPARTMENTS_URL")]
  departments_url: Option<String>,

  /// Paginated user catalog endpoint.
  #[arg(long, env = "ORGDIR_USERS_URL")]
  users_url: Option<String>,

  /// Enrichment endpoint returning every record at once.
  #[arg(long, env = "ORGDIR_ENRICHMENT_URL")]
  enrichment_url: Option<String>,

  /// SQLite cache file (default: ~/.cache/orgdir/cache.sqlite).
  #[arg(long, env = "ORGDIR_CACHE", value_name = "FILE")]
  cache: Option<PathBuf>,

  /// Keep the cache in memory for this run only.
  #[arg(long)]
  no_cache: bool,

  /// Records requested per catalog page.
  #[arg(long)]
  page_size: Option<NonZeroUsize>,

  /// HTTP request timeout in seconds.
  #[arg(long)]
  timeout_secs: Option<u64>,

  /// Write logs to this file. The TUI logs nothing without it.
  #[arg(long, value_name = "FILE")]
  log_file: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Print the departments and users matching QUERY, then exit.
  Search {
    /// Name fragment(s) or a numeric user ID.
    #[arg(required = true, num_args = 1..)]
    query: Vec<String>,
  },
  /// Clear the cache and reload both catalogs from the CRM.
  Refresh,
}

// ─── Config file ─────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default, Debug)]
struct ConfigFile {
  departments_url: Option<String>,
  users_url:       Option<String>,
  enrichment_url:  Option<String>,
  cache:           Option<PathBuf>,
  page_size:       Option<NonZeroUsize>,
  timeout_secs:    Option<u64>,
}

/// Everything needed to build the loader, after merging flags and file.
#[derive(Debug)]
struct Settings {
  crm:       CrmConfig,
  /// `None` keeps the cache in memory.
  cache:     Option<PathBuf>,
  page_size: NonZeroUsize,
}

impl Settings {
  /// CLI flags override the config file, which overrides defaults.
  fn resolve(args: &Args, file: ConfigFile) -> Result<Self> {
    let required = |flag: &Option<String>, file: Option<String>, name: &str| {
      flag
        .clone()
        .or(file)
        .ok_or_else(|| anyhow!("no {name} URL: pass --{name}-url or set {name}_url in the config file"))
    };

    let crm = CrmConfig {
      departments_url: required(&args.departments_url, file.departments_url, "departments")?,
      users_url:       required(&args.users_url, file.users_url, "users")?,
      enrichment_url:  required(&args.enrichment_url, file.enrichment_url, "enrichment")?,
      timeout:         args
        .timeout_secs
        .or(file.timeout_secs)
        .map(Duration::from_secs)
        .unwrap_or(CrmConfig::DEFAULT_TIMEOUT),
    };

    let cache = if args.no_cache {
      None
    } else {
      Some(args.cache.clone().or(file.cache).unwrap_or_else(default_cache_path))
    };

    Ok(Self {
      crm,
      cache,
      page_size: args.page_size.or(file.page_size).unwrap_or(DEFAULT_PAGE_SIZE),
    })
  }
}

fn default_cache_path() -> PathBuf {
  match std::env::var("HOME") {
    Ok(home) => PathBuf::from(home).join(".cache/orgdir/cache.sqlite"),
    Err(_) => PathBuf::from("orgdir-cache.sqlite"),
  }
}

// ─── Entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();
  init_tracing(args.log_file.as_deref(), args.command.is_some())?;

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };
  let settings = Settings::resolve(&args, file_cfg)?;
  let crm = CrmClient::new(settings.crm.clone()).context("building HTTP client")?;

  match &settings.cache {
    None => run(&args, &crm, MemoryCache::new(), settings.page_size).await,
    Some(path) => {
      if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
          .with_context(|| format!("creating cache directory {}", parent.display()))?;
      }
      let cache = SqliteCache::open(path)
        .await
        .with_context(|| format!("opening cache {}", path.display()))?;
      run(&args, &crm, cache, settings.page_size).await
    }
  }
}

/// Logs go to `log_file` when given, else to stderr for one-shot commands.
/// The TUI owns the terminal, so it logs nothing without a file.
fn init_tracing(log_file: Option<&Path>, one_shot: bool) -> Result<()> {
  let filter = EnvFilter::builder()
    .with_default_directive(LevelFilter::INFO.into())
    .from_env_lossy();

  if let Some(path) = log_file {
    let file = std::fs::OpenOptions::new()
      .create(true)
      .append(true)
      .open(path)
      .with_context(|| format!("opening log file {}", path.display()))?;
    tracing_subscriber::fmt()
      .with_env_filter(filter)
      .with_ansi(false)
      .with_writer(Mutex::new(file))
      .init();
  } else if one_shot {
    tracing_subscriber::fmt()
      .with_env_filter(filter)
      .with_writer(io::stderr)
      .init();
  }
  Ok(())
}

async fn run<C: CacheStore + 'static>(
  args: &Args,
  crm: &CrmClient,
  cache: C,
  page_size: NonZeroUsize,
) -> Result<()> {
  let loader = DirectoryLoader::new(crm.departments(), crm.users(), crm.enrichment(), cache)
    .with_page_size(page_size);
  let directory = Arc::new(Directory::new(loader));

  match &args.command {
    Some(Command::Search { query }) => {
      let snapshot = ready(directory.load().await)?;
      print_hits(&snapshot, &query.join(" "));
      Ok(())
    }
    Some(Command::Refresh) => {
      let snapshot = ready(directory.refresh().await)?;
      println!(
        "Loaded {} departments and {} users.",
        snapshot.department_count(),
        snapshot.users.len()
      );
      Ok(())
    }
    None => run_tui(directory).await,
  }
}

fn ready(state: LoadState) -> Result<Arc<Snapshot>> {
  match state {
    LoadState::Ready(snapshot) => Ok(snapshot),
    LoadState::Failed(e) => bail!("directory load failed: {e}"),
    LoadState::Loading => bail!("directory load was superseded"),
  }
}

fn print_hits(snapshot: &Snapshot, query: &str) {
  let hits = search::search_raw(query, &snapshot.departments, &snapshot.users);
  if hits.is_empty() {
    println!("Nothing found");
    return;
  }
  for hit in hits {
    println!("{} ({})", hit.department.name, hit.users.len());
    for user in &hit.users {
      let position = user.profile.work_position.as_deref().unwrap_or_default();
      println!("  {:<40} #{:<8} {position}", user.profile.display_name(), user.id());
    }
  }
}

// ─── TUI ─────────────────────────────────────────────────────────────────────

async fn run_tui<L: SnapshotLoader + 'static>(directory: Arc<Directory<L>>) -> Result<()> {
  // The first load runs behind the UI.
  tokio::spawn({
    let directory = directory.clone();
    async move {
      directory.load().await;
    }
  });
  let mut app = App::new(directory, DEFAULT_DELAY);

  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  let result = run_event_loop(&mut terminal, &mut app).await;

  // Restore terminal regardless of result.
  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  result
}

async fn run_event_loop<L: SnapshotLoader + 'static>(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App<L>,
) -> Result<()> {
  loop {
    app.sync();
    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    // Poll for an event, yielding control to tokio while waiting.
    let maybe_event = tokio::task::block_in_place(|| {
      if event::poll(Duration::from_millis(50))? {
        Ok::<_, io::Error>(Some(event::read()?))
      } else {
        Ok(None)
      }
    })?;

    if let Some(Event::Key(key)) = maybe_event
      && !app.handle_key(key)
    {
      break;
    }
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn args(extra: &[&str]) -> Args {
    let mut argv = vec!["orgdir"];
    argv.extend_from_slice(extra);
    Args::try_parse_from(argv).unwrap()
  }

  fn file(toml_src: &str) -> ConfigFile { toml::from_str(toml_src).unwrap() }

  const URLS: &str = r#"
    departments_url = "http://file/departments"
    users_url = "http://file/users"
    enrichment_url = "http://file/enrichment"
  "#;

  #[test]
  fn flags_override_config_file() {
    let a = args(&["--users-url", "http://flag/users", "--page-size", "10"]);
    let s = Settings::resolve(&a, file(URLS)).unwrap();
    assert_eq!(s.crm.users_url, "http://flag/users");
    assert_eq!(s.crm.departments_url, "http://file/departments");
    assert_eq!(s.page_size.get(), 10);
    assert_eq!(s.crm.timeout, CrmConfig::DEFAULT_TIMEOUT);
  }

  #[test]
  fn missing_url_is_an_error() {
    let err = Settings::resolve(&args(&[]), ConfigFile::default()).unwrap_err();
    assert!(err.to_string().contains("departments"));
  }

  #[test]
  fn no_cache_drops_the_cache_path() {
    let a = args(&["--no-cache", "--cache", "/tmp/x.sqlite"]);
    let s = Settings::resolve(&a, file(URLS)).unwrap();
    assert!(s.cache.is_none());

    let s = Settings::resolve(&args(&["--cache", "/tmp/x.sqlite"]), file(URLS)).unwrap();
    assert_eq!(s.cache, Some(PathBuf::from("/tmp/x.sqlite")));
  }

  #[test]
  fn search_subcommand_joins_words() {
    let a = args(&["search", "петров", "иван"]);
    match a.command {
      Some(Command::Search { query }) => assert_eq!(query.join(" "), "петров иван"),
      other => panic!("unexpected command {other:?}"),
    }
  }
}
