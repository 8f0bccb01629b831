//! `roster-host` — drives one personnel form from the command line.
//!
//! Reads `roster.toml` (or the path given with `--config`), opens the SQLite
//! list store, mounts a form and then reads one JSON command per line from
//! stdin. After every command a JSON reply with the current view is written
//! to stdout. Logs go to stderr.
//!
//! ```text
//! {"cmd":"mode","mode":"modify"}
//! {"cmd":"select","id":3}
//! {"cmd":"edit","edit":{"field":"given_name","value":"Ana"}}
//! {"cmd":"save"}
//! ```

mod command;
mod settings;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use command::{Command, Reply};
use roster_core::{
  item::{Fields, UserRef},
  query::{Filter, ListQuery},
  schema::{PROVIDERS_LIST, TITLE, provider as col},
  store::ListStore,
};
use roster_form::FormController;
use roster_store_sqlite::SqliteStore;
use serde_json::json;
use settings::Settings;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Personnel registration form host")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, env = "ROSTER_CONFIG", default_value = "roster.toml")]
  config: PathBuf,

  /// Override the store path from the configuration.
  #[arg(long)]
  store: Option<PathBuf>,

  /// Make sure a provider with this name exists, with the current user as a
  /// member. May be repeated.
  #[arg(long = "provider", value_name = "NAME")]
  providers: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let mut settings = Settings::load(&cli.config)?;
  if let Some(path) = cli.store {
    settings.store_path = path;
  }

  let mut store = SqliteStore::open(&settings.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", settings.store_path))?;
  if let Some(id) = settings.current_user_id {
    store = store.with_current_user(UserRef { id });
  }
  store
    .provision_registry(settings.multi_provider)
    .await
    .context("failed to provision lists")?;
  for name in &cli.providers {
    ensure_provider(&store, name, settings.current_user_id).await?;
  }

  let mut form = FormController::new(Arc::new(store), settings.host.clone());
  let report = form.mount().await;
  tracing::info!(?report, "form ready");

  let mut lines = BufReader::new(tokio::io::stdin()).lines();
  let mut stdout = tokio::io::stdout();
  while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
    if line.trim().is_empty() {
      continue;
    }
    let reply = match serde_json::from_str::<Command>(&line) {
      Ok(cmd) => command::run(&mut form, cmd).await,
      Err(e) => Reply::rejected(format!("comando inválido: {e}"), form.view()),
    };

    let mut out = serde_json::to_vec(&reply).context("failed to serialise reply")?;
    out.push(b'\n');
    stdout.write_all(&out).await?;
    stdout.flush().await?;
  }

  form.unmount();
  Ok(())
}

/// Add a provider called `name` unless one exists.
async fn ensure_provider(
  store: &SqliteStore,
  name: &str,
  member: Option<i64>,
) -> anyhow::Result<()> {
  let q = ListQuery::new().filter(Filter::eq(TITLE, name)).top(1);
  if !store.query(PROVIDERS_LIST, &q).await?.is_empty() {
    return Ok(());
  }

  let mut fields = Fields::new();
  fields.insert(TITLE.into(), json!(name));
  fields.insert(col::MEMBERS_ID.into(), json!({ "results": member.into_iter().collect::<Vec<_>>() }));
  let added = store.add_item(PROVIDERS_LIST, fields).await?;
  tracing::info!(name, id = ?added.id, "provider added");
  Ok(())
}
