//! `scholar`: command-line client for the Scholar student registry.
//!
//! # Usage
//!
//! ```text
//! scholar --url http://localhost:8080 list --text lee
//! scholar add --first-name Ann --last-name Lee --email a@x.com --dob 2000-01-01
//! scholar update <id> --last-name Kim --clear-gender
//! scholar update <id> --email ""          # clears the address
//! ```

mod client;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use client::{ApiClient, ApiConfig, ListFilter, Tagged};
use scholar_core::{
  patch::{FieldUpdate, StudentPatch},
  student::{Gender, NewStudent},
};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

const DEFAULT_URL: &str = "http://localhost:8080";

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "scholar", about = "Client for the Scholar student registry")]
struct Cli {
  /// Path to a TOML config file (url).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the Scholar server (default: http://localhost:8080).
  #[arg(long, env = "SCHOLAR_URL")]
  url: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List students.
  List {
    /// Substring to look for in names and email.
    #[arg(long)]
    text:   Option<String>,
    #[arg(long)]
    gender: Option<Gender>,
    #[arg(long)]
    limit:  Option<usize>,
    #[arg(long)]
    offset: Option<usize>,
  },
  /// Show one student.
  Show { id: Uuid },
  /// Register a new student.
  Add(StudentArgs),
  /// Change some fields of a student; fields not given are left alone.
  Update {
    id:       Uuid,
    #[command(flatten)]
    fields:   UpdateArgs,
    /// Only apply if the student still has this ETag.
    #[arg(long)]
    if_match: Option<String>,
  },
  /// Replace every field of a student.
  Replace {
    id:       Uuid,
    #[command(flatten)]
    fields:   StudentArgs,
    #[arg(long)]
    if_match: Option<String>,
  },
  /// Delete a student.
  Delete { id: Uuid },
}

/// A complete set of student fields.
#[derive(Args, Debug)]
struct StudentArgs {
  #[arg(long)]
  first_name: String,
  #[arg(long)]
  last_name:  String,
  #[arg(long)]
  email:      String,
  /// Date of birth, YYYY-MM-DD.
  #[arg(long)]
  dob:        Option<NaiveDate>,
  #[arg(long)]
  gender:     Option<Gender>,
}

impl From<StudentArgs> for NewStudent {
  fn from(a: StudentArgs) -> Self {
    NewStudent {
      first_name:    a.first_name,
      last_name:     a.last_name,
      email:         a.email,
      date_of_birth: a.dob,
      gender:        a.gender,
    }
  }
}

/// Partial-update flags. An omitted flag leaves the field alone; an empty
/// `--email ""` clears the address; `--clear-*` removes an optional field.
#[derive(Args, Debug)]
struct UpdateArgs {
  #[arg(long)]
  first_name:   Option<String>,
  #[arg(long)]
  last_name:    Option<String>,
  #[arg(long)]
  email:        Option<String>,
  #[arg(long, conflicts_with = "clear_dob")]
  dob:          Option<NaiveDate>,
  #[arg(long)]
  clear_dob:    bool,
  #[arg(long, conflicts_with = "clear_gender")]
  gender:       Option<Gender>,
  #[arg(long)]
  clear_gender: bool,
}

impl UpdateArgs {
  fn into_patch(self) -> StudentPatch {
    StudentPatch {
      first_name:    self.first_name.into(),
      last_name:     self.last_name.into(),
      email:         self.email.into(),
      date_of_birth: optional_update(self.dob, self.clear_dob),
      gender:        optional_update(self.gender, self.clear_gender),
    }
  }
}

/// `--x value` sets, `--clear-x` sends `null`, neither leaves it alone.
fn optional_update<T>(value: Option<T>, clear: bool) -> FieldUpdate<Option<T>> {
  match (value, clear) {
    (Some(v), _) => FieldUpdate::Set(Some(v)),
    (None, true) => FieldUpdate::Set(None),
    (None, false) => FieldUpdate::Unchanged,
  }
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url: String,
}

/// CLI flag overrides config file, which overrides the default.
fn resolve_url(flag: Option<String>, file: &ConfigFile) -> String {
  flag
    .or_else(|| (!file.url.is_empty()).then(|| file.url.clone()))
    .unwrap_or_else(|| DEFAULT_URL.to_string())
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load config file if provided.
  let file_cfg: ConfigFile = if let Some(path) = &cli.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  let client = ApiClient::new(ApiConfig {
    base_url: resolve_url(cli.url, &file_cfg),
  })?;

  match cli.command {
    Command::List { text, gender, limit, offset } => {
      let students = client
        .list(&ListFilter { text, gender, limit, offset })
        .await?;
      print_json(&students)?;
    }
    Command::Show { id } => print_tagged(client.get(id).await?)?,
    Command::Add(fields) => print_tagged(client.create(&fields.into()).await?)?,
    Command::Update { id, fields, if_match } => {
      let patch = fields.into_patch();
      if patch.is_empty() {
        anyhow::bail!("nothing to update; pass at least one field flag");
      }
      print_tagged(client.patch(id, &patch, if_match.as_deref()).await?)?;
    }
    Command::Replace { id, fields, if_match } => {
      print_tagged(client.replace(id, &fields.into(), if_match.as_deref()).await?)?;
    }
    Command::Delete { id } => {
      client.delete(id).await?;
      eprintln!("deleted {id}");
    }
  }

  Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}

/// Print the view on stdout and its ETag on stderr, so stdout stays valid
/// JSON.
fn print_tagged(tagged: Tagged) -> Result<()> {
  if let Some(etag) = &tagged.etag {
    eprintln!("etag: {etag}");
  }
  print_json(&tagged.view)
}
