mod app;
mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use catbundle_lib::catalog::{EntityEvent, Operation};

use output::OutputFormat;

/// catbundle - keep one ZIP bundle of every dataset's resources up to date
#[derive(Parser)]
#[command(name = "catbundle")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable debug logging
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Config file (default: $XDG_CONFIG_HOME/catbundle/config.toml)
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  /// Output format
  #[arg(short, long, global = true, value_enum, default_value_t)]
  output: OutputFormat,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum EntityKind {
  Dataset,
  Resource,
}

#[derive(Clone, Copy, ValueEnum)]
enum OperationArg {
  Created,
  Changed,
  Deleted,
}

impl From<OperationArg> for Operation {
  fn from(arg: OperationArg) -> Self {
    match arg {
      OperationArg::Created => Operation::Created,
      OperationArg::Changed => Operation::Changed,
      OperationArg::Deleted => Operation::Deleted,
    }
  }
}

#[derive(Subcommand)]
enum Commands {
  /// Store a dataset from a JSON file in the catalog
  Import {
    /// Dataset JSON file
    file: PathBuf,
  },

  /// Add a resource to a dataset
  AddResource {
    /// Dataset id or name
    dataset: String,

    #[arg(long)]
    name: String,

    #[arg(long, default_value = "")]
    format: String,

    /// Remote URL of the content
    #[arg(long, conflicts_with = "file", required_unless_present = "file")]
    url: Option<String>,

    /// Local file to upload
    #[arg(long)]
    file: Option<PathBuf>,
  },

  /// Report a catalog change, as the catalog's change hook would
  Notify {
    #[arg(value_enum)]
    kind: EntityKind,

    id: String,

    #[arg(long, value_enum, default_value = "changed")]
    operation: OperationArg,
  },

  /// Report that tabular data was loaded into the datastore for a resource
  DataLoaded {
    resource: String,
  },

  /// Rebuild one dataset's bundle now
  Rebuild {
    /// Dataset id or name
    dataset: String,

    /// Publish even if the manifest is unchanged
    #[arg(short, long)]
    force: bool,
  },

  /// Run all pending rebuild jobs
  Work {
    /// Maximum concurrent rebuilds (default: from config)
    #[arg(short, long)]
    parallelism: Option<usize>,

    /// Requeue jobs left running by an interrupted worker first
    #[arg(long)]
    recover: bool,
  },

  /// List queued rebuild jobs
  Jobs,

  /// Show a dataset's bundle state
  Status {
    /// Dataset id or name
    dataset: String,
  },

  /// Print the manifest a rebuild would package
  Manifest {
    /// Dataset id or name
    dataset: String,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_filter = if cli.verbose {
    "catbundle_lib=debug,catbundle=debug"
  } else {
    "warn"
  };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let config = cli.config.as_deref();
  let output = cli.output;

  match cli.command {
    Commands::Import { file } => cmd::cmd_import(config, &file, output),
    Commands::AddResource {
      dataset,
      name,
      format,
      url,
      file,
    } => cmd::cmd_add_resource(config, &dataset, name, format, url, file, output),
    Commands::Notify { kind, id, operation } => {
      let event = match kind {
        EntityKind::Dataset => EntityEvent::dataset(id, operation.into()),
        EntityKind::Resource => EntityEvent::resource(id, operation.into()),
      };
      cmd::cmd_notify(config, &event, output)
    }
    Commands::DataLoaded { resource } => cmd::cmd_data_loaded(config, &resource, output),
    Commands::Rebuild { dataset, force } => cmd::cmd_rebuild(config, &dataset, force, output),
    Commands::Work { parallelism, recover } => cmd::cmd_work(config, parallelism, recover, output),
    Commands::Jobs => cmd::cmd_jobs(config, output),
    Commands::Status { dataset } => cmd::cmd_status(config, &dataset, output),
    Commands::Manifest { dataset } => cmd::cmd_manifest(config, &dataset),
  }
}
