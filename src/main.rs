use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use factory_save_codec::document::{decode_file, encode_file, Document};
use log::error;

#[derive(Parser)]
#[command(name = "save-codec", about = "Converts save-game containers to and from JSON")]
struct Cli {
  #[command(subcommand)]
  command: Command,

  #[command(flatten)]
  verbosity: Verbosity<InfoLevel>,
}

#[derive(Subcommand)]
enum Command {
  /// Decode a .sav file into JSON
  Decode {
    input: PathBuf,
    #[arg(short, long)]
    output: Option<PathBuf>,
  },
  /// Encode a JSON document back into a .sav file
  Encode {
    input: PathBuf,
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Downgrade length mismatches from a fatal error to a warning
    #[arg(long)]
    authoring: bool,
  },
}

fn default_output(input: &Path, extension: &str) -> PathBuf {
  input.with_extension(extension)
}

fn run() -> factory_save_codec::errors::Result<()> {
  let cli = Cli::parse();

  env_logger::Builder::new().filter_level(cli.verbosity.log_level_filter()).init();

  match cli.command {
    Command::Decode { input, output } => {
      let output = output.unwrap_or_else(|| default_output(&input, "json"));
      let document = decode_file(&input)?;
      let json = serde_json::to_string_pretty(&document)?;
      std::fs::write(&output, json)?;
      log::info!("wrote {}", output.display());
    }
    Command::Encode { input, output, authoring } => {
      let output = output.unwrap_or_else(|| default_output(&input, "sav"));
      let json = std::fs::read_to_string(&input)?;
      let document: Document = serde_json::from_str(&json)?;
      encode_file(&output, &document, authoring)?;
      log::info!("wrote {}", output.display());
    }
  }

  Ok(())
}

fn main() -> ExitCode {
  match run() {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      error!("{err}");
      ExitCode::FAILURE
    }
  }
}
