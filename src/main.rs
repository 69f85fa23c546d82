mod config;
mod fields;
mod rows;
mod screen;

use std::error::Error;
use std::path::PathBuf;

use chrono::Local;
use clap::{Parser, Subcommand};

use crate::config::{load_config, resolve_config_path, save_config};
use crate::fields::FieldStore;
use crate::rows::TimeRange;
use crate::screen::run_picker;

#[derive(Debug, Parser)]
#[command(name = "timespan-picker", about = "Terminal-first time range picker")]
struct Cli {
	#[arg(long)]
	config: Option<PathBuf>,
	/// Rounding interval override, in minutes.
	#[arg(long)]
	interval: Option<u32>,
	/// Initial span length override, in minutes.
	#[arg(long)]
	span: Option<u32>,
	/// Format times with a 12-hour clock.
	#[arg(long)]
	twelve_hour: bool,
	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
	/// Run the interactive picker (the default).
	Pick,
	/// Print the initial rounded pair without entering the picker.
	Defaults,
	/// Write the active configuration to the config file.
	InitConfig,
}

fn main() {
	if let Err(err) = run() {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn run() -> Result<(), Box<dyn Error>> {
	let cli = Cli::parse();

	let config_path = resolve_config_path(cli.config);
	let mut config = load_config(&config_path)?;
	if let Some(interval) = cli.interval {
		config.interval_minutes = interval;
	}
	if let Some(span) = cli.span {
		config.span_minutes = span;
	}
	if cli.twelve_hour {
		config.use_24_hour_clock = false;
	}
	config.validate()?;

	match cli.command.unwrap_or(Command::Pick) {
		Command::Pick => {
			if let Some(range) = run_picker(&config)? {
				println!("{}", serde_json::to_string(&range)?);
			}
		}
		Command::Defaults => {
			let store = FieldStore::new(config.interval_minutes, config.span_minutes, Local::now());
			let range = TimeRange {
				start: store.start(),
				end: store.end(),
			};
			println!("{}", serde_json::to_string(&range)?);
		}
		Command::InitConfig => {
			save_config(&config_path, &config)?;
			println!("wrote {}", config_path.display());
		}
	}

	Ok(())
}
