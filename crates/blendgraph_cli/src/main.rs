#![allow(missing_docs)]

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cmd;

#[derive(Parser)]
#[command(name = "blendgraph", about = "SDNA-driven .blend inspection tools")]
struct Cli {
	/// Raise the default log filter to `debug`.
	#[arg(short, long, global = true)]
	verbose: bool,
	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	Info(cmd::info::Args),
	Dna(cmd::dna::Args),
	List(cmd::list::Args),
	Show(cmd::show::Args),
}

fn main() {
	let cli = Cli::parse();
	init_tracing(cli.verbose);

	if let Err(err) = run(cli.command) {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn init_tracing(verbose: bool) {
	let default = if verbose { "debug" } else { "warn" };
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).with_target(verbose).init();
}

fn run(command: Commands) -> blendgraph::blend::Result<()> {
	match command {
		Commands::Info(args) => cmd::info::run(args),
		Commands::Dna(args) => cmd::dna::run(args),
		Commands::List(args) => cmd::list::run(args),
		Commands::Show(args) => cmd::show::run(args),
	}
}
