use clap::Parser;
use colored::Colorize;
use zaakbatch_cli::{
	cli::{Cli, Settings},
	logging,
	prompt::TerminalPrompter,
	run,
};

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	let settings = Settings::from(&cli);
	let mut prompter = TerminalPrompter::stdin();

	if let Err(err) = run::run(&settings, &mut prompter).await {
		eprintln!("{} {err}", "Error:".red().bold());
		std::process::exit(1);
	}
}
