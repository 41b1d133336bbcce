use clap::Parser;
use journal_app::app::{run, Cli};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();
    if let Err(err) = run(cli, &mut std::io::stdout()) {
        eprintln!("voice_journal: {err:#}");
        std::process::exit(1);
    }
}
