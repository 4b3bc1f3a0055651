use alab_gantry::cli::{self, Cli};
use alab_gantry::{init_logging_with_default, BUILD_DATE, VERSION};
use clap::Parser;

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    init_logging_with_default(if args.verbose { "debug" } else { "info" })?;
    tracing::debug!("alab-gantry {} (built {})", VERSION, BUILD_DATE);

    let stdout = std::io::stdout();
    cli::run(&args, &mut stdout.lock())
}
