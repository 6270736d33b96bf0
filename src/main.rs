use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;
use udyam_schema::cli::commands::{cmd_controls, cmd_schema, cmd_validate};
use udyam_schema::cli::config::{Cli, Commands, load_config, resolve_settings};

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            error!(error = %err, "command failed");
            let mut cause = err.source();
            while let Some(inner) = cause {
                error!(cause = %inner, "caused by");
                cause = inner.source();
            }
            std::process::exit(1);
        }
    }
}

/// Returns `false` when the command ran but its check did not pass.
fn run(cli: Cli) -> Result<bool, Box<dyn std::error::Error>> {
    let config = load_config(cli.config.as_deref())?;
    let settings = resolve_settings(&cli, &config);

    match cli.command {
        Commands::Schema { refresh, out } => {
            cmd_schema(&settings, refresh, out.as_deref())?;
            Ok(true)
        }
        Commands::Validate { input } => cmd_validate(&settings, &input),
        Commands::Controls => {
            cmd_controls(&settings)?;
            Ok(true)
        }
    }
}

/// `RUST_LOG` wins; otherwise the `-v` count picks the level.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
