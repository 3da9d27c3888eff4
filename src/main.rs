// src/main.rs

use config_reloader::{cli, logging, run};

/// Exit status for fatal runtime errors. Argument errors exit with 2 from
/// clap before we get here.
const EXIT_FATAL: i32 = 1;

#[tokio::main]
async fn main() {
    if let Err(err) = run_main().await {
        eprintln!("config-reloader error: {err:?}");
        std::process::exit(EXIT_FATAL);
    }
}

async fn run_main() -> anyhow::Result<()> {
    let args = cli::parse();
    logging::init_logging(args.log_format, args.log_level)?;
    run(args).await?;
    Ok(())
}
