// src/main.rs

use bootstrap_runner::{cli, logging, run};

#[tokio::main]
async fn main() {
    match run_main().await {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(err) => {
            eprintln!("bootstrap-runner error: {err:?}");
            std::process::exit(1);
        }
    }
}

async fn run_main() -> anyhow::Result<i32> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    Ok(run(args).await?)
}
