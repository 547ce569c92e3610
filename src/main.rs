use std::fs::File;

use casegen::Backend;
use casegen::core::config;
use clap::Parser;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

#[derive(Parser)]
#[command(name = "casegen", about = "Generate test cases from FSDs and change requests")]
struct Args {
    /// Generation backend (overrides config and CASEGEN_BACKEND)
    #[arg(short, long, value_enum)]
    backend: Option<Backend>,

    /// Model name (overrides config and CASEGEN_MODEL)
    #[arg(short, long)]
    model: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // Terminal owns stdout; log to casegen.log in the working directory
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    if let Ok(log_file) = File::create("casegen.log") {
        let _ = WriteLogger::init(LevelFilter::Debug, log_config, log_file);
    }

    let file_config = config::load_config()?;
    let resolved = config::resolve(
        &file_config,
        args.backend.map(Backend::as_str),
        args.model.as_deref(),
    );
    log::info!(
        "casegen starting: backend={}, model={}",
        resolved.backend,
        resolved.model_name
    );

    let provider = casegen::build_provider(&resolved)?;
    casegen::tui::run(resolved, provider)?;
    Ok(())
}
