use std::path::PathBuf;

use clap::Parser;
use dotenv::dotenv;
use tokio::runtime;
use tracing::error;

use quillmq::{setup_tracing, LogMode, GLOBAL_CONFIG};
use quillmq::{AppResult, Broker, BrokerConfig};

#[derive(Parser)]
#[command(version)]
pub struct CommandLine {
    /// path to config file
    #[arg(short, long)]
    pub conf: Option<String>,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(clap::Subcommand)]
pub enum Command {
    PrintConfig,
}

fn main() {
    if let Err(e) = run() {
        error!("QuillMQ start failed: {}", e);
        eprintln!("QuillMQ start failed: {}", e);
        std::process::exit(1);
    }
}

fn run() -> AppResult<()> {
    let commandline: CommandLine = CommandLine::parse();
    dotenv().ok();

    let _log_guard = setup_tracing(LogMode::Console)?;

    // setup config
    let config_path = commandline.conf.as_ref().map_or_else(
        || {
            let mut path = PathBuf::from("./");
            path.push("conf.toml");
            path
        },
        PathBuf::from,
    );
    let broker_config = BrokerConfig::set_up_config(config_path)?;

    if let Some(Command::PrintConfig) = commandline.command {
        println!("{:#?}", broker_config);
        return Ok(());
    }

    GLOBAL_CONFIG
        .set(broker_config)
        .expect("set broker config failed");

    let rt = runtime::Builder::new_multi_thread().enable_all().build()?;
    Broker::start(&rt)?;

    Ok(())
}
