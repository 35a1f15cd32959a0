use anyhow::Result;
use env_logger::Env;
use log::debug;
use std::path::PathBuf;

/// calskill [--config <path>] [question...]
fn parse_args(args: impl Iterator<Item = String>) -> Result<(Option<PathBuf>, Option<String>)> {
    let mut config_path = None;
    let mut words = Vec::new();
    let mut args = args;

    while let Some(arg) = args.next() {
        if arg == "--config" || arg == "-c" {
            let path = args.next().ok_or_else(|| anyhow::anyhow!("--config needs a path"))?;
            config_path = Some(PathBuf::from(path));
        } else {
            words.push(arg);
        }
    }

    let question = if words.is_empty() { None } else { Some(words.join(" ")) };
    Ok((config_path, question))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before reading the password override
    if let Err(e) = dotenvy::dotenv() {
        debug!("No .env file loaded: {}", e);
    }

    // Initialize logging with custom format
    env_logger::Builder::from_env(Env::default().default_filter_or("warn"))
        .format(|buf, record| {
            use chrono::Local;
            use std::io::Write;
            writeln!(
                buf,
                "{} [{}] {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .init();

    let (config_path, question) = parse_args(std::env::args().skip(1))?;
    calskill::run(config_path, question).await
}
