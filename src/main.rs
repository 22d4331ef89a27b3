use clap::Parser;
use log_tail::{TailConfig, WatchMode, follow_from};
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tokio_stream::StreamExt;
use tracing_subscriber::EnvFilter;

/// Print lines appended to a file, following it across rotation and truncation.
#[derive(Parser, Debug)]
#[command(name = "log-tail", version)]
struct Args {
    /// File to follow
    path: PathBuf,

    /// Byte offset to start from
    #[arg(long, default_value_t = 0)]
    offset: u64,

    /// Milliseconds between metadata checks
    #[arg(long, default_value_t = 1000)]
    poll_interval_ms: u64,

    /// Milliseconds a missing file is waited for before giving up
    #[arg(long, default_value_t = 5000)]
    stale_timeout_ms: u64,

    /// Wake up on filesystem events instead of waiting out the full poll interval
    #[arg(long)]
    notify: bool,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let watch_mode = if args.notify {
        WatchMode::Notify
    } else {
        WatchMode::Poll
    };
    let config = TailConfig::new(
        Duration::from_millis(args.poll_interval_ms),
        Duration::from_millis(args.stale_timeout_ms),
    )
    .with_watch_mode(watch_mode);

    match follow_from(&args.path, args.offset, config).await {
        Ok(mut stream) => {
            while let Some(line_result) = stream.next().await {
                match line_result {
                    Ok(content) => println!("{}", content),
                    Err(e) if e.is_terminal() => {
                        eprintln!("Stopped following {}: {}", args.path.display(), e);
                        process::exit(1);
                    }
                    Err(e) => eprintln!("Error reading file: {}", e),
                }
            }
        }
        Err(e) => {
            eprintln!("Error setting up tail reader: {}", e);
            process::exit(1);
        }
    }
}
