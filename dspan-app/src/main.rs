use std::path::PathBuf;

use clap::Parser;

mod app;
mod scene;
pub use app::App;

#[derive(Parser, Debug, Clone)]
#[command(name = "digit-span", version, about = "Forward and backward digit span test")]
pub struct Args {
    /// Pre-fill the participant ID on the welcome screen
    #[arg(long)]
    participant: Option<String>,

    /// Directory for the local session cache and exported images
    #[arg(long, default_value = ".digit-span")]
    data_dir: PathBuf,

    /// TrueType font used for text labels
    #[arg(long)]
    font: Option<PathBuf>,

    /// Generate sequences instead of using the fixed table
    #[arg(long)]
    random_sequences: bool,

    /// Seed for --random-sequences
    #[arg(long, requires = "random_sequences")]
    seed: Option<u64>,

    /// Run in a window instead of borderless fullscreen
    #[arg(long)]
    windowed: bool,

    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .init();

    let app = App::new(args)?;
    app.run()?;

    Ok(())
}
