use clap::Parser;
use lfcircle::{Circle, LastFmClient, OutputFormat, RenderOptions};
use std::process::ExitCode;

/// last.fm statistics generator for your friend circle!
#[derive(Parser, Debug)]
#[command(name = "lfcircle", version, long_about = None)]
struct Cli {
    /// Users to target
    #[arg(required = true)]
    targets: Vec<String>,

    /// Specify a report header, leave empty for none
    #[arg(short = 'H', long, default_value = "")]
    header: String,

    /// Removes 'https://www.' in any links
    #[arg(short, long)]
    truncate_scheme: bool,

    /// Makes everything lowercase
    #[arg(short, long)]
    lowercase: bool,

    /// Adds links for top artists, albums and tracks
    #[arg(short, long)]
    all_the_links: bool,

    /// Output format type (ascii or markdown)
    #[arg(short, long, default_value = "ascii")]
    format: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Last.fm base URL
    #[arg(long, env = "LFCIRCLE_BASE_URL", default_value = lfcircle::types::DEFAULT_BASE_URL, hide = true)]
    base_url: String,
}

impl Cli {
    fn render_options(&self) -> lfcircle::Result<RenderOptions> {
        Ok(RenderOptions {
            header: self.header.clone(),
            truncate_scheme: self.truncate_scheme,
            lowercase: self.lowercase,
            all_the_links: self.all_the_links,
            format: self.format.parse::<OutputFormat>()?,
        })
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Cli::parse();
    init_logging(args.verbose);
    log::debug!("{args:?}");

    let options = match args.render_options() {
        Ok(options) => options,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let client = LastFmClient::with_base_url(
        Box::new(http_client::native::NativeClient::new()),
        args.base_url.clone(),
    );
    let circle = Circle::new(client);

    let result = circle.run(args.targets.as_slice(), &options).await;

    match result {
        Ok(outcome) => {
            // Skipped targets were already logged as warnings
            eprintln!();
            print!("{}", outcome.text);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
