use clap::ArgMatches;
use colored::Colorize;
use harvester_core::harvest::{
    DEFAULT_DIRECTORY_URL, DEFAULT_LEDGER_PATH, DEFAULT_OUTPUT_PATH, HarvestOptions,
    HarvestProgressCallback, HarvestSummary, execute_harvest,
};
use harvester_core::HarvestError;
use harvester_scanner::{ChromeSession, HttpSession, PaginationOutcome};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;
use url::Url;

/// Which page session drives the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    Chrome,
    Http,
}

impl Engine {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "chrome" => Some(Engine::Chrome),
            "http" => Some(Engine::Http),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub url: Url,
    pub ledger_path: PathBuf,
    pub output_path: PathBuf,
    pub engine: Engine,
    pub headless: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            url: Url::parse(DEFAULT_DIRECTORY_URL).expect("default directory URL is valid"),
            ledger_path: PathBuf::from(DEFAULT_LEDGER_PATH),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            engine: Engine::Chrome,
            headless: true,
        }
    }
}

impl RunConfig {
    pub fn from_args(args: &ArgMatches) -> Self {
        let defaults = Self::default();
        Self {
            url: args.get_one::<Url>("url").cloned().unwrap_or(defaults.url),
            ledger_path: args
                .get_one::<String>("ledger")
                .map(|p| expand_path(p))
                .unwrap_or(defaults.ledger_path),
            output_path: args
                .get_one::<String>("output")
                .map(|p| expand_path(p))
                .unwrap_or(defaults.output_path),
            engine: args
                .get_one::<String>("engine")
                .and_then(|e| Engine::from_str(e))
                .unwrap_or(defaults.engine),
            headless: !args.get_flag("show-browser"),
        }
    }

    pub fn harvest_options(&self) -> HarvestOptions {
        let mut options = HarvestOptions::new(
            self.url.clone(),
            self.ledger_path.clone(),
            self.output_path.clone(),
        );
        options.show_progress_bars = true;
        options
    }
}

/// Expand a leading `~` in a user-supplied path
pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

pub fn describe_pagination(outcome: Option<PaginationOutcome>) -> String {
    match outcome {
        Some(PaginationOutcome::Exhausted { rounds }) => {
            format!("no more results after {} round(s)", rounds)
        }
        Some(PaginationOutcome::Converged { rounds }) => {
            format!("list stopped growing after {} round(s)", rounds)
        }
        Some(PaginationOutcome::IterationCap { rounds }) => {
            format!("stopped at the {}-round cap", rounds)
        }
        None => "incomplete (count read failed)".to_string(),
    }
}

pub fn format_summary(summary: &HarvestSummary) -> String {
    let mut report = String::new();
    report.push_str("# Summary:\n");
    report.push_str(&format!(
        "  Pagination: {}\n",
        describe_pagination(summary.pagination)
    ));
    report.push_str(&format!("  Tiles loaded: {}\n", summary.loaded_tiles));
    report.push_str(&format!("  New listings: {}\n", summary.extracted));
    report.push_str(&format!("  Websites found: {}\n", summary.enriched));
    report.push_str(&format!(
        "  Detail pages failed: {}\n",
        summary.failed_details
    ));
    report
}

/// Short console label for a failed run
pub fn failure_label(error: &HarvestError) -> &'static str {
    match error {
        HarvestError::Startup { .. } => "Directory page unavailable",
        HarvestError::Ledger { .. } => "Ledger unreadable",
        HarvestError::Report { .. } => "CSV output failed",
    }
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

pub async fn handle_run(config: RunConfig) {
    // Initialize tracing for logging
    tracing_subscriber::fmt::init();

    print_divider();
    println!("{}", "  HARVEST".bright_white().bold());
    print_divider();
    println!(
        "{} Directory: {}",
        "→".blue(),
        config.url.as_str().bright_white()
    );
    println!(
        "{} Ledger: {}",
        "→".blue(),
        config.ledger_path.display().to_string().bright_white()
    );
    println!(
        "{} Report: {}",
        "→".blue(),
        config.output_path.display().to_string().bright_white()
    );
    let engine_str = match config.engine {
        Engine::Chrome if config.headless => "chrome (headless)",
        Engine::Chrome => "chrome (visible)",
        Engine::Http => "http (static HTML, no load more)",
    };
    println!("{} Engine: {}\n", "→".blue(), engine_str);

    let options = config.harvest_options();
    let progress_callback: HarvestProgressCallback = Arc::new(|msg: String| {
        println!("{}", msg);
    });
    let mut rng = StdRng::from_entropy();

    let result = match config.engine {
        Engine::Chrome => {
            let mut session = match ChromeSession::launch(config.headless).await {
                Ok(session) => session,
                Err(e) => {
                    eprintln!("{} Could not start Chrome: {}", "✗".red().bold(), e);
                    std::process::exit(1);
                }
            };
            let result =
                execute_harvest(&mut session, &options, &mut rng, Some(progress_callback)).await;
            if let Err(e) = session.close().await {
                warn!("Browser shutdown failed: {}", e);
            }
            result
        }
        Engine::Http => {
            let mut session = match HttpSession::new() {
                Ok(session) => session,
                Err(e) => {
                    eprintln!("{} Could not build HTTP client: {}", "✗".red().bold(), e);
                    std::process::exit(1);
                }
            };
            execute_harvest(&mut session, &options, &mut rng, Some(progress_callback)).await
        }
    };

    match result {
        Ok(summary) => {
            println!();
            print!("{}", format_summary(&summary));
            println!();
            println!(
                "{} CSV written: {}",
                "✓".green().bold(),
                options.output_path.display().to_string().bright_white()
            );
        }
        Err(e) => {
            eprintln!("{} {}: {}", "✗".red().bold(), failure_label(&e), e);
            std::process::exit(1);
        }
    }
}
