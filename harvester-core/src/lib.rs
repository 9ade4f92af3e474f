pub mod error;
pub mod harvest;
pub mod ledger;
pub mod report;

use colored::Colorize;

pub use error::HarvestError;

const BANNER: &str = r#"
  _                                _
 | |__   __ _ _ ____   _____  ___| |_ ___ _ __
 | '_ \ / _` | '__\ \ / / _ \/ __| __/ _ \ '__|
 | | | | (_| | |   \ V /  __/\__ \ ||  __/ |
 |_| |_|\__,_|_|    \_/ \___||___/\__\___|_|
"#;

pub fn print_banner() {
    println!("{}", BANNER.bright_green().bold());
    println!(
        "  {} {}\n",
        "incremental listing harvester".bright_white(),
        format!("v{}", env!("CARGO_PKG_VERSION")).cyan()
    );
}
