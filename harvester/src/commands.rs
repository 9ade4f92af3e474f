use clap::{arg, command};
use harvester_core::harvest::{DEFAULT_DIRECTORY_URL, DEFAULT_LEDGER_PATH, DEFAULT_OUTPUT_PATH};
use url::Url;

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("harvester")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("harvester")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .subcommand_required(false)
        .subcommand(
            command!("run")
                .about(
                    "Load every listing in the directory, fetch the ones not yet in the \
                ledger and write them to a CSV report.",
                )
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(false)
                        .help("The listing directory page to harvest")
                        .value_parser(clap::value_parser!(Url))
                        .default_value(DEFAULT_DIRECTORY_URL),
                )
                .arg(
                    arg!(-l --"ledger" <PATH>)
                        .required(false)
                        .help("Newline-delimited file of listing ids already processed")
                        .default_value(DEFAULT_LEDGER_PATH),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("CSV report of this run's new listings (overwritten)")
                        .default_value(DEFAULT_OUTPUT_PATH),
                )
                .arg(
                    arg!(-e --"engine" <ENGINE>)
                        .required(false)
                        .help("Page engine: chrome renders scripts, http fetches static HTML")
                        .value_parser(["chrome", "http"])
                        .default_value("chrome"),
                )
                .arg(
                    arg!(--"show-browser")
                        .required(false)
                        .help("Open a visible Chrome window instead of running headless")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
}
