use harvester::commands::command_argument_builder;
use harvester::handlers::{RunConfig, handle_run};
use harvester_core::print_banner;

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");

    // Show banner unless --quiet flag is set
    if !quiet {
        print_banner();
    }

    match chosen_command.subcommand() {
        Some(("run", primary_command)) => handle_run(RunConfig::from_args(primary_command)).await,
        // No subcommand: harvest with the built-in defaults
        None => handle_run(RunConfig::default()).await,
        _ => unreachable!("clap should ensure we don't get here"),
    }
}
