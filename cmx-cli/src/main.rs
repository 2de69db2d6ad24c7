//! CMX CLI - Command line tool for exploring GCM/RCM comparison results.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "cmx-cli",
    version,
    about = "Climate model comparison explorer"
)]
struct Cli {
    #[command(flatten)]
    backend: cmx_cmd::BackendArgs,

    #[command(subcommand)]
    command: cmx_cmd::Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    cmx_cmd::run(cli.backend, cli.command).await
}
