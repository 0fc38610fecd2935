use clap::Parser;

use baz_app::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    baz_app::init_tracing();
    baz_app::run(Cli::parse()).await
}
