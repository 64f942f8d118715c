use clap::Parser;
use ussd_data_service::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    ussd_data_service::init_tracing();
    ussd_data_service::run(Cli::parse()).await
}
