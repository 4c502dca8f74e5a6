use clap::Parser;

#[tokio::main]
async fn main() {
    if let Err(err) = tokendesk_cli::run(tokendesk_cli::args::Cli::parse()).await {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}
