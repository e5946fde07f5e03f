use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = bootproxy::cli::Cli::parse();
    if let Err(e) = bootproxy::cmd::dispatch(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
