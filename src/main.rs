use clap::Parser;
use log::LevelFilter;
use os_flavor_selector::display::print_error;
use os_flavor_selector::{run_cli, Cli};

fn init_logging(debug: bool) {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.debug);

    if let Err(e) = run_cli(cli).await {
        print_error(&format!("Error: {}", e));
        std::process::exit(1);
    }
}
