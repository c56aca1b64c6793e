use env_logger::Env;
use log::info;
use meridian_broker::{load_config, load_default_config};
use meridian_runner::{
    MarketMakerConfig, MeanReversionConfig, SessionConfig, StrategyConfig, TradingSession,
};

fn print_help() {
    eprintln!(
        r#"Meridian Runner - paper vs shadow trading session

USAGE:
    meridian-runner [OPTIONS]

OPTIONS:
    --config <PATH>     Load configuration from JSON file
    --ticks <N>         Number of quote updates (default: 120)
    --seed <N>          Quote feed seed (default: 7)
    --strategy <NAME>   mean-reversion or market-maker (default: mean-reversion)
    --help              Print this help message

ENVIRONMENT VARIABLES:
    RUST_LOG            Log level filter (default: info)

The session report is printed to stdout as JSON.
"#
    );
}

fn parse_number<T: std::str::FromStr>(flag: &str, value: Option<&String>) -> T {
    match value.and_then(|v| v.parse().ok()) {
        Some(n) => n,
        None => {
            eprintln!("Error: {} requires a numeric argument", flag);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    let mut config_path: Option<String> = None;
    let mut session = SessionConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            "--config" | "-c" => {
                i += 1;
                match args.get(i) {
                    Some(path) => config_path = Some(path.clone()),
                    None => {
                        eprintln!("Error: --config requires a path argument");
                        std::process::exit(1);
                    }
                }
            }
            "--ticks" => {
                i += 1;
                session.ticks = parse_number("--ticks", args.get(i));
            }
            "--seed" => {
                i += 1;
                session.feed.seed = parse_number("--seed", args.get(i));
            }
            "--strategy" => {
                i += 1;
                session.strategy = match args.get(i).map(String::as_str) {
                    Some("mean-reversion") => {
                        StrategyConfig::MeanReversion(MeanReversionConfig::default())
                    }
                    Some("market-maker") => StrategyConfig::MarketMaker(MarketMakerConfig::default()),
                    _ => {
                        eprintln!("Error: --strategy requires mean-reversion or market-maker");
                        std::process::exit(1);
                    }
                };
            }
            arg => {
                eprintln!("Unknown argument: {}", arg);
                print_help();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let config = match config_path {
        Some(path) => {
            info!("Loading configuration from: {}", path);
            load_config(&path)?
        }
        None => load_default_config()?,
    };
    config.validate()?;

    let report = TradingSession::new(config, session).run().await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
