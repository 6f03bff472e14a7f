//! steer - weighted prefix router, main entry point.

use std::{error::Error, net::SocketAddr, sync::Arc, time::Duration};

use clap::{Parser, builder::BoolishValueParser};
use log::{error, info};
use tokio::net::TcpListener;

use steer_config::{
    Settings,
    default::{
        get_default_health_check_interval_secs, get_default_health_check_timeout_secs,
        get_default_log_level, get_default_port, get_default_routing_file,
    },
    loader::read_routing_rules,
    validator::{validate, validate_settings},
};
use steer_health::{HealthRefresher, HttpProbe};
use steer_lb::{Router, RoutingTable};

mod server;

#[derive(Parser, Debug)]
#[command(version, about = "Routes URL prefixes to weighted upstreams", long_about = None)]
struct Cli {
    /// Path to routing json file
    #[arg(long, env = "CONFIG_FPATH", default_value_t = get_default_routing_file())]
    fpath: String,

    /// Port for the web server
    #[arg(long, env = "PORT", default_value_t = get_default_port())]
    port: u16,

    /// Health check upstreams and never route to ones that are not ready.
    /// HEALTHCHECK takes true/false, yes/no, on/off or 1/0; anything else is rejected
    #[arg(long, env = "HEALTHCHECK", value_parser = BoolishValueParser::new())]
    healthcheck: bool,

    /// Timeout for a single health check
    #[arg(long, env = "HEALTHCHECK_TIMEOUT_SECONDS", default_value_t = get_default_health_check_timeout_secs())]
    healthcheck_timeout_seconds: u64,

    /// Pause between health check rounds
    #[arg(long, env = "HEALTHCHECK_INTERVAL_SECONDS", default_value_t = get_default_health_check_interval_secs())]
    healthcheck_interval_seconds: u64,

    #[arg(long, env = "LOG_LEVEL", default_value_t = get_default_log_level())]
    log_level: String,
}

impl From<Cli> for Settings {
    fn from(cli: Cli) -> Self {
        Settings {
            routing_file: cli.fpath,
            port: cli.port,
            health_check: cli.healthcheck,
            health_check_timeout_secs: cli.healthcheck_timeout_seconds,
            health_check_interval_secs: cli.healthcheck_interval_seconds,
            log_level: cli.log_level,
        }
    }
}

async fn run(settings: Settings) -> Result<(), Box<dyn Error + Send + Sync>> {
    validate_settings(&settings)?;

    let rules = read_routing_rules(&settings.routing_file)?;
    validate(&rules, settings.health_check)?;

    let table = Arc::new(RoutingTable::from_rules(&rules));
    let router = Arc::new(Router::new(table, settings.health_check));

    if settings.health_check {
        let probe = HttpProbe::new(Duration::from_secs(settings.health_check_timeout_secs))?;
        HealthRefresher::new(
            router.clone(),
            probe,
            Duration::from_secs(settings.health_check_interval_secs),
        )
        .spawn();
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    let listener = TcpListener::bind(addr).await?;
    info!("steer listening on http://{}", addr);

    server::serve(listener, router).await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    // before parsing, so .env values act as env fallbacks
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();
    let settings = Settings::from(cli);

    if let Err(err) = steer_utils::logger::init_logger(&settings.log_level) {
        eprintln!("Logger not initialized: {}", err);
    }

    if let Err(err) = dotenv {
        info!("Error loading .env file: {}. Using environment variables instead", err);
    }

    if let Err(err) = run(settings).await {
        error!("steer failed to start: {}", err);
        std::process::exit(1);
    }
}
