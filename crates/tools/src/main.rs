use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use formats::{FeatureSource, parse_search_response};
use foundation::Millis;
use navigation::{EventFamily, OrientationEvent, PositionService, TrackingConfig};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tools::{flight_plan, heading, leg, load_config, overlay, overlay_for, parse_lat_lon, simulate};

#[derive(Parser, Debug)]
#[command(author, version, about = "Geo, position and view tooling for the tour map")]
struct Args {
    /// JSON config file (partial configs are merged over defaults)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initial bearing from one point to another
    Bearing {
        /// LAT,LON
        from: String,
        /// LAT,LON
        to: String,
    },

    /// Great-circle distance in meters
    Distance { from: String, to: String },

    /// Run the position simulator
    Simulate {
        /// Number of steps after the seed position
        #[arg(long, default_value_t = 10)]
        steps: u32,

        /// Seed position as LAT,LON (defaults to the configured fallback)
        #[arg(long)]
        seed: Option<String>,

        /// Pace steps on the wall clock instead of a virtual one
        #[arg(long)]
        realtime: bool,

        /// Override the step interval
        #[arg(long)]
        interval_ms: Option<u64>,
    },

    /// Generate one ambient flight loop
    FlightPlan {
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Describe how a GeoJSON file would be drawn as an overlay
    Overlay {
        file: PathBuf,

        /// Apply search-result filtering instead of taking the first feature
        #[arg(long)]
        search: bool,
    },

    /// Look up a place and describe the polygon that would be shown
    Search { query: String },

    /// Compute the heading arrow for one orientation reading
    Heading {
        /// Device position as LAT,LON
        #[arg(long)]
        at: String,

        /// Target as LAT,LON (defaults to the configured target)
        #[arg(long)]
        target: Option<String>,

        #[arg(long)]
        alpha: Option<f64>,

        #[arg(long)]
        webkit_compass_heading: Option<f64>,

        #[arg(long)]
        absolute: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = real_main(Args::parse()).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn real_main(args: Args) -> Result<(), String> {
    let config = load_config(args.config.as_deref())?;

    match args.command {
        Command::Bearing { from, to } | Command::Distance { from, to } => {
            let report = leg(parse_lat_lon(&from)?, parse_lat_lon(&to)?);
            print_json(&report)
        }
        Command::Simulate {
            steps,
            seed,
            realtime,
            interval_ms,
        } => {
            let mut cfg = config.simulator.clone();
            if let Some(ms) = interval_ms {
                cfg.interval_ms = ms.max(1);
            }
            let seed = seed
                .as_deref()
                .map(parse_lat_lon)
                .transpose()?
                .map(|p| foundation::Position::new(p.lat, p.lon, cfg.accuracy_m));
            if realtime {
                simulate_realtime(cfg, seed, steps).await
            } else {
                print_json(&simulate(&cfg, seed, steps))
            }
        }
        Command::FlightPlan { seed } => print_json(&flight_plan(&config.flight, seed)),
        Command::Overlay { file, search } => {
            let payload =
                std::fs::read_to_string(&file).map_err(|e| format!("read {file:?}: {e}"))?;
            let source = if search {
                FeatureSource::Search
            } else {
                FeatureSource::Local
            };
            match overlay(&payload, source)? {
                Some(report) => print_json(&report),
                None => Err(format!("{file:?}: no displayable feature")),
            }
        }
        Command::Search { query } => search(&config.search, &query).await,
        Command::Heading {
            at,
            target,
            alpha,
            webkit_compass_heading,
            absolute,
        } => {
            let at = parse_lat_lon(&at)?;
            let target = match target {
                Some(t) => parse_lat_lon(&t)?,
                None => config
                    .target
                    .ok_or_else(|| "no --target and no target in config".to_string())?,
            };
            let family = if absolute {
                EventFamily::DeviceOrientationAbsolute
            } else {
                EventFamily::DeviceOrientation
            };
            let event = OrientationEvent {
                family,
                webkit_compass_heading,
                alpha,
                absolute,
            };
            match heading(&config.orientation, at, target, event) {
                Some(sample) => print_json(&sample),
                None => Err("reading carries no usable heading".to_string()),
            }
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value).map_err(|e| format!("json: {e}"))?;
    println!("{text}");
    Ok(())
}

async fn simulate_realtime(
    cfg: navigation::SimulatorConfig,
    seed: Option<foundation::Position>,
    steps: u32,
) -> Result<(), String> {
    let started = Instant::now();
    let elapsed = || Millis(started.elapsed().as_millis() as u64);
    let interval = Duration::from_millis(cfg.interval_ms);

    let mut service = PositionService::new(TrackingConfig::default(), cfg);
    service
        .positions
        .subscribe(|p| println!("{}", serde_json::to_string(p).unwrap_or_default()));
    if !service.begin_simulation(seed, elapsed()) {
        return Err("simulation refused".to_string());
    }

    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await;
    let mut published = 0;
    while published < steps as usize {
        ticker.tick().await;
        if service.tick(elapsed()) {
            published += 1;
        }
    }
    info!(updates = service.metrics().counter("position.updates"), "simulation finished");
    Ok(())
}

async fn search(cfg: &formats::PlaceSearchConfig, query: &str) -> Result<(), String> {
    let client = reqwest::Client::builder()
        .user_agent(concat!("wayfarer/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| format!("http client: {e}"))?;
    let resp = client
        .get(&cfg.endpoint)
        .query(&cfg.query_params(query))
        .send()
        .await
        .map_err(|e| format!("search request: {e}"))?;
    if !resp.status().is_success() {
        return Err(format!("search HTTP error: {}", resp.status()));
    }
    let body = resp.text().await.map_err(|e| format!("search body: {e}"))?;
    match parse_search_response(&body) {
        Some(feature) => print_json(&overlay_for(&feature, 1)),
        None => {
            warn!(query, "no polygonal result");
            Err(format!("no area found for {query:?}"))
        }
    }
}
