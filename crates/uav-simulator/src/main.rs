//! UAV Radar Simulator CLI
//!
//! Runs the simulation without a server and prints every observer event to
//! stdout as one JSON line. Logs go to stderr.

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio::time::sleep;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uav_domain::Zone;
use uav_simulator::{SimulationConfig, Simulator};

#[derive(Parser, Debug)]
#[command(name = "uav-simulator")]
#[command(about = "Simulate UAV traffic inside a radar zone")]
struct Args {
    /// Radar center latitude
    #[arg(long, default_value = "37.761196", allow_hyphen_values = true)]
    latitude: f64,

    /// Radar center longitude
    #[arg(long, default_value = "112.531004", allow_hyphen_values = true)]
    longitude: f64,

    /// Radar altitude in meters
    #[arg(long, default_value = "200")]
    altitude: f64,

    /// Radar coverage radius in meters
    #[arg(short, long, default_value = "2000")]
    radius: f64,

    /// Maximum number of live UAVs
    #[arg(long, default_value = "15")]
    max_uavs: usize,

    /// UAVs spawned at startup
    #[arg(long, default_value = "5")]
    initial_uavs: usize,

    /// Growth cycle period in milliseconds
    #[arg(long, default_value = "3000")]
    growth_ms: u64,

    /// Motion cycle period in milliseconds
    #[arg(long, default_value = "2000")]
    motion_ms: u64,

    /// RNG seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Stop after this many seconds (runs until Ctrl+C otherwise)
    #[arg(short, long)]
    duration_secs: Option<u64>,
}

impl Args {
    fn config(&self) -> Result<SimulationConfig> {
        Ok(SimulationConfig {
            zone: Zone::new(self.latitude, self.longitude, self.altitude, self.radius)?,
            max_population: self.max_uavs,
            initial_population: self.initial_uavs,
            growth_period: Duration::from_millis(self.growth_ms),
            motion_period: Duration::from_millis(self.motion_ms),
            seed: self.seed,
            subscriber_buffer: SimulationConfig::default()
                .subscriber_buffer
                .max(self.max_uavs),
            ..SimulationConfig::default()
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive("uav_simulator=info".parse()?))
        .init();

    let args = Args::parse();
    let config = args.config()?;

    info!(
        "Starting UAV simulation: zone ({:.6}, {:.6}) r={}m, max {} UAVs",
        config.zone.latitude, config.zone.longitude, config.zone.radius, config.max_population
    );

    let mut simulator = Simulator::new(config)?;
    simulator.seed_population()?;

    let mut feed = simulator.broadcaster().subscribe()?;
    let engine = simulator.spawn();

    let printer = async {
        while let Some(event) = feed.recv().await {
            println!("{}", serde_json::to_string(&event)?);
        }
        Ok::<_, anyhow::Error>(())
    };

    let stop = async {
        match args.duration_secs {
            Some(secs) => sleep(Duration::from_secs(secs)).await,
            None => {
                if let Err(err) = tokio::signal::ctrl_c().await {
                    tracing::error!(error = %err, "Failed to listen for Ctrl+C");
                    std::future::pending::<()>().await;
                }
            }
        }
    };

    tokio::select! {
        result = printer => result?,
        () = stop => info!("Simulation stopped"),
    }

    engine.abort();
    Ok(())
}
