mod args;
mod bluetooth;
mod config;
mod decoder;
mod models;
mod packaging;
mod utils;

use clap::Parser as _;
use log::{debug, error, info, warn};
use time::OffsetDateTime;
use tokio::time::sleep;

use args::Args;
use bluetooth::read_station;
use config::StationConfig;
use models::Packet;
use packaging::to_packet;
use utils::{duration_to_seconds, format_datetime, format_optional};

const DRIVER_NAME: &str = "W820";
const DRIVER_VERSION: &str = env!("CARGO_PKG_VERSION");

async fn main_loop(config: StationConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting {} collection, driver version {}", DRIVER_NAME, DRIVER_VERSION);

    // Rain counter of the previous packet, in cm
    let mut last_rain_total: Option<f64> = None;

    loop {
        let start_time = OffsetDateTime::now_utc();
        debug!("Reading station at: {}", format_datetime(&start_time));

        match read_station(&config).await {
            Ok(reading) if reading.is_valid() => {
                debug!("Decoded reading: {:?}", reading.fields());

                let packet = to_packet(&reading, OffsetDateTime::now_utc(), last_rain_total);
                last_rain_total = packet.rain_total;
                log_packet(&packet);
            }
            Ok(reading) => {
                warn!(
                    "Incomplete reading from {}, no temperature frame received ({} fields)",
                    config.mac,
                    reading.fields().len()
                );
            }
            Err(e) => {
                error!("Reading station {} failed: {}", config.mac, e);
            }
        }

        // Wait until next poll, minus the time the read took
        let elapsed = duration_to_seconds(OffsetDateTime::now_utc() - start_time);
        let wait_time = config.polling_interval.as_secs().saturating_sub(elapsed);
        if wait_time > 0 {
            debug!("Waiting {} seconds until next reading", wait_time);
            sleep(std::time::Duration::from_secs(wait_time)).await;
        }
    }
}

fn log_packet(packet: &Packet) {
    info!("Packet at {}:", format_datetime(&packet.date_time));
    info!(
        "  Indoor: {}, {}",
        format_optional(packet.in_temp, 1, "°C"),
        format_optional(packet.in_humidity.map(f64::from), 0, "%")
    );
    info!(
        "  Outdoor: {}, {}",
        format_optional(packet.out_temp, 1, "°C"),
        format_optional(packet.out_humidity.map(f64::from), 0, "%")
    );
    info!("  Barometer: {}", format_optional(packet.barometer, 1, "hPa"));
    info!(
        "  Wind: {} from {} (chill {})",
        format_optional(packet.wind_speed, 1, "km/h"),
        format_optional(packet.wind_dir, 1, "°"),
        format_optional(packet.wind_chill, 1, "°C")
    );
    info!(
        "  Rain: {} total, {} since last packet",
        format_optional(packet.rain_total, 2, "cm"),
        format_optional(packet.rain, 2, "cm")
    );
    info!("  UV index: {}", format_optional(packet.uv.map(f64::from), 0, ""));

    if packet.out_temp_battery_status == Some(true) {
        warn!("Outdoor sensor battery is low");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .format_timestamp_secs()
        .init();

    // Load configuration
    let config = match StationConfig::new(args.mac) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e);
        }
    };

    // Handle Ctrl+C gracefully
    let (tx, mut rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                let _ = tx.send(());
            }
            Err(e) => {
                // Keep the sender alive so the collection loop is not cancelled
                error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        }
    });

    // Run main loop or wait for shutdown signal
    tokio::select! {
        result = main_loop(config) => {
            match result {
                Ok(_) => info!("Program completed successfully"),
                Err(e) => error!("Fatal error: {}", e),
            }
        }
        _ = &mut rx => {
            info!("Program terminated by user. Exiting gracefully.");
        }
    }

    Ok(())
}
