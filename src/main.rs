use beacon_positioning::{
    short_label, BeaconReading, BeaconScanner, FixFormatter, OutputFormat, Point, ReplayScanner,
    SimulatedScanner, SystemConfig,
};
use std::error::Error;

/// Receiver position used by the demo mode (meters)
const DEMO_RECEIVER: Point = Point::new(5.0, 3.0);

fn print_usage(program: &str) {
    eprintln!("Usage: {} <config.json> <readings.json> [--format text|json|csv]", program);
    eprintln!("   or: {} --demo [x y]", program);
    eprintln!("   or: {} --write-default-config <path>", program);
}

fn parse_format(value: &str) -> Result<OutputFormat, Box<dyn Error>> {
    match value {
        "text" => Ok(OutputFormat::Text),
        "json" => Ok(OutputFormat::Json),
        "csv" => Ok(OutputFormat::Csv),
        other => Err(format!("Unknown output format '{}'", other).into()),
    }
}

/// Replay recorded readings through the configured engine
fn replay(config_path: &str, readings_path: &str, format: OutputFormat) -> Result<(), Box<dyn Error>> {
    let config = SystemConfig::load(config_path)?;
    let readings: Vec<BeaconReading> = serde_json::from_str(&std::fs::read_to_string(readings_path)?)?;
    log::info!("Replaying {} readings from '{}'", readings.len(), readings_path);

    let mut engine = config.build_engine();
    let mut scanner = ReplayScanner::new(readings);
    scanner.start()?;

    let formatter = FixFormatter::new(format);
    if format == OutputFormat::Csv {
        println!("{}", FixFormatter::csv_header());
    }
    for fix in engine.poll(&mut scanner)? {
        println!("{}", formatter.format(&fix)?);
    }
    scanner.stop();

    let stats = engine.stats();
    log::info!(
        "{} readings, {} solves, {} fixes, {} without intersection, {} with too few beacons",
        stats.readings,
        stats.solves,
        stats.fixes,
        stats.no_intersection,
        stats.insufficient_beacons
    );

    if engine.last_fix().is_none() {
        return Err("No position could be computed from the readings".into());
    }
    Ok(())
}

/// Run the simulated scanner against the default layout
fn demo(receiver: Point) -> Result<(), Box<dyn Error>> {
    let config = SystemConfig::default();
    let mut engine = config.build_engine();

    println!("Beacon layout:");
    for beacon in &config.beacons {
        let screen = config.display.to_screen(&beacon.position);
        println!(
            "  {} at ({:.1}, {:.1}) m -> ({:.0}, {:.0}) px",
            short_label(&beacon.id),
            beacon.position.x,
            beacon.position.y,
            screen.x,
            screen.y
        );
    }

    let mut scanner = SimulatedScanner::new(&engine.solver().snapshot(), config.path_loss, receiver, 5)
        .with_noise(2.0, 42);
    scanner.start()?;

    let formatter = FixFormatter::new(OutputFormat::Text);
    for fix in engine.poll(&mut scanner)? {
        println!("{}", formatter.format(&fix)?);
    }
    scanner.stop();

    match engine.last_fix() {
        Some(fix) => println!(
            "True position ({:.2}, {:.2}) m, final estimate ({:.2}, {:.2}) m, error {:.2} m",
            receiver.x,
            receiver.y,
            fix.position.x,
            fix.position.y,
            fix.position.distance_to(&receiver)
        ),
        None => println!("No fix obtained"),
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map_or("beacon-positioning", |s| s.as_str());

    match args.get(1).map(|s| s.as_str()) {
        Some("--demo") => {
            let receiver = match (args.get(2), args.get(3)) {
                (Some(x), Some(y)) => Point::new(x.parse()?, y.parse()?),
                _ => DEMO_RECEIVER,
            };
            demo(receiver)
        }
        Some("--write-default-config") if args.len() == 3 => {
            SystemConfig::default().save(&args[2])?;
            Ok(())
        }
        Some(_) if args.len() == 3 || (args.len() == 5 && args[3] == "--format") => {
            let format = match args.get(4) {
                Some(value) => parse_format(value)?,
                None => OutputFormat::Text,
            };
            replay(&args[1], &args[2], format)
        }
        _ => {
            print_usage(program);
            Err("Invalid arguments".into())
        }
    }
}
