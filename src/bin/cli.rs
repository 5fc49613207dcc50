//! hotspot CLI - run the clustering engine over a file of reports
//!
//! Usage:
//!   hotspot-cli cluster <points.json> [--date <unix>] [--config <file>] [--output <file>]
//!   hotspot-cli score --likes <n> --total <m> [--config <file>]
//!
//! The points file is a JSON array of objects with `id`, `lat`, `lng`,
//! `kind` and optionally `created_at` and `triangulation`.

use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{SystemTime, UNIX_EPOCH};

use hotspot::{
    ClusteringEngine, EngineConfig, GpsPoint, NotificationPoint, Result, ScoringModel,
    TriangulationVector,
};

#[derive(Parser)]
#[command(name = "hotspot-cli")]
#[command(about = "Cluster geotagged reports and score them", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON configuration file (defaults to $CONFIG / $CONFIG_INLINE)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Cluster reports and write the resulting snapshot
    Cluster {
        /// JSON file with an array of reports
        input: PathBuf,

        /// Target date in unix seconds (default: now)
        #[arg(short, long)]
        date: Option<i64>,

        /// Write the snapshot JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Score a report from its reaction counts
    Score {
        #[arg(long)]
        likes: u32,

        #[arg(long)]
        total: u32,
    },
}

#[derive(Deserialize)]
struct InputPoint {
    id: String,
    lat: f64,
    lng: f64,
    kind: String,
    #[serde(default)]
    created_at: i64,
    #[serde(default)]
    triangulation: Option<[f64; 3]>,
}

impl From<InputPoint> for NotificationPoint {
    fn from(p: InputPoint) -> Self {
        let position = GpsPoint::new(p.lat, p.lng);
        Self {
            id: p.id,
            position,
            triangulation: p
                .triangulation
                .map(TriangulationVector)
                .unwrap_or_else(|| TriangulationVector::from_point(&position)),
            kind: p.kind,
            created_at: p.created_at,
        }
    }
}

fn main() -> ExitCode {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| writeln!(buf, "[{:5}] {}", record.level(), record.args()))
        .init();

    let cli = Cli::parse();

    let outcome = load_config(cli.config.as_deref()).and_then(|config| match cli.command {
        Commands::Cluster {
            input,
            date,
            output,
        } => run_cluster(config, &input, date, output.as_deref()),
        Commands::Score { likes, total } => {
            let model = ScoringModel::from_config(&config.scoring);
            println!("{:.5}", model.score(likes, total));
            Ok(())
        }
    });

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::from_file(path),
        None => EngineConfig::from_env(),
    }
}

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn run_cluster(config: EngineConfig, input: &Path, date: Option<i64>, output: Option<&Path>) -> Result<()> {
    let reader = BufReader::new(File::open(input)?);
    let raw: Vec<InputPoint> = serde_json::from_reader(reader)?;
    let points: Vec<NotificationPoint> = raw.into_iter().map(NotificationPoint::from).collect();

    let engine = ClusteringEngine::new(config)?;
    let date = date.unwrap_or_else(now_secs);

    let Some(snapshot) = engine.run(&points, date)? else {
        println!("No clusters among {} reports", points.len());
        return Ok(());
    };

    println!("\n{}", "=".repeat(60));
    println!("{} clusters from {} reports", snapshot.clusters.len(), points.len());
    println!("{}", "=".repeat(60));
    for cluster in &snapshot.clusters {
        println!(
            "  #{:<3} {:>4} reports  kinds [{}]  rings {}  N{:.5} S{:.5} E{:.5} W{:.5}",
            cluster.cluster_id,
            cluster.count,
            cluster.kinds.join(", "),
            cluster.polygon.rings.len(),
            cluster.north,
            cluster.south,
            cluster.east,
            cluster.west
        );
    }

    match output {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(path)?);
            serde_json::to_writer_pretty(&mut writer, &snapshot)?;
            writer.flush()?;
            println!("\nSnapshot written to {}", path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&snapshot)?),
    }
    Ok(())
}
