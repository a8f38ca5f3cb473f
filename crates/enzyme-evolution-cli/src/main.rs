use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use enzyme_evolution_core::config::SimConfig;
use enzyme_evolution_core::genome::Genome;
use enzyme_evolution_core::Simulation;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "enzyme-evolution")]
#[command(about = "Bacteria evolving enzymes on a toroidal grid")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulation from a config file
    Run {
        /// Path to config file (JSON); defaults are used when omitted
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output directory for summary.json (optional)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Simulated time to run for
        #[arg(long, default_value_t = 1000.0)]
        until: f64,

        /// Simulated time between population samples
        #[arg(long, default_value_t = 10.0)]
        sample_every: f64,

        /// Override the seed from the config file
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Dump the default configuration to stdout
    DumpDefaultConfig,
    /// Decode a genome bit string into its header and enzymes
    Decode {
        /// Genome as a string of '0' and '1'
        genome: String,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<SimConfig> {
    let Some(path) = path else {
        return Ok(SimConfig::default());
    };
    let file = File::open(path).with_context(|| format!("failed to open config file {path:?}"))?;
    serde_json::from_reader(BufReader::new(file)).context("failed to parse config")
}

fn main() -> Result<()> {
    // RUST_LOG=info shows interval averages and run milestones.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();

    match cli.command {
        Commands::DumpDefaultConfig => {
            let config = SimConfig::default();
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::Decode { genome } => {
            let genome = Genome::parse(genome.trim()).context("failed to parse genome")?;
            println!("{}", serde_json::to_string_pretty(&genome.decode())?);
        }
        Commands::Run {
            config,
            out,
            until,
            sample_every,
            seed,
        } => {
            let mut sim_config = load_config(config.as_ref())?;
            if let Some(seed) = seed {
                sim_config.seed = seed;
            }
            sim_config.validate().context("config validation error")?;

            println!(
                "Simulating a {}x{} grid until t={until}...",
                sim_config.rows, sim_config.columns
            );
            let mut sim =
                Simulation::new(sim_config).context("failed to initialize simulation")?;
            let summary = sim
                .run_experiment(until, sample_every)
                .context("invalid experiment parameters")?;

            if let Some(out_dir) = out {
                std::fs::create_dir_all(&out_dir).context("failed to create output directory")?;
                let summary_path = out_dir.join("summary.json");
                let file = File::create(summary_path).context("failed to create summary file")?;
                serde_json::to_writer_pretty(file, &summary).context("failed to write summary")?;
                println!("Run complete. Results saved to {out_dir:?}");
            } else {
                println!(
                    "Run complete. Alive: {}, births: {}, deaths: {}",
                    summary.final_alive_count, summary.total_births, summary.total_deaths
                );
            }
            match summary.best_enzyme {
                Some(enzyme) => println!(
                    "Best enzyme: {enzyme} (efficiency {:.4})",
                    summary.best_efficiency
                ),
                None => println!("No target-nutrient feeding was recorded."),
            }
        }
    }
    Ok(())
}
