use bhparticles::{ScenarioConfig, Scenario};
use bhparticles::{bench_forces, bench_step_curve};

use clap::Parser;
use anyhow::{Context, Result};

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

#[derive(Parser, Debug)]
struct Args {
    /// Scenario file under `scenarios/`
    #[arg(short, default_value = "two_stars.yaml")]
    file_name: String,

    /// Run this many steps instead of stopping at `t_end`
    #[arg(long)]
    steps: Option<u64>,

    /// Run the force benchmarks instead of a scenario
    #[arg(long)]
    bench: bool,
}

// load here to keep main clean
fn load_scenario_from_yaml(file_name: &str) -> Result<ScenarioConfig> {
    let config_path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios").join(file_name);
    let file = File::open(&config_path)
        .with_context(|| format!("failed to open scenario {}", config_path.display()))?;
    let reader = BufReader::new(file);
    let scenario_cfg: ScenarioConfig = serde_yaml::from_reader(reader)
        .with_context(|| format!("failed to parse scenario {}", config_path.display()))?;

    Ok(scenario_cfg)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    if args.bench {
        bench_forces();
        bench_step_curve();
        return Ok(());
    }

    let scenario_cfg = load_scenario_from_yaml(&args.file_name)?;
    let Scenario { mut simulation, t_end } = Scenario::build_scenario(scenario_cfg)?;

    let dt = simulation.params.step_dt();
    let steps = args.steps.unwrap_or_else(|| (t_end / dt).ceil().max(0.0) as u64);
    let report_every = (steps / 10).max(1);

    log::info!("running {} steps of dt={}", steps, dt);
    for _ in 0..steps {
        simulation.step()?;

        if simulation.steps_taken() % report_every == 0 {
            log::info!(
                "t={:.3}: {} particles, |p|={:.6e}, KE={:.6e}",
                simulation.time(),
                simulation.particles().len(),
                simulation.total_momentum().norm(),
                simulation.total_kinetic_energy()
            );
        }
    }

    for (i, p) in simulation.particles().iter().enumerate() {
        println!(
            "{:4} {:?}: x=({:.4}, {:.4}, {:.4}) v=({:.4}, {:.4}, {:.4}) m={}",
            i, p.kind, p.position.x, p.position.y, p.position.z, p.velocity.x, p.velocity.y, p.velocity.z, p.mass
        );
    }

    Ok(())
}
