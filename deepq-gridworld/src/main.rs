use anyhow::Result;
use clap::Parser;
use deepq_core::{StateMonitor, StatePoller};
use deepq_gridworld::{train, GridState, GridWorldDqnConfig};
use log::{debug, info};
use std::{path::PathBuf, time::Duration};

const POLL_PERIOD: Duration = Duration::from_millis(33);

/// Train a DQN agent in the four-rooms grid world
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// YAML file with the run configuration; defaults are used if omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overrides the number of training steps
    #[arg(long)]
    total_training_steps: Option<usize>,

    /// Overrides all random seeds
    #[arg(long)]
    seed: Option<u64>,

    /// Log the position of the agent from a polling thread
    #[arg(long, default_value_t = false)]
    live_poll: bool,

    /// Write the resolved configuration to this file and exit
    #[arg(long)]
    write_config: Option<PathBuf>,
}

fn resolve_config(args: &Args) -> Result<GridWorldDqnConfig> {
    let mut config = match &args.config {
        Some(path) => GridWorldDqnConfig::load(path)?,
        None => GridWorldDqnConfig::default(),
    };
    if let Some(v) = args.total_training_steps {
        config = config.total_training_steps(v);
    }
    if let Some(seed) = args.seed {
        config = config.seed(seed);
    }
    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let config = resolve_config(&args)?;

    if let Some(path) = &args.write_config {
        config.save(path)?;
        info!("Wrote configuration to {}", path.display());
        return Ok(());
    }

    let (monitor, poller) = match args.live_poll {
        true => {
            let monitor = StateMonitor::new();
            let poller = StatePoller::spawn(monitor.clone(), POLL_PERIOD, |s: GridState| {
                debug!("agent at ({}, {})", s.x, s.y)
            });
            (Some(monitor), Some(poller))
        }
        false => (None, None),
    };

    let report = train(&config, monitor)?;
    if let Some(poller) = poller {
        poller.stop();
    }

    let counters = report.counters;
    info!(
        "Done: {} steps, {} episodes, {} updates, {} target syncs",
        counters.env_steps, counters.episodes, counters.opt_steps, counters.target_syncs
    );
    if let Some((t, stats)) = report.evaluations.last() {
        info!(
            "Last evaluation at step {}: mean return {:.3}, mean episode length {:.1}",
            t,
            stats.mean_return(),
            stats.mean_episode_length()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn overrides_apply_on_top_of_the_file() -> Result<()> {
        let dir = TempDir::new("gridworld_args")?;
        let path = dir.path().join("config.yaml");
        GridWorldDqnConfig::default()
            .total_training_steps(123)
            .save(&path)?;

        let args = Args::parse_from([
            "deepq-gridworld",
            "--config",
            path.to_str().unwrap(),
            "--seed",
            "5",
        ]);
        let config = resolve_config(&args)?;
        assert_eq!(config.trainer.total_training_steps, 123);
        assert_eq!(config.replay_memory.seed, 5);

        let args = Args::parse_from(["deepq-gridworld", "--total-training-steps", "10"]);
        assert_eq!(resolve_config(&args)?.trainer.total_training_steps, 10);
        Ok(())
    }
}
