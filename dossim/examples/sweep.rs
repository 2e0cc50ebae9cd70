//! Sweep the attack rate and print the throughput seen at the victim.
//!
//! Run with:
//!   cargo run --example sweep -p dossim -- --scenario olad --trust 40%
//!
//! The output is CSV: one line per attack rate, one column per label seen
//! at the victim, plus the total legitimate throughput.

use anyhow::Result;
use clap::Parser;
use dossim::{
    Admission, Arrival, Rate, Scenario, ScenarioConfig, SimTime, Sweep, SweepResults, TrustRatio,
};
use indicatif::ProgressBar;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
struct Command {
    /// run only this scenario (baseline, scrubbing or olad)
    #[arg(long)]
    scenario: Option<Scenario>,

    #[arg(long, default_value = "100")]
    max_attack: u32,

    #[arg(long, default_value = "1")]
    step: usize,

    #[arg(long, default_value = "80s")]
    horizon: SimTime,

    #[arg(long, default_value = "10")]
    victim: Rate,

    #[arg(long, default_value = "7")]
    legitimate: Rate,

    #[arg(long, default_value = "40")]
    scrubber: Rate,

    #[arg(long, default_value = "80%")]
    trust: TrustRatio,

    /// `round-robin` or `sampled[:seed]`
    #[arg(long, default_value = "round-robin")]
    admission: Admission,

    /// `periodic` or `poisson[:seed]`
    #[arg(long, default_value = "periodic")]
    arrival: Arrival,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cmd = Command::parse();

    let config = ScenarioConfig {
        victim_rate: cmd.victim,
        legitimate_rate: cmd.legitimate,
        attacker_rate: Rate::ZERO,
        scrubber_rate: cmd.scrubber,
        trust: cmd.trust,
        admission: cmd.admission,
        arrival: cmd.arrival,
        horizon: cmd.horizon,
    };
    let attack_rates: Vec<Rate> = (0..=cmd.max_attack)
        .step_by(cmd.step.max(1))
        .map(Rate::from)
        .collect();

    let scenarios = match cmd.scenario {
        Some(scenario) => vec![scenario],
        None => Scenario::ALL.to_vec(),
    };

    for scenario in scenarios {
        let sweep = Sweep::new(scenario, config).set_attack_rates(attack_rates.iter().copied());

        let pb = ProgressBar::new(attack_rates.len() as u64);
        let results = sweep.run_with(|_, _| pb.inc(1))?;
        pb.finish_and_clear();

        print(&results);
        println!();
    }

    Ok(())
}

fn print(results: &SweepResults) {
    println!("# {}", results.scenario.title());

    let labels: Vec<_> = results.labels().collect();
    let header: Vec<_> = labels.iter().map(|label| label.as_str()).collect();
    println!("attack_rate,{},legitimate", header.join(","));

    let legitimate = results.legitimate();
    for (index, rate) in results.attack_rates.iter().enumerate() {
        let mut line = rate.per_sec().to_string();
        for label in &labels {
            let value = results
                .series(label.as_str())
                .and_then(|values| values.get(index))
                .copied()
                .unwrap_or_default();
            line.push_str(&format!(",{value}"));
        }
        line.push_str(&format!(",{:.4}", legitimate[index]));
        println!("{line}");
    }
}
