//! Basic example: one attack rate, the three topologies side by side.
//!
//! Run with:
//!   cargo run --example basic -p dossim -- --attacker 50

use anyhow::Result;
use clap::Parser;
use dossim::{Rate, Scenario, ScenarioConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
struct Command {
    #[arg(long, default_value = "50")]
    attacker: Rate,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cmd = Command::parse();
    let config = ScenarioConfig {
        attacker_rate: cmd.attacker,
        ..ScenarioConfig::default()
    };

    println!(
        "victim {}, legitimate {}, attacker {}, scrubber {}, trust {}, horizon {}",
        config.victim_rate,
        config.legitimate_rate,
        config.attacker_rate,
        config.scrubber_rate,
        config.trust,
        config.horizon,
    );
    println!();

    for scenario in Scenario::ALL {
        let report = scenario.run(&config)?;

        println!("{}", scenario.title());
        for (label, sink) in &report.sinks {
            println!(
                "  {label}: received {}, serviced {}, backlog {} (peak {}), utilization {:.1}%",
                sink.received,
                sink.serviced,
                sink.backlog,
                sink.peak_backlog,
                sink.utilization(config.horizon.as_secs()) * 100.0,
            );
            if let Some(relay) = sink.relay {
                println!(
                    "    forwarded {}, absorbed {}",
                    relay.forwarded, relay.absorbed
                );
            }
            for (flow, rate) in sink.effective_rates() {
                println!("    {flow}: {rate}/s");
            }
        }
        println!(
            "  legitimate throughput at the victim: {:.4}/s",
            scenario.legitimate_throughput(&report)
        );
        println!();
    }

    Ok(())
}
