/*!
# DoS mitigation experiments

Reference topologies ([`Scenario`]) and attack-intensity sweeps ([`Sweep`])
built on [`dossim_core`].

```
use dossim::{Scenario, ScenarioConfig, Sweep};
use dossim_core::measure::Rate;

let results = Sweep::new(Scenario::Baseline, ScenarioConfig::default())
    .set_attack_rates([0, 20].map(Rate::from))
    .run()?;

let legitimate = results.legitimate();
assert!(legitimate[1] < legitimate[0]);
# Ok::<(), dossim::SweepError>(())
```
*/

pub mod scenario;
pub mod sweep;

// convenient re-export of `dossim_core` core objects
pub use dossim_core::{
    Delay, RunError, SimTime, Simulation, SimulationReport,
    measure::{Arrival, Rate, TrustRatio},
    traffic::{Admission, Label},
};

pub use self::{
    scenario::{Scenario, ScenarioConfig},
    sweep::{Sweep, SweepError, SweepResults},
};
