mod cargo_tree;

pub use cargo_tree::CargoTreeProbe;

use std::time::Duration;

use relnote_probe_api::DependencyProbe;

/// Probe used by the binary: `cargo tree`, bounded by `timeout` per query.
#[must_use]
pub fn default_probe(timeout: Duration) -> Box<dyn DependencyProbe> {
    Box::new(CargoTreeProbe::new().with_timeout(timeout))
}
