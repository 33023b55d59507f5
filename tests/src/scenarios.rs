#![cfg(test)]

mod interface;
mod monitor;
mod recovery;
mod snapshot;

use std::sync::Arc;

use nanowatch_common::clock::ManualClock;
use nanowatch_common::models::ConfigurationMode;
use nanowatch_core::snapshot::NetworkSnapshotter;

use crate::fakes::{FakeBackend, FakeInspector};

/// A snapshotter over fakes, returned together with its collaborators.
fn snapshotter(
    inspector: FakeInspector,
    mode: ConfigurationMode,
) -> (Arc<NetworkSnapshotter>, Arc<FakeInspector>, Arc<FakeBackend>, Arc<ManualClock>) {
    let inspector = Arc::new(inspector);
    let backend = Arc::new(FakeBackend::new(mode));
    let clock = Arc::new(ManualClock::new());
    let snapshotter = Arc::new(NetworkSnapshotter::new(
        inspector.clone(),
        backend.clone(),
        clock.clone(),
        None,
    ));
    (snapshotter, inspector, backend, clock)
}
