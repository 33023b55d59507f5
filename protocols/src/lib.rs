//! Wire formats spoken by the monitor's own probes.

pub mod dns;
