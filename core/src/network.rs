pub mod inspect;
pub mod reachability;

pub use inspect::{DefaultRoute, NetworkInspector, SystemInspector};
