use log::LevelFilter;

/// The level our crates log at when `RUST_LOG` is not set.
pub const DEFAULT_LEVEL_FILTER: LevelFilter = LevelFilter::Info;

/// Crates of this workspace that follow the requested level.
pub const WORKSPACE_CRATES: &[&str] = &["kubeaws_model", "kubeaws_resolver", "kubeaws_utils"];
