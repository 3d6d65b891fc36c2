/*!

`kubeaws-utils` is a collection of helpers shared by the kube-aws crates.
`net` contains functions for working with CIDR blocks and IP addresses.

!*/

use constants::{DEFAULT_LEVEL_FILTER, WORKSPACE_CRATES};
use env_logger::Builder;
pub use error::Error;
use log::{LevelFilter, SetLoggerError};
use std::env;

pub mod constants;
mod error;
pub mod net;

/// Extract the value of `RUST_LOG` if it exists, otherwise log this application and the
/// workspace crates at `log_level`, or `DEFAULT_LEVEL_FILTER` when none is given.
pub fn init_logger(bin_crate: &str, log_level: Option<LevelFilter>) -> Result<(), SetLoggerError> {
    match env::var(env_logger::DEFAULT_FILTER_ENV).ok() {
        Some(_) => {
            // RUST_LOG exists; env_logger will use it.
            Builder::from_default_env().try_init()
        }
        None => {
            let log_level = log_level.unwrap_or(DEFAULT_LEVEL_FILTER);
            let mut builder = Builder::new();
            // Set log level to Error for crates other than our own.
            builder
                .filter_level(LevelFilter::Error)
                .filter(Some(bin_crate), log_level);
            for name in WORKSPACE_CRATES {
                builder.filter(Some(*name), log_level);
            }
            builder.try_init()
        }
    }
}

/// Implement `Display` using `serde_json` `to_string_pretty` for types that implement Serialize.
#[macro_export]
macro_rules! impl_display_as_json {
    ($i:ident) => {
        impl std::fmt::Display for $i {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let s = serde_json::to_string_pretty(self)
                    .unwrap_or_else(|e| format!("Serialization failed: {}", e));
                std::fmt::Display::fmt(&s, f)
            }
        }
    };
}

#[test]
fn display_as_json_pretty_prints() {
    #[derive(serde::Serialize)]
    struct Example {
        name: &'static str,
    }
    impl_display_as_json!(Example);

    assert_eq!(
        Example { name: "test" }.to_string(),
        "{\n  \"name\": \"test\"\n}"
    );
}

#[test]
fn logger_initializes_once() {
    assert!(init_logger("kubeaws_utils", Some(LevelFilter::Debug)).is_ok());
    assert!(init_logger("kubeaws_utils", None).is_err());
}
