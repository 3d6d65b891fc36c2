/*!

`kubeaws-resolver` turns a sparse `cluster.yaml` into a fully resolved cluster description.

A resolution pass runs these stages in order, and stops at the first failure:

- decode the document over the baseline configuration,
- apply defaults that depend on the document,
- rewrite legacy single-subnet and shared route table input into explicit subnets,
- resolve subnet references and derive NAT gateways,
- validate the result,
- assemble the final `Config` using an `ImageRegistry`.

```no_run
use kubeaws_resolver::{resolve, AssembleOptions, StaticImageRegistry};
# fn main() -> kubeaws_resolver::Result<()> {
let document = std::fs::read_to_string("cluster.yaml").unwrap_or_default();
let config = resolve(&document, &StaticImageRegistry::new(), &AssembleOptions::default())?;
println!("{}", config);
# Ok(())
# }
```

!*/

#![deny(
    clippy::expect_used,
    clippy::get_unwrap,
    clippy::panic,
    clippy::panic_in_result_fn,
    clippy::panicking_unwrap,
    clippy::unwrap_in_result,
    clippy::unwrap_used
)]

mod compat;
mod defaults;
mod derived;
mod error;
mod pipeline;
mod registry;
mod topology;
mod validate;

pub use compat::Provenance;
pub use defaults::{with_hosted_zone_id_prefix, with_trailing_dot};
pub use derived::{AssembleOptions, Config, EtcdNode};
pub use error::{ConfigError, Error, ErrorKind, Result, Stage};
pub use pipeline::{Decoded, Defaulted, Inferred, Migrated, Validated};
pub use registry::{ImageRegistry, RegistryError, StaticImageRegistry};
pub use topology::derive_nat_gateways;

/// Runs a whole resolution pass over a YAML document.
pub fn resolve<R>(document: &str, registry: &R, options: &AssembleOptions) -> Result<Config>
where
    R: ImageRegistry + ?Sized,
{
    Decoded::from_yaml_str(document)?
        .apply_defaults()
        .migrate()?
        .infer_topology()?
        .validate()?
        .assemble(registry, options)
}
