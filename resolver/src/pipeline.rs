//! The resolution pass as a chain of states. Each state can only be produced from the one before
//! it, so defaulting always precedes the compatibility rewrite, which precedes topology inference,
//! which precedes validation and assembly.

use crate::compat::{self, Provenance};
use crate::derived::{self, AssembleOptions, Config};
use crate::error::{self, Result, Stage};
use crate::registry::ImageRegistry;
use crate::{defaults, topology, validate};
use kubeaws_model::{ClusterConfig, Configuration, NatGateway};
use log::info;
use snafu::ResultExt;

/// A document overlaid onto the baseline configuration.
#[derive(Debug, Clone)]
pub struct Decoded {
    config: ClusterConfig,
}

impl Decoded {
    pub fn from_yaml_str(document: &str) -> Result<Self> {
        let config = ClusterConfig::from_yaml_str(document).context(error::DecodeSnafu)?;
        info!("Decoded cluster '{}'", config.deployment.cluster_name);
        Ok(Self { config })
    }

    /// Starts a pass from a configuration built in code.
    pub fn new(config: ClusterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    pub fn apply_defaults(self) -> Defaulted {
        Defaulted {
            config: defaults::apply(self.config),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Defaulted {
    config: ClusterConfig,
}

impl Defaulted {
    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Rewrites legacy single-subnet and shared route table input into explicit subnets.
    pub fn migrate(self) -> Result<Migrated> {
        let (config, provenance) = compat::migrate(self.config).context(error::InvalidSnafu {
            stage: Stage::Compatibility,
        })?;
        Ok(Migrated { config, provenance })
    }
}

#[derive(Debug, Clone)]
pub struct Migrated {
    config: ClusterConfig,
    provenance: Provenance,
}

impl Migrated {
    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    pub fn provenance(&self) -> Provenance {
        self.provenance
    }

    pub fn infer_topology(self) -> Result<Inferred> {
        let (config, nat_gateways) = topology::infer(self.config).context(error::InvalidSnafu {
            stage: Stage::Topology,
        })?;
        info!("Inferred topology with {} NAT gateways", nat_gateways.len());
        Ok(Inferred {
            config,
            provenance: self.provenance,
            nat_gateways,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Inferred {
    config: ClusterConfig,
    provenance: Provenance,
    nat_gateways: Vec<NatGateway>,
}

impl Inferred {
    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    pub fn nat_gateways(&self) -> &[NatGateway] {
        &self.nat_gateways
    }

    /// Runs every validation stage, stopping at the first failure.
    pub fn validate(self) -> Result<Validated> {
        validate::validate(&self.config, &self.provenance)?;
        info!("Validated cluster '{}'", self.config.deployment.cluster_name);
        Ok(Validated {
            config: self.config,
            nat_gateways: self.nat_gateways,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Validated {
    config: ClusterConfig,
    nat_gateways: Vec<NatGateway>,
}

impl Validated {
    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    pub fn nat_gateways(&self) -> &[NatGateway] {
        &self.nat_gateways
    }

    pub fn assemble<R>(self, registry: &R, options: &AssembleOptions) -> Result<Config>
    where
        R: ImageRegistry + ?Sized,
    {
        derived::assemble(self.config, self.nat_gateways, registry, options)
    }
}
