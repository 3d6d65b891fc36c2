//! The ordered checks a configuration must pass before it is assembled. Checks run one stage at a
//! time and stop at the first violation.

use crate::compat::Provenance;
use crate::error::{self, ConfigError, Error, Stage};
use kubeaws_model::constants::DEFAULT_RECORD_SET_TTL;
use kubeaws_model::ClusterConfig;
use log::{debug, warn};
use snafu::{ensure, ResultExt};

mod features;
mod network;
mod node_groups;

type Check = fn(&ClusterConfig, &Provenance) -> Result<(), ConfigError>;

const STAGES: [(Stage, Check); 9] = [
    (Stage::ClusterName, cluster_name),
    (Stage::RecordSet, record_set),
    (Stage::NetworkIdentity, network::network_identity),
    (Stage::Deployment, network::deployment),
    (Stage::Cidr, network::cidr),
    (Stage::Subnets, network::subnets),
    (Stage::NodeGroups, node_groups::node_groups),
    (Stage::DeprecatedFields, node_groups::deprecated_fields),
    (Stage::FeatureFlags, features::feature_flags),
];

const DISCOURAGED_INSTANCE_TYPES: [&str; 2] = ["t2.nano", "t2.micro"];

pub(crate) fn validate(config: &ClusterConfig, provenance: &Provenance) -> Result<(), Error> {
    for (stage, check) in STAGES {
        check(config, provenance).context(error::InvalidSnafu { stage })?;
        debug!("Passed {} checks", stage);
    }

    let controller_type = config.controller_settings.controller_instance_type.as_str();
    let etcd_type = config.etcd_settings.etcd_instance_type.as_str();
    if DISCOURAGED_INSTANCE_TYPES.contains(&controller_type)
        || DISCOURAGED_INSTANCE_TYPES.contains(&etcd_type)
    {
        warn!(
            "Instance types \"t2.nano\" and \"t2.micro\" are not recommended for controller or \
             etcd nodes (controllerInstanceType: {}, etcdInstanceType: {})",
            controller_type, etcd_type
        );
    }
    Ok(())
}

fn cluster_name(config: &ClusterConfig, _: &Provenance) -> Result<(), ConfigError> {
    let name = &config.deployment.cluster_name;
    ensure!(
        !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == ':'),
        error::MalformedClusterNameSnafu { name }
    );
    Ok(())
}

/// Record set settings are either all used or all left alone.
fn record_set(config: &ClusterConfig, _: &Provenance) -> Result<(), ConfigError> {
    if config.create_record_set {
        ensure!(
            !config.hosted_zone_id.is_empty(),
            error::HostedZoneIdMissingSnafu
        );
        ensure!(
            config.record_set_ttl >= 1,
            error::RecordSetTtlTooLowSnafu {
                ttl: config.record_set_ttl
            }
        );
    } else {
        ensure!(
            config.record_set_ttl == DEFAULT_RECORD_SET_TTL,
            error::RecordSetTtlModifiedSnafu
        );
        ensure!(
            config.hosted_zone_id.is_empty(),
            error::HostedZoneIdModifiedSnafu
        );
    }
    Ok(())
}
