use crate::compat::Provenance;
use crate::error::{self, ConfigError};
use kubeaws_model::ClusterConfig;
use snafu::ensure;

/// AWS limits the names of launch configurations and other generated resources.
const AWS_RESOURCE_NAME_LIMIT: usize = 63;
const IAM_ROLE_NAME_LIMIT: usize = 64;

pub(super) fn feature_flags(config: &ClusterConfig, _: &Provenance) -> Result<(), ConfigError> {
    let etcd = &config.etcd_settings;
    ensure!(
        etcd.etcd_data_volume_encrypted || etcd.etcd.kms_key_arn.is_empty(),
        error::EtcdKmsKeyWithoutEncryptionSnafu
    );

    let experimental = &config.deployment.experimental;
    for taint in &experimental.taints {
        ensure!(
            taint.effect.is_known(),
            error::InvalidTaintEffectSnafu {
                effect: taint.effect.to_string()
            }
        );
    }

    let cluster_name = &config.deployment.cluster_name;
    let controller = &config.controller_settings.controller;
    if experimental.aws_node_labels.enabled {
        let limit = node_labels_cluster_name_limit(controller.logical_name());
        ensure!(
            cluster_name.len() <= limit,
            error::AwsNodeLabelsNameTooLongSnafu {
                cluster_name,
                limit
            }
        );
    }

    if !controller.managed_iam_role_name.is_empty() {
        let name = format!(
            "{}-{}-PRK1CVQNY7XZ-{}-{}",
            cluster_name,
            config.nested_stack_name(),
            config.deployment.region,
            controller.managed_iam_role_name
        );
        ensure!(
            name.len() <= IAM_ROLE_NAME_LIMIT,
            error::IamRoleNameTooLongSnafu {
                length: name.len(),
                name,
                limit: IAM_ROLE_NAME_LIMIT,
            }
        );
    }
    Ok(())
}

/// Node labels are derived from launch configuration names, which look like
/// `<cluster>-<stack>-<id>-<logical name>LC-<id>`. The stack name part doesn't count against the
/// limit.
fn node_labels_cluster_name_limit(logical_name: &str) -> usize {
    let fixed = format!("--1N2C4K3LLBEDZ-{}LC-BC2S9P3JG2QD", logical_name);
    AWS_RESOURCE_NAME_LIMIT.saturating_sub(fixed.len())
}
