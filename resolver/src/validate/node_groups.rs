use crate::compat::Provenance;
use crate::error::{self, ConfigError};
use kubeaws_model::constants::{DEFAULT_CONTROLLER_COUNT, MAX_ETCD_COUNT, MAX_IOPS, MIN_IOPS};
use kubeaws_model::{ClusterConfig, Tenancy, VolumeSpec};
use snafu::{ensure, OptionExt};

pub(super) fn node_groups(config: &ClusterConfig, _: &Provenance) -> Result<(), ConfigError> {
    let volumes = [
        config.worker_settings.root_volume(),
        config.controller_settings.root_volume(),
        config.etcd_settings.root_volume(),
        config.etcd_settings.data_volume(),
    ];
    for volume in &volumes {
        check_volume(volume)?;
    }

    let controller = &config.controller_settings;
    ensure!(
        controller.controller_count >= 0,
        error::NegativeCountSnafu {
            field: "controllerCount"
        }
    );
    ensure!(
        config.etcd_settings.etcd_count >= 0,
        error::NegativeCountSnafu { field: "etcdCount" }
    );
    ensure!(
        config.etcd_settings.etcd_count <= MAX_ETCD_COUNT,
        error::EtcdCountTooLargeSnafu {
            count: config.etcd_settings.etcd_count,
            max: MAX_ETCD_COUNT
        }
    );

    // The count stays at its default when the group is sized by its bounds.
    let auto_scaling_group = &controller.controller.auto_scaling_group;
    ensure!(
        controller.controller_count == DEFAULT_CONTROLLER_COUNT || !auto_scaling_group.has_bounds(),
        error::CountWithAutoScalingBoundsSnafu
    );
    let min = controller.min_controller_count();
    let max = controller.max_controller_count();
    ensure!(min >= 0, error::NegativeMinSizeSnafu { min });
    ensure!(max >= min, error::MaxBelowMinSnafu { min, max });
    if let Some(min_in_service) = auto_scaling_group.rolling_update_min_instances_in_service {
        ensure!(
            min_in_service <= max,
            error::MinInServiceAboveMaxSnafu {
                min_in_service,
                max
            }
        );
    }

    let worker = &config.worker_settings;
    ensure!(
        worker.worker_spot_price.is_empty() || worker.worker_tenancy.is(&Tenancy::Default),
        error::SpotPriceTenancySnafu {
            tenancy: worker.worker_tenancy.to_string()
        }
    );
    Ok(())
}

pub(super) fn deprecated_fields(config: &ClusterConfig, _: &Provenance) -> Result<(), ConfigError> {
    ensure!(
        config.worker_settings.worker_count.is_none(),
        error::WorkerCountRemovedSnafu
    );
    Ok(())
}

/// Only provisioned-IOPS volumes take an IOPS value, which must be within the EBS limits.
fn check_volume(volume: &VolumeSpec<'_>) -> Result<(), ConfigError> {
    let volume_type = volume
        .volume_type
        .get()
        .with_context(|| error::InvalidVolumeTypeSnafu {
            field: format!("{}Type", volume.field),
            value: volume.volume_type.to_string(),
        })?;
    if volume_type.requires_iops() {
        ensure!(
            (MIN_IOPS..=MAX_IOPS).contains(&volume.iops),
            error::InvalidIopsSnafu {
                field: format!("{}IOPS", volume.field),
                iops: volume.iops,
            }
        );
    } else {
        ensure!(
            volume.iops == 0,
            error::UnexpectedIopsSnafu {
                field: format!("{}IOPS", volume.field),
                volume_type: volume_type.to_string(),
                iops: volume.iops,
            }
        );
    }
    ensure!(
        volume.size > 0,
        error::InvalidVolumeSizeSnafu {
            field: format!("{}Size", volume.field),
            size: volume.size,
        }
    );
    Ok(())
}
