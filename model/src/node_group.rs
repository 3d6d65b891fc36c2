use crate::constants::{
    CONTROLLER_LOGICAL_NAME, DEFAULT_CONTROLLER_COUNT, DEFAULT_CREATE_TIMEOUT, DEFAULT_ETCD_COUNT,
    DEFAULT_INSTANCE_TYPE, DEFAULT_VOLUME_SIZE,
};
use crate::{Choice, Subnet};
use serde::{Deserialize, Serialize};
use serde_plain::{derive_display_from_serialize, derive_fromstr_from_deserialize};

/// EBS volume types supported for node volumes.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeType {
    Standard,
    Gp2,
    /// Provisioned IOPS.
    Io1,
}

impl VolumeType {
    /// Only provisioned-IOPS volumes take an IOPS setting.
    pub fn requires_iops(&self) -> bool {
        matches!(self, Self::Io1)
    }
}

impl Default for VolumeType {
    fn default() -> Self {
        Self::Gp2
    }
}

derive_display_from_serialize!(VolumeType);
derive_fromstr_from_deserialize!(VolumeType);

/// EC2 instance tenancy.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tenancy {
    Default,
    Dedicated,
    Host,
}

impl Default for Tenancy {
    fn default() -> Self {
        Self::Default
    }
}

derive_display_from_serialize!(Tenancy);
derive_fromstr_from_deserialize!(Tenancy);

/// A view of one volume's settings, gathered from the flat per-node-group fields.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VolumeSpec<'a> {
    /// The document field prefix, e.g. `workerRootVolume`.
    pub field: &'static str,
    pub volume_type: &'a Choice<VolumeType>,
    pub iops: i32,
    pub size: i32,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AutoScalingGroup {
    pub min_size: Option<i32>,
    pub max_size: i32,
    pub rolling_update_min_instances_in_service: Option<i32>,
}

impl AutoScalingGroup {
    /// Whether explicit bounds were given instead of a fixed count.
    pub fn has_bounds(&self) -> bool {
        self.min_size.map_or(false, |min| min != 0) || self.max_size != 0
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoadBalancer {
    pub private: bool,
    pub subnets: Vec<Subnet>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Controller {
    pub auto_scaling_group: AutoScalingGroup,
    pub managed_iam_role_name: String,
    /// Subnets referenced by name; resolved against the top-level subnets.
    pub subnets: Vec<Subnet>,
    pub load_balancer: LoadBalancer,
}

impl Controller {
    pub fn logical_name(&self) -> &'static str {
        CONTROLLER_LOGICAL_NAME
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ControllerSettings {
    pub controller: Controller,
    pub controller_count: i32,
    pub controller_create_timeout: String,
    pub controller_instance_type: String,
    pub controller_root_volume_type: Choice<VolumeType>,
    #[serde(rename = "controllerRootVolumeIOPS")]
    pub controller_root_volume_iops: i32,
    pub controller_root_volume_size: i32,
    pub controller_tenancy: Choice<Tenancy>,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            controller: Controller::default(),
            controller_count: DEFAULT_CONTROLLER_COUNT,
            controller_create_timeout: DEFAULT_CREATE_TIMEOUT.to_string(),
            controller_instance_type: DEFAULT_INSTANCE_TYPE.to_string(),
            controller_root_volume_type: Choice::default(),
            controller_root_volume_iops: 0,
            controller_root_volume_size: DEFAULT_VOLUME_SIZE,
            controller_tenancy: Choice::default(),
        }
    }
}

impl ControllerSettings {
    pub fn root_volume(&self) -> VolumeSpec<'_> {
        VolumeSpec {
            field: "controllerRootVolume",
            volume_type: &self.controller_root_volume_type,
            iops: self.controller_root_volume_iops,
            size: self.controller_root_volume_size,
        }
    }

    pub fn min_controller_count(&self) -> i32 {
        self.controller
            .auto_scaling_group
            .min_size
            .unwrap_or(self.controller_count)
    }

    pub fn max_controller_count(&self) -> i32 {
        match self.controller.auto_scaling_group.max_size {
            0 => self.controller_count,
            max => max,
        }
    }

    pub fn rolling_update_min_instances_in_service(&self) -> i32 {
        self.controller
            .auto_scaling_group
            .rolling_update_min_instances_in_service
            .unwrap_or_else(|| self.max_controller_count() - 1)
    }
}

/// Settings of the default worker group.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorkerSettings {
    /// Removed; workers are sized per node pool. Kept only so its presence can be reported.
    pub worker_count: Option<i32>,
    pub worker_create_timeout: String,
    pub worker_instance_type: String,
    pub worker_root_volume_type: Choice<VolumeType>,
    #[serde(rename = "workerRootVolumeIOPS")]
    pub worker_root_volume_iops: i32,
    pub worker_root_volume_size: i32,
    pub worker_spot_price: String,
    pub worker_security_group_ids: Vec<String>,
    pub worker_tenancy: Choice<Tenancy>,
    pub worker_topology_private: bool,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            worker_count: None,
            worker_create_timeout: DEFAULT_CREATE_TIMEOUT.to_string(),
            worker_instance_type: DEFAULT_INSTANCE_TYPE.to_string(),
            worker_root_volume_type: Choice::default(),
            worker_root_volume_iops: 0,
            worker_root_volume_size: DEFAULT_VOLUME_SIZE,
            worker_spot_price: String::new(),
            worker_security_group_ids: Vec::new(),
            worker_tenancy: Choice::default(),
            worker_topology_private: false,
        }
    }
}

impl WorkerSettings {
    pub fn root_volume(&self) -> VolumeSpec<'_> {
        VolumeSpec {
            field: "workerRootVolume",
            volume_type: &self.worker_root_volume_type,
            iops: self.worker_root_volume_iops,
            size: self.worker_root_volume_size,
        }
    }
}

/// Per-member etcd settings supplied by the user.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EtcdNodeSettings {
    pub name: String,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Etcd {
    /// Subnets referenced by name; resolved against the top-level subnets.
    pub subnets: Vec<Subnet>,
    pub nodes: Vec<EtcdNodeSettings>,
    /// The KMS key used to encrypt etcd data volumes.
    pub kms_key_arn: String,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EtcdSettings {
    pub etcd: Etcd,
    pub etcd_count: i32,
    pub etcd_instance_type: String,
    pub etcd_root_volume_size: i32,
    pub etcd_root_volume_type: Choice<VolumeType>,
    #[serde(rename = "etcdRootVolumeIOPS")]
    pub etcd_root_volume_iops: i32,
    pub etcd_data_volume_size: i32,
    pub etcd_data_volume_type: Choice<VolumeType>,
    #[serde(rename = "etcdDataVolumeIOPS")]
    pub etcd_data_volume_iops: i32,
    pub etcd_data_volume_ephemeral: bool,
    pub etcd_data_volume_encrypted: bool,
    pub etcd_tenancy: Choice<Tenancy>,
}

impl Default for EtcdSettings {
    fn default() -> Self {
        Self {
            etcd: Etcd::default(),
            etcd_count: DEFAULT_ETCD_COUNT,
            etcd_instance_type: DEFAULT_INSTANCE_TYPE.to_string(),
            etcd_root_volume_size: DEFAULT_VOLUME_SIZE,
            etcd_root_volume_type: Choice::default(),
            etcd_root_volume_iops: 0,
            etcd_data_volume_size: DEFAULT_VOLUME_SIZE,
            etcd_data_volume_type: Choice::default(),
            etcd_data_volume_iops: 0,
            etcd_data_volume_ephemeral: false,
            etcd_data_volume_encrypted: false,
            etcd_tenancy: Choice::default(),
        }
    }
}

impl EtcdSettings {
    pub fn root_volume(&self) -> VolumeSpec<'_> {
        VolumeSpec {
            field: "etcdRootVolume",
            volume_type: &self.etcd_root_volume_type,
            iops: self.etcd_root_volume_iops,
            size: self.etcd_root_volume_size,
        }
    }

    pub fn data_volume(&self) -> VolumeSpec<'_> {
        VolumeSpec {
            field: "etcdDataVolume",
            volume_type: &self.etcd_data_volume_type,
            iops: self.etcd_data_volume_iops,
            size: self.etcd_data_volume_size,
        }
    }
}

#[cfg(test)]
mod test {
    use super::{AutoScalingGroup, ControllerSettings};

    #[test]
    fn controller_counts_follow_auto_scaling_group() {
        let mut settings = ControllerSettings::default();
        assert_eq!(settings.min_controller_count(), 1);
        assert_eq!(settings.max_controller_count(), 1);
        assert_eq!(settings.rolling_update_min_instances_in_service(), 0);

        settings.controller.auto_scaling_group = AutoScalingGroup {
            min_size: Some(2),
            max_size: 5,
            rolling_update_min_instances_in_service: None,
        };
        assert!(settings.controller.auto_scaling_group.has_bounds());
        assert_eq!(settings.min_controller_count(), 2);
        assert_eq!(settings.max_controller_count(), 5);
        assert_eq!(settings.rolling_update_min_instances_in_service(), 4);
    }
}
