use crate::constants::{
    DEFAULT_AUDIT_LOG_MAX_AGE, DEFAULT_AUDIT_LOG_PATH, DEFAULT_EPHEMERAL_DISK,
    DEFAULT_EPHEMERAL_FILESYSTEM, DEFAULT_WEBHOOK_CACHE_TTL,
};
use crate::Choice;
use serde::{Deserialize, Serialize};
use serde_plain::{derive_display_from_serialize, derive_fromstr_from_deserialize};
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Optional capabilities layered onto the base cluster. Each capability carries its own enabled
/// flag; its other parameters are left untouched when it is disabled.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Experimental {
    pub admission: Admission,
    pub audit_log: AuditLog,
    pub authentication: Authentication,
    pub aws_environment: AwsEnvironment,
    pub aws_node_labels: Toggle,
    pub cluster_autoscaler_support: Toggle,
    pub ephemeral_image_storage: EphemeralImageStorage,
    #[serde(rename = "kube2IamSupport")]
    pub kube2iam_support: Toggle,
    pub load_balancer: LoadBalancerAttachment,
    pub target_group: TargetGroupAttachment,
    pub node_drainer: Toggle,
    pub node_labels: NodeLabels,
    pub plugins: Plugins,
    pub disable_security_group_ingress: bool,
    pub node_monitor_grace_period: String,
    pub taints: Vec<Taint>,
    /// Flags this version doesn't know about, preserved as written.
    #[serde(flatten)]
    pub unknown_keys: BTreeMap<String, Value>,
}

/// A capability with no parameters besides its flag.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Toggle {
    pub enabled: bool,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Admission {
    pub pod_security_policy: Toggle,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditLog {
    pub enabled: bool,
    #[serde(rename = "maxage")]
    pub max_age: i32,
    #[serde(rename = "logpath")]
    pub log_path: String,
}

impl Default for AuditLog {
    fn default() -> Self {
        Self {
            enabled: false,
            max_age: DEFAULT_AUDIT_LOG_MAX_AGE,
            log_path: DEFAULT_AUDIT_LOG_PATH.to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Authentication {
    pub webhook: Webhook,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Webhook {
    pub enabled: bool,
    #[serde(rename = "cacheTTL")]
    pub cache_ttl: String,
    #[serde(rename = "configBase64")]
    pub config: String,
}

impl Default for Webhook {
    fn default() -> Self {
        Self {
            enabled: false,
            cache_ttl: DEFAULT_WEBHOOK_CACHE_TTL.to_string(),
            config: String::new(),
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AwsEnvironment {
    pub enabled: bool,
    pub environment: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EphemeralImageStorage {
    pub enabled: bool,
    pub disk: String,
    pub filesystem: String,
}

impl Default for EphemeralImageStorage {
    fn default() -> Self {
        Self {
            enabled: false,
            disk: DEFAULT_EPHEMERAL_DISK.to_string(),
            filesystem: DEFAULT_EPHEMERAL_FILESYSTEM.to_string(),
        }
    }
}

/// Attach controllers to existing classic load balancers.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoadBalancerAttachment {
    pub enabled: bool,
    pub names: Vec<String>,
    pub security_group_ids: Vec<String>,
}

/// Attach controllers to existing target groups.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TargetGroupAttachment {
    pub enabled: bool,
    pub arns: Vec<String>,
    pub security_group_ids: Vec<String>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Plugins {
    pub rbac: Toggle,
}

/// Labels passed to the kubelet. The capability is enabled whenever at least one label is set.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeLabels(pub BTreeMap<String, String>);

impl NodeLabels {
    pub fn enabled(&self) -> bool {
        !self.0.is_empty()
    }
}

/// Renders `key=value` pairs sorted by key and joined by `,` as the kubelet's `--node-labels`
/// flag expects them.
impl Display for NodeLabels {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let labels = self
            .0
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>();
        Display::fmt(&labels.join(","), f)
    }
}

/// Scheduling effects a node taint may use.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum TaintEffect {
    NoSchedule,
    PreferNoSchedule,
}

derive_display_from_serialize!(TaintEffect);
derive_fromstr_from_deserialize!(TaintEffect);

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Taint {
    pub key: String,
    #[serde(default)]
    pub value: String,
    pub effect: Choice<TaintEffect>,
}

impl Display for Taint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}:{}", self.key, self.value, self.effect)
    }
}

/// Whether nodes signal the stack once they are up. Unset fields fall back to enabled with a
/// batch size of one.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WaitSignal {
    pub enabled: Option<bool>,
    pub max_batch_size: Option<i32>,
}

impl WaitSignal {
    pub fn enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    pub fn max_batch_size(&self) -> i32 {
        self.max_batch_size.unwrap_or(1)
    }
}
