/// Helper macro to avoid retyping the prefix of the environment variables exported to nodes.
/// When given no parameters, this returns the prefix. When given a string literal parameter it
/// appends the parameter to the prefix.
macro_rules! kube_aws_env {
    () => {
        "KUBE_AWS"
    };
    ($s:literal) => {
        concat!(kube_aws_env!(), "_", $s)
    };
}

// Versions
pub const K8S_VERSION: &str = "v1.5.5_coreos.0";

// Deployment defaults
pub const DEFAULT_CLUSTER_NAME: &str = "kubernetes";
pub const DEFAULT_VPC_CIDR: &str = "10.0.0.0/16";
pub const DEFAULT_INSTANCE_CIDR: &str = "10.0.0.0/24";
pub const DEFAULT_POD_CIDR: &str = "10.2.0.0/16";
pub const DEFAULT_SERVICE_CIDR: &str = "10.3.0.0/24";
pub const DEFAULT_DNS_SERVICE_IP: &str = "10.3.0.10";
pub const DEFAULT_RECORD_SET_TTL: i32 = 300;
pub const DEFAULT_TLS_CA_DURATION_DAYS: i32 = 365 * 10;
pub const DEFAULT_TLS_CERT_DURATION_DAYS: i32 = 365;

// Node group defaults
pub const DEFAULT_INSTANCE_TYPE: &str = "t2.medium";
pub const DEFAULT_CREATE_TIMEOUT: &str = "PT15M";
pub const DEFAULT_VOLUME_SIZE: i32 = 30;
pub const DEFAULT_CONTROLLER_COUNT: i32 = 1;
pub const DEFAULT_ETCD_COUNT: i32 = 1;
pub const MAX_ETCD_COUNT: i32 = 100;

// Volume limits
pub const MIN_IOPS: i32 = 100;
pub const MAX_IOPS: i32 = 2000;

// Feature flag defaults
pub const DEFAULT_AUDIT_LOG_MAX_AGE: i32 = 30;
pub const DEFAULT_AUDIT_LOG_PATH: &str = "/dev/stdout";
pub const DEFAULT_WEBHOOK_CACHE_TTL: &str = "5m0s";
pub const DEFAULT_EPHEMERAL_DISK: &str = "xvdb";
pub const DEFAULT_EPHEMERAL_FILESYSTEM: &str = "xfs";

// Logical names used by the stack template
pub const STACK_NAME: &str = "control-plane";
pub const VPC_LOGICAL_NAME: &str = "VPC";
pub const INTERNET_GATEWAY_LOGICAL_NAME: &str = "InternetGateway";
pub const CONTROLLER_LOGICAL_NAME: &str = "Controllers";

// Environment variables and paths on nodes
pub const STACK_NAME_ENV_VAR: &str = kube_aws_env!("STACK_NAME");
pub const ETCD_INDEX_ENV_VAR: &str = kube_aws_env!("ETCD_INDEX");
pub const ETCD_NODE_ENV_FILE: &str = "/var/run/coreos/etcd-node.env";

/// Route 53 prefixes hosted zone ids with this path.
pub const HOSTED_ZONE_ID_PREFIX: &str = "/hostedzone/";

/// The Kubernetes network plugin used by every node.
pub const K8S_NETWORK_PLUGIN: &str = "cni";

#[test]
fn kube_aws_env_macro_test() {
    assert_eq!("KUBE_AWS", kube_aws_env!());
    assert_eq!("KUBE_AWS_STACK_NAME", STACK_NAME_ENV_VAR);
    assert_eq!("KUBE_AWS_ETCD_INDEX", ETCD_INDEX_ENV_VAR);
}
