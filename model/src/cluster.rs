use crate::constants::{
    DEFAULT_CLUSTER_NAME, DEFAULT_DNS_SERVICE_IP, DEFAULT_POD_CIDR, DEFAULT_RECORD_SET_TTL,
    DEFAULT_SERVICE_CIDR, DEFAULT_TLS_CA_DURATION_DAYS, DEFAULT_TLS_CERT_DURATION_DAYS,
    DEFAULT_VPC_CIDR, INTERNET_GATEWAY_LOGICAL_NAME, K8S_NETWORK_PLUGIN, K8S_VERSION, STACK_NAME,
    VPC_LOGICAL_NAME,
};
use crate::subnet::resource_name;
use crate::{
    Choice, Configuration, ContainerRuntime, ControllerSettings, EtcdSettings, Experimental,
    ImageSettings, Region, ReleaseChannel, Subnet, WaitSignal, WorkerSettings,
};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::BTreeMap;

/// Settings shared by controller and worker nodes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KubeClusterSettings {
    /// The name the API server is reachable under.
    #[serde(rename = "externalDNSName")]
    pub external_dns_name: String,
    /// The cluster DNS service address, within the service CIDR.
    #[serde(rename = "dnsServiceIP")]
    pub dns_service_ip: String,
    pub use_calico: bool,
}

impl Default for KubeClusterSettings {
    fn default() -> Self {
        Self {
            external_dns_name: String::new(),
            dns_service_ip: DEFAULT_DNS_SERVICE_IP.to_string(),
            use_calico: false,
        }
    }
}

/// Deployment-wide settings: identity, network layout, images and feature flags.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeploymentSettings {
    pub cluster_name: String,
    pub key_name: String,
    pub region: Region,
    /// Legacy single-subnet zone. Must stay empty when `subnets` is given.
    pub availability_zone: String,
    pub release_channel: Choice<ReleaseChannel>,
    pub ami_id: String,
    pub vpc_id: String,
    pub internet_gateway_id: String,
    /// Legacy route table shared by every subnet.
    pub route_table_id: String,
    #[serde(rename = "vpcCIDR")]
    pub vpc_cidr: String,
    /// Legacy single-subnet CIDR. Must stay empty when `subnets` is given.
    #[serde(rename = "instanceCIDR")]
    pub instance_cidr: String,
    #[serde(rename = "kubernetesVersion")]
    pub k8s_ver: String,
    pub container_runtime: Choice<ContainerRuntime>,
    pub kms_key_arn: String,
    pub stack_tags: BTreeMap<String, String>,
    pub subnets: Vec<Subnet>,
    #[serde(rename = "eipAllocationIDs")]
    pub eip_allocation_ids: Vec<String>,
    #[serde(rename = "mapPublicIPs")]
    pub map_public_ips: bool,
    pub elastic_file_system_id: String,
    pub ssh_authorized_keys: Vec<String>,
    pub experimental: Experimental,
    pub manage_certificates: bool,
    pub wait_signal: WaitSignal,
    #[serde(flatten)]
    pub images: ImageSettings,
}

impl Default for DeploymentSettings {
    fn default() -> Self {
        Self {
            cluster_name: DEFAULT_CLUSTER_NAME.to_string(),
            key_name: String::new(),
            region: Region::default(),
            availability_zone: String::new(),
            release_channel: Choice::default(),
            ami_id: String::new(),
            vpc_id: String::new(),
            internet_gateway_id: String::new(),
            route_table_id: String::new(),
            vpc_cidr: DEFAULT_VPC_CIDR.to_string(),
            instance_cidr: String::new(),
            k8s_ver: K8S_VERSION.to_string(),
            container_runtime: Choice::default(),
            kms_key_arn: String::new(),
            stack_tags: BTreeMap::new(),
            subnets: Vec::new(),
            eip_allocation_ids: Vec::new(),
            map_public_ips: true,
            elastic_file_system_id: String::new(),
            ssh_authorized_keys: Vec::new(),
            experimental: Experimental::default(),
            manage_certificates: true,
            wait_signal: WaitSignal::default(),
            images: ImageSettings::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FlannelSettings {
    #[serde(rename = "podCIDR")]
    pub pod_cidr: String,
}

impl Default for FlannelSettings {
    fn default() -> Self {
        Self {
            pod_cidr: DEFAULT_POD_CIDR.to_string(),
        }
    }
}

/// The root of a cluster description. Every settings group is flattened into one YAML mapping,
/// so a document reads as a single list of top-level keys:
///
/// ```yaml
/// clusterName: my-cluster
/// externalDNSName: my-cluster.example.com
/// region: us-west-2
/// controllerCount: 2
/// ```
///
/// Fields absent from the document keep their `Default` value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClusterConfig {
    #[serde(flatten)]
    pub kube_cluster: KubeClusterSettings,
    #[serde(flatten)]
    pub deployment: DeploymentSettings,
    #[serde(flatten)]
    pub worker_settings: WorkerSettings,
    #[serde(flatten)]
    pub controller_settings: ControllerSettings,
    #[serde(flatten)]
    pub etcd_settings: EtcdSettings,
    #[serde(flatten)]
    pub flannel: FlannelSettings,
    #[serde(rename = "serviceCIDR")]
    pub service_cidr: String,
    pub create_record_set: bool,
    #[serde(rename = "recordSetTTL")]
    pub record_set_ttl: i32,
    #[serde(rename = "tlsCADurationDays")]
    pub tls_ca_duration_days: i32,
    pub tls_cert_duration_days: i32,
    pub hosted_zone_id: String,
    /// Free-form values passed through to templates.
    pub custom_settings: BTreeMap<String, Value>,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            kube_cluster: KubeClusterSettings::default(),
            deployment: DeploymentSettings::default(),
            worker_settings: WorkerSettings::default(),
            controller_settings: ControllerSettings::default(),
            etcd_settings: EtcdSettings::default(),
            flannel: FlannelSettings::default(),
            service_cidr: DEFAULT_SERVICE_CIDR.to_string(),
            create_record_set: false,
            record_set_ttl: DEFAULT_RECORD_SET_TTL,
            tls_ca_duration_days: DEFAULT_TLS_CA_DURATION_DAYS,
            tls_cert_duration_days: DEFAULT_TLS_CERT_DURATION_DAYS,
            hosted_zone_id: String::new(),
            custom_settings: BTreeMap::new(),
        }
    }
}

impl Configuration for ClusterConfig {}

impl ClusterConfig {
    pub fn subnets(&self) -> &[Subnet] {
        &self.deployment.subnets
    }

    pub fn private_subnets(&self) -> impl Iterator<Item = &Subnet> {
        self.deployment.subnets.iter().filter(|s| s.is_private())
    }

    pub fn public_subnets(&self) -> impl Iterator<Item = &Subnet> {
        self.deployment.subnets.iter().filter(|s| s.public())
    }

    /// Find a top-level subnet by name.
    pub fn find_subnet(&self, name: &str) -> Option<&Subnet> {
        self.deployment.subnets.iter().find(|s| s.name == name)
    }

    /// The availability zones the cluster spans, in the order they first appear.
    pub fn availability_zones(&self) -> Vec<&str> {
        if self.deployment.subnets.is_empty() {
            return vec![self.deployment.availability_zone.as_str()];
        }
        let mut zones: Vec<&str> = Vec::new();
        for subnet in &self.deployment.subnets {
            if !zones.contains(&subnet.availability_zone.as_str()) {
                zones.push(&subnet.availability_zone);
            }
        }
        zones
    }

    /// Generated TLS assets are encrypted with `kmsKeyArn` when this is true.
    pub fn assets_encryption_enabled(&self) -> bool {
        self.deployment.manage_certificates && self.deployment.region.supports_kms()
    }

    /// A shared route table with public IP mapping disabled: every subnet is private.
    pub fn private_topology_implied(&self) -> bool {
        !self.deployment.route_table_id.is_empty() && !self.deployment.map_public_ips
    }

    /// A shared route table with public IP mapping enabled: every subnet is public.
    pub fn public_topology_implied(&self) -> bool {
        !self.deployment.route_table_id.is_empty() && self.deployment.map_public_ips
    }

    pub fn api_server_endpoint(&self) -> String {
        format!("https://{}", self.kube_cluster.external_dns_name)
    }

    pub fn k8s_network_plugin(&self) -> &'static str {
        K8S_NETWORK_PLUGIN
    }

    pub fn stack_name(&self) -> &'static str {
        STACK_NAME
    }

    /// The stack name as a nested stack resource name, e.g. `Controlplane`.
    pub fn nested_stack_name(&self) -> String {
        resource_name(self.stack_name())
    }

    pub fn vpc_ref(&self) -> String {
        reference(&self.deployment.vpc_id, VPC_LOGICAL_NAME)
    }

    pub fn internet_gateway_ref(&self) -> String {
        reference(&self.deployment.internet_gateway_id, INTERNET_GATEWAY_LOGICAL_NAME)
    }
}

/// Quotes an existing resource id, or refers to the resource created by the stack.
fn reference(id: &str, logical_name: &str) -> String {
    if id.is_empty() {
        format!(r#"{{ "Ref" : {:?} }}"#, logical_name)
    } else {
        format!("{:?}", id)
    }
}
