//! The resolved snapshot handed to template rendering, and the assembly step that produces it.

use crate::error::{self, ConfigError, Result, Stage};
use crate::registry::ImageRegistry;
use kubeaws_model::constants::{ETCD_INDEX_ENV_VAR, ETCD_NODE_ENV_FILE, STACK_NAME_ENV_VAR};
use kubeaws_model::{
    ClusterConfig, ContainerRuntime, EtcdNodeSettings, NatGateway, ReleaseChannel,
    ReleaseVersion, Subnet,
};
use kubeaws_utils::impl_display_as_json;
use kubeaws_utils::net::{cidr_overlap, parse_cidr};
use log::{debug, info};
use serde::Serialize;
use snafu::{ensure, OptionExt, ResultExt};

/// Channels other than alpha need at least this release to run rkt.
const RKT_MINIMUM_RELEASE: ReleaseVersion = ReleaseVersion::new(1151, 0, 0);

/// Overrides requested by the caller, applied after everything else.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct AssembleOptions {
    /// Don't wait for nodes to signal the stack, e.g. for a non-interactive run.
    pub skip_wait: bool,
}

/// One member of the etcd cluster.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EtcdNode {
    index: usize,
    name: String,
    subnet: Subnet,
    nat_gateway: Option<NatGateway>,
}

impl EtcdNode {
    pub fn index(&self) -> usize {
        self.index
    }

    /// The name given in `etcd.nodes[]`, empty when none was given.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn subnet(&self) -> &Subnet {
        &self.subnet
    }

    /// The gateway serving the node's subnet when that subnet is private.
    pub fn nat_gateway(&self) -> Option<&NatGateway> {
        self.nat_gateway.as_ref()
    }

    pub fn logical_name(&self) -> String {
        format!("Etcd{}", self.index)
    }
}

/// A fully resolved cluster. It can only be obtained from a configuration that passed every
/// validation stage, and it is never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(flatten)]
    cluster: ClusterConfig,
    ami: String,
    nat_gateways: Vec<NatGateway>,
    etcd_nodes: Vec<EtcdNode>,
}

impl_display_as_json!(Config);

impl Config {
    pub fn cluster(&self) -> &ClusterConfig {
        &self.cluster
    }

    /// The machine image every node boots from.
    pub fn ami(&self) -> &str {
        &self.ami
    }

    pub fn nat_gateways(&self) -> &[NatGateway] {
        &self.nat_gateways
    }

    pub fn etcd_nodes(&self) -> &[EtcdNode] {
        &self.etcd_nodes
    }

    pub fn nat_gateway_for_private_subnet(&self, subnet: &Subnet) -> Option<&NatGateway> {
        self.nat_gateways
            .iter()
            .find(|gateway| gateway.is_connected_to_private_subnet(subnet))
    }

    pub fn api_server_endpoint(&self) -> String {
        self.cluster.api_server_endpoint()
    }

    pub fn vpc_ref(&self) -> String {
        self.cluster.vpc_ref()
    }

    pub fn internet_gateway_ref(&self) -> String {
        self.cluster.internet_gateway_ref()
    }

    pub fn nested_stack_name(&self) -> String {
        self.cluster.nested_stack_name()
    }

    pub fn stack_name_env_var_name(&self) -> &'static str {
        STACK_NAME_ENV_VAR
    }

    pub fn etcd_index_env_var_name(&self) -> &'static str {
        ETCD_INDEX_ENV_VAR
    }

    pub fn etcd_node_env_file_name(&self) -> &'static str {
        ETCD_NODE_ENV_FILE
    }

    /// Node labels as passed to the kubelet, e.g. `role=worker,zone=a`.
    pub fn node_labels(&self) -> String {
        self.cluster.deployment.experimental.node_labels.to_string()
    }

    /// Taints as passed to the kubelet, e.g. `dedicated=search:NoSchedule`.
    pub fn taints(&self) -> String {
        self.cluster
            .deployment
            .experimental
            .taints
            .iter()
            .map(|taint| taint.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn wait_signal_enabled(&self) -> bool {
        self.cluster.deployment.wait_signal.enabled()
    }

    pub fn wait_signal_max_batch_size(&self) -> i32 {
        self.cluster.deployment.wait_signal.max_batch_size()
    }

    pub fn min_controller_count(&self) -> i32 {
        self.cluster.controller_settings.min_controller_count()
    }

    pub fn max_controller_count(&self) -> i32 {
        self.cluster.controller_settings.max_controller_count()
    }

    pub fn controller_rolling_update_min_instances_in_service(&self) -> i32 {
        self.cluster
            .controller_settings
            .rolling_update_min_instances_in_service()
    }

    /// Checks the cluster against a VPC that already exists: the declared `vpcCIDR` must match
    /// it, and no subnet created with the cluster may overlap a subnet already in it.
    pub fn validate_existing_vpc(
        &self,
        existing_vpc_cidr: &str,
        existing_subnet_cidrs: &[&str],
    ) -> Result<()> {
        check_existing_vpc(&self.cluster, existing_vpc_cidr, existing_subnet_cidrs).context(
            error::InvalidSnafu {
                stage: Stage::ExistingVpc,
            },
        )
    }
}

fn check_existing_vpc(
    cluster: &ClusterConfig,
    existing_vpc_cidr: &str,
    existing_subnet_cidrs: &[&str],
) -> std::result::Result<(), ConfigError> {
    let existing = parse_cidr(existing_vpc_cidr).context(error::InvalidCidrSnafu {
        field: "existing vpc cidr",
    })?;
    let declared = parse_cidr(&cluster.deployment.vpc_cidr)
        .context(error::InvalidCidrSnafu { field: "vpcCIDR" })?;
    ensure!(
        declared == existing,
        error::VpcCidrMismatchSnafu { declared, existing }
    );

    let existing_subnets = existing_subnet_cidrs
        .iter()
        .map(|cidr| {
            parse_cidr(cidr).context(error::InvalidCidrSnafu {
                field: "existing subnet cidr",
            })
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;
    for (index, subnet) in cluster.subnets().iter().enumerate() {
        if subnet.has_identifier() {
            continue;
        }
        let instance_cidr =
            parse_cidr(&subnet.instance_cidr).context(error::InvalidSubnetCidrSnafu { index })?;
        if let Some(existing) = existing_subnets
            .iter()
            .find(|existing| cidr_overlap(&instance_cidr, existing))
        {
            return error::ExistingSubnetConflictSnafu {
                instance_cidr,
                existing: *existing,
            }
            .fail();
        }
    }
    Ok(())
}

/// Combines a validated configuration with the image registry and derives the etcd nodes.
pub(crate) fn assemble<R>(
    mut cluster: ClusterConfig,
    nat_gateways: Vec<NatGateway>,
    registry: &R,
    options: &AssembleOptions,
) -> Result<Config>
where
    R: ImageRegistry + ?Sized,
{
    let deployment = &cluster.deployment;
    let channel = deployment
        .release_channel
        .get()
        .context(error::UnsupportedReleaseChannelSnafu {
            value: deployment.release_channel.to_string(),
        })
        .context(error::InvalidSnafu {
            stage: Stage::Deployment,
        })?;

    if deployment.container_runtime.is(&ContainerRuntime::Rkt) && channel != ReleaseChannel::Alpha
    {
        check_rkt_release(registry, channel)?;
    }

    let ami = if deployment.ami_id.is_empty() {
        registry
            .lookup(&deployment.region, channel)
            .context(error::ImageLookupSnafu {
                region: deployment.region.clone(),
                channel,
            })?
    } else {
        deployment.ami_id.clone()
    };
    info!("Using AMI '{}' for the {} channel", ami, channel);

    let etcd_nodes = derive_etcd_nodes(&cluster, &nat_gateways).context(error::InvalidSnafu {
        stage: Stage::Assembly,
    })?;

    if !cluster.subnets().is_empty()
        && cluster.controller_settings.min_controller_count() > 0
        && cluster.controller_settings.controller.subnets.is_empty()
    {
        debug!("Controllers declared no subnets, using all subnets");
        cluster.controller_settings.controller.subnets = cluster.deployment.subnets.clone();
    }

    if options.skip_wait {
        info!("Disabling wait signals");
        cluster.deployment.wait_signal.enabled = Some(false);
    }

    info!(
        "Resolved cluster '{}' with {} subnets, {} NAT gateways and {} etcd nodes",
        cluster.deployment.cluster_name,
        cluster.subnets().len(),
        nat_gateways.len(),
        etcd_nodes.len()
    );
    Ok(Config {
        cluster,
        ami,
        nat_gateways,
        etcd_nodes,
    })
}

fn check_rkt_release<R>(registry: &R, channel: ReleaseChannel) -> Result<()>
where
    R: ImageRegistry + ?Sized,
{
    let version = registry
        .release_version(channel)
        .context(error::ReleaseLookupSnafu { channel })?;
    debug!("Current release of the {} channel is {}", channel, version);
    rkt_supported(channel, version).context(error::InvalidSnafu {
        stage: Stage::Assembly,
    })
}

fn rkt_supported(
    channel: ReleaseChannel,
    version: ReleaseVersion,
) -> std::result::Result<(), ConfigError> {
    ensure!(
        version >= RKT_MINIMUM_RELEASE,
        error::RktUnsupportedSnafu {
            channel,
            version,
            minimum: RKT_MINIMUM_RELEASE,
        }
    );
    Ok(())
}

/// Places `etcdCount` nodes round-robin over the etcd subnets, in subnet order.
fn derive_etcd_nodes(
    cluster: &ClusterConfig,
    nat_gateways: &[NatGateway],
) -> std::result::Result<Vec<EtcdNode>, ConfigError> {
    let settings = &cluster.etcd_settings;
    let count = settings.etcd_count;
    let subnets = &settings.etcd.subnets;
    ensure!(
        settings.etcd.nodes.len() <= count.max(0) as usize,
        error::TooManyEtcdNodesSnafu {
            nodes: settings.etcd.nodes.len(),
            count
        }
    );
    if count <= 0 {
        return Ok(Vec::new());
    }
    ensure!(!subnets.is_empty(), error::NoEtcdSubnetsSnafu { count });

    let nodes = (0..count as usize)
        .map(|index| {
            let subnet = &subnets[index % subnets.len()];
            let nat_gateway = if subnet.is_private() {
                nat_gateways
                    .iter()
                    .find(|gateway| gateway.is_connected_to_private_subnet(subnet))
                    .cloned()
            } else {
                None
            };
            let name = settings
                .etcd
                .nodes
                .get(index)
                .map(|node: &EtcdNodeSettings| node.name.clone())
                .unwrap_or_default();
            let node = EtcdNode {
                index,
                name,
                subnet: subnet.clone(),
                nat_gateway,
            };
            debug!(
                "Placed {} in subnet '{}'",
                node.logical_name(),
                node.subnet.name
            );
            node
        })
        .collect();
    Ok(nodes)
}

#[cfg(test)]
mod test {
    use super::{assemble, derive_etcd_nodes, AssembleOptions};
    use crate::error::{ConfigError, ErrorKind, Stage};
    use crate::registry::StaticImageRegistry;
    use crate::topology::derive_nat_gateways;
    use kubeaws_model::{
        Choice, ClusterConfig, ContainerRuntime, EtcdNodeSettings, Region, ReleaseChannel,
        ReleaseVersion, Subnet,
    };

    fn subnets() -> Vec<Subnet> {
        let mut public = Subnet::new_public("us-west-2a", "10.0.0.0/24");
        public.name = "public-a".to_string();
        let mut private_a = Subnet::new_private("us-west-2a", "10.0.1.0/24");
        private_a.name = "private-a".to_string();
        let mut private_b = Subnet::new_private("us-west-2a", "10.0.2.0/24");
        private_b.name = "private-b".to_string();
        vec![public, private_a, private_b]
    }

    fn cluster() -> ClusterConfig {
        let mut config = ClusterConfig::default();
        config.deployment.region = Region::new("us-west-2");
        config.deployment.subnets = subnets();
        config
    }

    fn registry() -> StaticImageRegistry {
        StaticImageRegistry::new().with_image(
            Region::new("us-west-2"),
            ReleaseChannel::Stable,
            "ami-stable",
        )
    }

    #[test]
    fn etcd_nodes_are_placed_round_robin() {
        let mut config = cluster();
        config.etcd_settings.etcd_count = 3;
        config.etcd_settings.etcd.subnets = subnets()[1..].to_vec();
        config.etcd_settings.etcd.nodes = vec![EtcdNodeSettings {
            name: "etcd-first".to_string(),
        }];
        let gateways = derive_nat_gateways(config.subnets()).unwrap();
        let nodes = derive_etcd_nodes(&config, &gateways).unwrap();

        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0].name(), "etcd-first");
        assert_eq!(nodes[1].name(), "");
        assert_eq!(nodes[2].logical_name(), "Etcd2");
        assert_eq!(nodes[0].subnet().name, "private-a");
        assert_eq!(nodes[1].subnet().name, "private-b");
        assert_eq!(nodes[2].subnet().name, "private-a");
        assert_eq!(
            nodes[1].nat_gateway().unwrap().private_subnet().name,
            "private-b"
        );
    }

    #[test]
    fn etcd_node_errors() {
        let mut config = cluster();
        config.etcd_settings.etcd.nodes = vec![EtcdNodeSettings::default(); 2];
        assert!(matches!(
            derive_etcd_nodes(&config, &[]),
            Err(ConfigError::TooManyEtcdNodes { nodes: 2, count: 1 })
        ));

        let config = cluster();
        assert!(matches!(
            derive_etcd_nodes(&config, &[]),
            Err(ConfigError::NoEtcdSubnets { count: 1 })
        ));
    }

    #[test]
    fn image_override_skips_registry() {
        let mut config = cluster();
        config.deployment.ami_id = "ami-custom".to_string();
        config.etcd_settings.etcd.subnets = subnets()[..1].to_vec();
        let resolved = assemble(
            config,
            Vec::new(),
            &StaticImageRegistry::new(),
            &AssembleOptions::default(),
        )
        .unwrap();
        assert_eq!(resolved.ami(), "ami-custom");
    }

    #[test]
    fn registry_failure_is_external() {
        let mut config = cluster();
        config.deployment.region = Region::new("eu-west-1");
        config.etcd_settings.etcd.subnets = subnets()[..1].to_vec();
        let error = assemble(config, Vec::new(), &registry(), &AssembleOptions::default())
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::ExternalDependency);
        assert!(error.stage().is_none());
    }

    #[test]
    fn rkt_requires_recent_release() {
        let mut config = cluster();
        config.deployment.container_runtime = Choice::Known(ContainerRuntime::Rkt);
        config.etcd_settings.etcd.subnets = subnets()[..1].to_vec();

        let options = AssembleOptions::default();
        let old = registry()
            .with_release_version(ReleaseChannel::Stable, ReleaseVersion::new(1122, 2, 0));
        let error = assemble(config.clone(), Vec::new(), &old, &options).unwrap_err();
        assert_eq!(error.stage(), Some(Stage::Assembly));
        assert!(matches!(
            error.config_error(),
            Some(ConfigError::RktUnsupported { .. })
        ));

        let current = registry()
            .with_release_version(ReleaseChannel::Stable, ReleaseVersion::new(1151, 0, 0));
        assert!(assemble(config.clone(), Vec::new(), &current, &options).is_ok());

        // Without release information the check can't be made.
        let error = assemble(config.clone(), Vec::new(), &registry(), &options).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::ExternalDependency);

        // Alpha always carries a recent enough release.
        config.deployment.release_channel = Choice::Known(ReleaseChannel::Alpha);
        config.deployment.ami_id = "ami-alpha".to_string();
        assert!(assemble(config, Vec::new(), &registry(), &options).is_ok());
    }

    #[test]
    fn late_overrides_and_controller_subnets() {
        let mut config = cluster();
        config.etcd_settings.etcd.subnets = subnets()[..1].to_vec();
        let options = AssembleOptions { skip_wait: true };
        let resolved = assemble(config, Vec::new(), &registry(), &options).unwrap();
        assert!(!resolved.wait_signal_enabled());
        assert_eq!(resolved.wait_signal_max_batch_size(), 1);
        assert_eq!(resolved.cluster().controller_settings.controller.subnets, subnets());
    }

    #[test]
    fn existing_vpc() {
        let mut config = cluster();
        config.etcd_settings.etcd.subnets = subnets()[..1].to_vec();
        let resolved = assemble(config, Vec::new(), &registry(), &AssembleOptions::default())
            .unwrap();

        assert!(resolved
            .validate_existing_vpc("10.0.0.0/16", &["10.0.100.0/24"])
            .is_ok());
        let error = resolved
            .validate_existing_vpc("10.1.0.0/16", &[])
            .unwrap_err();
        assert_eq!(error.stage(), Some(Stage::ExistingVpc));
        assert_eq!(
            error.to_string(),
            "invalid cluster: declared vpcCIDR 10.0.0.0/16 does not match existing vpc cidr \
             10.1.0.0/16"
        );
        let error = resolved
            .validate_existing_vpc("10.0.0.0/16", &["10.0.1.128/25"])
            .unwrap_err();
        assert!(matches!(
            error.config_error(),
            Some(ConfigError::ExistingSubnetConflict { .. })
        ));
    }
}
