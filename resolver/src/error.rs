use crate::registry::RegistryError;
use ipnet::IpNet;
use kubeaws_model::{Region, ReleaseChannel, ReleaseVersion};
use serde::{Deserialize, Serialize};
use serde_plain::derive_display_from_serialize;
use snafu::Snafu;
use std::net::IpAddr;

pub type Result<T> = std::result::Result<T, Error>;

/// The failure of a resolution pass.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("{}", source))]
    Decode { source: kubeaws_model::Error },

    #[snafu(display("invalid cluster: {}", source))]
    Invalid { stage: Stage, source: ConfigError },

    #[snafu(display(
        "failed getting AMI for region '{}' and channel '{}': {}",
        region,
        channel,
        source
    ))]
    ImageLookup {
        region: Region,
        channel: ReleaseChannel,
        source: RegistryError,
    },

    #[snafu(display(
        "Unable to retrieve current release version of the '{}' channel: {}",
        channel,
        source
    ))]
    ReleaseLookup {
        channel: ReleaseChannel,
        source: RegistryError,
    },
}

/// Broad classes of failure that callers handle differently.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ErrorKind {
    /// The document could not be decoded.
    Decode,
    /// The document decoded but describes an impossible or unsafe cluster.
    Configuration,
    /// A collaborator such as the image registry failed. Retrying is up to the caller.
    ExternalDependency,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Decode { .. } => ErrorKind::Decode,
            Error::Invalid { .. } => ErrorKind::Configuration,
            Error::ImageLookup { .. } | Error::ReleaseLookup { .. } => {
                ErrorKind::ExternalDependency
            }
        }
    }

    /// The stage that rejected the configuration, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Error::Invalid { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// The violated constraint, if the configuration was rejected.
    pub fn config_error(&self) -> Option<&ConfigError> {
        match self {
            Error::Invalid { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// The steps of a resolution pass that can reject a configuration, in the order they run.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Compatibility,
    Topology,
    ClusterName,
    RecordSet,
    NetworkIdentity,
    Deployment,
    Cidr,
    Subnets,
    NodeGroups,
    DeprecatedFields,
    FeatureFlags,
    Assembly,
    ExistingVpc,
}

derive_display_from_serialize!(Stage);

/// A violated configuration constraint. Each variant names the offending field.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ConfigError {
    // Compatibility
    #[snafu(display(
        "either subnets[].routeTable.id({}) or routeTableId({}) but not both can be specified",
        subnet_route_table,
        route_table
    ))]
    RouteTableConflict {
        subnet_route_table: String,
        route_table: String,
    },

    #[snafu(display(
        "mapPublicIPs(={}) and subnets[{}].private(={}) conflict: a shared routeTableId makes \
         every subnet {}",
        !private,
        index,
        private,
        if *private { "public" } else { "private" }
    ))]
    TopologyConflict { index: usize, private: bool },

    // Topology
    #[snafu(display(
        "No subnet named '{}' referenced from {} found in [{}]",
        name,
        referrer,
        available
    ))]
    UnknownSubnet {
        name: String,
        referrer: &'static str,
        available: String,
    },

    #[snafu(display(
        "No appropriate public subnet found in availability zone '{}' for a non-preconfigured NAT \
         gateway associated to private subnet {}",
        zone,
        subnet
    ))]
    NoPublicSubnetInZone { subnet: String, zone: String },

    #[snafu(display("subnet '{}' is public and can't have natGateway settings", subnet))]
    PublicSubnetNatGateway { subnet: String },

    #[snafu(display(
        "private subnet '{}' can't specify both routeTable.id and natGateway.id",
        subnet
    ))]
    RouteTableWithNatGateway { subnet: String },

    #[snafu(display(
        "the NAT gateway of subnet '{}' is preconfigured and can't have an eipAllocationId",
        subnet
    ))]
    UnmanagedNatGatewayEip { subnet: String },

    // Cluster name
    #[snafu(display(
        "clusterName(={}) is malformed. It must consist only of alphanumeric characters, \
         colons, or hyphens",
        name
    ))]
    MalformedClusterName { name: String },

    // Record set
    #[snafu(display("hostedZoneId must be specified when createRecordSet is true"))]
    HostedZoneIdMissing {},

    #[snafu(display("TTL must be at least 1 second, but recordSetTTL was {}", ttl))]
    RecordSetTtlTooLow { ttl: i32 },

    #[snafu(display("recordSetTTL should not be modified when createRecordSet is false"))]
    RecordSetTtlModified {},

    #[snafu(display("hostedZoneId should not be modified when createRecordSet is false"))]
    HostedZoneIdModified {},

    // Network identity
    #[snafu(display("externalDNSName must be set"))]
    ExternalDnsNameMissing {},

    #[snafu(display("Invalid dnsServiceIP: {}", source))]
    InvalidDnsServiceIp { source: kubeaws_utils::Error },

    // Deployment
    #[snafu(display("releaseChannel {} is not supported", value))]
    UnsupportedReleaseChannel { value: String },

    #[snafu(display("containerRuntime {} is not supported", value))]
    UnsupportedContainerRuntime { value: String },

    #[snafu(display("{} {} is not supported", field, value))]
    UnsupportedTenancy { field: &'static str, value: String },

    #[snafu(display("Either keyName or sshAuthorizedKeys must be set"))]
    SshKeyMissing {},

    #[snafu(display("kmsKeyArn must be set"))]
    KmsKeyArnMissing {},

    #[snafu(display("vpcId must be specified if routeTableId or internetGatewayId are specified"))]
    VpcIdMissing {},

    #[snafu(display("region must be set"))]
    RegionMissing {},

    // CIDR
    #[snafu(display("invalid {}: {}", field, source))]
    InvalidCidr {
        field: &'static str,
        source: kubeaws_utils::Error,
    },

    #[snafu(display(
        "{} ({}) overlaps with {} ({})",
        first_field,
        first,
        second_field,
        second
    ))]
    CidrOverlap {
        first_field: &'static str,
        first: IpNet,
        second_field: &'static str,
        second: IpNet,
    },

    #[snafu(display("serviceCIDR ({}) does not contain {} ({})", service_cidr, name, ip))]
    ServiceIpOutsideRange {
        service_cidr: IpNet,
        name: &'static str,
        ip: IpAddr,
    },

    #[snafu(display("dnsServiceIP conflicts with kubernetesServiceIP ({})", ip))]
    DnsServiceIpConflict { ip: IpAddr },

    // Subnets
    #[snafu(display(
        "The top-level {}({}) must be empty when subnets are specified",
        field,
        value
    ))]
    LegacyFieldWithSubnets { field: &'static str, value: String },

    #[snafu(display("availabilityZone must be set for subnet #{}", index))]
    AvailabilityZoneMissing { index: usize },

    #[snafu(display("invalid instanceCIDR for subnet #{}: {}", index, source))]
    InvalidSubnetCidr {
        index: usize,
        source: kubeaws_utils::Error,
    },

    #[snafu(display(
        "vpcCIDR ({}) does not contain instanceCIDR ({}) for subnet #{}",
        vpc_cidr,
        subnet_cidr,
        index
    ))]
    SubnetOutsideVpc {
        index: usize,
        vpc_cidr: IpNet,
        subnet_cidr: IpNet,
    },

    #[snafu(display(
        "network topology including both private and public subnets specified while the single \
         route table({}) is also specified. You must differentiate the route table at least \
         between private and public subnets. Use subnets[].routeTable.id instead of routeTableId \
         for that.",
        route_table
    ))]
    MixedTopologyRouteTable { route_table: String },

    #[snafu(display(
        "CIDR of subnet {} ({}) overlaps with CIDR of subnet {} ({})",
        first,
        first_cidr,
        second,
        second_cidr
    ))]
    SubnetOverlap {
        first: usize,
        first_cidr: IpNet,
        second: usize,
        second_cidr: IpNet,
    },

    // Node groups
    #[snafu(display("invalid {}: {}", field, value))]
    InvalidVolumeType { field: String, value: String },

    #[snafu(display("invalid {}: {}", field, iops))]
    InvalidIops { field: String, iops: i32 },

    #[snafu(display("invalid {} for volume type '{}': {}", field, volume_type, iops))]
    UnexpectedIops {
        field: String,
        volume_type: String,
        iops: i32,
    },

    #[snafu(display("{} must be greater than zero, but was {}", field, size))]
    InvalidVolumeSize { field: String, size: i32 },

    #[snafu(display("`{}` must be zero or greater if specified", field))]
    NegativeCount { field: &'static str },

    #[snafu(display("`etcdCount` ({}) must not exceed {}", count, max))]
    EtcdCountTooLarge { count: i32, max: i32 },

    #[snafu(display(
        "`controller.autoScalingGroup.minSize` and `controller.autoScalingGroup.maxSize` can only \
         be specified without `controllerCount`"
    ))]
    CountWithAutoScalingBounds {},

    #[snafu(display(
        "`controller.autoScalingGroup.minSize` must be zero or greater, but was {}",
        min
    ))]
    NegativeMinSize { min: i32 },

    #[snafu(display(
        "`controller.autoScalingGroup.maxSize` ({}) must be greater than or equal to `minSize` ({})",
        max,
        min
    ))]
    MaxBelowMin { min: i32, max: i32 },

    #[snafu(display(
        "`controller.autoScalingGroup.rollingUpdateMinInstancesInService` ({}) must be less than \
         or equal to `maxSize` ({})",
        min_in_service,
        max
    ))]
    MinInServiceAboveMax { min_in_service: i32, max: i32 },

    #[snafu(display("selected worker tenancy ({}) is incompatible with spot instances", tenancy))]
    SpotPriceTenancy { tenancy: String },

    // Deprecated fields
    #[snafu(display(
        "`workerCount` is removed. Set worker.nodePools[].count per node pool instead"
    ))]
    WorkerCountRemoved {},

    // Feature flags
    #[snafu(display(
        "`etcd.kmsKeyArn` can only be specified when `etcdDataVolumeEncrypted` is enabled"
    ))]
    EtcdKmsKeyWithoutEncryption {},

    #[snafu(display("Effect must be NoSchedule or PreferNoSchedule, but was {}", effect))]
    InvalidTaintEffect { effect: String },

    #[snafu(display(
        "awsNodeLabels can't be enabled for controllers because the total number of characters \
         in clusterName(=\"{}\") exceeds the limit of {}",
        cluster_name,
        limit
    ))]
    AwsNodeLabelsNameTooLong { cluster_name: String, limit: usize },

    #[snafu(display(
        "IAM role name(={}) will be {} characters long. It exceeds the AWS limit of {} \
         characters: shorten clusterName, region or controller.managedIamRoleName",
        name,
        length,
        limit
    ))]
    IamRoleNameTooLong {
        name: String,
        length: usize,
        limit: usize,
    },

    // Assembly
    #[snafu(display(
        "The container runtime is 'rkt' but the latest CoreOS version for the {} channel ({}) is \
         less than the minimum version {}. Please select the 'alpha' release channel to use the \
         rkt runtime.",
        channel,
        version,
        minimum
    ))]
    RktUnsupported {
        channel: ReleaseChannel,
        version: ReleaseVersion,
        minimum: ReleaseVersion,
    },

    #[snafu(display("{} etcd.nodes are specified but etcdCount is {}", nodes, count))]
    TooManyEtcdNodes { nodes: usize, count: i32 },

    #[snafu(display("etcdCount is {} but there is no subnet to place etcd nodes in", count))]
    NoEtcdSubnets { count: i32 },

    // Existing VPC
    #[snafu(display("declared vpcCIDR {} does not match existing vpc cidr {}", declared, existing))]
    VpcCidrMismatch { declared: IpNet, existing: IpNet },

    #[snafu(display(
        "instance cidr ({}) conflicts with existing subnet cidr={}",
        instance_cidr,
        existing
    ))]
    ExistingSubnetConflict { instance_cidr: IpNet, existing: IpNet },
}

#[test]
fn error_kinds() {
    let error = Error::Invalid {
        stage: Stage::Subnets,
        source: ConfigError::SubnetOverlap {
            first: 0,
            first_cidr: "10.0.0.0/24".parse().unwrap(),
            second: 1,
            second_cidr: "10.0.0.0/25".parse().unwrap(),
        },
    };
    assert_eq!(error.kind(), ErrorKind::Configuration);
    assert_eq!(error.stage(), Some(Stage::Subnets));
    assert_eq!(
        error.to_string(),
        "invalid cluster: CIDR of subnet 0 (10.0.0.0/24) overlaps with CIDR of subnet 1 (10.0.0.0/25)"
    );
    assert_eq!(Stage::NetworkIdentity.to_string(), "network-identity");
}
