use crate::compat::Provenance;
use crate::error::{self, ConfigError};
use ipnet::IpNet;
use kubeaws_model::ClusterConfig;
use kubeaws_utils::net::{cidr_overlap, increment_ip, parse_cidr, parse_ip};
use snafu::{ensure, ResultExt};

pub(super) fn network_identity(config: &ClusterConfig, _: &Provenance) -> Result<(), ConfigError> {
    ensure!(
        !config.kube_cluster.external_dns_name.is_empty(),
        error::ExternalDnsNameMissingSnafu
    );
    parse_ip(&config.kube_cluster.dns_service_ip).context(error::InvalidDnsServiceIpSnafu)?;
    Ok(())
}

pub(super) fn deployment(config: &ClusterConfig, _: &Provenance) -> Result<(), ConfigError> {
    let deployment = &config.deployment;
    ensure!(
        deployment.release_channel.is_known(),
        error::UnsupportedReleaseChannelSnafu {
            value: deployment.release_channel.to_string()
        }
    );
    ensure!(
        deployment.container_runtime.is_known(),
        error::UnsupportedContainerRuntimeSnafu {
            value: deployment.container_runtime.to_string()
        }
    );
    let tenancies = [
        (
            "controllerTenancy",
            &config.controller_settings.controller_tenancy,
        ),
        ("workerTenancy", &config.worker_settings.worker_tenancy),
        ("etcdTenancy", &config.etcd_settings.etcd_tenancy),
    ];
    for (field, tenancy) in tenancies {
        ensure!(
            tenancy.is_known(),
            error::UnsupportedTenancySnafu {
                field,
                value: tenancy.to_string()
            }
        );
    }

    ensure!(
        !deployment.key_name.is_empty() || !deployment.ssh_authorized_keys.is_empty(),
        error::SshKeyMissingSnafu
    );
    ensure!(
        !deployment.kms_key_arn.is_empty() || !config.assets_encryption_enabled(),
        error::KmsKeyArnMissingSnafu
    );
    ensure!(
        !deployment.vpc_id.is_empty()
            || (deployment.route_table_id.is_empty() && deployment.internet_gateway_id.is_empty()),
        error::VpcIdMissingSnafu
    );
    ensure!(!deployment.region.is_empty(), error::RegionMissingSnafu);
    Ok(())
}

/// The VPC, pod and service ranges are disjoint, and the service range holds both the API
/// server's service address (its second address) and the DNS service address.
pub(super) fn cidr(config: &ClusterConfig, _: &Provenance) -> Result<(), ConfigError> {
    let vpc = parse("vpcCIDR", &config.deployment.vpc_cidr)?;
    let pods = parse("podCIDR", &config.flannel.pod_cidr)?;
    let services = parse("serviceCIDR", &config.service_cidr)?;

    disjoint(("vpcCIDR", vpc), ("serviceCIDR", services))?;
    disjoint(("vpcCIDR", vpc), ("podCIDR", pods))?;
    disjoint(("serviceCIDR", services), ("podCIDR", pods))?;

    let kubernetes_service_ip = increment_ip(services.network());
    ensure!(
        services.contains(&kubernetes_service_ip),
        error::ServiceIpOutsideRangeSnafu {
            service_cidr: services,
            name: "kubernetesServiceIP",
            ip: kubernetes_service_ip,
        }
    );
    let dns_service_ip =
        parse_ip(&config.kube_cluster.dns_service_ip).context(error::InvalidDnsServiceIpSnafu)?;
    ensure!(
        services.contains(&dns_service_ip),
        error::ServiceIpOutsideRangeSnafu {
            service_cidr: services,
            name: "dnsServiceIP",
            ip: dns_service_ip,
        }
    );
    ensure!(
        dns_service_ip != kubernetes_service_ip,
        error::DnsServiceIpConflictSnafu { ip: dns_service_ip }
    );
    Ok(())
}

/// Subnets created with the cluster lie inside the VPC and don't overlap each other. Subnets
/// that reference an existing subnet by id are not checked.
pub(super) fn subnets(config: &ClusterConfig, provenance: &Provenance) -> Result<(), ConfigError> {
    let deployment = &config.deployment;
    if provenance.subnets_declared {
        ensure!(
            deployment.instance_cidr.is_empty(),
            error::LegacyFieldWithSubnetsSnafu {
                field: "instanceCIDR",
                value: &deployment.instance_cidr
            }
        );
        ensure!(
            deployment.availability_zone.is_empty(),
            error::LegacyFieldWithSubnetsSnafu {
                field: "availabilityZone",
                value: &deployment.availability_zone
            }
        );
    }

    let vpc = parse("vpcCIDR", &deployment.vpc_cidr)?;
    let mut cidrs: Vec<(usize, IpNet)> = Vec::new();
    for (index, subnet) in deployment.subnets.iter().enumerate() {
        if subnet.has_identifier() {
            continue;
        }
        ensure!(
            !subnet.availability_zone.is_empty(),
            error::AvailabilityZoneMissingSnafu { index }
        );
        let cidr =
            parse_cidr(&subnet.instance_cidr).context(error::InvalidSubnetCidrSnafu { index })?;
        ensure!(
            vpc.contains(&cidr),
            error::SubnetOutsideVpcSnafu {
                index,
                vpc_cidr: vpc,
                subnet_cidr: cidr,
            }
        );
        cidrs.push((index, cidr));
    }

    // One route table can't route both private and public subnets.
    ensure!(
        deployment.route_table_id.is_empty() || !provenance.mixed_topology,
        error::MixedTopologyRouteTableSnafu {
            route_table: &deployment.route_table_id
        }
    );

    for (position, (first, first_cidr)) in cidrs.iter().enumerate() {
        for (second, second_cidr) in &cidrs[position + 1..] {
            ensure!(
                !cidr_overlap(first_cidr, second_cidr),
                error::SubnetOverlapSnafu {
                    first: *first,
                    first_cidr: *first_cidr,
                    second: *second,
                    second_cidr: *second_cidr,
                }
            );
        }
    }
    Ok(())
}

fn parse(field: &'static str, input: &str) -> Result<IpNet, ConfigError> {
    parse_cidr(input).context(error::InvalidCidrSnafu { field })
}

fn disjoint(
    (first_field, first): (&'static str, IpNet),
    (second_field, second): (&'static str, IpNet),
) -> Result<(), ConfigError> {
    ensure!(
        !cidr_overlap(&first, &second),
        error::CidrOverlapSnafu {
            first_field,
            first,
            second_field,
            second,
        }
    );
    Ok(())
}

#[cfg(test)]
mod test {
    use super::{cidr, deployment, network_identity, subnets};
    use crate::compat::Provenance;
    use crate::error::ConfigError;
    use kubeaws_model::{ClusterConfig, Configuration, Region, Subnet};

    fn declared() -> Provenance {
        Provenance {
            subnets_declared: true,
            mixed_topology: false,
        }
    }

    #[test]
    fn disjoint_ranges_pass() {
        let mut config = ClusterConfig::default();
        assert!(cidr(&config, &Provenance::default()).is_ok());

        config.deployment.vpc_cidr = "172.16.0.0/12".to_string();
        config.flannel.pod_cidr = "10.244.0.0/16".to_string();
        config.service_cidr = "10.96.0.0/12".to_string();
        config.kube_cluster.dns_service_ip = "10.96.0.10".to_string();
        assert!(cidr(&config, &Provenance::default()).is_ok());
    }

    #[test]
    fn overlapping_ranges_fail() {
        let mut config = ClusterConfig::default();
        config.flannel.pod_cidr = "10.0.128.0/17".to_string();
        let error = cidr(&config, &Provenance::default()).unwrap_err();
        assert_eq!(
            error.to_string(),
            "vpcCIDR (10.0.0.0/16) overlaps with podCIDR (10.0.128.0/17)"
        );
    }

    #[test]
    fn service_addresses() {
        let mut config = ClusterConfig::default();
        config.kube_cluster.dns_service_ip = "10.3.1.10".to_string();
        assert!(matches!(
            cidr(&config, &Provenance::default()),
            Err(ConfigError::ServiceIpOutsideRange {
                name: "dnsServiceIP",
                ..
            })
        ));

        config.kube_cluster.dns_service_ip = "10.3.0.1".to_string();
        assert!(matches!(
            cidr(&config, &Provenance::default()),
            Err(ConfigError::DnsServiceIpConflict { .. })
        ));

        config.service_cidr = "10.3.0.0/32".to_string();
        assert!(matches!(
            cidr(&config, &Provenance::default()),
            Err(ConfigError::ServiceIpOutsideRange {
                name: "kubernetesServiceIP",
                ..
            })
        ));
    }

    #[test]
    fn network_identity_checks() {
        let mut config = ClusterConfig::default();
        assert!(matches!(
            network_identity(&config, &Provenance::default()),
            Err(ConfigError::ExternalDnsNameMissing {})
        ));
        config.kube_cluster.external_dns_name = "test.example.com".to_string();
        config.kube_cluster.dns_service_ip = "10.3.0".to_string();
        assert!(matches!(
            network_identity(&config, &Provenance::default()),
            Err(ConfigError::InvalidDnsServiceIp { .. })
        ));
    }

    #[test]
    fn deployment_requirements() {
        let mut config = ClusterConfig::default();
        let provenance = Provenance::default();
        assert!(matches!(
            deployment(&config, &provenance),
            Err(ConfigError::SshKeyMissing {})
        ));
        config.deployment.key_name = "test-key".to_string();
        config.deployment.region = Region::new("us-east-1");
        assert!(matches!(
            deployment(&config, &provenance),
            Err(ConfigError::KmsKeyArnMissing {})
        ));
        // No KMS in the China partition.
        config.deployment.region = Region::new("cn-north-1");
        assert!(deployment(&config, &provenance).is_ok());

        config.deployment.route_table_id = "rtb-1".to_string();
        assert!(matches!(
            deployment(&config, &provenance),
            Err(ConfigError::VpcIdMissing {})
        ));
        config.deployment.vpc_id = "vpc-1".to_string();
        config.deployment.region = Region::default();
        config.deployment.manage_certificates = false;
        assert!(matches!(
            deployment(&config, &provenance),
            Err(ConfigError::RegionMissing {})
        ));
    }

    #[test]
    fn unknown_choices() {
        let config = ClusterConfig::from_yaml_str("releaseChannel: nightly\n").unwrap();
        let error = deployment(&config, &Provenance::default()).unwrap_err();
        assert_eq!(error.to_string(), "releaseChannel nightly is not supported");

        let config = ClusterConfig::from_yaml_str("etcdTenancy: shared\n").unwrap();
        let error = deployment(&config, &Provenance::default()).unwrap_err();
        assert_eq!(error.to_string(), "etcdTenancy shared is not supported");
    }

    #[test]
    fn overlapping_subnets_are_reported_by_index() {
        let mut config = ClusterConfig::default();
        config.deployment.subnets = vec![
            Subnet::new_public("us-west-2a", "10.0.0.0/24"),
            Subnet::new_public("us-west-2b", "10.0.1.0/24"),
            Subnet::new_private("us-west-2a", "10.0.1.128/25"),
        ];
        let error = subnets(&config, &declared()).unwrap_err();
        assert!(matches!(
            error,
            ConfigError::SubnetOverlap {
                first: 1,
                second: 2,
                ..
            }
        ));
    }

    #[test]
    fn subnet_outside_vpc() {
        let mut config = ClusterConfig::default();
        config.deployment.subnets = vec![Subnet::new_public("us-west-2a", "10.1.0.0/24")];
        assert!(matches!(
            subnets(&config, &declared()),
            Err(ConfigError::SubnetOutsideVpc { index: 0, .. })
        ));
    }

    #[test]
    fn existing_subnets_are_not_checked() {
        let mut config = ClusterConfig::default();
        let mut existing = Subnet::named("existing");
        existing.id = "subnet-0123".to_string();
        config.deployment.subnets = vec![existing, Subnet::new_public("", "10.0.0.0/24")];
        assert!(matches!(
            subnets(&config, &declared()),
            Err(ConfigError::AvailabilityZoneMissing { index: 1 })
        ));
    }

    #[test]
    fn legacy_fields_with_declared_subnets() {
        let mut config = ClusterConfig::default();
        config.deployment.subnets = vec![Subnet::new_public("us-west-2a", "10.0.0.0/24")];
        config.deployment.availability_zone = "us-west-2a".to_string();
        let error = subnets(&config, &declared()).unwrap_err();
        assert_eq!(
            error.to_string(),
            "The top-level availabilityZone(us-west-2a) must be empty when subnets are specified"
        );
        // The same fields describe the subnet when none were declared.
        assert!(subnets(&config, &Provenance::default()).is_ok());
    }

    #[test]
    fn mixed_topology_with_shared_route_table() {
        let mut config = ClusterConfig::default();
        config.deployment.route_table_id = "rtb-1".to_string();
        let provenance = Provenance {
            subnets_declared: true,
            mixed_topology: true,
        };
        assert!(matches!(
            subnets(&config, &provenance),
            Err(ConfigError::MixedTopologyRouteTable { .. })
        ));
    }
}
