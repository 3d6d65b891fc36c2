//! Links node groups to the subnets they run in and works out which NAT gateway serves each
//! private subnet.

use crate::error::{self, ConfigError};
use kubeaws_model::{ClusterConfig, NatGateway, Subnet};
use log::debug;
use snafu::{ensure, OptionExt};

/// Resolves subnet references, defaults empty subnet lists and derives the NAT gateways.
pub(crate) fn infer(
    mut config: ClusterConfig,
) -> Result<(ClusterConfig, Vec<NatGateway>), ConfigError> {
    for subnet in config.subnets() {
        check_subnet(subnet)?;
    }

    let controller = &config.controller_settings.controller;
    let controller_subnets = resolve(&config, &controller.subnets, "controller.subnets")?;
    let load_balancer_subnets = resolve(
        &config,
        &controller.load_balancer.subnets,
        "controller.loadBalancer.subnets",
    )?;
    let etcd_subnets = resolve(&config, &config.etcd_settings.etcd.subnets, "etcd.subnets")?;

    let private_implied = config.private_topology_implied();
    let private_subnets: Vec<Subnet> = config.private_subnets().cloned().collect();
    let public_subnets: Vec<Subnet> = config.public_subnets().cloned().collect();
    let default_subnets = if private_implied {
        &private_subnets
    } else {
        &public_subnets
    };

    let controller = &mut config.controller_settings.controller;
    controller.subnets = or_default(controller_subnets, default_subnets);
    controller.load_balancer.subnets = if !load_balancer_subnets.is_empty() {
        load_balancer_subnets
    } else if controller.load_balancer.private || private_implied {
        controller.load_balancer.private = true;
        private_subnets.clone()
    } else {
        public_subnets.clone()
    };
    config.etcd_settings.etcd.subnets = or_default(etcd_subnets, default_subnets);

    debug!(
        "Controllers use subnets [{}], their load balancer [{}], etcd [{}]",
        names(&config.controller_settings.controller.subnets),
        names(&config.controller_settings.controller.load_balancer.subnets),
        names(&config.etcd_settings.etcd.subnets)
    );

    let nat_gateways = derive_nat_gateways(config.subnets())?;
    Ok((config, nat_gateways))
}

/// Derives one NAT gateway for every private subnet that needs one. A gateway that isn't
/// preconfigured is placed in the first public subnet of the same availability zone, so the
/// result depends only on the order of `subnets`.
pub fn derive_nat_gateways(subnets: &[Subnet]) -> Result<Vec<NatGateway>, ConfigError> {
    let mut nat_gateways = Vec::new();
    for private_subnet in subnets.iter().filter(|s| s.is_private()) {
        let config = private_subnet.nat_gateway.clone();
        let nat_gateway = if private_subnet.manage_nat_gateway() {
            let public_subnet = subnets
                .iter()
                .filter(|s| s.public())
                .find(|s| s.availability_zone == private_subnet.availability_zone)
                .with_context(|| error::NoPublicSubnetInZoneSnafu {
                    subnet: private_subnet.logical_name(),
                    zone: &private_subnet.availability_zone,
                })?;
            NatGateway::managed(config, private_subnet.clone(), public_subnet.clone())
        } else if config.has_identifier() {
            ensure!(
                config.eip_allocation_id.is_empty(),
                error::UnmanagedNatGatewayEipSnafu {
                    subnet: &private_subnet.name
                }
            );
            NatGateway::unmanaged(config, private_subnet.clone())
        } else {
            continue;
        };
        debug!(
            "Derived NAT gateway {} for subnet '{}'",
            nat_gateway.logical_name(),
            private_subnet.name
        );
        nat_gateways.push(nat_gateway);
    }
    Ok(nat_gateways)
}

fn check_subnet(subnet: &Subnet) -> Result<(), ConfigError> {
    ensure!(
        subnet.is_private() || !subnet.nat_gateway.is_configured(),
        error::PublicSubnetNatGatewaySnafu {
            subnet: &subnet.name
        }
    );
    ensure!(
        !(subnet.route_table.has_identifier() && subnet.nat_gateway.has_identifier()),
        error::RouteTableWithNatGatewaySnafu {
            subnet: &subnet.name
        }
    );
    Ok(())
}

/// Replaces each by-name reference with the top-level subnet of that name.
fn resolve(
    config: &ClusterConfig,
    references: &[Subnet],
    referrer: &'static str,
) -> Result<Vec<Subnet>, ConfigError> {
    references
        .iter()
        .map(|reference| {
            config
                .find_subnet(&reference.name)
                .cloned()
                .with_context(|| error::UnknownSubnetSnafu {
                    name: &reference.name,
                    referrer,
                    available: names(config.subnets()),
                })
        })
        .collect()
}

fn or_default(subnets: Vec<Subnet>, default: &[Subnet]) -> Vec<Subnet> {
    if subnets.is_empty() {
        default.to_vec()
    } else {
        subnets
    }
}

fn names(subnets: &[Subnet]) -> String {
    subnets
        .iter()
        .map(|s| s.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod test {
    use super::{derive_nat_gateways, infer};
    use crate::error::ConfigError;
    use kubeaws_model::{ClusterConfig, Subnet};

    fn subnet(name: &str, zone: &str, cidr: &str, private: bool) -> Subnet {
        let mut subnet = if private {
            Subnet::new_private(zone, cidr)
        } else {
            Subnet::new_public(zone, cidr)
        };
        subnet.name = name.to_string();
        subnet
    }

    fn multi_zone() -> Vec<Subnet> {
        vec![
            subnet("public-a", "us-west-2a", "10.0.0.0/24", false),
            subnet("public-b", "us-west-2b", "10.0.1.0/24", false),
            subnet("private-a", "us-west-2a", "10.0.2.0/24", true),
            subnet("private-b", "us-west-2b", "10.0.3.0/24", true),
        ]
    }

    #[test]
    fn managed_gateways_are_zone_local() {
        let gateways = derive_nat_gateways(&multi_zone()).unwrap();
        assert_eq!(gateways.len(), 2);
        assert!(gateways.iter().all(|g| g.is_managed()));
        assert_eq!(gateways[0].private_subnet().name, "private-a");
        assert_eq!(gateways[0].public_subnet().unwrap().name, "public-a");
        assert_eq!(gateways[1].public_subnet().unwrap().name, "public-b");
        assert_eq!(derive_nat_gateways(&multi_zone()).unwrap(), gateways);
    }

    #[test]
    fn missing_public_subnet_in_zone() {
        let subnets = vec![
            subnet("public-a", "us-west-2a", "10.0.0.0/24", false),
            subnet("private-c", "us-west-2c", "10.0.2.0/24", true),
        ];
        let error = derive_nat_gateways(&subnets).unwrap_err();
        assert!(matches!(error, ConfigError::NoPublicSubnetInZone { .. }));

        let mut preconfigured = subnets;
        preconfigured[1].nat_gateway.id = "nat-0123".to_string();
        let gateways = derive_nat_gateways(&preconfigured).unwrap();
        assert_eq!(gateways.len(), 1);
        assert!(!gateways[0].is_managed());
    }

    #[test]
    fn unmanaged_gateway_with_eip() {
        let mut subnets = multi_zone();
        subnets[2].nat_gateway.id = "nat-0123".to_string();
        subnets[2].nat_gateway.eip_allocation_id = "eipalloc-0123".to_string();
        let error = derive_nat_gateways(&subnets).unwrap_err();
        assert!(matches!(error, ConfigError::UnmanagedNatGatewayEip { .. }));
    }

    #[test]
    fn node_groups_default_to_public_subnets() {
        let mut config = ClusterConfig::default();
        config.deployment.subnets = multi_zone();
        let (config, gateways) = infer(config).unwrap();
        let controller = &config.controller_settings.controller;
        assert_eq!(controller.subnets, multi_zone()[..2].to_vec());
        assert_eq!(controller.load_balancer.subnets, multi_zone()[..2].to_vec());
        assert!(!controller.load_balancer.private);
        assert_eq!(config.etcd_settings.etcd.subnets, multi_zone()[..2].to_vec());
        assert_eq!(gateways.len(), 2);

        // Inferring again from the output changes nothing.
        let (again, gateways_again) = infer(config.clone()).unwrap();
        assert_eq!(again, config);
        assert_eq!(gateways_again, gateways);
    }

    #[test]
    fn references_are_resolved_by_name() {
        let mut config = ClusterConfig::default();
        config.deployment.subnets = multi_zone();
        config.controller_settings.controller.subnets = vec![Subnet::named("private-b")];
        config.controller_settings.controller.load_balancer.private = true;
        config.etcd_settings.etcd.subnets =
            vec![Subnet::named("private-a"), Subnet::named("private-b")];
        let (config, _) = infer(config).unwrap();
        let controller = &config.controller_settings.controller;
        assert_eq!(controller.subnets, vec![multi_zone()[3].clone()]);
        assert_eq!(controller.load_balancer.subnets, multi_zone()[2..].to_vec());
        assert_eq!(config.etcd_settings.etcd.subnets, multi_zone()[2..].to_vec());
    }

    #[test]
    fn unknown_subnet_name() {
        let mut config = ClusterConfig::default();
        config.deployment.subnets = multi_zone();
        config.etcd_settings.etcd.subnets = vec![Subnet::named("private-z")];
        let error = infer(config).unwrap_err();
        assert_eq!(
            error.to_string(),
            "No subnet named 'private-z' referenced from etcd.subnets found in \
             [public-a, public-b, private-a, private-b]"
        );
    }

    #[test]
    fn public_subnet_with_nat_gateway() {
        let mut config = ClusterConfig::default();
        config.deployment.subnets = multi_zone();
        config.deployment.subnets[0].nat_gateway.eip_allocation_id = "eipalloc-1".to_string();
        let error = infer(config).unwrap_err();
        assert!(matches!(error, ConfigError::PublicSubnetNatGateway { .. }));
    }
}
