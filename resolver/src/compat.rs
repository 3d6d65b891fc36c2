//! Rewrites deprecated input shapes into the canonical multi-subnet shape.

use crate::error::{self, ConfigError};
use kubeaws_model::{ClusterConfig, Subnet};
use log::{debug, info};
use snafu::ensure;

/// Facts about the document as the user wrote it, which the rewrite would otherwise erase.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct Provenance {
    /// `subnets` was given explicitly rather than through `availabilityZone`/`instanceCIDR`.
    pub subnets_declared: bool,
    /// The declared subnets that are created with the cluster mix private and public ones.
    pub mixed_topology: bool,
}

/// Turns the legacy single-subnet fields into a subnet, names unnamed subnets, and applies a
/// shared `routeTableId` to every subnet.
pub(crate) fn migrate(mut config: ClusterConfig) -> Result<(ClusterConfig, Provenance), ConfigError> {
    let public_implied = config.public_topology_implied();
    let private_implied = config.private_topology_implied();
    let deployment = &mut config.deployment;

    let subnets_declared = !deployment.subnets.is_empty();
    if subnets_declared && !deployment.route_table_id.is_empty() {
        if let Some(subnet) = deployment
            .subnets
            .iter()
            .filter(|s| !s.has_identifier())
            .find(|s| !s.route_table_id().is_empty())
        {
            return error::RouteTableConflictSnafu {
                subnet_route_table: subnet.route_table_id(),
                route_table: &deployment.route_table_id,
            }
            .fail();
        }
    }

    let created = || deployment.subnets.iter().filter(|s| !s.has_identifier());
    let mixed_topology = subnets_declared
        && created().any(|s| s.is_private())
        && created().any(|s| s.public());
    let provenance = Provenance {
        subnets_declared,
        mixed_topology,
    };

    if !subnets_declared {
        info!(
            "Converting availabilityZone '{}' and instanceCIDR '{}' into a public subnet",
            deployment.availability_zone, deployment.instance_cidr
        );
        deployment.subnets = vec![Subnet::new_public(
            deployment.availability_zone.as_str(),
            deployment.instance_cidr.as_str(),
        )];
    }

    for (index, subnet) in deployment.subnets.iter_mut().enumerate() {
        if subnet.name.is_empty() {
            subnet.name = format!("Subnet{}", index);
            debug!("Named subnet #{} '{}'", index, subnet.name);
        }

        if public_implied {
            ensure!(
                subnet.public(),
                error::TopologyConflictSnafu {
                    index,
                    private: true
                }
            );
            subnet.route_table.id = deployment.route_table_id.clone();
        }

        if private_implied {
            ensure!(
                !subnet.declared_public(),
                error::TopologyConflictSnafu {
                    index,
                    private: false
                }
            );
            subnet.route_table.id = deployment.route_table_id.clone();
            subnet.private = Some(true);
        }
    }

    if public_implied || private_implied {
        info!(
            "Applied routeTableId '{}' to every subnet, which are all {}",
            deployment.route_table_id,
            if private_implied { "private" } else { "public" }
        );
    }

    Ok((config, provenance))
}

#[cfg(test)]
mod test {
    use super::{migrate, Provenance};
    use crate::error::ConfigError;
    use kubeaws_model::{ClusterConfig, Subnet};

    fn with_subnets(subnets: Vec<Subnet>) -> ClusterConfig {
        let mut config = ClusterConfig::default();
        config.deployment.subnets = subnets;
        config
    }

    #[test]
    fn legacy_single_subnet() {
        let mut config = ClusterConfig::default();
        config.deployment.availability_zone = "us-east-1a".to_string();
        config.deployment.instance_cidr = "10.0.0.0/24".to_string();
        let (config, provenance) = migrate(config).unwrap();
        assert_eq!(provenance, Provenance::default());
        let mut expected = Subnet::new_public("us-east-1a", "10.0.0.0/24");
        expected.name = "Subnet0".to_string();
        assert_eq!(config.subnets(), &[expected]);
    }

    #[test]
    fn private_topology_implied() {
        let mut config = with_subnets(vec![
            Subnet::new_public("us-east-1a", "10.0.0.0/24"),
            Subnet::new_private("us-east-1b", "10.0.1.0/24"),
        ]);
        config.deployment.route_table_id = "rtb-1".to_string();
        config.deployment.map_public_ips = false;
        let (config, provenance) = migrate(config).unwrap();
        assert!(provenance.subnets_declared);
        assert!(provenance.mixed_topology);
        for subnet in config.subnets() {
            assert!(subnet.is_private());
            assert_eq!(subnet.route_table_id(), "rtb-1");
        }
        assert_eq!(config.subnets()[1].name, "Subnet1");
    }

    #[test]
    fn public_topology_rejects_private_subnet() {
        let mut config = with_subnets(vec![
            Subnet::new_public("us-east-1a", "10.0.0.0/24"),
            Subnet::new_private("us-east-1b", "10.0.1.0/24"),
        ]);
        config.deployment.route_table_id = "rtb-1".to_string();
        let error = migrate(config).unwrap_err();
        assert!(matches!(error, ConfigError::TopologyConflict {
                index: 1,
                private: true
            }));
    }

    #[test]
    fn private_topology_rejects_public_subnet() {
        let mut public = Subnet::new_public("us-east-1b", "10.0.1.0/24");
        public.private = Some(false);
        let mut config = with_subnets(vec![
            Subnet::new_private("us-east-1a", "10.0.0.0/24"),
            public,
        ]);
        config.deployment.route_table_id = "rtb-1".to_string();
        config.deployment.map_public_ips = false;
        let error = migrate(config).unwrap_err();
        assert!(matches!(
            error,
            ConfigError::TopologyConflict {
                index: 1,
                private: false
            }
        ));
        assert_eq!(
            error.to_string(),
            "mapPublicIPs(=false) and subnets[1].private(=false) conflict: a shared routeTableId \
             makes every subnet private"
        );
    }

    #[test]
    fn route_table_declared_twice() {
        let mut subnet = Subnet::new_public("us-east-1a", "10.0.0.0/24");
        subnet.route_table.id = "rtb-2".to_string();
        let mut config = with_subnets(vec![subnet]);
        config.deployment.route_table_id = "rtb-1".to_string();
        let error = migrate(config).unwrap_err();
        assert_eq!(
            error.to_string(),
            "either subnets[].routeTable.id(rtb-2) or routeTableId(rtb-1) but not both can be specified"
        );
    }

    #[test]
    fn existing_subnet_route_table_is_not_a_conflict() {
        let mut existing = Subnet::named("existing");
        existing.id = "subnet-0123".to_string();
        existing.route_table.id = "rtb-2".to_string();
        let mut config = with_subnets(vec![existing]);
        config.deployment.route_table_id = "rtb-1".to_string();
        let (config, provenance) = migrate(config).unwrap();
        assert!(provenance.subnets_declared);
        assert_eq!(config.subnets()[0].route_table_id(), "rtb-1");
    }
}
