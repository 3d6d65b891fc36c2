use serde::{Deserialize, Serialize};

/// A reference to a route table that already exists outside of the cluster's stack.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RouteTable {
    pub id: String,
    pub id_from_stack_output: String,
}

impl RouteTable {
    pub fn has_identifier(&self) -> bool {
        !self.id.is_empty() || !self.id_from_stack_output.is_empty()
    }
}

/// The NAT gateway settings of a private subnet. When an identifier is given the gateway already
/// exists; otherwise one is provisioned alongside the cluster.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NatGatewayConfig {
    pub id: String,
    pub id_from_stack_output: String,
    /// An existing elastic IP to attach to a provisioned gateway.
    pub eip_allocation_id: String,
}

impl NatGatewayConfig {
    pub fn has_identifier(&self) -> bool {
        !self.id.is_empty() || !self.id_from_stack_output.is_empty()
    }

    /// Whether any gateway setting was supplied at all.
    pub fn is_configured(&self) -> bool {
        self.has_identifier() || !self.eip_allocation_id.is_empty()
    }
}

/// A subnet of the cluster's VPC. A subnet is either described structurally (availability zone
/// and CIDR) and created with the cluster, or it references an existing subnet by identifier.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Subnet {
    pub name: String,
    pub availability_zone: String,
    #[serde(rename = "instanceCIDR")]
    pub instance_cidr: String,
    /// `None` when the document leaves the subnet's visibility unspecified, which means public.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private: Option<bool>,
    pub id: String,
    pub id_from_stack_output: String,
    pub route_table: RouteTable,
    pub nat_gateway: NatGatewayConfig,
}

impl Subnet {
    pub fn new_public<S1, S2>(availability_zone: S1, instance_cidr: S2) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        Self {
            availability_zone: availability_zone.into(),
            instance_cidr: instance_cidr.into(),
            ..Default::default()
        }
    }

    pub fn new_private<S1, S2>(availability_zone: S1, instance_cidr: S2) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        Self {
            private: Some(true),
            ..Self::new_public(availability_zone, instance_cidr)
        }
    }

    /// A subnet that only carries a name, as node groups use to refer to subnets.
    pub fn named<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn is_private(&self) -> bool {
        self.private.unwrap_or(false)
    }

    pub fn public(&self) -> bool {
        !self.is_private()
    }

    /// Whether the document marked the subnet public with an explicit `private: false`.
    pub fn declared_public(&self) -> bool {
        self.private == Some(false)
    }

    /// Whether the subnet references an existing subnet rather than describing a new one.
    pub fn has_identifier(&self) -> bool {
        !self.id.is_empty() || !self.id_from_stack_output.is_empty()
    }

    pub fn route_table_id(&self) -> &str {
        &self.route_table.id
    }

    pub fn manage_route_table(&self) -> bool {
        !self.route_table.has_identifier()
    }

    /// A private subnet needs a NAT gateway for egress unless its routing is provided by an
    /// existing route table.
    pub fn requests_nat_gateway(&self) -> bool {
        self.is_private() && self.manage_route_table()
    }

    pub fn manage_nat_gateway(&self) -> bool {
        self.requests_nat_gateway() && !self.nat_gateway.has_identifier()
    }

    /// The subnet name as a stack template resource name, e.g. `private-1a` becomes `Private1a`.
    pub fn logical_name(&self) -> String {
        resource_name(&self.name)
    }
}

/// Removes hyphens and capitalises the first letter so that `name` is usable as a stack template
/// resource name.
pub(crate) fn resource_name(name: &str) -> String {
    let stripped = name.replace('-', "");
    let mut chars = stripped.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// A NAT gateway serving one private subnet.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum NatGateway {
    /// Provisioned with the cluster in a public subnet of the private subnet's availability zone.
    #[serde(rename_all = "camelCase")]
    Managed {
        config: NatGatewayConfig,
        private_subnet: Subnet,
        public_subnet: Subnet,
    },
    /// An existing gateway referenced by identifier.
    #[serde(rename_all = "camelCase")]
    Unmanaged {
        config: NatGatewayConfig,
        private_subnet: Subnet,
    },
}

impl NatGateway {
    pub fn managed(config: NatGatewayConfig, private_subnet: Subnet, public_subnet: Subnet) -> Self {
        Self::Managed {
            config,
            private_subnet,
            public_subnet,
        }
    }

    pub fn unmanaged(config: NatGatewayConfig, private_subnet: Subnet) -> Self {
        Self::Unmanaged {
            config,
            private_subnet,
        }
    }

    pub fn is_managed(&self) -> bool {
        matches!(self, Self::Managed { .. })
    }

    pub fn config(&self) -> &NatGatewayConfig {
        match self {
            Self::Managed { config, .. } => config,
            Self::Unmanaged { config, .. } => config,
        }
    }

    pub fn private_subnet(&self) -> &Subnet {
        match self {
            Self::Managed { private_subnet, .. } => private_subnet,
            Self::Unmanaged { private_subnet, .. } => private_subnet,
        }
    }

    /// The public subnet hosting a managed gateway.
    pub fn public_subnet(&self) -> Option<&Subnet> {
        match self {
            Self::Managed { public_subnet, .. } => Some(public_subnet),
            Self::Unmanaged { .. } => None,
        }
    }

    pub fn is_connected_to_private_subnet(&self, subnet: &Subnet) -> bool {
        self.private_subnet().name == subnet.name
    }

    pub fn logical_name(&self) -> String {
        format!("NatGateway{}", self.private_subnet().logical_name())
    }

    /// A reference to the gateway as it appears in the stack template.
    pub fn reference(&self) -> String {
        let config = self.config();
        match self {
            Self::Managed { .. } => format!(r#"{{ "Ref" : {:?} }}"#, self.logical_name()),
            Self::Unmanaged { .. } if !config.id.is_empty() => format!("{:?}", config.id),
            Self::Unmanaged { .. } => format!(
                r#"{{ "Fn::ImportValue" : {:?} }}"#,
                config.id_from_stack_output
            ),
        }
    }
}

#[cfg(test)]
mod test {
    use super::{NatGateway, NatGatewayConfig, Subnet};

    #[test]
    fn logical_names() {
        let mut subnet = Subnet::new_private("us-west-2a", "10.0.1.0/24");
        subnet.name = "private-1a".to_string();
        assert_eq!(subnet.logical_name(), "Private1a");
        let gateway = NatGateway::managed(
            NatGatewayConfig::default(),
            subnet.clone(),
            Subnet::new_public("us-west-2a", "10.0.0.0/24"),
        );
        assert_eq!(gateway.logical_name(), "NatGatewayPrivate1a");
        assert_eq!(gateway.reference(), r#"{ "Ref" : "NatGatewayPrivate1a" }"#);
        assert!(gateway.is_connected_to_private_subnet(&Subnet::named("private-1a")));
    }

    #[test]
    fn existing_route_table_needs_no_gateway() {
        let mut subnet = Subnet::new_private("us-west-2a", "10.0.1.0/24");
        assert!(subnet.manage_nat_gateway());
        subnet.nat_gateway.id = "nat-0123".to_string();
        assert!(subnet.requests_nat_gateway());
        assert!(!subnet.manage_nat_gateway());
        subnet.route_table.id = "rtb-0123".to_string();
        assert!(!subnet.requests_nat_gateway());
    }

    #[test]
    fn unmanaged_references() {
        let config = NatGatewayConfig {
            id_from_stack_output: "network-NatGateway".to_string(),
            ..Default::default()
        };
        let gateway =
            NatGateway::unmanaged(config, Subnet::new_private("us-west-2a", "10.0.1.0/24"));
        assert!(!gateway.is_managed());
        assert!(gateway.public_subnet().is_none());
        assert_eq!(
            gateway.reference(),
            r#"{ "Fn::ImportValue" : "network-NatGateway" }"#
        );
    }
}
