//! Defaults that depend on what the document contained, applied right after decoding.

use kubeaws_model::constants::{DEFAULT_INSTANCE_CIDR, HOSTED_ZONE_ID_PREFIX};
use kubeaws_model::ClusterConfig;
use log::debug;

/// Fills in the values the baseline can't know before the document is read. Applying this to
/// its own output changes nothing.
pub(crate) fn apply(mut config: ClusterConfig) -> ClusterConfig {
    let deployment = &mut config.deployment;

    // A document without subnets describes a single subnet through the legacy fields.
    if deployment.subnets.is_empty() && deployment.instance_cidr.is_empty() {
        debug!("No subnets given, using instanceCIDR {}", DEFAULT_INSTANCE_CIDR);
        deployment.instance_cidr = DEFAULT_INSTANCE_CIDR.to_string();
    }

    deployment.images.hyperkube_image.tag = deployment.k8s_ver.clone();
    config.hosted_zone_id = with_hosted_zone_id_prefix(&config.hosted_zone_id);
    config
}

/// Prefixes a bare Route 53 hosted zone id with `/hostedzone/`.
pub fn with_hosted_zone_id_prefix(id: &str) -> String {
    if id.is_empty() || id.starts_with(HOSTED_ZONE_ID_PREFIX) {
        id.to_string()
    } else {
        format!("{}{}", HOSTED_ZONE_ID_PREFIX, id)
    }
}

/// Makes a DNS name fully qualified by appending a trailing `.` when it is missing.
pub fn with_trailing_dot(name: &str) -> String {
    if name.is_empty() || name.ends_with('.') {
        name.to_string()
    } else {
        format!("{}.", name)
    }
}

#[cfg(test)]
mod test {
    use super::{apply, with_hosted_zone_id_prefix, with_trailing_dot};
    use kubeaws_model::{ClusterConfig, Configuration, Subnet};

    #[test]
    fn defaults_are_idempotent() {
        let config = ClusterConfig::from_yaml_str(
            r#"
kubernetesVersion: v1.6.0_coreos.0
hostedZoneId: Z1234
"#,
        )
        .unwrap();
        let once = apply(config);
        assert_eq!(once.deployment.instance_cidr, "10.0.0.0/24");
        assert_eq!(once.hosted_zone_id, "/hostedzone/Z1234");
        assert_eq!(
            once.deployment.images.hyperkube_image.tag,
            "v1.6.0_coreos.0"
        );
        let twice = apply(once.clone());
        assert_eq!(once, twice);
        assert_eq!(apply(ClusterConfig::default()), apply(apply(ClusterConfig::default())));
    }

    #[test]
    fn declared_subnets_leave_instance_cidr_alone() {
        let mut config = ClusterConfig::default();
        config.deployment.subnets = vec![Subnet::new_public("us-west-2a", "10.0.0.0/24")];
        let config = apply(config);
        assert!(config.deployment.instance_cidr.is_empty());
    }

    #[test]
    fn helpers() {
        assert_eq!(with_hosted_zone_id_prefix(""), "");
        assert_eq!(with_hosted_zone_id_prefix("/hostedzone/Z1"), "/hostedzone/Z1");
        assert_eq!(with_trailing_dot(""), "");
        assert_eq!(with_trailing_dot("example.com"), "example.com.");
        assert_eq!(with_trailing_dot("example.com."), "example.com.");
    }
}
