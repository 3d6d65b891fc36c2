use crate::constants::K8S_VERSION;
use serde::{Deserialize, Serialize};
use serde_plain::{
    derive_deserialize_from_fromstr, derive_display_from_serialize,
    derive_fromstr_from_deserialize, derive_serialize_from_display,
};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// The CoreOS release channel that node images are taken from.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseChannel {
    Alpha,
    Beta,
    Stable,
}

impl Default for ReleaseChannel {
    fn default() -> Self {
        Self::Stable
    }
}

derive_display_from_serialize!(ReleaseChannel);
derive_fromstr_from_deserialize!(ReleaseChannel);

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerRuntime {
    Docker,
    Rkt,
}

impl Default for ContainerRuntime {
    fn default() -> Self {
        Self::Docker
    }
}

derive_display_from_serialize!(ContainerRuntime);
derive_fromstr_from_deserialize!(ContainerRuntime);

/// A container image reference.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Image {
    pub repo: String,
    pub tag: String,
    /// Whether rkt should pull the image from a docker registry.
    pub rkt_pull_docker: bool,
}

impl Image {
    pub fn new<S1, S2>(repo: S1, tag: S2) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        Self {
            repo: repo.into(),
            tag: tag.into(),
            rkt_pull_docker: false,
        }
    }

    pub fn repo_with_tag(&self) -> String {
        format!("{}:{}", self.repo, self.tag)
    }

    /// The repository as rkt expects it, with the `docker://` scheme when pulling from docker.
    pub fn rkt_repo(&self) -> String {
        if self.rkt_pull_docker {
            format!("docker://{}", self.repo)
        } else {
            self.repo.clone()
        }
    }

    pub fn rkt_repo_with_tag(&self) -> String {
        format!("{}:{}", self.rkt_repo(), self.tag)
    }
}

/// The add-on images deployed to every cluster.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageSettings {
    pub hyperkube_image: Image,
    pub aws_cli_image: Image,
    pub calico_node_image: Image,
    pub calico_cni_image: Image,
    pub calico_ctl_image: Image,
    pub calico_policy_controller_image: Image,
    pub cluster_autoscaler_image: Image,
    pub kube_dns_image: Image,
    pub kube_dns_masq_image: Image,
    pub dns_masq_metrics_image: Image,
    pub exec_healthz_image: Image,
    pub heapster_image: Image,
    pub addon_resizer_image: Image,
    pub kube_dashboard_image: Image,
    pub pause_image: Image,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            hyperkube_image: Image::new("quay.io/coreos/hyperkube", K8S_VERSION),
            aws_cli_image: Image::new("quay.io/coreos/awscli", "master"),
            calico_node_image: Image::new("quay.io/calico/node", "v1.0.2"),
            calico_cni_image: Image::new("quay.io/calico/cni", "v1.5.6"),
            calico_ctl_image: Image::new("calico/ctl", "v1.0.0"),
            calico_policy_controller_image: Image::new(
                "quay.io/calico/kube-policy-controller",
                "v0.5.4",
            ),
            cluster_autoscaler_image: Image::new(
                "gcr.io/google_containers/cluster-proportional-autoscaler-amd64",
                "1.0.0",
            ),
            kube_dns_image: Image::new("gcr.io/google_containers/kubedns-amd64", "1.9"),
            kube_dns_masq_image: Image::new("gcr.io/google_containers/kube-dnsmasq-amd64", "1.4"),
            dns_masq_metrics_image: Image::new(
                "gcr.io/google_containers/dnsmasq-metrics-amd64",
                "1.0",
            ),
            exec_healthz_image: Image::new("gcr.io/google_containers/exechealthz-amd64", "1.2"),
            heapster_image: Image::new("gcr.io/google_containers/heapster", "v1.3.0"),
            addon_resizer_image: Image::new("gcr.io/google_containers/addon-resizer", "1.6"),
            kube_dashboard_image: Image::new(
                "gcr.io/google_containers/kubernetes-dashboard-amd64",
                "v1.5.1",
            ),
            pause_image: Image::new("gcr.io/google_containers/pause-amd64", "3.0"),
        }
    }
}

/// Represents a parsed OS release version. Examples of valid values when parsing:
/// - `1151.0.0`
/// - `1235.6`
/// - `v1298.1.0`
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ReleaseVersion {
    major: u32,
    minor: u32,
    patch: u32,
}

impl ReleaseVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    pub fn major(&self) -> u32 {
        self.major
    }

    pub fn parse<S: AsRef<str>>(s: S) -> std::result::Result<Self, String> {
        let original = s.as_ref();
        let no_v = original.strip_prefix('v').unwrap_or(original);
        let mut iter = no_v.split('.');
        let major = iter
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                format!(
                    "Unable to find the major version number when parsing '{}' as a release version",
                    original
                )
            })?
            .parse::<u32>()
            .map_err(|e| {
                format!(
                    "Error when parsing the major version number of '{}': {}",
                    original, e
                )
            })?;
        let minor = match iter.next() {
            Some(minor) => minor.parse::<u32>().map_err(|e| {
                format!(
                    "Error when parsing the minor version number of '{}': {}",
                    original, e
                )
            })?,
            None => 0,
        };
        let patch = match iter.next() {
            Some(patch) => patch.parse::<u32>().map_err(|e| {
                format!(
                    "Error when parsing the patch version number of '{}': {}",
                    original, e
                )
            })?,
            None => 0,
        };
        Ok(Self {
            major,
            minor,
            patch,
        })
    }
}

impl Display for ReleaseVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for ReleaseVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReleaseVersion::parse(s)
    }
}

derive_serialize_from_display!(ReleaseVersion);
derive_deserialize_from_fromstr!(ReleaseVersion, "release version such as 1151.0.0");

#[test]
fn release_version_invalid() {
    assert!(ReleaseVersion::parse("").is_err());
    assert!(ReleaseVersion::parse("1151.x").is_err());
}

#[test]
fn release_version_ordering() {
    let minimum = ReleaseVersion::new(1151, 0, 0);
    assert!(ReleaseVersion::parse("1122.2.0").unwrap() < minimum);
    assert!(ReleaseVersion::parse("v1151").unwrap() >= minimum);
    assert!(ReleaseVersion::parse("1235.6.1").unwrap() > minimum);
    assert_eq!(ReleaseVersion::parse("1298.1").unwrap().to_string(), "1298.1.0");
}

#[test]
fn image_references() {
    let mut image = Image::new("quay.io/coreos/hyperkube", "v1.5.5_coreos.0");
    assert_eq!(
        image.repo_with_tag(),
        "quay.io/coreos/hyperkube:v1.5.5_coreos.0"
    );
    assert_eq!(image.rkt_repo(), "quay.io/coreos/hyperkube");
    image.rkt_pull_docker = true;
    assert_eq!(
        image.rkt_repo_with_tag(),
        "docker://quay.io/coreos/hyperkube:v1.5.5_coreos.0"
    );
}
