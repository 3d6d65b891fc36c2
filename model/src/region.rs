use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// An AWS region such as `us-west-2`. The region is left empty by the baseline configuration.
#[derive(Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Region(String);

impl Region {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Regions in the China partition.
    pub fn is_china(&self) -> bool {
        self.0.starts_with("cn-")
    }

    /// KMS is unavailable in the China partition, so assets can't be encrypted there.
    pub fn supports_kms(&self) -> bool {
        !self.is_china()
    }
}

impl Display for Region {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

#[test]
fn china_regions() {
    let region = Region::new("cn-north-1");
    assert!(region.is_china());
    assert!(!region.supports_kms());

    let region = Region::new("us-east-1");
    assert!(region.supports_kms());
}
