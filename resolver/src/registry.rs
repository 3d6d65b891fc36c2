use kubeaws_model::{Region, ReleaseChannel, ReleaseVersion};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Looks up machine images published for a release channel. Implementations typically query a
/// remote service; the resolver calls them at most twice per pass and never retries.
pub trait ImageRegistry {
    /// The image id of the current release of `channel` in `region`.
    fn lookup(&self, region: &Region, channel: ReleaseChannel) -> Result<String, RegistryError>;

    /// The current release version of `channel`.
    fn release_version(&self, channel: ReleaseChannel) -> Result<ReleaseVersion, RegistryError>;
}

/// An error reported by an `ImageRegistry`.
#[derive(Debug)]
pub struct RegistryError {
    message: String,
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl RegistryError {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn new_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.source {
            None => write!(f, "{}", self.message),
            Some(e) => write!(f, "{}: {}", self.message, e),
        }
    }
}

impl std::error::Error for RegistryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|some| some.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// An `ImageRegistry` backed by fixed tables, for offline use and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticImageRegistry {
    images: BTreeMap<(Region, ReleaseChannel), String>,
    versions: BTreeMap<ReleaseChannel, ReleaseVersion>,
}

impl StaticImageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image<S: Into<String>>(
        mut self,
        region: Region,
        channel: ReleaseChannel,
        image_id: S,
    ) -> Self {
        self.images.insert((region, channel), image_id.into());
        self
    }

    pub fn with_release_version(mut self, channel: ReleaseChannel, version: ReleaseVersion) -> Self {
        self.versions.insert(channel, version);
        self
    }
}

impl ImageRegistry for StaticImageRegistry {
    fn lookup(&self, region: &Region, channel: ReleaseChannel) -> Result<String, RegistryError> {
        self.images
            .get(&(region.clone(), channel))
            .cloned()
            .ok_or_else(|| {
                RegistryError::new(format!(
                    "no image published for region '{}' on the {} channel",
                    region, channel
                ))
            })
    }

    fn release_version(&self, channel: ReleaseChannel) -> Result<ReleaseVersion, RegistryError> {
        self.versions.get(&channel).copied().ok_or_else(|| {
            RegistryError::new(format!("no release information for the {} channel", channel))
        })
    }
}

#[cfg(test)]
mod test {
    use super::{ImageRegistry, StaticImageRegistry};
    use kubeaws_model::{Region, ReleaseChannel, ReleaseVersion};

    #[test]
    fn static_lookup() {
        let registry = StaticImageRegistry::new()
            .with_image(Region::new("us-west-2"), ReleaseChannel::Stable, "ami-0123")
            .with_release_version(ReleaseChannel::Beta, ReleaseVersion::new(1185, 1, 0));
        assert_eq!(
            registry
                .lookup(&Region::new("us-west-2"), ReleaseChannel::Stable)
                .unwrap(),
            "ami-0123"
        );
        let error = registry
            .lookup(&Region::new("us-west-2"), ReleaseChannel::Alpha)
            .unwrap_err();
        assert_eq!(
            error.to_string(),
            "no image published for region 'us-west-2' on the alpha channel"
        );
        assert_eq!(
            registry.release_version(ReleaseChannel::Beta).unwrap(),
            ReleaseVersion::new(1185, 1, 0)
        );
        assert!(registry.release_version(ReleaseChannel::Stable).is_err());
    }
}
