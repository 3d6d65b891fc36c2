use crate::error::{self, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use snafu::ResultExt;
use std::fmt::Debug;

/// The `Configuration` trait is for documents that are decoded by overlaying user-supplied fields
/// onto a baseline. Implementors use `#[serde(default)]` so that any field missing from the
/// document keeps the value produced by `Default::default()`:
///
/// ```yaml
/// clusterName: my-cluster
/// # every other field keeps its baseline value
/// ```
///
pub trait Configuration: Serialize + DeserializeOwned + Clone + Debug + Default + Sized {
    /// Decode a YAML document. An empty document yields the baseline.
    fn from_yaml_str(document: &str) -> Result<Self> {
        if document.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(document).context(error::ConfigDeserializationSnafu)?)
    }

    /// Decode the `Configuration` object from a YAML `Value`.
    fn from_value(value: Value) -> Result<Self> {
        if value.is_null() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_value(value).context(error::ConfigDeserializationSnafu)?)
    }

    /// Convert the `Configuration` object to a YAML `Value`.
    fn to_value(&self) -> Result<Value> {
        Ok(serde_yaml::to_value(self).context(error::ConfigSerializationSnafu)?)
    }

    /// Convert the `Configuration` object to a YAML `Mapping`.
    fn to_mapping(&self) -> Result<Mapping> {
        match self.to_value()? {
            Value::Mapping(mapping) => Ok(mapping),
            _ => Err(error::ConfigWrongValueTypeSnafu {}.build().into()),
        }
    }

    /// Render the `Configuration` object as a YAML document.
    fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self).context(error::ConfigSerializationSnafu)?)
    }
}
