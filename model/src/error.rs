use snafu::Snafu;

#[derive(Debug, Snafu)]
pub struct Error(OpaqueError);
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub(crate) enum OpaqueError {
    #[snafu(display("Failed to parse cluster: {}", source))]
    ConfigDeserialization { source: serde_yaml::Error },

    #[snafu(display("Failed to serialize cluster: {}", source))]
    ConfigSerialization { source: serde_yaml::Error },

    #[snafu(display("Failed to serialize cluster: expected a mapping but got something else."))]
    ConfigWrongValueType {},
}
