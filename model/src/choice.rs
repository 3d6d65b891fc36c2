use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// A setting restricted to a closed set of values.
///
/// Values constructed in code are always `Known`. A decoded document may contain a string that
/// is not one of the allowed values; it is kept as `Unknown` so that validation can report the
/// offending field rather than failing the whole decode.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum Choice<T> {
    Known(T),
    Unknown(String),
}

impl<T> Choice<T> {
    pub fn known(&self) -> Option<&T> {
        match self {
            Choice::Known(value) => Some(value),
            Choice::Unknown(_) => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Choice::Known(_))
    }
}

impl<T: PartialEq> Choice<T> {
    /// Returns `true` when the setting holds exactly `value`.
    pub fn is(&self, value: &T) -> bool {
        self.known() == Some(value)
    }
}

impl<T: Copy> Choice<T> {
    pub fn get(&self) -> Option<T> {
        self.known().copied()
    }
}

impl<T> From<T> for Choice<T> {
    fn from(value: T) -> Self {
        Choice::Known(value)
    }
}

impl<T: Default> Default for Choice<T> {
    fn default() -> Self {
        Choice::Known(T::default())
    }
}

impl<T: Display> Display for Choice<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Choice::Known(value) => Display::fmt(value, f),
            Choice::Unknown(raw) => Display::fmt(raw, f),
        }
    }
}

impl<T: Serialize> Serialize for Choice<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Choice::Known(value) => value.serialize(serializer),
            Choice::Unknown(raw) => serializer.serialize_str(raw),
        }
    }
}

impl<'de, T: FromStr> Deserialize<'de> for Choice<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(match raw.parse::<T>() {
            Ok(value) => Choice::Known(value),
            Err(_) => Choice::Unknown(raw),
        })
    }
}

#[cfg(test)]
mod test {
    use super::Choice;
    use crate::VolumeType;

    #[test]
    fn known_value() {
        let choice: Choice<VolumeType> = serde_yaml::from_str("io1").unwrap();
        assert_eq!(choice, Choice::Known(VolumeType::Io1));
        assert!(choice.is(&VolumeType::Io1));
        assert_eq!(choice.to_string(), "io1");
    }

    #[test]
    fn unknown_value_is_kept() {
        let choice: Choice<VolumeType> = serde_yaml::from_str("sc1").unwrap();
        assert_eq!(choice, Choice::Unknown("sc1".to_string()));
        assert!(!choice.is_known());
        assert_eq!(serde_yaml::to_string(&choice).unwrap().trim_end(), "---\nsc1");
    }
}
