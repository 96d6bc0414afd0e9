use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::CoreError;

macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident, $field:literal, { $($variant:ident => $value:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
        pub enum $name {
            $(
                #[serde(rename = $value)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $value,)+
                }
            }

            pub fn valid_values() -> Vec<&'static str> {
                Self::ALL.iter().map(|v| v.as_str()).collect()
            }

            /// Parse the canonical name; the error lists every accepted value.
            pub fn parse(value: &str) -> Result<Self, CoreError> {
                match value {
                    $($value => Ok($name::$variant),)+
                    other => Err(CoreError::invalid_field(
                        $field,
                        format!(
                            "Invalid {} '{}'. Valid values are: {}",
                            $field,
                            other,
                            Self::valid_values().join(", ")
                        ),
                    )),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_enum!(
    /// Kind of compute hardware.
    ResourceType, "type", {
        Cpu => "CPU",
        Gpu => "GPU",
        Tpu => "TPU",
    }
);

string_enum!(
    ResourceStatus, "status", {
        Available => "AVAILABLE",
        InUse => "IN_USE",
        Maintenance => "MAINTENANCE",
        Retired => "RETIRED",
    }
);

string_enum!(
    GrantStatus, "status", {
        Pending => "PENDING",
        Active => "ACTIVE",
        Closed => "CLOSED",
        Rejected => "REJECTED",
    }
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CoreErrorKind;

    #[test]
    fn parses_canonical_names() {
        assert_eq!(ResourceType::parse("GPU").unwrap(), ResourceType::Gpu);
        assert_eq!(ResourceStatus::parse("IN_USE").unwrap(), ResourceStatus::InUse);
        assert_eq!(GrantStatus::parse("CLOSED").unwrap().as_str(), "CLOSED");
    }

    #[test]
    fn rejection_lists_valid_values() {
        let err = ResourceType::parse("QPU").unwrap_err();
        assert_eq!(err.kind(), CoreErrorKind::Validation);
        assert!(err.message().contains("CPU, GPU, TPU"));
        assert_eq!(err.fields().and_then(|f| f.get("field")).map(String::as_str), Some("type"));
    }

    #[test]
    fn serde_uses_canonical_names() {
        let json = serde_json::to_string(&ResourceStatus::InUse).unwrap();
        assert_eq!(json, "\"IN_USE\"");
    }
}
