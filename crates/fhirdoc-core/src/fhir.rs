use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use crate::error::CoreError;

/// FHIR version enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum FhirVersion {
    #[serde(rename = "1.0.2")]
    Dstu2,
    #[default]
    #[serde(rename = "4.0.1")]
    R4,
    #[serde(rename = "4.3.0")]
    R4B,
    #[serde(rename = "5.0.0")]
    R5,
}

impl fmt::Display for FhirVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FhirVersion::Dstu2 => write!(f, "1.0.2"),
            FhirVersion::R4 => write!(f, "4.0.1"),
            FhirVersion::R4B => write!(f, "4.3.0"),
            FhirVersion::R5 => write!(f, "5.0.0"),
        }
    }
}

impl FromStr for FhirVersion {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "1.0.2" | "DSTU2" => Ok(FhirVersion::Dstu2),
            "4.0.1" | "R4" => Ok(FhirVersion::R4),
            "4.3.0" | "R4B" => Ok(FhirVersion::R4B),
            "5.0.0" | "R5" => Ok(FhirVersion::R5),
            _ => Err(CoreError::unknown_fhir_version(s)),
        }
    }
}

/// Resource types known to the server.
///
/// Only `Composition` is backed by a provider. Any other syntactically valid
/// name parses into `Custom` so routing can report it as unsupported instead
/// of malformed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    Composition,
    #[serde(untagged)]
    Custom(String),
}

impl ResourceType {
    pub fn as_str(&self) -> &str {
        match self {
            ResourceType::Composition => "Composition",
            ResourceType::Custom(name) => name,
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Composition" => Ok(ResourceType::Composition),
            name => {
                if is_valid_resource_type_name(name) {
                    Ok(ResourceType::Custom(name.to_string()))
                } else {
                    Err(CoreError::invalid_resource_type(name.to_string()))
                }
            }
        }
    }
}

/// Validate if a string is a valid FHIR resource type name
pub fn is_valid_resource_type_name(name: &str) -> bool {
    // FHIR resource type names must start with uppercase letter and contain only letters
    name.chars().next().is_some_and(|c| c.is_ascii_uppercase())
        && name.chars().all(|c| c.is_ascii_alphabetic())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fhir_version_display() {
        assert_eq!(FhirVersion::Dstu2.to_string(), "1.0.2");
        assert_eq!(FhirVersion::R4.to_string(), "4.0.1");
        assert_eq!(FhirVersion::R5.to_string(), "5.0.0");
    }

    #[test]
    fn test_fhir_version_from_str() {
        assert_eq!(FhirVersion::from_str("DSTU2").unwrap(), FhirVersion::Dstu2);
        assert_eq!(FhirVersion::from_str("r4").unwrap(), FhirVersion::R4);
        assert_eq!(FhirVersion::from_str("4.3.0").unwrap(), FhirVersion::R4B);
        assert_eq!(FhirVersion::from_str("R5").unwrap(), FhirVersion::R5);

        assert!(FhirVersion::from_str("invalid").is_err());
        assert!(FhirVersion::from_str("4.0.0").is_err());
    }

    #[test]
    fn test_fhir_version_default() {
        assert_eq!(FhirVersion::default(), FhirVersion::R4);
    }

    #[test]
    fn test_fhir_version_serialization() {
        let json = serde_json::to_string(&FhirVersion::Dstu2).unwrap();
        assert_eq!(json, "\"1.0.2\"");

        let version: FhirVersion = serde_json::from_str("\"4.0.1\"").unwrap();
        assert_eq!(version, FhirVersion::R4);
    }

    #[test]
    fn test_resource_type_from_str() {
        assert_eq!(
            ResourceType::from_str("Composition").unwrap(),
            ResourceType::Composition
        );
        assert_eq!(
            ResourceType::from_str("Patient").unwrap(),
            ResourceType::Custom("Patient".to_string())
        );
        assert_eq!(
            ResourceType::from_str("Bundle").unwrap(),
            ResourceType::Custom("Bundle".to_string())
        );

        assert!(ResourceType::from_str("composition").is_err());
        assert!(ResourceType::from_str("Invalid123").is_err());
        assert!(ResourceType::from_str("").is_err());
    }

    #[test]
    fn test_resource_type_serde() {
        let json = serde_json::to_string(&ResourceType::Composition).unwrap();
        assert_eq!(json, "\"Composition\"");

        let custom: ResourceType = serde_json::from_str("\"Observation\"").unwrap();
        assert_eq!(custom, ResourceType::Custom("Observation".to_string()));
        assert_eq!(custom.to_string(), "Observation");
    }

    #[test]
    fn test_is_valid_resource_type_name() {
        assert!(is_valid_resource_type_name("Composition"));
        assert!(is_valid_resource_type_name("A"));

        assert!(!is_valid_resource_type_name("composition"));
        assert!(!is_valid_resource_type_name("Composition-1"));
        assert!(!is_valid_resource_type_name(""));
    }

    #[test]
    fn test_error_messages() {
        match ResourceType::from_str("invalidType") {
            Err(CoreError::InvalidResourceType(msg)) => {
                assert!(msg.contains("invalidType"));
            }
            _ => panic!("Expected InvalidResourceType error"),
        }
    }
}
