pub mod composition;
pub mod error;
pub mod fhir;
pub mod id;
pub mod resource;
pub mod time;

pub use composition::{Composition, Identifier};
pub use error::{CoreError, ErrorCategory, Result};
pub use fhir::{FhirVersion, ResourceType};
pub use id::{IdError, IdSequence, ResourceId};
pub use resource::{ResourceMeta, Versioned};
pub use time::{FhirDateTime, now_utc, now_utc_seconds};
