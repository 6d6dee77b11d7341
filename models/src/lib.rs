// models/src/lib.rs

pub mod collections;
pub mod errors;
pub mod identifiers;
pub mod medical;
pub mod queries;
pub mod timestamps;

pub use errors::{AuthFailure, CareError, CareResult, LinkKind, ValidationError, ValidationResult};
pub use identifiers::{display_name_from_email, new_document_id, Email};
pub use medical::*;
pub use queries::{apply_updates, Direction, Document, FieldUpdate, Filter, FilterOp, OrderBy, Query};
