// lib/src/lib.rs

pub mod chat;
pub mod config;
pub mod identity;
pub mod live;
pub mod records;
pub mod roster;
pub mod routes;
pub mod services;
pub mod storage_engine;

pub use crate::chat::{ChatLog, Inbox};
pub use crate::config::{AppConfig, RestConfig, SecurityConfig, StorageConfig, StorageEngineType};
pub use crate::identity::IdentityProvider;
pub use crate::live::{subscribe, LiveQuery, Snapshot};
pub use crate::records::{Appointments, ClinicalNotes, RecordBook};
pub use crate::roster::{LinkOutcome, PatientOnboarding, RosterManager};
pub use crate::routes::Route;
pub use crate::services::CareServices;
pub use crate::storage_engine::{create_storage, ChangeEvent, ChangeKind, DocumentStore, InMemoryStorage, SledStorage};
