// lib/src/services.rs

use std::sync::Arc;

use crate::chat::{ChatLog, Inbox};
use crate::config::StorageConfig;
use crate::identity::IdentityProvider;
use crate::records::{Appointments, ClinicalNotes, RecordBook};
use crate::roster::RosterManager;
use crate::storage_engine::DocumentStore;

/// Every collection-level service built over one store and one identity
/// provider. Cheap to clone; all members share the same store.
#[derive(Debug, Clone)]
pub struct CareServices {
    pub store: Arc<dyn DocumentStore>,
    pub identities: Arc<dyn IdentityProvider>,
    pub roster: RosterManager,
    pub appointments: Appointments,
    pub notes: ClinicalNotes,
    pub chat: ChatLog,
    pub inbox: Inbox,
    pub subscription_buffer: usize,
}

impl CareServices {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        identities: Arc<dyn IdentityProvider>,
        config: &StorageConfig,
    ) -> Self {
        let buffer = config.subscription_buffer;
        CareServices {
            roster: RosterManager::new(store.clone(), identities.clone(), buffer),
            appointments: RecordBook::new(store.clone(), buffer),
            notes: RecordBook::new(store.clone(), buffer),
            chat: ChatLog::new(store.clone(), buffer),
            inbox: Inbox::new(store.clone()),
            store,
            identities,
            subscription_buffer: buffer,
        }
    }
}
