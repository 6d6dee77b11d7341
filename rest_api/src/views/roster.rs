// rest_api/src/views/roster.rs

use carebridge_lib::live::{LiveQuery, Snapshot};
use carebridge_lib::services::CareServices;
use log::debug;
use models::errors::{CareError, CareResult};
use models::medical::PatientRecord;
use security::SessionWatcher;

use super::signed_in;

#[derive(Debug, Clone, PartialEq)]
pub enum RosterUpdate {
    Patients(Vec<PatientRecord>),
    Closed,
}

enum Event {
    SignedOut,
    Patients(Option<CareResult<Snapshot<PatientRecord>>>),
}

/// The signed-in doctor's patient list, kept current as links change.
#[derive(Debug)]
pub struct RosterView {
    doctor_id: String,
    patients: LiveQuery<PatientRecord>,
    session: SessionWatcher,
    closed: bool,
}

impl RosterView {
    pub fn open(services: &CareServices, session: SessionWatcher) -> CareResult<Self> {
        let principal = signed_in(&session)?;
        let Some(doctor) = principal.as_doctor() else {
            return Err(CareError::Forbidden("patient roster".to_string()));
        };
        let patients = services.roster.watch_patients_for_doctor(&doctor.uid);
        debug!("Opened roster for doctor {}", doctor.uid);
        Ok(RosterView { doctor_id: doctor.uid.clone(), patients, session, closed: false })
    }

    pub async fn next_update(&mut self) -> CareResult<RosterUpdate> {
        if self.closed {
            return Ok(RosterUpdate::Closed);
        }
        let event = tokio::select! {
            _ = self.session.signed_out() => Event::SignedOut,
            next = self.patients.next_snapshot() => Event::Patients(next),
        };
        match event {
            Event::Patients(Some(Ok(snapshot))) => Ok(RosterUpdate::Patients(snapshot.items)),
            Event::Patients(Some(Err(e))) => Err(e),
            Event::SignedOut | Event::Patients(None) => {
                self.close();
                Ok(RosterUpdate::Closed)
            }
        }
    }

    pub fn close(&mut self) {
        if !self.closed {
            self.patients.unsubscribe();
            self.closed = true;
            debug!("Closed roster for doctor {}", self.doctor_id);
        }
    }
}
