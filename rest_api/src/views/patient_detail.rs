// rest_api/src/views/patient_detail.rs

use carebridge_lib::live::{LiveQuery, Snapshot};
use carebridge_lib::services::CareServices;
use log::debug;
use models::errors::{CareError, CareResult};
use models::medical::{Appointment, ClinicalNote, PatientRecord};
use models::queries::Direction;
use security::SessionWatcher;

use super::{authorize_patient_access, signed_in};

#[derive(Debug, Clone, PartialEq)]
pub enum DetailUpdate {
    /// Full replacement of the appointment list, newest date first.
    Appointments(Vec<Appointment>),
    /// Full replacement of the note list, newest date first.
    Notes(Vec<ClinicalNote>),
    Closed,
}

enum Event {
    SignedOut,
    Appointments(Option<CareResult<Snapshot<Appointment>>>),
    Notes(Option<CareResult<Snapshot<ClinicalNote>>>),
}

/// The doctor dashboard's selected patient, with live appointments and notes.
#[derive(Debug)]
pub struct PatientDetailView {
    patient: PatientRecord,
    appointments: LiveQuery<Appointment>,
    notes: LiveQuery<ClinicalNote>,
    session: SessionWatcher,
    closed: bool,
}

impl PatientDetailView {
    /// Requires a signed-in doctor who has `patient_id` on their roster.
    pub async fn open(
        services: &CareServices,
        patient_id: &str,
        session: SessionWatcher,
    ) -> CareResult<Self> {
        let principal = signed_in(&session)?;
        if principal.as_doctor().is_none() {
            return Err(CareError::Forbidden("patient detail".to_string()));
        }
        let patient = authorize_patient_access(services, &principal, patient_id).await?;

        let appointments = services.appointments.subscribe_for(patient_id, Direction::Desc);
        let notes = services.notes.subscribe_for(patient_id, Direction::Desc);
        debug!("Opened detail view of patient {} for {}", patient_id, principal.uid());
        Ok(PatientDetailView { patient, appointments, notes, session, closed: false })
    }

    pub fn patient(&self) -> &PatientRecord {
        &self.patient
    }

    pub fn is_open(&self) -> bool {
        !self.closed
    }

    /// Waits for the next change on either list. Returns `Closed` for good
    /// once the session ends or the view is closed.
    pub async fn next_update(&mut self) -> CareResult<DetailUpdate> {
        if self.closed {
            return Ok(DetailUpdate::Closed);
        }
        let event = tokio::select! {
            _ = self.session.signed_out() => Event::SignedOut,
            next = self.appointments.next_snapshot() => Event::Appointments(next),
            next = self.notes.next_snapshot() => Event::Notes(next),
        };
        match event {
            Event::Appointments(Some(Ok(snapshot))) => Ok(DetailUpdate::Appointments(snapshot.items)),
            Event::Notes(Some(Ok(snapshot))) => Ok(DetailUpdate::Notes(snapshot.items)),
            Event::Appointments(Some(Err(e))) | Event::Notes(Some(Err(e))) => Err(e),
            Event::SignedOut | Event::Appointments(None) | Event::Notes(None) => {
                self.close();
                Ok(DetailUpdate::Closed)
            }
        }
    }

    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.appointments.unsubscribe();
        self.notes.unsubscribe();
        self.closed = true;
        debug!("Closed detail view of patient {}", self.patient.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::tests::{doctor_fixture, Fixture};
    use models::medical::{NewAppointment, NewClinicalNote};
    use std::time::Duration;
    use tokio::time::timeout;

    async fn next(view: &mut PatientDetailView) -> DetailUpdate {
        timeout(Duration::from_secs(2), view.next_update()).await.unwrap().unwrap()
    }

    /// Drains the two initial snapshots, whichever arrives first.
    async fn initial(view: &mut PatientDetailView) {
        let mut seen = (false, false);
        while !(seen.0 && seen.1) {
            match next(view).await {
                DetailUpdate::Appointments(items) => {
                    assert!(items.is_empty());
                    seen.0 = true;
                }
                DetailUpdate::Notes(items) => {
                    assert!(items.is_empty());
                    seen.1 = true;
                }
                DetailUpdate::Closed => panic!("closed before initial snapshots"),
            }
        }
    }

    #[tokio::test]
    async fn new_records_replace_the_lists() {
        let Fixture { services, cell, doctor, patient_id } = doctor_fixture().await;
        let mut view = PatientDetailView::open(&services, &patient_id, cell.subscribe()).await.unwrap();
        initial(&mut view).await;

        let appt = Appointment::schedule(
            &doctor,
            &patient_id,
            &NewAppointment { date: "2030-01-01T09:00".into(), ..Default::default() },
        )
        .unwrap();
        services.appointments.create(&appt).await.unwrap();
        match next(&mut view).await {
            DetailUpdate::Appointments(items) => assert_eq!(items.len(), 1),
            other => panic!("unexpected {:?}", other),
        }

        let note = ClinicalNote::write(
            &doctor,
            &patient_id,
            &NewClinicalNote { diagnosis: "Flu".into(), treatment: "Rest".into() },
        )
        .unwrap();
        services.notes.create(&note).await.unwrap();
        match next(&mut view).await {
            DetailUpdate::Notes(items) => assert_eq!(items[0].diagnosis, "Flu"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn sign_out_closes_the_view() {
        let Fixture { services, cell, patient_id, .. } = doctor_fixture().await;
        let mut view = PatientDetailView::open(&services, &patient_id, cell.subscribe()).await.unwrap();
        initial(&mut view).await;

        cell.clear();
        assert_eq!(next(&mut view).await, DetailUpdate::Closed);
        assert!(!view.is_open());
        assert_eq!(next(&mut view).await, DetailUpdate::Closed);
    }

    #[tokio::test]
    async fn opening_requires_a_session_and_the_patient_in_care() {
        let Fixture { services, cell, patient_id, .. } = doctor_fixture().await;

        let result = PatientDetailView::open(&services, "someone-else", cell.subscribe()).await;
        assert!(matches!(result, Err(CareError::NotFound(_))));

        cell.clear();
        let result = PatientDetailView::open(&services, &patient_id, cell.subscribe()).await;
        assert!(matches!(result, Err(CareError::Unauthenticated)));
    }
}
