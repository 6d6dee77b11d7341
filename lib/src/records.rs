// lib/src/records.rs

use std::marker::PhantomData;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{info, warn};
use models::errors::{CareError, CareResult};
use models::medical::{Appointment, CareRecord, ClinicalNote};
use models::queries::{Direction, Query};
use models::timestamps::appointment_cutoff;

use crate::live::{subscribe, LiveQuery};
use crate::storage_engine::DocumentStore;

/// Patient-scoped collection of doctor-authored records.
#[derive(Debug)]
pub struct RecordBook<T> {
    store: Arc<dyn DocumentStore>,
    subscription_buffer: usize,
    _marker: PhantomData<fn() -> T>,
}

pub type Appointments = RecordBook<Appointment>;
pub type ClinicalNotes = RecordBook<ClinicalNote>;

impl<T> Clone for RecordBook<T> {
    fn clone(&self) -> Self {
        RecordBook {
            store: self.store.clone(),
            subscription_buffer: self.subscription_buffer,
            _marker: PhantomData,
        }
    }
}

impl<T: CareRecord> RecordBook<T> {
    pub fn new(store: Arc<dyn DocumentStore>, subscription_buffer: usize) -> Self {
        RecordBook { store, subscription_buffer, _marker: PhantomData }
    }

    fn patient_query(patient_id: &str, order_by: &str, direction: Direction) -> Query {
        Query::new().where_eq("patientId", patient_id).order_by(order_by, direction)
    }

    /// Stores `record` and returns its new id.
    pub async fn create(&self, record: &T) -> CareResult<String> {
        let id = self.store.create(T::COLLECTION, serde_json::to_value(record)?).await?;
        info!("Created {}/{} for patient {}", T::COLLECTION, id, record.patient_id());
        Ok(id)
    }

    pub async fn get(&self, id: &str) -> CareResult<Option<T>> {
        match self.store.get(T::COLLECTION, id).await? {
            Some(doc) => Ok(Some(doc.decode()?)),
            None => Ok(None),
        }
    }

    pub async fn list_for(
        &self,
        patient_id: &str,
        order_by: &str,
        direction: Direction,
    ) -> CareResult<Vec<T>> {
        self.store
            .query(T::COLLECTION, &Self::patient_query(patient_id, order_by, direction))
            .await?
            .iter()
            .map(|doc| doc.decode())
            .collect()
    }

    pub fn subscribe_for(&self, patient_id: &str, direction: Direction) -> LiveQuery<T> {
        subscribe(
            self.store.clone(),
            T::COLLECTION,
            Self::patient_query(patient_id, T::ORDER_FIELD, direction),
            self.subscription_buffer,
        )
    }

    /// Deletes the record when `acting_doctor_id` authored it.
    pub async fn delete(&self, id: &str, acting_doctor_id: &str) -> CareResult<()> {
        let record = self
            .get(id)
            .await?
            .ok_or_else(|| CareError::NotFound(format!("{}/{}", T::COLLECTION, id)))?;
        if record.doctor_id() != acting_doctor_id {
            warn!(
                "Doctor {} tried to delete {}/{} owned by {}",
                acting_doctor_id,
                T::COLLECTION,
                id,
                record.doctor_id()
            );
            return Err(CareError::NotOwner(id.to_string()));
        }
        self.store.delete(T::COLLECTION, id).await?;
        info!("Deleted {}/{}", T::COLLECTION, id);
        Ok(())
    }
}

impl RecordBook<Appointment> {
    /// Appointments at or after `now`, soonest first.
    pub async fn upcoming_for(
        &self,
        patient_id: &str,
        now: DateTime<Utc>,
    ) -> CareResult<Vec<Appointment>> {
        let query = Query::new()
            .where_eq("patientId", patient_id)
            .where_gte("date", appointment_cutoff(now))
            .order_by("date", Direction::Asc);
        self.store
            .query(Appointment::COLLECTION, &query)
            .await?
            .iter()
            .map(|doc| doc.decode())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage_engine::InMemoryStorage;
    use chrono::TimeZone;
    use models::identifiers::Email;
    use models::medical::{DoctorPrincipal, NewAppointment, NewClinicalNote};
    use std::time::Duration;
    use tokio::time::timeout;

    fn doctor(uid: &str) -> DoctorPrincipal {
        DoctorPrincipal {
            uid: uid.to_string(),
            email: Email::parse(&format!("{}@clinic.org", uid)).unwrap(),
            display_name: uid.to_string(),
        }
    }

    fn at(date: &str) -> NewAppointment {
        NewAppointment { date: date.to_string(), ..Default::default() }
    }

    fn books() -> (Appointments, ClinicalNotes) {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryStorage::new());
        (RecordBook::new(store.clone(), 16), RecordBook::new(store, 16))
    }

    #[tokio::test]
    async fn non_owner_cannot_delete() {
        let (appointments, _) = books();
        let appt = Appointment::schedule(&doctor("d1"), "p1", &at("2024-06-01T10:00")).unwrap();
        let id = appointments.create(&appt).await.unwrap();

        let result = appointments.delete(&id, "d2").await;
        assert!(matches!(result, Err(CareError::NotOwner(_))));
        let listed = appointments.list_for("p1", "date", Direction::Desc).await.unwrap();
        assert_eq!(listed.len(), 1);

        appointments.delete(&id, "d1").await.unwrap();
        assert!(appointments.list_for("p1", "date", Direction::Desc).await.unwrap().is_empty());
        assert!(matches!(appointments.delete(&id, "d1").await, Err(CareError::NotFound(_))));
    }

    #[tokio::test]
    async fn attached_subscription_sees_new_appointment() {
        let (appointments, _) = books();
        let mut live = appointments.subscribe_for("p1", Direction::Desc);
        let initial = timeout(Duration::from_secs(2), live.next_snapshot()).await.unwrap().unwrap().unwrap();
        assert!(initial.items.is_empty());

        let appt = Appointment::schedule(&doctor("d1"), "p1", &at("2024-06-01T10:00")).unwrap();
        let id = appointments.create(&appt).await.unwrap();

        let next = timeout(Duration::from_secs(2), live.next_snapshot()).await.unwrap().unwrap().unwrap();
        assert_eq!(next.items.len(), 1);
        assert_eq!(next.items[0].id, id);
        assert_eq!(next.items[0].date, "2024-06-01T10:00");
    }

    #[tokio::test]
    async fn notes_are_listed_newest_first() {
        let (_, notes) = books();
        let first = ClinicalNote::write(
            &doctor("d1"),
            "p1",
            &NewClinicalNote { diagnosis: "Flu".into(), treatment: "Rest".into() },
        )
        .unwrap();
        let mut second = first.clone();
        second.diagnosis = "Cold".into();
        second.date = "9999-01-01T00:00:00.000Z".into();
        notes.create(&first).await.unwrap();
        notes.create(&second).await.unwrap();

        let listed = notes.list_for("p1", "date", Direction::Desc).await.unwrap();
        assert_eq!(listed[0].diagnosis, "Cold");
        assert_eq!(listed[1].diagnosis, "Flu");
    }

    #[tokio::test]
    async fn upcoming_excludes_past_and_sorts_ascending() {
        let (appointments, _) = books();
        for date in ["2024-05-01T09:00", "2024-07-01T09:00", "2024-06-01T12:00"] {
            let appt = Appointment::schedule(&doctor("d1"), "p1", &at(date)).unwrap();
            appointments.create(&appt).await.unwrap();
        }
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let upcoming = appointments.upcoming_for("p1", now).await.unwrap();
        let dates: Vec<_> = upcoming.iter().map(|a| a.date.as_str()).collect();
        assert_eq!(dates, vec!["2024-06-01T12:00", "2024-07-01T09:00"]);
    }
}
