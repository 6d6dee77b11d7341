// rest_api/src/handlers/feeds.rs

//! Server-sent event feeds. Each connection owns a view and a session cell
//! of its own. Disconnecting drops the view. Token expiry or logout clears
//! the cell, which closes the view.

use std::convert::Infallible;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
};
use chrono::Utc;
use futures::stream::{self, Stream};
use log::{debug, error};
use models::errors::CareError;
use security::SessionWatcher;
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::auth::{Authenticated, RoleSession};
use crate::errors::RestApiError;
use crate::views::{
    ChatUpdate, ChatView, DetailUpdate, PatientDetailView, RosterUpdate, RosterView,
};
use crate::AppState;

/// Keeps a connection's session alive and signs it out when the token
/// expires or is revoked.
struct FeedSession {
    _session: RoleSession,
    expiry: JoinHandle<()>,
}

impl FeedSession {
    async fn open(state: &AppState, auth: &Authenticated) -> Result<(Self, SessionWatcher), RestApiError> {
        let session = state.session_for(auth.claims.role);
        session.restore(&auth.token).await?;
        let watcher = session.watch();

        let remaining = u64::try_from(auth.claims.exp - Utc::now().timestamp()).unwrap_or(0);
        let expiring = session.clone();
        let signer = state.signer.clone();
        let jti = auth.claims.jti.clone();
        let expiry = tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(remaining)) => {
                    debug!("Feed token expired; closing");
                }
                _ = signer.revoked(&jti) => {
                    debug!("Feed token revoked; closing");
                }
            }
            expiring.logout();
        });
        Ok((FeedSession { _session: session, expiry }, watcher))
    }
}

impl Drop for FeedSession {
    fn drop(&mut self) {
        self.expiry.abort();
    }
}

fn json_event<T: Serialize>(name: &str, data: &T) -> Event {
    Event::default().event(name).json_data(data).unwrap_or_else(|e| {
        error!("Failed to encode {} event: {}", name, e);
        Event::default().event("error").data("encoding failed")
    })
}

fn error_event(e: &CareError) -> Event {
    error!("Live feed error: {}", e);
    Event::default().event("error").data(e.user_message())
}

#[async_trait]
trait FeedSource: Send + 'static {
    /// `None` once the view has closed.
    async fn next_event(&mut self) -> Option<Event>;
}

#[async_trait]
impl FeedSource for PatientDetailView {
    async fn next_event(&mut self) -> Option<Event> {
        match self.next_update().await {
            Ok(DetailUpdate::Appointments(items)) => Some(json_event("appointments", &items)),
            Ok(DetailUpdate::Notes(items)) => Some(json_event("notes", &items)),
            Ok(DetailUpdate::Closed) => None,
            Err(e) => Some(error_event(&e)),
        }
    }
}

#[async_trait]
impl FeedSource for ChatView {
    async fn next_event(&mut self) -> Option<Event> {
        match self.next_update().await {
            Ok(ChatUpdate::Messages(items)) => Some(json_event("messages", &items)),
            Ok(ChatUpdate::Closed) => None,
            Err(e) => Some(error_event(&e)),
        }
    }
}

#[async_trait]
impl FeedSource for RosterView {
    async fn next_event(&mut self) -> Option<Event> {
        match self.next_update().await {
            Ok(RosterUpdate::Patients(items)) => Some(json_event("patients", &items)),
            Ok(RosterUpdate::Closed) => None,
            Err(e) => Some(error_event(&e)),
        }
    }
}

fn into_sse<V: FeedSource>(
    view: V,
    session: FeedSession,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let events = stream::unfold(Some((view, session)), |state| async move {
        let (mut view, session) = state?;
        match view.next_event().await {
            Some(event) => Some((Ok::<_, Infallible>(event), Some((view, session)))),
            None => Some((Ok(Event::default().event("closed").data("session ended")), None)),
        }
    });
    Sse::new(events).keep_alive(KeepAlive::default())
}

pub async fn patient_feed_handler(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(patient_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, RestApiError> {
    let (session, watcher) = FeedSession::open(&state, &auth).await?;
    let view = PatientDetailView::open(&state.services, &patient_id, watcher).await?;
    Ok(into_sse(view, session))
}

pub async fn chat_feed_handler(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(patient_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, RestApiError> {
    let (session, watcher) = FeedSession::open(&state, &auth).await?;
    let view = ChatView::open(&state.services, &patient_id, watcher).await?;
    Ok(into_sse(view, session))
}

pub async fn roster_feed_handler(
    State(state): State<AppState>,
    auth: Authenticated,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, RestApiError> {
    let (session, watcher) = FeedSession::open(&state, &auth).await?;
    let view = RosterView::open(&state.services, watcher)?;
    Ok(into_sse(view, session))
}
