//! Room name to media session mapping.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::future::{BoxFuture, FutureExt, Shared};
use thiserror::Error;
use tracing::{info, warn};

use crate::gateway::{GatewayError, GatewayResult, MediaSessionGateway, with_deadline};
use crate::types::{AccountId, RoomName, SessionId};

#[derive(Debug, Error)]
#[error("Session registry unavailable for room '{room}': {source}")]
pub struct RegistryUnavailable {
    pub room: RoomName,
    #[source]
    pub source: GatewayError,
}

/// One `create_session` attempt, awaited by every caller that arrives while it runs.
type Creation = Shared<BoxFuture<'static, GatewayResult<SessionId>>>;

enum Slot {
    Creating(Creation),
    Ready(SessionId),
}

/// Maps each room to exactly one media session for the lifetime of the process.
///
/// Concurrent first joins for the same room await a single creation request
/// and all see its outcome; joins for different rooms proceed in parallel.
pub struct SessionRegistry {
    gateway: Arc<dyn MediaSessionGateway>,
    account: AccountId,
    timeout: Duration,
    sessions: DashMap<RoomName, Slot>,
}

impl SessionRegistry {
    pub fn new(gateway: Arc<dyn MediaSessionGateway>, account: AccountId, timeout: Duration) -> Self {
        Self {
            gateway,
            account,
            timeout,
            sessions: DashMap::new(),
        }
    }

    /// Return the room's session, creating it on first use.
    pub async fn get_or_create(
        &self,
        room: &RoomName,
        billing_tag: &str,
    ) -> Result<SessionId, RegistryUnavailable> {
        // The shard lock is released before awaiting.
        let creation = match self.sessions.entry(room.clone()) {
            Entry::Occupied(entry) => match entry.get() {
                Slot::Ready(session) => return Ok(session.clone()),
                Slot::Creating(creation) => creation.clone(),
            },
            Entry::Vacant(entry) => {
                let creation = self.start_creation(room, billing_tag);
                entry.insert(Slot::Creating(creation.clone()));
                creation
            }
        };

        match creation.clone().await {
            Ok(session) => {
                self.sessions
                    .insert(room.clone(), Slot::Ready(session.clone()));
                Ok(session)
            }
            Err(source) => {
                // Clear the failed attempt so the next join retries, unless a
                // newer attempt already took its place.
                self.sessions.remove_if(room, |_, slot| {
                    matches!(slot, Slot::Creating(current) if current.ptr_eq(&creation))
                });
                Err(RegistryUnavailable {
                    room: room.clone(),
                    source,
                })
            }
        }
    }

    fn start_creation(&self, room: &RoomName, billing_tag: &str) -> Creation {
        let gateway = self.gateway.clone();
        let account = self.account.clone();
        let timeout = self.timeout;
        let room = room.clone();
        let billing_tag = billing_tag.to_string();

        async move {
            let created = with_deadline(
                "create_session",
                timeout,
                gateway.create_session(&account, &billing_tag),
            )
            .await;
            match &created {
                Ok(session) => info!(room = %room, session_id = %session, "created media session"),
                Err(err) => warn!(room = %room, error = %err, "session creation failed"),
            }
            created
        }
        .boxed()
        .shared()
    }

    /// Session for a room, if one has been created.
    pub fn lookup(&self, room: &RoomName) -> Option<SessionId> {
        self.sessions.get(room).and_then(|slot| match slot.value() {
            Slot::Ready(session) => Some(session.clone()),
            Slot::Creating(_) => None,
        })
    }
}
