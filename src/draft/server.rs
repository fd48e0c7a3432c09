use std::{
    collections::HashMap,
    sync::{Arc, Mutex, TryLockError},
    time::Instant,
};

use uuid::Uuid;

use crate::{
    cards::{Card, CardCatalog},
    deckcode, err,
    status::{Code, Status},
    Res,
};

use super::{
    deck::CardCount,
    game::{Draft, DraftState, DraftStateInfo},
    DraftConfig, DraftOptions,
};

struct Session {
    draft: Arc<Mutex<Draft>>,
    last_used: Instant,
}

/// Owns every draft session along with the data they share. Each session is
/// strictly sequential: a request for a session which is still resolving a
/// previous request is rejected rather than queued.
pub struct DraftServer {
    catalog: Arc<CardCatalog>,
    config: DraftConfig,
    sessions: Mutex<HashMap<Uuid, Session>>,
}

fn poisoned() -> Status {
    Status::new(Code::InternalServerError, "Draft session lock poisoned.")
}

impl DraftServer {
    pub fn new(catalog: Arc<CardCatalog>, config: DraftConfig) -> Self {
        Self {
            catalog,
            config,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn num_sessions(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }

    /// Discard sessions unused for longer than the idle timeout as of `now`.
    /// Sessions with a request in progress are kept. Returns the number of
    /// sessions discarded.
    pub fn evict_idle(&self, now: Instant) -> Res<usize> {
        let timeout = self.config.session_idle_timeout;
        let mut sessions = self.sessions.lock().map_err(|_| poisoned())?;
        let before = sessions.len();
        sessions.retain(|id, session| {
            let idle = now.saturating_duration_since(session.last_used) >= timeout;
            let busy = matches!(session.draft.try_lock(), Err(TryLockError::WouldBlock));
            if idle && !busy {
                tracing::debug!("Discarding idle draft session {id}.");
            }
            !idle || busy
        });
        Ok(before - sessions.len())
    }

    /// Run `f` on the draft for session `id`, holding that session's lock.
    fn with_session<T, F>(&self, id: Uuid, f: F) -> Res<T>
    where
        F: FnOnce(&mut Draft, &CardCatalog, &DraftConfig) -> Res<T>,
    {
        let session = {
            let mut sessions = self.sessions.lock().map_err(|_| poisoned())?;
            sessions.get_mut(&id).map(|session| {
                session.last_used = Instant::now();
                session.draft.clone()
            })
        };
        let Some(session) = session else {
            return err(Code::NotInDraftSession, format!("No draft session {id}."));
        };

        let mut draft = match session.try_lock() {
            Ok(draft) => draft,
            Err(TryLockError::WouldBlock) => {
                tracing::debug!("Rejected request for busy session {id}.");
                return err(
                    Code::RoundInFlight,
                    "A request for this draft is already in progress.",
                );
            }
            Err(TryLockError::Poisoned(_)) => return Err(poisoned()),
        };
        f(&mut draft, &self.catalog, &self.config)
    }

    pub fn join_draft(&self, options: DraftOptions) -> Res<(Uuid, DraftStateInfo)> {
        self.evict_idle(Instant::now())?;

        let id = Uuid::new_v4();
        let draft = Draft::new(options);
        let info = draft.info();
        self.sessions.lock().map_err(|_| poisoned())?.insert(
            id,
            Session {
                draft: Arc::new(Mutex::new(draft)),
                last_used: Instant::now(),
            },
        );
        tracing::debug!("Created draft session {id} with {options:?}.");
        Ok((id, info))
    }

    pub fn current_draft(&self, id: Uuid) -> Res<DraftStateInfo> {
        self.with_session(id, |draft, _, _| Ok(draft.info()))
    }

    pub fn next_pool(&self, id: Uuid) -> Res<(Vec<Card>, DraftState)> {
        self.with_session(id, |draft, catalog, config| {
            draft.next_pool(catalog, config, &mut rand::thread_rng())
        })
    }

    pub fn choose_cards(&self, id: Uuid, codes: &[String]) -> Res<DraftStateInfo> {
        self.with_session(id, |draft, catalog, config| {
            draft.choose_cards(codes, catalog, config, &mut rand::thread_rng())
        })
    }

    pub fn close_draft(&self, id: Uuid) -> Res<()> {
        match self.sessions.lock().map_err(|_| poisoned())?.remove(&id) {
            Some(_) => {
                tracing::debug!("Closed draft session {id}.");
                Ok(())
            }
            None => err(Code::NotInDraftSession, format!("No draft session {id}.")),
        }
    }

    /// Look up the cards of a deck code in the catalog.
    pub fn decode_deck(&self, code: &str) -> Res<Vec<CardCount>> {
        deckcode::decode(code)?
            .into_iter()
            .map(|(card_code, count)| match self.catalog.get(&card_code) {
                Some(card) => Ok(CardCount {
                    card: card.clone(),
                    count,
                }),
                None => err(
                    Code::InvalidDeckCode,
                    format!("Unknown card {card_code} in deck code."),
                ),
            })
            .collect()
    }
}
