//! Owns all live editor sessions.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use serde::Serialize;
use uuid::Uuid;

use crate::blocks::{BlockRepository, SavedBlock};
use crate::config::EditorConfig;
use crate::display::{DisplayBlock, DisplayRenderer};
use crate::metrics::EditorMetrics;
use crate::variables::VariableContext;

use super::session::{apply_operation, normalize_name, EditorSession};
use super::types::{EditOperation, EditorError, ExpiryNotice, SessionState};

/// Result of one reaper sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepResult {
    pub expired: usize,
    pub tombstones_evicted: usize,
}

struct Tombstone {
    notice: ExpiryNotice,
    created: std::time::Instant,
}

/// Sessions keyed by id with point writes only; no lock is held across an
/// await. Edits are applied to a snapshot and committed only if the session
/// revision did not move in the meantime.
pub struct EditorManager {
    sessions: DashMap<Uuid, EditorSession>,
    tombstones: DashMap<Uuid, Tombstone>,
    renderer: Arc<DisplayRenderer>,
    repository: Arc<dyn BlockRepository>,
    session_timeout: Duration,
    tombstone_ttl: Duration,
    max_components: usize,
}

impl EditorManager {
    pub fn new(
        renderer: Arc<DisplayRenderer>,
        repository: Arc<dyn BlockRepository>,
        config: &EditorConfig,
    ) -> Self {
        Self {
            sessions: DashMap::new(),
            tombstones: DashMap::new(),
            renderer,
            repository,
            session_timeout: config.session_timeout(),
            tombstone_ttl: config.tombstone_ttl(),
            max_components: config.max_components,
        }
    }

    pub fn with_session_timeout(mut self, timeout: Duration) -> Self {
        self.session_timeout = timeout;
        self
    }

    pub fn with_tombstone_ttl(mut self, ttl: Duration) -> Self {
        self.tombstone_ttl = ttl;
        self
    }

    pub fn session_timeout(&self) -> Duration {
        self.session_timeout
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Start a `Draft` session, optionally seeded with a block.
    #[tracing::instrument(name = "editor.open", skip(self, initial))]
    pub fn open(
        &self,
        operator_id: &str,
        guild_id: &str,
        name: Option<&str>,
        initial: Option<DisplayBlock>,
    ) -> Result<EditorSession, EditorError> {
        let name = normalize_name(name)?;
        let block = initial.unwrap_or_default();
        self.validate(&block)?;

        let session = EditorSession::new(operator_id, guild_id, name, block);
        self.sessions.insert(session.id, session.clone());

        EditorMetrics::record_opened();
        EditorMetrics::set_active(self.sessions.len());
        tracing::info!(session_id = %session.id, "Editor session opened");

        Ok(session)
    }

    /// Start a session on a copy of a saved block.
    pub async fn open_saved(
        &self,
        operator_id: &str,
        guild_id: &str,
        name: &str,
    ) -> Result<EditorSession, EditorError> {
        let saved = self
            .repository
            .get(guild_id, name)
            .await?
            .ok_or_else(|| EditorError::BlockNotFound(name.to_string()))?;

        self.open(operator_id, guild_id, Some(&saved.name), Some(saved.block))
    }

    pub fn get(&self, id: Uuid, operator_id: &str) -> Result<EditorSession, EditorError> {
        self.checkout(id, operator_id)
    }

    /// Apply one edit and regenerate the preview.
    ///
    /// On any failure the stored session is left exactly as it was.
    #[tracing::instrument(
        name = "editor.apply_edit",
        skip(self, op, ctx),
        fields(op = op.name())
    )]
    pub async fn apply_edit(
        &self,
        id: Uuid,
        operator_id: &str,
        op: EditOperation,
        ctx: &VariableContext,
    ) -> Result<EditorSession, EditorError> {
        let snapshot = self.checkout(id, operator_id)?;
        if snapshot.saving {
            return Err(EditorError::SaveInProgress(id));
        }

        let (name, block) = match apply_operation(&snapshot.name, &snapshot.block, op)
            .and_then(|edited| self.validate(&edited.1).map(|_| edited))
        {
            Ok(edited) => edited,
            Err(e) => {
                EditorMetrics::record_edit_rejected();
                tracing::debug!(session_id = %id, error = %e, "Edit rejected");
                if let Some(mut session) = self.sessions.get_mut(&id) {
                    session.touch();
                }
                return Err(e);
            }
        };

        let preview = self.renderer.render(&block, ctx).await;

        let mut session = match self.sessions.get_mut(&id) {
            Some(session) => session,
            None => return Err(self.missing(id)),
        };
        if session.saving {
            return Err(EditorError::SaveInProgress(id));
        }
        if session.revision != snapshot.revision {
            return Err(EditorError::Conflict(id));
        }

        session.name = name;
        session.block = block;
        session.preview = Some(preview);
        session.state = SessionState::Previewed;
        session.revision += 1;
        session.updated_at = Utc::now();
        session.touch();

        EditorMetrics::record_edit_applied();

        Ok(session.clone())
    }

    /// Persist a previewed session; the session ends on success only.
    ///
    /// The session is marked as saving for the duration of the write, and
    /// edits, cancels and expiry are refused until it settles.
    #[tracing::instrument(name = "editor.save", skip(self))]
    pub async fn save(&self, id: Uuid, operator_id: &str) -> Result<SavedBlock, EditorError> {
        let snapshot = self.checkout(id, operator_id)?;

        if snapshot.state != SessionState::Previewed {
            return Err(EditorError::InvalidTransition {
                action: "save",
                state: snapshot.state,
            });
        }
        let Some(name) = snapshot.populated_name() else {
            return Err(EditorError::Validation(
                "A name is required before saving".to_string(),
            ));
        };

        self.begin_save(id, snapshot.revision)?;

        match self
            .repository
            .save(&snapshot.guild_id, name, &snapshot.block, operator_id)
            .await
        {
            Ok(saved) => {
                let removed = self
                    .sessions
                    .remove_if(&id, |_, s| s.revision == snapshot.revision)
                    .is_some();
                if !removed {
                    tracing::warn!(session_id = %id, "Saved session was no longer at the saved revision");
                }

                EditorMetrics::record_saved();
                EditorMetrics::set_active(self.sessions.len());
                tracing::info!(
                    session_id = %id,
                    guild_id = %saved.guild_id,
                    name = %saved.name,
                    "Editor session saved"
                );
                Ok(saved)
            }
            Err(e) => {
                EditorMetrics::record_save_failed();
                tracing::warn!(session_id = %id, error = %e, "Saving block failed, session kept");
                if let Some(mut session) = self.sessions.get_mut(&id) {
                    session.saving = false;
                    session.touch();
                }
                Err(EditorError::Persistence(e))
            }
        }
    }

    /// Discard a session.
    #[tracing::instrument(name = "editor.cancel", skip(self))]
    pub fn cancel(&self, id: Uuid, operator_id: &str) -> Result<SessionState, EditorError> {
        let snapshot = self.checkout(id, operator_id)?;
        if snapshot.saving {
            return Err(EditorError::SaveInProgress(id));
        }

        if self.sessions.remove_if(&id, |_, s| !s.saving).is_none() {
            return if self.sessions.contains_key(&id) {
                Err(EditorError::SaveInProgress(id))
            } else {
                Err(self.missing(id))
            };
        }

        EditorMetrics::record_cancelled();
        EditorMetrics::set_active(self.sessions.len());
        tracing::info!(session_id = %id, "Editor session cancelled");

        Ok(SessionState::Cancelled)
    }

    /// Expire idle sessions and drop tombstones past their TTL.
    pub fn expire_idle(&self) -> SweepResult {
        let idle: Vec<Uuid> = self
            .sessions
            .iter()
            .filter(|entry| entry.value().is_idle(self.session_timeout))
            .map(|entry| *entry.key())
            .collect();

        let expired = idle.into_iter().filter(|id| self.expire(*id).is_some()).count();

        let before = self.tombstones.len();
        self.tombstones
            .retain(|_, tombstone| tombstone.created.elapsed() < self.tombstone_ttl);
        let tombstones_evicted = before.saturating_sub(self.tombstones.len());

        if expired > 0 {
            EditorMetrics::record_expired(expired as u64);
            EditorMetrics::set_active(self.sessions.len());
        }

        SweepResult {
            expired,
            tombstones_evicted,
        }
    }

    /// Expiry notice left behind by an expired session, if still retained.
    pub fn expiry_notice(&self, id: Uuid) -> Option<ExpiryNotice> {
        self.tombstones.get(&id).map(|t| t.notice.clone())
    }

    fn validate(&self, block: &DisplayBlock) -> Result<(), EditorError> {
        block
            .validate(self.renderer.registry(), self.max_components)
            .map_err(|e| EditorError::Validation(e.to_string()))
    }

    /// Ownership and liveness check; returns a snapshot of the session.
    fn checkout(&self, id: Uuid, operator_id: &str) -> Result<EditorSession, EditorError> {
        let snapshot = match self.sessions.get(&id) {
            Some(session) => session.clone(),
            None => {
                return match self.tombstones.get(&id) {
                    Some(t) if t.notice.operator_id != operator_id => Err(EditorError::Forbidden(id)),
                    Some(t) => Err(EditorError::Expired(Box::new(t.notice.clone()))),
                    None => Err(EditorError::NotFound(id)),
                };
            }
        };

        if snapshot.operator_id != operator_id {
            return Err(EditorError::Forbidden(id));
        }

        if !snapshot.saving && snapshot.is_idle(self.session_timeout) {
            // The reaper has not swept it yet
            if let Some(notice) = self.expire(id) {
                EditorMetrics::record_expired(1);
                EditorMetrics::set_active(self.sessions.len());
                return Err(EditorError::Expired(Box::new(notice)));
            }
            return Err(self.missing(id));
        }

        Ok(snapshot)
    }

    fn expire(&self, id: Uuid) -> Option<ExpiryNotice> {
        let (_, session) = self
            .sessions
            .remove_if(&id, |_, s| !s.saving && s.is_idle(self.session_timeout))?;

        let minutes = (self.session_timeout.as_secs() / 60).max(1);
        let notice = ExpiryNotice {
            session_id: id,
            operator_id: session.operator_id.clone(),
            guild_id: session.guild_id.clone(),
            name: session.name.clone(),
            expired_at: Utc::now(),
            message: format!(
                "This editor expired after {} minute{} of inactivity. Unsaved changes were discarded.",
                minutes,
                if minutes == 1 { "" } else { "s" }
            ),
        };

        self.tombstones.insert(
            id,
            Tombstone {
                notice: notice.clone(),
                created: std::time::Instant::now(),
            },
        );

        tracing::info!(
            session_id = %id,
            operator_id = %session.operator_id,
            idle_secs = session.idle_for().as_secs(),
            "Editor session expired"
        );

        Some(notice)
    }

    /// Claim the session for a save at `revision`.
    fn begin_save(&self, id: Uuid, revision: u64) -> Result<(), EditorError> {
        let Some(mut session) = self.sessions.get_mut(&id) else {
            return Err(self.missing(id));
        };
        if session.saving {
            return Err(EditorError::SaveInProgress(id));
        }
        if session.revision != revision {
            return Err(EditorError::Conflict(id));
        }

        session.saving = true;
        session.touch();
        Ok(())
    }

    /// Error for a session that vanished between two lookups.
    fn missing(&self, id: Uuid) -> EditorError {
        match self.tombstones.get(&id) {
            Some(t) => EditorError::Expired(Box::new(t.notice.clone())),
            None => EditorError::NotFound(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::MemoryBlockRepository;
    use crate::display::BlockComponent;
    use crate::variables::{field, VariableRegistry};

    fn manager() -> EditorManager {
        let mut registry = VariableRegistry::new();
        registry.register("user.avatar", field(|_| String::new()));
        let renderer = Arc::new(DisplayRenderer::new(Arc::new(registry)));
        EditorManager::new(
            renderer,
            Arc::new(MemoryBlockRepository::new()),
            &EditorConfig::default(),
        )
    }

    fn add_text(content: &str) -> EditOperation {
        EditOperation::AddComponent {
            component: BlockComponent::Text {
                content: content.to_string(),
            },
            index: None,
        }
    }

    #[tokio::test]
    async fn test_edit_moves_to_previewed() {
        let manager = manager();
        let session = manager.open("op", "9", None, None).unwrap();
        assert_eq!(session.state, SessionState::Draft);

        let edited = manager
            .apply_edit(session.id, "op", add_text("hello"), &VariableContext::new())
            .await
            .unwrap();

        assert_eq!(edited.state, SessionState::Previewed);
        assert_eq!(edited.revision, 1);
        assert!(edited.preview.is_some());
    }

    #[tokio::test]
    async fn test_save_requires_preview() {
        let manager = manager();
        let session = manager.open("op", "9", Some("welcome"), None).unwrap();

        let err = manager.save(session.id, "op").await.unwrap_err();
        assert!(matches!(
            err,
            EditorError::InvalidTransition {
                action: "save",
                state: SessionState::Draft
            }
        ));
    }

    #[tokio::test]
    async fn test_other_operator_forbidden() {
        let manager = manager();
        let session = manager.open("op", "9", None, None).unwrap();

        assert!(matches!(
            manager.get(session.id, "intruder"),
            Err(EditorError::Forbidden(_))
        ));
        assert!(matches!(
            manager.cancel(session.id, "intruder"),
            Err(EditorError::Forbidden(_))
        ));
        assert!(manager.get(session.id, "op").is_ok());
    }

    #[tokio::test]
    async fn test_cancel_discards_session() {
        let manager = manager();
        let session = manager.open("op", "9", None, None).unwrap();

        assert_eq!(manager.cancel(session.id, "op").unwrap(), SessionState::Cancelled);
        assert!(matches!(
            manager.get(session.id, "op"),
            Err(EditorError::NotFound(_))
        ));
        assert_eq!(manager.active_sessions(), 0);
    }

    #[tokio::test]
    async fn test_open_rejects_invalid_seed() {
        let manager = manager();
        let seed = DisplayBlock {
            cover_image: Some("banner.png".to_string()),
            ..Default::default()
        };

        assert!(matches!(
            manager.open("op", "9", None, Some(seed)),
            Err(EditorError::Validation(_))
        ));
        assert_eq!(manager.active_sessions(), 0);
    }

    #[tokio::test]
    async fn test_sweep_skips_session_being_saved() {
        let manager = manager().with_session_timeout(Duration::ZERO);
        let session = manager.open("op", "9", Some("welcome"), None).unwrap();
        manager.begin_save(session.id, session.revision).unwrap();

        assert_eq!(manager.expire_idle().expired, 0);
        assert!(matches!(
            manager.begin_save(session.id, session.revision),
            Err(EditorError::SaveInProgress(_))
        ));
        assert_eq!(manager.active_sessions(), 1);
    }

    #[tokio::test]
    async fn test_sweep_evicts_tombstones_after_ttl() {
        let manager = manager()
            .with_session_timeout(Duration::ZERO)
            .with_tombstone_ttl(Duration::ZERO);
        let session = manager.open("op", "9", None, None).unwrap();

        let sweep = manager.expire_idle();
        assert_eq!(sweep.expired, 1);
        assert_eq!(sweep.tombstones_evicted, 1);
        assert!(manager.expiry_notice(session.id).is_none());
    }
}
