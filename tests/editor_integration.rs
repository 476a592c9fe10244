//! Editor session lifecycle against the default variables and a block store.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use amayo_display_service::blocks::{
    BlockRepository, BlockStoreError, MemoryBlockRepository, SavedBlock,
};
use amayo_display_service::config::EditorConfig;
use amayo_display_service::display::{BlockComponent, DisplayBlock, DisplayRenderer, OmitReason};
use amayo_display_service::editor::{EditOperation, EditorError, EditorManager, SessionState};
use amayo_display_service::points::MemoryPointsStore;
use amayo_display_service::variables::{
    register_defaults, Actor, GuildInfo, VariableContext, VariableRegistry,
};
use async_trait::async_trait;
use tokio::sync::Notify;

/// Store that refuses writes until switched back on.
struct FlakyRepository {
    inner: MemoryBlockRepository,
    down: AtomicBool,
}

impl FlakyRepository {
    fn new() -> Self {
        Self {
            inner: MemoryBlockRepository::new(),
            down: AtomicBool::new(true),
        }
    }
}

#[async_trait]
impl BlockRepository for FlakyRepository {
    fn backend_name(&self) -> &'static str {
        "flaky"
    }

    async fn save(
        &self,
        guild_id: &str,
        name: &str,
        block: &DisplayBlock,
        operator_id: &str,
    ) -> Result<SavedBlock, BlockStoreError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(BlockStoreError::Unavailable("connection refused".to_string()));
        }
        self.inner.save(guild_id, name, block, operator_id).await
    }

    async fn get(&self, guild_id: &str, name: &str) -> Result<Option<SavedBlock>, BlockStoreError> {
        self.inner.get(guild_id, name).await
    }

    async fn list(&self, guild_id: &str) -> Result<Vec<SavedBlock>, BlockStoreError> {
        self.inner.list(guild_id).await
    }

    async fn delete(&self, guild_id: &str, name: &str) -> Result<bool, BlockStoreError> {
        self.inner.delete(guild_id, name).await
    }
}

/// Store whose writes block until the test releases them.
#[derive(Default)]
struct GatedRepository {
    inner: MemoryBlockRepository,
    entered: Notify,
    release: Notify,
}

#[async_trait]
impl BlockRepository for GatedRepository {
    fn backend_name(&self) -> &'static str {
        "gated"
    }

    async fn save(
        &self,
        guild_id: &str,
        name: &str,
        block: &DisplayBlock,
        operator_id: &str,
    ) -> Result<SavedBlock, BlockStoreError> {
        self.entered.notify_one();
        self.release.notified().await;
        self.inner.save(guild_id, name, block, operator_id).await
    }

    async fn get(&self, guild_id: &str, name: &str) -> Result<Option<SavedBlock>, BlockStoreError> {
        self.inner.get(guild_id, name).await
    }

    async fn list(&self, guild_id: &str) -> Result<Vec<SavedBlock>, BlockStoreError> {
        self.inner.list(guild_id).await
    }

    async fn delete(&self, guild_id: &str, name: &str) -> Result<bool, BlockStoreError> {
        self.inner.delete(guild_id, name).await
    }
}

fn renderer() -> Arc<DisplayRenderer> {
    let mut registry = VariableRegistry::new();
    register_defaults(&mut registry, Arc::new(MemoryPointsStore::new()));
    Arc::new(DisplayRenderer::new(Arc::new(registry)))
}

fn manager_with(repository: Arc<dyn BlockRepository>) -> EditorManager {
    EditorManager::new(renderer(), repository, &EditorConfig::default())
}

fn context() -> VariableContext {
    VariableContext::new()
        .with_user(Actor::new("42", "Ada"))
        .with_guild(GuildInfo::new("9", "TestGuild"))
}

fn text(content: &str) -> EditOperation {
    EditOperation::AddComponent {
        component: BlockComponent::Text {
            content: content.to_string(),
        },
        index: None,
    }
}

#[tokio::test]
async fn test_open_edit_save_and_reopen() {
    let repository = Arc::new(MemoryBlockRepository::new());
    let manager = manager_with(repository.clone());
    let ctx = context();

    let session = manager.open("op", "9", Some("welcome"), None).unwrap();
    assert_eq!(session.state, SessionState::Draft);

    manager
        .apply_edit(
            session.id,
            "op",
            EditOperation::SetTitle {
                title: Some("Hi user.name".to_string()),
            },
            &ctx,
        )
        .await
        .unwrap();
    let previewed = manager
        .apply_edit(session.id, "op", text("Welcome to guild.name"), &ctx)
        .await
        .unwrap();

    assert_eq!(previewed.state, SessionState::Previewed);
    assert_eq!(previewed.revision, 2);
    let preview = previewed.preview.unwrap();
    let inner = &preview.payload["components"][0]["components"];
    assert_eq!(inner[0]["content"], "## Hi Ada");
    assert_eq!(inner[1]["content"], "Welcome to TestGuild");

    let saved = manager.save(session.id, "op").await.unwrap();
    assert_eq!(saved.name, "welcome");
    assert_eq!(saved.block.title.as_deref(), Some("Hi user.name"));
    assert_eq!(manager.active_sessions(), 0);
    assert!(matches!(
        manager.get(session.id, "op"),
        Err(EditorError::NotFound(_))
    ));

    let reopened = manager.open_saved("op", "9", "welcome").await.unwrap();
    assert_eq!(reopened.state, SessionState::Draft);
    assert_eq!(reopened.block, saved.block);
    assert_eq!(reopened.name.as_deref(), Some("welcome"));
}

#[tokio::test]
async fn test_rejected_edit_leaves_session_untouched() {
    let manager = manager_with(Arc::new(MemoryBlockRepository::new()));
    let ctx = context();
    let session = manager.open("op", "9", None, None).unwrap();
    manager
        .apply_edit(session.id, "op", text("first"), &ctx)
        .await
        .unwrap();

    let err = manager
        .apply_edit(
            session.id,
            "op",
            EditOperation::SetCoverImage {
                url: Some("not a url".to_string()),
            },
            &ctx,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EditorError::Validation(_)));

    let err = manager
        .apply_edit(session.id, "op", EditOperation::RemoveComponent { index: 5 }, &ctx)
        .await
        .unwrap_err();
    assert!(matches!(err, EditorError::Validation(_)));

    let current = manager.get(session.id, "op").unwrap();
    assert_eq!(current.revision, 1);
    assert_eq!(current.block.cover_image, None);
    assert_eq!(current.block.components.len(), 1);
    assert_eq!(current.state, SessionState::Previewed);
}

#[tokio::test]
async fn test_save_without_name_keeps_session() {
    let manager = manager_with(Arc::new(MemoryBlockRepository::new()));
    let ctx = context();
    let session = manager.open("op", "9", None, None).unwrap();
    manager
        .apply_edit(session.id, "op", text("body"), &ctx)
        .await
        .unwrap();

    let err = manager.save(session.id, "op").await.unwrap_err();
    assert!(matches!(err, EditorError::Validation(_)));
    assert_eq!(
        manager.get(session.id, "op").unwrap().state,
        SessionState::Previewed
    );

    manager
        .apply_edit(
            session.id,
            "op",
            EditOperation::SetName {
                name: "rules".to_string(),
            },
            &ctx,
        )
        .await
        .unwrap();
    let saved = manager.save(session.id, "op").await.unwrap();
    assert_eq!(saved.name, "rules");
}

#[tokio::test]
async fn test_storage_failure_keeps_session_for_retry() {
    let repository = Arc::new(FlakyRepository::new());
    let manager = manager_with(repository.clone());
    let ctx = context();
    let session = manager.open("op", "9", Some("welcome"), None).unwrap();
    manager
        .apply_edit(session.id, "op", text("body"), &ctx)
        .await
        .unwrap();

    let err = manager.save(session.id, "op").await.unwrap_err();
    assert!(matches!(
        err,
        EditorError::Persistence(BlockStoreError::Unavailable(_))
    ));
    let kept = manager.get(session.id, "op").unwrap();
    assert_eq!(kept.state, SessionState::Previewed);
    assert_eq!(kept.block.components.len(), 1);

    // The failed save must not leave the session locked
    manager
        .apply_edit(session.id, "op", text("more"), &ctx)
        .await
        .unwrap();

    repository.down.store(false, Ordering::SeqCst);
    let saved = manager.save(session.id, "op").await.unwrap();
    assert_eq!(saved.guild_id, "9");
    assert_eq!(saved.block.components.len(), 2);
    assert!(repository.get("9", "welcome").await.unwrap().is_some());
}

#[tokio::test]
async fn test_edits_refused_while_save_in_flight() {
    let repository = Arc::new(GatedRepository::default());
    let manager = Arc::new(manager_with(repository.clone()));
    let ctx = context();
    let session = manager.open("op", "9", Some("welcome"), None).unwrap();
    manager
        .apply_edit(session.id, "op", text("v1"), &ctx)
        .await
        .unwrap();

    let saving = {
        let manager = manager.clone();
        let id = session.id;
        tokio::spawn(async move { manager.save(id, "op").await })
    };
    repository.entered.notified().await;

    let err = manager
        .apply_edit(session.id, "op", text("v2"), &ctx)
        .await
        .unwrap_err();
    assert!(matches!(err, EditorError::SaveInProgress(_)));
    assert!(matches!(
        manager.cancel(session.id, "op"),
        Err(EditorError::SaveInProgress(_))
    ));
    assert!(matches!(
        manager.save(session.id, "op").await,
        Err(EditorError::SaveInProgress(_))
    ));
    assert_eq!(manager.get(session.id, "op").unwrap().block.components.len(), 1);

    repository.release.notify_one();
    let saved = saving.await.unwrap().unwrap();

    assert_eq!(saved.block.components.len(), 1);
    assert_eq!(manager.active_sessions(), 0);
    let stored = repository.get("9", "welcome").await.unwrap().unwrap();
    assert_eq!(stored.block, saved.block);
}

#[tokio::test]
async fn test_cancel_discards_draft() {
    let repository = Arc::new(MemoryBlockRepository::new());
    let manager = manager_with(repository.clone());
    let session = manager.open("op", "9", Some("welcome"), None).unwrap();

    assert_eq!(manager.cancel(session.id, "op").unwrap(), SessionState::Cancelled);
    assert_eq!(manager.active_sessions(), 0);
    assert!(repository.list("9").await.unwrap().is_empty());
    assert!(matches!(
        manager.cancel(session.id, "op"),
        Err(EditorError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_idle_session_expires_with_notice() {
    let manager = manager_with(Arc::new(MemoryBlockRepository::new()))
        .with_session_timeout(Duration::from_millis(10));
    let session = manager.open("op", "9", Some("welcome"), None).unwrap();

    tokio::time::sleep(Duration::from_millis(30)).await;

    let sweep = manager.expire_idle();
    assert_eq!(sweep.expired, 1);
    assert_eq!(manager.active_sessions(), 0);

    match manager.get(session.id, "op") {
        Err(EditorError::Expired(notice)) => {
            assert_eq!(notice.session_id, session.id);
            assert_eq!(notice.name.as_deref(), Some("welcome"));
            assert!(notice.message.contains("inactivity"));
        }
        other => panic!("expected expiry, got {:?}", other.map(|s| s.state)),
    }
    assert!(matches!(
        manager.get(session.id, "someone-else"),
        Err(EditorError::Forbidden(_))
    ));
    assert!(manager.expiry_notice(session.id).is_some());
}

#[tokio::test]
async fn test_unresolved_thumbnail_degrades_to_text() {
    let manager = manager_with(Arc::new(MemoryBlockRepository::new()));
    let ctx = context();
    let session = manager.open("op", "9", None, None).unwrap();

    let edited = manager
        .apply_edit(
            session.id,
            "op",
            EditOperation::ReplaceJson {
                json: r#"{
                    "components": [
                        {"type": "section", "content": "Hello user.name",
                         "accessory": {"type": "thumbnail", "url": "user.avatar"}},
                        {"type": "link_button", "label": "Open", "url": "https://example.com"}
                    ]
                }"#
                .to_string(),
            },
            &ctx,
        )
        .await
        .unwrap();

    let preview = edited.preview.unwrap();
    let inner = &preview.payload["components"][0]["components"];
    assert_eq!(inner[0]["type"], 10);
    assert_eq!(inner[0]["content"], "Hello Ada");
    assert_eq!(inner[1]["type"], 1);
    assert_eq!(inner[1]["components"][0]["url"], "https://example.com");

    assert_eq!(preview.omitted.len(), 1);
    assert_eq!(preview.omitted[0].path, "components[0].accessory");
    assert!(matches!(preview.omitted[0].reason, OmitReason::UnresolvedUrl));
}
