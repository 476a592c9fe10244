use std::sync::Arc;
use std::time::Instant;

use crate::auth::JwtValidator;
use crate::blocks::BlockRepository;
use crate::config::Settings;
use crate::display::DisplayRenderer;
use crate::editor::EditorManager;
use crate::points::PointsStore;
use crate::postgres::PostgresPool;
use crate::variables::{register_defaults, VariableRegistry};

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub jwt_validator: Arc<JwtValidator>,
    pub registry: Arc<VariableRegistry>,
    pub renderer: Arc<DisplayRenderer>,
    pub editor: Arc<EditorManager>,
    pub blocks: Arc<dyn BlockRepository>,
    pub points: Arc<dyn PointsStore>,
    pub postgres_pool: Option<Arc<PostgresPool>>,
    pub start_time: Instant,
}

impl AppState {
    /// Wire the registry, renderer and editor on top of the given stores.
    ///
    /// The registry is fully populated here and never mutated afterwards.
    pub fn new(
        settings: Settings,
        points: Arc<dyn PointsStore>,
        blocks: Arc<dyn BlockRepository>,
        postgres_pool: Option<Arc<PostgresPool>>,
    ) -> Self {
        let jwt_validator = Arc::new(JwtValidator::new(&settings.jwt));

        let mut registry = VariableRegistry::new();
        register_defaults(&mut registry, points.clone());
        let registry = Arc::new(registry);
        tracing::info!(variables = registry.len(), "Variable registry populated");

        let renderer = Arc::new(DisplayRenderer::new(registry.clone()));
        let editor = Arc::new(EditorManager::new(
            renderer.clone(),
            blocks.clone(),
            &settings.editor,
        ));

        Self {
            settings: Arc::new(settings),
            jwt_validator,
            registry,
            renderer,
            editor,
            blocks,
            points,
            postgres_pool,
            start_time: Instant::now(),
        }
    }
}
