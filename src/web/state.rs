use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

use crate::{
    config::AppConfig,
    images::ImageStore,
    library::WordLibrary,
    session::SessionAuthenticator,
    store::{LibraryStore, PgLibraryStore},
};

#[derive(Clone)]
pub struct AppState {
    library: WordLibrary,
    sessions: SessionAuthenticator,
    max_upload_bytes: usize,
    pg: Option<PgLibraryStore>,
}

impl AppState {
    /// Connect to Postgres, apply migrations and seed the first administrator
    /// when configured.
    pub async fn new(config: &AppConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await
            .context("failed to connect to Postgres")?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("failed to run database migrations")?;

        let pg = PgLibraryStore::new(pool);

        if let Some(seed) = &config.seed_admin {
            let seeded = pg
                .ensure_seed_admin(&seed.username, &seed.password)
                .await
                .context("failed to seed administrator")?;
            if seeded {
                warn!(
                    username = %seed.username,
                    "seeded administrator from SEED_ADMIN_* variables; rotate the password promptly"
                );
            }
        }

        let images = ImageStore::new(&config.image_dir);
        images
            .ensure_root()
            .await
            .with_context(|| format!("failed to create image directory {}", config.image_dir.display()))?;
        info!(image_dir = %config.image_dir.display(), "image storage ready");

        let mut state = Self::from_parts(
            Arc::new(pg.clone()),
            images,
            config.page_size,
            config.max_upload_bytes,
        );
        state.pg = Some(pg);
        Ok(state)
    }

    pub fn from_parts(
        store: Arc<dyn LibraryStore>,
        images: ImageStore,
        page_size: u32,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            library: WordLibrary::new(store.clone(), images, page_size),
            sessions: SessionAuthenticator::new(store),
            max_upload_bytes,
            pg: None,
        }
    }

    pub fn library(&self) -> &WordLibrary {
        &self.library
    }

    pub fn sessions(&self) -> &SessionAuthenticator {
        &self.sessions
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    /// Release the connection pool once the server has stopped accepting requests.
    pub async fn close(&self) {
        if let Some(pg) = &self.pg {
            pg.close().await;
            info!("database pool closed");
        }
    }
}
