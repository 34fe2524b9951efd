use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::get_config;
use crate::services::{AppServices, WISH_IMAGES_DIR};
use crate::storage::{SeaOrmStorage, StorageFactory};

pub struct StartupContext {
    pub storage: Arc<SeaOrmStorage>,
    pub services: AppServices,
}

/// 准备服务器启动的上下文
/// 包括存储、上传目录和服务层
pub async fn prepare_server_startup() -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    // 重复安装时返回 Err，忽略即可
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }

    let config = get_config();

    let storage = StorageFactory::create()
        .await
        .context("Failed to create storage backend")?;
    info!("Using storage backend: {}", storage.backend_name());

    let images_dir = Path::new(&config.storage.uploads_dir).join(WISH_IMAGES_DIR);
    tokio::fs::create_dir_all(&images_dir)
        .await
        .with_context(|| format!("Failed to create uploads directory {}", images_dir.display()))?;

    let services = AppServices::new(storage.clone(), &config);
    if services.ai.is_configured() {
        info!("AI wish generator enabled");
    } else {
        warn!("AI wish generator disabled (ai.gemini_api_key not set)");
    }

    match config.api.admin_token.as_deref() {
        Some(token) if !token.trim().is_empty() => info!("Admin API available at: /api/admin"),
        _ => info!("Admin API is disabled (api.admin_token not set)"),
    }

    debug!(
        "Pre-startup processing completed in {} ms",
        start_time.elapsed().as_millis()
    );

    Ok(StartupContext { storage, services })
}
