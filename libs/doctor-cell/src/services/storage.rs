use std::sync::Arc;

use tracing::{info, warn};

use shared_config::AppConfig;

use crate::error::RepositoryError;
use crate::services::repository::{InMemoryScheduleRepository, ScheduleRepository};
use crate::services::supabase_store::SupabaseScheduleRepository;

/// Opens the schedule storage once for the life of the process. The caller
/// owns the handle and must call `shutdown` on it before exiting.
pub async fn connect(config: &AppConfig) -> Result<Arc<dyn ScheduleRepository>, RepositoryError> {
    if config.is_storage_configured() {
        let repository = SupabaseScheduleRepository::new(config);
        repository.verify_connection(config.storage_timeout()).await?;
        return Ok(Arc::new(repository));
    }

    let repository = match &config.schedule_seed_path {
        Some(path) => InMemoryScheduleRepository::from_seed_file(path).await?,
        None => {
            warn!("No schedule storage or seed file configured, starting with an empty schedule");
            InMemoryScheduleRepository::new()
        }
    };

    info!("Using {}", repository.describe());
    Ok(Arc::new(repository))
}
