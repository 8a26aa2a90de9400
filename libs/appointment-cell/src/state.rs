// libs/appointment-cell/src/state.rs
use std::sync::Arc;

use tracing::info;

use shared_config::{AppConfig, StoreBackend};

use crate::models::SchedulingConfig;
use crate::services::availability::AvailabilityService;
use crate::services::completion::CompletionService;
use crate::services::dashboard::DashboardService;
use crate::services::release::ReleaseService;
use crate::services::reservation::ReservationCoordinator;
use crate::store::{InMemoryStore, SchedulingStore, SupabaseStore};

pub fn build_store(config: &AppConfig) -> Arc<dyn SchedulingStore> {
    match config.scheduling_store {
        StoreBackend::Supabase => {
            info!("Scheduling store: supabase at {}", config.supabase_url);
            Arc::new(SupabaseStore::new(config))
        }
        StoreBackend::Memory => {
            info!("Scheduling store: in-memory");
            Arc::new(InMemoryStore::new())
        }
    }
}

/// Shared router state: injected configuration plus the one store every
/// service writes through.
#[derive(Clone)]
pub struct SchedulingState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn SchedulingStore>,
}

impl SchedulingState {
    pub fn new(config: Arc<AppConfig>, store: Arc<dyn SchedulingStore>) -> Self {
        Self { config, store }
    }

    pub fn from_config(config: Arc<AppConfig>) -> Self {
        let store = build_store(&config);
        Self::new(config, store)
    }

    fn scheduling_config(&self) -> SchedulingConfig {
        SchedulingConfig::from_app_config(&self.config)
    }

    pub fn coordinator(&self) -> ReservationCoordinator {
        ReservationCoordinator::new(self.store.clone(), self.scheduling_config())
    }

    pub fn release(&self) -> ReleaseService {
        ReleaseService::new(self.store.clone(), self.scheduling_config())
    }

    pub fn availability(&self) -> AvailabilityService {
        AvailabilityService::new(self.store.clone(), self.scheduling_config())
    }

    pub fn completion(&self) -> CompletionService {
        CompletionService::new(self.store.clone())
    }

    pub fn dashboard(&self) -> DashboardService {
        DashboardService::new(self.store.clone())
    }
}
