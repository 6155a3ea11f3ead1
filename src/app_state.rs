use std::sync::Arc;

use crate::services::{enhance::Enhancer, history::GalleryStore, stats::StatsStore};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub enhancer: Arc<Enhancer>,
    pub gallery: Arc<GalleryStore>,
    pub stats: Arc<StatsStore>,
}

impl AppState {
    pub fn new(enhancer: Enhancer, gallery: GalleryStore, stats: StatsStore) -> Self {
        Self {
            enhancer: Arc::new(enhancer),
            gallery: Arc::new(gallery),
            stats: Arc::new(stats),
        }
    }
}
