use std::sync::{Arc, RwLock};

use crate::settings::Settings;
use crate::trip::MapData;

// Application state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub map_data: Arc<RwLock<MapData>>,
}

impl AppState {
    pub fn new(settings: Settings, map_data: MapData) -> Self {
        Self {
            settings: Arc::new(settings),
            map_data: Arc::new(RwLock::new(map_data)),
        }
    }
}
