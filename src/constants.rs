// Server configuration
pub const DEFAULT_PORT: u16 = 3001;

// Default file locations, relative to the working directory
pub const DEFAULT_TRIP_CONFIG: &str = "trip_config.json";
pub const DEFAULT_MAP_DATA: &str = "mapbox_data.json";
pub const DEFAULT_MEDIA_DIR: &str = "media";
pub const DEFAULT_ASSETS_DIR: &str = "assets";
pub const DEFAULT_PUBLIC_DIR: &str = "public";

// Directions API
pub const DIRECTIONS_ENDPOINT: &str = "https://api.mapbox.com/directions/v5/mapbox/";
pub const DEFAULT_ROUTING_PROFILE: &str = "walking";
pub const DEFAULT_ROUTE_SAMPLE_RATE: usize = 1;

// Media pipeline
pub const IMAGE_MAX_WIDTH: u32 = 1280;
pub const JPEG_QUALITY: i32 = 80;

// Viewport breakpoints (CSS pixels, inclusive upper bounds)
pub const MOBILE_MAX_WIDTH: u32 = 640;
pub const TABLET_MAX_WIDTH: u32 = 768;

// Popup content never grows wider than this on phones
pub const MOBILE_POPUP_MAX_WIDTH: f64 = 340.0;

// Below this zoom level individual marker popups are dismissed
pub const REGION_ZOOM_THRESHOLD: f64 = 8.0;

// Cache header for served assets
pub const ASSET_CACHE_CONTROL: &str = "public, max-age=3600";
