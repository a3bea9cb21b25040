pub mod graph;
pub mod hot_corner;
pub mod panel_settings;
pub mod preview_size;
pub mod resolver;
