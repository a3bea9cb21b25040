pub mod app_cache;
pub mod icon_order;
pub mod panel;
pub mod preview;
pub mod server;
pub mod shortcuts;
