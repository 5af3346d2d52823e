pub mod headless_display;
pub mod snapshot_display;
pub mod stdin_keys;
