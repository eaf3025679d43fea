pub mod app;
pub mod domain;
pub mod infra;

pub fn init() {
    let _ = tracing_subscriber::fmt().try_init();
}
