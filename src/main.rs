use app::App;
use iced::{Application, Settings};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod app;
mod auth;
mod collection;
mod deck;
mod models;
mod views;

/// Initialize the global tracing subscriber. Configure with RUST_LOG,
/// e.g. RUST_LOG=debug,cardforge=trace.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .init();
}

fn main() -> iced::Result {
    init_tracing();
    App::run(Settings::default())
}
