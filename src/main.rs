mod app;
mod audio;
mod camera;
mod character;
mod clock;
mod config;
mod environment;
mod fireflies;
mod interaction;
mod overlay;
mod render;
mod scene;
mod smoke;

fn main() {
    env_logger::init();
    log::info!("Frog Cottage starting up");

    if let Err(e) = app::run() {
        log::error!("Fatal error: {e}");
        std::process::exit(1);
    }
}
