use fltk::{app, prelude::*};
use tracing::info;

use travel_print::app::infrastructure::logging::init_logging;
use travel_print::app::{AppConfig, AppController, Message};

fn main() {
    init_logging();
    let config = AppConfig::load();

    let app = app::App::default();
    let (s, r) = app::channel::<Message>();

    let mut controller = AppController::new(&config, s);
    controller.window.show();
    info!("TravelPrint started");

    while app.wait() {
        if let Some(msg) = r.recv()
            && !controller.handle(msg)
        {
            app.quit();
        }
    }
}
