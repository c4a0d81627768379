pub mod order_id;

use fltk::{app, prelude::*, window::Window};

/// Block on a modal dialog until it is hidden. The dialog is closed as well
/// when the main window asks the program to quit.
pub fn run_dialog(dialog: &Window) {
    while dialog.shown() {
        app::wait();
        if app::should_program_quit() {
            dialog.clone().hide();
        }
    }
}
