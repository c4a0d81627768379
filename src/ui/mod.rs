pub mod dialogs;
pub mod main_window;
pub mod map_view;
pub mod menu;
