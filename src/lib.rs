//! TravelPrint: turn a list of places into a printable travel-route stamp.

pub mod app;
pub mod ui;
