use crate::app::infrastructure::token::Ticket;
use crate::app::services::geocoder::GeocodeOutcome;

/// All messages that can be sent through the FLTK channel.
/// Widget callbacks and worker threads send one of these; the dispatch loop in main handles them.
#[derive(Debug, Clone)]
pub enum Message {
    // Route
    AddDestination(String),
    GeocodeFinished {
        ticket: Ticket,
        name: String,
        outcome: GeocodeOutcome,
    },
    RemoveSelectedDestination,

    // Look
    TitleChanged(String),
    MapStyleSelected(usize),
    TemplateSelected(usize),
    PickLineColor,

    // Map surface
    MapStyleLoaded(Ticket),
    MapResized,

    // Export
    DownloadFree,
    DownloadPremium,
    CheckoutSucceeded(String),
    PaymentVerified { order_id: String, verified: bool },

    Quit,
}
