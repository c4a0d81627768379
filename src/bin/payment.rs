//! HTTP server for the payment verification endpoint.

use axum::{
    Json, Router,
    http::{Method, StatusCode},
    routing::any,
};
use serde_json::Value;
use tokio::net::TcpListener;
use tracing::{error, info};

use travel_print::app::infrastructure::config::payment_bind_addr;
use travel_print::app::infrastructure::logging::init_logging;
use travel_print::app::services::payment_endpoint::handle_payment_request;

async fn payment(method: Method, body: String) -> (StatusCode, Json<Value>) {
    let response = handle_payment_request(method.as_str(), &body);
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    info!(%method, status = response.status, "payment request");
    (status, Json(response.body))
}

#[tokio::main]
async fn main() {
    init_logging();

    let app = Router::new()
        .route("/payment", any(payment))
        .route("/.netlify/functions/payment", any(payment));

    let addr = payment_bind_addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    info!("Payment endpoint listening on {}", addr);

    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
    }
}
