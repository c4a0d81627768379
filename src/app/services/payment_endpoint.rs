//! The payment verification endpoint.
//!
//! Verification is a stub: every well-formed POST is reported as paid. No call
//! is made to the payment provider.

use serde::Serialize;
use serde_json::Value;

pub const VERIFIED_MESSAGE: &str = "Pago verificado correctamente";
pub const NOT_VERIFIED_MESSAGE: &str = "Pago no encontrado o incompleto";
pub const METHOD_NOT_ALLOWED_MESSAGE: &str = "Método no permitido";
pub const SERVER_ERROR_MESSAGE: &str = "Error del servidor";
const NOT_AN_OBJECT: &str = "request body must be a JSON object";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationBody {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<Value>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EndpointResponse {
    pub status: u16,
    pub body: Value,
}

impl EndpointResponse {
    fn json<T: Serialize>(status: u16, body: &T) -> Self {
        Self {
            status,
            body: serde_json::to_value(body).unwrap_or(Value::Null),
        }
    }

    fn server_error(error: String) -> Self {
        Self::json(
            500,
            &ErrorBody {
                message: SERVER_ERROR_MESSAGE.to_string(),
                error: Some(error),
            },
        )
    }
}

/// Handle one request given its HTTP method and raw body.
///
/// Methods compare case-sensitively, so only an exact `POST` is accepted.
pub fn handle_payment_request(method: &str, body: &str) -> EndpointResponse {
    if method != "POST" {
        return EndpointResponse::json(
            405,
            &ErrorBody {
                message: METHOD_NOT_ALLOWED_MESSAGE.to_string(),
                error: None,
            },
        );
    }

    let parsed: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => return EndpointResponse::server_error(e.to_string()),
    };
    if !parsed.is_object() {
        return EndpointResponse::server_error(NOT_AN_OBJECT.to_string());
    }

    let order_id = parsed.get("orderId").filter(|v| !v.is_null()).cloned();
    let success = true;

    EndpointResponse::json(
        200,
        &VerificationBody {
            success,
            order_id,
            message: if success {
                VERIFIED_MESSAGE
            } else {
                NOT_VERIFIED_MESSAGE
            }
            .to_string(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_non_post_is_rejected() {
        for method in ["GET", "PUT", "DELETE", "post", "Post"] {
            let response = handle_payment_request(method, "");
            assert_eq!(response.status, 405);
            assert_eq!(response.body, json!({"message": "Método no permitido"}));
        }
    }

    #[test]
    fn test_post_always_succeeds() {
        let response = handle_payment_request("POST", r#"{"orderId":"LS-991"}"#);
        assert_eq!(response.status, 200);
        assert_eq!(
            response.body,
            json!({
                "success": true,
                "orderId": "LS-991",
                "message": "Pago verificado correctamente"
            })
        );
    }

    #[test]
    fn test_numeric_order_id_is_echoed() {
        let response = handle_payment_request("POST", r#"{"orderId":42}"#);
        assert_eq!(response.body["orderId"], json!(42));
    }

    #[test]
    fn test_missing_order_id_is_omitted() {
        let response = handle_payment_request("POST", "{}");
        assert_eq!(response.status, 200);
        assert!(response.body.get("orderId").is_none());
        assert_eq!(response.body["success"], json!(true));
    }

    #[test]
    fn test_malformed_body_is_server_error() {
        let response = handle_payment_request("POST", "{orderId:");
        assert_eq!(response.status, 500);
        assert_eq!(response.body["message"], json!("Error del servidor"));
        assert!(response.body["error"].is_string());
    }

    #[test]
    fn test_non_object_body_is_server_error() {
        for body in ["null", "[]", "\"LS-991\"", "42"] {
            let response = handle_payment_request("POST", body);
            assert_eq!(response.status, 500, "body {body}");
            assert_eq!(
                response.body,
                json!({
                    "message": "Error del servidor",
                    "error": "request body must be a JSON object"
                })
            );
        }
    }
}
