//! One-shot submission of a completed signature to the signing endpoint.

use serde::{Deserialize, Serialize};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, Request, RequestInit, Response};

use crate::error::SignError;
use crate::gate::precondition_failure;

pub const MSG_SIGNED_OK: &str = "Contract signed successfully!";
pub const MSG_SUBMIT_FAILED: &str = "Failed to submit signature";
pub const MSG_TRANSPORT_FAILED: &str = "An error occurred. Please try again.";

/// Anti-forgery token header expected by the signing endpoint.
const CSRF_HEADER: &str = "X-CSRFToken";

/// JSON body POSTed to the signing endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignRequest {
    /// PNG data URI of the signature raster.
    pub signature: String,
    pub agree_terms: bool,
    /// ISO-8601 submission time.
    pub timestamp: String,
}

/// JSON body returned by the signing endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SignResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub redirect_url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// What the widget should do after a submission attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Signed: close the dialog and, if present, navigate to the target
    /// after the configured delay.
    Signed { redirect_url: Option<String> },
    /// The endpoint rejected the signature; show its message.
    Rejected { message: String },
    /// The request or its decoding failed; show the generic message.
    TransportFailed,
}

impl SubmitOutcome {
    pub fn user_message(&self) -> &str {
        match self {
            SubmitOutcome::Signed { .. } => MSG_SIGNED_OK,
            SubmitOutcome::Rejected { message } => message,
            SubmitOutcome::TransportFailed => MSG_TRANSPORT_FAILED,
        }
    }
}

/// Synchronous pre-flight stage: either a user-visible refusal (in which
/// case no request exists and nothing hits the network) or the body to
/// send.
pub fn prepare_submission(
    agreed: bool,
    has_ink: bool,
    signature: String,
    timestamp: String,
) -> Result<SignRequest, &'static str> {
    if let Some(msg) = precondition_failure(agreed, has_ink) {
        return Err(msg);
    }
    Ok(SignRequest {
        signature,
        agree_terms: true,
        timestamp,
    })
}

/// Classify a raw response body. An unparsable body counts as a transport
/// failure; a `success: false` body uses the server message when present.
pub fn classify_response(body: &str) -> SubmitOutcome {
    match serde_json::from_str::<SignResponse>(body) {
        Ok(resp) if resp.success => SubmitOutcome::Signed {
            redirect_url: resp.redirect_url,
        },
        Ok(resp) => SubmitOutcome::Rejected {
            message: resp.error.unwrap_or_else(|| MSG_SUBMIT_FAILED.to_string()),
        },
        Err(err) => {
            log::error!("undecodable signing response: {err}");
            SubmitOutcome::TransportFailed
        }
    }
}

/// Current time as an ISO-8601 string, via the host clock.
pub fn iso_timestamp_now() -> String {
    js_sys::Date::new_0().to_iso_string().into()
}

/// POST the signed payload and classify the outcome. Transport errors are
/// logged and folded into [`SubmitOutcome::TransportFailed`]; the caller
/// always gets something it can surface to the user.
pub async fn post_signature(endpoint: &str, csrf_token: &str, request: &SignRequest) -> SubmitOutcome {
    match send(endpoint, csrf_token, request).await {
        Ok(body) => classify_response(&body),
        Err(err) => {
            log::error!("signature submission failed: {err}");
            SubmitOutcome::TransportFailed
        }
    }
}

async fn send(endpoint: &str, csrf_token: &str, request: &SignRequest) -> Result<String, SignError> {
    let window = web_sys::window().ok_or(SignError::DomUnavailable)?;
    let body = serde_json::to_string(request).map_err(|e| SignError::OpFailed(e.to_string()))?;

    let headers = Headers::new().map_err(|_| SignError::OpFailed("Headers::new".into()))?;
    headers
        .set("Content-Type", "application/json")
        .map_err(|_| SignError::OpFailed("Headers::set".into()))?;
    headers
        .set(CSRF_HEADER, csrf_token)
        .map_err(|_| SignError::OpFailed("Headers::set".into()))?;

    let init = RequestInit::new();
    init.set_method("POST");
    init.set_headers(&headers);
    init.set_body(&JsValue::from_str(&body));

    let req = Request::new_with_str_and_init(endpoint, &init)
        .map_err(|e| SignError::Network(js_message(&e)))?;
    let resp_value = JsFuture::from(window.fetch_with_request(&req))
        .await
        .map_err(|e| SignError::Network(js_message(&e)))?;
    let resp: Response = resp_value
        .dyn_into()
        .map_err(|_| SignError::BadResponse("fetch resolved to a non-Response".into()))?;

    let text_promise = resp.text().map_err(|e| SignError::BadResponse(js_message(&e)))?;
    let text = JsFuture::from(text_promise)
        .await
        .map_err(|e| SignError::BadResponse(js_message(&e)))?;
    text.as_string()
        .ok_or_else(|| SignError::BadResponse("non-text body".into()))
}

fn js_message(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::{MSG_AGREE_TERMS, MSG_NEED_SIGNATURE};
    use serde_json::json;

    #[test]
    fn request_serializes_with_the_wire_field_names() {
        let req = SignRequest {
            signature: "data:image/png;base64,AAAA".into(),
            agree_terms: true,
            timestamp: "2026-08-05T10:00:00.000Z".into(),
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(
            value,
            json!({
                "signature": "data:image/png;base64,AAAA",
                "agree_terms": true,
                "timestamp": "2026-08-05T10:00:00.000Z",
            })
        );
    }

    #[test]
    fn missing_agreement_refuses_before_missing_ink() {
        let err = prepare_submission(false, true, "sig".into(), "t".into()).unwrap_err();
        assert_eq!(err, MSG_AGREE_TERMS);
        let err = prepare_submission(false, false, "sig".into(), "t".into()).unwrap_err();
        assert_eq!(err, MSG_AGREE_TERMS);
    }

    #[test]
    fn missing_ink_refuses_without_a_request() {
        let err = prepare_submission(true, false, "sig".into(), "t".into()).unwrap_err();
        assert_eq!(err, MSG_NEED_SIGNATURE);
    }

    #[test]
    fn valid_preconditions_build_the_request() {
        let req = prepare_submission(true, true, "sig".into(), "now".into()).unwrap();
        assert!(req.agree_terms);
        assert_eq!(req.signature, "sig");
        assert_eq!(req.timestamp, "now");
    }

    #[test]
    fn success_with_redirect_is_signed() {
        let outcome = classify_response(r#"{"success":true,"redirect_url":"/done"}"#);
        assert_eq!(
            outcome,
            SubmitOutcome::Signed {
                redirect_url: Some("/done".into())
            }
        );
        assert_eq!(outcome.user_message(), MSG_SIGNED_OK);
    }

    #[test]
    fn success_without_redirect_is_signed() {
        let outcome = classify_response(r#"{"success":true}"#);
        assert_eq!(outcome, SubmitOutcome::Signed { redirect_url: None });
    }

    #[test]
    fn server_error_message_is_surfaced_verbatim() {
        let outcome = classify_response(r#"{"success":false,"error":"Contract already signed"}"#);
        assert_eq!(outcome.user_message(), "Contract already signed");
    }

    #[test]
    fn server_failure_without_message_falls_back() {
        let outcome = classify_response(r#"{"success":false}"#);
        assert_eq!(outcome.user_message(), MSG_SUBMIT_FAILED);
    }

    #[test]
    fn garbage_body_is_a_transport_failure() {
        assert_eq!(classify_response("<html>502</html>"), SubmitOutcome::TransportFailed);
        assert_eq!(classify_response(""), SubmitOutcome::TransportFailed);
        assert_eq!(
            SubmitOutcome::TransportFailed.user_message(),
            MSG_TRANSPORT_FAILED
        );
    }
}
