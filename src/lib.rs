//! Signature-capture widget for the car-rental contract-signing flow.
//!
//! Mount [`SignatureWidget`] over the signing dialog's canvas, buttons and
//! agreement checkbox. It tracks freehand strokes on a density-scaled
//! raster, gates submission on the agreement plus visible ink, and POSTs
//! the signed raster to the contract endpoint as a PNG data URI.

mod config;
mod error;
mod gate;
mod notify;
mod submit;
mod surface;
mod tracker;
mod widget;

#[cfg(feature = "yew")]
mod yew;

pub use config::WidgetConfig;
pub use error::SignError;
pub use gate::{precondition_failure, submit_enabled, MSG_AGREE_TERMS, MSG_NEED_SIGNATURE};
pub use notify::{LogNotifier, NoopNotifier, NoticeKind, Notifier, ToastNotifier};
pub use submit::{
    classify_response, prepare_submission, SignRequest, SignResponse, SubmitOutcome,
    MSG_SIGNED_OK, MSG_SUBMIT_FAILED, MSG_TRANSPORT_FAILED,
};
pub use surface::{rgba_has_ink, DrawingSurface};
pub use tracker::{Point, StrokeSegment, StrokeTracker, SurfaceGeometry};
pub use widget::SignatureWidget;

#[cfg(feature = "yew")]
pub use crate::yew::{SignatureStyle, SigningDialog, SigningDialogProps};
