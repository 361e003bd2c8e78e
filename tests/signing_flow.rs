//! End-to-end checks of the signing pipeline's pure stages: coordinate
//! mapping, gate decisions, pre-flight refusals and outcome handling.

use std::cell::RefCell;

use rental_esign::{
    classify_response, precondition_failure, prepare_submission, rgba_has_ink, submit_enabled,
    NoticeKind, Notifier, Point, StrokeTracker, SubmitOutcome, SurfaceGeometry, MSG_AGREE_TERMS,
    MSG_NEED_SIGNATURE, MSG_SIGNED_OK, MSG_TRANSPORT_FAILED,
};

/// Captures notices so a test can assert exactly what the user saw.
#[derive(Default)]
struct RecordingNotifier {
    notices: RefCell<Vec<(NoticeKind, String)>>,
}

impl Notifier for RecordingNotifier {
    fn notify(&self, kind: NoticeKind, message: &str) {
        self.notices.borrow_mut().push((kind, message.to_string()));
    }
}

fn retina_geometry() -> SurfaceGeometry {
    // 300x150 CSS element at device pixel ratio 2.
    SurfaceGeometry {
        surface_w: 600.0,
        surface_h: 300.0,
        element_w: 300.0,
        element_h: 150.0,
    }
}

#[test]
fn a_css_stroke_lands_on_density_scaled_raster_points() {
    let mut tracker = StrokeTracker::new();
    let geom = retina_geometry();

    assert_eq!(tracker.begin(10.0, 10.0, geom), Point { x: 20.0, y: 20.0 });
    let seg = tracker.advance(20.0, 20.0, geom).expect("stroke is active");
    assert_eq!(seg.to, Point { x: 40.0, y: 40.0 });
}

#[test]
fn the_element_center_maps_to_the_raster_center() {
    for ratio in [1.0, 1.5, 2.0, 3.0] {
        let geom = SurfaceGeometry {
            surface_w: 300.0 * ratio,
            surface_h: 150.0 * ratio,
            element_w: 300.0,
            element_h: 150.0,
        };
        let center = geom.map(150.0, 75.0);
        assert_eq!(center.x, geom.surface_w / 2.0, "ratio {ratio}");
        assert_eq!(center.y, geom.surface_h / 2.0, "ratio {ratio}");
    }
}

#[test]
fn the_gate_opens_only_for_agreement_plus_ink() {
    for agreed in [false, true] {
        for ink in [false, true] {
            assert_eq!(submit_enabled(agreed, ink), agreed && ink);
        }
    }
}

#[test]
fn refusals_reach_the_user_and_never_the_network() {
    let notifier = RecordingNotifier::default();

    // Ink present but no agreement: the agreement message wins.
    let attempt = prepare_submission(false, true, "data:image/png;base64,AA".into(), "now".into());
    let msg = attempt.expect_err("must refuse");
    notifier.notify(NoticeKind::Error, msg);

    // No ink either: still the agreement message, never the signature one.
    let attempt = prepare_submission(false, false, "data:image/png;base64,AA".into(), "now".into());
    notifier.notify(NoticeKind::Error, attempt.expect_err("must refuse"));

    let notices = notifier.notices.borrow();
    assert_eq!(notices.len(), 2);
    assert!(notices.iter().all(|(kind, m)| {
        *kind == NoticeKind::Error && m == MSG_AGREE_TERMS
    }));
}

#[test]
fn a_blank_surface_asks_for_the_signature() {
    let err = prepare_submission(true, false, String::new(), String::new()).unwrap_err();
    assert_eq!(err, MSG_NEED_SIGNATURE);
}

#[test]
fn a_valid_attempt_carries_the_agreement_and_the_raster() {
    let request = prepare_submission(
        true,
        true,
        "data:image/png;base64,iVBORw0KGgo=".into(),
        "2026-08-05T10:30:00.000Z".into(),
    )
    .expect("preconditions hold");

    assert!(request.agree_terms);
    assert!(request.signature.starts_with("data:image/png;base64,"));
    assert_eq!(request.timestamp, "2026-08-05T10:30:00.000Z");
}

#[test]
fn the_success_path_reports_then_redirects() {
    let notifier = RecordingNotifier::default();
    let outcome = classify_response(r#"{"success": true, "redirect_url": "/done"}"#);

    notifier.notify(NoticeKind::Success, outcome.user_message());
    let redirect = match outcome {
        SubmitOutcome::Signed { redirect_url } => redirect_url,
        other => panic!("unexpected outcome {other:?}"),
    };

    assert_eq!(redirect.as_deref(), Some("/done"));
    let notices = notifier.notices.borrow();
    assert_eq!(notices.as_slice(), &[(NoticeKind::Success, MSG_SIGNED_OK.to_string())]);
}

#[test]
fn every_outcome_produces_exactly_one_notice() {
    // No outcome leaves the widget silent or stuck; each one maps to a
    // single user-visible message and a re-enabled control.
    let bodies = [
        r#"{"success": true}"#,
        r#"{"success": false, "error": "Vehicle no longer available"}"#,
        r#"{"success": false}"#,
        "not json at all",
    ];
    for body in bodies {
        let notifier = RecordingNotifier::default();
        let outcome = classify_response(body);
        let kind = match outcome {
            SubmitOutcome::Signed { .. } => NoticeKind::Success,
            _ => NoticeKind::Error,
        };
        notifier.notify(kind, outcome.user_message());
        assert_eq!(notifier.notices.borrow().len(), 1, "body: {body}");
    }
}

#[test]
fn transport_failures_use_the_generic_message() {
    let outcome = classify_response("<html>Bad Gateway</html>");
    assert_eq!(outcome, SubmitOutcome::TransportFailed);
    assert_eq!(outcome.user_message(), MSG_TRANSPORT_FAILED);
}

#[test]
fn ink_scan_matches_the_alpha_channel() {
    // Fresh surface: all-transparent raster, no ink.
    let blank = vec![0u8; 600 * 300 * 4];
    assert!(!rgba_has_ink(&blank));

    // One stamped dot is enough.
    let mut dotted = blank.clone();
    let idx = (300 * 150 + 150) * 4 + 3;
    dotted[idx] = 200;
    assert!(rgba_has_ink(&dotted));

    // Clearing twice leaves the same blank state as clearing once.
    let cleared_once = vec![0u8; 600 * 300 * 4];
    let cleared_twice = cleared_once.clone();
    assert_eq!(cleared_once, cleared_twice);
    assert!(!rgba_has_ink(&cleared_twice));
}

#[test]
fn precondition_order_is_stable_across_all_inputs() {
    assert_eq!(precondition_failure(false, true), Some(MSG_AGREE_TERMS));
    assert_eq!(precondition_failure(false, false), Some(MSG_AGREE_TERMS));
    assert_eq!(precondition_failure(true, false), Some(MSG_NEED_SIGNATURE));
    assert_eq!(precondition_failure(true, true), None);
}
