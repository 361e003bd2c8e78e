// src/yew.rs
// feature = "yew"

use std::{cell::RefCell, rc::Rc};

use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Event, HtmlCanvasElement, HtmlInputElement, MouseEvent, PointerEvent};
use yew::{
    function_component, html, use_effect_with, use_node_ref, use_state, Callback, Html, Properties,
};

use crate::gate::submit_enabled;
use crate::notify::{NoticeKind, Notifier, ToastNotifier};
use crate::submit::{
    iso_timestamp_now, post_signature, prepare_submission, SubmitOutcome, MSG_SIGNED_OK,
    MSG_TRANSPORT_FAILED,
};
use crate::surface::DrawingSurface;
use crate::tracker::{StrokeTracker, SurfaceGeometry};
use crate::widget::schedule_redirect;

/// Visual customization for the signature canvas area.
#[derive(Clone, PartialEq)]
pub struct SignatureStyle {
    /// Canvas border CSS, e.g. "2px dashed #2b8a3e"
    pub border: String,
    /// Canvas background CSS color, e.g. "#fff"
    pub background: String,
    /// Canvas width/height in CSS pixels
    pub width: u32,
    pub height: u32,
}

impl Default for SignatureStyle {
    fn default() -> Self {
        Self {
            border: "2px dashed #888".into(),
            background: "#fff".into(),
            width: 520,
            height: 220,
        }
    }
}

/// Yew wrapper: signing dialog with canvas, agreement gate and submission.
#[derive(Properties, PartialEq, Clone)]
pub struct SigningDialogProps {
    /// Contract-signing endpoint the signature is POSTed to.
    pub endpoint: String,

    /// Anti-forgery token embedded in the hosting page.
    pub csrf_token: String,

    /// Visual style of the signature canvas.
    #[prop_or_default]
    pub style: Option<SignatureStyle>,

    /// Delay before navigating to a server-supplied redirect target.
    #[prop_or(1_500)]
    pub redirect_delay_ms: u32,

    /// Called with the redirect target after a successful submission.
    #[prop_or_default]
    pub on_signed: Option<Callback<Option<String>>>,
}

struct Pad {
    surface: DrawingSurface,
    tracker: StrokeTracker,
}

fn pad_geometry(surface: &DrawingSurface, rect: &web_sys::DomRect) -> SurfaceGeometry {
    SurfaceGeometry {
        surface_w: surface.width_px() as f64,
        surface_h: surface.height_px() as f64,
        element_w: rect.width(),
        element_h: rect.height(),
    }
}

#[function_component(SigningDialog)]
pub fn signing_dialog(props: &SigningDialogProps) -> Html {
    // Dialog state
    let is_open = use_state(|| false);
    let open = {
        let is_open = is_open.clone();
        move |_| is_open.set(true)
    };
    let close = {
        let is_open = is_open.clone();
        move |_| is_open.set(false)
    };

    // Pad state (exists only while the dialog is open)
    let pad_state: yew::UseStateHandle<Option<Rc<RefCell<Pad>>>> = use_state(|| None);
    let agreed = use_state(|| false);
    let has_ink = use_state(|| false);
    let in_flight = use_state(|| false);

    // Canvas ref to init the pad once the dialog is rendered
    let canvas_ref = use_node_ref();

    let style = props.style.clone().unwrap_or_default();

    // Init the pad when the dialog opens and the canvas is in the DOM
    {
        let canvas_ref = canvas_ref.clone();
        let pad_state = pad_state.clone();
        let agreed = agreed.clone();
        let has_ink = has_ink.clone();

        use_effect_with(*is_open, move |open_now| {
            if *open_now {
                if let Some(canvas_el) = canvas_ref.cast::<HtmlCanvasElement>() {
                    match DrawingSurface::new(canvas_el) {
                        Ok(surface) => {
                            pad_state.set(Some(Rc::new(RefCell::new(Pad {
                                surface,
                                tracker: StrokeTracker::new(),
                            }))));
                        }
                        Err(err) => {
                            // Without a canvas context there is nothing to sign on.
                            log::warn!("signature pad init failed: {err}");
                            pad_state.set(None);
                        }
                    }
                }
            } else {
                // close -> drop pad, reset the gate inputs
                pad_state.set(None);
                agreed.set(false);
                has_ink.set(false);
            }
            || ()
        });
    }

    let on_down = {
        let pad_state = pad_state.clone();
        let has_ink = has_ink.clone();
        Callback::from(move |e: PointerEvent| {
            if let Some(pad) = pad_state.as_ref() {
                if let Some(target) = e
                    .target()
                    .and_then(|t| t.dyn_into::<HtmlCanvasElement>().ok())
                {
                    let rect = target.get_bounding_client_rect();
                    let mut pad = pad.borrow_mut();
                    let geom = pad_geometry(&pad.surface, &rect);
                    let p = pad.tracker.begin(
                        e.client_x() as f64 - rect.left(),
                        e.client_y() as f64 - rect.top(),
                        geom,
                    );
                    pad.surface.stamp(p);
                    if !*has_ink {
                        has_ink.set(true);
                    }
                }
            }
        })
    };

    let on_move = {
        let pad_state = pad_state.clone();
        let has_ink = has_ink.clone();
        Callback::from(move |e: PointerEvent| {
            if let Some(pad) = pad_state.as_ref() {
                if let Some(target) = e
                    .target()
                    .and_then(|t| t.dyn_into::<HtmlCanvasElement>().ok())
                {
                    let rect = target.get_bounding_client_rect();
                    let mut pad = pad.borrow_mut();
                    let geom = pad_geometry(&pad.surface, &rect);
                    if let Some(seg) = pad.tracker.advance(
                        e.client_x() as f64 - rect.left(),
                        e.client_y() as f64 - rect.top(),
                        geom,
                    ) {
                        pad.surface.draw_segment(seg);
                        if !*has_ink {
                            has_ink.set(true);
                        }
                    }
                }
            }
        })
    };

    let on_up = {
        let pad_state = pad_state.clone();
        Callback::from(move |_e: PointerEvent| {
            if let Some(pad) = pad_state.as_ref() {
                pad.borrow_mut().tracker.finish();
            }
        })
    };

    let on_agree = {
        let agreed = agreed.clone();
        Callback::from(move |e: Event| {
            if let Some(checkbox) = e
                .target()
                .and_then(|t| t.dyn_into::<HtmlInputElement>().ok())
            {
                agreed.set(checkbox.checked());
            }
        })
    };

    let on_clear = {
        let pad_state = pad_state.clone();
        let has_ink = has_ink.clone();
        Callback::from(move |_e: MouseEvent| {
            if let Some(pad) = pad_state.as_ref() {
                let mut pad = pad.borrow_mut();
                pad.surface.clear();
                pad.tracker.finish();
            }
            has_ink.set(false);
        })
    };

    // Submit click: preconditions, export, POST, outcome handling
    let on_submit = {
        let props = props.clone();
        let pad_state = pad_state.clone();
        let agreed = agreed.clone();
        let in_flight = in_flight.clone();
        let is_open = is_open.clone();
        Callback::from(move |_e: MouseEvent| {
            if *in_flight {
                return;
            }
            let Some(pad) = pad_state.as_ref() else {
                return;
            };

            let toasts = ToastNotifier::default();
            let (ink, data_url) = {
                let pad = pad.borrow();
                let ink = match pad.surface.scan_ink() {
                    Ok(found) => found,
                    Err(err) => {
                        log::warn!("ink scan failed, using the stroke flag: {err}");
                        pad.surface.has_ink()
                    }
                };
                let data_url = match pad.surface.to_png_data_url() {
                    Ok(url) => url,
                    Err(err) => {
                        log::error!("signature export failed: {err}");
                        toasts.notify(NoticeKind::Error, MSG_TRANSPORT_FAILED);
                        return;
                    }
                };
                (ink, data_url)
            };

            let request = match prepare_submission(*agreed, ink, data_url, iso_timestamp_now()) {
                Ok(request) => request,
                Err(msg) => {
                    toasts.notify(NoticeKind::Error, msg);
                    return;
                }
            };

            in_flight.set(true);
            let endpoint = props.endpoint.clone();
            let token = props.csrf_token.clone();
            let redirect_delay_ms = props.redirect_delay_ms;
            let on_signed = props.on_signed.clone();
            let in_flight = in_flight.clone();
            let is_open = is_open.clone();
            spawn_local(async move {
                let outcome = post_signature(&endpoint, &token, &request).await;
                in_flight.set(false);
                let toasts = ToastNotifier::default();
                match outcome {
                    SubmitOutcome::Signed { redirect_url } => {
                        toasts.notify(NoticeKind::Success, MSG_SIGNED_OK);
                        is_open.set(false);
                        if let Some(cb) = &on_signed {
                            cb.emit(redirect_url.clone());
                        }
                        if let Some(url) = redirect_url {
                            schedule_redirect(url, redirect_delay_ms);
                        }
                    }
                    other => {
                        toasts.notify(NoticeKind::Error, other.user_message());
                    }
                }
            });
        })
    };

    let submit_disabled = *in_flight || !submit_enabled(*agreed, *has_ink);
    let submit_label = if *in_flight { "Submitting..." } else { "Submit Signature" };

    html! {
        <>
          <button id="sign-contract-btn" onclick={open}>
            {"Sign Contract"}
          </button>

          {
            if *is_open {
              html! {
                <>
                  <div class="es-modal-backdrop" onclick={close.clone()}></div>
                  <div class="es-modal">
                    <div class="es-modal__panel"
                         onclick={Callback::from(|e: MouseEvent| { e.stop_propagation(); })}>
                      <h3>{"Sign Rental Agreement"}</h3>
                      <canvas id="signature-canvas"
                              ref={canvas_ref}
                              style={format!(
                                "width:{}px;height:{}px;background:{};border:{};touch-action:none;",
                                style.width, style.height, style.background, style.border
                              )}
                              onpointerdown={on_down}
                              onpointermove={on_move}
                              onpointerup={on_up.clone()}
                              onpointerleave={on_up}
                      />
                      <label class="es-agree">
                        <input type="checkbox" checked={*agreed} onchange={on_agree} />
                        {" I have read and agree to the terms and conditions"}
                      </label>
                      <div class="controls">
                        <button id="submit-signature" onclick={on_submit} disabled={submit_disabled}>
                          {submit_label}
                        </button>
                        <button id="clear-signature" onclick={on_clear} disabled={!*has_ink}>
                          {"Clear"}
                        </button>
                        <button class="secondary" onclick={close}>{"Cancel"}</button>
                      </div>
                    </div>
                  </div>
                </>
              }
            } else {
              Html::default()
            }
          }
        </>
    }
}
