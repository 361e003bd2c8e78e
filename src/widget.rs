//! Plain-DOM signature widget: element lookup, event wiring, lifecycle.

use std::cell::RefCell;
use std::rc::Rc;

use gloo_timers::callback::Timeout;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{
    Document, Event, EventTarget, HtmlButtonElement, HtmlCanvasElement, HtmlElement,
    HtmlInputElement, MouseEvent, TouchEvent,
};

use crate::config::WidgetConfig;
use crate::error::SignError;
use crate::gate::{precondition_failure, submit_enabled};
use crate::notify::{NoticeKind, Notifier};
use crate::submit::{
    iso_timestamp_now, post_signature, SignRequest, SubmitOutcome, MSG_SIGNED_OK,
    MSG_TRANSPORT_FAILED,
};
use crate::surface::DrawingSurface;
use crate::tracker::{StrokeTracker, SurfaceGeometry};

/// State shared by every event closure of one mounted widget.
struct Inner {
    surface: DrawingSurface,
    tracker: StrokeTracker,
    clear_btn: Option<HtmlButtonElement>,
    submit_btn: Option<HtmlButtonElement>,
    agree_box: Option<HtmlInputElement>,
    /// Submit label restored after an in-flight request completes.
    submit_label: String,
    in_flight: bool,
    config: WidgetConfig,
    notifier: Rc<dyn Notifier>,
}

impl Inner {
    fn agreed(&self) -> bool {
        self.agree_box.as_ref().map(|b| b.checked()).unwrap_or(false)
    }

    /// Submission-gate recomputation. Runs synchronously on every ink
    /// transition and checkbox change; there is no polling timer.
    fn refresh_controls(&self) {
        let has_ink = self.surface.has_ink();
        if let Some(btn) = &self.clear_btn {
            btn.set_disabled(self.in_flight || !has_ink);
        }
        if let Some(btn) = &self.submit_btn {
            btn.set_disabled(self.in_flight || !submit_enabled(self.agreed(), has_ink));
        }
    }

    fn element_point(&self, client_x: f64, client_y: f64) -> (f64, f64, SurfaceGeometry) {
        let rect = self.surface.canvas().get_bounding_client_rect();
        let geom = SurfaceGeometry {
            surface_w: self.surface.width_px() as f64,
            surface_h: self.surface.height_px() as f64,
            element_w: rect.width(),
            element_h: rect.height(),
        };
        (client_x - rect.left(), client_y - rect.top(), geom)
    }

    fn stroke_begin(&mut self, client_x: f64, client_y: f64) {
        let (x, y, geom) = self.element_point(client_x, client_y);
        let p = self.tracker.begin(x, y, geom);
        let first_ink = !self.surface.has_ink();
        self.surface.stamp(p);
        if first_ink {
            self.refresh_controls();
        }
    }

    fn stroke_move(&mut self, client_x: f64, client_y: f64) {
        if !self.tracker.is_stroking() {
            return;
        }
        let (x, y, geom) = self.element_point(client_x, client_y);
        if let Some(seg) = self.tracker.advance(x, y, geom) {
            let first_ink = !self.surface.has_ink();
            self.surface.draw_segment(seg);
            if first_ink {
                self.refresh_controls();
            }
        }
    }

    fn stroke_end(&mut self) {
        self.tracker.finish();
    }

    fn clear(&mut self) {
        self.surface.clear();
        self.tracker.finish();
        self.refresh_controls();
    }

    fn on_resize(&mut self) {
        if let Err(err) = self.surface.resize() {
            log::warn!("canvas resize failed: {err}");
        }
        self.refresh_controls();
    }
}

/// One registered DOM listener; detached on drop.
struct ListenerHandle {
    target: EventTarget,
    event: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

impl ListenerHandle {
    fn attach(
        target: &EventTarget,
        event: &'static str,
        callback: Closure<dyn FnMut(Event)>,
    ) -> Result<Self, SignError> {
        target
            .add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())
            .map_err(|_| SignError::OpFailed(format!("addEventListener({event})")))?;
        Ok(Self {
            target: target.clone(),
            event,
            callback,
        })
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.event, self.callback.as_ref().unchecked_ref());
    }
}

/// RAII handle for a mounted signature widget.
///
/// Mounting registers the canvas, button, checkbox and window listeners;
/// dropping the handle detaches every one of them, so repeated dialog
/// open/close cycles leak nothing.
pub struct SignatureWidget {
    inner: Rc<RefCell<Inner>>,
    listeners: Vec<ListenerHandle>,
}

impl SignatureWidget {
    /// Mount on the configured elements. Returns `Ok(None)` when the page
    /// has no signature canvas: the widget stays inert and registers
    /// nothing.
    pub fn mount(config: WidgetConfig, notifier: Rc<dyn Notifier>) -> Result<Option<Self>, SignError> {
        let window = web_sys::window().ok_or(SignError::DomUnavailable)?;
        let document = window.document().ok_or(SignError::DomUnavailable)?;

        let Some(canvas) = element_of::<HtmlCanvasElement>(&document, &config.canvas_id) else {
            log::debug!("no #{} element, signature widget stays inert", config.canvas_id);
            return Ok(None);
        };

        let clear_btn = element_of::<HtmlButtonElement>(&document, &config.clear_button_id);
        let submit_btn = element_of::<HtmlButtonElement>(&document, &config.submit_button_id);
        let agree_box = element_of::<HtmlInputElement>(&document, &config.agree_checkbox_id);

        let surface = DrawingSurface::new(canvas.clone())?;
        let submit_label = submit_btn
            .as_ref()
            .and_then(|b| b.text_content())
            .unwrap_or_default();

        let inner = Rc::new(RefCell::new(Inner {
            surface,
            tracker: StrokeTracker::new(),
            clear_btn: clear_btn.clone(),
            submit_btn: submit_btn.clone(),
            agree_box: agree_box.clone(),
            submit_label,
            in_flight: false,
            config,
            notifier,
        }));
        inner.borrow().refresh_controls();

        let mut listeners = Vec::new();
        let canvas_target: &EventTarget = canvas.as_ref();

        // Mouse strokes.
        {
            let inner = Rc::clone(&inner);
            listeners.push(ListenerHandle::attach(
                canvas_target,
                "mousedown",
                Closure::wrap(Box::new(move |e: Event| {
                    if let Ok(e) = e.dyn_into::<MouseEvent>() {
                        inner
                            .borrow_mut()
                            .stroke_begin(e.client_x() as f64, e.client_y() as f64);
                    }
                }) as Box<dyn FnMut(_)>),
            )?);
        }
        {
            let inner = Rc::clone(&inner);
            listeners.push(ListenerHandle::attach(
                canvas_target,
                "mousemove",
                Closure::wrap(Box::new(move |e: Event| {
                    if let Ok(e) = e.dyn_into::<MouseEvent>() {
                        inner
                            .borrow_mut()
                            .stroke_move(e.client_x() as f64, e.client_y() as f64);
                    }
                }) as Box<dyn FnMut(_)>),
            )?);
        }
        for event in ["mouseup", "mouseleave"] {
            let inner = Rc::clone(&inner);
            listeners.push(ListenerHandle::attach(
                canvas_target,
                event,
                Closure::wrap(Box::new(move |_e: Event| {
                    inner.borrow_mut().stroke_end();
                }) as Box<dyn FnMut(_)>),
            )?);
        }

        // Touch strokes. preventDefault keeps the page from scrolling or
        // zooming while a stroke is in progress.
        {
            let inner = Rc::clone(&inner);
            listeners.push(ListenerHandle::attach(
                canvas_target,
                "touchstart",
                Closure::wrap(Box::new(move |e: Event| {
                    e.prevent_default();
                    if let Ok(e) = e.dyn_into::<TouchEvent>() {
                        if let Some(touch) = e.touches().get(0) {
                            inner
                                .borrow_mut()
                                .stroke_begin(touch.client_x() as f64, touch.client_y() as f64);
                        }
                    }
                }) as Box<dyn FnMut(_)>),
            )?);
        }
        {
            let inner = Rc::clone(&inner);
            listeners.push(ListenerHandle::attach(
                canvas_target,
                "touchmove",
                Closure::wrap(Box::new(move |e: Event| {
                    e.prevent_default();
                    if let Ok(e) = e.dyn_into::<TouchEvent>() {
                        if let Some(touch) = e.touches().get(0) {
                            inner
                                .borrow_mut()
                                .stroke_move(touch.client_x() as f64, touch.client_y() as f64);
                        }
                    }
                }) as Box<dyn FnMut(_)>),
            )?);
        }
        {
            let inner = Rc::clone(&inner);
            listeners.push(ListenerHandle::attach(
                canvas_target,
                "touchend",
                Closure::wrap(Box::new(move |e: Event| {
                    e.prevent_default();
                    inner.borrow_mut().stroke_end();
                }) as Box<dyn FnMut(_)>),
            )?);
        }

        // Agreement checkbox feeds the gate.
        if let Some(agree_box) = &agree_box {
            let inner = Rc::clone(&inner);
            listeners.push(ListenerHandle::attach(
                agree_box.as_ref(),
                "change",
                Closure::wrap(Box::new(move |_e: Event| {
                    inner.borrow().refresh_controls();
                }) as Box<dyn FnMut(_)>),
            )?);
        }

        if let Some(clear_btn) = &clear_btn {
            let inner = Rc::clone(&inner);
            listeners.push(ListenerHandle::attach(
                clear_btn.as_ref(),
                "click",
                Closure::wrap(Box::new(move |_e: Event| {
                    inner.borrow_mut().clear();
                }) as Box<dyn FnMut(_)>),
            )?);
        }

        if let Some(submit_btn) = &submit_btn {
            let inner = Rc::clone(&inner);
            listeners.push(ListenerHandle::attach(
                submit_btn.as_ref(),
                "click",
                Closure::wrap(Box::new(move |_e: Event| {
                    submit_clicked(&inner);
                }) as Box<dyn FnMut(_)>),
            )?);
        }

        // Keep the raster in step with the element box.
        {
            let inner = Rc::clone(&inner);
            listeners.push(ListenerHandle::attach(
                window.as_ref(),
                "resize",
                Closure::wrap(Box::new(move |_e: Event| {
                    inner.borrow_mut().on_resize();
                }) as Box<dyn FnMut(_)>),
            )?);
        }

        Ok(Some(Self { inner, listeners }))
    }

    pub fn clear(&self) {
        self.inner.borrow_mut().clear();
    }

    pub fn has_ink(&self) -> bool {
        self.inner.borrow().surface.has_ink()
    }

    pub fn to_png_data_url(&self) -> Result<String, SignError> {
        self.inner.borrow().surface.to_png_data_url()
    }
}

impl Drop for SignatureWidget {
    fn drop(&mut self) {
        log::debug!("signature widget detached ({} listeners)", self.listeners.len());
    }
}

fn submit_clicked(inner: &Rc<RefCell<Inner>>) {
    let (endpoint, token, request) = {
        let mut guard = inner.borrow_mut();
        if guard.in_flight {
            return;
        }

        let agreed = guard.agreed();
        let has_ink = match guard.surface.scan_ink() {
            Ok(found) => found,
            Err(err) => {
                log::warn!("ink scan failed, using the stroke flag: {err}");
                guard.surface.has_ink()
            }
        };
        if let Some(msg) = precondition_failure(agreed, has_ink) {
            guard.notifier.notify(NoticeKind::Error, msg);
            return;
        }

        let data_url = match guard.surface.to_png_data_url() {
            Ok(url) => url,
            Err(err) => {
                log::error!("signature export failed: {err}");
                guard.notifier.notify(NoticeKind::Error, MSG_TRANSPORT_FAILED);
                return;
            }
        };

        guard.in_flight = true;
        if let Some(btn) = &guard.submit_btn {
            btn.set_text_content(Some(&guard.config.busy_label));
        }
        guard.refresh_controls();

        let token = match read_csrf_token(&guard.config.csrf_field) {
            Ok(token) => token,
            Err(err) => {
                // The server rejects the request without it; still send so
                // the rejection surfaces through the normal outcome path.
                log::warn!("missing anti-forgery token: {err}");
                String::new()
            }
        };

        (
            guard.config.endpoint.clone(),
            token,
            SignRequest {
                signature: data_url,
                agree_terms: true,
                timestamp: iso_timestamp_now(),
            },
        )
    };

    let inner = Rc::clone(inner);
    spawn_local(async move {
        let outcome = post_signature(&endpoint, &token, &request).await;
        complete_submission(&inner, outcome);
    });
}

fn complete_submission(inner: &Rc<RefCell<Inner>>, outcome: SubmitOutcome) {
    let mut guard = inner.borrow_mut();

    // Leave the in-flight state before acting on the outcome; the redirect
    // below is delayed and must not keep the control stuck disabled.
    guard.in_flight = false;
    if let Some(btn) = &guard.submit_btn {
        btn.set_text_content(Some(&guard.submit_label));
        btn.set_disabled(false);
    }
    guard.refresh_controls();

    match outcome {
        SubmitOutcome::Signed { redirect_url } => {
            guard.notifier.notify(NoticeKind::Success, MSG_SIGNED_OK);
            close_dialog(&guard.config.dialog_id);
            if let Some(url) = redirect_url {
                schedule_redirect(url, guard.config.redirect_delay_ms);
            }
        }
        SubmitOutcome::Rejected { message } => {
            guard.notifier.notify(NoticeKind::Error, &message);
        }
        SubmitOutcome::TransportFailed => {
            guard.notifier.notify(NoticeKind::Error, MSG_TRANSPORT_FAILED);
        }
    }
}

fn close_dialog(dialog_id: &str) {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return;
    };
    if let Some(dialog) = document
        .get_element_by_id(dialog_id)
        .and_then(|e| e.dyn_into::<HtmlElement>().ok())
    {
        let _ = dialog.style().set_property("display", "none");
    }
    if let Some(body) = document.body() {
        let _ = body.style().set_property("overflow", "");
    }
}

/// Navigate after a fixed delay so the success notice stays visible.
pub(crate) fn schedule_redirect(url: String, delay_ms: u32) {
    Timeout::new(delay_ms, move || {
        if let Some(window) = web_sys::window() {
            if let Err(err) = window.location().set_href(&url) {
                log::error!("redirect failed: {err:?}");
            }
        }
    })
    .forget();
}

fn read_csrf_token(field: &str) -> Result<String, SignError> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or(SignError::DomUnavailable)?;
    let selector = format!("input[name={field}]");
    let el = document
        .query_selector(&selector)
        .map_err(|_| SignError::OpFailed(format!("querySelector({selector})")))?
        .ok_or(SignError::ElementNotFound(selector))?;
    let input: HtmlInputElement = el
        .dyn_into()
        .map_err(|_| SignError::OpFailed("token field is not <input>".into()))?;
    Ok(input.value())
}

fn element_of<T: JsCast>(document: &Document, id: &str) -> Option<T> {
    document
        .get_element_by_id(id)
        .and_then(|el| el.dyn_into::<T>().ok())
}
