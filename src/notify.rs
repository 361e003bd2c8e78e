//! User-visible notifications, injected at mount instead of looked up on a
//! shared global object.

use gloo_timers::callback::Timeout;
use web_sys::Element;

/// How long a toast stays visible, and the CSS transition lead-in.
const TOAST_DURATION_MS: u32 = 5_000;
const TOAST_SHOW_DELAY_MS: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Success,
    Warning,
    Error,
}

impl NoticeKind {
    pub fn css_class(self) -> &'static str {
        match self {
            NoticeKind::Info => "info",
            NoticeKind::Success => "success",
            NoticeKind::Warning => "warning",
            NoticeKind::Error => "error",
        }
    }
}

pub trait Notifier {
    fn notify(&self, kind: NoticeKind, message: &str);
}

/// Default notifier: routes notices to the `log` facade.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, kind: NoticeKind, message: &str) {
        match kind {
            NoticeKind::Error => log::error!("{message}"),
            NoticeKind::Warning => log::warn!("{message}"),
            _ => log::info!("{message}"),
        }
    }
}

/// Discards every notice. For tests and headless hosts.
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _kind: NoticeKind, _message: &str) {}
}

/// Renders notices as auto-dismissing `.notification` toasts on `<body>`,
/// matching the rental app's stylesheet. Falls back to logging when no DOM
/// is available.
pub struct ToastNotifier {
    pub duration_ms: u32,
}

impl Default for ToastNotifier {
    fn default() -> Self {
        Self {
            duration_ms: TOAST_DURATION_MS,
        }
    }
}

impl Notifier for ToastNotifier {
    fn notify(&self, kind: NoticeKind, message: &str) {
        match build_toast(kind, message) {
            Ok(toast) => {
                {
                    let toast = toast.clone();
                    Timeout::new(TOAST_SHOW_DELAY_MS, move || {
                        let _ = toast.class_list().add_1("show");
                    })
                    .forget();
                }
                Timeout::new(self.duration_ms, move || {
                    toast.remove();
                })
                .forget();
            }
            Err(_) => LogNotifier.notify(kind, message),
        }
    }
}

fn build_toast(kind: NoticeKind, message: &str) -> Result<Element, ()> {
    let document = web_sys::window().and_then(|w| w.document()).ok_or(())?;
    let body = document.body().ok_or(())?;

    let toast = document.create_element("div").map_err(|_| ())?;
    toast.set_class_name(&format!("notification notification-{}", kind.css_class()));

    let content = document.create_element("div").map_err(|_| ())?;
    content.set_class_name("notification-content");
    let text = document.create_element("span").map_err(|_| ())?;
    text.set_text_content(Some(message));
    content.append_child(&text).map_err(|_| ())?;
    toast.append_child(&content).map_err(|_| ())?;

    body.append_child(&toast).map_err(|_| ())?;
    Ok(toast)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_stylesheet_classes() {
        assert_eq!(NoticeKind::Info.css_class(), "info");
        assert_eq!(NoticeKind::Success.css_class(), "success");
        assert_eq!(NoticeKind::Warning.css_class(), "warning");
        assert_eq!(NoticeKind::Error.css_class(), "error");
    }
}
