/// DOM attachment points and submission settings for the plain-DOM widget.
///
/// Defaults match the contract-signing markup shipped with the rental
/// pages; hosts with different ids override individual fields.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetConfig {
    /// `<canvas>` the signature is drawn on. When the hosting page has no
    /// such element the widget mounts inert.
    pub canvas_id: String,
    pub clear_button_id: String,
    pub submit_button_id: String,
    pub agree_checkbox_id: String,
    /// Dialog container hidden after a successful submission.
    pub dialog_id: String,
    /// Contract-signing endpoint the signature is POSTed to.
    pub endpoint: String,
    /// Name of the hidden form field carrying the anti-forgery token.
    pub csrf_field: String,
    /// Delay before navigating to a server-supplied redirect target, so
    /// the success notice stays visible.
    pub redirect_delay_ms: u32,
    /// Submit label shown while a request is in flight.
    pub busy_label: String,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            canvas_id: "signature-canvas".into(),
            clear_button_id: "clear-signature".into(),
            submit_button_id: "submit-signature".into(),
            agree_checkbox_id: "agree-terms".into(),
            dialog_id: "contract-modal".into(),
            endpoint: "/api/contract/sign/".into(),
            csrf_field: "csrfmiddlewaretoken".into(),
            redirect_delay_ms: 1_500,
            busy_label: "Submitting...".into(),
        }
    }
}
