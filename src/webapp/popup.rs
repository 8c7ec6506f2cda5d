//! Native popups and the single in-flight request slot.

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Mutex, MutexGuard, PoisonError,
    },
    time::Duration,
};

use serde::Serialize;
use tokio::sync::oneshot;

use crate::error::{BridgeError, Precondition};

const MAX_TITLE: usize = 64;
const MAX_MESSAGE: usize = 256;
const MAX_BUTTONS: usize = 3;
const MAX_BUTTON_ID: usize = 64;
const MAX_BUTTON_TEXT: usize = 64;

/// What a popup button looks like. `Ok`, `Close` and `Cancel` use texts
/// localized by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PopupButtonKind {
    Default { text: String },
    Ok,
    Close,
    Cancel,
    Destructive { text: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PopupButton {
    /// Reported back through `popup_closed` when the button is pressed.
    pub id: String,
    #[serde(flatten)]
    pub kind: PopupButtonKind,
}

impl PopupButton {
    pub fn new(kind: PopupButtonKind) -> Self {
        Self {
            id: String::new(),
            kind,
        }
    }

    pub fn default_button(text: impl Into<String>) -> Self {
        Self::new(PopupButtonKind::Default { text: text.into() })
    }

    pub fn destructive(text: impl Into<String>) -> Self {
        Self::new(PopupButtonKind::Destructive { text: text.into() })
    }

    pub fn ok() -> Self {
        Self::new(PopupButtonKind::Ok)
    }

    pub fn close() -> Self {
        Self::new(PopupButtonKind::Close)
    }

    pub fn cancel() -> Self {
        Self::new(PopupButtonKind::Cancel)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

/// Popup description as given by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PopupParams {
    pub title: Option<String>,
    pub message: String,
    pub buttons: Vec<PopupButton>,
}

impl PopupParams {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_button(mut self, button: PopupButton) -> Self {
        self.buttons.push(button);
        self
    }
}

/// Validated `web_app_open_popup` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct OpenPopup {
    pub title: String,
    pub message: String,
    pub buttons: Vec<PopupButton>,
}

impl OpenPopup {
    /// Trims and length-checks `params`. A popup without buttons gets a
    /// single `close` button.
    pub fn validate(params: PopupParams) -> Result<Self, BridgeError> {
        let title = params.title.as_deref().unwrap_or_default().trim().to_string();
        let message = params.message.trim().to_string();

        check_len("title", &title, 0, MAX_TITLE)?;
        check_len("message", &message, 1, MAX_MESSAGE)?;
        if params.buttons.len() > MAX_BUTTONS {
            return Err(BridgeError::length("buttons", params.buttons.len(), 0, MAX_BUTTONS));
        }

        let mut buttons = params.buttons;
        if buttons.is_empty() {
            buttons.push(PopupButton::close());
        }
        for button in &buttons {
            check_len("button id", &button.id, 0, MAX_BUTTON_ID)?;
            if let PopupButtonKind::Default { text } | PopupButtonKind::Destructive { text } =
                &button.kind
            {
                check_len("button text", text, 0, MAX_BUTTON_TEXT)?;
            }
        }

        Ok(Self {
            title,
            message,
            buttons,
        })
    }
}

fn check_len(what: &'static str, text: &str, min: usize, max: usize) -> Result<(), BridgeError> {
    let len = text.chars().count();
    if (min..=max).contains(&len) {
        Ok(())
    } else {
        Err(BridgeError::length(what, len, min, max))
    }
}

type Responder = oneshot::Sender<Option<String>>;

/// At most one popup may be open in the host at a time.
///
/// The slot is held from the moment the popup is posted until the host
/// reports `popup_closed`, whether or not anybody still awaits the answer.
#[derive(Debug, Default)]
pub(crate) struct PopupSlot {
    next_id: AtomicU64,
    pending: Mutex<Option<(u64, Responder)>>,
}

impl PopupSlot {
    fn lock(&self) -> MutexGuard<'_, Option<(u64, Responder)>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_pending(&self) -> bool {
        self.lock().is_some()
    }

    /// Claims the slot for a new request.
    pub fn acquire(&self, timeout: Option<Duration>) -> Result<PendingPopup, Precondition> {
        let mut pending = self.lock();
        if pending.is_some() {
            return Err(Precondition::PopupAlreadyOpened);
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        *pending = Some((id, tx));
        Ok(PendingPopup {
            id,
            receiver: Some(rx),
            timeout,
        })
    }

    /// Completes the in-flight request, if any, with the pressed button and
    /// frees the slot.
    pub fn resolve(&self, button_id: Option<String>) {
        let Some((id, tx)) = self.lock().take() else {
            tracing::debug!("popup_closed without a pending popup");
            return;
        };
        if tx.send(button_id).is_err() {
            tracing::debug!(request = id, "popup answer arrived after the caller gave up");
        }
    }

    /// Frees the slot if request `id` still holds it. Only for requests the
    /// host never received.
    pub fn release(&self, id: u64) {
        let mut pending = self.lock();
        if matches!(pending.as_ref(), Some((current, _)) if *current == id) {
            *pending = None;
        }
    }
}

/// Handle to a popup shown by [`WebApp::show_popup`](crate::WebApp::show_popup).
///
/// Dropping the handle, cancelling it or timing out only stops waiting. The
/// popup stays open in the host, and no other popup can be shown until the
/// host reports `popup_closed`.
#[derive(Debug)]
#[must_use = "the popup answer is lost unless the handle is awaited"]
pub struct PendingPopup {
    id: u64,
    receiver: Option<oneshot::Receiver<Option<String>>>,
    timeout: Option<Duration>,
}

impl PendingPopup {
    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    /// Waits for `popup_closed`. Resolves with the pressed button id, or
    /// `None` when the popup was dismissed.
    pub async fn wait(mut self) -> Result<Option<String>, BridgeError> {
        let Some(receiver) = self.receiver.take() else {
            return Err(BridgeError::PopupCancelled);
        };
        let answer = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, receiver)
                .await
                .map_err(|_| BridgeError::PopupTimeout(limit))?,
            None => receiver.await,
        };
        answer.map_err(|_| BridgeError::PopupCancelled)
    }

    /// Stops waiting for the answer.
    pub fn cancel(self) {
        drop(self);
    }
}
