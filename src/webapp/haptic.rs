use std::sync::Arc;

use serde::Serialize;

use crate::{error::BridgeError, version::Version, webview::WebView};

const TRIGGER_HAPTIC_FEEDBACK: &str = "web_app_trigger_haptic_feedback";

/// Size and stiffness of the colliding UI objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactStyle {
    Light,
    Medium,
    Heavy,
    Rigid,
    Soft,
}

/// Outcome of the task the notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    Error,
    Success,
    Warning,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Feedback {
    Impact { impact_style: ImpactStyle },
    Notification { notification_type: NotificationType },
    SelectionChange,
}

/// Haptic feedback played by the host. Every method requires host 6.1.
pub struct HapticFeedback {
    webview: Arc<WebView>,
    version: Version,
}

impl HapticFeedback {
    pub(crate) fn new(webview: Arc<WebView>, version: Version) -> Self {
        Self { webview, version }
    }

    fn trigger(&self, feedback: Feedback) -> Result<(), BridgeError> {
        self.version.require("6.1")?;
        self.webview.post_event(TRIGGER_HAPTIC_FEEDBACK, &feedback)
    }

    pub fn impact_occurred(&self, style: ImpactStyle) -> Result<(), BridgeError> {
        self.trigger(Feedback::Impact {
            impact_style: style,
        })
    }

    pub fn notification_occurred(&self, kind: NotificationType) -> Result<(), BridgeError> {
        self.trigger(Feedback::Notification {
            notification_type: kind,
        })
    }

    /// Only for a changed selection, not for making or confirming one.
    pub fn selection_changed(&self) -> Result<(), BridgeError> {
        self.trigger(Feedback::SelectionChange)
    }
}
