use crate::models::submission::{ProctorEventType, ProctorLog};
use chrono::Utc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Raw browser-level signals observed while an exam is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProctorSignal {
    /// Page visibility flipped to hidden (tab switch / minimize).
    VisibilityHidden,
    WindowBlur,
    Copy,
    Paste,
    ContextMenu,
}

impl ProctorSignal {
    /// Copy, paste and context-menu are prevented in addition to being
    /// logged; the embedding UI uses this to cancel the default action.
    pub fn suppressed(self) -> bool {
        matches!(self, Self::Copy | Self::Paste | Self::ContextMenu)
    }

    pub fn into_log(self) -> ProctorLog {
        let (kind, details) = match self {
            Self::VisibilityHidden => (
                ProctorEventType::TabSwitch,
                Some("User switched tabs or minimized browser"),
            ),
            Self::WindowBlur => (ProctorEventType::LostFocus, Some("Window lost focus")),
            Self::Copy => (ProctorEventType::CopyAttempt, None),
            Self::Paste => (ProctorEventType::PasteAttempt, None),
            Self::ContextMenu => (
                ProctorEventType::ContextMenu,
                Some("Right-click menu blocked"),
            ),
        };
        ProctorLog {
            timestamp: Utc::now(),
            kind,
            details: details.map(str::to_string),
        }
    }
}

/// Fan-out bus standing in for the browser's five event channels. The
/// embedder publishes raw signals; each active monitor holds one
/// subscription for the span it is active.
#[derive(Clone)]
pub struct ProctorSignalBus {
    tx: broadcast::Sender<ProctorSignal>,
}

impl Default for ProctorSignalBus {
    fn default() -> Self {
        Self::new()
    }
}

impl ProctorSignalBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self { tx }
    }

    pub fn emit(&self, signal: ProctorSignal) {
        // No subscriber just means no exam is being monitored right now.
        let _ = self.tx.send(signal);
    }
}

/// One active monitoring span. The monitor keeps no history; the owning
/// session accumulates the logs. Deactivation (or drop) releases the
/// subscription, after which no event is delivered; a later reactivation
/// starts from a fresh subscription.
pub struct ProctorMonitor {
    task: JoinHandle<()>,
}

impl ProctorMonitor {
    pub fn activate<F>(bus: &ProctorSignalBus, mut on_violation: F) -> Self
    where
        F: FnMut(ProctorLog) + Send + 'static,
    {
        let mut rx = bus.tx.subscribe();
        let task = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(signal) => {
                        if signal.suppressed() {
                            tracing::debug!(?signal, "Suppressed default action");
                        }
                        on_violation(signal.into_log());
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        tracing::warn!(missed, "Proctor monitor lagged behind signal bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        Self { task }
    }

    pub fn deactivate(self) {
        self.task.abort();
    }
}

impl Drop for ProctorMonitor {
    fn drop(&mut self) {
        self.task.abort();
    }
}
