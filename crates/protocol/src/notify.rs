//! Fire-and-forget delivery between surfaces.

use smol::channel::{bounded, Receiver, Sender, TrySendError};

use crate::SurfaceMessage;

/// Sends messages to another surface without waiting for delivery.
///
/// Implementations must not fail the caller: an undeliverable message is
/// logged and dropped.
pub trait Notifier {
    fn notify(&self, message: SurfaceMessage);
}

/// Create a connected notifier/inbox pair holding at most `capacity` pending messages.
///
/// Panics if `capacity` is zero.
pub fn channel(capacity: usize) -> (ChannelNotifier, SurfaceInbox) {
    let (tx, rx) = bounded(capacity);
    (ChannelNotifier { tx }, SurfaceInbox { rx })
}

/// In-process notifier backed by a bounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: Sender<SurfaceMessage>,
}

impl Notifier for ChannelNotifier {
    fn notify(&self, message: SurfaceMessage) {
        match self.tx.try_send(message) {
            Ok(()) => {}
            Err(TrySendError::Full(message)) => {
                log::warn!("Receiving surface is busy, dropping '{}'", message.action());
            }
            Err(TrySendError::Closed(message)) => {
                log::warn!("Receiving surface is not active, dropping '{}'", message.action());
            }
        }
    }
}

/// Receiving end of a surface channel.
#[derive(Debug)]
pub struct SurfaceInbox {
    rx: Receiver<SurfaceMessage>,
}

impl SurfaceInbox {
    /// Wait for the next message. `None` once every notifier is gone.
    pub async fn recv(&self) -> Option<SurfaceMessage> {
        self.rx.recv().await.ok()
    }

    pub fn try_recv(&self) -> Option<SurfaceMessage> {
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinetube_config::SettingName;
    use serde_json::json;

    #[test]
    fn test_delivers_in_order() {
        let (notifier, inbox) = channel(4);
        notifier.notify(SurfaceMessage::UpdateCinemaPreference { enabled: true });
        notifier.notify(SurfaceMessage::setting_changed(SettingName::Opacity, json!(70)));

        smol::block_on(async {
            assert_eq!(
                inbox.recv().await,
                Some(SurfaceMessage::UpdateCinemaPreference { enabled: true })
            );
            assert!(matches!(
                inbox.recv().await,
                Some(SurfaceMessage::UpdateSettings(_))
            ));
        });
    }

    #[test]
    fn test_full_inbox_drops_without_panicking() {
        let (notifier, inbox) = channel(1);
        notifier.notify(SurfaceMessage::TriggerCinema);
        notifier.notify(SurfaceMessage::GetStats);

        assert_eq!(inbox.try_recv(), Some(SurfaceMessage::TriggerCinema));
        assert_eq!(inbox.try_recv(), None);
    }

    #[test]
    fn test_inactive_surface_drops_without_panicking() {
        let (notifier, inbox) = channel(1);
        drop(inbox);
        notifier.notify(SurfaceMessage::TriggerCinema);
    }

    #[test]
    fn test_inbox_ends_when_senders_drop() {
        let (notifier, inbox) = channel(1);
        drop(notifier);
        assert_eq!(smol::block_on(inbox.recv()), None);
    }
}
