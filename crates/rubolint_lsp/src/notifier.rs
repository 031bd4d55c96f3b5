//! Forwards linter notifications to the client as `window/showMessage`.

use tower_lsp::Client;
use tracing::warn;

use rubolint_core::{Notification, Notifier};

use crate::conversion::to_message_type;

pub(crate) struct ClientNotifier {
    client: Client,
}

impl ClientNotifier {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl Notifier for ClientNotifier {
    fn notify(&self, notification: Notification) {
        let typ = to_message_type(notification.kind);
        let message = match notification.description {
            Some(description) => format!("{}\n{}", notification.message, description),
            None => notification.message,
        };

        // Called from both async tasks and blocking runner threads.
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!("No runtime to deliver notification: {}", message);
            return;
        };
        let client = self.client.clone();
        handle.spawn(async move {
            client.show_message(typ, message).await;
        });
    }
}
