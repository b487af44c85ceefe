use std::sync::Arc;

use crate::config::Settings;
use crate::delivery::EmailClient;
use crate::notification::NotificationRelay;
use crate::store::NotificationStore;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub relay: Arc<NotificationRelay>,
}

impl AppState {
    /// Assemble application state from a store and an email client.
    ///
    /// Both collaborators are injected so tests can swap in a memory
    /// store and a stub client.
    pub fn new(
        settings: Settings,
        store: Arc<dyn NotificationStore>,
        email: Arc<dyn EmailClient>,
    ) -> Self {
        let relay = Arc::new(NotificationRelay::new(store, email));

        Self {
            settings: Arc::new(settings),
            relay,
        }
    }
}
