//! One-shot toasts stored in the session.

use tower_sessions::Session;

use crate::models::{Flash, session_keys};

/// Queue a toast for the next rendered page.
///
/// A lost toast never fails the request.
pub async fn set_flash(session: &Session, flash: Flash) {
    if let Err(e) = session.insert(session_keys::FLASH, flash).await {
        tracing::warn!(error = %e, "Failed to store flash message");
    }
}

/// Take the queued toast, if any.
pub async fn take_flash(session: &Session) -> Option<Flash> {
    session
        .remove::<Flash>(session_keys::FLASH)
        .await
        .ok()
        .flatten()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn test_flash_is_shown_once() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        set_flash(&session, Flash::success("Produkti u ruajt.")).await;

        assert_eq!(
            take_flash(&session).await,
            Some(Flash::success("Produkti u ruajt."))
        );
        assert_eq!(take_flash(&session).await, None);
    }
}
