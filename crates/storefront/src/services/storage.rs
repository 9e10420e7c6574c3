//! Cart, wishlist and flash storage in the browser session.
//!
//! Every mutation reads the current list, applies the change, and writes the
//! whole list back so the session always holds the last local write.

use lodra_core::{Cart, TrackingCode, Wishlist};
use serde::de::DeserializeOwned;
use tower_sessions::Session;

use crate::models::{Flash, session_keys};

type SessionResult<T> = Result<T, tower_sessions::session::Error>;

/// Read a JSON blob, treating missing or undecodable values as absent.
async fn read<T: DeserializeOwned>(session: &Session, key: &str) -> Option<T> {
    match session.get::<T>(key).await {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(key, error = %e, "Discarding unreadable session value");
            None
        }
    }
}

/// Load the cart (empty if absent).
pub async fn load_cart(session: &Session) -> Cart {
    read(session, session_keys::CART).await.unwrap_or_default()
}

/// Persist the cart.
///
/// # Errors
///
/// Returns an error if the session store rejects the write.
pub async fn save_cart(session: &Session, cart: &Cart) -> SessionResult<()> {
    session.insert(session_keys::CART, cart).await
}

/// Load the cart, apply `change`, and write it back.
///
/// Not atomic: of two overlapping requests the last write wins. The cart and
/// wishlist forms queue their requests with `hx-sync="body:queue all"`.
///
/// # Errors
///
/// Returns an error if the session store rejects the write.
pub async fn update_cart<R>(
    session: &Session,
    change: impl FnOnce(&mut Cart) -> R,
) -> SessionResult<(Cart, R)> {
    let mut cart = load_cart(session).await;
    let result = change(&mut cart);
    save_cart(session, &cart).await?;
    Ok((cart, result))
}

/// Load the wishlist (empty if absent).
pub async fn load_wishlist(session: &Session) -> Wishlist {
    read(session, session_keys::WISHLIST)
        .await
        .unwrap_or_default()
}

/// Load the wishlist, apply `change`, and write it back.
///
/// # Errors
///
/// Returns an error if the session store rejects the write.
pub async fn update_wishlist<R>(
    session: &Session,
    change: impl FnOnce(&mut Wishlist) -> R,
) -> SessionResult<(Wishlist, R)> {
    let mut wishlist = load_wishlist(session).await;
    let result = change(&mut wishlist);
    session.insert(session_keys::WISHLIST, &wishlist).await?;
    Ok((wishlist, result))
}

/// Queue a toast for the next rendered page.
///
/// Failures are logged; a lost toast never fails the request.
pub async fn set_flash(session: &Session, flash: Flash) {
    if let Err(e) = session.insert(session_keys::FLASH, flash).await {
        tracing::warn!(error = %e, "Failed to store flash message");
    }
}

/// Take the queued toast, if any.
pub async fn take_flash(session: &Session) -> Option<Flash> {
    match session.remove::<Flash>(session_keys::FLASH).await {
        Ok(flash) => flash,
        Err(e) => {
            tracing::warn!(error = %e, "Discarding unreadable flash message");
            None
        }
    }
}

/// Remember the tracking code of the order just placed.
///
/// # Errors
///
/// Returns an error if the session store rejects the write.
pub async fn set_last_tracking_code(session: &Session, code: &TrackingCode) -> SessionResult<()> {
    session.insert(session_keys::LAST_TRACKING_CODE, code).await
}

/// Tracking code of the most recent order placed from this browser.
pub async fn last_tracking_code(session: &Session) -> Option<TrackingCode> {
    read(session, session_keys::LAST_TRACKING_CODE).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use lodra_core::{CartItem, Price, ProductId, WishlistItem};
    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    fn line(id: i64) -> CartItem {
        CartItem {
            id: ProductId::new(id),
            name: format!("Lodër {id}"),
            slug: format!("loder-{id}"),
            price: Price::from_lek(1200),
            quantity: 1,
            image: None,
        }
    }

    #[tokio::test]
    async fn test_cart_round_trips_through_session() {
        let session = session();
        assert!(load_cart(&session).await.is_empty());

        let (cart, ()) = update_cart(&session, |cart| cart.add_item(line(1), 2))
            .await
            .unwrap();
        assert_eq!(cart.total_unique_items(), 1);

        let reloaded = load_cart(&session).await;
        assert_eq!(reloaded, cart);
        assert_eq!(reloaded.total_items(), 2);
    }

    #[tokio::test]
    async fn test_corrupt_cart_is_treated_as_empty() {
        let session = session();
        session
            .insert(session_keys::CART, "not a cart")
            .await
            .unwrap();
        assert!(load_cart(&session).await.is_empty());
    }

    #[tokio::test]
    async fn test_wishlist_toggle_persists() {
        let session = session();
        let item = WishlistItem {
            id: ProductId::new(9),
            name: "Ari".to_string(),
            slug: "ari".to_string(),
            price: Price::from_lek(900),
            image: None,
        };

        let (_, added) = update_wishlist(&session, |w| w.toggle(item.clone()))
            .await
            .unwrap();
        assert!(added);
        assert!(load_wishlist(&session).await.contains(ProductId::new(9)));

        let (_, added) = update_wishlist(&session, |w| w.toggle(item)).await.unwrap();
        assert!(!added);
        assert!(load_wishlist(&session).await.is_empty());
    }

    #[tokio::test]
    async fn test_flash_is_one_shot() {
        let session = session();
        set_flash(&session, Flash::success("U shtua në shportë")).await;

        let flash = take_flash(&session).await.unwrap();
        assert_eq!(flash.message, "U shtua në shportë");
        assert!(take_flash(&session).await.is_none());
    }
}
