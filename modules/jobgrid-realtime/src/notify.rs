//! Notification fan-out: persist first, then best-effort live delivery.
//! The persisted record is what makes a notification eventually visible;
//! the live push is at-most-once and its failure is not an error.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

use jobgrid_common::{
    JobGridError, Notification, NotificationKind, Result, ServerEvent,
};
use jobgrid_store::{Collection, EntityStore, Filter, StoreError, Txn};

use crate::registry::ConnectionRegistry;

pub struct Notifier {
    store: Arc<dyn EntityStore>,
    registry: Arc<ConnectionRegistry>,
}

fn store_err(err: StoreError) -> JobGridError {
    match err {
        StoreError::Aborted(msg) => JobGridError::Aborted(msg),
        StoreError::Backend(e) => {
            warn!(error = %e, "store backend failure");
            JobGridError::aborted("store unavailable, please retry")
        }
    }
}

impl Notifier {
    pub fn new(store: Arc<dyn EntityStore>, registry: Arc<ConnectionRegistry>) -> Self {
        Self { store, registry }
    }

    /// Record the event and push it to the recipient's live connections.
    /// Self-actions never notify.
    pub async fn emit(
        &self,
        kind: NotificationKind,
        actor: Uuid,
        recipient: Uuid,
        subject: Uuid,
    ) -> Result<Option<Notification>> {
        if actor == recipient {
            return Ok(None);
        }

        let notification = Notification {
            id: Uuid::new_v4(),
            kind,
            actor,
            recipient,
            subject,
            read: false,
            created_at: Utc::now(),
        };

        let body = serde_json::to_value(&notification)
            .map_err(|_| JobGridError::aborted("could not encode notification"))?;
        let mut txn = Txn::new();
        txn.insert(Collection::Notifications, notification.id, body);
        self.store.apply(txn).await.map_err(store_err)?;

        // Durability secured; delivery is best-effort from here.
        let delivered = self
            .registry
            .send_to_user(
                recipient,
                &ServerEvent::NotificationNew {
                    notification: notification.clone(),
                },
            )
            .await;
        debug!(%recipient, kind = %kind, delivered, "notification emitted");

        Ok(Some(notification))
    }

    /// Undo of an action (unlike, unfollow): remove the matching *unread*
    /// notification. Already read, already retracted, or never emitted —
    /// all silent no-ops; a read notification is never resurrected.
    pub async fn retract(
        &self,
        kind: NotificationKind,
        actor: Uuid,
        recipient: Uuid,
        subject: Uuid,
    ) -> Result<()> {
        if actor == recipient {
            return Ok(());
        }

        let filter = Filter::new()
            .eq("kind", json!(kind))
            .eq("actor", json!(actor))
            .eq("recipient", json!(recipient))
            .eq("subject", json!(subject))
            .eq("read", json!(false));
        let matches = self
            .store
            .scan(Collection::Notifications, &filter)
            .await
            .map_err(store_err)?;
        let Some(doc) = matches.first() else {
            return Ok(());
        };

        let mut txn = Txn::new();
        txn.expect_rev(Collection::Notifications, doc.id, doc.rev);
        txn.delete(Collection::Notifications, doc.id);
        match self.store.apply(txn).await {
            Ok(()) => Ok(()),
            // Lost a race with mark_read: the notification is no longer
            // unread, which is exactly the "leave it alone" case.
            Err(StoreError::Aborted(_)) => Ok(()),
            Err(e) => Err(store_err(e)),
        }
    }

    /// One-way unread → read. Idempotent.
    pub async fn mark_read(&self, id: Uuid) -> Result<Notification> {
        let doc = self
            .store
            .get(Collection::Notifications, id)
            .await
            .map_err(store_err)?
            .ok_or_else(|| JobGridError::not_found(format!("notification {id}")))?;
        let mut notification: Notification = doc.decode().map_err(store_err)?;
        if notification.read {
            return Ok(notification);
        }
        notification.read = true;

        let body = serde_json::to_value(&notification)
            .map_err(|_| JobGridError::aborted("could not encode notification"))?;
        let mut txn = Txn::new();
        txn.expect_rev(Collection::Notifications, id, doc.rev);
        txn.update(Collection::Notifications, id, body);
        self.store.apply(txn).await.map_err(store_err)?;
        Ok(notification)
    }
}
