//! Invalidation fanout.
//!
//! The same underlying rows are reachable under several role-scoped keys, so
//! a mutation must drop every key that could now serve stale data. Deletes
//! are independent and best-effort: the mutation has already committed to
//! the database, a failed delete is logged and the remaining keys are still
//! attempted.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::warn;

use super::key::{CacheKeyPolicy, Resource};
use super::store::KeyValueStore;
use crate::middleware::auth::Role;

/// Resolves the admin/receptionist reporting structure needed for fanout.
#[async_trait]
pub trait StaffDirectory: Send + Sync {
    /// Ids of every receptionist whose `admin_id` is the given admin.
    async fn receptionists_of(&self, admin_id: i64) -> Result<Vec<i64>>;
    /// Owning admin of a receptionist, if any.
    async fn admin_of(&self, receptionist_id: i64) -> Result<Option<i64>>;
}

#[derive(Clone)]
pub struct InvalidationFanout {
    store: Arc<dyn KeyValueStore>,
    directory: Arc<dyn StaffDirectory>,
}

impl InvalidationFanout {
    pub fn new(store: Arc<dyn KeyValueStore>, directory: Arc<dyn StaffDirectory>) -> Self {
        Self { store, directory }
    }

    /// Drop every scoped key of a resource that the acting user's mutation
    /// could have made stale.
    ///
    /// The global key always goes. An admin actor additionally drops their
    /// own scoped key and the key of every receptionist reporting to them;
    /// a receptionist drops their own key and their owning admin's key.
    pub async fn invalidate(&self, resource: Resource, role: Role, actor_id: i64) {
        self.delete_quiet(&CacheKeyPolicy::all(resource)).await;

        match role {
            Role::Admin => {
                self.delete_quiet(&CacheKeyPolicy::admin(resource, actor_id))
                    .await;
                match self.directory.receptionists_of(actor_id).await {
                    Ok(ids) => {
                        for id in ids {
                            self.delete_quiet(&CacheKeyPolicy::receptionist(resource, id))
                                .await;
                        }
                    }
                    Err(e) => warn!(
                        "Could not enumerate receptionists of admin {}: {}",
                        actor_id, e
                    ),
                }
            }
            Role::Receptionist => {
                self.delete_quiet(&CacheKeyPolicy::receptionist(resource, actor_id))
                    .await;
                match self.directory.admin_of(actor_id).await {
                    Ok(Some(admin_id)) => {
                        self.delete_quiet(&CacheKeyPolicy::admin(resource, admin_id))
                            .await;
                    }
                    Ok(None) => {
                        warn!("Receptionist {} has no owning admin", actor_id)
                    }
                    Err(e) => warn!(
                        "Could not resolve owning admin of receptionist {}: {}",
                        actor_id, e
                    ),
                }
            }
            Role::SuperAdmin | Role::Guest => {}
        }
    }

    pub async fn invalidate_many(&self, resources: &[Resource], role: Role, actor_id: i64) {
        for resource in resources {
            self.invalidate(*resource, role, actor_id).await;
        }
    }

    /// Cascade for order create/update/cancel: the order snapshot, the
    /// acting user's order history and both occupancy-window snapshots are
    /// all derived from order rows. The owning admin's scoped order keys
    /// (and their receptionists') go too; a guest actor carries no scope of
    /// its own, so the owner fanout is what keeps staff views fresh.
    pub async fn order_mutation(&self, actor_id: i64, owner_admin_id: i64) {
        for key in [
            CacheKeyPolicy::all(Resource::Orders),
            CacheKeyPolicy::user_orders(actor_id),
            CacheKeyPolicy::all(Resource::Invoices),
            CacheKeyPolicy::statuses(Resource::Accommodations),
            CacheKeyPolicy::statuses(Resource::Rooms),
        ] {
            self.delete_quiet(&key).await;
        }
        self.invalidate(Resource::Orders, Role::Admin, owner_admin_id)
            .await;
        self.invalidate(Resource::Invoices, Role::Admin, owner_admin_id)
            .await;
    }

    /// Cascade for a payment-status change: every invoice view (global,
    /// admin-scoped, receptionist-scoped) may now be stale, so the whole
    /// `invoices:*` subtree is purged by pattern scan.
    pub async fn payment_status_change(&self, actor_id: i64) {
        self.purge_pattern(&CacheKeyPolicy::subtree_pattern(Resource::Invoices))
            .await;
        for key in [
            CacheKeyPolicy::all(Resource::Orders),
            CacheKeyPolicy::user_orders(actor_id),
            CacheKeyPolicy::statuses(Resource::Accommodations),
            CacheKeyPolicy::statuses(Resource::Rooms),
        ] {
            self.delete_quiet(&key).await;
        }
    }

    /// Delete every key matching a pattern. Per-key failures do not abort
    /// the remaining deletions.
    pub async fn purge_pattern(&self, pattern: &str) {
        let keys = match self.store.scan_keys(pattern).await {
            Ok(keys) => keys,
            Err(e) => {
                warn!("Could not scan keys for pattern {}: {}", pattern, e);
                return;
            }
        };
        for key in keys {
            self.delete_quiet(&key).await;
        }
    }

    pub async fn delete_key(&self, key: &str) {
        self.delete_quiet(key).await;
    }

    async fn delete_quiet(&self, key: &str) {
        if let Err(e) = self.store.delete(key).await {
            warn!("Cache invalidation failed for {}: {}", key, e);
        }
    }
}
