//! Cache key derivation.
//!
//! Every cache key in the system is built here; handlers never assemble key
//! strings by hand, so the keys written on population are always the same
//! strings deleted on invalidation.

use crate::middleware::auth::Role;

/// Cached resource namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Accommodations,
    Rooms,
    Orders,
    Invoices,
    Users,
    Benefits,
}

impl Resource {
    pub fn namespace(self) -> &'static str {
        match self {
            Resource::Accommodations => "accommodations",
            Resource::Rooms => "rooms",
            Resource::Orders => "orders",
            Resource::Invoices => "invoices",
            Resource::Users => "users",
            Resource::Benefits => "benefits",
        }
    }
}

pub struct CacheKeyPolicy;

impl CacheKeyPolicy {
    /// Derive the list cache key for a caller.
    ///
    /// Super-admins and anonymous callers read the global snapshot; admins and
    /// receptionists each get a view scoped to their own id. Identical
    /// `(resource, role, id)` always derives the identical string.
    pub fn derive(resource: Resource, role: Role, caller_id: i64) -> String {
        match role {
            Role::Admin => Self::admin(resource, caller_id),
            Role::Receptionist => Self::receptionist(resource, caller_id),
            Role::SuperAdmin | Role::Guest => Self::all(resource),
        }
    }

    pub fn all(resource: Resource) -> String {
        format!("{}:all", resource.namespace())
    }

    pub fn admin(resource: Resource, admin_id: i64) -> String {
        format!("{}:admin:{}", resource.namespace(), admin_id)
    }

    pub fn receptionist(resource: Resource, receptionist_id: i64) -> String {
        format!("{}:receptionist:{}", resource.namespace(), receptionist_id)
    }

    /// Day-granular occupancy windows (`accommodations:statuses`, `rooms:statuses`).
    pub fn statuses(resource: Resource) -> String {
        format!("{}:statuses", resource.namespace())
    }

    /// Per-user order history key.
    pub fn user_orders(user_id: i64) -> String {
        format!("orders:all:user:{}", user_id)
    }

    /// Monthly revenue rollup for one admin.
    pub fn revenue_for_month(admin_id: i64, year: i32, month: u32) -> String {
        format!("revenue:admin:{}:{}-{:02}", admin_id, year, month)
    }

    /// Pattern covering every key under a resource namespace.
    pub fn subtree_pattern(resource: Resource) -> String {
        format!("{}:*", resource.namespace())
    }

    /// Persisted free-text filter state for a chat session.
    pub fn last_filters(user_id: i64, session_id: &str) -> String {
        format!("last_filters:{}:{}", user_id, session_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivation_is_deterministic() {
        for _ in 0..3 {
            assert_eq!(
                CacheKeyPolicy::derive(Resource::Accommodations, Role::Admin, 5),
                "accommodations:admin:5"
            );
            assert_eq!(
                CacheKeyPolicy::derive(Resource::Rooms, Role::Receptionist, 11),
                "rooms:receptionist:11"
            );
        }
    }

    #[test]
    fn super_admin_and_guest_share_the_global_key() {
        assert_eq!(
            CacheKeyPolicy::derive(Resource::Invoices, Role::SuperAdmin, 1),
            "invoices:all"
        );
        assert_eq!(
            CacheKeyPolicy::derive(Resource::Invoices, Role::Guest, 99),
            "invoices:all"
        );
    }

    #[test]
    fn auxiliary_keys() {
        assert_eq!(
            CacheKeyPolicy::statuses(Resource::Accommodations),
            "accommodations:statuses"
        );
        assert_eq!(CacheKeyPolicy::user_orders(7), "orders:all:user:7");
        assert_eq!(CacheKeyPolicy::subtree_pattern(Resource::Invoices), "invoices:*");
        assert_eq!(
            CacheKeyPolicy::last_filters(3, "abc"),
            "last_filters:3:abc"
        );
    }
}
