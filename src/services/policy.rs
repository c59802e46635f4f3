//! Access policy for event mutations.
//!
//! Editing is creator-only; deleting is creator-or-admin.

use crate::models::{Event, User};

/// Only the creator may edit an event. Admins get no override here.
pub fn can_edit_event(actor_id: &str, event: &Event) -> bool {
    actor_id == event.creator_id
}

/// The creator or any admin may delete an event.
pub fn can_delete_event(actor: &User, event: &Event) -> bool {
    actor.id == event.creator_id || actor.is_admin()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn event(creator_id: &str) -> Event {
        serde_json::from_value(serde_json::json!({
            "id": "event1",
            "creator_id": creator_id,
        }))
        .unwrap()
    }

    fn user(id: &str, role: Role) -> User {
        User {
            id: id.to_string(),
            email: format!("{}@bu.edu", id),
            full_name: "Test User".to_string(),
            role,
            registered_events: vec![],
            created_events: 0,
        }
    }

    #[test]
    fn test_edit_is_creator_only() {
        let event = event("user123");
        assert!(can_edit_event("user123", &event));
        assert!(!can_edit_event("user456", &event));
    }

    #[test]
    fn test_delete_allows_creator_and_admin() {
        let event = event("user123");
        assert!(can_delete_event(&user("user123", Role::Student), &event));
        assert!(can_delete_event(&user("admin_user", Role::Admin), &event));
        assert!(!can_delete_event(&user("user456", Role::Student), &event));
    }

    #[test]
    fn test_admin_cannot_edit_others_event() {
        let event = event("user123");
        let admin = user("admin_user", Role::Admin);
        assert!(!can_edit_event(&admin.id, &event));
    }
}
