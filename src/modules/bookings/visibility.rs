use slotbook_authz::Identity;
use slotbook_db::{BookingRecord, IdentityRecord};

use super::models::BookingView;
use crate::utils::timestamps::format_timestamp;

/// Stands in for the name on bookings the viewer may not see.
pub const TAKEN_PLACEHOLDER: &str = "Taken";
/// Stands in for contact details on bookings the viewer may not see.
pub const HIDDEN_PLACEHOLDER: &str = "Hidden";

/// Whether `viewer` is the registered owner joined to a booking.
pub fn owns(viewer: &Identity, owner: Option<&IdentityRecord>) -> bool {
    match (viewer.id(), owner) {
        (Some(viewer_id), Some(owner)) => viewer_id == owner.id,
        _ => false,
    }
}

/// Project one booking for one viewer.
///
/// Owners and administrators get every field. Everyone else sees only that
/// the slot is taken: times stay, personal fields become placeholders and the
/// owner id and service are zeroed.
pub fn project(booking: BookingRecord, viewer: &Identity, viewer_owns_booking: bool) -> BookingView {
    let start_time = format_timestamp(booking.start_time);
    let end_time = format_timestamp(booking.end_time);

    if viewer_owns_booking || viewer.is_administrator() {
        return BookingView {
            id: booking.id,
            user_id: booking.user_id.unwrap_or(0),
            name: booking.name,
            surname: booking.surname,
            email: booking.email,
            phone: booking.phone.unwrap_or_default(),
            service: booking.service,
            start_time,
            end_time,
        };
    }

    BookingView {
        id: booking.id,
        user_id: 0,
        name: TAKEN_PLACEHOLDER.to_string(),
        surname: String::new(),
        email: HIDDEN_PLACEHOLDER.to_string(),
        phone: HIDDEN_PLACEHOLDER.to_string(),
        service: 0,
        start_time,
        end_time,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::at;
    use slotbook_authz::Principal;

    fn booking(user_id: Option<i64>) -> BookingRecord {
        BookingRecord {
            id: 3,
            user_id,
            name: "John".to_string(),
            surname: "Doe".to_string(),
            email: "john@example.com".to_string(),
            phone: Some("555-0100".to_string()),
            service: 2,
            start_time: at("2025-05-01T09:00:00"),
            end_time: at("2025-05-01T10:00:00"),
        }
    }

    fn user(id: i64, is_admin: bool) -> Identity {
        Identity::User(Principal {
            id,
            name: "Viewer".to_string(),
            surname: String::new(),
            email: format!("user{id}@example.com"),
            is_admin,
        })
    }

    fn owner_record(id: i64) -> IdentityRecord {
        IdentityRecord {
            id,
            name: "John".to_string(),
            surname: "Doe".to_string(),
            email: "john@example.com".to_string(),
            password_hash: String::new(),
            api_key: "k".to_string(),
            is_admin: false,
        }
    }

    #[test]
    fn owner_sees_everything_including_owner_id() {
        let viewer = user(5, false);
        let owner = owner_record(5);
        assert!(owns(&viewer, Some(&owner)));

        let view = project(booking(Some(5)), &viewer, true);
        assert_eq!(view.user_id, 5);
        assert_eq!(view.email, "john@example.com");
        assert_eq!(view.phone, "555-0100");
        assert_eq!(view.service, 2);
    }

    #[test]
    fn administrator_sees_other_users_contact_fields() {
        let view = project(booking(Some(5)), &user(1, true), false);
        assert_eq!(view.name, "John");
        assert_eq!(view.email, "john@example.com");
        assert_eq!(view.user_id, 5);
    }

    #[test]
    fn others_see_a_taken_slot() {
        for viewer in [Identity::Anonymous, user(9, false)] {
            let view = project(booking(Some(5)), &viewer, false);
            assert_eq!(
                view,
                BookingView {
                    id: 3,
                    user_id: 0,
                    name: "Taken".to_string(),
                    surname: String::new(),
                    email: "Hidden".to_string(),
                    phone: "Hidden".to_string(),
                    service: 0,
                    start_time: "2025-05-01T09:00:00".to_string(),
                    end_time: "2025-05-01T10:00:00".to_string(),
                }
            );
        }
    }

    #[test]
    fn nobody_owns_guest_bookings() {
        assert!(!owns(&user(5, false), None));
        assert!(!owns(&Identity::Anonymous, Some(&owner_record(5))));
        assert!(!owns(&user(6, false), Some(&owner_record(5))));
    }
}
