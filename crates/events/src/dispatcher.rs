use std::sync::Arc;
use std::time::Duration;

use slotbook_kernel::settings::NotificationSettings;

use crate::notifier::{HttpNotifier, NoopNotifier, Notification, Notifier, NotifyError};

/// Fields of a freshly created booking that go into notification messages.
#[derive(Debug, Clone)]
pub struct BookingNotice {
    pub name: String,
    pub surname: String,
    pub email: String,
    pub start_time: String,
    pub end_time: String,
}

impl BookingNotice {
    fn details(&self) -> String {
        format!(
            "Name: {} {}\nEmail: {}\nStart Time: {}\nEnd Time: {}",
            self.name, self.surname, self.email, self.start_time, self.end_time
        )
    }

    /// Message to the calendar administrator.
    pub fn admin_notification(&self, admin_email: &str) -> Notification {
        Notification {
            to: admin_email.to_string(),
            subject: format!(
                "New Booking Created: {} {} | {} - {}",
                self.name, self.surname, self.start_time, self.end_time
            ),
            body: format!("A new booking has been created:\n\n{}", self.details()),
        }
    }

    /// Confirmation to whoever made the booking.
    pub fn requester_confirmation(&self) -> Notification {
        Notification {
            to: self.email.clone(),
            subject: "Your booking was created".to_string(),
            body: format!("Your booking was created:\n\n{}", self.details()),
        }
    }
}

/// Sends booking notifications from detached tasks.
#[derive(Clone)]
pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
    admin_email: Option<String>,
}

impl NotificationDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>, admin_email: Option<String>) -> Self {
        Self {
            notifier,
            admin_email,
        }
    }

    pub fn from_settings(settings: &NotificationSettings) -> Result<Self, NotifyError> {
        let notifier: Arc<dyn Notifier> = if settings.enabled {
            Arc::new(HttpNotifier::new(
                &settings.endpoint,
                Duration::from_millis(settings.timeout_ms),
            )?)
        } else {
            Arc::new(NoopNotifier)
        };
        Ok(Self::new(notifier, settings.admin_email.clone()))
    }

    /// Notify the administrator and confirm to the requester. Returns at once;
    /// must be called from within a Tokio runtime.
    pub fn booking_created(&self, notice: &BookingNotice) {
        match &self.admin_email {
            Some(admin_email) => self.spawn_send("admin", notice.admin_notification(admin_email)),
            None => tracing::debug!("no administrator address configured; skipping admin notice"),
        }
        self.spawn_send("confirmation", notice.requester_confirmation());
    }

    fn spawn_send(&self, kind: &'static str, notification: Notification) {
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            match notifier.send(&notification).await {
                Ok(()) => tracing::info!(kind, to = %notification.to, "notification sent"),
                Err(err) => tracing::warn!(kind, to = %notification.to, error = %err, "notification failed"),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifier::MemoryNotifier;

    fn notice() -> BookingNotice {
        BookingNotice {
            name: "John".to_string(),
            surname: "Doe".to_string(),
            email: "john@example.com".to_string(),
            start_time: "2025-05-01T09:00:00".to_string(),
            end_time: "2025-05-01T10:00:00".to_string(),
        }
    }

    #[test]
    fn admin_subject_names_slot() {
        let message = notice().admin_notification("admin@example.com");
        assert_eq!(message.to, "admin@example.com");
        assert_eq!(
            message.subject,
            "New Booking Created: John Doe | 2025-05-01T09:00:00 - 2025-05-01T10:00:00"
        );
        assert!(message.body.contains("Email: john@example.com"));
    }

    #[tokio::test]
    async fn sends_admin_notice_and_confirmation() {
        let notifier = Arc::new(MemoryNotifier::new());
        let dispatcher =
            NotificationDispatcher::new(notifier.clone(), Some("admin@example.com".to_string()));

        dispatcher.booking_created(&notice());

        let mut recipients: Vec<String> = notifier
            .wait_for(2, Duration::from_secs(5))
            .await
            .into_iter()
            .map(|message| message.to)
            .collect();
        recipients.sort();
        assert_eq!(recipients, vec!["admin@example.com", "john@example.com"]);
    }

    #[tokio::test]
    async fn skips_admin_notice_without_address() {
        let notifier = Arc::new(MemoryNotifier::new());
        let dispatcher = NotificationDispatcher::new(notifier.clone(), None);

        dispatcher.booking_created(&notice());

        let sent = notifier.wait_for(1, Duration::from_secs(5)).await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "Your booking was created");
    }

    #[test]
    fn disabled_settings_build_without_endpoint_validation() {
        let settings = NotificationSettings {
            enabled: false,
            endpoint: "not a url".to_string(),
            ..NotificationSettings::default()
        };
        assert!(NotificationDispatcher::from_settings(&settings).is_ok());
    }
}
