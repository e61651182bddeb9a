//! Best-effort notification dispatch.
//!
//! Notifications are sent from detached tasks; their failures are logged and
//! never reach the request that triggered them.

pub mod dispatcher;
pub mod notifier;

pub use dispatcher::{BookingNotice, NotificationDispatcher};
pub use notifier::{HttpNotifier, MemoryNotifier, NoopNotifier, Notification, Notifier, NotifyError};
