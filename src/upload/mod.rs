mod api;
mod backoff;
mod notify;
mod session;
mod types;
mod validation;

pub use api::{DocumentApi, HttpDocumentApi};
pub use backoff::Backoff;
pub use notify::{LogNotifier, Notification, NotificationLevel, Notifier};
pub use session::{SessionState, UploadSession};
pub use types::{Phase, SelectedFile};
pub use validation::{HostCapabilities, ACCEPTED_EXTENSIONS, MAX_BYTES};
