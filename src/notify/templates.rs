//! Message bodies for transfer notifications.
//!
//! Each function returns `(subject, html)`.

use chrono::{DateTime, Utc};

/// Link the sender follows to confirm a pending transfer.
#[must_use]
pub fn activation_link(api_url: &str, transfer_id: i64) -> String {
    format!(
        "{}/activateTransfer?transferId={transfer_id}",
        api_url.trim_end_matches('/')
    )
}

/// Confirmation request for a new pending transfer.
#[must_use]
pub fn activation_request(
    sender: &str,
    amount: &str,
    receiver: &str,
    link: &str,
) -> (String, String) {
    let html = format!(
        "<div>\
         <p>Hi {sender},</p>\
         <p>A transfer of {amount} from your account to {receiver} is waiting for \
         your confirmation.</p>\
         <p>Check the recipient's username carefully, then confirm here: \
         <a href=\"{link}\">Confirm transfer</a></p>\
         <p>If you did not request this transfer, ignore this email.</p>\
         </div>"
    );
    ("Confirm your transfer".to_string(), html)
}

/// Notice that a transfer completed.
#[must_use]
pub fn transfer_completed(
    sender: &str,
    amount: &str,
    receiver: &str,
    completed_at: DateTime<Utc>,
) -> (String, String) {
    let when = completed_at.format("%Y-%m-%d %H:%M:%S");
    let html = format!(
        "<div>\
         <p>Hi {sender},</p>\
         <p>Your transfer of {amount} to {receiver} completed at {when} UTC.</p>\
         <p>This is an automated message, please do not reply.</p>\
         </div>"
    );
    ("Transfer completed".to_string(), html)
}

/// Notice that a pending transfer was cancelled.
#[must_use]
pub fn transfer_cancelled(sender: &str, receiver: &str) -> (String, String) {
    let html = format!(
        "<div>\
         <p>Hi {sender},</p>\
         <p>Your transfer to {receiver} has been cancelled. No balance was moved.</p>\
         <p>This is an automated message, please do not reply.</p>\
         </div>"
    );
    ("Transfer cancelled".to_string(), html)
}
