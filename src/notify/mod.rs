//! Outbound mail.
//!
//! Workflows hand finished ledger changes to a [`Notifier`], which renders the
//! message and passes it to a [`Mailer`]. Delivery is best effort: a failing
//! mailer is logged and never turns a committed ledger change into an error.

/// Message bodies for transfer notifications
pub mod templates;

use crate::{
    config::settings::MailSettings,
    entities::{transfer, user},
    errors::Result,
};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// A rendered email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MailMessage {
    /// Recipient address
    pub to: String,
    /// Sender address
    pub from: String,
    /// Subject line
    pub subject: String,
    /// HTML body
    pub html: String,
}

/// Delivers rendered mail.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Sends one message.
    async fn send(&self, message: MailMessage) -> Result<()>;
}

/// Mailer that writes messages to the log instead of delivering them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: MailMessage) -> Result<()> {
        info!(to = %message.to, subject = %message.subject, "Mail (log only)");
        Ok(())
    }
}

/// Renders and dispatches the ledger's notifications.
#[derive(Clone)]
pub struct Notifier {
    mailer: Arc<dyn Mailer>,
    settings: MailSettings,
}

impl Notifier {
    /// Creates a notifier sending through `mailer`.
    #[must_use]
    pub fn new(mailer: Arc<dyn Mailer>, settings: MailSettings) -> Self {
        Self { mailer, settings }
    }

    /// Asks the sender to confirm a pending transfer.
    pub async fn transfer_requested(
        &self,
        sender: &user::Model,
        receiver: &user::Model,
        transfer: &transfer::Model,
    ) {
        let link = templates::activation_link(&self.settings.api_url, transfer.id);
        let (subject, html) = templates::activation_request(
            &sender.username,
            &transfer.amount,
            &receiver.username,
            &link,
        );
        self.dispatch(&sender.email, subject, html).await;
    }

    /// Tells the sender a transfer went through.
    pub async fn transfer_completed(&self, sender: &user::Model, transfer: &transfer::Model) {
        let completed_at = transfer.update_date.unwrap_or(transfer.create_date);
        let (subject, html) = templates::transfer_completed(
            &sender.username,
            &transfer.amount,
            &transfer.receiver,
            completed_at,
        );
        self.dispatch(&sender.email, subject, html).await;
    }

    /// Tells the sender a transfer was cancelled.
    pub async fn transfer_cancelled(&self, sender: &user::Model, transfer: &transfer::Model) {
        let (subject, html) = templates::transfer_cancelled(&sender.username, &transfer.receiver);
        self.dispatch(&sender.email, subject, html).await;
    }

    async fn dispatch(&self, to: &str, subject: String, html: String) {
        let message = MailMessage {
            to: to.to_string(),
            from: self.settings.from.clone(),
            subject,
            html,
        };

        if let Err(e) = self.mailer.send(message).await {
            warn!(to, error = %e, "Mail delivery failed; ledger change already committed");
        }
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
