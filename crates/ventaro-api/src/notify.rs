//! Fire-and-record helpers for email and the system log.
//!
//! Neither ever fails the request that triggered it.

use ventaro_core::{
  audit::{EmailStatus, NewEmailLog, NewSystemLog},
  store::Storefront,
};
use ventaro_mail::{Email, MailError};

use crate::AppState;

/// Send `email` and append the outcome to the email log.
pub(crate) async fn send_email<S: Storefront>(state: &AppState<S>, email: Email) {
  let (status, error) = match state.mailer.send(&email).await {
    Ok(()) => {
      tracing::info!(to = %email.to, kind = email.kind, "email sent");
      (EmailStatus::Sent, None)
    }
    Err(MailError::Disabled) => {
      tracing::info!(to = %email.to, kind = email.kind, "email skipped: delivery disabled");
      (EmailStatus::Skipped, None)
    }
    Err(e) => {
      tracing::warn!(to = %email.to, kind = email.kind, error = %e, "email failed");
      (EmailStatus::Failed, Some(e.to_string()))
    }
  };

  let entry = NewEmailLog {
    recipient: email.to,
    subject: email.subject,
    kind: email.kind.to_owned(),
    status,
    error,
  };
  if let Err(e) = state.store.append_email_log(entry).await {
    tracing::error!(error = %e, "failed to record email log");
  }
}

/// Append to the system log; failures are traced and dropped.
pub(crate) async fn system_log<S: Storefront>(state: &AppState<S>, entry: NewSystemLog) {
  if let Err(e) = state.store.append_system_log(entry).await {
    tracing::error!(error = %e, "failed to record system log");
  }
}
