//! Tracing-backed [`Mailer`] implementation.
//!
//! The program's mail templates are rendered here; actual SMTP delivery is
//! an operational concern left behind the trait. Sends never fail, which
//! matches the best-effort contract: a real transport would log and return
//! `false` instead of propagating.

use kalinga_core::notify::{MailEvent, Mailer};

/// Writes each outbound email to the log instead of a wire.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
  async fn send(&self, to: &str, first_name: &str, event: &MailEvent) -> bool {
    tracing::info!(
      to,
      subject = event.subject(),
      "email: {}",
      render(first_name, event)
    );
    true
  }
}

fn render(first_name: &str, event: &MailEvent) -> String {
  match event {
    MailEvent::ApplicationApproved => format!(
      "Dear {first_name}, your Solo Parent ID application has been \
       approved. You may visit your Barangay Office to claim your ID."
    ),
    MailEvent::ApplicationDeclined { remarks } => format!(
      "Dear {first_name}, your Solo Parent ID application has been \
       declined. Reason: {remarks}"
    ),
    MailEvent::RevokeWarning => format!(
      "Dear {first_name}, your Solo Parent status is under review. Please \
       visit your designated SPO within 7 days to complete the compliance \
       requirements."
    ),
    MailEvent::Terminated => format!(
      "Dear {first_name}, your Solo Parent status has been terminated \
       following review."
    ),
    MailEvent::Reinstated => format!(
      "Dear {first_name}, your Solo Parent status has been reinstated."
    ),
    MailEvent::RenewalApproved => format!(
      "Dear {first_name}, your Solo Parent ID renewal has been approved."
    ),
    MailEvent::RenewalDeclined { remarks } => format!(
      "Dear {first_name}, your Solo Parent ID renewal was declined. \
       Reason: {remarks}"
    ),
  }
}
