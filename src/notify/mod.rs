use async_trait::async_trait;
use tracing::info;

mod smtp;

pub use smtp::SmtpNotifier;

/// A plain-text message for one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Outbound message delivery. One attempt, no retry.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, mail: &Mail) -> anyhow::Result<()>;
}

/// Writes mail to the log instead of delivering it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, mail: &Mail) -> anyhow::Result<()> {
        info!(to = %mail.to, subject = %mail.subject, "mail not delivered (log transport)");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn log_notifier_accepts_everything() {
        let mail = Mail {
            to: "a@x.com".into(),
            subject: "Verify Account".into(),
            body: "hello".into(),
        };
        LogNotifier.send(&mail).await.expect("log transport never fails");
    }
}
