use anyhow::Context;
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::debug;

use super::{Mail, Notifier};
use crate::config::SmtpConfig;

pub struct SmtpNotifier {
    from: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpNotifier {
    pub fn new(config: &SmtpConfig) -> anyhow::Result<Self> {
        let builder = if config.port == 587 {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
        }
        .with_context(|| format!("smtp relay {}", config.host))?;

        let transport = builder
            .port(config.port)
            .credentials(Credentials::new(
                config.sender.clone(),
                config.password.clone(),
            ))
            .build();

        let from = config
            .sender
            .parse::<Mailbox>()
            .with_context(|| format!("invalid sender address {}", config.sender))?;

        Ok(Self { from, transport })
    }

    fn build_message(&self, mail: &Mail) -> anyhow::Result<Message> {
        let to = mail
            .to
            .parse::<Mailbox>()
            .with_context(|| format!("invalid recipient address {}", mail.to))?;
        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(mail.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body.clone())
            .context("build mail message")
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, mail: &Mail) -> anyhow::Result<()> {
        let message = self.build_message(mail)?;
        self.transport
            .send(message)
            .await
            .context("smtp send")?;
        debug!(to = %mail.to, subject = %mail.subject, "mail delivered");
        Ok(())
    }
}
