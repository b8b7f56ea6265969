use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use lettre::{
    message::{MultiPart, SinglePart},
    transport::smtp::{authentication::Credentials, PoolConfig},
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use secrecy::ExposeSecret;

use crate::{configuration::EmailClientSettings, domain::EmailObject};

const IMPLICIT_TLS_PORT: u16 = 465;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: Option<String>,
}

#[async_trait]
pub trait GenericEmailService: Send + Sync {
    async fn send_html_email(
        &self,
        to: &str,
        subject: &str,
        html_body: String,
        text_body: String,
    ) -> Result<(), anyhow::Error>;
}

pub struct SmtpEmailClient {
    pub sender: EmailObject,
    pub mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpEmailClient {
    #[tracing::instrument(skip(email_config))]
    pub fn new(email_config: &EmailClientSettings) -> Result<Self, anyhow::Error> {
        let sender = email_config
            .sender()
            .map_err(|e| anyhow::anyhow!("Invalid sender email address: {}", e))?;
        let smtp_credentials = Credentials::new(
            email_config.username.to_string(),
            email_config.password.expose_secret().to_string(),
        );
        tracing::info!("Establishing connection to the SMTP server.");
        let builder = if email_config.port == IMPLICIT_TLS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&email_config.host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&email_config.host)?
        };
        let mailer = builder
            .port(email_config.port)
            .credentials(smtp_credentials)
            .pool_config(
                PoolConfig::new()
                    .min_idle(1)
                    .max_size(10)
                    .idle_timeout(Duration::new(300, 0)),
            )
            .build();

        tracing::info!("SMTP connection created successfully");
        Ok(Self { sender, mailer })
    }
}

#[async_trait]
impl GenericEmailService for SmtpEmailClient {
    #[tracing::instrument(name = "Send HTML email", skip(self, html_body, text_body))]
    async fn send_html_email(
        &self,
        to: &str,
        subject: &str,
        html_body: String,
        text_body: String,
    ) -> Result<(), anyhow::Error> {
        let email = Message::builder()
            .from(self.sender.as_ref().parse()?)
            .to(to.parse()?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(SinglePart::plain(text_body))
                    .singlepart(SinglePart::html(html_body)),
            )?;

        self.mailer.send(email).await?;
        tracing::info!("HTML email sent successfully");
        Ok(())
    }
}

/// Keeps every message in memory instead of delivering it.
#[derive(Default)]
pub struct DummyEmailClient {
    sent: Mutex<Vec<EmailMessage>>,
}

impl DummyEmailClient {
    pub fn new() -> Self {
        tracing::info!("Using dummy email client, messages will not be delivered");
        Self::default()
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent
            .lock()
            .map(|messages| messages.clone())
            .unwrap_or_default()
    }

    fn record(&self, message: EmailMessage) -> Result<(), anyhow::Error> {
        self.sent
            .lock()
            .map_err(|_| anyhow::anyhow!("Dummy mailbox poisoned"))?
            .push(message);
        Ok(())
    }
}

#[async_trait]
impl GenericEmailService for DummyEmailClient {
    async fn send_html_email(
        &self,
        to: &str,
        subject: &str,
        html_body: String,
        text_body: String,
    ) -> Result<(), anyhow::Error> {
        self.record(EmailMessage {
            to: to.to_string(),
            subject: subject.to_string(),
            text_body,
            html_body: Some(html_body),
        })
    }
}
