//! Digest delivery over SMTP.
//!
//! One message per run, multipart/alternative (plain text + HTML), sent to a
//! single recipient. Any failure here is fatal for the run; nothing retries.
//!
//! # Transport selection
//!
//! | port | connection |
//! |------|------------|
//! | 465  | implicit TLS |
//! | 587  | STARTTLS |
//! | other | plain (local relays) |

use crate::config::RunConfig;
use crate::error::MailError;
use crate::models::Digest;
use lettre::message::{Mailbox, MultiPart, SinglePart, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::fmt;
use std::time::Duration;
use tracing::{info, instrument};

/// Sends the composed digest through the configured relay.
#[derive(Clone)]
pub struct MailSender {
    host: String,
    port: u16,
    username: String,
    password: String,
    from: Mailbox,
    to: Mailbox,
    timeout: Duration,
}

impl fmt::Debug for MailSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailSender")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("to", &self.to.to_string())
            .finish()
    }
}

impl MailSender {
    pub fn from_config(config: &RunConfig) -> Self {
        Self {
            host: config.smtp_host.clone(),
            port: config.smtp_port,
            username: config.smtp_user.clone(),
            password: config.smtp_pass.clone(),
            from: config.email_from.clone(),
            to: config.email_to.clone(),
            timeout: config.timeout,
        }
    }

    /// Build the message for `digest` without sending it.
    pub fn build_message(&self, digest: &Digest) -> Result<Message, MailError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(digest.subject.as_str())
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(digest.text_body.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(digest.html_body.clone()),
                    ),
            )?;
        Ok(message)
    }

    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, MailError> {
        let builder = match self.port {
            465 => AsyncSmtpTransport::<Tokio1Executor>::relay(&self.host)?,
            587 => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.host)?,
            _ => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.host),
        };
        Ok(builder
            .port(self.port)
            .credentials(Credentials::new(
                self.username.clone(),
                self.password.clone(),
            ))
            .timeout(Some(self.timeout))
            .build())
    }

    /// Authenticate to the relay and submit the digest.
    #[instrument(level = "info", skip_all, fields(host = %self.host, port = self.port))]
    pub async fn send(&self, digest: &Digest) -> Result<(), MailError> {
        let message = self.build_message(digest)?;
        let mailer = self.transport()?;

        mailer.send(message).await?;

        info!(
            to = %self.to,
            subject = %digest.subject,
            articles = digest.articles.len(),
            "Digest email sent"
        );
        Ok(())
    }
}

/// Minimal ESMTP relay for tests: accepts or rejects `AUTH` and records
/// every message body it accepts.
#[cfg(test)]
pub(crate) mod fake_smtp {
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;

    pub struct FakeSmtp {
        pub port: u16,
        pub messages: Arc<Mutex<Vec<String>>>,
    }

    pub async fn start(accept_auth: bool) -> FakeSmtp {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let messages = Arc::new(Mutex::new(Vec::new()));
        let store = Arc::clone(&messages);

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let (read, mut write) = stream.into_split();
                let mut lines = BufReader::new(read);
                if write.write_all(b"220 localhost ESMTP fake\r\n").await.is_err() {
                    continue;
                }

                let mut line = String::new();
                loop {
                    line.clear();
                    match lines.read_line(&mut line).await {
                        Ok(0) | Err(_) => break,
                        Ok(_) => {}
                    }
                    let command = line.trim_end().to_ascii_uppercase();

                    let reply: &[u8] = if command.starts_with("EHLO") || command.starts_with("HELO") {
                        b"250-localhost\r\n250-AUTH PLAIN LOGIN\r\n250 8BITMIME\r\n"
                    } else if command.starts_with("AUTH") {
                        if accept_auth {
                            b"235 2.7.0 Authentication successful\r\n"
                        } else {
                            b"535 5.7.8 Authentication credentials invalid\r\n"
                        }
                    } else if command.starts_with("MAIL FROM") || command.starts_with("RCPT TO") {
                        b"250 2.1.0 Ok\r\n"
                    } else if command == "DATA" {
                        if write.write_all(b"354 End data with <CR><LF>.<CR><LF>\r\n").await.is_err() {
                            break;
                        }
                        let mut data = String::new();
                        loop {
                            line.clear();
                            match lines.read_line(&mut line).await {
                                Ok(0) | Err(_) => break,
                                Ok(_) if line == ".\r\n" => break,
                                Ok(_) => data.push_str(&line),
                            }
                        }
                        store.lock().unwrap().push(data);
                        b"250 2.0.0 Ok: queued\r\n"
                    } else if command == "QUIT" {
                        let _ = write.write_all(b"221 2.0.0 Bye\r\n").await;
                        break;
                    } else if command == "RSET" || command == "NOOP" {
                        b"250 2.0.0 Ok\r\n"
                    } else {
                        b"502 5.5.2 Command not recognized\r\n"
                    };

                    if write.write_all(reply).await.is_err() {
                        break;
                    }
                }
            }
        });

        FakeSmtp { port, messages }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outputs::compose_digest;
    use crate::outputs::fixtures::summarized;

    fn sender(port: u16) -> MailSender {
        MailSender {
            host: "127.0.0.1".to_string(),
            port,
            username: "digest@example.com".to_string(),
            password: "app-password".to_string(),
            from: "digest@example.com".parse().unwrap(),
            to: "reader@example.com".parse().unwrap(),
            timeout: Duration::from_secs(5),
        }
    }

    fn digest() -> Digest {
        compose_digest(
            "2025-05-06",
            &["IT"],
            vec![summarized("IT", "Chips", "Exports tighten.")],
        )
    }

    #[test]
    fn test_build_message_headers_and_parts() {
        let message = sender(2525).build_message(&digest()).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();

        assert!(raw.contains("To: reader@example.com"));
        assert!(raw.contains("From: digest@example.com"));
        assert!(raw.contains("multipart/alternative"));
        assert!(raw.contains("text/plain"));
        assert!(raw.contains("text/html"));
    }

    #[tokio::test]
    async fn test_send_delivers_to_relay() {
        let relay = fake_smtp::start(true).await;
        sender(relay.port).send(&digest()).await.unwrap();

        let messages = relay.messages.lock().unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("reader@example.com"));
    }

    #[tokio::test]
    async fn test_auth_failure_is_error() {
        let relay = fake_smtp::start(false).await;
        let result = sender(relay.port).send(&digest()).await;

        assert!(matches!(result, Err(MailError::Smtp(_))));
        assert!(relay.messages.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_connection_refused_is_error() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let result = sender(port).send(&digest()).await;
        assert!(matches!(result, Err(MailError::Smtp(_))));
    }
}
