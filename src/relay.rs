/*
 * Copyright Stalwart Labs Ltd. See the COPYING
 * file at the top-level directory of this distribution.
 *
 * Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
 * https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
 * <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
 * option. This file may not be copied, modified, or distributed
 * except according to those terms.
 */

use std::hash::Hash;

use smtp_proto::EhloResponse;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::{smtp::builder::Session, Credentials, HtmlEmail, SmtpClientBuilder};

pub const GMAIL_HOST: &str = "smtp.gmail.com";
pub const GMAIL_SUBMISSION_PORT: u16 = 587;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Security {
    /// Connect in clear text and upgrade with STARTTLS.
    StartTls,
    /// Clear text only (should not be used).
    None,
}

/// The SMTP relay a message is handed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relay {
    pub host: String,
    pub port: u16,
    pub security: Security,
}

impl Relay {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Relay {
            host: host.into(),
            port,
            security: Security::StartTls,
        }
    }

    /// Gmail's submission endpoint.
    pub fn gmail() -> Self {
        Relay::new(GMAIL_HOST, GMAIL_SUBMISSION_PORT)
    }

    pub fn security(mut self, security: Security) -> Self {
        self.security = security;
        self
    }

    /// Opens one session, authenticates, submits `email` and closes the
    /// session again. The connection never outlives this call.
    pub async fn deliver<T: AsRef<str> + PartialEq + Eq + Hash>(
        &self,
        credentials: &Credentials<T>,
        email: &HtmlEmail,
    ) -> crate::Result<()> {
        let builder = SmtpClientBuilder::new(self.host.as_str(), self.port);

        match self.security {
            Security::StartTls => submit(builder.connect().await?, credentials, email).await,
            Security::None => submit(builder.connect_plain().await?, credentials, email).await,
        }
    }
}

/// Runs the authenticated part of a session. QUIT follows on every path,
/// including a rejected login.
async fn submit<S, T>(
    (mut client, capabilities): Session<S>,
    credentials: &Credentials<T>,
    email: &HtmlEmail,
) -> crate::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
    T: AsRef<str> + PartialEq + Eq + Hash,
{
    match transaction(&mut client, &capabilities, credentials, email).await {
        Ok(()) => {
            // The relay already accepted the message
            if let Err(err) = client.quit().await {
                log::warn!("QUIT failed after delivery: {err}");
            }
            Ok(())
        }
        Err(err) => {
            if let Err(quit_err) = client.quit().await {
                log::debug!("QUIT failed: {quit_err}");
            }
            Err(err)
        }
    }
}

async fn transaction<S, T>(
    client: &mut crate::SmtpClient<S>,
    capabilities: &EhloResponse<String>,
    credentials: &Credentials<T>,
    email: &HtmlEmail,
) -> crate::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
    T: AsRef<str> + PartialEq + Eq + Hash,
{
    client.authenticate(credentials, capabilities).await?;
    client.send(email).await
}
