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

use std::{hash::Hash, time::Duration};

use smtp_proto::{EhloResponse, EXT_START_TLS};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;

use crate::{SmtpClient, SmtpClientBuilder};

use super::{tls::build_tls_connector, AssertReply};

/// A connected session together with the capabilities the relay
/// advertised on it.
pub type Session<T> = (SmtpClient<T>, EhloResponse<String>);

impl<T: AsRef<str> + PartialEq + Eq + Hash> SmtpClientBuilder<T> {
    pub fn new(hostname: T, port: u16) -> Self {
        SmtpClientBuilder {
            addr: format!("{}:{}", hostname.as_ref(), port),
            timeout: Duration::from_secs(60 * 60),
            tls_connector: build_tls_connector(),
            tls_hostname: hostname,
            local_host: gethostname::gethostname()
                .to_str()
                .unwrap_or("[127.0.0.1]")
                .to_string(),
        }
    }

    /// Connects, reads the greeting and upgrades the session with STARTTLS.
    /// Authentication is left to the caller so that a rejected login still
    /// happens on a session that can be closed with QUIT.
    pub async fn connect(&self) -> crate::Result<Session<TlsStream<TcpStream>>> {
        tokio::time::timeout(self.timeout, async {
            log::debug!("Connecting to {}", self.addr);
            let mut client = SmtpClient {
                stream: TcpStream::connect(&self.addr).await?,
                timeout: self.timeout,
            };

            // Read greeting
            client.read().await?.assert_positive_completion()?;

            // Send EHLO
            let response = client.ehlo(&self.local_host).await?;
            if !response.has_capability(EXT_START_TLS) {
                return Err(crate::Error::MissingStartTls);
            }
            log::debug!("Upgrading connection to {} with STARTTLS", self.addr);
            let mut client = client
                .start_tls(&self.tls_connector, self.tls_hostname.as_ref())
                .await?;

            // Capabilities are only trusted after the TLS handshake
            let capabilities = client.ehlo(&self.local_host).await?;
            Ok((client, capabilities))
        })
        .await
        .map_err(|_| crate::Error::Timeout)?
    }

    /// Connect over clear text (should not be used)
    pub async fn connect_plain(&self) -> crate::Result<Session<TcpStream>> {
        let mut client = SmtpClient {
            stream: tokio::time::timeout(self.timeout, async {
                TcpStream::connect(&self.addr).await
            })
            .await
            .map_err(|_| crate::Error::Timeout)??,
            timeout: self.timeout,
        };

        // Read greeting
        client.read().await?.assert_positive_completion()?;

        let capabilities = client.ehlo(&self.local_host).await?;
        Ok((client, capabilities))
    }
}
