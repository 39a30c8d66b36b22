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

//! # html-mail-send
//!
//! _html-mail-send_ delivers an HTML file as an e-mail message through an SMTP relay.
//! Local images referenced from the HTML are discovered, attached as inline parts and
//! the markup is rewritten to point at them through `cid:` URLs, so the message renders
//! without fetching anything over the network.
//!
//! - Reads the relay credentials from a `KEY=value` file or the process environment.
//! - Finds `<img src="...">` references that resolve to files next to the HTML document.
//! - Builds a `multipart/related` message (_RFC 2387_) with an HTML body and one inline
//!   image part per reference, tagged with a Content-ID (_RFC 2392_).
//! - Delivers it over SMTP (_RFC 5321_) after a STARTTLS upgrade (_RFC 3207_) and
//!   SASL authentication (_RFC 4954_) with PLAIN or LOGIN.
//!
//! ## Usage Example
//!
//! ```rust
//!     let email = HtmlEmail::from_file("newsletter/index.html")?
//!         .from("john@gmail.com")
//!         .to("jane@example.com")
//!         .subject("Our latest news");
//!
//!     Relay::gmail()
//!         .deliver(&Credentials::new("john@gmail.com", "app-password"), &email)
//!         .await?;
//! ```
//!
//! ## License
//!
//! Licensed under either of
//!
//!  * Apache License, Version 2.0 ([LICENSE-APACHE](LICENSE-APACHE) or <http://www.apache.org/licenses/LICENSE-2.0>)
//!  * MIT license ([LICENSE-MIT](LICENSE-MIT) or <http://opensource.org/licenses/MIT>)
//!
//! at your option.
//!

pub mod compose;
pub mod config;
pub mod html;
pub mod relay;
pub mod report;
#[forbid(unsafe_code)]
pub mod smtp;

use std::{fmt::Display, hash::Hash, path::PathBuf, time::Duration};

pub use compose::HtmlEmail;
pub use config::Config;
pub use relay::Relay;
pub use smtp::auth::Credentials;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_rustls::TlsConnector;

#[derive(Debug)]
pub enum Error {
    /// I/O error
    Io(std::io::Error),

    /// TLS error
    Tls(Box<rustls::Error>),

    /// Base64 decode error
    Base64(base64::DecodeError),

    // SMTP authentication error.
    Auth(smtp::auth::Error),

    /// Failure parsing SMTP reply
    UnparseableReply,

    /// Unexpected SMTP reply.
    UnexpectedReply(smtp_proto::Response<String>),

    /// SMTP authentication failure.
    AuthenticationFailed(smtp_proto::Response<String>),

    /// Invalid TLS name provided.
    InvalidTLSName,

    /// Missing authentication credentials.
    MissingCredentials,

    /// Missing message sender.
    MissingMailFrom,

    /// Missing message recipients.
    MissingRcptTo,

    /// The server does no support any of the available authentication methods.
    UnsupportedAuthMechanism,

    /// Connection timeout.
    Timeout,

    /// STARTTLS not available
    MissingStartTls,

    /// The HTML document does not exist.
    HtmlNotFound(PathBuf),

    /// An embedded image could not be read.
    ImageRead {
        path: PathBuf,
        error: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// SMTP client session.
pub struct SmtpClient<T: AsyncRead + AsyncWrite> {
    pub stream: T,
    pub timeout: Duration,
}

/// Connection settings for an [`SmtpClient`].
#[derive(Clone)]
pub struct SmtpClientBuilder<T: AsRef<str> + PartialEq + Eq + Hash> {
    pub timeout: Duration,
    pub tls_connector: TlsConnector,
    pub tls_hostname: T,
    pub addr: String,
    pub local_host: String,
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {e}"),
            Error::Tls(e) => write!(f, "TLS error: {e}"),
            Error::Base64(e) => write!(f, "Base64 decode error: {e}"),
            Error::Auth(e) => write!(f, "SMTP authentication error: {e}"),
            Error::UnparseableReply => write!(f, "Unparseable SMTP reply"),
            Error::UnexpectedReply(e) => write!(f, "Unexpected reply: {e}"),
            Error::AuthenticationFailed(e) => write!(f, "Authentication failed: {e}"),
            Error::InvalidTLSName => write!(f, "Invalid TLS name provided"),
            Error::MissingCredentials => write!(f, "Missing authentication credentials"),
            Error::MissingMailFrom => write!(f, "Missing message sender"),
            Error::MissingRcptTo => write!(f, "Missing message recipients"),
            Error::UnsupportedAuthMechanism => write!(
                f,
                "The server does no support any of the available authentication methods"
            ),
            Error::Timeout => write!(f, "Connection timeout"),
            Error::MissingStartTls => write!(f, "STARTTLS extension unavailable"),
            Error::HtmlNotFound(path) => write!(f, "HTML file not found: {}", path.display()),
            Error::ImageRead { path, error } => {
                write!(f, "Failed to read image {}: {error}", path.display())
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<base64::DecodeError> for Error {
    fn from(err: base64::DecodeError) -> Self {
        Error::Base64(err)
    }
}

impl From<smtp::auth::Error> for Error {
    fn from(err: smtp::auth::Error) -> Self {
        Error::Auth(err)
    }
}
