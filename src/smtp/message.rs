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

use std::borrow::Cow;

use tokio::io::{AsyncRead, AsyncWrite};

use crate::SmtpClient;

/// A message ready for submission: envelope plus raw RFC 5322 bytes.
#[derive(Debug, Default, Clone)]
pub struct Message<'x> {
    pub mail_from: Cow<'x, str>,
    pub rcpt_to: Vec<Cow<'x, str>>,
    pub body: Cow<'x, [u8]>,
}

impl<T: AsyncRead + AsyncWrite + Unpin> SmtpClient<T> {
    /// Sends a message to the server.
    pub async fn send<'x>(&mut self, message: impl IntoMessage<'x>) -> crate::Result<()> {
        // Send mail-from
        let message = message.into_message()?;
        self.mail_from(message.mail_from.as_ref()).await?;

        // Send rcpt-to
        for rcpt in &message.rcpt_to {
            self.rcpt_to(rcpt.as_ref()).await?;
        }

        // Send message
        self.data(message.body.as_ref()).await
    }
}

impl<'x> Message<'x> {
    /// Create a new message
    pub fn new<T, U, V>(from: T, to: U, body: V) -> Self
    where
        T: Into<Cow<'x, str>>,
        U: IntoIterator<Item = T>,
        V: Into<Cow<'x, [u8]>>,
    {
        Message {
            mail_from: from.into(),
            rcpt_to: to.into_iter().map(Into::into).collect(),
            body: body.into(),
        }
    }
}

pub trait IntoMessage<'x> {
    fn into_message(self) -> crate::Result<Message<'x>>;
}

impl<'x> IntoMessage<'x> for Message<'x> {
    fn into_message(self) -> crate::Result<Message<'x>> {
        if self.mail_from.trim().is_empty() {
            Err(crate::Error::MissingMailFrom)
        } else if self.rcpt_to.iter().all(|rcpt| rcpt.trim().is_empty()) {
            Err(crate::Error::MissingRcptTo)
        } else {
            Ok(self)
        }
    }
}

#[cfg(test)]
mod test {
    use crate::smtp::message::{IntoMessage, Message};

    const BODY: &[u8] = b"Subject: hi\r\n\r\nhi";

    #[test]
    fn envelope_validation() {
        assert!(matches!(
            Message::new("", ["jane@example.com"], BODY).into_message(),
            Err(crate::Error::MissingMailFrom)
        ));
        assert!(matches!(
            Message::new("john@example.com", Vec::<&str>::new(), BODY).into_message(),
            Err(crate::Error::MissingRcptTo)
        ));
        assert!(matches!(
            Message::new("john@example.com", [" "], BODY).into_message(),
            Err(crate::Error::MissingRcptTo)
        ));

        let message = Message::new(
            "john@example.com",
            ["jane@example.com", "james@example.com"],
            BODY,
        )
        .into_message()
        .unwrap();
        assert_eq!(message.mail_from, "john@example.com");
        assert_eq!(message.rcpt_to.len(), 2);
    }
}
