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

//! Console status lines.

use std::{io::Write, path::Path};

use crate::{
    config::{PASSWORD_KEY, USER_KEY},
    Error, HtmlEmail,
};

pub const CHECK: &str = "✓";
pub const CROSS: &str = "✗";

pub const APP_PASSWORD_HINT: &str =
    "Make sure you're using an App Password, not your regular Gmail password.";
pub const APP_PASSWORD_URL: &str = "https://myaccount.google.com/apppasswords";

pub fn embedded_image(out: &mut impl Write, filename: &str) -> std::io::Result<()> {
    writeln!(out, "  {CHECK} Embedded image: {filename}")
}

pub fn sent(out: &mut impl Write, email: &HtmlEmail, html_file: &Path) -> std::io::Result<()> {
    writeln!(out, "{CHECK} Email sent successfully!")?;
    writeln!(out, "  From: {}", email.from)?;
    writeln!(out, "  To: {}", email.to)?;
    writeln!(out, "  Subject: {}", email.subject)?;
    writeln!(out, "  HTML file: {}", html_file.display())?;
    if !email.images.is_empty() {
        writeln!(out, "  Images embedded: {}", email.images.len())?;
    }
    Ok(())
}

/// Failures raised before the relay is contacted.
pub fn setup_failure(out: &mut impl Write, err: &Error) -> std::io::Result<()> {
    match err {
        Error::MissingCredentials => {
            writeln!(out, "{CROSS} Error: Gmail credentials not configured")?;
            writeln!(out)?;
            writeln!(out, "Please create a .env file in the scripts/ directory with:")?;
            writeln!(out, "{USER_KEY}=your-email@gmail.com")?;
            writeln!(out, "{PASSWORD_KEY}=your-app-password")?;
            writeln!(out)?;
            writeln!(out, "To get an App Password:")?;
            writeln!(out, "1. Go to https://myaccount.google.com/security")?;
            writeln!(out, "2. Enable 2-Step Verification if not already enabled")?;
            writeln!(out, "3. Search for 'App passwords' and create one for 'Mail'")
        }
        err => writeln!(out, "{CROSS} Error: {err}"),
    }
}

/// Failures raised while talking to the relay.
pub fn send_failure(out: &mut impl Write, err: &Error) -> std::io::Result<()> {
    match err {
        Error::AuthenticationFailed(_) => {
            writeln!(out, "{CROSS} Authentication failed!")?;
            writeln!(out)?;
            writeln!(out, "{APP_PASSWORD_HINT}")?;
            writeln!(out, "Get one at: {APP_PASSWORD_URL}")
        }
        err => writeln!(out, "{CROSS} Failed to send email: {err}"),
    }
}
