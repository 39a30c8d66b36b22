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

use std::{io::Write, path::PathBuf, process::ExitCode};

use clap::Parser;
use html_mail_send::{config, report, Config, HtmlEmail, Relay};

/// Send an HTML file as an e-mail through Gmail, embedding its local images.
#[derive(Parser, Debug)]
#[command(
    name = "html-mail-send",
    version,
    after_help = "Example: html-mail-send user@example.com \"Test Email\" site/index.html"
)]
struct Cli {
    /// Recipient address
    recipient: String,

    /// Subject line
    subject: String,

    /// HTML file to send
    html_file: PathBuf,

    /// Credentials file [default: scripts/.env next to the executable]
    #[arg(long, value_name = "PATH")]
    env_file: Option<PathBuf>,

    /// Log SMTP session details
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            // Usage errors exit with 1, --help and --version with 0
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(
        if cli.verbose {
            "html_mail_send=debug"
        } else {
            "warn"
        },
    ))
    .init();

    let mut stdout = std::io::stdout();
    let status = run(cli, &Relay::gmail(), &mut stdout).await;
    let _ = stdout.flush();
    status
}

async fn run(cli: Cli, relay: &Relay, out: &mut impl Write) -> ExitCode {
    let env_file = cli.env_file.unwrap_or_else(config::default_env_file);
    let config = match Config::load(&env_file) {
        Ok(config) => config,
        Err(err) => {
            let _ = report::setup_failure(out, &err);
            return ExitCode::FAILURE;
        }
    };

    let email = match HtmlEmail::from_file(&cli.html_file) {
        Ok(email) => email
            .from(config.user.as_str())
            .to(cli.recipient)
            .subject(cli.subject),
        Err(err) => {
            let _ = report::setup_failure(out, &err);
            return ExitCode::FAILURE;
        }
    };
    for image in &email.images {
        let _ = report::embedded_image(out, &image.filename);
    }

    match relay.deliver(&config.credentials(), &email).await {
        Ok(()) => {
            let _ = report::sent(out, &email, &cli.html_file);
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::debug!("Delivery failed: {err:?}");
            let _ = report::send_failure(out, &err);
            ExitCode::FAILURE
        }
    }
}
