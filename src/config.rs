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

//! Relay credentials, read from a `KEY=value` file with the process
//! environment as fallback.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use crate::Credentials;

/// Key holding the sender account.
pub const USER_KEY: &str = "GMAIL_USER";
/// Key holding the app-specific password.
pub const PASSWORD_KEY: &str = "GMAIL_APP_PASSWORD";
/// Location of the credentials file, relative to the program.
pub const ENV_FILE: &str = "scripts/.env";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub user: String,
    pub app_password: String,
}

impl Config {
    /// Picks each credential from the file mapping, falling back to `env`.
    /// Empty values count as missing.
    pub fn resolve<F>(file: &HashMap<String, String>, env: F) -> crate::Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| {
            file.get(key)
                .filter(|value| !value.is_empty())
                .cloned()
                .or_else(|| env(key).filter(|value| !value.is_empty()))
        };

        match (lookup(USER_KEY), lookup(PASSWORD_KEY)) {
            (Some(user), Some(app_password)) => Ok(Config { user, app_password }),
            _ => Err(crate::Error::MissingCredentials),
        }
    }

    /// Reads `path` (if present) and resolves against the process environment.
    pub fn load(path: &Path) -> crate::Result<Config> {
        let file = read_env_file(path)?;
        Config::resolve(&file, |key| std::env::var(key).ok())
    }

    pub fn credentials(&self) -> Credentials<String> {
        Credentials::new(self.user.clone(), self.app_password.clone())
    }
}

/// Parses `KEY=value` lines. Blank lines, `#` comments and lines without
/// a `=` are skipped; the first `=` separates key from value.
pub fn parse_env_file(contents: &str) -> HashMap<String, String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let (key, value) = line.split_once('=')?;
            Some((key.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Reads and parses an env file. A missing file yields an empty mapping.
pub fn read_env_file(path: &Path) -> crate::Result<HashMap<String, String>> {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            log::debug!("Loaded settings from {}", path.display());
            Ok(parse_env_file(&contents))
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            log::debug!("No settings file at {}", path.display());
            Ok(HashMap::new())
        }
        Err(err) => Err(err.into()),
    }
}

/// `scripts/.env` next to the running executable, or under the current
/// directory when the former does not exist.
pub fn default_env_file() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(ENV_FILE)))
        .filter(|path| path.is_file())
        .unwrap_or_else(|| PathBuf::from(ENV_FILE))
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use super::{parse_env_file, read_env_file, Config, PASSWORD_KEY, USER_KEY};

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn parse_lines() {
        let vars = parse_env_file(concat!(
            "# Gmail settings\n",
            "\n",
            "GMAIL_USER = john@gmail.com\n",
            "  # indented comment\n",
            "GMAIL_APP_PASSWORD=abcd=efgh==\n",
            "NOT A PAIR\n",
            "EMPTY=\n",
        ));

        assert_eq!(vars.len(), 3);
        assert_eq!(vars[USER_KEY], "john@gmail.com");
        assert_eq!(vars[PASSWORD_KEY], "abcd=efgh==");
        assert_eq!(vars["EMPTY"], "");
    }

    #[test]
    fn file_takes_precedence() {
        let file = parse_env_file("GMAIL_USER=file@gmail.com\nGMAIL_APP_PASSWORD=secret\n");
        let config = Config::resolve(&file, |key| Some(format!("env-{key}"))).unwrap();
        assert_eq!(
            config,
            Config {
                user: "file@gmail.com".to_string(),
                app_password: "secret".to_string(),
            }
        );
    }

    #[test]
    fn environment_fallback() {
        let file = parse_env_file("GMAIL_USER=file@gmail.com\nGMAIL_APP_PASSWORD=\n");
        let config = Config::resolve(&file, |key| {
            (key == PASSWORD_KEY).then(|| "from-env".to_string())
        })
        .unwrap();
        assert_eq!(config.user, "file@gmail.com");
        assert_eq!(config.app_password, "from-env");
        assert_eq!(config.credentials().username(), "file@gmail.com");
    }

    #[test]
    fn missing_credentials() {
        assert!(matches!(
            Config::resolve(&HashMap::new(), no_env),
            Err(crate::Error::MissingCredentials)
        ));
        let file = parse_env_file("GMAIL_USER=john@gmail.com\n");
        assert!(matches!(
            Config::resolve(&file, no_env),
            Err(crate::Error::MissingCredentials)
        ));
        assert!(matches!(
            Config::resolve(&HashMap::new(), |_| Some(String::new())),
            Err(crate::Error::MissingCredentials)
        ));
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_env_file(&dir.path().join(".env")).unwrap().is_empty());

        let path = dir.path().join(".env");
        std::fs::write(&path, "GMAIL_USER=john@gmail.com\n").unwrap();
        assert_eq!(read_env_file(&path).unwrap()[USER_KEY], "john@gmail.com");
    }
}
