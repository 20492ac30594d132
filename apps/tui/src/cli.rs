use clap::{CommandFactory, Parser};

#[derive(Debug, Parser)]
#[command(name = "guardwatch", version, about = "Security telemetry dashboard")]
pub struct CliArgs {
    /// Print a one-shot report and exit
    #[arg(long)]
    pub headless: bool,

    /// Print the headless report as JSON
    #[arg(long)]
    pub json: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Override the API base URL
    #[arg(long = "base-url", value_name = "URL")]
    pub base_url: Option<String>,

    /// Session cookie sent with every request
    #[arg(long = "session-cookie", value_name = "COOKIE")]
    pub session_cookie: Option<String>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Account filter applied at startup
    #[arg(long, value_name = "ID")]
    pub account: Option<String>,

    /// Override the log file path
    #[arg(long = "log-file", value_name = "PATH")]
    pub log_file: Option<String>,
}

impl CliArgs {
    /// Flags win over `.env` and the environment, so they are written back
    /// into the environment before configuration is read.
    pub fn apply_env_overrides(&self) {
        for (key, value) in self.env_overrides() {
            std::env::set_var(key, value);
        }
    }

    pub fn env_overrides(&self) -> Vec<(&'static str, String)> {
        let mut overrides = Vec::new();
        if let Some(url) = &self.base_url {
            overrides.push(("GUARDWATCH_BASE_URL", url.clone()));
        }
        if let Some(cookie) = &self.session_cookie {
            overrides.push(("GUARDWATCH_SESSION_COOKIE", cookie.clone()));
        }
        if let Some(secs) = self.timeout {
            overrides.push(("GUARDWATCH_TIMEOUT_SECS", secs.to_string()));
        }
        if let Some(account) = &self.account {
            overrides.push(("GUARDWATCH_ACCOUNT", account.clone()));
        }
        if let Some(path) = &self.log_file {
            overrides.push(("GUARDWATCH_LOG", path.clone()));
        }
        if self.debug {
            overrides.push(("DEBUG", "1".to_string()));
        }
        overrides
    }

    pub fn help_text() -> String {
        let mut command = Self::command();
        let mut buffer = Vec::new();
        command.write_help(&mut buffer).ok();
        String::from_utf8_lossy(&buffer).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_map_to_environment_keys() -> Result<(), clap::Error> {
        let args = CliArgs::try_parse_from([
            "guardwatch",
            "--base-url",
            "https://monkey.example/api/1",
            "--timeout",
            "5",
            "--account",
            "prod",
            "--debug",
        ])?;

        assert_eq!(
            args.env_overrides(),
            vec![
                ("GUARDWATCH_BASE_URL", "https://monkey.example/api/1".to_string()),
                ("GUARDWATCH_TIMEOUT_SECS", "5".to_string()),
                ("GUARDWATCH_ACCOUNT", "prod".to_string()),
                ("DEBUG", "1".to_string()),
            ]
        );
        Ok(())
    }

    #[test]
    fn no_flags_means_no_overrides() -> Result<(), clap::Error> {
        let args = CliArgs::try_parse_from(["guardwatch", "--headless", "--json"])?;
        assert!(args.headless && args.json);
        assert!(args.env_overrides().is_empty());
        Ok(())
    }

    #[test]
    fn help_mentions_headless_mode() {
        assert!(CliArgs::help_text().contains("--headless"));
    }
}
