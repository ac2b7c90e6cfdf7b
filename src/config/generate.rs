pub fn generate_starter_config() -> String {
    r#"# =============================================================================
# CHATRELAY CONFIGURATION
# =============================================================================
# This file configures the remote log store, the scan cadence, and the chat
# channel that new messages are relayed to.
#
# Secrets should stay out of this file: any value may use $env{VAR_NAME},
# which is expanded from the environment at startup. Startup fails if a
# referenced variable is unset.
#
# Config file locations (in order of precedence):
#   1. Path specified via --config argument
#   2. ~/.config/chatrelay/config.yml
#   3. /etc/chatrelay/config.yml

# =============================================================================
# REMOTE FILE STORE
# =============================================================================
# Where the game server publishes its log files.

remote:
  url: https://files.example.com
  username: $env{STORE_USER}
  secret: $env{STORE_SECRET}
  # Directory that is listed on every scan
  directory: /server-data/Logs/
  # A log file is selected when its name contains this substring
  # (case-insensitive) and ends with the extension below
  file_marker: chat
  file_extension: .txt
  # Per-request timeout for listing and download calls
  timeout: 30s

# =============================================================================
# SCAN CADENCE
# =============================================================================

scan:
  # How often the remote directory is scanned for new messages. Manual scans
  # can be triggered at any time via POST /scan on the control server.
  interval: 180s

# =============================================================================
# CHAT SINK
# =============================================================================
# The channel that receives relayed messages.

sink:
  url: https://chat.example.com
  token: $env{SINK_TOKEN}
  channel_id: "1236179374579912724"
  # Hard payload cap enforced by the platform
  max_payload_len: 2000
  # Working limit used when packing messages, kept under the hard cap
  payload_margin: 1900
  # Delay between consecutive message sends
  pacing: 500ms
  # Render author names in bold
  author_markup: true

# =============================================================================
# CONTROL SERVER
# =============================================================================

web:
  listen: 127.0.0.1:7140
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::expand_env_vars;
    use crate::config::types::Config;

    #[test]
    fn test_starter_config_parses() {
        std::env::set_var("STORE_USER", "u");
        std::env::set_var("STORE_SECRET", "s");
        std::env::set_var("SINK_TOKEN", "t");
        let yaml = expand_env_vars(&generate_starter_config());
        let config: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(config.remote.directory, "/server-data/Logs/");
        assert_eq!(config.scan.interval.as_secs(), 180);
        std::env::remove_var("STORE_USER");
        std::env::remove_var("STORE_SECRET");
        std::env::remove_var("SINK_TOKEN");
    }
}
