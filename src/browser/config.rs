use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for one browser automation session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Whether to run the browser in headless mode (default: true)
    pub headless: bool,

    /// Viewport width; together with height this stands in for a maximized window
    pub window_width: u32,

    /// Viewport height
    pub window_height: u32,

    /// Suppress notification prompts and popup blocking (default: true)
    pub disable_notifications: bool,

    /// User agent string sent with every request
    pub user_agent: String,

    /// Extra Chrome command-line flags
    pub extra_args: Vec<String>,

    /// Upper bound for starting the browser process, in seconds (default: 30)
    pub launch_timeout_secs: u64,

    /// Upper bound for a single navigation, in seconds (default: 60)
    pub navigation_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1920,
            window_height: 1080,
            disable_notifications: true,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/98.0.4758.102 Safari/537.36"
                .to_string(),
            extra_args: Vec::new(),
            launch_timeout_secs: 30,
            navigation_timeout_secs: 60,
        }
    }
}

impl SessionConfig {
    pub fn launch_timeout(&self) -> Duration {
        Duration::from_secs(self.launch_timeout_secs)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    /// Chrome flags derived from this configuration, in launch order.
    pub fn launch_args(&self) -> Vec<String> {
        let mut args = vec![
            "--no-sandbox".to_string(),
            "--disable-gpu".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--log-level=3".to_string(),
            "--start-maximized".to_string(),
        ];

        if self.disable_notifications {
            args.push("--disable-notifications".to_string());
            args.push("--disable-popup-blocking".to_string());
        }

        args.push(format!("--user-agent={}", self.user_agent));
        args.extend(self.extra_args.iter().cloned());
        args
    }
}
