//! Cisco IOS device profile.
//!
//! Prompt vocabulary for IOS-style CLIs:
//!
//! ```text
//! Router>            user EXEC
//! Router#            privileged EXEC
//! Router(config)#    configuration mode
//! ```
//!
//! Login presents `Password:`; telnet-style logins ask `Username:` first.
//! A first-time SSH connection may interject the host-key confirmation
//! question, answered with `yes`.

use std::time::Duration;

use super::DeviceProfile;
use crate::channel::Pattern;

/// Create the Cisco IOS profile.
pub fn profile() -> DeviceProfile {
    DeviceProfile::new("cisco_ios")
        .with_host_key_prompt(
            Pattern::literal("Are you sure you want to continue connecting"),
            "yes",
        )
        .with_username_prompt(Pattern::literal("Username:"))
        .with_login_secret_prompt(Pattern::literal("Password:"))
        .with_prompts(Pattern::literal(">"), Pattern::literal("#"))
        .with_escalation("enable", Pattern::literal("Password:"))
        .with_config_mode("configure terminal", "end")
        .with_save_command("write memory")
        .with_logout_command("exit")
        .with_on_open_command("terminal length 0")
        .with_failure_pattern("% Invalid input")
        .with_failure_pattern("% Incomplete command")
        .with_failure_pattern("% Ambiguous command")
        .with_failure_pattern("% Access denied")
        .with_timeout(Duration::from_secs(20))
}
