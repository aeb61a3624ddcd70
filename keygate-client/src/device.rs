//! Device identity for license binding.
//!
//! The device id is a stable hash over machine identifiers: it survives
//! reboots and app reinstalls but changes when the hardware identity does.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::env;

/// Identifies this device to the authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    /// Stable device identifier sent with every activation.
    pub id: String,
    /// Free-text device description for the admin's device list.
    pub info: String,
}

impl DeviceIdentity {
    /// Creates an identity from explicit values (embedders, tests).
    #[must_use]
    pub fn new(id: impl Into<String>, info: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            info: info.into(),
        }
    }

    /// Detects the current device's identity.
    #[must_use]
    pub fn detect() -> Self {
        let host = hostname();
        let mut hasher = Sha256::new();
        hasher.update(env::consts::OS.as_bytes());
        hasher.update(b"|");
        hasher.update(env::consts::ARCH.as_bytes());
        hasher.update(b"|");
        hasher.update(host.as_bytes());
        if let Some(machine_id) = machine_id() {
            hasher.update(b"|");
            hasher.update(machine_id.as_bytes());
        }
        let hash = hasher.finalize();
        let id = URL_SAFE_NO_PAD.encode(&hash[..16]);

        Self {
            id,
            info: format!("{host} ({}/{})", env::consts::OS, env::consts::ARCH),
        }
    }
}

fn hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Platform machine id, when one exists.
fn machine_id() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/etc/machine-id")
            .or_else(|_| std::fs::read_to_string("/var/lib/dbus/machine-id"))
            .ok()
            .map(|s| s.trim().to_string())
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("ioreg")
            .args(["-rd1", "-c", "IOPlatformExpertDevice"])
            .output()
            .ok()
            .and_then(|o| String::from_utf8(o.stdout).ok())
            .and_then(|output| {
                output
                    .lines()
                    .find(|l| l.contains("IOPlatformUUID"))
                    .and_then(|l| l.split('"').nth(3))
                    .map(String::from)
            })
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    {
        None
    }
}
