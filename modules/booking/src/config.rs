use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::contract::NewAccount;
use crate::domain::service::ServiceConfig;

/// Configuration for the booking module (`modules.booking` in the app config).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BookingConfig {
    #[serde(default = "default_page_size")]
    pub default_page_size: u64,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u64,
    #[serde(default = "default_session_ttl", with = "humantime_serde")]
    pub session_ttl: Duration,
    #[serde(default = "default_max_name_length")]
    pub max_name_length: usize,
    #[serde(default = "default_min_password_length")]
    pub min_password_length: usize,
    #[serde(default = "default_consultation_fee")]
    pub default_consultation_fee: i64,
    #[serde(default = "default_address")]
    pub default_address: String,
    #[serde(default = "default_image_url")]
    pub default_image_url: String,
    /// Admin account created at startup if its email is not registered yet.
    #[serde(default)]
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BootstrapAdmin {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            session_ttl: default_session_ttl(),
            max_name_length: default_max_name_length(),
            min_password_length: default_min_password_length(),
            default_consultation_fee: default_consultation_fee(),
            default_address: default_address(),
            default_image_url: default_image_url(),
            bootstrap_admin: None,
        }
    }
}

impl BookingConfig {
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            max_name_length: self.max_name_length,
            min_password_length: self.min_password_length,
            default_page_size: self.default_page_size,
            max_page_size: self.max_page_size.max(1),
            session_ttl: self.session_ttl,
            default_consultation_fee: self.default_consultation_fee,
            default_address: self.default_address.clone(),
            default_image_url: self.default_image_url.clone(),
        }
    }
}

impl From<BootstrapAdmin> for NewAccount {
    fn from(a: BootstrapAdmin) -> Self {
        Self {
            name: a.name,
            email: a.email,
            password: a.password,
            phone: None,
        }
    }
}

fn default_page_size() -> u64 {
    20
}

fn default_max_page_size() -> u64 {
    100
}

fn default_session_ttl() -> Duration {
    Duration::from_secs(24 * 60 * 60)
}

fn default_max_name_length() -> usize {
    100
}

fn default_min_password_length() -> usize {
    6
}

fn default_consultation_fee() -> i64 {
    500
}

fn default_address() -> String {
    "MedConnect Medical Center, New Delhi".to_string()
}

fn default_image_url() -> String {
    "/images/doctor.jpg".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_section_uses_defaults() {
        let cfg: BookingConfig = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(cfg.default_page_size, 20);
        assert_eq!(cfg.max_page_size, 100);
        assert_eq!(cfg.session_ttl, Duration::from_secs(86_400));
        assert!(cfg.bootstrap_admin.is_none());
    }

    #[test]
    fn durations_are_human_readable() {
        let cfg: BookingConfig = serde_json::from_value(serde_json::json!({
            "session_ttl": "30m",
            "bootstrap_admin": {"name": "Root", "email": "root@medbook.dev", "password": "changeme"}
        }))
        .unwrap();
        assert_eq!(cfg.session_ttl, Duration::from_secs(30 * 60));
        assert_eq!(cfg.bootstrap_admin.unwrap().email, "root@medbook.dev");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let res: Result<BookingConfig, _> =
            serde_json::from_value(serde_json::json!({"page_size": 10}));
        assert!(res.is_err());
    }
}
