use crate::types::TeacherDetail;

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read credentials file: {0}")]
    Read(#[from] std::io::Error),
    #[error("credentials file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("credentials file has no users configured")]
    NoUsers,
    #[error("user entry {index} has an empty `{field}`")]
    EmptyUserField { index: usize, field: &'static str },
    #[error("`{0}` must be set in the credentials file")]
    EmptyUrl(&'static str),
}

/// One portal account. The section label doubles as the session tag stamped
/// into every record scraped under this login.
#[derive(Debug, Clone, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub password: String,
    pub section_label: String,
}

/// Credentials file: ordered user list plus the two portal URLs. The first
/// user is the primary (full schedule), the second, if any, contributes
/// lab courses only.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub users: Vec<UserProfile>,
    pub login_url: String,
    pub attendance_dashboard_url: String,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(raw)?;
        config.validate()
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.users.is_empty() {
            return Err(ConfigError::NoUsers);
        }
        for (index, user) in self.users.iter().enumerate() {
            let blank = [
                ("id", &user.id),
                ("username", &user.username),
                ("password", &user.password),
                ("section_label", &user.section_label),
            ]
            .into_iter()
            .find(|(_, value)| value.trim().is_empty());
            if let Some((field, _)) = blank {
                return Err(ConfigError::EmptyUserField { index, field });
            }
        }
        if self.login_url.trim().is_empty() {
            return Err(ConfigError::EmptyUrl("login_url"));
        }
        if self.attendance_dashboard_url.trim().is_empty() {
            return Err(ConfigError::EmptyUrl("attendance_dashboard_url"));
        }
        Ok(self)
    }

    pub fn primary_tag(&self) -> &str {
        &self.users[0].section_label
    }

    pub fn secondary_tag(&self) -> Option<&str> {
        self.users.get(1).map(|u| u.section_label.as_str())
    }
}

/// Loads the teacher contact lookup. Best-effort: a missing or malformed
/// file is a warning, not a failure — the routine then falls back to raw
/// initials with empty phone and email.
pub fn load_teacher_details(path: &Path) -> HashMap<String, TeacherDetail> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            log::warn!(
                "could not read teacher details file {}: {e}; teacher names, phones and emails will be missing",
                path.display()
            );
            return HashMap::new();
        }
    };
    match serde_json::from_str::<HashMap<String, TeacherDetail>>(&raw) {
        Ok(details) => {
            log::info!("loaded {} teacher entries from {}", details.len(), path.display());
            details
        }
        Err(e) => {
            log::warn!("teacher details file {} is not valid JSON: {e}", path.display());
            HashMap::new()
        }
    }
}
