//! The user profile singleton.

use serde::{Deserialize, Serialize};

use crate::{
    EngineError, Money, ResultEngine,
    pin::{is_valid_pin, pin_verifier},
};

pub const DEFAULT_CURRENCY: &str = "USD";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl TryFrom<&str> for Theme {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(EngineError::InvalidProfile(format!("invalid theme: {other}"))),
        }
    }
}

/// Profile of the single local user.
///
/// `pin` holds the PIN verifier, never the PIN itself.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pin: Option<String>,
    pub monthly_budget: Money,
    pub currency: String,
    pub is_setup_complete: bool,
    pub theme: Theme,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_uri: Option<String>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            name: String::new(),
            email: None,
            pin: None,
            monthly_budget: Money::ZERO,
            currency: DEFAULT_CURRENCY.to_string(),
            is_setup_complete: false,
            theme: Theme::Light,
            avatar_uri: None,
        }
    }
}

impl Profile {
    pub fn has_pin(&self) -> bool {
        self.pin.as_deref().is_some_and(|p| !p.is_empty())
    }

    /// Copy of the profile without the PIN verifier, as imported from a backup.
    #[must_use]
    pub fn without_pin(&self) -> Self {
        Self {
            pin: None,
            ..self.clone()
        }
    }
}

/// Fields to change on the profile.
///
/// `pin` is the **plaintext** PIN: when present it is validated and replaced
/// by its verifier, when absent the stored verifier is kept.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<Option<String>>,
    pub pin: Option<String>,
    pub monthly_budget: Option<Money>,
    pub currency: Option<String>,
    pub is_setup_complete: Option<bool>,
    pub theme: Option<Theme>,
    pub avatar_uri: Option<Option<String>>,
}

impl ProfileUpdate {
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn email(mut self, email: Option<String>) -> Self {
        self.email = Some(email);
        self
    }

    #[must_use]
    pub fn pin(mut self, pin: impl Into<String>) -> Self {
        self.pin = Some(pin.into());
        self
    }

    #[must_use]
    pub fn monthly_budget(mut self, budget: Money) -> Self {
        self.monthly_budget = Some(budget);
        self
    }

    #[must_use]
    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    #[must_use]
    pub fn setup_complete(mut self, complete: bool) -> Self {
        self.is_setup_complete = Some(complete);
        self
    }

    #[must_use]
    pub fn theme(mut self, theme: Theme) -> Self {
        self.theme = Some(theme);
        self
    }

    #[must_use]
    pub fn avatar_uri(mut self, uri: Option<String>) -> Self {
        self.avatar_uri = Some(uri);
        self
    }

    /// Validates the update and merges it into a copy of `current`.
    pub(crate) fn apply_to(&self, current: &Profile) -> ResultEngine<Profile> {
        let mut out = current.clone();

        if let Some(name) = &self.name {
            out.name = name.trim().to_string();
        }
        if let Some(email) = &self.email {
            out.email = email
                .as_deref()
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(ToString::to_string);
        }
        if let Some(budget) = self.monthly_budget {
            if budget.is_negative() {
                return Err(EngineError::InvalidProfile(
                    "monthly budget must be >= 0".to_string(),
                ));
            }
            out.monthly_budget = budget;
        }
        if let Some(currency) = &self.currency {
            out.currency = normalize_currency(currency)?;
        }
        if let Some(complete) = self.is_setup_complete {
            out.is_setup_complete = complete;
        }
        if let Some(theme) = self.theme {
            out.theme = theme;
        }
        if let Some(uri) = &self.avatar_uri {
            out.avatar_uri = uri.clone();
        }
        if let Some(pin) = &self.pin {
            if !is_valid_pin(pin) {
                return Err(EngineError::InvalidProfile(
                    "PIN must be 4 to 8 digits".to_string(),
                ));
            }
            out.pin = Some(pin_verifier(pin));
        }

        Ok(out)
    }
}

fn normalize_currency(value: &str) -> ResultEngine<String> {
    let code = value.trim().to_ascii_uppercase();
    if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_uppercase()) {
        return Err(EngineError::InvalidProfile(format!(
            "invalid currency code: {value}"
        )));
    }
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_keeps_verifier_without_new_pin() {
        let current = ProfileUpdate::default()
            .pin("1234")
            .apply_to(&Profile::default())
            .unwrap();
        assert_eq!(current.pin.as_deref(), Some("170842"));

        let updated = ProfileUpdate::default()
            .name("Ada")
            .apply_to(&current)
            .unwrap();
        assert_eq!(updated.name, "Ada");
        assert_eq!(updated.pin.as_deref(), Some("170842"));
    }

    #[test]
    fn update_validates_fields() {
        let base = Profile::default();
        assert!(
            ProfileUpdate::default()
                .monthly_budget(Money::new(-1))
                .apply_to(&base)
                .is_err()
        );
        assert!(ProfileUpdate::default().currency("EURO").apply_to(&base).is_err());
        assert!(ProfileUpdate::default().pin("12").apply_to(&base).is_err());

        let updated = ProfileUpdate::default().currency(" eur ").apply_to(&base).unwrap();
        assert_eq!(updated.currency, "EUR");
    }

    #[test]
    fn parses_legacy_profile() {
        let raw = r#"{
            "name": "Ada",
            "email": "",
            "pin": "170842",
            "monthlyBudget": 1500,
            "currency": "INR",
            "isSetupComplete": true,
            "theme": "dark"
        }"#;
        let profile: Profile = serde_json::from_str(raw).unwrap();
        assert_eq!(profile.monthly_budget, Money::new(150_000));
        assert_eq!(profile.theme, Theme::Dark);
        assert!(profile.has_pin());
        assert!(!profile.without_pin().has_pin());

        let minimal: Profile = serde_json::from_str("{}").unwrap();
        assert_eq!(minimal, Profile::default());
    }
}
