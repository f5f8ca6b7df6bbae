//! Branding and content configuration published by the hosting application.
//!
//! Only [Content::wallet_url] and [Content::onboarding_url] influence a login session; the rest
//! is carried so that a single deserialized theme can be handed to every consumer.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Theme {
    pub branding: Branding,
    pub content: Content,
    pub i18n: I18n,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Branding {
    pub name: String,
    pub primary_color: String,
    pub primary_contrast_color: String,
    pub secondary_color: String,
    pub secondary_contrast_color: String,
    pub logo_url: Option<String>,
    pub favicon_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Content {
    pub links: Vec<Link>,
    pub footer: Option<String>,
    pub onboarding_url: Option<String>,
    pub support_url: Option<String>,
    /// Base URL of the web wallet used for cross-device logins.
    pub wallet_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Link {
    pub label: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct I18n {
    pub default_lang: String,
    pub available: Vec<String>,
}

impl Default for I18n {
    fn default() -> Self {
        Self {
            default_lang: "en".to_owned(),
            available: vec!["en".to_owned()],
        }
    }
}

impl Theme {
    /// The configured wallet base URL, treating an empty string as absent.
    pub fn wallet_url(&self) -> Option<&str> {
        non_empty(self.content.wallet_url.as_deref())
    }

    /// The configured onboarding URL, treating an empty string as absent.
    pub fn onboarding_url(&self) -> Option<&str> {
        non_empty(self.content.onboarding_url.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
