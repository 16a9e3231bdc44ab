//! Persisted application settings.
//!
//! A single pretty-printed JSON file holding the user-editable knobs: theme,
//! locale, OCR endpoint and auth token. Values are validated before they are
//! accepted; a missing or corrupt file falls back to defaults.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use snaptex_ocr::Provider;
use snaptex_types::api::{FieldError, SettingsDto};

use crate::{ApiError, AppState};

/// SimpleTex issues fixed-length API tokens.
pub const TOKEN_LEN: usize = 30;

pub const DEFAULT_API_URL: &str = "https://server.simpletex.cn/api/latex_ocr";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    Auto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Locale {
    #[serde(rename = "en")]
    En,
    #[serde(rename = "zh-CN")]
    ZhCn,
    #[serde(rename = "auto")]
    #[default]
    Auto,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub theme: Theme,
    pub locale: Locale,
    pub api_url: String,
    pub token: String,
    /// Which recognition service to build. Single-variant today; kept in the
    /// file so a second service is a data change, not a schema change.
    #[serde(default)]
    pub provider: Provider,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            locale: Locale::default(),
            api_url: DEFAULT_API_URL.to_string(),
            token: String::new(),
            provider: Provider::default(),
        }
    }
}

impl Settings {
    pub fn to_dto(&self) -> SettingsDto {
        SettingsDto {
            theme: theme_str(self.theme).to_string(),
            locale: locale_str(self.locale).to_string(),
            api_url: self.api_url.clone(),
            token: self.token.clone(),
        }
    }
}

pub struct SettingsStore {
    path: PathBuf,
    inner: Mutex<Settings>,
}

impl SettingsStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating {}", dir.display()))?;
        }

        let settings = match load_file(&path) {
            Ok(Some(s)) => s,
            Ok(None) => Settings::default(),
            Err(e) => {
                warn!("settings file unreadable, using defaults: {e:#}");
                Settings::default()
            }
        };

        Ok(Self {
            path,
            inner: Mutex::new(settings),
        })
    }

    pub fn get(&self) -> Settings {
        self.inner.lock().unwrap().clone()
    }

    /// Validate and apply a settings update, persisting on success. Returns
    /// the first field-level failure otherwise.
    pub fn update(&self, dto: &SettingsDto) -> Result<Settings, FieldError> {
        let validated = validate(dto)?;

        let mut inner = self.inner.lock().unwrap();
        let next = Settings {
            provider: inner.provider,
            ..validated
        };
        *inner = next.clone();

        if let Err(e) = persist(&self.path, &next) {
            warn!("failed to persist settings: {e:#}");
        } else {
            info!("settings updated");
        }
        Ok(next)
    }
}

// -- Routes --

pub async fn get_settings(State(state): State<AppState>) -> Json<SettingsDto> {
    Json(state.settings.get().to_dto())
}

pub async fn put_settings(
    State(state): State<AppState>,
    Json(dto): Json<SettingsDto>,
) -> Result<Json<SettingsDto>, ApiError> {
    let settings = state
        .settings
        .update(&dto)
        .map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, Json(e)))?;
    Ok(Json(settings.to_dto()))
}

fn validate(dto: &SettingsDto) -> Result<Settings, FieldError> {
    let theme = parse_theme(&dto.theme).ok_or_else(|| FieldError {
        field: "theme",
        message: format!("unknown theme '{}'", dto.theme),
    })?;

    let locale = parse_locale(&dto.locale).ok_or_else(|| FieldError {
        field: "locale",
        message: format!("unknown locale '{}'", dto.locale),
    })?;

    let url = reqwest::Url::parse(&dto.api_url).map_err(|_| FieldError {
        field: "api_url",
        message: "not a valid URL".to_string(),
    })?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(FieldError {
            field: "api_url",
            message: "URL must be http or https".to_string(),
        });
    }

    if dto.token.chars().count() != TOKEN_LEN {
        return Err(FieldError {
            field: "token",
            message: format!("token must be exactly {TOKEN_LEN} characters"),
        });
    }

    Ok(Settings {
        theme,
        locale,
        api_url: dto.api_url.clone(),
        token: dto.token.clone(),
        provider: Provider::default(),
    })
}

fn parse_theme(s: &str) -> Option<Theme> {
    match s {
        "light" => Some(Theme::Light),
        "dark" => Some(Theme::Dark),
        "auto" => Some(Theme::Auto),
        _ => None,
    }
}

fn theme_str(theme: Theme) -> &'static str {
    match theme {
        Theme::Light => "light",
        Theme::Dark => "dark",
        Theme::Auto => "auto",
    }
}

fn parse_locale(s: &str) -> Option<Locale> {
    match s {
        "en" => Some(Locale::En),
        "zh-CN" => Some(Locale::ZhCn),
        "auto" => Some(Locale::Auto),
        _ => None,
    }
}

fn locale_str(locale: Locale) -> &'static str {
    match locale {
        Locale::En => "en",
        Locale::ZhCn => "zh-CN",
        Locale::Auto => "auto",
    }
}

fn load_file(path: &Path) -> Result<Option<Settings>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let settings = serde_json::from_str(&raw).context("parsing settings file")?;
    Ok(Some(settings))
}

fn persist(path: &Path, settings: &Settings) -> Result<()> {
    let json = serde_json::to_string_pretty(settings)?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
