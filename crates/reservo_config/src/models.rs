// --- File: crates/reservo_config/src/models.rs ---

use serde::{Deserialize, Serialize};

// --- General Server Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Which booking flow's conflict rule the server enforces on submission.
///
/// The guest wizard and the single page form historically disagree on what
/// counts as an overlap, so both stay selectable rather than being merged.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BookingFlow {
    #[default]
    Wizard,
    Form,
}

// --- Overlap windows per flow ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WizardOverlapConfig {
    #[serde(default = "default_wizard_duration")]
    pub duration_minutes: u32,
    #[serde(default = "default_wizard_buffer")]
    pub buffer_minutes: u32,
}

impl Default for WizardOverlapConfig {
    fn default() -> Self {
        Self {
            duration_minutes: default_wizard_duration(),
            buffer_minutes: default_wizard_buffer(),
        }
    }
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FormOverlapConfig {
    /// Duration with the buffer already folded in.
    #[serde(default = "default_form_window")]
    pub window_minutes: u32,
}

impl Default for FormOverlapConfig {
    fn default() -> Self {
        Self {
            window_minutes: default_form_window(),
        }
    }
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct OverlapConfig {
    #[serde(default)]
    pub wizard: WizardOverlapConfig,
    #[serde(default)]
    pub form: FormOverlapConfig,
}

// --- Booking Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BookingConfig {
    /// IANA time zone of the restaurant, e.g. "Asia/Bangkok".
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
    /// First bookable time of day (HH:MM).
    #[serde(default = "default_opening_time")]
    pub opening_time: String,
    /// Last bookable time of day (HH:MM), inclusive.
    #[serde(default = "default_last_seating_time")]
    pub last_seating_time: String,
    #[serde(default = "default_slot_interval")]
    pub slot_interval_minutes: u32,
    #[serde(default = "default_hold_ttl")]
    pub hold_ttl_seconds: u64,
    #[serde(default = "default_hold_sweep_interval")]
    pub hold_sweep_interval_seconds: u64,
    #[serde(default = "default_max_party_size")]
    pub max_party_size: u32,
    /// Parallel bookings per slot while no tables are configured.
    #[serde(default = "default_slot_capacity")]
    pub slot_capacity: u32,
    #[serde(default)]
    pub conflict_flow: BookingFlow,
    #[serde(default)]
    pub overlap: OverlapConfig,
    #[serde(default = "default_booking_code_prefix")]
    pub booking_code_prefix: String,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            time_zone: default_time_zone(),
            opening_time: default_opening_time(),
            last_seating_time: default_last_seating_time(),
            slot_interval_minutes: default_slot_interval(),
            hold_ttl_seconds: default_hold_ttl(),
            hold_sweep_interval_seconds: default_hold_sweep_interval(),
            max_party_size: default_max_party_size(),
            slot_capacity: default_slot_capacity(),
            conflict_flow: BookingFlow::default(),
            overlap: OverlapConfig::default(),
            booking_code_prefix: default_booking_code_prefix(),
        }
    }
}

// --- Client Config ---
// Used by the hold negotiator when it talks to a remote server.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ClientConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    #[serde(default = "default_locale")]
    pub locale: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            poll_interval_seconds: default_poll_interval(),
            request_timeout_seconds: default_request_timeout(),
            locale: default_locale(),
        }
    }
}

// --- Logging Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// When set, logs are also written to a daily rolling file in this directory.
    #[serde(default)]
    pub directory: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: None,
        }
    }
}

// --- Unified App Configuration ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub booking: BookingConfig,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_time_zone() -> String {
    "Asia/Bangkok".to_string()
}
fn default_opening_time() -> String {
    "11:00".to_string()
}
fn default_last_seating_time() -> String {
    "21:00".to_string()
}
fn default_slot_interval() -> u32 {
    30
}
fn default_hold_ttl() -> u64 {
    300
}
fn default_hold_sweep_interval() -> u64 {
    30
}
fn default_max_party_size() -> u32 {
    20
}
fn default_slot_capacity() -> u32 {
    1
}
fn default_wizard_duration() -> u32 {
    90
}
fn default_wizard_buffer() -> u32 {
    15
}
fn default_form_window() -> u32 {
    120
}
fn default_booking_code_prefix() -> String {
    "RS".to_string()
}
fn default_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}
fn default_poll_interval() -> u64 {
    3
}
fn default_request_timeout() -> u64 {
    10
}
fn default_locale() -> String {
    "th".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
