use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;
use utoipa::ToSchema;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Badge colour shared by both tier ladders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BadgeTone {
    Green,
    Yellow,
    Red,
}

impl BadgeTone {
    pub fn background_class(self) -> String {
        format!("bg-{}-500", self)
    }

    pub fn text_class(self) -> String {
        format!("text-{}-50", self)
    }
}

/// Stock level: above 50 is high, above 20 medium, anything else low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum QuantityTier {
    High,
    Medium,
    Low,
}

impl QuantityTier {
    pub fn classify(quantity: i32) -> Self {
        if quantity > 50 {
            QuantityTier::High
        } else if quantity > 20 {
            QuantityTier::Medium
        } else {
            QuantityTier::Low
        }
    }

    pub fn tone(self) -> BadgeTone {
        match self {
            QuantityTier::High => BadgeTone::Green,
            QuantityTier::Medium => BadgeTone::Yellow,
            QuantityTier::Low => BadgeTone::Red,
        }
    }
}

/// Time left before expiry: 30 days or less is urgent, 60 or less a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ExpiryTier {
    Safe,
    Warning,
    Urgent,
}

impl ExpiryTier {
    pub fn classify(days_until_expiry: f64) -> Self {
        if days_until_expiry <= 30.0 {
            ExpiryTier::Urgent
        } else if days_until_expiry <= 60.0 {
            ExpiryTier::Warning
        } else {
            ExpiryTier::Safe
        }
    }

    pub fn tone(self) -> BadgeTone {
        match self {
            ExpiryTier::Safe => BadgeTone::Green,
            ExpiryTier::Warning => BadgeTone::Yellow,
            ExpiryTier::Urgent => BadgeTone::Red,
        }
    }
}

/// Fractional days from `now` until `expiry`; negative once expired.
pub fn days_until(expiry: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (expiry - now).num_milliseconds() as f64 / MILLIS_PER_DAY
}
