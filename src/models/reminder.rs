use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// How often a reminder repeats
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Minutely,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    pub const ALL: [Frequency; 6] = [
        Frequency::Minutely,
        Frequency::Hourly,
        Frequency::Daily,
        Frequency::Weekly,
        Frequency::Monthly,
        Frequency::Yearly,
    ];

    /// Tag used in storage and push payloads
    pub fn as_tag(&self) -> &'static str {
        match self {
            Frequency::Minutely => "minutely",
            Frequency::Hourly => "hourly",
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Yearly => "yearly",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "minutely" => Some(Frequency::Minutely),
            "hourly" => Some(Frequency::Hourly),
            "daily" => Some(Frequency::Daily),
            "weekly" => Some(Frequency::Weekly),
            "monthly" => Some(Frequency::Monthly),
            "yearly" => Some(Frequency::Yearly),
            _ => None,
        }
    }

    /// Lenient parse for stored values; anything unknown repeats daily.
    pub fn from_tag_or_daily(tag: &str) -> Self {
        Self::from_tag(tag).unwrap_or_else(|| {
            tracing::warn!("Unknown reminder frequency '{}', falling back to daily", tag);
            Frequency::Daily
        })
    }
}

/// A recurring payment reminder owned by one user
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Reminder {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    /// Optional amount in Toman
    pub amount: Option<i64>,
    pub frequency: Frequency,
    pub next_due_date: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Request payload for creating a reminder
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "title": "قسط وام",
    "amount": 3500000,
    "frequency": "monthly",
    "next_due_date": "2024-02-01T06:30:00Z"
}))]
pub struct CreateReminderRequest {
    #[validate(length(
        min = 1,
        max = 200,
        message = "Title must be between 1 and 200 characters"
    ))]
    pub title: String,

    #[validate(range(min = 0, message = "Amount must not be negative"))]
    pub amount: Option<i64>,

    pub frequency: Frequency,

    pub next_due_date: DateTime<Utc>,
}

impl CreateReminderRequest {
    /// Strips surrounding whitespace so length checks see the stored value
    pub fn trimmed(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self
    }
}
