//! Interview model
//!
//! A scheduled KoL interview bundled with a premium package, or booked
//! separately. At most one interview exists per article (upsert by article
//! id), which is what makes webhook redelivery harmless.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::PaymentStatus;

/// Interview entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interview {
    /// Unique identifier
    pub id: i64,
    /// Owning article
    pub article_id: i64,
    /// Scheduled start time (UTC)
    pub scheduled_time: DateTime<Utc>,
    /// Interview length in minutes
    pub duration_minutes: i32,
    /// Payment outcome, mirrors the owning article's outcome
    pub payment_status: PaymentStatus,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Input for creating or upserting an interview
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInterviewInput {
    pub article_id: i64,
    pub scheduled_time: DateTime<Utc>,
    pub duration_minutes: i32,
    #[serde(default)]
    pub payment_status: PaymentStatus,
}

/// Schedule for an interview created together with its article
///
/// The article id is not known yet at intake time; the repository fills it
/// in inside the same transaction as the article insert.
#[derive(Debug, Clone, Copy)]
pub struct InterviewSeed {
    pub scheduled_time: DateTime<Utc>,
    pub duration_minutes: i32,
}
