//! Article model
//!
//! This module provides:
//! - `Article` entity representing a submitted article
//! - `ArticleStatus` enum for the editorial review states
//! - `PaymentStatus` enum shared with interviews
//! - `InterviewPackage` enum with pricing and interview durations
//! - Input types for intake
//! - Pagination types for list queries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Article entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    /// Unique identifier
    pub id: i64,
    /// Article title
    pub title: String,
    /// Submitting author's name
    pub author_name: String,
    /// Agency contact email, used for all notifications
    pub agency_contact: String,
    /// Key Opinion Leader featured in the article
    pub kol_name: String,
    /// KoL credentials (e.g. "MD, PhD, Cardiology")
    pub kol_credentials: String,
    /// Free-text article body
    pub body: String,
    /// Therapeutic area (e.g. "Oncology")
    pub therapeutic_area: String,
    /// Intended audience
    pub target_audience: String,
    /// Article type (e.g. "Clinical Review")
    pub article_type: String,
    /// Hosted image URL, if an image was uploaded
    #[serde(default)]
    pub image_url: Option<String>,
    /// Purchased package tier
    pub interview_package: InterviewPackage,
    /// Editorial review status
    pub status: ArticleStatus,
    /// Payment outcome reported by the checkout provider
    pub payment_status: PaymentStatus,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Editorial review status
///
/// Every article starts in `PendingReview`. Only admin action moves it to
/// `Approved` or `Rejected`; the payment callback never touches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArticleStatus {
    /// Awaiting editorial review
    PendingReview,
    /// Approved for publication
    Approved,
    /// Rejected by staff
    Rejected,
}

impl Default for ArticleStatus {
    fn default() -> Self {
        Self::PendingReview
    }
}

impl ArticleStatus {
    /// Convert status to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleStatus::PendingReview => "pending_review",
            ArticleStatus::Approved => "approved",
            ArticleStatus::Rejected => "rejected",
        }
    }

    /// Parse status from database string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending_review" => Some(ArticleStatus::PendingReview),
            "approved" => Some(ArticleStatus::Approved),
            "rejected" => Some(ArticleStatus::Rejected),
            _ => None,
        }
    }

    /// Whether this status is a valid admin review outcome
    pub fn is_review_outcome(&self) -> bool {
        matches!(self, ArticleStatus::Approved | ArticleStatus::Rejected)
    }
}

impl std::fmt::Display for ArticleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payment outcome for articles and interviews
///
/// `Pending` until the provider reports an outcome; the webhook maps a
/// completed checkout to `Paid`, and the verify endpoint maps an unpaid or
/// expired session to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// No outcome reported yet
    Pending,
    /// Checkout completed and paid
    Paid,
    /// Session expired or reported unpaid
    Failed,
}

impl Default for PaymentStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl PaymentStatus {
    /// Convert status to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
        }
    }

    /// Parse status from database string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(PaymentStatus::Pending),
            "paid" => Some(PaymentStatus::Paid),
            "failed" => Some(PaymentStatus::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Package tier purchased with a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewPackage {
    /// Editorial review only, no interview
    Basic,
    /// Review plus a 15-minute KoL interview
    Premium,
    /// Review plus a 30-minute KoL interview
    PremiumPlus,
}

impl Default for InterviewPackage {
    fn default() -> Self {
        Self::Basic
    }
}

impl InterviewPackage {
    /// Convert package to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewPackage::Basic => "basic",
            InterviewPackage::Premium => "premium",
            InterviewPackage::PremiumPlus => "premium_plus",
        }
    }

    /// Parse package from database string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "basic" => Some(InterviewPackage::Basic),
            "premium" => Some(InterviewPackage::Premium),
            "premium_plus" => Some(InterviewPackage::PremiumPlus),
            _ => None,
        }
    }

    /// Whether this package bundles a KoL interview
    pub fn includes_interview(&self) -> bool {
        !matches!(self, InterviewPackage::Basic)
    }

    /// Interview length bundled with this package, if any
    pub fn interview_duration_minutes(&self) -> Option<i32> {
        match self {
            InterviewPackage::Basic => None,
            InterviewPackage::Premium => Some(15),
            InterviewPackage::PremiumPlus => Some(30),
        }
    }

    /// Get pricing for this package
    ///
    /// Amounts are authoritative here; checkout sessions are priced from
    /// this table, never from client input.
    pub fn pricing(&self) -> PackagePricing {
        match self {
            InterviewPackage::Basic => PackagePricing {
                name: "Basic Package",
                description: "Article review and editorial feedback",
                cents: 9900,
            },
            InterviewPackage::Premium => PackagePricing {
                name: "Premium Package",
                description: "Article review plus a 15-minute KoL interview",
                cents: 24900,
            },
            InterviewPackage::PremiumPlus => PackagePricing {
                name: "Premium Plus Package",
                description: "Article review plus a 30-minute KoL interview",
                cents: 39900,
            },
        }
    }
}

impl std::fmt::Display for InterviewPackage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Pricing information for a package tier
#[derive(Debug, Clone)]
pub struct PackagePricing {
    pub name: &'static str,
    pub description: &'static str,
    pub cents: i64,
}

/// Input for creating a new article
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateArticleInput {
    pub title: String,
    pub author_name: String,
    pub agency_contact: String,
    pub kol_name: String,
    pub kol_credentials: String,
    pub body: String,
    pub therapeutic_area: String,
    pub target_audience: String,
    pub article_type: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub interview_package: InterviewPackage,
}

/// Pagination parameters for list queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListParams {
    /// Page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 20,
        }
    }
}

impl ListParams {
    /// Create new pagination parameters
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, 100),
        }
    }

    /// Calculate the offset for database queries
    pub fn offset(&self) -> i64 {
        ((self.page.saturating_sub(1)) * self.per_page) as i64
    }

    /// Get the limit for database queries
    pub fn limit(&self) -> i64 {
        self.per_page as i64
    }
}

/// Paginated result container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedResult<T> {
    /// Items in the current page
    pub items: Vec<T>,
    /// Total number of items across all pages
    pub total: i64,
    /// Current page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
}

impl<T> PagedResult<T> {
    /// Create a new paginated result
    pub fn new(items: Vec<T>, total: i64, params: &ListParams) -> Self {
        Self {
            items,
            total,
            page: params.page,
            per_page: params.per_page,
        }
    }

    /// Calculate the total number of pages
    pub fn total_pages(&self) -> u32 {
        if self.per_page == 0 {
            return 0;
        }
        ((self.total as u32) + self.per_page - 1) / self.per_page
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_article_status_roundtrip() {
        for status in [
            ArticleStatus::PendingReview,
            ArticleStatus::Approved,
            ArticleStatus::Rejected,
        ] {
            assert_eq!(ArticleStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(ArticleStatus::from_str("published"), None);
    }

    #[test]
    fn test_payment_status_roundtrip() {
        for status in [
            PaymentStatus::Pending,
            PaymentStatus::Paid,
            PaymentStatus::Failed,
        ] {
            assert_eq!(PaymentStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(PaymentStatus::from_str("refunded"), None);
    }

    #[test]
    fn test_package_durations() {
        assert_eq!(InterviewPackage::Basic.interview_duration_minutes(), None);
        assert_eq!(
            InterviewPackage::Premium.interview_duration_minutes(),
            Some(15)
        );
        assert_eq!(
            InterviewPackage::PremiumPlus.interview_duration_minutes(),
            Some(30)
        );
    }

    #[test]
    fn test_package_pricing() {
        assert_eq!(InterviewPackage::Basic.pricing().cents, 9900);
        assert_eq!(InterviewPackage::Premium.pricing().cents, 24900);
        assert_eq!(InterviewPackage::PremiumPlus.pricing().cents, 39900);
    }

    #[test]
    fn test_only_basic_excludes_interview() {
        assert!(!InterviewPackage::Basic.includes_interview());
        assert!(InterviewPackage::Premium.includes_interview());
        assert!(InterviewPackage::PremiumPlus.includes_interview());
    }

    #[test]
    fn test_review_outcomes() {
        assert!(!ArticleStatus::PendingReview.is_review_outcome());
        assert!(ArticleStatus::Approved.is_review_outcome());
        assert!(ArticleStatus::Rejected.is_review_outcome());
    }

    #[test]
    fn test_serde_representation_matches_db_strings() {
        let json = serde_json::to_string(&ArticleStatus::PendingReview).unwrap();
        assert_eq!(json, "\"pending_review\"");
        let json = serde_json::to_string(&InterviewPackage::PremiumPlus).unwrap();
        assert_eq!(json, "\"premium_plus\"");
        let json = serde_json::to_string(&PaymentStatus::Paid).unwrap();
        assert_eq!(json, "\"paid\"");
    }

    proptest! {
        /// Parsing is case-insensitive for every known status string.
        #[test]
        fn prop_status_parse_case_insensitive(
            upper in prop::sample::select(vec!["pending_review", "approved", "rejected"]),
        ) {
            let mixed = upper.to_uppercase();
            prop_assert!(ArticleStatus::from_str(&mixed).is_some());
        }

        /// Unknown strings never parse into a status.
        #[test]
        fn prop_unknown_status_rejected(s in "[a-z]{1,12}") {
            prop_assume!(!["pending_review", "approved", "rejected"].contains(&s.as_str()));
            prop_assert!(ArticleStatus::from_str(&s).is_none());
        }
    }

    #[test]
    fn test_list_params_clamping() {
        let params = ListParams::new(0, 500);
        assert_eq!(params.page, 1);
        assert_eq!(params.per_page, 100);
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn test_paged_result_total_pages() {
        let params = ListParams::new(1, 10);
        let result: PagedResult<i32> = PagedResult::new(vec![], 25, &params);
        assert_eq!(result.total_pages(), 3);
    }
}
