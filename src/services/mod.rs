//! Services layer - Business logic
//!
//! This module contains the business logic services for MedTimes.
//! Services are responsible for:
//! - Implementing business rules
//! - Coordinating between repositories and external providers
//! - Handling validation and error cases

pub mod article;
pub mod email;
pub mod image;
pub mod interview;
pub mod payments;

pub use article::{ArticleService, ArticleServiceError};
pub use email::Mailer;
pub use image::{ImageStore, ImageStoreError, StoredImage};
pub use interview::{InterviewService, InterviewServiceError};
pub use payments::{
    parse_callback, parse_schedule, CallbackEvent, CheckoutRedirect, CheckoutRequest,
    PaymentError, SessionVerification, StripeGateway,
};
