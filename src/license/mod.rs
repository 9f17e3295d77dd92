//! License Grants and Row Allotment
//!
//! - `grant`: license grant records and the sources they are read from
//! - `rules`: premium tier detection and the first-match rule table

pub mod grant;
pub mod rules;

pub use grant::{
    JsonFileLicenseSource, LicenseGrant, LicenseSource, StaticLicenseSource, ACTIVE_STATUS,
};
pub use rules::{
    AllotmentBreakdown, AllotmentRule, Contribution, LicenseQuotaEvaluator, PremiumTier, RowGrant,
    ALLOTMENT_RULES, DEFAULT_PREMIUM_PREFIX, PREMIUM_TIERS,
};
