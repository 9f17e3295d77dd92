//! License Quota Rules
//!
//! Maps Active license grants to an additive row allotment.
//!
//! # Evaluation
//!
//! ```text
//! snapshot ──► Active grants ──┬─► label starts with premium prefix ─► Pass 1 (premium tiers)
//!                              │                                          │ premium_tier flag
//!                              └─► all Active grants ─────────────────► Pass 2 (rule table)
//! ```
//!
//! Pass 1 matches exact labels (`"<prefix> Plus"`, `"<prefix> Growth"`).
//! Pass 2 applies the first rule in [`ALLOTMENT_RULES`] whose fragment is
//! contained in the label; every grant is scored on its own, so two grants
//! with the same label both count. Labels no rule knows contribute nothing.
//!
//! The per-seat analytics rules discount one seat when a premium tier is
//! present, because the premium bundle already includes it.

use crate::error::{QuotaError, Result};
use crate::license::grant::{LicenseGrant, LicenseSource};
use serde::Serialize;

/// Label prefix shared by the premium analytics tiers
pub const DEFAULT_PREMIUM_PREFIX: &str = "Einstein Analytics";

/// Exact-label premium tiers, matched as `"<prefix> <suffix>"`
pub const PREMIUM_TIERS: &[PremiumTier] = &[
    PremiumTier {
        suffix: "Plus",
        rows: 10_000_000_000,
    },
    PremiumTier {
        suffix: "Growth",
        rows: 100_000_000,
    },
];

/// Rule table, in priority order. The first matching rule wins.
pub const ALLOTMENT_RULES: &[AllotmentRule] = &[
    AllotmentRule {
        name: "financial-services-cloud",
        label_contains: "for Financial Services Cloud",
        rows: RowGrant::Flat(25_000_000),
    },
    AllotmentRule {
        name: "health-cloud",
        label_contains: "for Health Cloud",
        rows: RowGrant::Flat(25_000_000),
    },
    AllotmentRule {
        name: "event-monitoring",
        label_contains: "Event Monitoring",
        rows: RowGrant::Flat(50_000_000),
    },
    AllotmentRule {
        name: "b2b-marketing",
        label_contains: "B2B Marketing",
        rows: RowGrant::Flat(25_000_000),
    },
    AllotmentRule {
        name: "additional-data-rows",
        label_contains: "Additional Data Rows",
        rows: RowGrant::PerLicense(100_000_000),
    },
    AllotmentRule {
        name: "sales-analytics",
        label_contains: "Sales Analytics",
        rows: RowGrant::PerLicenseLessBundled(25_000_000),
    },
    AllotmentRule {
        name: "service-analytics",
        label_contains: "Service Analytics",
        rows: RowGrant::PerLicenseLessBundled(25_000_000),
    },
];

/// A premium tier recognised in pass 1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PremiumTier {
    /// Label suffix after the premium prefix
    pub suffix: &'static str,

    /// Rows granted by an Active grant of this tier
    pub rows: u64,
}

impl PremiumTier {
    /// Whether `label` names this tier under `prefix`
    pub fn matches(&self, prefix: &str, label: &str) -> bool {
        label
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix(' '))
            .is_some_and(|suffix| suffix == self.suffix)
    }
}

/// How a matched rule turns a grant into rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowGrant {
    /// Fixed rows regardless of seat count
    Flat(u64),

    /// Rows per purchased seat
    PerLicense(u64),

    /// Rows per seat, minus one bundled seat when a premium tier is present
    /// and more than one seat was purchased
    PerLicenseLessBundled(u64),
}

impl RowGrant {
    /// Rows contributed by a grant with `total_licenses` seats
    ///
    /// Returns `None` on overflow.
    pub fn rows(&self, total_licenses: u64, premium_tier: bool) -> Option<u64> {
        match *self {
            RowGrant::Flat(rows) => Some(rows),
            RowGrant::PerLicense(per_seat) => total_licenses.checked_mul(per_seat),
            RowGrant::PerLicenseLessBundled(per_seat) => {
                let seats = if premium_tier && total_licenses > 1 {
                    total_licenses - 1
                } else {
                    total_licenses
                };
                seats.checked_mul(per_seat)
            }
        }
    }
}

/// One entry of the rule table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllotmentRule {
    /// Rule identifier reported in breakdowns
    pub name: &'static str,

    /// Label fragment that selects this rule (substring match)
    pub label_contains: &'static str,

    /// Row contribution of a matching grant
    pub rows: RowGrant,
}

impl AllotmentRule {
    pub fn matches(&self, label: &str) -> bool {
        label.contains(self.label_contains)
    }
}

/// First rule in the table that matches `label`
pub fn matching_rule(label: &str) -> Option<&'static AllotmentRule> {
    ALLOTMENT_RULES.iter().find(|rule| rule.matches(label))
}

/// Rows contributed by one grant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contribution {
    /// Grant label
    pub label: String,

    /// Premium tier suffix or rule name that matched
    pub rule: String,

    /// Rows added to the allotment
    pub rows: u64,
}

/// Explainable result of a license evaluation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AllotmentBreakdown {
    /// Whether an Active premium tier grant was found
    pub premium_tier: bool,

    /// Total row allotment
    pub total: u64,

    /// Non-zero and rule-matched contributions, pass 1 first
    pub contributions: Vec<Contribution>,
}

impl AllotmentBreakdown {
    fn add(&mut self, label: &str, rule: &str, rows: u64) -> Result<()> {
        self.total = self.total.checked_add(rows).ok_or_else(|| {
            QuotaError::QuotaEvaluation(format!(
                "Row allotment overflows u64 while adding {} rows for '{}'",
                rows, label
            ))
        })?;
        self.contributions.push(Contribution {
            label: label.to_string(),
            rule: rule.to_string(),
            rows,
        });
        Ok(())
    }
}

/// Evaluates license grants into a row allotment
#[derive(Debug, Clone)]
pub struct LicenseQuotaEvaluator {
    premium_prefix: String,
}

impl Default for LicenseQuotaEvaluator {
    fn default() -> Self {
        Self::new(DEFAULT_PREMIUM_PREFIX)
    }
}

impl LicenseQuotaEvaluator {
    /// Create an evaluator recognising premium tiers under `premium_prefix`
    pub fn new(premium_prefix: impl Into<String>) -> Self {
        Self {
            premium_prefix: premium_prefix.into(),
        }
    }

    /// Premium label prefix in use
    pub fn premium_prefix(&self) -> &str {
        &self.premium_prefix
    }

    /// Evaluate a grant snapshot
    ///
    /// Pure function of `grants`: evaluating the same snapshot twice yields
    /// the same breakdown.
    ///
    /// # Errors
    ///
    /// Returns [`QuotaError::QuotaEvaluation`] if the allotment overflows u64.
    pub fn evaluate(&self, grants: &[LicenseGrant]) -> Result<AllotmentBreakdown> {
        let active: Vec<&LicenseGrant> = grants.iter().filter(|g| g.is_active()).collect();
        let premium_candidates = active
            .iter()
            .filter(|g| g.label.starts_with(self.premium_prefix.as_str()));

        let mut breakdown = AllotmentBreakdown::default();

        for grant in premium_candidates {
            for tier in PREMIUM_TIERS {
                if tier.matches(&self.premium_prefix, &grant.label) {
                    breakdown.add(&grant.label, tier.suffix, tier.rows)?;
                    breakdown.premium_tier = true;
                }
            }
        }

        for grant in &active {
            let Some(rule) = matching_rule(&grant.label) else {
                tracing::trace!("No allotment rule for license '{}'", grant.label);
                continue;
            };
            let rows = rule
                .rows
                .rows(grant.total_licenses, breakdown.premium_tier)
                .ok_or_else(|| {
                    QuotaError::QuotaEvaluation(format!(
                        "Row allotment for '{}' with {} licenses overflows u64",
                        grant.label, grant.total_licenses
                    ))
                })?;
            breakdown.add(&grant.label, rule.name, rows)?;
        }

        tracing::debug!(
            "Evaluated {} active of {} license grants: premium_tier={}, allotment={}",
            active.len(),
            grants.len(),
            breakdown.premium_tier,
            breakdown.total
        );

        Ok(breakdown)
    }

    /// Load a snapshot from `source` and evaluate it
    pub async fn evaluate_source<L: LicenseSource>(&self, source: &L) -> Result<AllotmentBreakdown> {
        let grants = source.load_grants().await?;
        self.evaluate(&grants)
    }

    /// Total row allotment entitled by `source`
    pub async fn total_row_allotment<L: LicenseSource>(&self, source: &L) -> Result<u64> {
        let breakdown = self.evaluate_source(source).await?;
        tracing::info!("Total row allotment: {}", breakdown.total);
        Ok(breakdown.total)
    }
}
