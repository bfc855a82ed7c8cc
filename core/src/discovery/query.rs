// engagement/src/discovery/query.rs

//! The search query value and its bucket classifiers.

use crate::error::EngagementError;
use crate::model::BudgetKind;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Budget tiers over a job's effective maximum (hourly × 40).
///
/// Bounds are lower-inclusive and upper-exclusive, so a boundary amount such
/// as 50 000 belongs to the higher tier only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BudgetBucket {
  #[serde(rename = "under-500")]
  Under50k,
  #[serde(rename = "500-1000")]
  From50kTo100k,
  #[serde(rename = "1000-2500")]
  From100kTo250k,
  #[serde(rename = "2500-5000")]
  From250kTo500k,
  #[serde(rename = "above-5000")]
  Above500k,
}

impl BudgetBucket {
  pub const ALL: [BudgetBucket; 5] = [
    BudgetBucket::Under50k,
    BudgetBucket::From50kTo100k,
    BudgetBucket::From100kTo250k,
    BudgetBucket::From250kTo500k,
    BudgetBucket::Above500k,
  ];

  /// `[lower, upper)`; the top tier is unbounded.
  pub fn bounds(self) -> (u64, Option<u64>) {
    match self {
      BudgetBucket::Under50k => (0, Some(50_000)),
      BudgetBucket::From50kTo100k => (50_000, Some(100_000)),
      BudgetBucket::From100kTo250k => (100_000, Some(250_000)),
      BudgetBucket::From250kTo500k => (250_000, Some(500_000)),
      BudgetBucket::Above500k => (500_000, None),
    }
  }

  pub fn classify(amount: u64) -> BudgetBucket {
    Self::ALL
      .into_iter()
      .find(|bucket| bucket.contains(amount))
      .unwrap_or(BudgetBucket::Above500k)
  }

  pub fn contains(self, amount: u64) -> bool {
    let (lower, upper) = self.bounds();
    amount >= lower && upper.map_or(true, |upper| amount < upper)
  }

  pub fn label(self) -> &'static str {
    match self {
      BudgetBucket::Under50k => "under-500",
      BudgetBucket::From50kTo100k => "500-1000",
      BudgetBucket::From100kTo250k => "1000-2500",
      BudgetBucket::From250kTo500k => "2500-5000",
      BudgetBucket::Above500k => "above-5000",
    }
  }
}

impl FromStr for BudgetBucket {
  type Err = EngagementError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let wanted = s.trim();
    BudgetBucket::ALL
      .into_iter()
      .find(|bucket| bucket.label().eq_ignore_ascii_case(wanted))
      .ok_or_else(|| EngagementError::validation("budgetBucket", format!("unknown budget bucket '{}'", s)))
  }
}

/// Duration classes over free-text labels, matched by case-insensitive substring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DurationBucket {
  #[serde(rename = "less-than-month")]
  LessThanMonth,
  #[serde(rename = "1-3-months")]
  OneToThreeMonths,
  #[serde(rename = "3-6-months")]
  ThreeToSixMonths,
  #[serde(rename = "ongoing")]
  Ongoing,
}

impl DurationBucket {
  pub const ALL: [DurationBucket; 4] = [
    DurationBucket::LessThanMonth,
    DurationBucket::OneToThreeMonths,
    DurationBucket::ThreeToSixMonths,
    DurationBucket::Ongoing,
  ];

  fn needles(self) -> &'static [&'static str] {
    match self {
      DurationBucket::LessThanMonth => &["week"],
      DurationBucket::OneToThreeMonths => &["1-3", "2-3"],
      DurationBucket::ThreeToSixMonths => &["3-6"],
      DurationBucket::Ongoing => &["ongoing"],
    }
  }

  pub fn matches(self, duration_label: &str) -> bool {
    let label = duration_label.to_lowercase();
    self.needles().iter().any(|needle| label.contains(needle))
  }

  pub fn label(self) -> &'static str {
    match self {
      DurationBucket::LessThanMonth => "less-than-month",
      DurationBucket::OneToThreeMonths => "1-3-months",
      DurationBucket::ThreeToSixMonths => "3-6-months",
      DurationBucket::Ongoing => "ongoing",
    }
  }
}

impl FromStr for DurationBucket {
  type Err = EngagementError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let wanted = s.trim();
    DurationBucket::ALL
      .into_iter()
      .find(|bucket| bucket.label().eq_ignore_ascii_case(wanted))
      .ok_or_else(|| EngagementError::validation("durationBucket", format!("unknown duration bucket '{}'", s)))
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
  #[default]
  Latest,
  BudgetHigh,
  BudgetLow,
  FewestProposals,
}

impl FromStr for SortKey {
  type Err = EngagementError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "latest" => Ok(SortKey::Latest),
      "budget-high" => Ok(SortKey::BudgetHigh),
      "budget-low" => Ok(SortKey::BudgetLow),
      "fewest-proposals" => Ok(SortKey::FewestProposals),
      other => Err(EngagementError::validation("sortKey", format!("unknown sort key '{}'", other))),
    }
  }
}

/// A discovery query. Every `None` field leaves that dimension unfiltered.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub text: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub category: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub job_type: Option<BudgetKind>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub budget_bucket: Option<BudgetBucket>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub duration_bucket: Option<DurationBucket>,
  #[serde(default)]
  pub sort_key: SortKey,
}

impl Query {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn text(mut self, text: impl Into<String>) -> Self {
    self.text = Some(text.into());
    self
  }

  pub fn category(mut self, category: impl Into<String>) -> Self {
    self.category = Some(category.into());
    self
  }

  pub fn job_type(mut self, kind: BudgetKind) -> Self {
    self.job_type = Some(kind);
    self
  }

  pub fn budget_bucket(mut self, bucket: BudgetBucket) -> Self {
    self.budget_bucket = Some(bucket);
    self
  }

  pub fn duration_bucket(mut self, bucket: DurationBucket) -> Self {
    self.duration_bucket = Some(bucket);
    self
  }

  pub fn sort_by(mut self, key: SortKey) -> Self {
    self.sort_key = key;
    self
  }

  /// The text needle, lowercased, if it carries anything besides whitespace.
  pub(crate) fn text_needle(&self) -> Option<String> {
    self
      .text
      .as_deref()
      .map(str::trim)
      .filter(|t| !t.is_empty())
      .map(str::to_lowercase)
  }
}
