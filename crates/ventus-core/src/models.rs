//! Domain models for Ventus

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Lifestyle pillars used to classify spending
///
/// Every lookup table (labels, icons, colors, deals, lifestyle rules) is keyed
/// by this enum so a new pillar fails to compile until each table covers it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Pillar {
    #[serde(rename = "Food & Dining")]
    FoodDining,
    #[serde(rename = "Travel & Exploration")]
    TravelExploration,
    #[serde(rename = "Sports & Active Living")]
    SportsActiveLiving,
    #[serde(rename = "Entertainment & Culture")]
    EntertainmentCulture,
    #[serde(rename = "Shopping & Retail")]
    ShoppingRetail,
    #[serde(rename = "Health & Wellness")]
    HealthWellness,
    #[serde(rename = "Home & Living")]
    HomeLiving,
    #[serde(rename = "Transportation")]
    Transportation,
    /// Catch-all bucket, dropped when miscellaneous spending is excluded
    #[serde(rename = "Other")]
    Other,
}

impl Pillar {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FoodDining => "food_dining",
            Self::TravelExploration => "travel_exploration",
            Self::SportsActiveLiving => "sports_active_living",
            Self::EntertainmentCulture => "entertainment_culture",
            Self::ShoppingRetail => "shopping_retail",
            Self::HealthWellness => "health_wellness",
            Self::HomeLiving => "home_living",
            Self::Transportation => "transportation",
            Self::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::FoodDining => "Food & Dining",
            Self::TravelExploration => "Travel & Exploration",
            Self::SportsActiveLiving => "Sports & Active Living",
            Self::EntertainmentCulture => "Entertainment & Culture",
            Self::ShoppingRetail => "Shopping & Retail",
            Self::HealthWellness => "Health & Wellness",
            Self::HomeLiving => "Home & Living",
            Self::Transportation => "Transportation",
            Self::Other => "Other",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Self::FoodDining => "🍽️",
            Self::TravelExploration => "✈️",
            Self::SportsActiveLiving => "🏃",
            Self::EntertainmentCulture => "🎭",
            Self::ShoppingRetail => "🛍️",
            Self::HealthWellness => "🧘",
            Self::HomeLiving => "🏠",
            Self::Transportation => "🚗",
            Self::Other => "📦",
        }
    }

    /// Chart color (hex)
    pub fn color(&self) -> &'static str {
        match self {
            Self::FoodDining => "#f97316",
            Self::TravelExploration => "#0ea5e9",
            Self::SportsActiveLiving => "#22c55e",
            Self::EntertainmentCulture => "#a855f7",
            Self::ShoppingRetail => "#ec4899",
            Self::HealthWellness => "#14b8a6",
            Self::HomeLiving => "#eab308",
            Self::Transportation => "#64748b",
            Self::Other => "#9ca3af",
        }
    }

    /// Whether this is the catch-all bucket
    pub fn is_misc(&self) -> bool {
        matches!(self, Self::Other)
    }

    pub fn all() -> &'static [Pillar] {
        &[
            Self::FoodDining,
            Self::TravelExploration,
            Self::SportsActiveLiving,
            Self::EntertainmentCulture,
            Self::ShoppingRetail,
            Self::HealthWellness,
            Self::HomeLiving,
            Self::Transportation,
            Self::Other,
        ]
    }

    /// Parse a pillar name coming from an external service
    ///
    /// Unknown names land in the catch-all bucket instead of failing the merge.
    pub fn from_label_lossy(s: &str) -> Self {
        s.parse().unwrap_or_else(|_| {
            tracing::debug!(pillar = %s, "Unknown pillar label, using Other");
            Self::Other
        })
    }
}

impl std::str::FromStr for Pillar {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let needle = s.trim();
        Self::all()
            .iter()
            .copied()
            .find(|p| p.label().eq_ignore_ascii_case(needle) || p.as_str() == needle)
            .or_else(|| match needle.to_lowercase().as_str() {
                "misc" | "miscellaneous" | "uncategorized" => Some(Self::Other),
                _ => None,
            })
            .ok_or_else(|| format!("Unknown pillar: {}", s))
    }
}

impl std::fmt::Display for Pillar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A canonical transaction produced by normalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Stable identifier, unique within an uploaded batch
    pub id: String,
    pub date: NaiveDate,
    /// Raw merchant description as it appeared on the statement
    pub description: String,
    /// Normalized merchant name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant: Option<String>,
    /// Always non-negative; direction is not modeled
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
}

/// Travel context inferred by the enrichment service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TravelContext {
    pub is_travel: bool,
    /// Inferred destination; `None` when the service answered "unknown"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
}

/// Pillar classification for one transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub pillar: Pillar,
    pub subcategory: String,
    /// 0-100 confidence score
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub travel: TravelContext,
}

/// Enrichment state of a transaction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Enrichment {
    #[default]
    Unenriched,
    Enriched(Classification),
}

impl Enrichment {
    pub fn classification(&self) -> Option<&Classification> {
        match self {
            Self::Enriched(c) => Some(c),
            Self::Unenriched => None,
        }
    }

    pub fn pillar(&self) -> Option<Pillar> {
        self.classification().map(|c| c.pillar)
    }

    /// Pillar for grouping; unenriched transactions count as `Other`
    pub fn pillar_or_other(&self) -> Pillar {
        self.pillar().unwrap_or(Pillar::Other)
    }

    pub fn subcategory(&self) -> Option<&str> {
        self.classification().map(|c| c.subcategory.as_str())
    }

    pub fn confidence(&self) -> Option<f64> {
        self.classification().and_then(|c| c.confidence)
    }

    pub fn travel(&self) -> Option<&TravelContext> {
        self.classification().map(|c| &c.travel)
    }
}

/// A transaction with its enrichment layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedTransaction {
    #[serde(flatten)]
    pub transaction: Transaction,
    /// Effective classification (engine result, or the correction when one applies)
    #[serde(default)]
    pub enrichment: Enrichment,
    /// Engine classification replaced by a user correction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overridden: Option<Enrichment>,
}

impl EnrichedTransaction {
    pub fn new(transaction: Transaction, enrichment: Enrichment) -> Self {
        Self {
            transaction,
            enrichment,
            overridden: None,
        }
    }

    pub fn unenriched(transaction: Transaction) -> Self {
        Self::new(transaction, Enrichment::Unenriched)
    }

    pub fn id(&self) -> &str {
        &self.transaction.id
    }

    pub fn amount(&self) -> f64 {
        self.transaction.amount
    }

    pub fn date(&self) -> NaiveDate {
        self.transaction.date
    }

    pub fn is_corrected(&self) -> bool {
        self.overridden.is_some()
    }

    /// Classification as produced by the enrichment engine, ignoring corrections
    pub fn engine_enrichment(&self) -> &Enrichment {
        self.overridden.as_ref().unwrap_or(&self.enrichment)
    }

    /// Enrichment layer for the given display mode
    pub fn enrichment_for(&self, mode: DisplayMode) -> &Enrichment {
        match mode {
            DisplayMode::Raw => self.engine_enrichment(),
            DisplayMode::Corrected => &self.enrichment,
        }
    }

    /// Normalized merchant name, falling back to "Unknown"
    pub fn merchant_or_unknown(&self) -> &str {
        self.transaction
            .merchant
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(UNKNOWN_MERCHANT)
    }
}

/// Label used when a transaction has no normalized merchant
pub const UNKNOWN_MERCHANT: &str = "Unknown";

/// Which classification layer a view reads
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// Enrichment engine output only
    Raw,
    /// Engine output with user corrections applied
    #[default]
    #[serde(alias = "predicted")]
    Corrected,
}

impl DisplayMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Corrected => "corrected",
        }
    }
}

impl std::str::FromStr for DisplayMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "raw" => Ok(Self::Raw),
            "corrected" | "predicted" => Ok(Self::Corrected),
            _ => Err(format!("Unknown display mode: {}", s)),
        }
    }
}

impl std::fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user's manual reclassification of one transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correction {
    pub transaction_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_pillar: Option<Pillar>,
    pub corrected_pillar: Pillar,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_subcategory: Option<String>,
    pub corrected_subcategory: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One row of a grouped spending aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub key: String,
    pub amount: f64,
    pub transaction_count: i64,
    /// Share of the report total, rounded for display
    pub percentage: f64,
}

/// A top-N aggregate with its reconciled remainder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupedReport {
    pub total: f64,
    pub transaction_count: i64,
    pub groups: Vec<GroupSummary>,
    /// Everything not shown in `groups`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remainder: Option<GroupSummary>,
}

impl GroupedReport {
    /// Displayed rows including the remainder
    pub fn rows(&self) -> impl Iterator<Item = &GroupSummary> {
        self.groups.iter().chain(self.remainder.iter())
    }
}

/// Card products in the TePilot sample portfolio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardProduct {
    CashBack,
    TravelRewards,
    Premium,
    Student,
    Secured,
    Business,
}

impl CardProduct {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CashBack => "cash_back",
            Self::TravelRewards => "travel_rewards",
            Self::Premium => "premium",
            Self::Student => "student",
            Self::Secured => "secured",
            Self::Business => "business",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::CashBack => "Cash Back",
            Self::TravelRewards => "Travel Rewards",
            Self::Premium => "Premium",
            Self::Student => "Student",
            Self::Secured => "Secured",
            Self::Business => "Business",
        }
    }

    pub fn all() -> &'static [CardProduct] {
        &[
            Self::CashBack,
            Self::TravelRewards,
            Self::Premium,
            Self::Student,
            Self::Secured,
            Self::Business,
        ]
    }
}

impl std::str::FromStr for CardProduct {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase().replace(['-', ' '], "_");
        Self::all()
            .iter()
            .copied()
            .find(|c| c.as_str() == needle)
            .ok_or_else(|| format!("Unknown card product: {}", s))
    }
}

impl std::fmt::Display for CardProduct {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Geographic regions in the TePilot sample portfolio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Northeast,
    Southeast,
    Midwest,
    Southwest,
    West,
}

impl Region {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Northeast => "northeast",
            Self::Southeast => "southeast",
            Self::Midwest => "midwest",
            Self::Southwest => "southwest",
            Self::West => "west",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Northeast => "Northeast",
            Self::Southeast => "Southeast",
            Self::Midwest => "Midwest",
            Self::Southwest => "Southwest",
            Self::West => "West",
        }
    }

    pub fn all() -> &'static [Region] {
        &[
            Self::Northeast,
            Self::Southeast,
            Self::Midwest,
            Self::Southwest,
            Self::West,
        ]
    }
}

impl std::str::FromStr for Region {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|r| r.as_str() == needle)
            .ok_or_else(|| format!("Unknown region: {}", s))
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Cardholder age brackets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgeRange {
    #[serde(rename = "18-24")]
    From18To24,
    #[serde(rename = "25-34")]
    From25To34,
    #[serde(rename = "35-44")]
    From35To44,
    #[serde(rename = "45-54")]
    From45To54,
    #[serde(rename = "55-64")]
    From55To64,
    #[serde(rename = "65+")]
    SixtyFivePlus,
}

impl AgeRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::From18To24 => "18-24",
            Self::From25To34 => "25-34",
            Self::From35To44 => "35-44",
            Self::From45To54 => "45-54",
            Self::From55To64 => "55-64",
            Self::SixtyFivePlus => "65+",
        }
    }

    pub fn all() -> &'static [AgeRange] {
        &[
            Self::From18To24,
            Self::From25To34,
            Self::From35To44,
            Self::From45To54,
            Self::From55To64,
            Self::SixtyFivePlus,
        ]
    }
}

impl std::str::FromStr for AgeRange {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let needle = s.trim();
        Self::all()
            .iter()
            .copied()
            .find(|a| a.as_str() == needle)
            .ok_or_else(|| format!("Unknown age range: {} (valid: 18-24 ... 65+)", s))
    }
}

impl std::fmt::Display for AgeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Spend summary for one card product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardProductSummary {
    pub card_product: CardProduct,
    pub cardholders: u64,
    pub annual_spend: f64,
    pub avg_spend_per_cardholder: f64,
    pub percentage: f64,
}

/// Spend summary for one age bracket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeRangeSummary {
    pub age_range: AgeRange,
    pub cardholders: u64,
    pub annual_spend: f64,
    pub percentage: f64,
}

/// Cross-sell opportunity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpportunityLevel {
    None,
    Low,
    Medium,
    High,
}

impl OpportunityLevel {
    /// Annual opportunity at or above which a pairing is `High`
    pub const HIGH_THRESHOLD: f64 = 2_000_000_000.0;
    /// Annual opportunity at or above which a pairing is `Medium`
    pub const MEDIUM_THRESHOLD: f64 = 1_000_000_000.0;

    /// Classify an annual opportunity estimate (`None` = undefined pairing)
    pub fn classify(annual_opportunity: Option<f64>) -> Self {
        match annual_opportunity {
            Some(v) if v >= Self::HIGH_THRESHOLD => Self::High,
            Some(v) if v >= Self::MEDIUM_THRESHOLD => Self::Medium,
            Some(v) if v > 0.0 => Self::Low,
            _ => Self::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl std::fmt::Display for OpportunityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One cell of the cross-sell matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossSellCell {
    pub from: CardProduct,
    pub to: CardProduct,
    pub annual_opportunity: f64,
    pub level: OpportunityLevel,
}

/// Square matrix keyed by (from card, to card)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossSellMatrix {
    pub products: Vec<CardProduct>,
    /// Row-major: `cells[i][j]` is products[i] -> products[j]
    pub cells: Vec<Vec<CrossSellCell>>,
}

impl CrossSellMatrix {
    pub fn cell(&self, from: CardProduct, to: CardProduct) -> Option<&CrossSellCell> {
        let i = self.products.iter().position(|p| *p == from)?;
        let j = self.products.iter().position(|p| *p == to)?;
        self.cells.get(i).and_then(|row| row.get(j))
    }
}

/// A ranked cross-sell revenue opportunity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueOpportunity {
    pub from: CardProduct,
    pub to: CardProduct,
    pub annual_opportunity: f64,
    pub level: OpportunityLevel,
}

/// Spending in one pillar, with its biggest merchant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PillarProfile {
    pub pillar: Pillar,
    pub total_spend: f64,
    pub transaction_count: i64,
    pub top_merchant: Option<String>,
}

/// Spending at one merchant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MerchantProfile {
    pub merchant: String,
    pub total_spend: f64,
    pub visits: i64,
}

/// Where the cardholder lives and travels
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationContext {
    pub home_zip: Option<String>,
    pub travel_destinations: Vec<String>,
}

/// Qualitative spending profile used to personalize deals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendingProfile {
    pub top_pillars: Vec<PillarProfile>,
    pub top_merchants: Vec<MerchantProfile>,
    pub lifestyle_signals: Vec<String>,
    pub location_context: LocationContext,
    pub total_spend: f64,
    pub avg_transaction_size: f64,
}

/// Reduced profile sent to the personalization service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlimProfile {
    pub top_pillars: Vec<String>,
    pub top_merchants: Vec<String>,
    pub lifestyle_signals: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_zip: Option<String>,
    pub travel_destinations: Vec<String>,
}
