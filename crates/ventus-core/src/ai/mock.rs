//! Mock backend for testing
//!
//! Classifies transactions with a keyword table and writes deal copy from a
//! template. Useful for unit tests and development without the serverless
//! functions.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::import::clean_merchant;
use crate::models::{Pillar, SlimProfile, Transaction};

use super::types::{DealMessage, DealPayload, EnrichmentResult};
use super::AIBackend;

/// Mock AI backend for testing
///
/// Returns predictable responses for all operations. A failing mock errors
/// on every call, for exercising fallback paths.
#[derive(Clone)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    /// Whether service calls should fail
    pub failing: bool,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self {
            healthy: true,
            failing: false,
        }
    }

    /// Create a mock whose service calls all fail
    pub fn failing() -> Self {
        Self {
            healthy: false,
            failing: true,
        }
    }

    fn check_failing(&self) -> Result<()> {
        if self.failing {
            Err(Error::Service("mock backend is configured to fail".into()))
        } else {
            Ok(())
        }
    }
}

/// (keyword, pillar, subcategory, is travel); first match wins
const KEYWORDS: &[(&str, Pillar, &str, bool)] = &[
    ("UBER EATS", Pillar::FoodDining, "Delivery", false),
    ("DOORDASH", Pillar::FoodDining, "Delivery", false),
    ("STARBUCKS", Pillar::FoodDining, "Coffee", false),
    ("BLUE BOTTLE", Pillar::FoodDining, "Coffee", false),
    ("COFFEE", Pillar::FoodDining, "Coffee", false),
    ("CHIPOTLE", Pillar::FoodDining, "Fast Casual", false),
    ("RESTAURANT", Pillar::FoodDining, "Restaurants", false),
    ("WHOLE FOODS", Pillar::FoodDining, "Groceries", false),
    ("TRADER JOE", Pillar::FoodDining, "Groceries", false),
    ("DELTA", Pillar::TravelExploration, "Airfare", true),
    ("UNITED AIR", Pillar::TravelExploration, "Airfare", true),
    ("JETBLUE", Pillar::TravelExploration, "Airfare", true),
    ("MARRIOTT", Pillar::TravelExploration, "Lodging", true),
    ("HILTON", Pillar::TravelExploration, "Lodging", true),
    ("AIRBNB", Pillar::TravelExploration, "Lodging", true),
    ("EXPEDIA", Pillar::TravelExploration, "Booking", true),
    ("EQUINOX", Pillar::SportsActiveLiving, "Gym", false),
    ("PLANET FITNESS", Pillar::SportsActiveLiving, "Gym", false),
    ("PELOTON", Pillar::SportsActiveLiving, "Fitness", false),
    ("REI", Pillar::SportsActiveLiving, "Outdoor Gear", false),
    ("NETFLIX", Pillar::EntertainmentCulture, "Streaming", false),
    ("SPOTIFY", Pillar::EntertainmentCulture, "Streaming", false),
    ("TICKETMASTER", Pillar::EntertainmentCulture, "Live Events", false),
    ("AMC", Pillar::EntertainmentCulture, "Movies", false),
    ("AMAZON", Pillar::ShoppingRetail, "Online Retail", false),
    ("TARGET", Pillar::ShoppingRetail, "General Merchandise", false),
    ("NORDSTROM", Pillar::ShoppingRetail, "Apparel", false),
    ("CVS", Pillar::HealthWellness, "Pharmacy", false),
    ("WALGREENS", Pillar::HealthWellness, "Pharmacy", false),
    ("HEADSPACE", Pillar::HealthWellness, "Mindfulness", false),
    ("HOME DEPOT", Pillar::HomeLiving, "Home Improvement", false),
    ("IKEA", Pillar::HomeLiving, "Furniture", false),
    ("WAYFAIR", Pillar::HomeLiving, "Furniture", false),
    ("UBER", Pillar::Transportation, "Rideshare", false),
    ("LYFT", Pillar::Transportation, "Rideshare", false),
    ("SHELL", Pillar::Transportation, "Fuel", false),
    ("CHEVRON", Pillar::Transportation, "Fuel", false),
    ("PARKING", Pillar::Transportation, "Parking", false),
];

fn classify(tx: &Transaction) -> EnrichmentResult {
    let haystack = format!(
        "{} {}",
        tx.description.to_uppercase(),
        tx.merchant.as_deref().unwrap_or("").to_uppercase()
    );
    let words: Vec<&str> = haystack
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    // Short keywords must match whole words ("REI" is not "REIMBURSEMENT")
    let hit = KEYWORDS.iter().find(|(keyword, ..)| {
        if keyword.len() <= 4 {
            words.contains(keyword)
        } else {
            haystack.contains(keyword)
        }
    });

    let (pillar, subcategory, confidence, is_travel) = match hit {
        Some((_, pillar, subcategory, is_travel)) => (*pillar, *subcategory, 90.0, *is_travel),
        None => (Pillar::Other, "General", 35.0, false),
    };

    // "DELTA AIR LINES - DENVER" carries its destination after the dash
    let destination = if is_travel {
        tx.description
            .split_once(" - ")
            .map(|(_, dest)| dest.trim().to_string())
            .filter(|d| !d.is_empty())
            .or_else(|| Some("unknown".to_string()))
    } else {
        None
    };

    EnrichmentResult {
        transaction_id: tx.id.clone(),
        pillar: pillar.label().to_string(),
        subcategory: subcategory.to_string(),
        confidence: Some(confidence),
        is_travel,
        destination,
        merchant: clean_merchant(tx.description.split(" - ").next().unwrap_or("")),
    }
}

#[async_trait]
impl AIBackend for MockBackend {
    async fn enrich_transactions(&self, transactions: &[Transaction]) -> Result<Vec<EnrichmentResult>> {
        self.check_failing()?;
        Ok(transactions.iter().map(classify).collect())
    }

    async fn personalize_deals(
        &self,
        deals: &[DealPayload],
        profile: &SlimProfile,
    ) -> Result<BTreeMap<String, DealMessage>> {
        self.check_failing()?;
        let signal = profile
            .lifestyle_signals
            .first()
            .map(String::as_str)
            .unwrap_or("cardholder");
        Ok(deals
            .iter()
            .map(|d| {
                (
                    d.id.clone(),
                    DealMessage {
                        message: format!("{}: {}. Picked for a {} like you.", d.merchant, d.reward, signal),
                        cta: format!("Claim at {}", d.merchant),
                    },
                )
            })
            .collect())
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}
