//! Deal catalog and personalization
//!
//! The catalog is a fixed table keyed by [`Pillar`]. Deals are chosen from the
//! profile's top pillars, then the text-generation service may reword them
//! for the cardholder. A service failure never loses a deal: each one falls
//! back to its catalog copy.

use serde::Serialize;
use tracing::{debug, warn};

use crate::ai::{AIBackend, AIClient, DealPayload};
use crate::models::{Pillar, SpendingProfile};

/// A partner offer from the catalog
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Deal {
    pub id: &'static str,
    pub merchant: &'static str,
    pub pillar: Pillar,
    pub reward: &'static str,
    /// Catalog copy shown when no personalized message is available
    pub message: &'static str,
    pub cta: &'static str,
}

impl Deal {
    pub fn payload(&self) -> DealPayload {
        DealPayload {
            id: self.id.to_string(),
            merchant: self.merchant.to_string(),
            category: self.pillar.label().to_string(),
            reward: self.reward.to_string(),
        }
    }
}

const fn deal(
    id: &'static str,
    merchant: &'static str,
    pillar: Pillar,
    reward: &'static str,
    message: &'static str,
    cta: &'static str,
) -> Deal {
    Deal {
        id,
        merchant,
        pillar,
        reward,
        message,
        cta,
    }
}

const FOOD_DEALS: &[Deal] = &[
    deal(
        "food-opentable",
        "OpenTable",
        Pillar::FoodDining,
        "5x points on reservations",
        "Earn 5x points when you book dinner through OpenTable.",
        "Book a table",
    ),
    deal(
        "food-doordash",
        "DoorDash",
        Pillar::FoodDining,
        "$10 off your next 3 orders",
        "Take $10 off your next three DoorDash orders.",
        "Order now",
    ),
];

const TRAVEL_DEALS: &[Deal] = &[
    deal(
        "travel-delta",
        "Delta Air Lines",
        Pillar::TravelExploration,
        "3x miles on flights",
        "Earn 3x miles on every Delta flight you book with Ventus.",
        "Find flights",
    ),
    deal(
        "travel-airbnb",
        "Airbnb",
        Pillar::TravelExploration,
        "10% back on stays",
        "Get 10% back on your next Airbnb stay.",
        "Plan a trip",
    ),
];

const SPORTS_DEALS: &[Deal] = &[
    deal(
        "sports-classpass",
        "ClassPass",
        Pillar::SportsActiveLiving,
        "First month free",
        "Try a month of ClassPass on us.",
        "Start free trial",
    ),
    deal(
        "sports-rei",
        "REI",
        Pillar::SportsActiveLiving,
        "15% off gear",
        "Save 15% on outdoor gear at REI.",
        "Shop gear",
    ),
];

const ENTERTAINMENT_DEALS: &[Deal] = &[
    deal(
        "ent-ticketmaster",
        "Ticketmaster",
        Pillar::EntertainmentCulture,
        "Presale access",
        "Get presale access to concerts and shows on Ticketmaster.",
        "See events",
    ),
    deal(
        "ent-amc",
        "AMC Theatres",
        Pillar::EntertainmentCulture,
        "Buy one ticket, get one free",
        "Bring a friend: buy one AMC ticket, get one free.",
        "Get tickets",
    ),
];

const SHOPPING_DEALS: &[Deal] = &[
    deal(
        "shop-nordstrom",
        "Nordstrom",
        Pillar::ShoppingRetail,
        "4x points",
        "Earn 4x points on Nordstrom purchases this month.",
        "Shop now",
    ),
    deal(
        "shop-target",
        "Target",
        Pillar::ShoppingRetail,
        "5% back",
        "Get 5% back on everything at Target.",
        "Activate offer",
    ),
];

const HEALTH_DEALS: &[Deal] = &[
    deal(
        "health-headspace",
        "Headspace",
        Pillar::HealthWellness,
        "Free 3 months",
        "Enjoy three months of Headspace free.",
        "Redeem",
    ),
    deal(
        "health-cvs",
        "CVS Pharmacy",
        Pillar::HealthWellness,
        "3x points on wellness",
        "Earn 3x points on wellness purchases at CVS.",
        "Activate offer",
    ),
];

const HOME_DEALS: &[Deal] = &[
    deal(
        "home-homedepot",
        "The Home Depot",
        Pillar::HomeLiving,
        "$25 off $150",
        "Take $25 off your next Home Depot project over $150.",
        "Start a project",
    ),
    deal(
        "home-wayfair",
        "Wayfair",
        Pillar::HomeLiving,
        "10% back on furniture",
        "Get 10% back on furniture from Wayfair.",
        "Browse Wayfair",
    ),
];

const TRANSPORTATION_DEALS: &[Deal] = &[
    deal(
        "transport-uber",
        "Uber",
        Pillar::Transportation,
        "3x points on rides",
        "Earn 3x points on every Uber ride.",
        "Link Uber",
    ),
    deal(
        "transport-shell",
        "Shell",
        Pillar::Transportation,
        "10 cents off per gallon",
        "Save 10 cents per gallon at Shell stations.",
        "Find a station",
    ),
];

const OTHER_DEALS: &[Deal] = &[deal(
    "other-amazon",
    "Amazon",
    Pillar::Other,
    "2% back on everything",
    "Earn 2% back on everyday Amazon purchases.",
    "Activate offer",
)];

/// Catalog deals for a pillar
pub fn deals_for(pillar: Pillar) -> &'static [Deal] {
    match pillar {
        Pillar::FoodDining => FOOD_DEALS,
        Pillar::TravelExploration => TRAVEL_DEALS,
        Pillar::SportsActiveLiving => SPORTS_DEALS,
        Pillar::EntertainmentCulture => ENTERTAINMENT_DEALS,
        Pillar::ShoppingRetail => SHOPPING_DEALS,
        Pillar::HealthWellness => HEALTH_DEALS,
        Pillar::HomeLiving => HOME_DEALS,
        Pillar::Transportation => TRANSPORTATION_DEALS,
        Pillar::Other => OTHER_DEALS,
    }
}

/// Pick deals for the profile's top pillars, in pillar rank order
///
/// A profile with no spending gets the catch-all deals.
pub fn select_deals(profile: &SpendingProfile, limit: usize) -> Vec<&'static Deal> {
    let pillars: Vec<Pillar> = if profile.top_pillars.is_empty() {
        vec![Pillar::Other]
    } else {
        profile.top_pillars.iter().map(|p| p.pillar).collect()
    };

    pillars
        .into_iter()
        .flat_map(deals_for)
        .take(limit)
        .collect()
}

/// A deal with the copy to display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonalizedDeal {
    pub deal: Deal,
    pub message: String,
    pub cta: String,
    /// Whether the copy came from the personalization service
    pub personalized: bool,
}

impl PersonalizedDeal {
    fn catalog(deal: &Deal) -> Self {
        Self {
            deal: deal.clone(),
            message: deal.message.to_string(),
            cta: deal.cta.to_string(),
            personalized: false,
        }
    }
}

/// Personalized deals plus a notice when the service could not be used
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonalizationOutcome {
    pub deals: Vec<PersonalizedDeal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

/// Ask the text-generation service to reword deals for this profile
///
/// Without a client every deal keeps its catalog copy. When the call fails
/// the deals also keep their catalog copy and the outcome carries a notice.
pub async fn personalize_deals(
    ai: Option<&AIClient>,
    deals: &[&Deal],
    profile: &SpendingProfile,
) -> PersonalizationOutcome {
    let defaults = || -> Vec<PersonalizedDeal> {
        deals.iter().map(|d| PersonalizedDeal::catalog(d)).collect()
    };

    let Some(client) = ai else {
        return PersonalizationOutcome {
            deals: defaults(),
            notice: None,
        };
    };
    if deals.is_empty() {
        return PersonalizationOutcome {
            deals: Vec::new(),
            notice: None,
        };
    }

    let payload: Vec<DealPayload> = deals.iter().map(|d| d.payload()).collect();
    match client.personalize_deals(&payload, &profile.slim()).await {
        Ok(messages) => {
            let deals: Vec<PersonalizedDeal> = deals
                .iter()
                .map(|d| match messages.get(d.id) {
                    Some(m) if !m.message.trim().is_empty() => PersonalizedDeal {
                        deal: (*d).clone(),
                        message: m.message.trim().to_string(),
                        cta: if m.cta.trim().is_empty() {
                            d.cta.to_string()
                        } else {
                            m.cta.trim().to_string()
                        },
                        personalized: true,
                    },
                    _ => PersonalizedDeal::catalog(d),
                })
                .collect();
            debug!(
                "Personalized {}/{} deals",
                deals.iter().filter(|d| d.personalized).count(),
                deals.len()
            );
            PersonalizationOutcome {
                deals,
                notice: None,
            }
        }
        Err(e) => {
            warn!(host = %client.host(), "Deal personalization failed: {}", e);
            PersonalizationOutcome {
                deals: defaults(),
                notice: Some(format!(
                    "Personalized messages are unavailable right now ({}); showing standard offers.",
                    e
                )),
            }
        }
    }
}
