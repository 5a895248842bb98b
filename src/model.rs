// Itinerary documents as stored by the persistence API
// Field names on the wire are camelCase, matching the JSON blobs kept per user.

use crate::pricing::CostInputs;
use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};

// Ids are opaque strings; time-based with a random tail so drafts created in the
// same millisecond do not collide
pub fn generate_id(prefix: &str) -> String {
    let suffix: u16 = rand::thread_rng().gen();
    format!("{}_{}_{:04x}", prefix, Utc::now().timestamp_millis(), suffix)
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DayPlan {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub travel_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Hotel {
    pub id: String,
    pub name: String,
    pub location: String,
    pub stars: u8,
    pub amenities: Vec<String>,
    // Data URLs of compressed photos, or remote URLs
    pub images: Vec<String>,
    // Region the hotel is filed under, one of `Branding::locations`
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryHotel {
    #[serde(flatten)]
    pub hotel: Hotel,
    #[serde(default)]
    pub is_selected: bool,
}

// Reusable day plan kept in the branding library
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DayTemplate {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub travel_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OverviewTemplate {
    pub title: String,
    pub content: String,
}

/// Per-agency branding and master content.
///
/// Colours feed the document renderer; terms and cancellation policy are copied into
/// every new itinerary; day templates and overviews are the reusable text library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Branding {
    pub logo_url: String,
    pub primary_color: String,
    pub secondary_color: String,
    pub accent_color: String,
    pub heading_color: String,
    pub sub_heading_color: String,
    pub text_color: String,
    pub icon_color: String,
    pub explore_text_color: String,
    pub destination_text_color: String,
    pub banner_bg_color: String,
    pub banner_text_color: String,
    pub banner_border_color: String,
    pub highlight_text_color: String,
    pub badge_bg_color: String,
    pub badge_text_color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overview_title_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overview_text_color: Option<String>,

    pub company_name: String,
    pub office_locations: Vec<String>,
    pub phone: String,
    pub whatsapp: String,
    pub helpline: String,
    pub website: String,
    pub locations: Vec<String>,
    pub package_categories: Vec<String>,

    pub terms: Vec<String>,
    pub cancellation_policy: Vec<String>,
    pub saved_day_templates: Vec<DayTemplate>,
    pub saved_overviews: Vec<OverviewTemplate>,
}

impl Default for Branding {
    fn default() -> Self {
        Self {
            logo_url: String::new(),
            primary_color: "#D31A1A".to_string(),
            secondary_color: "#300000".to_string(),
            accent_color: "#fbbf24".to_string(),
            heading_color: "#FFFFFF".to_string(),
            sub_heading_color: "#000000".to_string(),
            text_color: "#111111".to_string(),
            icon_color: "#D31A1A".to_string(),
            explore_text_color: "#FFD700".to_string(),
            destination_text_color: "#FFFFFF".to_string(),
            banner_bg_color: "#4a0404".to_string(),
            banner_text_color: "#FFFFFF".to_string(),
            banner_border_color: "#FFD700".to_string(),
            highlight_text_color: "#D31A1A".to_string(),
            badge_bg_color: "#D31A1A".to_string(),
            badge_text_color: "#FFFFFF".to_string(),
            overview_title_color: None,
            overview_text_color: None,
            company_name: String::new(),
            office_locations: Vec::new(),
            phone: String::new(),
            whatsapp: String::new(),
            helpline: String::new(),
            website: String::new(),
            locations: Vec::new(),
            package_categories: Vec::new(),
            terms: Vec::new(),
            cancellation_policy: Vec::new(),
            saved_day_templates: Vec::new(),
            saved_overviews: Vec::new(),
        }
    }
}

impl Branding {
    // Blank entries are ignored, returns whether anything was added
    pub fn add_location(&mut self, location: &str) -> bool {
        push_trimmed(&mut self.locations, location)
    }

    pub fn add_office_location(&mut self, address: &str) -> bool {
        push_trimmed(&mut self.office_locations, address)
    }

    pub fn add_package_category(&mut self, category: &str) -> bool {
        push_trimmed(&mut self.package_categories, category)
    }

    pub fn add_term(&mut self, term: &str) -> bool {
        push_trimmed(&mut self.terms, term)
    }

    pub fn add_cancellation_rule(&mut self, rule: &str) -> bool {
        push_trimmed(&mut self.cancellation_policy, rule)
    }

    // Saves a day template and returns its id; a blank title is rejected
    pub fn add_day_template(
        &mut self,
        title: &str,
        description: &str,
        distance: Option<&str>,
        travel_time: Option<&str>,
    ) -> Option<String> {
        let title = title.trim();
        if title.is_empty() {
            return None;
        }

        let id = generate_id("tpl");
        self.saved_day_templates.push(DayTemplate {
            id: id.clone(),
            title: title.to_string(),
            description: description.trim().to_string(),
            distance: distance.map(str::to_string),
            travel_time: travel_time.map(str::to_string),
        });
        Some(id)
    }

    pub fn remove_day_template(&mut self, id: &str) -> bool {
        let before = self.saved_day_templates.len();
        self.saved_day_templates.retain(|t| t.id != id);
        self.saved_day_templates.len() != before
    }

    pub fn day_template(&self, id: &str) -> Option<&DayTemplate> {
        self.saved_day_templates.iter().find(|t| t.id == id)
    }

    // Both title and content are required
    pub fn add_overview(&mut self, title: &str, content: &str) -> bool {
        let (title, content) = (title.trim(), content.trim());
        if title.is_empty() || content.is_empty() {
            return false;
        }
        self.saved_overviews.push(OverviewTemplate {
            title: title.to_string(),
            content: content.to_string(),
        });
        true
    }

    pub fn overview(&self, index: usize) -> Option<&OverviewTemplate> {
        self.saved_overviews.get(index)
    }

    pub fn remove_overview(&mut self, index: usize) -> Option<OverviewTemplate> {
        (index < self.saved_overviews.len()).then(|| self.saved_overviews.remove(index))
    }
}

fn push_trimmed(list: &mut Vec<String>, entry: &str) -> bool {
    let entry = entry.trim();
    if entry.is_empty() {
        return false;
    }
    list.push(entry.to_string());
    true
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ItineraryData {
    pub id: String,
    pub client_name: String,
    pub package_name: String,
    pub destinations: String,
    pub duration: String,
    pub package_type: String,
    pub travel_dates: String,
    pub overview: String,
    pub cover_images: Vec<String>,
    pub days: Vec<DayPlan>,
    pub selected_hotels: Vec<ItineraryHotel>,
    pub pricing: CostInputs,
    pub inclusions: Vec<String>,
    pub exclusions: Vec<String>,
    pub supplement_costs: Vec<String>,
    pub terms: Vec<String>,
    pub cancellation_policy: Vec<String>,
}

pub const COVER_IMAGE_SLOTS: usize = 4;
pub const PRICE_ON_REQUEST: &str = "Price on Request";
pub const DEFAULT_PACKAGE_TYPE: &str = "Standard Package";

impl ItineraryData {
    /// A fresh itinerary for the builder, seeded from the agency's branding.
    pub fn draft(branding: &Branding, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            package_type: branding
                .package_categories
                .first()
                .cloned()
                .unwrap_or_else(|| DEFAULT_PACKAGE_TYPE.to_string()),
            cover_images: vec![String::new(); COVER_IMAGE_SLOTS],
            days: vec![DayPlan {
                id: generate_id("day_1"),
                title: "Arrival".to_string(),
                distance: Some(String::new()),
                travel_time: Some(String::new()),
                ..Default::default()
            }],
            pricing: CostInputs {
                total_cost: PRICE_ON_REQUEST.to_string(),
                ..Default::default()
            },
            terms: branding.terms.clone(),
            cancellation_policy: branding.cancellation_policy.clone(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agency() -> Branding {
        Branding {
            company_name: "Valley Trails".to_string(),
            package_categories: vec!["Silver".to_string(), "Gold".to_string()],
            terms: vec!["50% advance payment required".to_string()],
            cancellation_policy: vec!["Within 7 days: no refund".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_draft_seeds_from_branding() {
        let draft = ItineraryData::draft(&agency(), "it-1");

        assert_eq!(draft.id, "it-1");
        assert_eq!(draft.package_type, "Silver");
        assert_eq!(draft.cover_images.len(), COVER_IMAGE_SLOTS);
        assert_eq!(draft.days.len(), 1);
        assert_eq!(draft.days[0].title, "Arrival");
        assert_eq!(draft.pricing.total_cost, PRICE_ON_REQUEST);
        assert_eq!(draft.pricing.total_travelers, 0);
        assert_eq!(draft.terms, agency().terms);
        assert_eq!(draft.cancellation_policy, agency().cancellation_policy);
    }

    #[test]
    fn test_draft_without_categories() {
        let draft = ItineraryData::draft(&Branding::default(), "it-2");
        assert_eq!(draft.package_type, DEFAULT_PACKAGE_TYPE);
    }

    #[test]
    fn test_itinerary_wire_format() {
        let json = r#"{
            "id": "kashmir-1",
            "clientName": "R. Sharma",
            "packageName": "MAGNIFICENT KASHMIR",
            "days": [{ "id": "d1", "title": "Arrival", "description": "", "travelTime": "45 mins" }],
            "selectedHotels": [{ "id": "h1", "name": "Grand Reyan", "stars": 3, "category": "Srinagar", "isSelected": true }],
            "pricing": { "adults": 2, "perAdultPrice": "18,500/-", "totalCost": "37,000/-", "totalPax": 2 }
        }"#;

        let itinerary: ItineraryData = serde_json::from_str(json).unwrap();
        assert_eq!(itinerary.client_name, "R. Sharma");
        assert_eq!(itinerary.days[0].travel_time.as_deref(), Some("45 mins"));
        assert_eq!(itinerary.selected_hotels[0].hotel.name, "Grand Reyan");
        assert!(itinerary.selected_hotels[0].is_selected);
        assert_eq!(itinerary.pricing.adult_count, 2);

        let value = serde_json::to_value(&itinerary).unwrap();
        assert_eq!(value["selectedHotels"][0]["category"], "Srinagar");
        assert_eq!(value["pricing"]["cnbCount"], 0);
        assert_eq!(value["pricing"]["totalPax"], 2);
        assert!(value["days"][0].get("date").is_none());
    }

    #[test]
    fn test_branding_library() {
        let mut branding = agency();

        assert!(!branding.add_location("   "));
        assert!(branding.add_location(" Gulmarg "));
        assert_eq!(branding.locations, vec!["Gulmarg".to_string()]);

        let id = branding
            .add_day_template("Gulmarg Excursion", "Gondola ride", Some("52 km"), None)
            .unwrap();
        assert_eq!(branding.day_template(&id).unwrap().distance.as_deref(), Some("52 km"));
        assert!(branding.add_day_template("", "no title", None, None).is_none());
        assert!(branding.remove_day_template(&id));
        assert!(!branding.remove_day_template(&id));

        assert!(!branding.add_office_location(""));
        assert!(branding.add_office_location(" Residency Road, Srinagar "));
        assert!(branding.add_office_location("Connaught Place, New Delhi"));
        assert_eq!(
            branding.office_locations,
            vec!["Residency Road, Srinagar".to_string(), "Connaught Place, New Delhi".to_string()]
        );

        assert!(!branding.add_overview("Welcome", "  "));
        assert!(branding.add_overview("Welcome", "Paradise on Earth"));
        assert_eq!(branding.overview(0).unwrap().content, "Paradise on Earth");
        assert!(branding.overview(1).is_none());
        assert_eq!(branding.remove_overview(0).unwrap().title, "Welcome");
        assert!(branding.remove_overview(0).is_none());
    }
}
