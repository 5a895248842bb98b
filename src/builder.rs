// Itinerary builder
// Editing operations behind the form wizard. Every pricing edit goes through the
// reconciler so the derived traveller count and total never drift from the inputs.

use crate::compressor::{CompressionError, ImageCompressor};
use crate::model::{generate_id, Branding, DayPlan, Hotel, ItineraryData, ItineraryHotel};
use crate::pricing::{CostInputs, PricingReconciler, Reconciliation};
use crate::schedule::{clear_travel_window, day_label, TravelWindow};
use tracing::debug;

// Free-text lists of an itinerary that accept new entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListField {
    Inclusions,
    Exclusions,
    SupplementCosts,
    Terms,
    CancellationPolicy,
}

pub struct ItineraryBuilder {
    itinerary: ItineraryData,
    reconciler: PricingReconciler,
    window: Option<TravelWindow>,
}

impl ItineraryBuilder {
    // Reconciles once up front so a loaded document starts consistent
    pub fn new(itinerary: ItineraryData, reconciler: PricingReconciler) -> Self {
        let mut builder = Self {
            itinerary,
            reconciler,
            window: None,
        };
        builder.reconciler.reconcile(&mut builder.itinerary.pricing);
        builder
    }

    pub fn itinerary(&self) -> &ItineraryData {
        &self.itinerary
    }

    pub fn into_itinerary(self) -> ItineraryData {
        self.itinerary
    }

    pub fn update_pricing<F>(&mut self, edit: F) -> Reconciliation
    where
        F: FnOnce(&mut CostInputs),
    {
        edit(&mut self.itinerary.pricing);
        self.reconciler.reconcile(&mut self.itinerary.pricing)
    }

    // A manual total; only survives while the derived subtotal is zero
    pub fn set_total_cost(&mut self, total: &str) -> Reconciliation {
        self.update_pricing(|pricing| pricing.total_cost = total.to_string())
    }

    pub fn set_travel_window(&mut self, window: Option<TravelWindow>) {
        match window {
            Some(window) => window.apply_to(&mut self.itinerary),
            None => clear_travel_window(&mut self.itinerary),
        }
        self.window = window;
    }

    pub fn day_labels(&self) -> Vec<String> {
        let start = self.window.map(|w| w.start);
        self.itinerary
            .days
            .iter()
            .enumerate()
            .map(|(index, day)| day_label(index, day.date.as_deref(), start))
            .collect()
    }

    // Returns true when the hotel is selected after the call
    pub fn toggle_hotel(&mut self, hotel: &Hotel) -> bool {
        let selected = &mut self.itinerary.selected_hotels;
        if let Some(pos) = selected.iter().position(|h| h.hotel.id == hotel.id) {
            selected.remove(pos);
            false
        } else {
            selected.push(ItineraryHotel {
                hotel: hotel.clone(),
                is_selected: true,
            });
            true
        }
    }

    pub fn add_list_entry(&mut self, field: ListField, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }

        let list = match field {
            ListField::Inclusions => &mut self.itinerary.inclusions,
            ListField::Exclusions => &mut self.itinerary.exclusions,
            ListField::SupplementCosts => &mut self.itinerary.supplement_costs,
            ListField::Terms => &mut self.itinerary.terms,
            ListField::CancellationPolicy => &mut self.itinerary.cancellation_policy,
        };
        list.push(text.to_string());
        true
    }

    pub fn add_day(&mut self, title: &str) -> String {
        let id = generate_id(&format!("day_{}", self.itinerary.days.len() + 1));
        self.itinerary.days.push(DayPlan {
            id: id.clone(),
            title: title.to_string(),
            distance: Some(String::new()),
            travel_time: Some(String::new()),
            ..Default::default()
        });
        id
    }

    pub fn remove_day(&mut self, day_id: &str) -> bool {
        let before = self.itinerary.days.len();
        self.itinerary.days.retain(|d| d.id != day_id);
        self.itinerary.days.len() != before
    }

    /// Copies a saved template into a day. Unknown day or template ids leave the
    /// plan untouched.
    pub fn load_day_template(&mut self, branding: &Branding, day_id: &str, template_id: &str) -> bool {
        let Some(template) = branding.day_template(template_id) else {
            return false;
        };
        let Some(day) = self.itinerary.days.iter_mut().find(|d| d.id == day_id) else {
            return false;
        };

        day.title = template.title.clone();
        day.description = template.description.clone();
        day.distance = Some(template.distance.clone().unwrap_or_default());
        day.travel_time = Some(template.travel_time.clone().unwrap_or_default());
        debug!(day_id, template_id, "loaded day template");
        true
    }

    // Replaces the marketing overview with a saved one's content
    pub fn load_overview(&mut self, branding: &Branding, index: usize) -> bool {
        let Some(saved) = branding.overview(index) else {
            return false;
        };
        self.itinerary.overview = saved.content.clone();
        debug!(index, title = %saved.title, "loaded overview");
        true
    }

    pub fn set_cover_image(&mut self, index: usize, data_url: String) -> bool {
        match self.itinerary.cover_images.get_mut(index) {
            Some(slot) => {
                *slot = data_url;
                true
            }
            None => false,
        }
    }

    // Compresses an uploaded cover photo before storing it in its slot
    pub fn upload_cover_image(
        &mut self,
        index: usize,
        data_url: &str,
        compressor: &ImageCompressor,
    ) -> Result<bool, CompressionError> {
        if index >= self.itinerary.cover_images.len() {
            return Ok(false);
        }
        let compressed = compressor.compress_data_url(data_url)?;
        Ok(self.set_cover_image(index, compressed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PRICE_ON_REQUEST;
    use chrono::NaiveDate;
    use test_case::test_case;

    fn builder() -> ItineraryBuilder {
        let draft = ItineraryData::draft(&Branding::default(), "it-1");
        ItineraryBuilder::new(draft, PricingReconciler::default())
    }

    fn hotel(id: &str) -> Hotel {
        Hotel {
            id: id.to_string(),
            name: format!("Hotel {}", id),
            category: "Srinagar".to_string(),
            stars: 3,
            ..Default::default()
        }
    }

    #[test]
    fn test_pricing_edits_reconcile() {
        let mut builder = builder();
        assert_eq!(builder.itinerary().pricing.total_cost, PRICE_ON_REQUEST);

        builder.update_pricing(|p| p.adult_count = 2);
        assert_eq!(builder.itinerary().pricing.total_travelers, 2);
        assert_eq!(builder.itinerary().pricing.total_cost, PRICE_ON_REQUEST);

        builder.update_pricing(|p| p.per_adult_price = "18,500/-".to_string());
        assert_eq!(builder.itinerary().pricing.total_cost, "37,000/-");

        // Derived total wins over a manual edit while prices are filled in
        builder.set_total_cost("Special offer");
        assert_eq!(builder.itinerary().pricing.total_cost, "37,000/-");

        builder.update_pricing(|p| p.per_adult_price.clear());
        builder.set_total_cost("Special offer");
        assert_eq!(builder.itinerary().pricing.total_cost, "Special offer");
    }

    #[test]
    fn test_loaded_document_is_reconciled() {
        let mut itinerary = ItineraryData::default();
        itinerary.pricing.adult_count = 3;
        itinerary.pricing.child_count = 1;

        let builder = ItineraryBuilder::new(itinerary, PricingReconciler::default());
        assert_eq!(builder.itinerary().pricing.total_travelers, 4);
    }

    #[test]
    fn test_toggle_hotel() {
        let mut builder = builder();
        assert!(builder.toggle_hotel(&hotel("h1")));
        assert!(builder.toggle_hotel(&hotel("h2")));
        assert_eq!(builder.itinerary().selected_hotels.len(), 2);
        assert!(builder.itinerary().selected_hotels[0].is_selected);

        assert!(!builder.toggle_hotel(&hotel("h1")));
        assert_eq!(builder.itinerary().selected_hotels.len(), 1);
        assert_eq!(builder.itinerary().selected_hotels[0].hotel.id, "h2");
    }

    #[test]
    fn test_list_entries() {
        let mut builder = builder();
        assert!(!builder.add_list_entry(ListField::Inclusions, "   "));
        assert!(builder.add_list_entry(ListField::Inclusions, "Daily breakfast"));
        assert!(builder.add_list_entry(ListField::SupplementCosts, "Innova upgrade: 1,500/-"));
        assert_eq!(builder.itinerary().inclusions, vec!["Daily breakfast".to_string()]);
        assert_eq!(builder.itinerary().supplement_costs.len(), 1);
    }

    #[test]
    fn test_day_templates() {
        let mut branding = Branding::default();
        let template_id = branding
            .add_day_template("Gulmarg Excursion", "Gondola ride", Some("52 km"), Some("2 hours"))
            .unwrap();

        let mut builder = builder();
        let day_id = builder.itinerary().days[0].id.clone();

        assert!(!builder.load_day_template(&branding, &day_id, "missing"));
        assert!(!builder.load_day_template(&branding, "missing", &template_id));
        assert!(builder.load_day_template(&branding, &day_id, &template_id));

        let day = &builder.itinerary().days[0];
        assert_eq!(day.title, "Gulmarg Excursion");
        assert_eq!(day.distance.as_deref(), Some("52 km"));
        assert_eq!(day.travel_time.as_deref(), Some("2 hours"));
    }

    #[test_case(0, true, "Paradise on Earth"; "#1 First overview")]
    #[test_case(1, true, "Houseboats and gardens"; "#2 Second overview")]
    #[test_case(2, false, "Hand-written intro"; "#3 Unknown index keeps text")]
    fn test_load_overview(index: usize, loaded: bool, expected: &str) {
        let mut branding = Branding::default();
        branding.add_overview("Kashmir", "Paradise on Earth");
        branding.add_overview("Srinagar", "Houseboats and gardens");

        let mut builder = builder();
        builder.itinerary.overview = "Hand-written intro".to_string();

        assert_eq!(builder.load_overview(&branding, index), loaded);
        assert_eq!(builder.itinerary().overview, expected);
    }

    #[test]
    fn test_days_and_labels() {
        let mut builder = builder();
        let second = builder.add_day("Sonmarg");
        builder.add_day("Departure");
        assert_eq!(builder.day_labels(), vec!["Day 01", "Day 02", "Day 03"]);

        let start = NaiveDate::from_ymd_opt(2025, 12, 24).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 12, 26).unwrap();
        builder.set_travel_window(Some(TravelWindow::new(start, end)));
        assert_eq!(builder.itinerary().duration, "2N / 3D");
        assert_eq!(builder.day_labels(), vec!["24 Dec", "25 Dec", "26 Dec"]);

        assert!(builder.remove_day(&second));
        assert!(!builder.remove_day(&second));
        assert_eq!(builder.itinerary().days.len(), 2);

        builder.set_travel_window(None);
        assert!(builder.itinerary().travel_dates.is_empty());
        assert_eq!(builder.day_labels(), vec!["Day 01", "Day 02"]);
    }

    #[test]
    fn test_cover_slots() {
        let mut builder = builder();
        assert!(builder.set_cover_image(3, "https://example.com/cover.jpg".to_string()));
        assert!(!builder.set_cover_image(4, "out of range".to_string()));

        let compressor = ImageCompressor::default();
        assert!(builder
            .upload_cover_image(0, "not a data url", &compressor)
            .is_err());
        assert_eq!(builder.upload_cover_image(9, "ignored", &compressor).unwrap(), false);
    }
}
