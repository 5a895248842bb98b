// Master hotel catalogue
// An agency's reusable hotel list; itineraries pick from it.

use crate::compressor::{CompressionError, ImageCompressor};
use crate::model::{generate_id, Hotel};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Hotel not found: {0}")]
    NotFound(String),

    #[error("Image error: {0}")]
    ImageError(#[from] CompressionError),
}

#[derive(Debug, Clone, Default)]
pub struct HotelFilter {
    pub category: Option<String>,
    pub min_stars: Option<u8>,
    pub name_contains: Option<String>,
    pub amenity: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct HotelCatalog {
    hotels: Vec<Hotel>,
}

impl HotelCatalog {
    pub fn new(hotels: Vec<Hotel>) -> Self {
        Self { hotels }
    }

    // Blank entry for the editor, filed under the first known region
    pub fn blank_hotel(locations: &[String]) -> Hotel {
        Hotel {
            id: generate_id("hotel"),
            stars: 3,
            category: locations.first().cloned().unwrap_or_default(),
            ..Default::default()
        }
    }

    pub fn list(&self) -> &[Hotel] {
        &self.hotels
    }

    pub fn into_hotels(self) -> Vec<Hotel> {
        self.hotels
    }

    pub fn get(&self, id: &str) -> Option<&Hotel> {
        self.hotels.iter().find(|h| h.id == id)
    }

    pub fn len(&self) -> usize {
        self.hotels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hotels.is_empty()
    }

    /// Inserts or replaces a hotel by id. Name and category are mandatory.
    /// Returns true when an existing entry was replaced.
    pub fn save(&mut self, hotel: Hotel) -> Result<bool, CatalogError> {
        if hotel.name.trim().is_empty() {
            return Err(CatalogError::MissingField("name"));
        }
        if hotel.category.trim().is_empty() {
            return Err(CatalogError::MissingField("category"));
        }

        if let Some(existing) = self.hotels.iter_mut().find(|h| h.id == hotel.id) {
            debug!(id = %hotel.id, "updating hotel");
            *existing = hotel;
            Ok(true)
        } else {
            info!(id = %hotel.id, name = %hotel.name, "adding hotel to catalogue");
            self.hotels.push(hotel);
            Ok(false)
        }
    }

    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.hotels.len();
        self.hotels.retain(|h| h.id != id);
        self.hotels.len() != before
    }

    // Whole-list overwrite, as the persistence API stores hotels
    pub fn replace_all(&mut self, hotels: Vec<Hotel>) {
        self.hotels = hotels;
    }

    pub fn add_amenity(&mut self, id: &str, amenity: &str) -> Result<bool, CatalogError> {
        let hotel = self.hotel_mut(id)?;

        let amenity = amenity.trim();
        if amenity.is_empty() || hotel.amenities.iter().any(|a| a == amenity) {
            return Ok(false);
        }
        hotel.amenities.push(amenity.to_string());
        Ok(true)
    }

    // Adds the amenity, or removes it when the hotel already lists it.
    // Returns whether the hotel now has it.
    pub fn toggle_amenity(&mut self, id: &str, amenity: &str) -> Result<bool, CatalogError> {
        let hotel = self.hotel_mut(id)?;
        if let Some(pos) = hotel.amenities.iter().position(|a| a == amenity) {
            hotel.amenities.remove(pos);
            Ok(false)
        } else {
            hotel.amenities.push(amenity.to_string());
            Ok(true)
        }
    }

    pub fn remove_amenity(&mut self, id: &str, index: usize) -> Result<Option<String>, CatalogError> {
        let hotel = self.hotel_mut(id)?;
        Ok((index < hotel.amenities.len()).then(|| hotel.amenities.remove(index)))
    }

    // Uploaded photos are compressed before they are attached
    pub fn add_photo(
        &mut self,
        id: &str,
        data_url: &str,
        compressor: &ImageCompressor,
    ) -> Result<(), CatalogError> {
        let hotel = self.hotel_mut(id)?;

        let compressed = compressor.compress_data_url(data_url)?;
        hotel.images.push(compressed);
        Ok(())
    }

    pub fn remove_photo(&mut self, id: &str, index: usize) -> Result<bool, CatalogError> {
        let hotel = self.hotel_mut(id)?;

        if index < hotel.images.len() {
            hotel.images.remove(index);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    // The first photo is the hotel's cover; moves the chosen one to the front
    pub fn set_cover_photo(&mut self, id: &str, index: usize) -> Result<bool, CatalogError> {
        let hotel = self.hotel_mut(id)?;
        if index >= hotel.images.len() {
            return Ok(false);
        }
        let photo = hotel.images.remove(index);
        hotel.images.insert(0, photo);
        debug!(id, index, "photo set as cover");
        Ok(true)
    }

    fn hotel_mut(&mut self, id: &str) -> Result<&mut Hotel, CatalogError> {
        self.hotels
            .iter_mut()
            .find(|h| h.id == id)
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))
    }

    // Hotels that match every criterion that is set
    pub fn filter(&self, criteria: &HotelFilter) -> Vec<Hotel> {
        let mut filtered = Vec::new();

        for hotel in &self.hotels {
            if !criteria
                .category
                .as_ref()
                .map_or(true, |category| hotel.category.eq_ignore_ascii_case(category))
            {
                continue;
            }

            if !criteria.min_stars.map_or(true, |min| hotel.stars >= min) {
                continue;
            }

            if !criteria.name_contains.as_ref().map_or(true, |needle| {
                hotel.name.to_lowercase().contains(&needle.to_lowercase())
            }) {
                continue;
            }

            if !criteria.amenity.as_ref().map_or(true, |amenity| {
                hotel.amenities.iter().any(|a| a.eq_ignore_ascii_case(amenity))
            }) {
                continue;
            }

            filtered.push(hotel.clone());
        }

        filtered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::STANDARD, Engine};
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;
    use test_case::test_case;

    fn hotel(id: &str, name: &str, category: &str, stars: u8, amenities: &[&str]) -> Hotel {
        Hotel {
            id: id.to_string(),
            name: name.to_string(),
            location: String::new(),
            stars,
            amenities: amenities.iter().map(|a| a.to_string()).collect(),
            images: Vec::new(),
            category: category.to_string(),
        }
    }

    fn sample_catalog() -> HotelCatalog {
        HotelCatalog::new(vec![
            hotel("h1", "Hotel Grand Reyan", "Srinagar", 3, &["Wi-Fi", "Mineral Water"]),
            hotel("p1", "Hotel Indus Resort", "Pahalgam", 4, &["Bonfire", "Wi-Fi"]),
            hotel("g1", "Gulmarg Hill Lodge", "Gulmarg", 5, &["Heated Rooms"]),
        ])
    }

    #[test_case(HotelFilter { category: Some("srinagar".to_string()), ..Default::default() },
        vec!["h1"]; "#1 Filter by category")]
    #[test_case(HotelFilter { min_stars: Some(4), ..Default::default() },
        vec!["p1", "g1"]; "#2 Filter by stars")]
    #[test_case(HotelFilter { name_contains: Some("RESORT".to_string()), ..Default::default() },
        vec!["p1"]; "#3 Filter by name")]
    #[test_case(HotelFilter { amenity: Some("wi-fi".to_string()), ..Default::default() },
        vec!["h1", "p1"]; "#4 Filter by amenity")]
    #[test_case(HotelFilter { min_stars: Some(4), amenity: Some("Wi-Fi".to_string()), ..Default::default() },
        vec!["p1"]; "#5 Combined filters")]
    #[test_case(HotelFilter::default(), vec!["h1", "p1", "g1"]; "#6 No filters")]
    fn test_filter(criteria: HotelFilter, expected_ids: Vec<&str>) {
        let results = sample_catalog().filter(&criteria);
        let ids: Vec<&str> = results.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, expected_ids);
    }

    #[test]
    fn test_save_requires_name_and_category() {
        let mut catalog = HotelCatalog::default();

        let unnamed = hotel("x", "  ", "Srinagar", 3, &[]);
        assert!(matches!(catalog.save(unnamed), Err(CatalogError::MissingField("name"))));

        let uncategorised = hotel("x", "Lake View", "", 3, &[]);
        assert!(matches!(
            catalog.save(uncategorised),
            Err(CatalogError::MissingField("category"))
        ));
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_save_upserts_by_id() {
        let mut catalog = sample_catalog();

        assert!(!catalog.save(hotel("s1", "Sonmarg Glacier Inn", "Sonmarg", 3, &[])).unwrap());
        assert_eq!(catalog.len(), 4);

        assert!(catalog.save(hotel("h1", "Grand Reyan Deluxe", "Srinagar", 4, &[])).unwrap());
        assert_eq!(catalog.len(), 4);
        assert_eq!(catalog.get("h1").unwrap().name, "Grand Reyan Deluxe");
    }

    #[test]
    fn test_delete_and_replace() {
        let mut catalog = sample_catalog();
        assert!(catalog.delete("p1"));
        assert!(!catalog.delete("p1"));
        assert_eq!(catalog.len(), 2);

        catalog.replace_all(vec![hotel("n1", "New", "Delhi", 2, &[])]);
        assert_eq!(catalog.list().len(), 1);
    }

    #[test]
    fn test_blank_hotel_uses_first_location() {
        let blank = HotelCatalog::blank_hotel(&["Srinagar".to_string(), "Delhi".to_string()]);
        assert_eq!(blank.category, "Srinagar");
        assert_eq!(blank.stars, 3);
        assert!(blank.id.starts_with("hotel_"));
    }

    #[test]
    fn test_amenities() {
        let mut catalog = sample_catalog();
        assert!(catalog.add_amenity("g1", "Wi-Fi").unwrap());
        assert!(!catalog.add_amenity("g1", "Wi-Fi").unwrap());
        assert!(!catalog.add_amenity("g1", " ").unwrap());
        assert!(matches!(
            catalog.add_amenity("missing", "Spa"),
            Err(CatalogError::NotFound(_))
        ));
    }

    #[test_case("Bonfire", false, vec!["Wi-Fi"]; "#1 Listed amenity is removed")]
    #[test_case("Spa", true, vec!["Bonfire", "Wi-Fi", "Spa"]; "#2 New amenity is added")]
    #[test_case("bonfire", true, vec!["Bonfire", "Wi-Fi", "bonfire"]; "#3 Match is exact")]
    fn test_toggle_amenity(amenity: &str, now_listed: bool, expected: Vec<&str>) {
        let mut catalog = sample_catalog();
        assert_eq!(catalog.toggle_amenity("p1", amenity).unwrap(), now_listed);
        assert_eq!(catalog.get("p1").unwrap().amenities, expected);
    }

    #[test_case(0, Some("Bonfire"), vec!["Wi-Fi"]; "#1 First amenity")]
    #[test_case(1, Some("Wi-Fi"), vec!["Bonfire"]; "#2 Last amenity")]
    #[test_case(2, None, vec!["Bonfire", "Wi-Fi"]; "#3 Out of range")]
    fn test_remove_amenity(index: usize, removed: Option<&str>, expected: Vec<&str>) {
        let mut catalog = sample_catalog();
        assert_eq!(catalog.remove_amenity("p1", index).unwrap().as_deref(), removed);
        assert_eq!(catalog.get("p1").unwrap().amenities, expected);
    }

    #[test_case(2, true, vec!["c", "a", "b", "d"]; "#1 Moves photo to the front")]
    #[test_case(0, true, vec!["a", "b", "c", "d"]; "#2 Cover stays cover")]
    #[test_case(3, true, vec!["d", "a", "b", "c"]; "#3 Last photo")]
    #[test_case(4, false, vec!["a", "b", "c", "d"]; "#4 Out of range")]
    fn test_set_cover_photo(index: usize, moved: bool, expected: Vec<&str>) {
        let mut catalog = sample_catalog();
        let mut gallery = catalog.get("h1").unwrap().clone();
        gallery.images = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        catalog.save(gallery).unwrap();

        assert_eq!(catalog.set_cover_photo("h1", index).unwrap(), moved);
        assert_eq!(catalog.get("h1").unwrap().images, expected);
    }

    #[test]
    fn test_editing_unknown_hotel() {
        let mut catalog = sample_catalog();
        assert!(matches!(
            catalog.toggle_amenity("missing", "Spa"),
            Err(CatalogError::NotFound(_))
        ));
        assert!(matches!(
            catalog.remove_amenity("missing", 0),
            Err(CatalogError::NotFound(_))
        ));
        assert!(matches!(
            catalog.set_cover_photo("missing", 0),
            Err(CatalogError::NotFound(_))
        ));
    }

    #[test]
    fn test_photos_are_compressed() {
        let image = RgbImage::from_fn(1600, 1200, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 40]));
        let mut png = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(image)
            .write_to(&mut png, ImageFormat::Png)
            .unwrap();
        let data_url = format!("data:image/png;base64,{}", STANDARD.encode(png.into_inner()));

        let mut catalog = sample_catalog();
        let compressor = ImageCompressor::default();
        catalog.add_photo("h1", &data_url, &compressor).unwrap();

        let stored = &catalog.get("h1").unwrap().images[0];
        assert!(stored.starts_with("data:image/jpeg;base64,"));

        assert!(matches!(
            catalog.add_photo("h1", "garbage", &compressor),
            Err(CatalogError::ImageError(_))
        ));
        assert!(catalog.remove_photo("h1", 0).unwrap());
        assert!(!catalog.remove_photo("h1", 0).unwrap());
    }
}
