// Main library file for the itinerary studio core

// Export modules for each part of the itinerary builder
pub mod builder;
pub mod compressor;
pub mod config;
pub mod hotels;
pub mod model;
pub mod pricing;
pub mod schedule;
pub mod store;

// Re-export key types for convenience
pub use builder::{ItineraryBuilder, ListField};
pub use compressor::{
    scaled_dimensions, CompressionConfig, CompressionError, CompressionRequest, CompressionResult,
    ImageCompressor,
};
pub use config::{AppConfig, ConfigError};
pub use hotels::{CatalogError, HotelCatalog, HotelFilter};
pub use model::{Branding, DayPlan, DayTemplate, Hotel, ItineraryData, ItineraryHotel};
pub use pricing::{
    format_amount, parse_price, CostInputs, Grouping, PricingConfig, PricingReconciler,
    Reconciliation,
};
pub use schedule::TravelWindow;
pub use store::{DocumentStore, InMemoryStore, ResourceKind, StoreError, UserDocuments};
