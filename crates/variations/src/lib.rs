//! Product variations domain module.
//!
//! Owns the variations of a product being edited and derives the price
//! variant matrix (one row per option combination) from them. Implemented
//! purely as deterministic domain logic (no IO, no HTTP, no storage); remote
//! collaborators are reached through the [`cleanup::ImageStore`] trait and the
//! payload types in [`payload`].

pub mod cleanup;
pub mod command;
pub mod config;
pub mod matrix;
pub mod payload;
pub mod price_variant;
pub mod variation;

pub use cleanup::{CleanupReport, FailedDeletion, ImageStore, ImageStoreError};
pub use command::{CommandOutcome, VariationCommand};
pub use config::MatrixConfig;
pub use matrix::VariationMatrix;
pub use payload::{
    BasePricing, OptionPayload, PersistedOption, PersistedPriceVariant, PersistedProduct,
    PersistedVariation, PriceVariantPayload, PricingPayload, ProductVariationsPayload, SavedIds,
    VariationPayload,
};
pub use price_variant::{CombinationKey, PriceVariantItem, PriceVariantUpdate};
pub use variation::{OptionUpdate, Variation, VariationOption, VariationUpdate};
