//! Shapes exchanged with the persistence layer.
//!
//! The engine never talks to storage itself. On save, the caller asks for a
//! [`ProductVariationsPayload`]; after the store assigns ids it hands them back
//! as [`SavedIds`]; on reload it rebuilds the session from a
//! [`PersistedProduct`].

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use varmatrix_core::{
    DomainError, DomainResult, DraftId, OptionId, PersistedId, PriceVariantId, VariationId,
};

use crate::config::MatrixConfig;
use crate::matrix::VariationMatrix;
use crate::price_variant::{CombinationKey, PriceVariantItem};
use crate::variation::{Variation, VariationOption};

/// Flat price/stock used when the product has no variations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasePricing {
    pub base_price: Option<u64>,
    pub base_stock: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionPayload {
    pub id: OptionId,
    pub name: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariationPayload {
    pub id: VariationId,
    pub name: String,
    pub options: Vec<OptionPayload>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceVariantPayload {
    pub id: Option<PriceVariantId>,
    pub combination_key: CombinationKey,
    pub price: u64,
    pub stock: u32,
    pub sku: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum PricingPayload {
    Flat {
        #[serde(rename = "basePrice")]
        base_price: Option<u64>,
        #[serde(rename = "baseStock")]
        base_stock: Option<u32>,
    },
    Matrix {
        #[serde(rename = "priceVariants")]
        price_variants: Vec<PriceVariantPayload>,
    },
}

/// Everything the store needs to persist a product's variations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariationsPayload {
    pub has_variations: bool,
    pub variations: Vec<VariationPayload>,
    pub pricing: PricingPayload,
}

impl ProductVariationsPayload {
    pub fn price_variants(&self) -> &[PriceVariantPayload] {
        match &self.pricing {
            PricingPayload::Matrix { price_variants } => price_variants,
            PricingPayload::Flat { .. } => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedOption {
    pub id: String,
    pub name: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedVariation {
    pub id: String,
    pub name: String,
    pub options: Vec<PersistedOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedPriceVariant {
    pub id: String,
    pub combination_key: String,
    pub price: Option<u64>,
    pub stock: Option<u32>,
    pub sku: Option<String>,
}

/// A product's variations as read back from the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedProduct {
    pub has_variations: bool,
    pub variations: Vec<PersistedVariation>,
    pub price_variants: Vec<PersistedPriceVariant>,
}

/// Ids assigned by the store on save.
///
/// `price_variants` is keyed by the combination key *after* draft option ids
/// have been replaced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedIds {
    pub variations: BTreeMap<DraftId, PersistedId>,
    pub options: BTreeMap<DraftId, PersistedId>,
    pub price_variants: BTreeMap<CombinationKey, PriceVariantId>,
}

impl VariationMatrix {
    /// Rebuild an editing session from stored data.
    ///
    /// Stored rows whose key no longer matches a combination are dropped.
    pub fn from_persisted(config: MatrixConfig, product: PersistedProduct) -> DomainResult<Self> {
        let variations = product
            .variations
            .into_iter()
            .map(|v| {
                let options = v
                    .options
                    .into_iter()
                    .map(|o| {
                        Ok(VariationOption {
                            id: OptionId::persisted(o.id)?,
                            name: o.name,
                            image_url: o.image_url,
                        })
                    })
                    .collect::<DomainResult<Vec<_>>>()?;
                Ok(Variation {
                    id: VariationId::persisted(v.id)?,
                    name: v.name,
                    options,
                })
            })
            .collect::<DomainResult<Vec<_>>>()?;

        let mut stored: HashMap<CombinationKey, PersistedPriceVariant> = HashMap::new();
        for row in product.price_variants {
            let key = CombinationKey::from_raw(row.combination_key.clone());
            if stored.contains_key(&key) {
                return Err(DomainError::invariant(format!(
                    "combination key `{key}` is stored twice"
                )));
            }
            stored.insert(key, row);
        }

        let mut matrix = Self::from_variations(config, variations)?;

        let mut restored = 0usize;
        for item in matrix.price_variants_mut().iter_mut() {
            if let Some(row) = stored.remove(item.key()) {
                let id = PriceVariantId::new(row.id)?;
                *item = item
                    .clone()
                    .with_values(Some(id), row.price, row.stock, row.sku);
                restored += 1;
            }
        }

        if !product.has_variations {
            matrix.set_has_variations(false);
        }

        debug!(restored, stale = stored.len(), "restored price variants from store");
        Ok(matrix)
    }

    /// Project the session into the shape the store persists.
    ///
    /// Refused while a variation form is open or the matrix is out of date.
    /// Only complete rows (price and stock set) are included, and only the
    /// first variation's options carry images.
    pub fn save_payload(&self, base: BasePricing) -> DomainResult<ProductVariationsPayload> {
        if self.is_editing() {
            return Err(DomainError::conflict("finish editing variations before saving"));
        }

        if !self.has_variations() {
            return Ok(ProductVariationsPayload {
                has_variations: false,
                variations: Vec::new(),
                pricing: PricingPayload::Flat {
                    base_price: base.base_price,
                    base_stock: base.base_stock,
                },
            });
        }

        for (vi, variation) in self.variations().iter().enumerate() {
            if variation.name.trim().is_empty() {
                return Err(DomainError::validation(format!(
                    "variation {} needs a name",
                    vi + 1
                )));
            }
            if let Some(oi) = variation.options.iter().position(|o| o.name.trim().is_empty()) {
                return Err(DomainError::validation(format!(
                    "option {} of `{}` needs a name",
                    oi + 1,
                    variation.name
                )));
            }
        }

        if !self.is_current() {
            return Err(DomainError::conflict(
                "price variants are out of date; regenerate before saving",
            ));
        }

        let variations = self
            .variations()
            .iter()
            .enumerate()
            .map(|(vi, v)| VariationPayload {
                id: v.id.clone(),
                name: v.name.trim().to_string(),
                options: v
                    .options
                    .iter()
                    .map(|o| OptionPayload {
                        id: o.id.clone(),
                        name: o.name.trim().to_string(),
                        image_url: if vi == 0 { o.image_url.clone() } else { None },
                    })
                    .collect(),
            })
            .collect();

        let price_variants: Vec<PriceVariantPayload> = self
            .price_variants()
            .iter()
            .filter_map(|item| {
                Some(PriceVariantPayload {
                    id: item.persisted_id().cloned(),
                    combination_key: item.key().clone(),
                    price: item.price()?,
                    stock: item.stock()?,
                    sku: item.sku().map(str::to_string),
                })
            })
            .collect();

        let skipped = self.price_variants().len() - price_variants.len();
        if skipped > 0 {
            debug!(skipped, "incomplete price variants left out of payload");
        }

        Ok(ProductVariationsPayload {
            has_variations: true,
            variations,
            pricing: PricingPayload::Matrix { price_variants },
        })
    }

    /// Swap draft ids for the ids the store assigned, re-keying price variants.
    ///
    /// Price, stock and SKU follow each row to its new key. Drafts missing from
    /// `saved` stay drafts. Nothing changes if the mapping would give two
    /// options of one variation the same id.
    pub fn apply_saved_ids(&mut self, saved: &SavedIds) -> DomainResult<()> {
        let promote_option = |id: &OptionId| -> OptionId {
            match id.as_draft().and_then(|d| saved.options.get(&d)) {
                Some(persisted) => OptionId::Persisted(persisted.clone()),
                None => id.clone(),
            }
        };

        for variation in self.variations() {
            let mut seen = HashSet::new();
            for option in &variation.options {
                if !seen.insert(promote_option(&option.id)) {
                    return Err(DomainError::invariant(format!(
                        "saved ids map two options of `{}` to the same id",
                        variation.name
                    )));
                }
            }
        }

        let mut promoted = 0usize;
        for variation in self.variations_mut().iter_mut() {
            if let Some(persisted) = variation.id.as_draft().and_then(|d| saved.variations.get(&d)) {
                variation.id = VariationId::Persisted(persisted.clone());
                promoted += 1;
            }
            for option in variation.options.iter_mut() {
                let next = promote_option(&option.id);
                if next != option.id {
                    option.id = next;
                    promoted += 1;
                }
            }
        }

        for item in self.price_variants_mut().iter_mut() {
            let ids: Vec<OptionId> = item.option_combination().iter().map(promote_option).collect();
            let mut rekeyed = PriceVariantItem::new(ids, item.option_labels().to_vec()).with_values(
                item.persisted_id().cloned(),
                item.price(),
                item.stock(),
                item.sku().map(str::to_string),
            );
            if let Some(id) = saved.price_variants.get(rekeyed.key()) {
                rekeyed.set_id(id.clone());
            }
            *item = rekeyed;
        }

        debug!(promoted, "applied saved ids");
        Ok(())
    }
}
