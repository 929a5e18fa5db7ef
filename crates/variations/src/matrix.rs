//! The variation matrix engine.
//!
//! [`VariationMatrix`] is the state of one product-editing session: the
//! variations being edited, which of their edit forms are open, and the
//! price variant rows derived from them. Every operation is a synchronous,
//! in-memory state transition; nothing here performs IO.

use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::{debug, warn};

use varmatrix_core::{DomainError, DomainResult, OptionId};

use crate::config::MatrixConfig;
use crate::price_variant::{CombinationKey, PriceVariantItem, PriceVariantUpdate};
use crate::variation::{OptionUpdate, Variation, VariationOption, VariationUpdate};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariationMatrix {
    config: MatrixConfig,
    has_variations: bool,
    variations: Vec<Variation>,
    open_forms: BTreeSet<usize>,
    price_variants: Vec<PriceVariantItem>,
}

impl Default for VariationMatrix {
    fn default() -> Self {
        Self::new(MatrixConfig::default())
    }
}

impl VariationMatrix {
    /// An engine for a product without variations.
    pub fn new(config: MatrixConfig) -> Self {
        Self {
            config,
            has_variations: false,
            variations: Vec::new(),
            open_forms: BTreeSet::new(),
            price_variants: Vec::new(),
        }
    }

    /// An engine over existing variations, with the matrix already generated.
    ///
    /// Rejects variations without options, duplicate option ids within a
    /// variation, and more variations than the configured maximum.
    pub fn from_variations(config: MatrixConfig, variations: Vec<Variation>) -> DomainResult<Self> {
        if variations.len() > config.max_variations {
            return Err(DomainError::validation(format!(
                "a product can have at most {} variations (got {})",
                config.max_variations,
                variations.len()
            )));
        }
        for variation in &variations {
            ensure_distinct_options(variation)?;
        }

        let mut matrix = Self::new(config);
        matrix.has_variations = !variations.is_empty();
        matrix.variations = variations;
        matrix.generate_price_variants();
        Ok(matrix)
    }

    pub fn config(&self) -> &MatrixConfig {
        &self.config
    }

    pub fn has_variations(&self) -> bool {
        self.has_variations
    }

    pub fn variations(&self) -> &[Variation] {
        &self.variations
    }

    pub fn price_variants(&self) -> &[PriceVariantItem] {
        &self.price_variants
    }

    /// Indices of variations whose edit form is currently open.
    pub fn open_forms(&self) -> &BTreeSet<usize> {
        &self.open_forms
    }

    /// Whether any variation is mid-edit.
    pub fn is_editing(&self) -> bool {
        !self.open_forms.is_empty()
    }

    pub fn find_price_variant(&self, key: &CombinationKey) -> Option<&PriceVariantItem> {
        self.price_variants.iter().find(|item| item.key() == key)
    }

    /// Toggle the variation matrix on or off.
    ///
    /// Enabling with no variations seeds one empty variation so the editor has
    /// something to show. Disabling drops every price variant.
    pub fn set_has_variations(&mut self, enabled: bool) {
        if enabled {
            if self.variations.is_empty() {
                self.variations.push(Variation::empty());
                debug!("seeded empty variation");
            }
            self.has_variations = true;
        } else {
            self.has_variations = false;
            self.price_variants.clear();
            debug!("variations disabled; price variants cleared");
        }
    }

    /// Append an empty variation. Returns `false` once the cap is reached.
    pub fn add_variation(&mut self) -> bool {
        if self.variations.len() >= self.config.max_variations {
            debug!(max = self.config.max_variations, "variation cap reached; add ignored");
            return false;
        }
        self.variations.push(Variation::empty());
        true
    }

    /// Merge `update` into the variation at `index`. Does not regenerate.
    pub fn update_variation(&mut self, index: usize, update: &VariationUpdate) -> bool {
        match self.variations.get_mut(index) {
            Some(variation) => {
                variation.apply(update);
                true
            }
            None => false,
        }
    }

    /// Remove the variation at `index`, returning it.
    ///
    /// Open-form indices above `index` shift down with the list. Removing the
    /// last variation turns variations off (and so clears the matrix).
    pub fn remove_variation(&mut self, index: usize) -> Option<Variation> {
        if index >= self.variations.len() {
            return None;
        }
        let removed = self.variations.remove(index);

        self.open_forms = self
            .open_forms
            .iter()
            .filter(|&&i| i != index)
            .map(|&i| if i > index { i - 1 } else { i })
            .collect();

        if self.variations.is_empty() {
            self.set_has_variations(false);
        }
        debug!(index, remaining = self.variations.len(), "variation removed");
        Some(removed)
    }

    /// Append an empty option to the variation at `variation_index`.
    pub fn add_option_to_variation(&mut self, variation_index: usize) -> bool {
        match self.variations.get_mut(variation_index) {
            Some(variation) => {
                variation.options.push(VariationOption::empty());
                true
            }
            None => false,
        }
    }

    /// Merge `update` into a single option. Out-of-range indices are ignored.
    pub fn update_option_in_variation(
        &mut self,
        variation_index: usize,
        option_index: usize,
        update: &OptionUpdate,
    ) -> bool {
        match self
            .variations
            .get_mut(variation_index)
            .and_then(|v| v.options.get_mut(option_index))
        {
            Some(option) => {
                option.apply(update);
                true
            }
            None => false,
        }
    }

    /// Remove a single option, returning it.
    ///
    /// A variation always keeps at least one option: removing the last one is
    /// rejected with a validation error and nothing changes. Out-of-range
    /// indices yield `Ok(None)`.
    pub fn remove_option_from_variation(
        &mut self,
        variation_index: usize,
        option_index: usize,
    ) -> DomainResult<Option<VariationOption>> {
        let Some(variation) = self.variations.get_mut(variation_index) else {
            return Ok(None);
        };
        if option_index >= variation.options.len() {
            return Ok(None);
        }
        if variation.options.len() == 1 {
            warn!(variation_index, "refused to remove the last option of a variation");
            return Err(DomainError::validation(
                "a variation must keep at least one option",
            ));
        }
        Ok(Some(variation.options.remove(option_index)))
    }

    /// Rebuild the matrix as the Cartesian product of the current options.
    ///
    /// Rows whose combination key already existed keep their id, price, stock
    /// and SKU; rows for vanished keys are dropped; new keys start unset. The
    /// first variation is the outer loop, so the last variation's options vary
    /// fastest.
    pub fn generate_price_variants(&mut self) -> &[PriceVariantItem] {
        let prior: HashMap<&CombinationKey, &PriceVariantItem> = self
            .price_variants
            .iter()
            .map(|item| (item.key(), item))
            .collect();

        let mut carried = 0usize;
        let next: Vec<PriceVariantItem> = combinations(&self.variations)
            .into_iter()
            .map(|combo| {
                let ids: Vec<OptionId> = combo.iter().map(|(_, o)| o.id.clone()).collect();
                let labels: Vec<String> = combo
                    .iter()
                    .map(|(v, o)| format!("{}: {}", v.name, o.name))
                    .collect();
                let item = PriceVariantItem::new(ids, labels);
                match prior.get(item.key()) {
                    Some(previous) => {
                        carried += 1;
                        item.inherit(previous)
                    }
                    None => item,
                }
            })
            .collect();

        debug!(
            variants = next.len(),
            carried,
            dropped = self.price_variants.len() - carried,
            "regenerated price variants"
        );
        self.price_variants = next;
        &self.price_variants
    }

    /// Merge `update` into the row identified by `key`.
    pub fn update_price_variant(&mut self, key: &CombinationKey, update: &PriceVariantUpdate) -> bool {
        match self.price_variants.iter_mut().find(|item| item.key() == key) {
            Some(item) => {
                item.apply(update);
                true
            }
            None => {
                debug!(%key, "no price variant for key; update ignored");
                false
            }
        }
    }

    /// Mark the edit form of the variation at `index` as open or closed.
    pub fn set_variation_form_open(&mut self, index: usize, open: bool) {
        if open {
            self.open_forms.insert(index);
        } else {
            self.open_forms.remove(&index);
        }
    }

    /// Regenerate if no edit form is open.
    ///
    /// With variations turned off the matrix is cleared instead. Returns
    /// whether the matrix was touched.
    pub fn regenerate_if_ready(&mut self) -> bool {
        if self.is_editing() {
            return false;
        }
        if self.has_variations {
            self.generate_price_variants();
        } else {
            self.price_variants.clear();
        }
        true
    }

    /// Set the same price on every row. Returns the number of rows updated.
    pub fn apply_bulk_price(&mut self, price: u64) -> usize {
        self.apply_to_all(&PriceVariantUpdate::price(price))
    }

    /// Set the same stock on every row. Returns the number of rows updated.
    pub fn apply_bulk_stock(&mut self, stock: u32) -> usize {
        self.apply_to_all(&PriceVariantUpdate::stock(stock))
    }

    fn apply_to_all(&mut self, update: &PriceVariantUpdate) -> usize {
        let keys: Vec<CombinationKey> =
            self.price_variants.iter().map(|item| item.key().clone()).collect();
        keys.iter()
            .filter(|key| self.update_price_variant(key, update))
            .count()
    }

    /// Keys of rows still missing a price or a stock value.
    pub fn missing_values(&self) -> Vec<CombinationKey> {
        self.price_variants
            .iter()
            .filter(|item| !item.is_complete())
            .map(|item| item.key().clone())
            .collect()
    }

    /// Whether the rows match the current options one-for-one, in order.
    ///
    /// False after a structural edit until the matrix is regenerated.
    pub fn is_current(&self) -> bool {
        let expected = combinations(&self.variations);
        expected.len() == self.price_variants.len()
            && expected.iter().zip(&self.price_variants).all(|(combo, item)| {
                combo.len() == item.option_combination().len()
                    && combo
                        .iter()
                        .zip(item.option_combination())
                        .all(|((_, option), id)| &option.id == id)
            })
    }

    /// `(option id, image url)` for every first-variation option with an image,
    /// in option order. The product gallery mirrors these.
    pub fn first_variation_images(&self) -> Vec<(OptionId, String)> {
        self.variations
            .first()
            .map(|variation| {
                variation
                    .options
                    .iter()
                    .filter_map(|o| o.image_url.clone().map(|url| (o.id.clone(), url)))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub(crate) fn variations_mut(&mut self) -> &mut [Variation] {
        &mut self.variations
    }

    pub(crate) fn price_variants_mut(&mut self) -> &mut Vec<PriceVariantItem> {
        &mut self.price_variants
    }
}

fn ensure_distinct_options(variation: &Variation) -> DomainResult<()> {
    if variation.options.is_empty() {
        return Err(DomainError::validation(format!(
            "variation `{}` has no options",
            variation.name
        )));
    }
    let mut seen = HashSet::new();
    for option in &variation.options {
        if !seen.insert(&option.id) {
            return Err(DomainError::invariant(format!(
                "option id `{}` appears twice in variation `{}`",
                option.id, variation.name
            )));
        }
    }
    Ok(())
}

/// Cartesian product of the options, first variation outermost.
fn combinations(variations: &[Variation]) -> Vec<Vec<(&Variation, &VariationOption)>> {
    if variations.is_empty() {
        return Vec::new();
    }
    let mut acc: Vec<Vec<(&Variation, &VariationOption)>> = vec![Vec::new()];
    for variation in variations {
        let mut next = Vec::with_capacity(acc.len() * variation.options.len());
        for prefix in &acc {
            for option in &variation.options {
                let mut combo = prefix.clone();
                combo.push((variation, option));
                next.push(combo);
            }
        }
        acc = next;
    }
    acc
}
