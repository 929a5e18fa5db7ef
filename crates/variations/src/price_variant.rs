use serde::{Deserialize, Serialize};

use varmatrix_core::id::KEY_DELIMITER;
use varmatrix_core::{Entity, OptionId, PriceVariantId, ValueObject};

/// Natural identity of a price variant: option ids joined with `|`, in
/// variation-declaration order.
///
/// This exact string is what the store persists as `combinationKey`, so it must
/// stay stable across save/reload cycles.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CombinationKey(String);

impl CombinationKey {
    pub fn from_options(options: &[OptionId]) -> Self {
        let mut key = String::new();
        for (i, id) in options.iter().enumerate() {
            if i > 0 {
                key.push(KEY_DELIMITER);
            }
            key.push_str(&id.to_string());
        }
        Self(key)
    }

    /// Wrap a key previously produced by [`CombinationKey::from_options`] and
    /// read back from storage.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of option ids joined into this key.
    pub fn arity(&self) -> usize {
        if self.0.is_empty() {
            0
        } else {
            self.0.split(KEY_DELIMITER).count()
        }
    }
}

impl ValueObject for CombinationKey {}

impl core::fmt::Display for CombinationKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CombinationKey {
    fn from(value: &str) -> Self {
        Self::from_raw(value)
    }
}

/// One row of the price matrix: a single option combination with its
/// price, stock and SKU.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceVariantItem {
    id: Option<PriceVariantId>,
    key: CombinationKey,
    option_combination: Vec<OptionId>,
    option_labels: Vec<String>,
    price: Option<u64>,
    stock: Option<u32>,
    sku: Option<String>,
}

impl PriceVariantItem {
    /// A fresh, not-yet-priced row for the given combination.
    pub fn new(option_combination: Vec<OptionId>, option_labels: Vec<String>) -> Self {
        Self {
            id: None,
            key: CombinationKey::from_options(&option_combination),
            option_combination,
            option_labels,
            price: None,
            stock: None,
            sku: None,
        }
    }

    /// Carry persisted values (`id`, `price`, `stock`, `sku`) over from `prior`.
    pub(crate) fn inherit(mut self, prior: &PriceVariantItem) -> Self {
        self.id = prior.id.clone();
        self.price = prior.price;
        self.stock = prior.stock;
        self.sku = prior.sku.clone();
        self
    }

    pub(crate) fn with_values(
        mut self,
        id: Option<PriceVariantId>,
        price: Option<u64>,
        stock: Option<u32>,
        sku: Option<String>,
    ) -> Self {
        self.id = id;
        self.price = price;
        self.stock = stock;
        self.sku = sku;
        self
    }

    pub(crate) fn set_id(&mut self, id: PriceVariantId) {
        self.id = Some(id);
    }

    pub fn apply(&mut self, update: &PriceVariantUpdate) {
        if let Some(price) = update.price {
            self.price = price;
        }
        if let Some(stock) = update.stock {
            self.stock = stock;
        }
        if let Some(sku) = &update.sku {
            self.sku = sku.clone();
        }
    }

    pub fn persisted_id(&self) -> Option<&PriceVariantId> {
        self.id.as_ref()
    }

    pub fn key(&self) -> &CombinationKey {
        &self.key
    }

    pub fn option_combination(&self) -> &[OptionId] {
        &self.option_combination
    }

    pub fn option_labels(&self) -> &[String] {
        &self.option_labels
    }

    /// Labels joined for display, e.g. "Warna: Hitam / Ukuran: L".
    pub fn display_label(&self) -> String {
        self.option_labels.join(" / ")
    }

    pub fn price(&self) -> Option<u64> {
        self.price
    }

    pub fn stock(&self) -> Option<u32> {
        self.stock
    }

    pub fn sku(&self) -> Option<&str> {
        self.sku.as_deref()
    }

    /// Both price and stock have been entered.
    pub fn is_complete(&self) -> bool {
        self.price.is_some() && self.stock.is_some()
    }
}

impl Entity for PriceVariantItem {
    type Id = CombinationKey;

    fn id(&self) -> &Self::Id {
        &self.key
    }
}

/// Shallow patch for a [`PriceVariantItem`].
///
/// Outer `None` leaves a field untouched; `Some(None)` resets it to "not set".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceVariantUpdate {
    pub price: Option<Option<u64>>,
    pub stock: Option<Option<u32>>,
    pub sku: Option<Option<String>>,
}

impl PriceVariantUpdate {
    pub fn price(price: u64) -> Self {
        Self {
            price: Some(Some(price)),
            ..Self::default()
        }
    }

    pub fn stock(stock: u32) -> Self {
        Self {
            stock: Some(Some(stock)),
            ..Self::default()
        }
    }

    pub fn sku(sku: impl Into<String>) -> Self {
        Self {
            sku: Some(Some(sku.into())),
            ..Self::default()
        }
    }
}
