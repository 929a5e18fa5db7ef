use std::collections::{BTreeMap, HashSet};

use varmatrix_core::{DomainError, OptionId, PersistedId, PriceVariantId};
use varmatrix_variations::{
    BasePricing, CombinationKey, ImageStore, ImageStoreError, MatrixConfig, OptionUpdate,
    PersistedOption, PersistedPriceVariant, PersistedProduct, PersistedVariation,
    PriceVariantUpdate, ProductVariationsPayload, SavedIds, VariationMatrix, VariationUpdate,
};

/// Stands in for the database: assigns ids to drafts and keeps the last save.
#[derive(Default)]
struct ProductStore {
    next_id: u32,
    saved: PersistedProduct,
}

impl ProductStore {
    fn mint(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}{}", self.next_id)
    }

    fn save(&mut self, payload: &ProductVariationsPayload) -> SavedIds {
        let mut ids = SavedIds::default();
        let mut option_map: BTreeMap<String, String> = BTreeMap::new();

        let variations = payload
            .variations
            .iter()
            .map(|v| {
                let id = match &v.id {
                    varmatrix_core::VariationId::Persisted(id) => id.to_string(),
                    varmatrix_core::VariationId::Draft(draft) => {
                        let id = self.mint("var_");
                        ids.variations.insert(*draft, PersistedId::new(id.clone()).unwrap());
                        id
                    }
                };
                let options = v
                    .options
                    .iter()
                    .map(|o| {
                        let option_id = match &o.id {
                            OptionId::Persisted(id) => id.to_string(),
                            OptionId::Draft(draft) => {
                                let id = self.mint("opt_");
                                ids.options.insert(*draft, PersistedId::new(id.clone()).unwrap());
                                id
                            }
                        };
                        option_map.insert(o.id.to_string(), option_id.clone());
                        PersistedOption {
                            id: option_id,
                            name: o.name.clone(),
                            image_url: o.image_url.clone(),
                        }
                    })
                    .collect();
                PersistedVariation {
                    id,
                    name: v.name.clone(),
                    options,
                }
            })
            .collect();

        let price_variants = payload
            .price_variants()
            .iter()
            .map(|row| {
                let key = row
                    .combination_key
                    .as_str()
                    .split('|')
                    .map(|part| option_map[part].clone())
                    .collect::<Vec<_>>()
                    .join("|");
                let id = match &row.id {
                    Some(id) => id.to_string(),
                    None => {
                        let id = self.mint("pv_");
                        ids.price_variants.insert(
                            CombinationKey::from(key.as_str()),
                            PriceVariantId::new(id.clone()).unwrap(),
                        );
                        id
                    }
                };
                PersistedPriceVariant {
                    id,
                    combination_key: key,
                    price: Some(row.price),
                    stock: Some(row.stock),
                    sku: row.sku.clone(),
                }
            })
            .collect();

        self.saved = PersistedProduct {
            has_variations: payload.has_variations,
            variations,
            price_variants,
        };
        ids
    }
}

#[derive(Default)]
struct AssetStore {
    images: HashSet<String>,
    fail_next: bool,
}

impl ImageStore for AssetStore {
    fn delete(&mut self, url: &str) -> Result<(), ImageStoreError> {
        if std::mem::take(&mut self.fail_next) {
            return Err(ImageStoreError::Rejected {
                status: 503,
                message: "try again later".into(),
            });
        }
        if self.images.remove(url) {
            Ok(())
        } else {
            Err(ImageStoreError::NotFound(url.into()))
        }
    }
}

fn label_keys(matrix: &VariationMatrix) -> Vec<String> {
    matrix
        .price_variants()
        .iter()
        .map(|item| item.display_label())
        .collect()
}

#[test]
fn full_editing_session_survives_save_and_reload() {
    varmatrix_observability::init();

    let mut assets = AssetStore {
        images: ["https://img/hitam.jpg", "https://img/coklat.jpg"]
            .into_iter()
            .map(String::from)
            .collect(),
        ..AssetStore::default()
    };
    let mut store = ProductStore::default();
    let mut matrix = VariationMatrix::new(MatrixConfig::default());

    // Seed and fill the first variation.
    matrix.set_has_variations(true);
    matrix.set_variation_form_open(0, true);
    matrix.update_variation(0, &VariationUpdate::name("Warna"));
    matrix.update_option_in_variation(0, 0, &OptionUpdate::name("Hitam"));
    matrix.replace_option_image(&mut assets, 0, 0, Some("https://img/hitam.jpg".into()));
    matrix.add_option_to_variation(0);
    matrix.update_option_in_variation(0, 1, &OptionUpdate::name("Coklat"));
    matrix.replace_option_image(&mut assets, 0, 1, Some("https://img/coklat.jpg".into()));
    assert!(!matrix.regenerate_if_ready());
    matrix.set_variation_form_open(0, false);
    assert!(matrix.regenerate_if_ready());
    assert_eq!(label_keys(&matrix), vec!["Warna: Hitam", "Warna: Coklat"]);

    // Second variation.
    assert!(matrix.add_variation());
    matrix.update_variation(1, &VariationUpdate::name("Ukuran"));
    matrix.update_option_in_variation(1, 0, &OptionUpdate::name("A5"));
    matrix.add_option_to_variation(1);
    matrix.update_option_in_variation(1, 1, &OptionUpdate::name("A4"));
    assert!(!matrix.add_variation());
    matrix.generate_price_variants();
    assert_eq!(
        label_keys(&matrix),
        vec![
            "Warna: Hitam / Ukuran: A5",
            "Warna: Hitam / Ukuran: A4",
            "Warna: Coklat / Ukuran: A5",
            "Warna: Coklat / Ukuran: A4",
        ]
    );

    // Prices: bulk, then one override.
    assert_eq!(matrix.apply_bulk_price(120_000), 4);
    assert_eq!(matrix.apply_bulk_stock(10), 4);
    let premium = matrix.price_variants()[3].key().clone();
    matrix.update_price_variant(&premium, &PriceVariantUpdate::price(150_000));

    // Save and promote ids.
    let payload = matrix.save_payload(BasePricing::default()).unwrap();
    assert_eq!(payload.price_variants().len(), 4);
    let saved = store.save(&payload);
    matrix.apply_saved_ids(&saved).unwrap();
    assert!(matrix.variations().iter().all(|v| !v.id.is_draft()));
    assert!(matrix.price_variants().iter().all(|i| i.persisted_id().is_some()));

    // Removing an option with an image cleans it up remotely, even when the
    // asset store hiccups the matrix keeps the local edit.
    assets.fail_next = true;
    let report = matrix.remove_option_with_cleanup(&mut assets, 0, 1).unwrap();
    assert!(report.needs_attention());
    assert_eq!(matrix.variations()[0].options.len(), 1);
    matrix.generate_price_variants();
    assert_eq!(matrix.price_variants().len(), 2);
    assert!(matrix.price_variants().iter().all(|i| i.price() == Some(120_000)));

    // The last option cannot go.
    let err = matrix.remove_option_with_cleanup(&mut assets, 0, 0).unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));
    assert!(assets.images.contains("https://img/hitam.jpg"));

    // Save again and reload into a fresh session.
    let payload = matrix.save_payload(BasePricing::default()).unwrap();
    let saved = store.save(&payload);
    assert!(saved.variations.is_empty());
    assert!(saved.options.is_empty());
    matrix.apply_saved_ids(&saved).unwrap();

    let reloaded = VariationMatrix::from_persisted(MatrixConfig::default(), store.saved.clone()).unwrap();
    assert_eq!(reloaded.price_variants(), matrix.price_variants());
    assert_eq!(reloaded.variations(), matrix.variations());
    assert_eq!(
        reloaded.first_variation_images()[0].1,
        "https://img/hitam.jpg".to_string()
    );
}

#[test]
fn turning_variations_off_saves_flat_pricing() {
    let mut matrix = VariationMatrix::default();
    matrix.set_has_variations(true);
    matrix.update_variation(0, &VariationUpdate::name("Warna"));
    matrix.update_option_in_variation(0, 0, &OptionUpdate::name("Hijau"));
    matrix.generate_price_variants();
    matrix.apply_bulk_price(80_000);

    matrix.set_has_variations(false);
    assert!(matrix.price_variants().is_empty());

    let payload = matrix
        .save_payload(BasePricing {
            base_price: Some(80_000),
            base_stock: Some(3),
        })
        .unwrap();
    assert!(!payload.has_variations);
    assert!(payload.variations.is_empty());

    let mut store = ProductStore::default();
    store.save(&payload);
    let reloaded = VariationMatrix::from_persisted(MatrixConfig::default(), store.saved).unwrap();
    assert!(!reloaded.has_variations());
    assert!(reloaded.variations().is_empty());
}
