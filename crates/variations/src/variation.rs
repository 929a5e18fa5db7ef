use serde::{Deserialize, Serialize};

use varmatrix_core::{Entity, OptionId, VariationId};

/// A single selectable value of a variation (e.g. "Red", "Large").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariationOption {
    pub id: OptionId,
    pub name: String,
    /// Externally hosted image. Only carried through for the first variation.
    pub image_url: Option<String>,
}

impl VariationOption {
    /// A new, unnamed option with a draft id.
    pub fn empty() -> Self {
        Self {
            id: OptionId::draft(),
            name: String::new(),
            image_url: None,
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::empty()
        }
    }

    pub fn apply(&mut self, update: &OptionUpdate) {
        if let Some(name) = &update.name {
            self.name = name.clone();
        }
        if let Some(image_url) = &update.image_url {
            self.image_url = image_url.clone();
        }
    }
}

impl Entity for VariationOption {
    type Id = OptionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// A product dimension (e.g. "Warna", "Ukuran") with its ordered options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variation {
    pub id: VariationId,
    pub name: String,
    pub options: Vec<VariationOption>,
}

impl Variation {
    /// A new, unnamed variation holding exactly one empty option.
    pub fn empty() -> Self {
        Self {
            id: VariationId::draft(),
            name: String::new(),
            options: vec![VariationOption::empty()],
        }
    }

    pub fn named<I, S>(name: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let options: Vec<_> = options.into_iter().map(VariationOption::named).collect();
        Self {
            id: VariationId::draft(),
            name: name.into(),
            options: if options.is_empty() {
                vec![VariationOption::empty()]
            } else {
                options
            },
        }
    }

    pub fn apply(&mut self, update: &VariationUpdate) {
        if let Some(name) = &update.name {
            self.name = name.clone();
        }
    }

    /// Image urls currently referenced by this variation's options.
    pub fn image_urls(&self) -> Vec<String> {
        self.options
            .iter()
            .filter_map(|o| o.image_url.clone())
            .collect()
    }
}

impl Entity for Variation {
    type Id = VariationId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Shallow patch for a [`Variation`]. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariationUpdate {
    pub name: Option<String>,
}

impl VariationUpdate {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }
}

/// Shallow patch for a [`VariationOption`].
///
/// `image_url: Some(None)` clears the image, `None` leaves it untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionUpdate {
    pub name: Option<String>,
    pub image_url: Option<Option<String>>,
}

impl OptionUpdate {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            image_url: None,
        }
    }

    pub fn image_url(url: Option<String>) -> Self {
        Self {
            name: None,
            image_url: Some(url),
        }
    }
}
