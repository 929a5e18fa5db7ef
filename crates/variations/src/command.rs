//! Reducer-style surface over [`VariationMatrix`].
//!
//! Editors that keep the session behind a message channel (or replay edits)
//! can describe each mutation as a [`VariationCommand`] and feed it to
//! [`VariationMatrix::dispatch`].

use serde::{Deserialize, Serialize};

use varmatrix_core::DomainResult;

use crate::matrix::VariationMatrix;
use crate::price_variant::{CombinationKey, PriceVariantUpdate};
use crate::variation::{OptionUpdate, VariationUpdate};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VariationCommand {
    SetHasVariations {
        enabled: bool,
    },
    AddVariation,
    UpdateVariation {
        index: usize,
        update: VariationUpdate,
    },
    RemoveVariation {
        index: usize,
    },
    AddOption {
        variation_index: usize,
    },
    UpdateOption {
        variation_index: usize,
        option_index: usize,
        update: OptionUpdate,
    },
    RemoveOption {
        variation_index: usize,
        option_index: usize,
    },
    GeneratePriceVariants,
    UpdatePriceVariant {
        key: CombinationKey,
        update: PriceVariantUpdate,
    },
    SetVariationFormOpen {
        index: usize,
        open: bool,
    },
}

/// What a dispatched command did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Applied,
    /// The command targeted something that does not exist (or hit the cap).
    Ignored,
    Regenerated { variants: usize },
}

impl CommandOutcome {
    fn from_applied(applied: bool) -> Self {
        if applied { Self::Applied } else { Self::Ignored }
    }
}

impl VariationMatrix {
    /// Apply a single command.
    ///
    /// Only removing the last option of a variation fails; everything else
    /// either applies or is ignored.
    pub fn dispatch(&mut self, command: &VariationCommand) -> DomainResult<CommandOutcome> {
        let outcome = match command {
            VariationCommand::SetHasVariations { enabled } => {
                self.set_has_variations(*enabled);
                CommandOutcome::Applied
            }
            VariationCommand::AddVariation => CommandOutcome::from_applied(self.add_variation()),
            VariationCommand::UpdateVariation { index, update } => {
                CommandOutcome::from_applied(self.update_variation(*index, update))
            }
            VariationCommand::RemoveVariation { index } => {
                CommandOutcome::from_applied(self.remove_variation(*index).is_some())
            }
            VariationCommand::AddOption { variation_index } => {
                CommandOutcome::from_applied(self.add_option_to_variation(*variation_index))
            }
            VariationCommand::UpdateOption {
                variation_index,
                option_index,
                update,
            } => CommandOutcome::from_applied(self.update_option_in_variation(
                *variation_index,
                *option_index,
                update,
            )),
            VariationCommand::RemoveOption {
                variation_index,
                option_index,
            } => CommandOutcome::from_applied(
                self.remove_option_from_variation(*variation_index, *option_index)?
                    .is_some(),
            ),
            VariationCommand::GeneratePriceVariants => CommandOutcome::Regenerated {
                variants: self.generate_price_variants().len(),
            },
            VariationCommand::UpdatePriceVariant { key, update } => {
                CommandOutcome::from_applied(self.update_price_variant(key, update))
            }
            VariationCommand::SetVariationFormOpen { index, open } => {
                self.set_variation_form_open(*index, *open);
                CommandOutcome::Applied
            }
        };
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use varmatrix_core::DomainError;

    fn run(matrix: &mut VariationMatrix, commands: &[VariationCommand]) -> Vec<CommandOutcome> {
        commands
            .iter()
            .map(|c| matrix.dispatch(c).unwrap())
            .collect()
    }

    #[test]
    fn replaying_commands_builds_a_matrix() {
        let mut matrix = VariationMatrix::default();
        let outcomes = run(
            &mut matrix,
            &[
                VariationCommand::SetHasVariations { enabled: true },
                VariationCommand::UpdateVariation {
                    index: 0,
                    update: VariationUpdate::name("Warna"),
                },
                VariationCommand::AddOption { variation_index: 0 },
                VariationCommand::AddVariation,
                VariationCommand::AddVariation,
                VariationCommand::AddOption { variation_index: 1 },
                VariationCommand::AddOption { variation_index: 1 },
                VariationCommand::GeneratePriceVariants,
            ],
        );

        assert_eq!(outcomes[4], CommandOutcome::Ignored);
        assert_eq!(outcomes[7], CommandOutcome::Regenerated { variants: 6 });
    }

    #[test]
    fn removing_last_option_surfaces_validation_error() {
        let mut matrix = VariationMatrix::default();
        matrix.set_has_variations(true);
        let err = matrix
            .dispatch(&VariationCommand::RemoveOption {
                variation_index: 0,
                option_index: 0,
            })
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn out_of_range_option_removal_is_ignored_not_rejected() {
        let mut matrix = VariationMatrix::default();
        matrix.set_has_variations(true);
        let outcome = matrix
            .dispatch(&VariationCommand::RemoveOption {
                variation_index: 0,
                option_index: 3,
            })
            .unwrap();
        assert_eq!(outcome, CommandOutcome::Ignored);
        assert_eq!(matrix.variations()[0].options.len(), 1);
    }

    #[test]
    fn unknown_targets_are_reported_as_ignored() {
        let mut matrix = VariationMatrix::default();
        let outcome = matrix
            .dispatch(&VariationCommand::UpdatePriceVariant {
                key: CombinationKey::from("nope"),
                update: PriceVariantUpdate::price(1),
            })
            .unwrap();
        assert_eq!(outcome, CommandOutcome::Ignored);
    }

    #[test]
    fn commands_round_trip_through_json() {
        let command = VariationCommand::UpdateOption {
            variation_index: 0,
            option_index: 1,
            update: OptionUpdate::name("Hitam"),
        };
        let json = serde_json::to_value(&command).unwrap();
        assert_eq!(json["type"], "update_option");
        let back: VariationCommand = serde_json::from_value(json).unwrap();
        assert_eq!(back, command);
    }
}
