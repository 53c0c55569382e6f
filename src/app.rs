// 🎛️ Command handlers - explicit UI state in, new state + side effects out
//
// Handlers never touch the stores. They read a catalog snapshot and return
// the effects to apply; `Journal::apply` performs them in order.

use chrono::NaiveDateTime;

use crate::category::MealCategory;
use crate::db::{CatalogEntry, NotificationKind};
use crate::error::ValidationError;
use crate::fuzzy::{FuzzyMatcher, MatchResult};

// ============================================================================
// STATE
// ============================================================================

/// Add-to-catalog popup contents
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AddPopup {
    pub name: String,
    pub category: MealCategory,
}

/// Edit popup contents; `original` is the catalog key being edited
#[derive(Debug, Clone, PartialEq)]
pub struct EditTarget {
    pub original: String,
    pub name: String,
    pub category: MealCategory,
}

/// Whatever the presentation layer needs to remember between actions
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UiState {
    /// Free text typed into the meal field
    pub meal_input: String,

    /// Suggestion the user picked, if any
    pub selected_meal: Option<String>,

    pub category: MealCategory,
    pub quantity: f64,

    pub add_popup: Option<AddPopup>,
    pub edit_target: Option<EditTarget>,

    /// Full notification history expanded
    pub show_all_notifications: bool,

    /// Feedback from the last command
    pub status: Option<Status>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Status {
    pub kind: NotificationKind,
    pub message: String,
}

impl UiState {
    /// Meal the save button would log: the picked suggestion, else the typed text
    pub fn current_meal(&self) -> &str {
        match &self.selected_meal {
            Some(selected) if !selected.is_empty() => selected,
            _ => self.meal_input.trim(),
        }
    }

    pub fn popup_open(&self) -> bool {
        self.add_popup.is_some() || self.edit_target.is_some()
    }
}

// ============================================================================
// COMMANDS & EFFECTS
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetMealInput(String),
    SelectSuggestion(String),
    SetCategory(MealCategory),
    SetQuantity(f64),
    SaveMeal,

    /// Open the add popup prefilled with the current meal and category
    OpenAddPopup,
    SetPopupName(String),
    SetPopupCategory(MealCategory),
    ConfirmAdd,

    /// Open the edit popup for a catalog entry
    OpenEdit(String),
    ConfirmEdit,

    /// Close whichever popup is open
    CancelPopup,

    DeleteMeal(String),
    ToggleNotifications,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    AppendLog {
        timestamp: NaiveDateTime,
        category: MealCategory,
        name: String,
        quantity: f64,
    },
    AddCatalog {
        name: String,
        category: MealCategory,
    },
    UpdateCatalog {
        old_name: String,
        new_name: String,
        category: MealCategory,
    },
    DeleteCatalog {
        name: String,
    },
    Notify {
        kind: NotificationKind,
        message: String,
    },
}

impl Effect {
    fn notify(kind: NotificationKind, message: impl Into<String>) -> Self {
        Effect::Notify {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub state: UiState,
    pub effects: Vec<Effect>,
}

impl Outcome {
    /// True when the command was refused
    pub fn rejected(&self) -> bool {
        matches!(
            self.state.status,
            Some(Status {
                kind: NotificationKind::Error | NotificationKind::Warning,
                ..
            })
        )
    }
}

// ============================================================================
// HANDLER
// ============================================================================

/// Run one command against the current state and catalog snapshot
pub fn handle(
    state: &UiState,
    catalog: &[CatalogEntry],
    command: Command,
    now: NaiveDateTime,
) -> Outcome {
    let mut next = state.clone();
    next.status = None;
    let mut effects = Vec::new();

    match command {
        Command::SetMealInput(text) => {
            if next.selected_meal.as_deref() != Some(text.as_str()) {
                next.selected_meal = None;
            }
            next.meal_input = text;
        }
        Command::SelectSuggestion(name) => {
            if let Some(entry) = find(catalog, &name) {
                next.category = entry.category;
            }
            next.meal_input = name.clone();
            next.selected_meal = Some(name);
        }
        Command::SetCategory(category) => next.category = category,
        Command::SetQuantity(quantity) => next.quantity = quantity,
        Command::SaveMeal => save_meal(&mut next, catalog, now, &mut effects),
        Command::OpenAddPopup => {
            next.edit_target = None;
            next.add_popup = Some(AddPopup {
                name: state.current_meal().to_string(),
                category: state.category,
            });
        }
        Command::SetPopupName(name) => {
            if let Some(popup) = next.add_popup.as_mut() {
                popup.name = name;
            } else if let Some(target) = next.edit_target.as_mut() {
                target.name = name;
            }
        }
        Command::SetPopupCategory(category) => {
            if let Some(popup) = next.add_popup.as_mut() {
                popup.category = category;
            } else if let Some(target) = next.edit_target.as_mut() {
                target.category = category;
            }
        }
        Command::ConfirmAdd => confirm_add(&mut next, catalog, &mut effects),
        Command::OpenEdit(name) => match find(catalog, &name) {
            Some(entry) => {
                next.add_popup = None;
                next.edit_target = Some(EditTarget {
                    original: entry.name.clone(),
                    name: entry.name.clone(),
                    category: entry.category,
                });
            }
            None => {
                let notice = format!("Failed to update meal '{}'", name);
                reject(
                    &mut next,
                    &mut effects,
                    NotificationKind::Error,
                    ValidationError::MealNotFound(name).to_string(),
                    notice,
                );
            }
        },
        Command::ConfirmEdit => confirm_edit(&mut next, catalog, &mut effects),
        Command::CancelPopup => {
            next.add_popup = None;
            next.edit_target = None;
        }
        Command::DeleteMeal(name) => {
            if find(catalog, &name).is_some() {
                if next.selected_meal.as_deref() == Some(name.as_str()) {
                    next.selected_meal = None;
                }
                succeed(&mut next, &format!("'{}' deleted successfully!", name));
                effects.push(Effect::DeleteCatalog { name: name.clone() });
                effects.push(Effect::notify(
                    NotificationKind::Success,
                    format!("'{}' deleted from database!", name),
                ));
            } else {
                let notice = format!("Failed to delete meal '{}'", name);
                reject(
                    &mut next,
                    &mut effects,
                    NotificationKind::Error,
                    ValidationError::MealNotFound(name).to_string(),
                    notice,
                );
            }
        }
        Command::ToggleNotifications => {
            next.show_all_notifications = !next.show_all_notifications;
        }
    }

    Outcome {
        state: next,
        effects,
    }
}

fn save_meal(
    next: &mut UiState,
    catalog: &[CatalogEntry],
    now: NaiveDateTime,
    effects: &mut Vec<Effect>,
) {
    let meal = next.current_meal().to_string();

    if meal.is_empty() {
        return reject(
            next,
            effects,
            NotificationKind::Error,
            "Please enter or select a meal name.".to_string(),
            "Failed to save meal: No meal name provided".to_string(),
        );
    }

    if !next.quantity.is_finite() || next.quantity <= 0.0 {
        return reject(
            next,
            effects,
            NotificationKind::Error,
            "Please enter a valid quantity greater than 0.".to_string(),
            "Failed to save meal: Invalid quantity".to_string(),
        );
    }

    effects.push(Effect::AppendLog {
        timestamp: now,
        category: next.category,
        name: meal.clone(),
        quantity: next.quantity,
    });
    effects.push(Effect::notify(
        NotificationKind::Success,
        format!("Meal saved: {} ({} servings)", meal, next.quantity),
    ));

    let in_catalog = find(catalog, &meal).is_some();
    let message = if in_catalog {
        "Meal saved successfully!".to_string()
    } else {
        "Meal saved successfully! Consider adding it to your database for quick selection."
            .to_string()
    };

    next.selected_meal = None;
    next.meal_input.clear();
    succeed(next, &message);
}

fn confirm_add(next: &mut UiState, catalog: &[CatalogEntry], effects: &mut Vec<Effect>) {
    let Some(popup) = next.add_popup.clone() else {
        return;
    };
    let name = popup.name.trim().to_string();

    if name.is_empty() {
        return reject(
            next,
            effects,
            NotificationKind::Error,
            "Please enter a meal name.".to_string(),
            format!("Failed to add meal: {}", ValidationError::EmptyMealName),
        );
    }

    if find(catalog, &name).is_some() {
        let message = ValidationError::DuplicateMeal(name).to_string();
        return reject(next, effects, NotificationKind::Warning, message.clone(), message);
    }

    effects.push(Effect::AddCatalog {
        name: name.clone(),
        category: popup.category,
    });
    effects.push(Effect::notify(
        NotificationKind::Success,
        format!("'{}' added to database!", name),
    ));
    next.add_popup = None;
    succeed(next, &format!("'{}' added to database!", name));
}

fn confirm_edit(next: &mut UiState, catalog: &[CatalogEntry], effects: &mut Vec<Effect>) {
    let Some(target) = next.edit_target.clone() else {
        return;
    };
    let new_name = target.name.trim().to_string();
    let notice = format!("Failed to update meal '{}'", target.original);

    if new_name.is_empty() {
        return reject(
            next,
            effects,
            NotificationKind::Error,
            "Please enter a meal name.".to_string(),
            format!("{}: {}", notice, ValidationError::EmptyMealName),
        );
    }

    if find(catalog, &target.original).is_none() {
        return reject(
            next,
            effects,
            NotificationKind::Error,
            ValidationError::MealNotFound(target.original.clone()).to_string(),
            notice,
        );
    }

    if new_name != target.original && find(catalog, &new_name).is_some() {
        return reject(
            next,
            effects,
            NotificationKind::Error,
            ValidationError::DuplicateMeal(new_name).to_string(),
            notice,
        );
    }

    effects.push(Effect::UpdateCatalog {
        old_name: target.original.clone(),
        new_name: new_name.clone(),
        category: target.category,
    });
    effects.push(Effect::notify(
        NotificationKind::Success,
        format!("Meal '{}' updated to '{}'!", target.original, new_name),
    ));

    if next.selected_meal.as_deref() == Some(target.original.as_str()) {
        next.selected_meal = Some(new_name);
    }
    next.edit_target = None;
    succeed(next, "Meal updated successfully!");
}

/// Refuse the command: status for the user plus an audit notification
fn reject(
    next: &mut UiState,
    effects: &mut Vec<Effect>,
    kind: NotificationKind,
    status: String,
    notice: String,
) {
    next.status = Some(Status {
        kind,
        message: status,
    });
    effects.push(Effect::notify(kind, notice));
}

fn succeed(next: &mut UiState, message: &str) {
    next.status = Some(Status {
        kind: NotificationKind::Success,
        message: message.to_string(),
    });
}

fn find<'a>(catalog: &'a [CatalogEntry], name: &str) -> Option<&'a CatalogEntry> {
    catalog.iter().find(|e| e.name == name)
}

// ============================================================================
// QUERIES
// ============================================================================

/// Autocomplete suggestions for the typed text.
///
/// Hidden once the text is exactly the picked suggestion.
pub fn suggestions(state: &UiState, catalog: &[CatalogEntry]) -> Vec<MatchResult> {
    let input = state.meal_input.trim();
    if input.is_empty() || state.selected_meal.as_deref() == Some(input) {
        return Vec::new();
    }

    let names: Vec<&str> = catalog.iter().map(|e| e.name.as_str()).collect();
    FuzzyMatcher::new().rank(input, &names)
}

/// True when the meal about to be logged is not in the catalog yet
pub fn needs_catalog_entry(state: &UiState, catalog: &[CatalogEntry]) -> bool {
    let meal = state.current_meal();
    !meal.is_empty() && find(catalog, meal).is_none()
}

// ============================================================================
// TESTS
// ============================================================================
