//! Screen router for the interactive workflow.
//!
//! The workflow is a fixed sequence of steps with one branch (print or save).
//! Navigation is a pure function of the current screen and an event; the
//! caller owns the current screen and any per-step state.

use serde::Serialize;

/// A step of the workflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    /// Pick and validate a template.
    #[default]
    Import,
    /// Bind placeholders to columns, constants, or blank.
    Mapping,
    /// Choose between printing and saving.
    Selection,
    /// Choose a printer.
    PrintConfig,
    /// Choose an output directory, name, and format.
    SaveConfig,
    /// The batch is running or has finished.
    Processing,
}

/// A navigation request from the current screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WizardEvent {
    /// Continue to the next step.
    Next,
    /// Return to the previous step.
    Back,
    /// On the selection screen: print labels.
    ChoosePrint,
    /// On the selection screen: save labels to a file.
    ChooseSave,
    /// On the processing screen: start over.
    Finish,
}

/// The screen that follows `screen` after `event`.
///
/// Events that make no sense on a screen leave it unchanged.
pub fn transition(screen: Screen, event: WizardEvent) -> Screen {
    use Screen::*;
    use WizardEvent::*;

    match (screen, event) {
        (Import, Next) => Mapping,
        (Mapping, Next) => Selection,
        (Mapping, Back) => Import,
        (Selection, ChoosePrint) => PrintConfig,
        (Selection, ChooseSave) => SaveConfig,
        (Selection, Back) => Mapping,
        (PrintConfig | SaveConfig, Next) => Processing,
        (PrintConfig | SaveConfig, Back) => Selection,
        (Processing, Finish) => Import,
        (current, _) => current,
    }
}
