use crate::models::{Icon, IrrigationAction, Tone};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Badge style for a recommended action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActionStyle {
    pub icon: Icon,
    pub label: &'static str,
    pub tone: Tone,
}

impl ActionStyle {
    pub fn text_class(&self) -> &'static str {
        self.tone.text_class()
    }

    pub fn bg_class(&self) -> &'static str {
        self.tone.bg_class()
    }

    pub fn is_unknown(&self) -> bool {
        *self == UNKNOWN_ACTION_STYLE
    }
}

pub const UNKNOWN_ACTION_STYLE: ActionStyle = ActionStyle {
    icon: Icon::HelpCircle,
    label: "Невідомо",
    tone: Tone::Gray,
};

fn style_for(action: &IrrigationAction) -> ActionStyle {
    let (icon, label, tone) = match action {
        IrrigationAction::None => (Icon::CheckCircle, "Не потрібно", Tone::Green),
        IrrigationAction::Light => (Icon::Droplet, "Легке", Tone::Sky),
        IrrigationAction::Medium => (Icon::Droplet, "Помірне", Tone::Blue),
        IrrigationAction::Intensive => (Icon::Droplets, "Інтенсивне", Tone::Orange),
        IrrigationAction::VeryIntensive => (Icon::AlertTriangle, "Дуже інтенсивне", Tone::Red),
        IrrigationAction::Unrecognized(_) => return UNKNOWN_ACTION_STYLE,
    };
    ActionStyle { icon, label, tone }
}

static ACTION_STYLES: LazyLock<HashMap<&'static str, ActionStyle>> = LazyLock::new(|| {
    IrrigationAction::ALL
        .iter()
        .filter_map(|action| Some((action.phrase()?, style_for(action))))
        .collect()
});

/// Style for the backend's action phrase. Never fails: anything outside the
/// five known phrases gets [`UNKNOWN_ACTION_STYLE`].
pub fn classify_action(phrase: &str) -> ActionStyle {
    ACTION_STYLES
        .get(phrase.trim())
        .copied()
        .unwrap_or(UNKNOWN_ACTION_STYLE)
}

impl IrrigationAction {
    pub fn style(&self) -> ActionStyle {
        classify_action(self.as_str())
    }
}
