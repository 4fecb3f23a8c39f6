//! Quick-add estimates for meals with no catalog entry

/// A preset calorie estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuickAdd {
    pub label: &'static str,
    pub description: &'static str,
    pub calories: u32,
}

pub const SMALL_MEAL: QuickAdd = QuickAdd {
    label: "Small meal",
    description: "Light snack, fruit",
    calories: 150,
};

pub const MEDIUM_MEAL: QuickAdd = QuickAdd {
    label: "Medium meal",
    description: "Regular portion",
    calories: 400,
};

pub const LARGE_MEAL: QuickAdd = QuickAdd {
    label: "Large meal",
    description: "Full plate",
    calories: 700,
};

pub const QUICK_ADD_PRESETS: [QuickAdd; 3] = [SMALL_MEAL, MEDIUM_MEAL, LARGE_MEAL];

/// Look a preset up by its label, ignoring case
pub fn find_preset(label: &str) -> Option<QuickAdd> {
    QUICK_ADD_PRESETS
        .iter()
        .copied()
        .find(|p| p.label.eq_ignore_ascii_case(label))
}
