use serde::{Deserialize, Serialize};

/// Independently toggleable overlay categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebugCategory {
    Grid,
    Frusta,
    Colliders,
    Icons,
    Joints,
}

impl DebugCategory {
    pub const ALL: [DebugCategory; 5] = [
        DebugCategory::Grid,
        DebugCategory::Frusta,
        DebugCategory::Colliders,
        DebugCategory::Icons,
        DebugCategory::Joints,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Grid => "grid",
            Self::Frusta => "frusta",
            Self::Colliders => "colliders",
            Self::Icons => "icons",
            Self::Joints => "joints",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label() == label)
    }

    /// Drawn with the shared line program.
    pub fn uses_lines(self) -> bool {
        matches!(self, Self::Grid | Self::Frusta | Self::Colliders)
    }

    fn slot(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for DebugCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for DebugCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| {
            let known: Vec<_> = Self::ALL.iter().map(|c| c.label()).collect();
            format!("unknown category '{s}', expected one of: {}", known.join(", "))
        })
    }
}

/// One flag per category plus a master switch.
///
/// Everything starts hidden. `set_active` overrides every category flag;
/// individual flags only take effect while the master switch is on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Visibility {
    active: bool,
    categories: [bool; DebugCategory::ALL.len()],
}

impl Visibility {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the master switch and force every category to the same value.
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
        self.categories = [active; DebugCategory::ALL.len()];
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_visible(&mut self, category: DebugCategory, visible: bool) {
        self.categories[category.slot()] = visible;
    }

    pub fn is_visible(&self, category: DebugCategory) -> bool {
        self.categories[category.slot()]
    }

    /// Flip one category, returning its new state.
    pub fn toggle(&mut self, category: DebugCategory) -> bool {
        let slot = &mut self.categories[category.slot()];
        *slot = !*slot;
        *slot
    }

    /// Whether `category` is drawn this frame.
    pub fn draws(&self, category: DebugCategory) -> bool {
        self.active && self.is_visible(category)
    }

    /// Whether any line-program category is drawn this frame.
    pub fn draws_lines(&self) -> bool {
        DebugCategory::ALL
            .into_iter()
            .any(|c| c.uses_lines() && self.draws(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_hidden() {
        let v = Visibility::new();
        assert!(!v.is_active());
        assert!(DebugCategory::ALL.iter().all(|&c| !v.is_visible(c)));
    }

    #[test]
    fn master_switch_overrides_individual_flags() {
        let mut v = Visibility::new();
        v.set_active(true);
        v.set_visible(DebugCategory::Grid, false);
        v.set_visible(DebugCategory::Joints, false);

        v.set_active(true);
        assert!(DebugCategory::ALL.iter().all(|&c| v.is_visible(c)));

        v.set_active(false);
        assert!(!v.is_active());
        assert!(DebugCategory::ALL.iter().all(|&c| !v.is_visible(c)));
    }

    #[test]
    fn categories_toggle_independently() {
        let mut v = Visibility::new();
        v.set_active(true);
        assert!(!v.toggle(DebugCategory::Frusta));
        assert!(!v.draws(DebugCategory::Frusta));
        assert!(v.draws(DebugCategory::Colliders));
        assert!(v.toggle(DebugCategory::Frusta));
        assert!(v.draws(DebugCategory::Frusta));
    }

    #[test]
    fn flags_do_not_draw_without_master() {
        let mut v = Visibility::new();
        v.set_visible(DebugCategory::Grid, true);
        assert!(v.is_visible(DebugCategory::Grid));
        assert!(!v.draws(DebugCategory::Grid));
        assert!(!v.draws_lines());
    }

    #[test]
    fn draws_lines_only_for_line_categories() {
        let mut v = Visibility::new();
        v.set_active(true);
        for c in [DebugCategory::Grid, DebugCategory::Frusta, DebugCategory::Colliders] {
            v.set_visible(c, false);
        }
        assert!(!v.draws_lines());
        v.set_visible(DebugCategory::Colliders, true);
        assert!(v.draws_lines());
    }

    #[test]
    fn labels_round_trip() {
        for c in DebugCategory::ALL {
            assert_eq!(DebugCategory::from_label(c.label()), Some(c));
        }
        assert!(DebugCategory::from_label("bones").is_none());
        assert_eq!("frusta".parse::<DebugCategory>(), Ok(DebugCategory::Frusta));
        assert!("bones".parse::<DebugCategory>().unwrap_err().contains("joints"));
    }
}
