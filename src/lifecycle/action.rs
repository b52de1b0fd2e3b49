use serde::{Deserialize, Serialize};

/// What the next flush must do to the renderer.
///
/// Variants are ordered by precedence so pending actions can be coalesced
/// with [`LifecycleAction::max`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum LifecycleAction {
    #[default]
    None,
    /// Merge the new option into the live chart.
    Update,
    /// Dispose and recreate the chart; the theme changed.
    Reinit,
    /// Create the chart for the first time.
    Init,
}

impl LifecycleAction {
    #[must_use]
    pub const fn max(self, other: Self) -> Self {
        if self as u8 >= other as u8 {
            self
        } else {
            other
        }
    }

    #[must_use]
    pub const fn is_none(self) -> bool {
        matches!(self, Self::None)
    }
}

/// Decides the action for one observed option set.
///
/// Precedence: first option ever seen, then theme change, then content
/// change. `serialized` is compared against the last *seen* option, not the
/// last applied one.
#[must_use]
pub fn classify_change(
    last_serialized: Option<&str>,
    current_theme: Option<&str>,
    requested_theme: Option<&str>,
    serialized: &str,
) -> LifecycleAction {
    match last_serialized {
        None => LifecycleAction::Init,
        Some(_) if requested_theme != current_theme => LifecycleAction::Reinit,
        Some(last) if last != serialized => LifecycleAction::Update,
        Some(_) => LifecycleAction::None,
    }
}
