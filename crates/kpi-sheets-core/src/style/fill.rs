//! Background fill

use super::Color;

/// Cell background. Report blocks only ever use solid fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FillStyle {
    #[default]
    None,
    Solid { color: Color },
}
