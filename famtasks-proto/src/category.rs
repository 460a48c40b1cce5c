//! Static category catalog.
//!
//! Categories are fixed for the lifetime of the process. Icons are a
//! closed set so every category is guaranteed to render.

/// Icon shown next to a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoryIcon {
    /// Shopping cart.
    ShoppingCart,
    /// Sparkles (cleaning).
    Sparkles,
    /// Car.
    Car,
    /// Person.
    User,
}

impl CategoryIcon {
    /// Terminal glyph for the icon.
    #[must_use]
    pub const fn glyph(self) -> &'static str {
        match self {
            Self::ShoppingCart => "\u{1f6d2}",
            Self::Sparkles => "\u{2728}",
            Self::Car => "\u{1f697}",
            Self::User => "\u{1f464}",
        }
    }
}

/// One catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    /// Stable id referenced by [`Task::category`](crate::task::Task::category).
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Icon.
    pub icon: CategoryIcon,
    /// Accent colour as a CSS hex string.
    pub color: &'static str,
}

/// The built-in categories, in display order.
pub static CATEGORIES: [Category; 4] = [
    Category {
        id: "groceries",
        name: "Groceries",
        icon: CategoryIcon::ShoppingCart,
        color: "#10B981",
    },
    Category {
        id: "chores",
        name: "Chores",
        icon: CategoryIcon::Sparkles,
        color: "#8B5CF6",
    },
    Category {
        id: "errands",
        name: "Errands",
        icon: CategoryIcon::Car,
        color: "#F59E0B",
    },
    Category {
        id: "personal",
        name: "Personal",
        icon: CategoryIcon::User,
        color: "#EC4899",
    },
];

/// Looks up a category by id.
#[must_use]
pub fn find(id: &str) -> Option<&'static Category> {
    CATEGORIES.iter().find(|c| c.id == id)
}

/// Icon for a category id, falling back to [`CategoryIcon::User`] for ids
/// outside the catalog.
#[must_use]
pub fn icon_for(id: &str) -> CategoryIcon {
    find(id).map_or(CategoryIcon::User, |c| c.icon)
}
