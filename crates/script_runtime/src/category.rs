//! Editor colors per node category
//!
//! Presentation only; nothing in the executor reads these.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryStyle {
    pub background: &'static str,
    pub border: &'static str,
}

const ALL: CategoryStyle = CategoryStyle {
    background: "#d4d4d4",
    border: "#737373",
};

const CATEGORY_STYLES: &[(&str, CategoryStyle)] = &[
    ("all", ALL),
    ("logic", CategoryStyle { background: "#0ea5e9", border: "#0369a1" }),
    ("event", CategoryStyle { background: "#eab308", border: "#a16207" }),
    ("input", CategoryStyle { background: "#eab308", border: "#a16207" }),
    ("math", CategoryStyle { background: "#f59e0b", border: "#b45309" }),
    ("entity", CategoryStyle { background: "#22c55e", border: "#15803d" }),
];

/// Style for `category`, or the neutral `all` style when it has none
pub fn category_style(category: &str) -> CategoryStyle {
    CATEGORY_STYLES
        .iter()
        .find(|(name, _)| *name == category)
        .map(|(_, style)| *style)
        .unwrap_or(ALL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TemplateRegistry;

    #[test]
    fn test_every_builtin_category_is_styled() {
        let registry = TemplateRegistry::with_builtins();
        for category in registry.categories() {
            assert_ne!(category_style(&category), ALL, "{category}");
        }
        assert_eq!(category_style("logic").background, "#0ea5e9");
        assert_eq!(category_style("unheard-of"), ALL);
    }
}
