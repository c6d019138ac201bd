use serde::{Deserialize, Serialize};

/// The fixed set of expense categories.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum Category {
    Housing,
    Food,
    Transportation,
    Entertainment,
    Healthcare,
    Misc,
}

serde_plain::derive_display_from_serialize!(Category);
serde_plain::derive_fromstr_from_deserialize!(Category);

impl Category {
    /// All categories in menu order.
    pub const ALL: [Category; 6] = [
        Category::Housing,
        Category::Food,
        Category::Transportation,
        Category::Entertainment,
        Category::Healthcare,
        Category::Misc,
    ];

    /// Maps a 1-based menu number to its category.
    pub fn from_menu_number(number: usize) -> Option<Category> {
        number
            .checked_sub(1)
            .and_then(|ix| Self::ALL.get(ix))
            .copied()
    }

    /// The 1-based number under which this category is listed.
    pub fn menu_number(self) -> usize {
        self as usize + 1
    }

    /// Finds a category by name, ignoring case and surrounding whitespace.
    pub fn from_name(name: &str) -> Option<Category> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.to_string().eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_menu_numbers_are_bijective() {
        for (ix, category) in Category::ALL.into_iter().enumerate() {
            assert_eq!(category.menu_number(), ix + 1);
            assert_eq!(Category::from_menu_number(ix + 1), Some(category));
        }
        assert_eq!(Category::from_menu_number(0), None);
        assert_eq!(Category::from_menu_number(7), None);
    }

    #[test]
    fn test_display_and_parse() {
        assert_eq!(Category::Transportation.to_string(), "Transportation");
        assert_eq!(Category::from_str("Misc").unwrap(), Category::Misc);
        assert!(Category::from_str("misc").is_err());
    }

    #[test]
    fn test_from_name_ignores_case() {
        assert_eq!(Category::from_name(" healthcare "), Some(Category::Healthcare));
        assert_eq!(Category::from_name("FOOD"), Some(Category::Food));
        assert_eq!(Category::from_name("Groceries"), None);
    }
}
