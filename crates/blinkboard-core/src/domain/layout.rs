//! Immutable key layout for the scanning keyboard.

use anyhow::Result;

/// Labels of the default layout, in scan order.
pub const DEFAULT_KEYS: &str = "1234567890QWERTYUIOPASDFGHJKL;ZXCVBNM,./-=[]\\'`!@#$%^&*()_+~";

/// Columns in the default grid.
pub const DEFAULT_COLUMNS: usize = 12;

/// Edge length of a key cell in pixels.
pub const KEY_SIZE: u32 = 100;

/// Pixel rectangle occupied by one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyCell {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Cell width.
    pub width: u32,
    /// Cell height.
    pub height: u32,
}

/// Ordered key labels arranged in a fixed-column grid.
///
/// Built once at startup and never modified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyLayout {
    keys: Vec<char>,
    columns: usize,
}

impl KeyLayout {
    /// Creates a layout from labels in scan order.
    ///
    /// `columns` is capped at the number of keys.
    ///
    /// # Errors
    ///
    /// Returns an error if there are no labels or `columns` is zero.
    pub fn new(keys: impl IntoIterator<Item = char>, columns: usize) -> Result<Self> {
        let keys: Vec<char> = keys.into_iter().collect();
        if keys.is_empty() {
            anyhow::bail!("key layout must contain at least one key");
        }
        if columns == 0 {
            anyhow::bail!("key layout must have at least one column");
        }
        let columns = columns.min(keys.len());
        Ok(Self { keys, columns })
    }

    /// Number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Always false: a layout holds at least one key.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Number of grid columns.
    #[must_use]
    pub const fn columns(&self) -> usize {
        self.columns
    }

    /// Number of grid rows.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.keys.len().div_ceil(self.columns)
    }

    /// Label at `index`, if in range.
    #[must_use]
    pub fn label(&self, index: usize) -> Option<char> {
        self.keys.get(index).copied()
    }

    /// Iterates `(index, label)` in scan order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, char)> + '_ {
        self.keys.iter().copied().enumerate()
    }

    /// Pixel cell for the key at `index`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn cell(&self, index: usize) -> KeyCell {
        let col = (index % self.columns) as u32;
        let row = (index / self.columns) as u32;
        KeyCell {
            x: col * KEY_SIZE,
            y: row * KEY_SIZE,
            width: KEY_SIZE,
            height: KEY_SIZE,
        }
    }

    /// Canvas size `(width, height)` needed to draw every key.
    #[must_use]
    pub fn canvas_size(&self) -> (u32, u32) {
        let px = |n: usize| u32::try_from(n).unwrap_or(u32::MAX).saturating_mul(KEY_SIZE);
        (px(self.columns), px(self.rows()))
    }
}

impl Default for KeyLayout {
    fn default() -> Self {
        Self {
            keys: DEFAULT_KEYS.chars().collect(),
            columns: DEFAULT_COLUMNS,
        }
    }
}
