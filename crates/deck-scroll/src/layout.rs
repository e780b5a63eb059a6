use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Where a card lands in the viewport after a programmatic scroll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CardAlignment {
    #[default]
    Start,
    Center,
    End,
}

/// Horizontal geometry of equally sized cards.
///
/// Content is `padding`, then the cards separated by `spacing`, then
/// `padding` again.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardLayout {
    card_count: usize,
    card_width: f32,
    spacing: f32,
    padding: f32,
    viewport_width: f32,
}

impl CardLayout {
    pub fn new(card_count: usize, card_width: f32, spacing: f32, padding: f32, viewport_width: f32) -> Self {
        Self {
            card_count,
            card_width: card_width.max(0.0),
            spacing: spacing.max(0.0),
            padding: padding.max(0.0),
            viewport_width: viewport_width.max(0.0),
        }
    }

    /// One card fills the viewport.
    pub fn single_column(card_count: usize, viewport_width: f32, spacing: f32) -> Self {
        Self::new(card_count, viewport_width, spacing, 0.0, viewport_width)
    }

    /// `columns` cards share the viewport.
    pub fn multi_column(
        card_count: usize,
        viewport_width: f32,
        columns: usize,
        spacing: f32,
        padding: f32,
    ) -> Self {
        let columns = columns.max(1) as f32;
        let usable = viewport_width - 2.0 * padding - spacing * (columns - 1.0);
        Self::new(card_count, usable / columns, spacing, padding, viewport_width)
    }

    pub fn card_count(&self) -> usize {
        self.card_count
    }

    pub fn card_width(&self) -> f32 {
        self.card_width
    }

    pub fn viewport_width(&self) -> f32 {
        self.viewport_width
    }

    fn stride(&self) -> f32 {
        self.card_width + self.spacing
    }

    pub fn content_width(&self) -> f32 {
        if self.card_count == 0 {
            return 0.0;
        }
        let n = self.card_count as f32;
        2.0 * self.padding + n * self.card_width + (n - 1.0) * self.spacing
    }

    pub fn max_scroll_offset(&self) -> f32 {
        (self.content_width() - self.viewport_width).max(0.0)
    }

    pub fn clamp(&self, offset: f32) -> f32 {
        if offset.is_nan() {
            return 0.0;
        }
        offset.clamp(0.0, self.max_scroll_offset())
    }

    /// Left edge of card `index` in content coordinates.
    pub fn card_start(&self, index: usize) -> f32 {
        self.padding + index as f32 * self.stride()
    }

    /// Offset that brings card `index` to the start of the viewport, clamped
    /// to the scroll range. These are the boundaries flings settle on.
    pub fn card_scroll_offset(&self, index: usize) -> f32 {
        self.clamp(index as f32 * self.stride())
    }

    pub fn boundaries(&self) -> Vec<f32> {
        (0..self.card_count).map(|i| self.card_scroll_offset(i)).collect()
    }

    pub fn aligned_offset(&self, index: usize, alignment: CardAlignment) -> f32 {
        let start = self.card_start(index);
        let raw = match alignment {
            CardAlignment::Start => start - self.padding,
            CardAlignment::Center => start + self.card_width / 2.0 - self.viewport_width / 2.0,
            CardAlignment::End => start + self.card_width + self.padding - self.viewport_width,
        };
        self.clamp(raw)
    }

    /// Cards overlapping the viewport at `offset`.
    pub fn visible_cards(&self, offset: f32) -> Range<usize> {
        let left = offset;
        let right = offset + self.viewport_width;
        let mut first = None;
        let mut end = 0;
        for index in 0..self.card_count {
            let start = self.card_start(index);
            let overlaps = start < right && start + self.card_width > left;
            if overlaps {
                first.get_or_insert(index);
                end = index + 1;
            } else if first.is_some() {
                break;
            }
        }
        match first {
            Some(first) => first..end,
            None => 0..0,
        }
    }

    /// Card whose boundary is closest to `offset`; ties go to the earlier card.
    pub fn nearest_card(&self, offset: f32) -> Option<usize> {
        (0..self.card_count).min_by(|a, b| {
            let da = (self.card_scroll_offset(*a) - offset).abs();
            let db = (self.card_scroll_offset(*b) - offset).abs();
            da.total_cmp(&db).then(a.cmp(b))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_column_boundaries_are_viewport_multiples() {
        let layout = CardLayout::single_column(3, 400.0, 0.0);
        assert_eq!(layout.boundaries(), vec![0.0, 400.0, 800.0]);
        assert_eq!(layout.max_scroll_offset(), 800.0);
        assert_eq!(layout.visible_cards(400.0), 1..2);
        assert_eq!(layout.visible_cards(200.0), 0..2);
    }

    #[test]
    fn multi_column_clamps_trailing_boundaries() {
        // 3 columns of 100 with 10 spacing and 10 padding in a 340 viewport
        let layout = CardLayout::multi_column(5, 340.0, 3, 10.0, 10.0);
        assert!((layout.card_width() - 100.0).abs() < 1e-4);
        assert!((layout.max_scroll_offset() - 220.0).abs() < 1e-3);
        let boundaries = layout.boundaries();
        assert!((boundaries[1] - 110.0).abs() < 1e-3);
        assert!((boundaries[4] - 220.0).abs() < 1e-3);
        assert_eq!(layout.visible_cards(0.0), 0..3);
    }

    #[test]
    fn alignment_positions_card() {
        let layout = CardLayout::multi_column(6, 340.0, 3, 10.0, 10.0);
        assert_eq!(layout.aligned_offset(0, CardAlignment::End), 0.0);
        let centered = layout.aligned_offset(3, CardAlignment::Center);
        assert!((layout.card_start(3) + 50.0 - centered - 170.0).abs() < 1e-3);
    }

    #[test]
    fn empty_layout_has_no_range() {
        let layout = CardLayout::single_column(0, 400.0, 0.0);
        assert_eq!(layout.max_scroll_offset(), 0.0);
        assert_eq!(layout.nearest_card(10.0), None);
        assert_eq!(layout.visible_cards(0.0), 0..0);
    }

    #[test]
    fn nearest_card_prefers_earlier_on_tie() {
        let layout = CardLayout::single_column(3, 100.0, 0.0);
        assert_eq!(layout.nearest_card(50.0), Some(0));
        assert_eq!(layout.nearest_card(51.0), Some(1));
    }
}
