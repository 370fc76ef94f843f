//! Card bounding boxes

use serde::Serialize;

/// Axis-aligned rectangle around one detected card, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct CardBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CardBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Point the click executor aims at
    pub fn center(&self) -> (u32, u32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Check if this box contains a point
    pub fn contains_point(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < (self.x + self.width) && y >= self.y && y < (self.y + self.height)
    }

    /// Check if this box is valid (non-zero dimensions)
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Clip to image boundaries, keeping the top-left corner inside the image
    pub fn clip_to(&self, image_width: u32, image_height: u32) -> CardBox {
        let x = self.x.min(image_width.saturating_sub(1));
        let y = self.y.min(image_height.saturating_sub(1));
        CardBox {
            x,
            y,
            width: self.width.min(image_width.saturating_sub(x)),
            height: self.height.min(image_height.saturating_sub(y)),
        }
    }

    /// Reading-order key: top-to-bottom, then left-to-right
    pub fn sort_key(&self) -> (u32, u32) {
        (self.y, self.x)
    }
}

impl std::fmt::Display for CardBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{},{},{},{}]", self.x, self.y, self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_uses_integer_division() {
        let card = CardBox::new(100, 150, 51, 49);
        assert_eq!(card.center(), (125, 174));
    }

    #[test]
    fn test_clip_to_image_bounds() {
        let card = CardBox::new(1000, 2200, 200, 200);
        let clipped = card.clip_to(1080, 2280);
        assert_eq!(clipped, CardBox::new(1000, 2200, 80, 80));

        assert!(!CardBox::new(5, 5, 10, 10).clip_to(0, 0).is_valid());
    }

    #[test]
    fn test_contains_point_is_half_open() {
        let card = CardBox::new(10, 10, 80, 80);
        assert!(card.contains_point(10, 10));
        assert!(card.contains_point(89, 89));
        assert!(!card.contains_point(90, 50));
    }

    #[test]
    fn test_area_does_not_overflow() {
        assert_eq!(CardBox::new(0, 0, 80, 80).area(), 6400);
        assert_eq!(CardBox::new(0, 0, 70_000, 70_000).area(), 4_900_000_000);
    }

    #[test]
    fn test_display_format() {
        assert_eq!(CardBox::new(1, 2, 3, 4).to_string(), "[1,2,3,4]");
    }
}
