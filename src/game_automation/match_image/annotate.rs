//! Debug overlay: outline detected cards, one color per matched pair

use super::{detector::BoardAnalysis, region::CardBox};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

const UNPAIRED_COLOR: Rgb<u8> = Rgb([128, 128, 128]);

const PAIR_COLORS: [Rgb<u8>; 6] = [
    Rgb([230, 25, 75]),
    Rgb([60, 180, 75]),
    Rgb([0, 130, 200]),
    Rgb([245, 130, 48]),
    Rgb([145, 30, 180]),
    Rgb([70, 240, 240]),
];

/// Outline thickness in pixels
const LINE_WIDTH: u32 = 3;

/// Copy of `image` with every card outlined.
///
/// Unpaired cards get a grey outline; both cards of a pair share a color.
pub fn annotate_board(image: &RgbImage, analysis: &BoardAnalysis) -> RgbImage {
    let mut canvas = image.clone();

    for card in analysis.unpaired_cards() {
        draw_outline(&mut canvas, &card, UNPAIRED_COLOR);
    }
    for (i, pair) in analysis.pairs.iter().enumerate() {
        let color = PAIR_COLORS[i % PAIR_COLORS.len()];
        draw_outline(&mut canvas, &pair.first, color);
        draw_outline(&mut canvas, &pair.second, color);
    }

    canvas
}

fn draw_outline(canvas: &mut RgbImage, card: &CardBox, color: Rgb<u8>) {
    for inset in 0..LINE_WIDTH {
        if card.width <= 2 * inset || card.height <= 2 * inset {
            break;
        }
        let rect = Rect::at((card.x + inset) as i32, (card.y + inset) as i32)
            .of_size(card.width - 2 * inset, card.height - 2 * inset);
        draw_hollow_rect_mut(canvas, rect, color);
    }
}
