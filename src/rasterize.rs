//! Painting traced contours back onto a canvas of the source size.

use image::{DynamicImage, GrayImage, Luma, RgbaImage};
use imageproc::drawing::draw_line_segment_mut;
use log::debug;

use crate::colors::generate_contrasting_colors;
use crate::contours::Contour;

/// Paints every contour at 255 on a zero canvas of `width` x `height`.
///
/// Sub-pixel points are rounded to the nearest pixel and consecutive points are
/// joined with line segments, including the closing segment of a closed
/// contour. No contours give an all-zero canvas.
pub fn paint_contours(contours: &[Contour], width: u32, height: u32) -> GrayImage {
    let mut canvas = GrayImage::new(width, height);
    for contour in contours {
        draw_contour(&mut canvas, contour, Luma([255]));
    }
    debug!("painted {} contours on {width}x{height}", contours.len());
    canvas
}

/// Draws each contour in its own color over the grayscale `background`.
///
/// Intended for inspecting what the tracer kept; the colors carry no meaning
/// beyond telling contours apart.
pub fn draw_overlay(background: &GrayImage, contours: &[Contour]) -> RgbaImage {
    let mut canvas = DynamicImage::ImageLuma8(background.clone()).to_rgba8();
    let colors = generate_contrasting_colors(contours.len(), 255);
    for (contour, color) in contours.iter().zip(colors) {
        draw_contour(&mut canvas, contour, color);
    }
    canvas
}

fn draw_contour<P>(
    canvas: &mut image::ImageBuffer<P, Vec<P::Subpixel>>,
    contour: &Contour,
    color: P,
) where
    P: image::Pixel,
{
    let points: Vec<(f32, f32)> = contour
        .points()
        .iter()
        .map(|p| (p.x.round(), p.y.round()))
        .collect();

    match points.as_slice() {
        [] => {}
        [(x, y)] => {
            let (w, h) = canvas.dimensions();
            if *x >= 0.0 && *y >= 0.0 && (*x as u32) < w && (*y as u32) < h {
                canvas.put_pixel(*x as u32, *y as u32, color);
            }
        }
        _ => {
            for pair in points.windows(2) {
                draw_line_segment_mut(canvas, pair[0], pair[1], color);
            }
            if contour.is_closed() {
                draw_line_segment_mut(canvas, points[points.len() - 1], points[0], color);
            }
        }
    }
}
