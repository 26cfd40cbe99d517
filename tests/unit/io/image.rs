//! Tests for image loading, resizing and tile rendering

#[cfg(test)]
mod tests {
    use image::{Rgb, RgbImage};
    use photomosaic::MosaicError;
    use photomosaic::algorithm::matcher::Placement;
    use photomosaic::io::image::{
        bound_long_edge, bound_short_edge, fit_cover, load_rgb, render_tile, save_rgb,
    };

    // Tests that saving creates missing directories and loading restores pixels
    // Verified by not creating the parent directory
    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("{e}"));
        let path = dir.path().join("nested").join("deeper").join("img.png");
        let image = RgbImage::from_fn(5, 3, |x, y| Rgb([x as u8 * 40, y as u8 * 80, 7]));

        save_rgb(&image, &path).unwrap_or_else(|e| panic!("{e}"));
        let loaded = load_rgb(&path).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(loaded, image);

        assert!(matches!(
            load_rgb(&dir.path().join("missing.png")),
            Err(MosaicError::ImageLoad { .. })
        ));
    }

    // Tests that downsampling bounds the long edge and never upscales
    // Verified by scaling by the short edge
    #[test]
    fn test_bound_long_edge() {
        let wide = RgbImage::new(300, 100);
        assert_eq!(bound_long_edge(&wide, 90).dimensions(), (90, 30));

        let tall = RgbImage::new(20, 200);
        assert_eq!(bound_long_edge(&tall, 50).dimensions(), (5, 50));

        let small = RgbImage::new(10, 8);
        assert_eq!(bound_long_edge(&small, 100).dimensions(), (10, 8));
    }

    // Tests that the short-edge bound keeps enough pixels to cover a square of the bound
    // Verified by bounding the long edge instead
    #[test]
    fn test_bound_short_edge() {
        let wide = RgbImage::new(300, 100);
        assert_eq!(bound_short_edge(&wide, 20).dimensions(), (60, 20));

        let tall = RgbImage::new(40, 400);
        assert_eq!(bound_short_edge(&tall, 8).dimensions(), (8, 80));

        let small = RgbImage::new(10, 8);
        assert_eq!(bound_short_edge(&small, 32).dimensions(), (10, 8));
        assert_eq!(bound_short_edge(&wide, 0).dimensions(), (300, 100));
    }

    // Tests exact output size and center cropping
    // Verified by stretching instead of cropping
    #[test]
    fn test_fit_cover() {
        let striped = RgbImage::from_fn(30, 10, |x, _| {
            if (10..20).contains(&x) { Rgb([0, 255, 0]) } else { Rgb([255, 0, 0]) }
        });
        let square = fit_cover(&striped, 10, 10);

        assert_eq!(square.dimensions(), (10, 10));
        assert!(square.pixels().all(|pixel| pixel.0 == [0, 255, 0]));

        assert_eq!(fit_cover(&striped, 7, 13).dimensions(), (7, 13));
    }

    // Tests that a rendered tile sits on the padding background at its offset
    // Verified by ignoring the placement offset
    #[test]
    fn test_render_tile() {
        let tile = RgbImage::from_pixel(4, 4, Rgb([0, 0, 0]));
        let placement = Placement {
            offset_x: 1,
            offset_y: 2,
            width: 3,
            height: 3,
        };
        let rendered = render_tile(&tile, (6, 6), &placement, [255, 255, 255]);

        assert_eq!(rendered.dimensions(), (6, 6));
        assert_eq!(rendered.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(rendered.get_pixel(1, 2).0, [0, 0, 0]);
        assert_eq!(rendered.get_pixel(3, 4).0, [0, 0, 0]);
        assert_eq!(rendered.get_pixel(4, 4).0, [255, 255, 255]);
        assert_eq!(rendered.get_pixel(3, 5).0, [255, 255, 255]);
    }
}
