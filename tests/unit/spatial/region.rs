//! Tests for regions and the partition container

#[cfg(test)]
mod tests {
    use ndarray::Array2;
    use photomosaic::color::{Lab, SalientColor};
    use photomosaic::spatial::{Partition, Region};

    fn region(x: u32, y: u32, width: u32, height: u32) -> Region {
        Region {
            x,
            y,
            width,
            height,
            color: SalientColor::from_lab(Lab::new(50.0, 0.0, 0.0)),
        }
    }

    // Tests region geometry helpers
    // Verified by using inclusive bounds in overlaps
    #[test]
    fn test_region_geometry() {
        let a = region(0, 0, 10, 10);
        let touching = region(10, 0, 10, 10);
        let inside = region(5, 5, 2, 2);

        assert_eq!(a.size(), (10, 10));
        assert_eq!(a.area(), 100);
        assert!(!a.overlaps(&touching));
        assert!(a.overlaps(&inside));
        assert!(inside.overlaps(&a));
        assert_eq!(a.lab(), Lab::new(50.0, 0.0, 0.0));
    }

    // Tests that a grid partition iterates row-major and reports its canvas
    // Verified by swapping rows and cols in canvas_size
    #[test]
    fn test_grid_partition() {
        let regions = Array2::from_shape_fn((2, 3), |(row, col)| {
            region(col as u32 * 4, row as u32 * 5, 4, 5)
        });
        let partition = Partition::Grid {
            tile_size: (4, 5),
            regions,
        };

        assert_eq!(partition.len(), 6);
        assert!(!partition.is_empty());
        assert_eq!(partition.canvas_size(), (12, 10));
        assert_eq!(partition.grid_shape(), Some((2, 3)));

        let origins: Vec<(u32, u32)> = partition.regions().map(|r| (r.x, r.y)).collect();
        assert_eq!(
            origins,
            [(0, 0), (4, 0), (8, 0), (0, 5), (4, 5), (8, 5)]
        );
    }

    // Tests that an adaptive partition keeps its stored canvas and order
    // Verified by deriving the canvas from the first region
    #[test]
    fn test_adaptive_partition() {
        let partition = Partition::Adaptive {
            cell_size: (4, 4),
            canvas: (8, 4),
            regions: vec![region(0, 0, 4, 4), region(4, 0, 4, 4)],
        };

        assert_eq!(partition.len(), 2);
        assert_eq!(partition.canvas_size(), (8, 4));
        assert_eq!(partition.grid_shape(), None);
        assert_eq!(partition.regions().map(|r| r.x).collect::<Vec<_>>(), [0, 4]);

        let empty = Partition::Adaptive {
            cell_size: (4, 4),
            canvas: (0, 0),
            regions: Vec::new(),
        };
        assert!(empty.is_empty());
    }
}
