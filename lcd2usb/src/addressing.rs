/*!
Display addressing: mapping logical (row, column) cells onto the owning
controller chip and its linear address space.

Each controller chip exposes two 64-cell halves regardless of the logical
layout, a wiring convention shared by most multi-row character modules. Large
displays (more than 2 rows and more than 20 columns) split their rows across
two chips; 16x4 modules use a 16-column stride where everything else uses 20.
*/

use crate::protocol::ControllerMap;

/// Logical display geometry, fixed at configuration time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub columns: u8,
    pub rows: u8,
}

impl Geometry {
    pub fn new(columns: u8, rows: u8) -> Self {
        Self { columns, rows }
    }

    /// Resolve a logical cell to the chip that owns it and the chip-local
    /// linear address.
    ///
    /// The returned target still has to be masked against the detected
    /// [`ControllerMap`] before use; a chip that was never found must not be
    /// addressed.
    pub fn locate(&self, row: u8, column: u8) -> (ControllerMap, u8) {
        let mut row = row;
        let mut target = ControllerMap::CTRL0;

        // Displays with more than two rows and 20 columns have a logical
        // width of 40 chars and use a second controller for rows 2 and up.
        if self.rows > 2 && self.columns > 20 && row > 1 {
            row -= 2;
            target = ControllerMap::CTRL1;
        }

        // 16x4 modules use a slightly different layout
        let position = if self.columns == 16 && self.rows == 4 {
            (row % 2) * 64 + (row / 2) * 16 + column
        } else {
            (row % 2) * 64 + (row / 2) * 20 + column
        };

        (target, position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_row_display_stays_on_first_controller() {
        let geo = Geometry::new(20, 2);
        assert_eq!(geo.locate(0, 0), (ControllerMap::CTRL0, 0));
        assert_eq!(geo.locate(1, 0), (ControllerMap::CTRL0, 64));
        assert_eq!(geo.locate(1, 7), (ControllerMap::CTRL0, 71));
    }

    #[test]
    fn test_four_row_twenty_column_display_uses_one_controller() {
        // 20 columns is not "more than 20": all four rows live on CTRL0
        let geo = Geometry::new(20, 4);
        assert_eq!(geo.locate(2, 0), (ControllerMap::CTRL0, 20));
        assert_eq!(geo.locate(3, 5), (ControllerMap::CTRL0, 89));
    }

    #[test]
    fn test_wide_display_rebase_onto_second_controller() {
        let geo = Geometry::new(40, 4);
        // rows 0/1 on the first chip
        assert_eq!(geo.locate(1, 3), (ControllerMap::CTRL0, 67));
        // row 2 rebases to row 0 of the second chip
        assert_eq!(geo.locate(2, 0), (ControllerMap::CTRL1, 0));
        assert_eq!(geo.locate(3, 10), (ControllerMap::CTRL1, 74));
    }

    #[test]
    fn test_16x4_uses_sixteen_column_stride() {
        let geo = Geometry::new(16, 4);
        assert_eq!(geo.locate(2, 0), (ControllerMap::CTRL0, 16));
        assert_eq!(geo.locate(3, 1), (ControllerMap::CTRL0, 81));
    }
}
