
//! Zigzag scan order for 8x8 blocks.
//!
//! Serializes a block of quantized coefficients such that low frequencies
//! (top left) come first and high frequencies (bottom right) come last.
//! High frequencies mostly quantize to zero, so the tail of each
//! serialized block becomes a long run of equal bytes.

use crate::compression::BLOCK_AREA;


/// For each position in the serialized order, the row-major index inside the block.
pub const SERIAL_TO_ROW_MAJOR: [usize; BLOCK_AREA] = [
     0,  1,  8, 16,  9,  2,  3, 10,
    17, 24, 32, 25, 18, 11,  4,  5,
    12, 19, 26, 33, 40, 48, 41, 34,
    27, 20, 13,  6,  7, 14, 21, 28,
    35, 42, 49, 56, 57, 50, 43, 36,
    29, 22, 15, 23, 30, 37, 44, 51,
    58, 59, 52, 45, 38, 31, 39, 46,
    53, 60, 61, 54, 47, 55, 62, 63,
];

/// For each row-major index inside the block, the position in the serialized order.
/// Inverse of `SERIAL_TO_ROW_MAJOR`.
pub const ROW_MAJOR_TO_SERIAL: [usize; BLOCK_AREA] = [
     0,  1,  5,  6, 14, 15, 27, 28,
     2,  4,  7, 13, 16, 26, 29, 42,
     3,  8, 12, 17, 25, 30, 41, 43,
     9, 11, 18, 24, 31, 40, 44, 53,
    10, 19, 23, 32, 39, 45, 52, 54,
    20, 22, 33, 38, 46, 51, 55, 60,
    21, 34, 37, 47, 50, 56, 59, 61,
    35, 36, 48, 49, 57, 58, 62, 63,
];


/// Reorder a row-major block into zigzag order.
#[inline]
pub fn scan<T: Copy>(block: &[T; BLOCK_AREA], serial: &mut [T; BLOCK_AREA]) {
    for (target, &source_index) in serial.iter_mut().zip(SERIAL_TO_ROW_MAJOR.iter()) {
        *target = block[source_index];
    }
}

/// Reorder a zigzag ordered sequence back into a row-major block.
#[inline]
pub fn unscan<T: Copy>(serial: &[T; BLOCK_AREA], block: &mut [T; BLOCK_AREA]) {
    for (target, &source_index) in block.iter_mut().zip(ROW_MAJOR_TO_SERIAL.iter()) {
        *target = serial[source_index];
    }
}


#[cfg(test)]
mod test {
    use super::*;
    use crate::compression::BLOCK_SIZE;

    #[test]
    fn tables_are_inverse() {
        for index in 0 .. BLOCK_AREA {
            assert_eq!(ROW_MAJOR_TO_SERIAL[SERIAL_TO_ROW_MAJOR[index]], index);
            assert_eq!(SERIAL_TO_ROW_MAJOR[ROW_MAJOR_TO_SERIAL[index]], index);
        }
    }

    #[test]
    fn each_step_moves_to_a_neighbour() {
        for pair in SERIAL_TO_ROW_MAJOR.windows(2) {
            let (row_a, column_a) = ((pair[0] / BLOCK_SIZE) as isize, (pair[0] % BLOCK_SIZE) as isize);
            let (row_b, column_b) = ((pair[1] / BLOCK_SIZE) as isize, (pair[1] % BLOCK_SIZE) as isize);
            assert!((row_a - row_b).abs() <= 1 && (column_a - column_b).abs() <= 1, "{:?}", pair);
        }
    }

    #[test]
    fn diagonals_are_visited_in_order() {
        let diagonal = |index: usize| index / BLOCK_SIZE + index % BLOCK_SIZE;
        for pair in SERIAL_TO_ROW_MAJOR.windows(2) {
            let (current, next) = (diagonal(pair[0]), diagonal(pair[1]));
            assert!(next == current || next == current + 1, "{:?}", pair);
        }
    }

    #[test]
    fn scan_and_unscan() {
        let mut block = [0_i8; BLOCK_AREA];
        for (index, value) in block.iter_mut().enumerate() { *value = index as i8; }

        let mut serial = [0; BLOCK_AREA];
        scan(&block, &mut serial);
        assert_eq!(&serial[.. 6], &[0, 1, 8, 16, 9, 2]);
        assert_eq!(serial[63], 63);

        let mut restored = [0; BLOCK_AREA];
        unscan(&serial, &mut restored);
        assert_eq!(restored, block);
    }
}
