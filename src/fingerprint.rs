//! Content digests used to deduplicate visited states.

use rustc_hash::FxHashMap;
use sha2::{Digest, Sha256};
use std::fmt;

// Domain tags keep a puzzle and a board with identical cell values apart.
pub(crate) const DOMAIN_PUZZLE: u8 = 0x50;
pub(crate) const DOMAIN_BOARD: u8 = 0x42;

/// SHA-256 over a canonical, layout-independent serialization of a grid.
///
/// The digest covers the grid dimensions and the row-major cell values only.
/// Move counters, histories and whose turn it is never take part, so two
/// states reached through different move orders share a fingerprint.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Digest `rows * cols` cells given in row-major order.
    pub fn of_grid<I>(domain: u8, rows: usize, cols: usize, cells: I) -> Self
    where
        I: IntoIterator<Item = u32>,
    {
        let mut hasher = Sha256::new();
        hasher.update([domain]);
        hasher.update((rows as u64).to_le_bytes());
        hasher.update((cols as u64).to_le_bytes());
        for cell in cells {
            hasher.update(cell.to_le_bytes());
        }
        Fingerprint(hasher.finalize().into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // first 8 bytes are plenty to tell states apart in logs
        write!(f, "Fingerprint({}..)", &self.to_hex()[..16])
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Fingerprint -> shallowest move count at which the state was reached.
pub type VisitedMap = FxHashMap<Fingerprint, usize>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_cells_same_digest() {
        let a = Fingerprint::of_grid(DOMAIN_PUZZLE, 2, 2, [1, 2, 3, 0]);
        let b = Fingerprint::of_grid(DOMAIN_PUZZLE, 2, 2, vec![1, 2, 3, 0]);
        assert_eq!(a, b);
    }

    #[test]
    fn shape_is_part_of_the_digest() {
        let square = Fingerprint::of_grid(DOMAIN_PUZZLE, 2, 2, [1, 2, 3, 0]);
        let row = Fingerprint::of_grid(DOMAIN_PUZZLE, 1, 4, [1, 2, 3, 0]);
        assert_ne!(square, row);
    }

    #[test]
    fn domain_is_part_of_the_digest() {
        let puzzle = Fingerprint::of_grid(DOMAIN_PUZZLE, 1, 3, [0, 1, 2]);
        let board = Fingerprint::of_grid(DOMAIN_BOARD, 1, 3, [0, 1, 2]);
        assert_ne!(puzzle, board);
    }

    #[test]
    fn hex_is_64_chars() {
        let fp = Fingerprint::of_grid(DOMAIN_BOARD, 0, 0, []);
        assert_eq!(fp.to_hex().len(), 64);
        assert_eq!(&fp.to_hex()[..2], format!("{:02x}", fp.as_bytes()[0]));
        assert!(format!("{fp:?}").starts_with("Fingerprint("));
    }
}
