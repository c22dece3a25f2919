//! In-memory low-water mark for pulled data (no disk persistence).
//!
//! A restart pulls from the head again; nothing here survives the process.

/// Lowest slot fetched from the pull source so far. In-memory only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    pub low_water_mark: Option<u64>,
}

impl Cursor {
    pub fn new(low_water_mark: u64) -> Self {
        Self {
            low_water_mark: Some(low_water_mark),
        }
    }

    /// Move the mark down to `slot` if it is lower than the current one.
    pub fn lower_to(&mut self, slot: u64) {
        self.low_water_mark = Some(match self.low_water_mark {
            Some(current) => current.min(slot),
            None => slot,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_new() {
        let c = Cursor::new(123);
        assert_eq!(c.low_water_mark, Some(123));
    }

    #[test]
    fn cursor_default() {
        let c = Cursor::default();
        assert_eq!(c.low_water_mark, None);
    }

    #[test]
    fn lower_to_only_moves_down() {
        let mut c = Cursor::default();
        c.lower_to(80);
        c.lower_to(90);
        assert_eq!(c.low_water_mark, Some(80));
        c.lower_to(61);
        assert_eq!(c.low_water_mark, Some(61));
    }
}
