//! Raspberry Pi 40-pin header numbering.
//!
//! Pins are configured in one scheme for the whole process; drivers work in
//! BCM (SoC) numbering.

use serde::{Deserialize, Serialize};

/// Pin numbering scheme used in the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinNumbering {
    /// Physical header position (1-40).
    #[default]
    Board,
    /// Broadcom SoC GPIO number (0-27).
    Bcm,
}

/// Header position → BCM GPIO for every GPIO-capable header pin.
const BOARD_TO_BCM: [(u8, u8); 28] = [
    (3, 2),
    (5, 3),
    (7, 4),
    (8, 14),
    (10, 15),
    (11, 17),
    (12, 18),
    (13, 27),
    (15, 22),
    (16, 23),
    (18, 24),
    (19, 10),
    (21, 9),
    (22, 25),
    (23, 11),
    (24, 8),
    (26, 7),
    (27, 0),
    (28, 1),
    (29, 5),
    (31, 6),
    (32, 12),
    (33, 13),
    (35, 19),
    (36, 16),
    (37, 26),
    (38, 20),
    (40, 21),
];

/// Highest BCM GPIO exposed on the header.
pub const MAX_BCM_GPIO: u8 = 27;

impl PinNumbering {
    /// Translate a configured pin into its BCM GPIO number.
    ///
    /// Returns `None` for power/ground header positions or out-of-range values.
    pub fn to_bcm(self, pin: u8) -> Option<u8> {
        match self {
            Self::Board => BOARD_TO_BCM
                .iter()
                .find(|(board, _)| *board == pin)
                .map(|(_, bcm)| *bcm),
            Self::Bcm => (pin <= MAX_BCM_GPIO).then_some(pin),
        }
    }
}
