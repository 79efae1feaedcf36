//! Supported bus speeds and their CNF1/CNF2/CNF3 values for an 8 MHz oscillator.
use embedded_hal::{delay::DelayNs, spi::SpiDevice};

use super::Mcp2515;
use crate::error::ControllerError;
use crate::infra::registers::register;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Bus speed. Closed set: anything else is not representable.
pub enum BitRateProfile {
    Kbps1000,
    Kbps500,
    Kbps250,
    Kbps200,
    Kbps125,
    Kbps100,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Values for the three bit-timing registers.
pub struct TimingRegisters {
    pub cnf1: u8,
    pub cnf2: u8,
    pub cnf3: u8,
}

impl BitRateProfile {
    /// Every supported profile, fastest first.
    pub const ALL: [BitRateProfile; 6] = [
        BitRateProfile::Kbps1000,
        BitRateProfile::Kbps500,
        BitRateProfile::Kbps250,
        BitRateProfile::Kbps200,
        BitRateProfile::Kbps125,
        BitRateProfile::Kbps100,
    ];

    /// Register values (8 MHz reference clock).
    pub const fn timing(self) -> TimingRegisters {
        let (cnf1, cnf2, cnf3) = match self {
            BitRateProfile::Kbps1000 => (0x00, 0xC0, 0x80),
            BitRateProfile::Kbps500 => (0x00, 0xD1, 0x81),
            BitRateProfile::Kbps250 => (0x80, 0xE5, 0x83),
            BitRateProfile::Kbps200 => (0x80, 0xF6, 0x84),
            BitRateProfile::Kbps125 => (0x81, 0xE5, 0x83),
            BitRateProfile::Kbps100 => (0x81, 0xF6, 0x84),
        };
        TimingRegisters { cnf1, cnf2, cnf3 }
    }

    /// Nominal bit rate.
    pub const fn bits_per_second(self) -> u32 {
        match self {
            BitRateProfile::Kbps1000 => 1_000_000,
            BitRateProfile::Kbps500 => 500_000,
            BitRateProfile::Kbps250 => 250_000,
            BitRateProfile::Kbps200 => 200_000,
            BitRateProfile::Kbps125 => 125_000,
            BitRateProfile::Kbps100 => 100_000,
        }
    }

    /// Look up a profile by its nominal rate.
    pub fn from_bits_per_second(rate: u32) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|profile| profile.bits_per_second() == rate)
    }
}

impl<SPI, D> Mcp2515<SPI, D>
where
    SPI: SpiDevice,
    D: DelayNs,
{
    /// Write CNF1, CNF2, CNF3.
    ///
    /// The chip only accepts these writes in Configuration mode; the caller
    /// must have entered it (as [`initialize`](Self::initialize) does).
    pub fn configure_bit_rate(
        &mut self,
        profile: BitRateProfile,
    ) -> Result<(), ControllerError<SPI::Error>> {
        let timing = profile.timing();
        self.regs
            .write_byte(register::CNF1, timing.cnf1)
            .map_err(ControllerError::Spi)?;
        self.regs
            .write_byte(register::CNF2, timing.cnf2)
            .map_err(ControllerError::Spi)?;
        self.regs
            .write_byte(register::CNF3, timing.cnf3)
            .map_err(ControllerError::Spi)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    /// Table values for the 8 MHz reference.
    fn test_timing_table() {
        assert_eq!(
            BitRateProfile::Kbps1000.timing(),
            TimingRegisters {
                cnf1: 0x00,
                cnf2: 0xC0,
                cnf3: 0x80
            }
        );
        assert_eq!(
            BitRateProfile::Kbps125.timing(),
            TimingRegisters {
                cnf1: 0x81,
                cnf2: 0xE5,
                cnf3: 0x83
            }
        );
        assert_eq!(BitRateProfile::Kbps100.timing().cnf2, 0xF6);
    }

    #[test]
    /// Lookup by rate only knows the six supported speeds.
    fn test_from_bits_per_second() {
        assert_eq!(
            BitRateProfile::from_bits_per_second(500_000),
            Some(BitRateProfile::Kbps500)
        );
        assert_eq!(BitRateProfile::from_bits_per_second(50_000), None);
        for profile in BitRateProfile::ALL {
            assert_eq!(
                BitRateProfile::from_bits_per_second(profile.bits_per_second()),
                Some(profile)
            );
        }
    }
}
