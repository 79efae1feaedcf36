//! Status codes produced by the perception stack and carried on the bus.
//!
//! Codes are part of the wire contract with the other vehicle modules and
//! must not be renumbered.
use core::fmt;

//==================================================================================LANE
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Which lane markings are visible.
pub enum LaneStatus {
    LeftOnly,
    RightOnly,
    LeftAndRight,
    Error,
}

impl LaneStatus {
    /// Wire code (1..=4).
    pub const fn code(self) -> u8 {
        match self {
            LaneStatus::LeftOnly => 1,
            LaneStatus::RightOnly => 2,
            LaneStatus::LeftAndRight => 3,
            LaneStatus::Error => 4,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(LaneStatus::LeftOnly),
            2 => Some(LaneStatus::RightOnly),
            3 => Some(LaneStatus::LeftAndRight),
            4 => Some(LaneStatus::Error),
            _ => None,
        }
    }
}

impl fmt::Display for LaneStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LaneStatus::LeftOnly => "LEFT LANE ONLY",
            LaneStatus::RightOnly => "RIGHT LANE ONLY",
            LaneStatus::LeftAndRight => "BOTH LANES",
            LaneStatus::Error => "LANE ERROR",
        })
    }
}

//==================================================================================DRIFT
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Position of the vehicle relative to the lane center.
pub enum DriftStatus {
    DriftLeft,
    DriftRight,
    Centered,
    SlightlyLeft,
    SlightlyRight,
}

impl DriftStatus {
    /// Wire code (5..=9).
    pub const fn code(self) -> u8 {
        match self {
            DriftStatus::DriftLeft => 5,
            DriftStatus::DriftRight => 6,
            DriftStatus::Centered => 7,
            DriftStatus::SlightlyLeft => 8,
            DriftStatus::SlightlyRight => 9,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            5 => Some(DriftStatus::DriftLeft),
            6 => Some(DriftStatus::DriftRight),
            7 => Some(DriftStatus::Centered),
            8 => Some(DriftStatus::SlightlyLeft),
            9 => Some(DriftStatus::SlightlyRight),
            _ => None,
        }
    }

    /// Drift large enough to invalidate the lane estimate.
    pub const fn is_significant(self) -> bool {
        matches!(self, DriftStatus::DriftLeft | DriftStatus::DriftRight)
    }
}

impl fmt::Display for DriftStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DriftStatus::DriftLeft => "DRIFTING LEFT",
            DriftStatus::DriftRight => "DRIFTING RIGHT",
            DriftStatus::Centered => "CENTRALIZED",
            DriftStatus::SlightlyLeft => "SLIGHTLY LEFT",
            DriftStatus::SlightlyRight => "SLIGHTLY RIGHT",
        })
    }
}

//==================================================================================SIGNS
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Traffic signs and lights recognized by the sign classifier.
pub enum TrafficSign {
    Speed30,
    Speed40,
    Speed50,
    Speed60,
    Speed70,
    Speed80,
    Speed90,
    Speed100,
    Speed120,
    Stop,
    RedLight,
    GreenLight,
    YellowLight,
}

impl TrafficSign {
    /// Every sign in code order.
    pub const ALL: [TrafficSign; 13] = [
        TrafficSign::Speed30,
        TrafficSign::Speed40,
        TrafficSign::Speed50,
        TrafficSign::Speed60,
        TrafficSign::Speed70,
        TrafficSign::Speed80,
        TrafficSign::Speed90,
        TrafficSign::Speed100,
        TrafficSign::Speed120,
        TrafficSign::Stop,
        TrafficSign::RedLight,
        TrafficSign::GreenLight,
        TrafficSign::YellowLight,
    ];

    /// Wire code (1..=13).
    pub const fn code(self) -> u8 {
        match self {
            TrafficSign::Speed30 => 1,
            TrafficSign::Speed40 => 2,
            TrafficSign::Speed50 => 3,
            TrafficSign::Speed60 => 4,
            TrafficSign::Speed70 => 5,
            TrafficSign::Speed80 => 6,
            TrafficSign::Speed90 => 7,
            TrafficSign::Speed100 => 8,
            TrafficSign::Speed120 => 9,
            TrafficSign::Stop => 10,
            TrafficSign::RedLight => 11,
            TrafficSign::GreenLight => 12,
            TrafficSign::YellowLight => 13,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|sign| sign.code() == code)
    }

    /// Limit in km/h for speed signs.
    pub const fn speed_limit_kmh(self) -> Option<u16> {
        match self {
            TrafficSign::Speed30 => Some(30),
            TrafficSign::Speed40 => Some(40),
            TrafficSign::Speed50 => Some(50),
            TrafficSign::Speed60 => Some(60),
            TrafficSign::Speed70 => Some(70),
            TrafficSign::Speed80 => Some(80),
            TrafficSign::Speed90 => Some(90),
            TrafficSign::Speed100 => Some(100),
            TrafficSign::Speed120 => Some(120),
            TrafficSign::Stop
            | TrafficSign::RedLight
            | TrafficSign::GreenLight
            | TrafficSign::YellowLight => None,
        }
    }

    pub const fn is_speed_limit(self) -> bool {
        self.speed_limit_kmh().is_some()
    }

    /// Map a classifier label ("speed limit 50", "Stop", "red light", ...) to a sign.
    ///
    /// Speed values are tried first in ascending order, then stop, then the
    /// lights. Matching is ASCII case-insensitive; unknown labels give `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        const SPEEDS: [(&str, TrafficSign); 9] = [
            ("30", TrafficSign::Speed30),
            ("40", TrafficSign::Speed40),
            ("50", TrafficSign::Speed50),
            ("60", TrafficSign::Speed60),
            ("70", TrafficSign::Speed70),
            ("80", TrafficSign::Speed80),
            ("90", TrafficSign::Speed90),
            ("100", TrafficSign::Speed100),
            ("120", TrafficSign::Speed120),
        ];
        if let Some((_, sign)) = SPEEDS
            .iter()
            .find(|(digits, _)| contains_ignore_case(label, digits))
        {
            return Some(*sign);
        }
        if contains_ignore_case(label, "stop") {
            return Some(TrafficSign::Stop);
        }
        if !contains_ignore_case(label, "light") {
            return None;
        }
        if contains_ignore_case(label, "red") {
            Some(TrafficSign::RedLight)
        } else if contains_ignore_case(label, "green") {
            Some(TrafficSign::GreenLight)
        } else if contains_ignore_case(label, "yellow") {
            Some(TrafficSign::YellowLight)
        } else {
            None
        }
    }
}

impl fmt::Display for TrafficSign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrafficSign::Stop => f.write_str("STOP SIGN"),
            TrafficSign::RedLight => f.write_str("RED LIGHT"),
            TrafficSign::GreenLight => f.write_str("GREEN LIGHT"),
            TrafficSign::YellowLight => f.write_str("YELLOW LIGHT"),
            speed => write!(f, "SPEED LIMIT {}", speed.speed_limit_kmh().unwrap_or_default()),
        }
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    let needle = needle.as_bytes();
    if needle.is_empty() {
        return true;
    }
    haystack
        .as_bytes()
        .windows(needle.len())
        .any(|window| window.eq_ignore_ascii_case(needle))
}
