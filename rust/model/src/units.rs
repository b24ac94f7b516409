// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Length unit systems and conversion factors.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Unit system for all lengths in a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Units {
    #[default]
    Meters,
    Millimeters,
    Feet,
    Inches,
    Centimeters,
}

impl Units {
    /// Multiplier that converts a length in this unit system to meters.
    pub fn meters_factor(self) -> f64 {
        match self {
            Units::Meters => 1.0,
            Units::Millimeters => 0.001,
            Units::Feet => 0.3048,
            Units::Inches => 0.0254,
            Units::Centimeters => 0.01,
        }
    }

    /// Scale factor that converts lengths in this unit system to `other`.
    pub fn conversion_factor(self, other: Units) -> f64 {
        self.meters_factor() / other.meters_factor()
    }

    pub fn name(self) -> &'static str {
        match self {
            Units::Meters => "Meters",
            Units::Millimeters => "Millimeters",
            Units::Feet => "Feet",
            Units::Inches => "Inches",
            Units::Centimeters => "Centimeters",
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Units {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Meters" => Ok(Units::Meters),
            "Millimeters" => Ok(Units::Millimeters),
            "Feet" => Ok(Units::Feet),
            "Inches" => Ok(Units::Inches),
            "Centimeters" => Ok(Units::Centimeters),
            other => Err(Error::UnknownTag {
                kind: "units",
                value: other.to_string(),
            }),
        }
    }
}
