//! WGS84 bounding box parsing and validation.
//!
//! An [`Extent`] is built once from the `--extent` argument and never changes.
//! Parsing rejects anything the product-search API would misinterpret: the
//! wrong number of fields, non-finite numbers, coordinates outside the WGS84
//! ranges, and boxes whose minimum is not strictly below the maximum.
//!
//! ```
//! use tnm_core::Extent;
//!
//! let extent: Extent = "-105.3,39.9,-105.1,40.1".parse().unwrap();
//! assert_eq!(extent.xmin(), -105.3);
//! assert_eq!(extent.to_bbox_param(), "-105.3,39.9,-105.1,40.1");
//! ```

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

const LONGITUDE_RANGE: (f64, f64) = (-180.0, 180.0);
const LATITUDE_RANGE: (f64, f64) = (-90.0, 90.0);

/// Why an extent string was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtentProblem {
    /// The input did not split into exactly four comma-separated fields.
    #[error("expected 4 comma-separated values (xmin,ymin,xmax,ymax), found {found}")]
    FieldCount {
        /// Number of fields actually present.
        found: usize,
    },

    /// A field could not be parsed as a finite number.
    #[error("{field} value '{value}' is not a finite number")]
    NotNumeric {
        /// Name of the offending field.
        field: &'static str,
        /// The raw text of the field.
        value: String,
    },

    /// A coordinate lies outside its WGS84 axis range.
    #[error("{field} {value} must be between {min} and {max}")]
    OutOfRange {
        /// Name of the offending field.
        field: &'static str,
        /// The parsed value.
        value: f64,
        /// Lower bound of the axis.
        min: f64,
        /// Upper bound of the axis.
        max: f64,
    },

    /// The minimum of an axis is not strictly below its maximum.
    #[error("{min_field} ({min}) must be less than {max_field} ({max})")]
    Inverted {
        /// Name of the minimum field.
        min_field: &'static str,
        /// Parsed minimum.
        min: f64,
        /// Name of the maximum field.
        max_field: &'static str,
        /// Parsed maximum.
        max: f64,
    },
}

/// The extent string could not be turned into a valid bounding box.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid extent \"{input}\": {problem}")]
pub struct InvalidExtent {
    /// The rejected input, as supplied.
    pub input: String,
    /// What was wrong with it.
    pub problem: ExtentProblem,
}

/// A WGS84 bounding box in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    xmin: f64,
    ymin: f64,
    xmax: f64,
    ymax: f64,
}

impl Extent {
    /// Builds an extent from already-parsed coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidExtent`] when a value is non-finite, outside its axis
    /// range, or when `xmin >= xmax` / `ymin >= ymax`.
    pub fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Result<Self, InvalidExtent> {
        let input = format!("{xmin},{ymin},{xmax},{ymax}");
        Self::validated(xmin, ymin, xmax, ymax).map_err(|problem| InvalidExtent { input, problem })
    }

    fn validated(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Result<Self, ExtentProblem> {
        let fields = [
            ("xmin", xmin, LONGITUDE_RANGE),
            ("ymin", ymin, LATITUDE_RANGE),
            ("xmax", xmax, LONGITUDE_RANGE),
            ("ymax", ymax, LATITUDE_RANGE),
        ];
        for (field, value, (min, max)) in fields {
            if !value.is_finite() {
                return Err(ExtentProblem::NotNumeric {
                    field,
                    value: value.to_string(),
                });
            }
            if value < min || value > max {
                return Err(ExtentProblem::OutOfRange {
                    field,
                    value,
                    min,
                    max,
                });
            }
        }
        if xmin >= xmax {
            return Err(ExtentProblem::Inverted {
                min_field: "xmin",
                min: xmin,
                max_field: "xmax",
                max: xmax,
            });
        }
        if ymin >= ymax {
            return Err(ExtentProblem::Inverted {
                min_field: "ymin",
                min: ymin,
                max_field: "ymax",
                max: ymax,
            });
        }
        Ok(Self {
            xmin,
            ymin,
            xmax,
            ymax,
        })
    }

    /// Western edge (minimum longitude).
    #[must_use]
    pub fn xmin(&self) -> f64 {
        self.xmin
    }

    /// Southern edge (minimum latitude).
    #[must_use]
    pub fn ymin(&self) -> f64 {
        self.ymin
    }

    /// Eastern edge (maximum longitude).
    #[must_use]
    pub fn xmax(&self) -> f64 {
        self.xmax
    }

    /// Northern edge (maximum latitude).
    #[must_use]
    pub fn ymax(&self) -> f64 {
        self.ymax
    }

    /// Formats the extent as the API `bbox` query value.
    #[must_use]
    pub fn to_bbox_param(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Extent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.xmin, self.ymin, self.xmax, self.ymax)
    }
}

impl FromStr for Extent {
    type Err = InvalidExtent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |problem| InvalidExtent {
            input: s.to_string(),
            problem,
        };

        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(invalid(ExtentProblem::FieldCount { found: parts.len() }));
        }

        let names = ["xmin", "ymin", "xmax", "ymax"];
        let mut values = [0.0_f64; 4];
        for ((slot, raw), field) in values.iter_mut().zip(&parts).zip(names) {
            *slot = raw
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| {
                    invalid(ExtentProblem::NotNumeric {
                        field,
                        value: (*raw).to_string(),
                    })
                })?;
        }

        let [xmin, ymin, xmax, ymax] = values;
        Self::validated(xmin, ymin, xmax, ymax).map_err(invalid)
    }
}

/// Parses an extent string; the function form used as a clap value parser.
///
/// # Errors
///
/// Returns [`InvalidExtent`] for any malformed input.
pub fn parse_extent(value: &str) -> Result<Extent, InvalidExtent> {
    value.parse()
}
