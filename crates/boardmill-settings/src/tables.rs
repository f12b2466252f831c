//! Manufacturer feeds and speeds tables.
//!
//! Cutting parameters are published for a handful of diameters; values for
//! in-between sizes are interpolated linearly and clamped at the table
//! extremes.

use boardmill_core::units::{mm, Length};
use serde::{Deserialize, Serialize};

/// Cutting parameters for one tool diameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolFeeds {
    /// Spindle speed in rpm.
    pub speed: f64,
    /// Plunge feed rate in mm/min.
    pub z_feed: f64,
    /// Lateral feed rate in mm/min (0 for drills).
    #[serde(default)]
    pub table_feed: f64,
    /// How deep the cutting lips must exit below the board.
    pub exit_depth: Length,
}

/// One row of a feeds table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedsRow {
    /// Tool diameter this row applies to.
    pub diameter: Length,
    #[serde(flatten)]
    pub feeds: ToolFeeds,
}

/// A feeds and speeds table for one tool kind, sorted by diameter.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct FeedsTable {
    rows: Vec<FeedsRow>,
}

// Stored row order is not trusted; every table goes through `new`.
impl<'de> Deserialize<'de> for FeedsTable {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Vec::<FeedsRow>::deserialize(deserializer).map(Self::new)
    }
}

impl FeedsTable {
    /// Build a table from rows; rows are sorted by diameter.
    pub fn new(mut rows: Vec<FeedsRow>) -> Self {
        rows.sort_by_key(|row| row.diameter);
        Self { rows }
    }

    /// True when the table holds no rows at all.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Interpolate the cutting parameters for a diameter.
    ///
    /// Outside the table range the nearest row is used unchanged.
    pub fn interpolate(&self, diameter: Length) -> ToolFeeds {
        assert!(!self.rows.is_empty(), "feeds table must not be empty");

        let first = &self.rows[0];
        let last = &self.rows[self.rows.len() - 1];

        if diameter <= first.diameter {
            return first.feeds.clone();
        }
        if diameter >= last.diameter {
            return last.feeds.clone();
        }

        // diameter is strictly between two rows
        let upper = self
            .rows
            .iter()
            .position(|row| row.diameter >= diameter)
            .unwrap_or(self.rows.len() - 1);
        let (a, b) = (&self.rows[upper - 1], &self.rows[upper]);

        if b.diameter == diameter {
            return b.feeds.clone();
        }

        let t = (diameter - a.diameter) / (b.diameter - a.diameter);
        let blend = |x: f64, y: f64| x + (y - x) * t;

        ToolFeeds {
            speed: blend(a.feeds.speed, b.feeds.speed),
            z_feed: blend(a.feeds.z_feed, b.feeds.z_feed),
            table_feed: blend(a.feeds.table_feed, b.feeds.table_feed),
            exit_depth: a.feeds.exit_depth + (b.feeds.exit_depth - a.feeds.exit_depth) * t,
        }
    }
}

/// Feeds and speeds tables per tool kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedsTables {
    /// Drill bit table.
    pub drillbits: FeedsTable,
    /// Router bit table.
    pub routerbits: FeedsTable,
}

impl Default for FeedsTables {
    fn default() -> Self {
        let row = |dia: f64, speed: f64, z_feed: f64, table_feed: f64, exit: f64| FeedsRow {
            diameter: mm(dia),
            feeds: ToolFeeds {
                speed,
                z_feed,
                table_feed,
                exit_depth: mm(exit),
            },
        };

        Self {
            drillbits: FeedsTable::new(vec![
                row(0.3, 60_000.0, 600.0, 0.0, 0.5),
                row(0.8, 50_000.0, 800.0, 0.0, 0.5),
                row(1.5, 30_000.0, 900.0, 0.0, 0.6),
                row(2.0, 20_000.0, 850.0, 0.0, 0.7),
                row(3.175, 12_000.0, 700.0, 0.0, 0.8),
            ]),
            routerbits: FeedsTable::new(vec![
                row(0.8, 55_000.0, 300.0, 150.0, 1.0),
                row(1.6, 45_000.0, 400.0, 250.0, 1.5),
                row(2.4, 35_000.0, 450.0, 300.0, 2.0),
                row(3.175, 24_000.0, 500.0, 350.0, 2.0),
            ]),
        }
    }
}
