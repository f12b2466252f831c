//! Cutting tool definitions and stock resolution.
//!
//! A [`CuttingTool`] carries everything the emitter needs for one bit:
//! diameter, spindle speed, feed rates and the Z depth to cut to. Tools are
//! identified by kind and diameter only; two 0.8mm drills are the same tool.
//!
//! The [`ToolResolver`] maps a requested diameter onto the stock catalog,
//! applying the configured tolerance window, and escalates drilling to
//! routing when no drill can do the job.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use boardmill_core::units::Length;
use boardmill_settings::Settings;
use tracing::{error, info, warn};

use crate::error::{CamError, CamResult};

/// The kind of cutter. Drills sort before routers during machining so all
/// drilling happens first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ToolKind {
    /// Twist drill bit.
    Drill,
    /// Router (milling) bit.
    Router,
}

impl ToolKind {
    /// A drilled hole may be slightly larger than requested; the plating
    /// shrinks it back. A routed cut may never be oversized.
    fn allows_oversizing(self) -> bool {
        matches!(self, ToolKind::Drill)
    }

    fn stock(self, settings: &Settings) -> &[Length] {
        match self {
            ToolKind::Drill => &settings.stock.drillbits,
            ToolKind::Router => &settings.stock.routerbits,
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolKind::Drill => write!(f, "drillbit"),
            ToolKind::Router => write!(f, "routerbit"),
        }
    }
}

/// Chip evacuation direction of the cutter flutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutDirection {
    /// Upcut. Chips are drawn upwards. Fine for drilling.
    Up,
    /// Downcut. Pushes the shavings down.
    Down,
    /// Compression bit.
    UpDown,
}

/// Ratio of drill tip height to diameter for the configured point angle.
pub(crate) fn tip_height_to_dia_ratio(point_angle_degrees: f64) -> f64 {
    ((180.0 - point_angle_degrees) / 2.0).to_radians().tan()
}

/// A fully parameterized cutting tool.
///
/// Equality, ordering and hashing consider kind and diameter only. Feeds
/// and depths are derived from the configuration and carry no identity.
#[derive(Debug, Clone)]
pub struct CuttingTool {
    /// Drill or router.
    pub kind: ToolKind,
    /// Cutter diameter.
    pub diameter: Length,
    /// Spindle speed in rpm.
    pub rpm: f64,
    /// Plunge feed rate in mm/min.
    pub z_feedrate: f64,
    /// Lateral feed rate in mm/min. Zero for drills.
    pub table_feedrate: f64,
    /// Chip evacuation direction.
    pub cut_direction: CutDirection,
    /// Lowest Z to cut to, above the machine bed.
    ///
    /// Z0 is the machine bed, the bottom of the backing board. The board
    /// thickness never enters the computation.
    pub z_bottom: Length,
}

impl CuttingTool {
    /// Build a tool of the given kind and diameter, interpolating its
    /// cutting parameters from the configured feeds tables.
    pub fn new(kind: ToolKind, diameter: Length, settings: &Settings) -> Self {
        let m = &settings.machining;

        match kind {
            ToolKind::Drill => {
                let feeds = settings.feeds.drillbits.interpolate(diameter);
                let tip_height = diameter * tip_height_to_dia_ratio(m.drillbit_point_angle);
                Self {
                    kind,
                    diameter,
                    rpm: feeds.speed,
                    z_feedrate: feeds.z_feed,
                    table_feedrate: 0.0,
                    cut_direction: CutDirection::Up,
                    z_bottom: m.backboard_thickness - (tip_height + m.exit_depth_min),
                }
            }
            ToolKind::Router => {
                let feeds = settings.feeds.routerbits.interpolate(diameter);
                Self {
                    kind,
                    diameter,
                    rpm: feeds.speed,
                    z_feedrate: feeds.z_feed,
                    table_feedrate: feeds.table_feed,
                    cut_direction: CutDirection::UpDown,
                    z_bottom: m.backboard_thickness - feeds.exit_depth,
                }
            }
        }
    }
}

impl PartialEq for CuttingTool {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.diameter == other.diameter
    }
}

impl Eq for CuttingTool {}

impl Hash for CuttingTool {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.diameter.hash(state);
    }
}

impl PartialOrd for CuttingTool {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CuttingTool {
    /// Drills before routers, then smallest diameter first.
    fn cmp(&self, other: &Self) -> Ordering {
        self.kind
            .cmp(&other.kind)
            .then(self.diameter.cmp(&other.diameter))
    }
}

impl fmt::Display for CuttingTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.diameter)
    }
}

/// Resolves requested tools against the stock catalogs.
#[derive(Debug, Clone)]
pub struct ToolResolver {
    settings: Settings,
}

impl ToolResolver {
    pub fn new(settings: &Settings) -> Self {
        Self {
            settings: settings.clone(),
        }
    }

    /// Largest drill diameter whose point can still exit the board cleanly
    /// within the backing board.
    pub fn max_clean_exit_diameter(&self) -> Length {
        let m = &self.settings.machining;
        let max_depth = m.backboard_thickness - m.safe_distance - m.exit_depth_min;
        max_depth / tip_height_to_dia_ratio(m.drillbit_point_angle)
    }

    /// Resolve a tool request against the stock.
    ///
    /// A drill request may come back as a router: either the hole is too
    /// large for any stocked drill, or the drill point cannot exit cleanly
    /// through the backing board.
    pub fn resolve(&self, kind: ToolKind, diameter: Length) -> CamResult<CuttingTool> {
        if !diameter.is_positive() {
            return Err(CamError::InvalidDiameter { diameter });
        }

        let Some(stock_diameter) = self.nearest_from_stock(kind, diameter) else {
            let stock = kind.stock(&self.settings);
            let smallest = stock.iter().min().copied().unwrap_or(diameter);
            let largest = stock.iter().max().copied().unwrap_or(diameter);

            if diameter < smallest {
                warn!("Cutting tool size {} is too small", diameter);
                return Err(CamError::ToolNotFound { kind, diameter });
            }

            if diameter > largest {
                if kind == ToolKind::Router {
                    error!("Cutting tool size {} exceeds the largest stock bit", diameter);
                    return Err(CamError::ToolNotFound { kind, diameter });
                }
                info!(
                    "Cutting tool size {} exceeds the largest drillbit and will be routed",
                    diameter
                );
                return self.route_fallback(diameter);
            }

            // Within range but no match: the tolerance window is too tight.
            if kind == ToolKind::Router {
                error!("No suitable routerbit found for size {}", diameter);
                info!("Consider increasing the over and under size tolerances");
            }

            return self.route_fallback(diameter);
        };

        if kind == ToolKind::Drill && stock_diameter > self.max_clean_exit_diameter() {
            let m = &self.settings.machining;
            let exit_depth_required = m.exit_depth_min
                + stock_diameter * tip_height_to_dia_ratio(m.drillbit_point_angle);
            warn!(
                "Exit depth required {} exceeds the backing board clearance, switching to routing",
                exit_depth_required
            );
            return self.route_fallback(stock_diameter);
        }

        Ok(CuttingTool::new(kind, stock_diameter, &self.settings))
    }

    /// Find the stocked diameter nearest to the request within the
    /// configured tolerance window, preferring larger bits.
    fn nearest_from_stock(&self, kind: ToolKind, diameter: Length) -> Option<Length> {
        let m = &self.settings.machining;
        let lower = diameter - diameter * (m.downsizing_allowance_percent / 100.0);
        let upper = diameter + diameter * (m.oversizing_allowance_percent / 100.0);

        let mut stock: Vec<Length> = kind.stock(&self.settings).to_vec();
        stock.sort_unstable();

        let mut min_so_far = diameter;
        let mut nearest = None;

        // A bigger hole will accommodate the part, and plating makes the
        // hole smaller in the end. Scan from the largest bit down.
        for &stock_size in stock.iter().rev() {
            if kind.allows_oversizing() {
                if stock_size > upper {
                    continue;
                }
            } else if stock_size > diameter {
                continue;
            }

            // Won't get better below the window.
            if stock_size < lower {
                break;
            }

            let delta = (diameter - stock_size).abs();
            if delta < min_so_far {
                min_so_far = delta;
                nearest = Some(stock_size);

                if !delta.is_positive() {
                    break;
                }
            }
        }

        nearest
    }

    /// Pick a router bit to cut a hole of the given diameter.
    ///
    /// The contour router doubles as the rescue bit when it fits; any hole
    /// at least as large can be routed with it.
    fn route_fallback(&self, diameter: Length) -> CamResult<CuttingTool> {
        let contour = self.settings.machining.router_diameter_for_contour;
        if contour <= diameter {
            return Ok(CuttingTool::new(ToolKind::Router, contour, &self.settings));
        }

        match self.nearest_from_stock(ToolKind::Router, diameter) {
            Some(stock_diameter) => Ok(CuttingTool::new(
                ToolKind::Router,
                stock_diameter,
                &self.settings,
            )),
            None => {
                error!(
                    "No suitable routerbit exists in the stock to cut a hole of {}",
                    diameter
                );
                Err(CamError::ToolNotFound {
                    kind: ToolKind::Router,
                    diameter,
                })
            }
        }
    }
}
