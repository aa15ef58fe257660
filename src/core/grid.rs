use crate::types::{FciError, FciResult};

/// Geolocation provider: maps geographic coordinates to pixel indices of a
/// named fixed satellite grid.
///
/// The chunk locator only needs the row number, but providers return the full
/// (column, row) pair so other grid consumers can share the seam.
pub trait FixedGrid {
    /// Grid name, eg "mtg_fci_fdss_1km"
    fn name(&self) -> &str;

    /// Number of pixel rows (row 0 is the northernmost)
    fn height(&self) -> usize;

    /// (column, row) of the grid pixel containing the given point.
    ///
    /// Fails for points outside the visible disc or outside the grid extent.
    fn array_indices_from_lonlat(&self, lon: f64, lat: f64) -> FciResult<(usize, usize)>;
}

/// WGS84 semi-major axis [m]
const WGS84_A: f64 = 6_378_137.0;
/// WGS84 semi-minor axis [m]
const WGS84_B: f64 = 6_356_752.314_245_179;
/// Satellite height above the sub-satellite point [m] (MTG at 0 degrees lon)
const SAT_HEIGHT: f64 = 35_786_400.0;
/// Half extent of the FDSS area in projection coordinates [m]
const FDSS_HALF_EXTENT: f64 = 5_567_999.998_550_739;
/// FDSS 1 km grid size (square)
const FDSS_1KM_SIZE: usize = 11_136;

/// The MTG FCI full-disc scanning service grid at 1 km resolution
/// ("mtg_fci_fdss_1km"): 11136 x 11136 pixels on a normalized geostationary
/// (GEOS) projection, sub-satellite longitude 0, WGS84 ellipsoid.
///
/// The forward projection follows the standard ellipsoidal GEOS formulas
/// (sweep axis y): geodetic latitude is converted to geocentric, the view
/// vector from the satellite is formed, and the two scan angles are scaled by
/// the satellite height to give projection coordinates in metres.
pub struct FdssGrid {
    name: String,
    size: usize,
    half_extent: f64,
    pixel_size: f64,
    // precomputed projection constants, all relative to the equatorial radius
    radius_g: f64,      // satellite distance from the ellipsoid centre
    radius_g_1: f64,    // satellite height
    radius_p: f64,      // polar radius
    radius_p2: f64,     // (b/a)^2
    radius_p_inv2: f64, // (a/b)^2
}

impl FdssGrid {
    /// The 1 km full-disc grid used by FCI L1c chunk bookkeeping.
    pub fn fdss_1km() -> Self {
        let radius_p2 = (WGS84_B * WGS84_B) / (WGS84_A * WGS84_A);
        let radius_g_1 = SAT_HEIGHT / WGS84_A;
        Self {
            name: "mtg_fci_fdss_1km".to_string(),
            size: FDSS_1KM_SIZE,
            half_extent: FDSS_HALF_EXTENT,
            pixel_size: 2.0 * FDSS_HALF_EXTENT / FDSS_1KM_SIZE as f64,
            radius_g: 1.0 + radius_g_1,
            radius_g_1,
            radius_p: radius_p2.sqrt(),
            radius_p2,
            radius_p_inv2: 1.0 / radius_p2,
        }
    }

    /// Forward GEOS projection: (lon, lat) in degrees to (x, y) in metres.
    ///
    /// Fails for points on the far side of the Earth as seen from the
    /// satellite (off-disc).
    pub fn project(&self, lon: f64, lat: f64) -> FciResult<(f64, f64)> {
        let lam = lon.to_radians();
        // geocentric latitude
        let phi = (self.radius_p2 * lat.to_radians().tan()).atan();

        // point on the ellipsoid surface, in units of the equatorial radius
        let r = self.radius_p / (self.radius_p * phi.cos()).hypot(phi.sin());
        let vx = r * lam.cos() * phi.cos();
        let vy = r * lam.sin() * phi.cos();
        let vz = r * phi.sin();

        // satellite-facing hemisphere test
        if (self.radius_g - vx) * vx - vy * vy - vz * vz * self.radius_p_inv2 < 0.0 {
            return Err(FciError::Geolocation(format!(
                "point ({:.3}, {:.3}) is not visible from the satellite",
                lon, lat
            )));
        }

        let tmp = self.radius_g - vx;
        let x = self.radius_g_1 * (vy / tmp).atan();
        let y = self.radius_g_1 * (vz / vy.hypot(tmp)).atan();
        Ok((x * WGS84_A, y * WGS84_A))
    }
}

impl FixedGrid for FdssGrid {
    fn name(&self) -> &str {
        &self.name
    }

    fn height(&self) -> usize {
        self.size
    }

    fn array_indices_from_lonlat(&self, lon: f64, lat: f64) -> FciResult<(usize, usize)> {
        let (x, y) = self.project(lon, lat)?;

        // row 0 is the top (north) edge of the area extent
        let col = ((x + self.half_extent) / self.pixel_size).floor();
        let row = ((self.half_extent - y) / self.pixel_size).floor();

        if col < 0.0 || row < 0.0 || col >= self.size as f64 || row >= self.size as f64 {
            return Err(FciError::Geolocation(format!(
                "point ({:.3}, {:.3}) falls outside the {} extent",
                lon, lat, self.name
            )));
        }
        Ok((col as usize, row as usize))
    }
}
