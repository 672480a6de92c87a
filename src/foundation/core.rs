pub use glam::Vec3;

/// Sentinel pressure value marking an undefined / unreached trajectory
/// vertex (end-of-trajectory marker in fixed-stride ensemble storage).
pub const INVALID_TRAJECTORY_POS: f32 = -999.99;

/// Linear mapping from the logarithm of atmospheric pressure (hPa) to the
/// rendering-space vertical coordinate.
///
/// `world_z = (ln(p_hPa) - log_p_bottom_hpa) * delta_z_per_log_p`
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PressureToWorldZ {
    /// Natural logarithm of the pressure at the bottom of the rendered column.
    pub log_p_bottom_hpa: f64,
    /// Slope of the world-Z coordinate per unit of log-pressure.
    pub delta_z_per_log_p: f64,
}

impl PressureToWorldZ {
    /// Build the mapping from an explicit pressure/height column.
    ///
    /// `p_bottom_hpa` maps to `z_bottom` and `p_top_hpa` maps to `z_top`.
    pub fn from_column(p_bottom_hpa: f64, z_bottom: f64, p_top_hpa: f64, z_top: f64) -> Self {
        let log_p_bottom_hpa = p_bottom_hpa.ln();
        let delta_z_per_log_p = (z_top - z_bottom) / (p_top_hpa.ln() - log_p_bottom_hpa);
        Self {
            log_p_bottom_hpa,
            delta_z_per_log_p,
        }
    }

    /// Map a pressure in hPa to the world-Z coordinate.
    pub fn world_z_from_pressure(&self, p_hpa: f32) -> f32 {
        ((f64::from(p_hpa).ln() - self.log_p_bottom_hpa) * self.delta_z_per_log_p) as f32
    }
}
