use super::ProblemKind;

use num_complex::Complex64;
use std::fmt;

/// Capabilities the post-processor needs from a material
pub trait Material {
    /// Whether the material behaves as free space
    fn is_air(&self) -> bool;
    /// Whether two materials have identical properties (their flux can be smoothed across an interface)
    fn is_same_material_as(&self, other: &Self) -> bool;
}

/// Material properties tagged by the physics they describe
#[derive(Clone, Debug, PartialEq)]
pub enum MaterialProps {
    Magnetic {
        /// Relative permeability in x and y
        mu_x: f64,
        mu_y: f64,
        /// Applied source current density
        j_src: Complex64,
    },
    Electrostatic {
        /// Relative permittivity in x and y
        ex: f64,
        ey: f64,
        /// Volume charge density
        qv: f64,
    },
    Thermal {
        /// Thermal conductivity in x and y
        kx: f64,
        ky: f64,
        /// Volume heat generation
        qv: f64,
        /// Temperature dependent (isotropic) conductivity as `(T, k)` pairs sorted by temperature
        kt: Vec<(f64, f64)>,
    },
}

impl MaterialProps {
    pub fn magnetic(mu_x: f64, mu_y: f64) -> Self {
        Self::Magnetic {
            mu_x,
            mu_y,
            j_src: Complex64::from(0.0),
        }
    }

    pub fn electrostatic(ex: f64, ey: f64) -> Self {
        Self::Electrostatic { ex, ey, qv: 0.0 }
    }

    pub fn thermal(kx: f64, ky: f64) -> Self {
        Self::Thermal {
            kx,
            ky,
            qv: 0.0,
            kt: Vec::new(),
        }
    }

    /// The physics these properties describe
    pub fn kind(&self) -> ProblemKind {
        match self {
            Self::Magnetic { .. } => ProblemKind::Magnetics,
            Self::Electrostatic { .. } => ProblemKind::Electrostatics,
            Self::Thermal { .. } => ProblemKind::HeatFlow,
        }
    }

    /// Relative permittivity `ex + i ey` (electrostatic materials only)
    pub fn permittivity(&self) -> Option<Complex64> {
        match self {
            Self::Electrostatic { ex, ey, .. } => Some(Complex64::new(*ex, *ey)),
            _ => None,
        }
    }

    /// Thermal conductivity `kx + i ky` at temperature `t` (thermal materials only)
    ///
    /// Materials with a temperature table are isotropic: the table is interpolated linearly and clamped at its ends.
    pub fn conductivity(&self, t: f64) -> Option<Complex64> {
        match self {
            Self::Thermal { kx, ky, kt, .. } => Some(if kt.is_empty() {
                Complex64::new(*kx, *ky)
            } else {
                let k = interpolate_table(kt, t);
                Complex64::new(k, k)
            }),
            _ => None,
        }
    }
}

fn interpolate_table(table: &[(f64, f64)], t: f64) -> f64 {
    let (t_first, k_first) = table[0];
    let (t_last, k_last) = table[table.len() - 1];

    if t <= t_first {
        return k_first;
    }
    if t >= t_last {
        return k_last;
    }

    table
        .windows(2)
        .find(|w| t >= w[0].0 && t <= w[1].0)
        .map(|w| {
            let (t0, k0) = w[0];
            let (t1, k1) = w[1];
            if t1 == t0 {
                k0
            } else {
                k0 + (k1 - k0) * (t - t0) / (t1 - t0)
            }
        })
        .unwrap_or(k_last)
}

/// A named material assigned to regions through block labels
#[derive(Clone, Debug)]
pub struct BlockProperty {
    pub name: String,
    pub props: MaterialProps,
}

impl BlockProperty {
    pub fn new(name: impl AsRef<str>, props: MaterialProps) -> Self {
        Self {
            name: name.as_ref().to_string(),
            props,
        }
    }
}

impl Material for BlockProperty {
    // heat flow has no notion of free space
    fn is_air(&self) -> bool {
        match &self.props {
            MaterialProps::Magnetic { mu_x, mu_y, j_src } => {
                *mu_x == 1.0 && *mu_y == 1.0 && j_src.norm() == 0.0
            }
            MaterialProps::Electrostatic { ex, ey, qv } => *ex == 1.0 && *ey == 1.0 && *qv == 0.0,
            MaterialProps::Thermal { .. } => false,
        }
    }

    fn is_same_material_as(&self, other: &Self) -> bool {
        self.props == other.props
    }
}

impl fmt::Display for BlockProperty {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.props {
            MaterialProps::Magnetic { mu_x, mu_y, .. } => {
                write!(f, "{} (μ_x: {}, μ_y: {})", self.name, mu_x, mu_y)
            }
            MaterialProps::Electrostatic { ex, ey, .. } => {
                write!(f, "{} (ε_x: {}, ε_y: {})", self.name, ex, ey)
            }
            MaterialProps::Thermal { kx, ky, .. } => {
                write!(f, "{} (k_x: {}, k_y: {})", self.name, kx, ky)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn air_detection() {
        assert!(BlockProperty::new("Air", MaterialProps::electrostatic(1.0, 1.0)).is_air());
        assert!(!BlockProperty::new("Teflon", MaterialProps::electrostatic(2.1, 2.1)).is_air());
        assert!(BlockProperty::new("Air", MaterialProps::magnetic(1.0, 1.0)).is_air());
        assert!(!BlockProperty::new("Copper", MaterialProps::thermal(1.0, 1.0)).is_air());

        let charged = BlockProperty::new(
            "Charged Air",
            MaterialProps::Electrostatic {
                ex: 1.0,
                ey: 1.0,
                qv: 1e-6,
            },
        );
        assert!(!charged.is_air());
    }

    #[test]
    fn same_material_ignores_names() {
        let a = BlockProperty::new("A", MaterialProps::electrostatic(4.0, 4.0));
        let b = BlockProperty::new("B", MaterialProps::electrostatic(4.0, 4.0));
        let c = BlockProperty::new("C", MaterialProps::electrostatic(4.0, 2.0));

        assert!(a.is_same_material_as(&b));
        assert!(!a.is_same_material_as(&c));
    }

    #[test]
    fn conductivity_table() {
        let props = MaterialProps::Thermal {
            kx: 1.0,
            ky: 1.0,
            qv: 0.0,
            kt: vec![(0.0, 10.0), (100.0, 20.0)],
        };

        assert!((props.conductivity(50.0).unwrap().re - 15.0).abs() < 1e-12);
        assert!((props.conductivity(-10.0).unwrap().im - 10.0).abs() < 1e-12);
        assert!((props.conductivity(500.0).unwrap().re - 20.0).abs() < 1e-12);

        let anisotropic = MaterialProps::thermal(2.0, 3.0);
        assert_eq!(anisotropic.conductivity(0.0), Some(Complex64::new(2.0, 3.0)));
        assert_eq!(anisotropic.permittivity(), None);
        assert_eq!(anisotropic.kind(), ProblemKind::HeatFlow);
    }
}
