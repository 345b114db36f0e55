use super::PostProcessor;
use crate::error::{PostProcError, Result};
use crate::mesh::element::{MeshElement, MINUS1MOD3, PLUS1MOD3};
use crate::problem::ProblemKind;

use nalgebra::{Matrix3, Vector3};
use num_complex::Complex64;
use rayon::prelude::*;
use smallvec::SmallVec;

/// Boundary nodes whose fixed neighbors turn by more than this angle (in degrees) keep the raw element flux
pub const SHALLOW_ANGLE_TOLERANCE_DEG: f64 = 10.0001;

/// Maximum number of neighboring nodes gathered around a node for the gradient fit
pub const MAX_RING_NODES: usize = 20;

/// Permittivity of free space (F/m)
pub const EPS0: f64 = 8.85418781762e-12;

// ring neighbors plus the node itself
type RingNodes = SmallVec<[usize; MAX_RING_NODES + 1]>;

impl PostProcessor {
    /// Smoothed flux density at the three vertices of an element
    ///
    /// The gradient of the scalar potential at each vertex is found by fitting a plane through the node and its
    /// neighbors in the same material. Vertices on conductor ends, isolated charges, and sharp fixed boundaries keep
    /// the raw element value.
    ///
    /// * returns `Err(UnsupportedProblemKind)` for problems without a scalar potential
    pub fn nodal_d(&self, elem_id: usize) -> Result<[Complex64; 3]> {
        self.check_scalar_potential()?;

        let elem = self.mesh.element(elem_id);
        let mut d = [elem.d; 3];
        for (d_i, &node_id) in d.iter_mut().zip(elem.p.iter()) {
            *d_i = self.vertex_d(elem_id, elem, node_id);
        }

        Ok(d)
    }

    /// Flux density at a point inside an element
    ///
    /// With smoothing enabled the nodal values are interpolated with the element's linear shape functions;
    /// otherwise the raw element value is returned.
    pub fn point_d(&self, x: f64, y: f64, elem_id: usize) -> Result<Complex64> {
        self.check_scalar_potential()?;

        let elem = self.mesh.element(elem_id);
        if !self.config.smoothing {
            return Ok(elem.d);
        }

        let d = match elem.nodal_flux() {
            Some(d) => d,
            None => self.nodal_d(elem_id)?,
        };

        let [n0, n1, n2] = self.mesh.element_nodes(elem_id);
        let a = [
            n1.x * n2.y - n2.x * n1.y,
            n2.x * n0.y - n0.x * n2.y,
            n0.x * n1.y - n1.x * n0.y,
        ];
        let (b, c) = elem.shape_params(self.mesh.nodes());
        let da = b[0] * c[1] - b[1] * c[0];

        Ok((0..3).fold(Complex64::from(0.0), |acc, i| {
            acc + d[i] * (a[i] + b[i] * x + c[i] * y) / da
        }))
    }

    /// Compute and store the smoothed nodal flux of every element
    ///
    /// Problems without a scalar potential are left unchanged.
    pub fn smooth_fields(&mut self) {
        if let Err(err) = self.check_scalar_potential() {
            log::debug!("skipping flux smoothing: {}", err);
            return;
        }

        let smoothed: Vec<[Complex64; 3]> = (0..self.mesh.num_elements())
            .into_par_iter()
            .map(|elem_id| self.nodal_d(elem_id).unwrap_or([self.mesh.element(elem_id).d; 3]))
            .collect();

        for (elem, d) in self.mesh.elements_mut().iter_mut().zip(smoothed) {
            elem.d_nodal = Some(d);
        }

        log::debug!(
            "smoothed flux over {} Elements",
            self.mesh.num_elements()
        );
    }

    /// Correction factor undoing the scaling of material properties in an axisymmetric exterior region, evaluated at
    /// the element's centroid
    pub fn aecf(&self, elem_id: usize) -> f64 {
        self.exterior_correction(self.mesh.element(elem_id), None)
    }

    /// Exterior region correction factor at a point of an element
    pub fn aecf_at(&self, elem_id: usize, p: Complex64) -> f64 {
        self.exterior_correction(self.mesh.element(elem_id), Some(p))
    }

    /// Negative gradient of the masked shape functions of an element (in 1/m), used for weighted stress tensor
    /// force integrals
    pub fn henrotte_vector(&self, elem_id: usize) -> Complex64 {
        let elem = self.mesh.element(elem_id);
        let (b, c) = elem.shape_params(self.mesh.nodes());
        let da = (b[0] * c[1] - b[1] * c[0]) * self.problem.length_units.to_meters();

        elem.p
            .iter()
            .enumerate()
            .fold(Complex64::from(0.0), |v, (i, &p)| {
                v - self.mesh.node(p).msk() * Complex64::new(b[i], c[i]) / da
            })
    }

    fn check_scalar_potential(&self) -> Result<()> {
        if self.problem.kind.has_scalar_potential() {
            Ok(())
        } else {
            Err(PostProcError::UnsupportedProblemKind(self.problem.kind))
        }
    }

    // r^2 / (ro ri), with r measured from the exterior region's center (the centroid stands in for the center itself)
    fn exterior_correction(&self, elem: &MeshElement, p: Option<Complex64>) -> f64 {
        if !self.problem.is_axisymmetric() || !self.problem.labels[elem.lbl].is_external {
            return 1.0;
        }

        let exterior = &self.problem.exterior;
        let center = exterior.center();
        let r = match p {
            Some(p) if p != center => (p - center).norm(),
            _ => (elem.centroid() - center).norm(),
        };

        r * r / (exterior.ro * exterior.ri)
    }

    // smoothed flux at one vertex of an element
    fn vertex_d(&self, elem_id: usize, elem: &MeshElement, node_id: usize) -> Complex64 {
        let nodes = self.mesh.nodes();
        let node = &nodes[node_id];
        let ring = self.mesh.incident_elements(node_id);

        let eos = match ring.iter().position(|&e| e == elem_id) {
            Some(eos) => eos,
            None => return elem.d,
        };

        let mut q = RingNodes::new();

        // scan ccw until the material changes or a fixed boundary is reached
        let mut rt = None;
        let mut m = eos;
        for _ in 0..ring.len() {
            let con = self.mesh.element(ring[m]);
            if !self.is_same_material(elem, con) {
                break;
            }
            let p = match con.local_index(node_id) {
                Some(nos) => con.p[MINUS1MOD3[nos]],
                None => break,
            };
            if q.len() < MAX_RING_NODES {
                q.push(p);
            }
            if !node.is_free() && !nodes[p].is_free() {
                rt = Some(p);
                break;
            }
            m = (m + 1) % ring.len();
        }

        // then cw
        let mut lf = None;
        let mut m = eos;
        for _ in 0..ring.len() {
            let con = self.mesh.element(ring[m]);
            if !self.is_same_material(elem, con) {
                break;
            }
            let p = match con.local_index(node_id) {
                Some(nos) => con.p[PLUS1MOD3[nos]],
                None => break,
            };
            if q.len() < MAX_RING_NODES {
                q.push(p);
            }
            if !node.is_free() && !nodes[p].is_free() {
                lf = Some(p);
                break;
            }
            m = if m == 0 { ring.len() - 1 } else { m - 1 };
        }

        if !node.is_free() {
            match (lf, rt) {
                (Some(lf), Some(rt)) if lf != rt => {
                    // on a fixed boundary; only smooth if it is nearly straight
                    let x = nodes[lf].cc() - node.cc();
                    let y = node.cc() - nodes[rt].cc();
                    let turn = ((x / x.norm()) / (y / y.norm())).arg().abs();
                    if turn > SHALLOW_ANGLE_TOLERANCE_DEG.to_radians() {
                        return elem.d;
                    }
                }
                // conductor end or isolated charge
                _ => return elem.d,
            }
        }

        q.push(node_id);
        self.fit_flux(elem, node_id, &q)
    }

    // least squares plane through the potential differences, converted to flux density
    fn fit_flux(&self, elem: &MeshElement, node_id: usize, q: &[usize]) -> Complex64 {
        let nodes = self.mesh.nodes();
        let node = &nodes[node_id];

        let mut normal = Matrix3::<f64>::zeros();
        let mut rhs = Vector3::<f64>::zeros();
        for &k in q {
            let row = Vector3::new(1.0, nodes[k].x - node.x, nodes[k].y - node.y);
            let dv = node.value - nodes[k].value;
            normal += row * row.transpose();
            rhs += row * dv;
        }

        let solution = match normal.try_inverse() {
            Some(inverse) => inverse * rhs,
            None => return elem.d,
        };
        let length_conv = self.problem.length_units.to_meters();
        let ex = solution[1] / length_conv;
        let ey = solution[2] / length_conv;

        let props = &self.problem.materials[elem.blk].props;
        match self.problem.kind {
            ProblemKind::Electrostatics => match props.permittivity() {
                Some(eps) => {
                    Complex64::new(eps.re * ex * EPS0, eps.im * ey * EPS0)
                        / self.exterior_correction(elem, Some(node.cc()))
                }
                None => unreachable!("{} material in an electrostatics problem", props.kind()),
            },
            ProblemKind::HeatFlow => match props.conductivity(node.value) {
                Some(k) => Complex64::new(k.re * ex, k.im * ey),
                None => unreachable!("{} material in a heat flow problem", props.kind()),
            },
            ProblemKind::Magnetics => unreachable!("magnetics problems have no scalar potential"),
        }
    }
}
