//! CIE XYZ and CIE L\*a\*b\* colours, and conversions between them.

/// `ε` from the CIE standard (216/24389).
const EPSILON: f64 = 216.0 / 24389.0;
/// `κ` from the CIE standard (24389/27).
const KAPPA: f64 = 24389.0 / 27.0;

/// The D50 illuminant, which is the profile connection space white point of ICC profiles.
pub const D50: Xyz = Xyz {
    x: 0.9642,
    y: 1.0,
    z: 0.8249,
    alpha: 1.0,
};

/// A linear, normalised colour in CIE XYZ space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Xyz {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub alpha: f32,
}

/// A colour in CIE L\*a\*b\* space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Lab {
    /// Lightness, from 0 (black) to 100 (diffuse white).
    pub l: f32,
    /// Green (negative) to red (positive).
    pub a: f32,
    /// Blue (negative) to yellow (positive).
    pub b: f32,
    pub alpha: f32,
}

impl Xyz {
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            x,
            y,
            z,
            alpha: 1.0,
        }
    }

    /// Converts this colour to L\*a\*b\*, relative to the given reference white point.
    ///
    /// Alpha is carried over unchanged.
    pub fn to_lab(self, white_point: Xyz) -> Lab {
        let fx = component_to_lab(self.x, white_point.x);
        let fy = component_to_lab(self.y, white_point.y);
        let fz = component_to_lab(self.z, white_point.z);

        Lab {
            l: (116.0 * fy - 16.0) as f32,
            a: (500.0 * (fx - fy)) as f32,
            b: (200.0 * (fy - fz)) as f32,
            alpha: self.alpha,
        }
    }

    /// Creates an XYZ colour from its L\*a\*b\* representation relative to the given reference
    /// white point.
    pub fn from_lab(lab: Lab, white_point: Xyz) -> Self {
        let l = f64::from(lab.l);
        let fy = (l + 16.0) / 116.0;
        let fx = f64::from(lab.a) / 500.0 + fy;
        let fz = fy - f64::from(lab.b) / 200.0;

        let xr = component_from_lab(fx);
        let zr = component_from_lab(fz);
        let yr = if l > KAPPA * EPSILON {
            fy.powi(3)
        } else {
            l / KAPPA
        };

        Self {
            x: (xr * f64::from(white_point.x)) as f32,
            y: (yr * f64::from(white_point.y)) as f32,
            z: (zr * f64::from(white_point.z)) as f32,
            alpha: lab.alpha,
        }
    }
}

impl Lab {
    #[inline]
    pub fn to_xyz(self, white_point: Xyz) -> Xyz {
        Xyz::from_lab(self, white_point)
    }
}

fn component_to_lab(v: f32, white: f32) -> f64 {
    let r = f64::from(v) / f64::from(white);
    if r > EPSILON {
        r.cbrt()
    } else {
        (KAPPA * r + 16.0) / 116.0
    }
}

fn component_from_lab(f: f64) -> f64 {
    let f3 = f.powi(3);
    if f3 > EPSILON {
        f3
    } else {
        (116.0 * f - 16.0) / KAPPA
    }
}
