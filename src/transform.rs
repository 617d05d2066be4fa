use std::fmt;

/// One step of a CSS-style transform list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransformOp {
    /// Clockwise rotation on screen (y grows downwards), in degrees.
    Rotate(f64),
    Translate(f64, f64),
}

/// 2D affine matrix `[a c e; b d f]`, same layout as CSS `matrix()`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Affine {
    pub const IDENTITY: Affine = Affine {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    fn from_op(op: TransformOp) -> Self {
        match op {
            TransformOp::Rotate(degrees) => {
                let (sin, cos) = degrees.to_radians().sin_cos();
                Affine {
                    a: cos,
                    b: sin,
                    c: -sin,
                    d: cos,
                    ..Affine::IDENTITY
                }
            }
            TransformOp::Translate(x, y) => Affine {
                e: x,
                f: y,
                ..Affine::IDENTITY
            },
        }
    }

    /// `self * other`: `other` applies first.
    pub fn then(&self, other: &Affine) -> Affine {
        Affine {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }
}

/// An ordered transform list, composed left to right like a CSS
/// `transform` property.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Transform {
    ops: Vec<TransformOp>,
}

impl Transform {
    pub fn new(ops: Vec<TransformOp>) -> Self {
        Transform { ops }
    }

    pub fn matrix(&self) -> Affine {
        self.ops
            .iter()
            .fold(Affine::IDENTITY, |acc, op| acc.then(&Affine::from_op(*op)))
    }

    /// Where the element's origin lands, relative to its anchor.
    pub fn offset(&self) -> (f64, f64) {
        self.matrix().apply(0.0, 0.0)
    }

    /// Inline style value, e.g. `rotate(30deg) translate(220px, 0px) rotate(-30deg)`.
    pub fn to_css(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, op) in self.ops.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            match op {
                TransformOp::Rotate(degrees) => write!(f, "rotate({degrees}deg)")?,
                TransformOp::Translate(x, y) => write!(f, "translate({x}px, {y}px)")?,
            }
        }
        Ok(())
    }
}

/// The three cached transforms of a menu item.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemPresets {
    /// Resting position while closed: above the anchor.
    pub entry: Transform,
    /// Deployed position on the circle.
    pub deployed: Transform,
    /// Target of the closing animation: below the anchor.
    pub exit: Transform,
}

impl ItemPresets {
    pub fn new(angle_degrees: f64, radius: f64) -> Self {
        ItemPresets {
            entry: Transform::new(vec![TransformOp::Translate(0.0, -radius)]),
            deployed: Transform::new(vec![
                TransformOp::Rotate(angle_degrees),
                TransformOp::Translate(radius, 0.0),
                TransformOp::Rotate(-angle_degrees),
            ]),
            exit: Transform::new(vec![TransformOp::Translate(0.0, radius)]),
        }
    }
}
