use crate::math::{
    apply_lighting, calculate_light_intensity, calculate_normal, cross, dot, edge_function,
    multiply_matrices, multiply_matrix_vector, normalize, rotation_x, rotation_y, sub, Rgb,
};

/// Background colour of the page behind the cube.
pub const PAGE_COLOR: Rgb = Rgb::from_hex(0xf4f4f6);
/// Material colour of the cube.
pub const CUBE_COLOR: Rgb = Rgb::from_hex(0x5a6070);

const CUBE_EDGE: f64 = 1.05;

/// Cube faces as quads of vertex indices
const FACES: [(usize, usize, usize, usize); 6] = [
    (0, 1, 2, 3),
    (5, 4, 7, 6),
    (4, 0, 3, 7),
    (1, 5, 6, 2),
    (4, 5, 1, 0),
    (3, 2, 6, 7),
];

const CORNERS: [[f64; 3]; 8] = [
    [-1.0, -1.0, -1.0],
    [1.0, -1.0, -1.0],
    [1.0, 1.0, -1.0],
    [-1.0, 1.0, -1.0],
    [-1.0, -1.0, 1.0],
    [1.0, -1.0, 1.0],
    [1.0, 1.0, 1.0],
    [-1.0, 1.0, 1.0],
];

#[derive(Debug, Clone, PartialEq)]
pub struct Cube {
    /// Euler rotation in radians, applied X then Y.
    pub rotation: [f64; 3],
    pub scale: [f64; 3],
}

impl Default for Cube {
    fn default() -> Self {
        Cube {
            rotation: [0.0; 3],
            scale: [1.0; 3],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: [f64; 3],
    pub target: [f64; 3],
    pub fov_degrees: f64,
    pub aspect: f64,
    pub near: f64,
    pub far: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Camera {
            position: [0.0, 0.0, 2.6],
            target: [0.0; 3],
            fov_degrees: 50.0,
            aspect: 1.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl Camera {
    pub fn look_at(&mut self, target: [f64; 3]) {
        self.target = target;
    }

    /// Right, up and forward axes of the view.
    fn basis(&self) -> ([f64; 3], [f64; 3], [f64; 3]) {
        let forward = normalize(&sub(&self.target, &self.position));
        let right = normalize(&cross(&forward, &[0.0, 1.0, 0.0]));
        let up = cross(&right, &forward);
        (right, up, forward)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lights {
    pub ambient: f64,
    pub point_intensity: f64,
    pub point_position: [f64; 3],
}

impl Default for Lights {
    fn default() -> Self {
        Lights {
            ambient: 0.25,
            point_intensity: 0.6,
            point_position: [2.0, 2.0, 2.0],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    pub cube: Cube,
    pub camera: Camera,
    pub lights: Lights,
}

/// Colour and depth buffers the scene is rasterized into.
#[derive(Debug, Clone)]
pub struct Framebuffer {
    width: usize,
    height: usize,
    pixels: Vec<Rgb>,
    depth: Vec<f64>,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Framebuffer {
            width,
            height,
            pixels: vec![PAGE_COLOR; width * height],
            depth: vec![f64::INFINITY; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        *self = Framebuffer::new(width, height);
    }

    pub fn clear(&mut self, color: Rgb) {
        self.pixels.fill(color);
        self.depth.fill(f64::INFINITY);
    }

    pub fn pixel(&self, x: usize, y: usize) -> Rgb {
        self.pixels[y * self.width + x]
    }
}

/// Vertex structure with position, screen position, depth and normal
pub struct Vertex {
    pub position: [f64; 3],
    pub screen_position: [f64; 2],
    pub depth: f64,
    pub normal: [f64; 3],
}

/// Rasterizes the scene as seen from its camera.
pub fn render_scene(scene: &Scene, target: &mut Framebuffer) {
    target.clear(PAGE_COLOR);
    if target.width == 0 || target.height == 0 {
        return;
    }

    let cube = &scene.cube;
    let rotation = multiply_matrices(&rotation_x(cube.rotation[0]), &rotation_y(cube.rotation[1]));
    let half = CUBE_EDGE / 2.0;
    let world: Vec<[f64; 3]> = CORNERS
        .iter()
        .map(|c| {
            let scaled = [
                c[0] * half * cube.scale[0],
                c[1] * half * cube.scale[1],
                c[2] * half * cube.scale[2],
            ];
            multiply_matrix_vector(&rotation, &scaled)
        })
        .collect();

    let camera = &scene.camera;
    let (right, up, forward) = camera.basis();
    let focal = 1.0 / (camera.fov_degrees.to_radians() / 2.0).tan();
    let (width, height) = (target.width as f64, target.height as f64);

    let project = |position: [f64; 3], normal: [f64; 3]| -> Option<Vertex> {
        let d = sub(&position, &camera.position);
        let depth = dot(&d, &forward);
        if depth < camera.near || depth > camera.far {
            return None;
        }
        let ndc_x = focal * dot(&d, &right) / depth / camera.aspect;
        let ndc_y = focal * dot(&d, &up) / depth;
        Some(Vertex {
            position,
            screen_position: [(ndc_x + 1.0) * 0.5 * width, (1.0 - ndc_y) * 0.5 * height],
            depth,
            normal,
        })
    };

    for &(a, b, c, d) in FACES.iter() {
        let mut normal = calculate_normal(&world[a], &world[b], &world[c]);
        // Cube is centred on the origin, so outward normals face away from it
        if dot(&normal, &world[a]) < 0.0 {
            normal = [-normal[0], -normal[1], -normal[2]];
        }
        let quad: Option<Vec<Vertex>> = [a, b, c, d]
            .iter()
            .map(|&i| project(world[i], normal))
            .collect();
        let Some(quad) = quad else {
            continue;
        };
        draw_triangle(&quad[0], &quad[1], &quad[2], target, &scene.lights, CUBE_COLOR);
        draw_triangle(&quad[0], &quad[2], &quad[3], target, &scene.lights, CUBE_COLOR);
    }
}

/// Draws a triangle with per-pixel lighting
pub fn draw_triangle(
    v0: &Vertex,
    v1: &Vertex,
    v2: &Vertex,
    target: &mut Framebuffer,
    lights: &Lights,
    base_color: Rgb,
) {
    let (width, height) = (target.width, target.height);

    // Compute bounding box of the triangle
    let min_x = v0.screen_position[0]
        .min(v1.screen_position[0])
        .min(v2.screen_position[0])
        .floor()
        .max(0.0) as usize;
    let max_x = v0.screen_position[0]
        .max(v1.screen_position[0])
        .max(v2.screen_position[0])
        .ceil()
        .min(width as f64 - 1.0);
    let min_y = v0.screen_position[1]
        .min(v1.screen_position[1])
        .min(v2.screen_position[1])
        .floor()
        .max(0.0) as usize;
    let max_y = v0.screen_position[1]
        .max(v1.screen_position[1])
        .max(v2.screen_position[1])
        .ceil()
        .min(height as f64 - 1.0);
    if max_x < 0.0 || max_y < 0.0 {
        return;
    }
    let (max_x, max_y) = (max_x as usize, max_y as usize);

    let area = edge_function(&v0.screen_position, &v1.screen_position, &v2.screen_position);
    if area == 0.0 {
        return;
    }

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let p = [x as f64 + 0.5, y as f64 + 0.5];

            // Dividing by the signed area accepts either winding
            let w0 = edge_function(&v1.screen_position, &v2.screen_position, &p) / area;
            let w1 = edge_function(&v2.screen_position, &v0.screen_position, &p) / area;
            let w2 = edge_function(&v0.screen_position, &v1.screen_position, &p) / area;
            if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                continue;
            }

            let depth = v0.depth * w0 + v1.depth * w1 + v2.depth * w2;
            let offset = y * width + x;
            if depth >= target.depth[offset] {
                continue;
            }
            target.depth[offset] = depth;

            let position = [
                v0.position[0] * w0 + v1.position[0] * w1 + v2.position[0] * w2,
                v0.position[1] * w0 + v1.position[1] * w1 + v2.position[1] * w2,
                v0.position[2] * w0 + v1.position[2] * w1 + v2.position[2] * w2,
            ];
            let normal = normalize(&[
                v0.normal[0] * w0 + v1.normal[0] * w1 + v2.normal[0] * w2,
                v0.normal[1] * w0 + v1.normal[1] * w1 + v2.normal[1] * w2,
                v0.normal[2] * w0 + v1.normal[2] * w1 + v2.normal[2] * w2,
            ]);

            let intensity = calculate_light_intensity(
                &normal,
                &position,
                &lights.point_position,
                lights.point_intensity,
                lights.ambient,
            );
            target.pixels[offset] = apply_lighting(base_color, intensity);
        }
    }
}
