use crate::core::math::transform::TransformFactory;
use crate::pipeline::composer::CameraFeed;
use crate::scene::light::{DirectionalLight, LightRig, PointLight, SpotLight};
use nalgebra::{Matrix4, Point3};

/// Both table lamps; any further point lights in a rig are ignored.
pub const MAX_POINT_LIGHTS: usize = 2;

/// Phong exponent shared by every lit program.
pub const SHININESS: f32 = 32.0;

/// The per-surface shading programs the scene is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProgramKind {
    /// Cabin shell walls, floor and ceiling.
    Room,
    /// Furniture and the half wall.
    Inside,
    /// Platform, roof and trees.
    Outside,
    /// Translucent window panes.
    Blend,
    /// Parallax-mapped stone path.
    NormalMapped,
    Skybox,
}

impl ProgramKind {
    pub const ALL: [ProgramKind; 6] = [
        ProgramKind::Room,
        ProgramKind::Inside,
        ProgramKind::Outside,
        ProgramKind::Blend,
        ProgramKind::NormalMapped,
        ProgramKind::Skybox,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ProgramKind::Room => "room",
            ProgramKind::Inside => "inside",
            ProgramKind::Outside => "outside",
            ProgramKind::Blend => "blend",
            ProgramKind::NormalMapped => "normal_mapped",
            ProgramKind::Skybox => "skybox",
        }
    }

    /// Lights this program consumes.
    pub fn lights(self) -> LightMask {
        match self {
            ProgramKind::Room | ProgramKind::Blend => LightMask::ALL,
            ProgramKind::Inside => LightMask::INDOOR,
            ProgramKind::Outside | ProgramKind::NormalMapped => LightMask::MOON,
            ProgramKind::Skybox => LightMask::NONE,
        }
    }

    /// Texture unit layout.
    pub fn units(self) -> &'static [UnitSlot] {
        const LIT: [UnitSlot; 2] = [
            UnitSlot::new(0, UnitRole::Diffuse),
            UnitSlot::new(1, UnitRole::Specular),
        ];
        const NORMAL_MAPPED: [UnitSlot; 3] = [
            UnitSlot::new(0, UnitRole::Diffuse),
            UnitSlot::new(1, UnitRole::Normal),
            UnitSlot::new(2, UnitRole::Height),
        ];
        const SKYBOX: [UnitSlot; 1] = [UnitSlot::new(0, UnitRole::Environment)];

        match self {
            ProgramKind::Room | ProgramKind::Inside | ProgramKind::Outside | ProgramKind::Blend => {
                &LIT
            }
            ProgramKind::NormalMapped => &NORMAL_MAPPED,
            ProgramKind::Skybox => &SKYBOX,
        }
    }

    fn slot(self) -> usize {
        match self {
            ProgramKind::Room => 0,
            ProgramKind::Inside => 1,
            ProgramKind::Outside => 2,
            ProgramKind::Blend => 3,
            ProgramKind::NormalMapped => 4,
            ProgramKind::Skybox => 5,
        }
    }
}

/// Which light kinds a program has uniforms for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LightMask {
    pub directional: bool,
    pub points: bool,
    pub spot: bool,
}

impl LightMask {
    pub const NONE: LightMask = LightMask {
        directional: false,
        points: false,
        spot: false,
    };
    pub const MOON: LightMask = LightMask {
        directional: true,
        points: false,
        spot: false,
    };
    pub const INDOOR: LightMask = LightMask {
        directional: false,
        points: true,
        spot: true,
    };
    pub const ALL: LightMask = LightMask {
        directional: true,
        points: true,
        spot: true,
    };
}

/// What a texture unit feeds in the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitRole {
    Diffuse,
    Specular,
    Normal,
    Height,
    /// Cube map sampled by direction.
    Environment,
}

impl UnitRole {
    pub fn is_cube(self) -> bool {
        self == UnitRole::Environment
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitSlot {
    pub unit: usize,
    pub role: UnitRole,
}

impl UnitSlot {
    pub const fn new(unit: usize, role: UnitRole) -> Self {
        Self { unit, role }
    }
}

/// A spot light as uploaded: cutoffs already converted to cosines.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundSpot {
    pub light: SpotLight,
    pub cos_cut_off: f32,
    pub cos_outer_cut_off: f32,
}

/// Light uniforms currently set on one program. Anything absent contributes
/// nothing to shading.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoundLights {
    pub directional: Option<DirectionalLight>,
    pub points: Vec<PointLight>,
    pub spot: Option<BoundSpot>,
}

/// Uniform storage for one program.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramUniforms {
    pub model: Matrix4<f32>,
    pub view: Matrix4<f32>,
    pub projection: Matrix4<f32>,
    pub view_pos: Point3<f32>,
    pub shininess: f32,
    pub height_scale: f32,
    pub lights: BoundLights,
    /// Frame whose camera feed these uniforms hold.
    pub fed_frame: Option<u64>,
}

impl Default for ProgramUniforms {
    fn default() -> Self {
        Self {
            model: Matrix4::identity(),
            view: Matrix4::identity(),
            projection: Matrix4::identity(),
            view_pos: Point3::origin(),
            shininess: SHININESS,
            height_scale: 0.0,
            lights: BoundLights::default(),
            fed_frame: None,
        }
    }
}

/// Uniform state of every program, kept across frames.
#[derive(Debug, Clone, Default)]
pub struct ProgramTable {
    programs: [ProgramUniforms; 6],
}

impl ProgramTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: ProgramKind) -> &ProgramUniforms {
        &self.programs[kind.slot()]
    }

    pub fn get_mut(&mut self, kind: ProgramKind) -> &mut ProgramUniforms {
        &mut self.programs[kind.slot()]
    }

    /// Sets exactly the lights `kind` declares from `rig` and clears the
    /// others. Spot cutoffs are converted on every call.
    pub fn bind_lights(&mut self, kind: ProgramKind, rig: &LightRig) {
        let mask = kind.lights();
        let lights = &mut self.get_mut(kind).lights;

        lights.directional = rig.directional.clone().filter(|_| mask.directional);

        lights.points.clear();
        if mask.points {
            lights
                .points
                .extend(rig.points.iter().take(MAX_POINT_LIGHTS).cloned());
        }

        lights.spot = rig.spot.as_ref().filter(|_| mask.spot).map(|spot| {
            let (cos_cut_off, cos_outer_cut_off) = spot.cutoff_cosines();
            BoundSpot {
                light: spot.clone(),
                cos_cut_off,
                cos_outer_cut_off,
            }
        });
    }

    /// Feeds view, projection and eye position to every program. The skybox
    /// gets the view with its translation removed.
    pub fn upload_camera(&mut self, feed: &CameraFeed, frame: u64) {
        for kind in ProgramKind::ALL {
            let program = self.get_mut(kind);
            program.view = if kind == ProgramKind::Skybox {
                TransformFactory::without_translation(&feed.view)
            } else {
                feed.view
            };
            program.projection = feed.projection;
            program.view_pos = feed.position;
            program.fed_frame = Some(frame);
        }
    }

    pub fn set_height_scale(&mut self, height_scale: f32) {
        self.get_mut(ProgramKind::NormalMapped).height_scale = height_scale;
    }

    pub fn is_fed(&self, kind: ProgramKind, frame: u64) -> bool {
        self.get(kind).fed_frame == Some(frame)
    }
}
