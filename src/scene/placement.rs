use crate::core::math::transform::TransformFactory;
use nalgebra::{Matrix4, Vector3};

/// Loadable models in the tableau. The three lamps share one model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Prop {
    Bed,
    Wardrobe,
    Kitchen,
    Rug,
    TableSet,
    Door,
    Frame,
    Vase,
    Lamp,
    Tree,
}

impl Prop {
    pub const ALL: [Prop; 10] = [
        Prop::Bed,
        Prop::Wardrobe,
        Prop::Kitchen,
        Prop::Rug,
        Prop::TableSet,
        Prop::Door,
        Prop::Frame,
        Prop::Vase,
        Prop::Lamp,
        Prop::Tree,
    ];

    /// Key used in the `[assets.models]` config table.
    pub fn name(self) -> &'static str {
        match self {
            Prop::Bed => "bed",
            Prop::Wardrobe => "wardrobe",
            Prop::Kitchen => "kitchen",
            Prop::Rug => "rug",
            Prop::TableSet => "table_set",
            Prop::Door => "door",
            Prop::Frame => "frame",
            Prop::Vase => "vase",
            Prop::Lamp => "lamp",
            Prop::Tree => "tree",
        }
    }

    /// Path relative to the asset root.
    pub fn default_path(self) -> &'static str {
        match self {
            Prop::Bed => "objects/bed/bed.obj",
            Prop::Wardrobe => "objects/wardrobe/orman.obj",
            Prop::Kitchen => "objects/kitchen/kitchen.obj",
            Prop::Rug => "objects/rug/rug.obj",
            Prop::TableSet => "objects/tableSet/untitled.obj",
            Prop::Door => "objects/door/10057_wooden_door_v3_iterations-2.obj",
            Prop::Frame => "objects/frame/dog2obj.obj",
            Prop::Vase => "objects/flower/Scaniverse.obj",
            Prop::Lamp => "objects/lamp/Asta LG1.obj",
            Prop::Tree => "objects/tree/tree.obj",
        }
    }
}

/// Rotation about `axis` by `degrees`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotation {
    pub axis: Vector3<f32>,
    pub degrees: f32,
}

impl Rotation {
    pub fn about_y(degrees: f32) -> Self {
        Self { axis: Vector3::y(), degrees }
    }

    pub fn about_z(degrees: f32) -> Self {
        Self { axis: Vector3::z(), degrees }
    }
}

/// Where one prop instance sits in the world.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub label: &'static str,
    pub prop: Prop,
    pub translation: Vector3<f32>,
    /// Applied in order after the translation, so the last one acts first on the mesh.
    pub rotations: Vec<Rotation>,
    pub scale: Vector3<f32>,
}

impl Placement {
    pub fn new(label: &'static str, prop: Prop, translation: [f32; 3], scale: f32) -> Self {
        Self {
            label,
            prop,
            translation: Vector3::from(translation),
            rotations: Vec::new(),
            scale: Vector3::repeat(scale),
        }
    }

    pub fn rotated(mut self, rotation: Rotation) -> Self {
        self.rotations.push(rotation);
        self
    }

    /// `T * R1 * R2 * ... * S`, built from identity on every call.
    pub fn model_matrix(&self) -> Matrix4<f32> {
        let rotation = self
            .rotations
            .iter()
            .fold(Matrix4::identity(), |acc, r| {
                acc * TransformFactory::rotation(&r.axis, r.degrees.to_radians())
            });

        TransformFactory::translation(&self.translation) * rotation * TransformFactory::scaling(&self.scale)
    }
}

/// Authored layout of the eleven furniture pieces inside the cabin, in draw order.
pub fn cabin_furniture() -> Vec<Placement> {
    vec![
        Placement::new("bed", Prop::Bed, [0.0, 0.0, -1.0], 0.9),
        Placement::new("wardrobe", Prop::Wardrobe, [3.0, 0.0, -2.27], 1.3),
        Placement::new("kitchen", Prop::Kitchen, [-2.2, 0.46, 3.0], 0.45)
            .rotated(Rotation::about_y(180.0)),
        Placement::new("rug", Prop::Rug, [-0.8, 0.0, 1.0], 1.2),
        Placement::new("table set", Prop::TableSet, [-2.4, 0.0, -1.8], 0.011)
            .rotated(Rotation::about_y(45.0)),
        Placement::new("door", Prop::Door, [3.5, 0.0, 2.5], 0.009)
            .rotated(Rotation::about_z(90.0))
            .rotated(Rotation::about_y(90.0)),
        Placement::new("frame", Prop::Frame, [-3.68, 1.2, -1.8], 1.2)
            .rotated(Rotation::about_z(-17.0)),
        Placement::new("vase", Prop::Vase, [-2.45, 0.8, -1.75], 1.3),
        Placement::new("left table lamp", Prop::Lamp, [-1.0, 0.51, -3.27], 1.0),
        Placement::new("right table lamp", Prop::Lamp, [1.0, 0.51, -3.27], 1.0),
        Placement::new("ceiling lamp", Prop::Lamp, [-0.76, 3.0, 0.94], 2.0)
            .rotated(Rotation::about_z(180.0)),
    ]
}
