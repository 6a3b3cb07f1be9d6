//! The materials scene: a sphere, a plane and a torus sharing one standard
//! material, lit by an ambient and a point light and slowly spinning.

use cgmath::{Rad, Vector3};
use futures::{FutureExt, future::LocalBoxFuture};
use instant::Duration;
use wgpu::util::DeviceExt;
use winit::event::WindowEvent;

use crate::{
    config::{MaterialPreset, SceneConfig},
    context::Context,
    data_structures::{
        geometry::{self, Geometry},
        instance::Instance,
        model::Mesh,
    },
    flow::{self, GraphicsFlow},
    gui,
    material::{GpuMaterial, Placeholders, StandardMaterial},
    pipelines::light::{AmbientLight, PointLight, colour_from_hex},
    render::{Drawable, Render},
    resources::texture::TextureSet,
};

/// Radians per second around both the X and the Y axis.
pub const ROTATION_SPEED: f32 = 0.1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MeshKind {
    Sphere,
    Plane,
    Torus,
}

impl MeshKind {
    pub const ALL: [Self; 3] = [Self::Sphere, Self::Plane, Self::Torus];

    pub fn label(self) -> &'static str {
        match self {
            Self::Sphere => "sphere",
            Self::Plane => "plane",
            Self::Torus => "torus",
        }
    }

    pub fn geometry(self) -> Geometry {
        match self {
            Self::Sphere => geometry::sphere(0.5, 64, 64),
            Self::Plane => geometry::plane(1.0, 1.0, 100, 100),
            Self::Torus => geometry::torus(0.3, 0.2, 64, 128),
        }
    }

    pub fn position(self) -> Vector3<f32> {
        match self {
            Self::Sphere => Vector3::new(-1.5, 0.0, 0.0),
            Self::Plane => Vector3::new(0.0, 0.0, 0.0),
            Self::Torus => Vector3::new(1.5, 0.0, 0.0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneNode {
    pub kind: MeshKind,
    pub instance: Instance,
}

/// CPU side of the scene: which meshes exist and where they are.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    pub nodes: Vec<SceneNode>,
}

impl Scene {
    pub fn new() -> Self {
        let nodes = MeshKind::ALL
            .into_iter()
            .map(|kind| SceneNode {
                kind,
                instance: Instance::from(kind.position()),
            })
            .collect();
        Self { nodes }
    }

    pub fn node(&self, kind: MeshKind) -> Option<&SceneNode> {
        self.nodes.iter().find(|node| node.kind == kind)
    }

    /// Set every node's X and Y rotation to `ROTATION_SPEED * elapsed_secs`.
    /// The angle is assigned, not accumulated, so calling this twice with
    /// the same time is a no-op.
    pub fn animate(&mut self, elapsed_secs: f32) {
        let angle = Rad(ROTATION_SPEED * elapsed_secs);
        for node in &mut self.nodes {
            node.instance.rotation.x = angle;
            node.instance.rotation.y = angle;
        }
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

/// Ambient light at half intensity plus a half-intensity white point light at
/// (2, 3, 4).
pub fn lights() -> (AmbientLight, PointLight) {
    let ambient = AmbientLight {
        color: colour_from_hex(0xffffff),
        intensity: 0.5,
    };
    let point = PointLight {
        color: colour_from_hex(0xffffff),
        intensity: 0.5,
        position: [2.0, 3.0, 4.0],
    };
    (ambient, point)
}

/// The shared material for `preset`.
pub fn standard_material(preset: MaterialPreset, textures: &TextureSet) -> StandardMaterial {
    let mut material = StandardMaterial {
        metalness: 0.7,
        roughness: 0.2,
        ..Default::default()
    };
    material.maps.env_map = Some(textures.environment_map.clone());

    if preset == MaterialPreset::DoorMaps {
        let maps = &mut material.maps;
        maps.map = Some(textures.door_color.clone());
        maps.ao_map = Some(textures.door_ambient_occlusion.clone());
        maps.displacement_map = Some(textures.door_height.clone());
        maps.metalness_map = Some(textures.door_metalness.clone());
        maps.roughness_map = Some(textures.door_roughness.clone());
        maps.normal_map = Some(textures.door_normal.clone());
        maps.alpha_map = Some(textures.door_alpha.clone());
        material.ao_map_intensity = 1.0;
        material.displacement_scale = 0.05;
        material.normal_scale = [0.5, 0.5];
        material.transparent = true;
    }
    material
}

struct GpuNode {
    mesh: Mesh,
    instance_buffer: wgpu::Buffer,
}

pub struct MaterialsScene {
    scene: Scene,
    nodes: Vec<GpuNode>,
    material: StandardMaterial,
    gpu_material: GpuMaterial,
}

impl std::fmt::Debug for MaterialsScene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaterialsScene")
            .field("scene", &self.scene)
            .field("material", &self.material)
            .finish_non_exhaustive()
    }
}

impl MaterialsScene {
    pub async fn new(ctx: &Context, config: &SceneConfig) -> anyhow::Result<Self> {
        let textures = TextureSet::load(&config.assets_dir, &ctx.device, &ctx.queue).await?;
        let material = standard_material(config.material, &textures);
        let placeholders = Placeholders::new(&ctx.device, &ctx.queue)?;
        let gpu_material = material.create_gpu_material(
            &ctx.device,
            &ctx.material_bind_group_layout,
            &placeholders,
            "Standard Material",
        );

        let scene = Scene::new();
        let nodes = scene
            .nodes
            .iter()
            .map(|node| {
                let mesh = Mesh::new(&ctx.device, node.kind.label(), &node.kind.geometry());
                let instance_buffer =
                    ctx.device
                        .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                            label: Some(&format!("{} Instance Buffer", node.kind.label())),
                            contents: bytemuck::cast_slice(&[node.instance.to_raw()]),
                            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                        });
                GpuNode {
                    mesh,
                    instance_buffer,
                }
            })
            .collect();
        log::info!("Scene ready with {:?} material", config.material);

        Ok(Self {
            scene,
            nodes,
            material,
            gpu_material,
        })
    }

    /// Constructor in the shape [`flow::run`] expects.
    pub fn constructor<'a>(
        ctx: &'a Context,
        config: &'a SceneConfig,
    ) -> LocalBoxFuture<'a, anyhow::Result<Box<dyn GraphicsFlow>>> {
        async move {
            let scene = Self::new(ctx, config).await?;
            Ok(Box::new(scene) as Box<dyn GraphicsFlow>)
        }
        .boxed_local()
    }
}

impl GraphicsFlow for MaterialsScene {
    fn on_init(&mut self, ctx: &mut Context) {
        let (ambient, point) = lights();
        ctx.light.set(&ctx.queue, ambient, point);
        ctx.camera.controls.enable_damping = true;
    }

    fn on_update(&mut self, ctx: &Context, elapsed: Duration) {
        self.scene.animate(elapsed.as_secs_f32());
        for (node, gpu) in self.scene.nodes.iter().zip(&self.nodes) {
            ctx.queue.write_buffer(
                &gpu.instance_buffer,
                0,
                bytemuck::cast_slice(&[node.instance.to_raw()]),
            );
        }
    }

    fn on_window_events(&mut self, _ctx: &Context, _event: &WindowEvent) {}

    fn on_gui(&mut self, ctx: &Context, gui_ctx: &egui::Context) {
        let mut changed = false;
        egui::Window::new("Material")
            .resizable(false)
            .default_pos([10.0, 10.0])
            .show(gui_ctx, |ui| {
                changed = gui::material_panel(ui, &mut self.material);
            });
        if changed {
            // Staged writes land before the frame's command buffer runs.
            self.gpu_material.write_to_buffer(&ctx.queue, &self.material);
        }
    }

    fn on_render(&self) -> Render<'_> {
        Render::Composed(
            self.nodes
                .iter()
                .map(|node| {
                    Render::from(Drawable {
                        mesh: &node.mesh,
                        material: &self.gpu_material,
                        instances: &node.instance_buffer,
                        amount: 1,
                    })
                })
                .collect(),
        )
    }
}

/// Run the materials scene in a new window.
pub fn run(config: SceneConfig) -> anyhow::Result<()> {
    flow::run(config, Box::new(MaterialsScene::constructor))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meshes_are_laid_out_left_to_right() {
        let scene = Scene::new();
        let xs: Vec<f32> = scene.nodes.iter().map(|n| n.instance.position.x).collect();
        assert_eq!(xs, [-1.5, 0.0, 1.5]);
    }

    #[test]
    fn animation_assigns_instead_of_accumulating() {
        let mut scene = Scene::new();
        scene.animate(3.0);
        let once = scene.clone();
        scene.animate(3.0);
        assert_eq!(scene, once);
    }

    #[test]
    fn lights_match_the_scene_setup() {
        let (ambient, point) = lights();
        assert_eq!(ambient.intensity, 0.5);
        assert_eq!(point.intensity, 0.5);
        assert_eq!(point.position, [2.0, 3.0, 4.0]);
        assert_eq!(point.color, [1.0, 1.0, 1.0]);
    }
}
