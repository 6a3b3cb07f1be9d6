use cgmath::{InnerSpace, Rad};
use materials_scene::{
    camera::{Camera, OrbitControls},
    data_structures::geometry,
    gui::{MaterialParam, SLIDER_STEP},
    material::StandardMaterial,
    resources::{CUBE_FACES, environment_map_faces},
    scene::{MeshKind, ROTATION_SPEED, Scene},
    viewport::Viewport,
};

#[test]
fn all_meshes_share_the_same_rotation_after_ten_seconds() {
    let mut scene = Scene::new();
    scene.animate(10.0);
    for node in &scene.nodes {
        assert!((node.instance.rotation.x.0 - 1.0).abs() < 1e-6, "{:?}", node.kind);
        assert!((node.instance.rotation.y.0 - 1.0).abs() < 1e-6, "{:?}", node.kind);
        assert_eq!(node.instance.rotation.z, Rad(0.0));
    }
}

#[test]
fn rotation_does_not_drift_over_many_frames() {
    let mut scene = Scene::new();
    for frame in 0..10_000 {
        scene.animate(frame as f32 / 60.0);
    }
    scene.animate(5.0);
    let expected = ROTATION_SPEED * 5.0;
    let sphere = scene.node(MeshKind::Sphere).map(|n| n.instance);
    assert_eq!(sphere.map(|i| i.rotation.x.0), Some(expected));
    assert_eq!(sphere.map(|i| i.rotation.y.0), Some(expected));
}

#[test]
fn animation_keeps_positions() {
    let mut scene = Scene::new();
    scene.animate(42.0);
    for node in &scene.nodes {
        assert_eq!(node.instance.position, node.kind.position());
    }
}

#[test]
fn mesh_resolution_matches_the_scene_setup() {
    assert_eq!(MeshKind::Plane.geometry().triangle_count(), 100 * 100 * 2);
    assert_eq!(MeshKind::Torus.geometry().triangle_count(), 64 * 128 * 2);
    assert_eq!(
        MeshKind::Plane.geometry().vertices.len(),
        geometry::plane(1.0, 1.0, 100, 100).vertices.len()
    );
    assert!(MeshKind::Sphere.geometry().triangle_count() > 0);
}

#[test]
fn resize_updates_aspect_and_caps_pixel_ratio() {
    let mut viewport = Viewport::new(800.0, 600.0, 1.0, 2.0);
    assert!((viewport.aspect() - 800.0 / 600.0).abs() < 1e-6);
    assert_eq!(viewport.drawing_buffer_size(), (800, 600));

    viewport.resize(1920.0, 1080.0, 3.0);
    assert!((viewport.aspect() - 1920.0 / 1080.0).abs() < 1e-6);
    assert_eq!(viewport.pixel_ratio(), 2.0);
    assert_eq!(viewport.drawing_buffer_size(), (3840, 2160));

    viewport.resize(1920.0, 1080.0, 1.25);
    assert_eq!(viewport.pixel_ratio(), 1.25);
}

#[test]
fn environment_faces_are_in_cube_layer_order() {
    assert_eq!(CUBE_FACES, ["px", "nx", "py", "ny", "pz", "nz"]);
    let faces = environment_map_faces();
    for (path, face) in faces.iter().zip(CUBE_FACES) {
        assert!(path.ends_with(&format!("/{face}.jpg")), "{path}");
    }
}

#[test]
fn sliders_cover_the_material_parameters() {
    assert_eq!(SLIDER_STEP, 0.0001);
    let labels: Vec<_> = MaterialParam::ALL.iter().map(|p| p.label()).collect();
    assert_eq!(
        labels,
        ["metalness", "roughness", "aoMapIntensity", "displacementScale"]
    );

    let mut material = StandardMaterial::default();
    MaterialParam::AoMapIntensity.set(&mut material, 7.5);
    assert_eq!(material.ao_map_intensity, 7.5);
    assert_eq!(material.uniform().ao_map_intensity, 7.5);
}

#[test]
fn damped_controls_keep_moving_after_input_stops() {
    let mut camera = Camera::new((1.0, 1.0, 2.0), (0.0, 0.0, 0.0));
    let mut controls = OrbitControls::new();
    controls.enable_damping = true;

    let start = camera.position;
    controls.rotate_left(0.5);
    controls.update(&mut camera);
    let first = camera.position;
    controls.update(&mut camera);
    let second = camera.position;

    assert_ne!(start, first);
    assert_ne!(first, second);
    let radius = (start - camera.target).magnitude();
    assert!(((second - camera.target).magnitude() - radius).abs() < 1e-4);
}
