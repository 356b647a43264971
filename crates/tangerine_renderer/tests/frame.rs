use std::time::Duration;

use tangerine_assets::{
    AssetEvent, AssetServer, Handle, Mesh, MeshLoadOptions, ORANGE_TEXTURE, SPHERE_OBJ,
    TextureData, TextureSource,
};
use tangerine_core::{IoTaskPool, SceneSetup, Viewport};
use tangerine_renderer::{
    CLEAR_VALUES, DepthCompare, DeviceCall, FrameOutcome, FrameRenderer, FrameResources,
    IndexFormat, LitTextureProgram, PrimitiveTopology, RecordingDevice, ShaderSources,
    ShaderStage, StartupError, TextureStatus, UniformValue, VertexFormat,
};

const TRIANGLE: &str = "\
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 1.0 0.0
vt 0.0 0.0
vt 1.0 0.0
vt 0.0 1.0
vn 0.0 0.0 1.0
f 1/1/1 2/2/1 3/3/1
";

fn device() -> RecordingDevice {
    RecordingDevice::new(Viewport::new(800, 600))
}

fn resources(device: &mut RecordingDevice, obj: &str) -> FrameResources<RecordingDevice> {
    FrameResources::from_obj(device, LitTextureProgram::sources(), obj).unwrap()
}

/// Resources with the texture already uploaded, and the creation calls cleared.
fn ready(device: &mut RecordingDevice, obj: &str) -> FrameResources<RecordingDevice> {
    let mut resources = resources(device, obj);
    let handle = Handle::new();
    resources.set_pending_texture(handle);
    assert!(resources.handle_event(
        device,
        AssetEvent::TextureLoaded {
            handle,
            data: TextureData::solid("orange", [255, 140, 0, 255]),
        },
    ));
    device.take_calls();
    resources
}

#[test]
fn triangle_frame_draws_three_indices() {
    let mut device = device();
    let resources = ready(&mut device, TRIANGLE);
    let mut renderer = FrameRenderer::new(SceneSetup::default());

    let outcome = renderer.render(&mut device, &resources);

    assert_eq!(outcome, FrameOutcome::Drawn { index_count: 3 });
    assert_eq!(device.draw_calls().collect::<Vec<_>>(), [3]);
    assert_eq!(renderer.frames_drawn(), 1);
}

#[test]
fn frame_follows_the_fixed_call_order() {
    let mut device = device();
    let resources = ready(&mut device, TRIANGLE);
    let mut renderer = FrameRenderer::new(SceneSetup::default());
    renderer.render(&mut device, &resources);

    let calls = device.calls();
    assert_eq!(calls[0], DeviceCall::Clear(CLEAR_VALUES));
    assert_eq!(calls[1], DeviceCall::SetDepthTest(DepthCompare::LessEqual));
    assert!(matches!(calls[2], DeviceCall::UseProgram(_)));

    let position = |pred: &dyn Fn(&DeviceCall) -> bool| calls.iter().position(pred).unwrap();
    let uniform = |wanted: &str| {
        position(&|c| matches!(c, DeviceCall::SetUniform { name, .. } if name == wanted))
    };
    let light = uniform("light.position");
    let projection = uniform("uProjectionMatrix");
    let texture = position(&|c| matches!(c, DeviceCall::BindTexture { unit: 0, .. }));
    let model = uniform("uModelMatrix");
    let attributes = position(&|c| matches!(c, DeviceCall::BindVertexAttribute { .. }));
    let draw = position(&|c| matches!(c, DeviceCall::DrawIndexed { .. }));

    assert!(light < projection);
    assert!(projection < texture);
    assert!(texture < model);
    assert!(model < attributes);
    assert!(attributes < draw);
    assert_eq!(draw, calls.len() - 1);

    assert!(calls.contains(&DeviceCall::SetUniform {
        name: "textureData".to_owned(),
        value: UniformValue::Int(0),
    }));
    assert!(calls.contains(&DeviceCall::DrawIndexed {
        topology: PrimitiveTopology::TriangleList,
        index_count: 3,
    }));
}

#[test]
fn attributes_use_fixed_slots_and_packed_formats() {
    let mut device = device();
    let resources = ready(&mut device, TRIANGLE);
    FrameRenderer::new(SceneSetup::default()).render(&mut device, &resources);

    let bound: Vec<(u32, VertexFormat)> = device
        .calls()
        .iter()
        .filter_map(|call| match call {
            DeviceCall::BindVertexAttribute { slot, format, .. } => Some((*slot, *format)),
            _ => None,
        })
        .collect();
    assert_eq!(bound, LitTextureProgram::SLOT_FORMATS);

    assert!(device.calls().iter().any(|call| matches!(
        call,
        DeviceCall::BindIndexBuffer {
            format: IndexFormat::Uint16,
            ..
        }
    )));
}

#[test]
fn base_color_and_light_are_uploaded() {
    let mut device = device();
    let resources = ready(&mut device, TRIANGLE);
    let scene = SceneSetup::default();
    FrameRenderer::new(scene.clone()).render(&mut device, &resources);

    let value_of = |uniform: &str| {
        device.calls().iter().find_map(|call| match call {
            DeviceCall::SetUniform { name, value } if name == uniform => Some(*value),
            _ => None,
        })
    };

    assert_eq!(value_of("uColor"), Some(UniformValue::Vec4(scene.base_color)));
    assert_eq!(value_of("light.diffuse"), Some(UniformValue::Vec3(scene.light.diffuse)));
    assert_eq!(value_of("uNormalMatrix"), Some(UniformValue::Mat3(scene.transforms.normal)));
    assert_eq!(
        value_of("uProjectionMatrix"),
        Some(UniformValue::Mat4(scene.projection(Viewport::new(800, 600))))
    );
}

#[test]
fn consecutive_frames_are_identical() {
    let mut device = device();
    let resources = ready(&mut device, SPHERE_OBJ);
    let mut renderer = FrameRenderer::new(SceneSetup::default());

    renderer.render(&mut device, &resources);
    let first = device.take_calls();
    renderer.render(&mut device, &resources);
    let second = device.take_calls();

    assert_eq!(first, second);
    assert!(!first.iter().any(DeviceCall::is_creation));
}

#[test]
fn projection_tracks_viewport_changes() {
    let mut device = device();
    let resources = ready(&mut device, TRIANGLE);
    let mut renderer = FrameRenderer::new(SceneSetup::default());

    renderer.render(&mut device, &resources);
    let before = device.take_calls();
    device.set_viewport(Viewport::new(1200, 600));
    renderer.render(&mut device, &resources);
    let after = device.take_calls();

    assert_ne!(before, after);
    assert_eq!(before.len(), after.len());
}

#[test]
fn nothing_is_drawn_before_the_texture_arrives() {
    let mut device = device();
    let resources = resources(&mut device, TRIANGLE);
    device.take_calls();
    let mut renderer = FrameRenderer::new(SceneSetup::default());

    assert_eq!(renderer.render(&mut device, &resources), FrameOutcome::TextureNotReady);
    assert!(device.calls().is_empty());
    assert_eq!(renderer.frames_drawn(), 0);
}

#[test]
fn startup_creates_program_before_buffers() {
    let mut device = device();
    let resources = resources(&mut device, TRIANGLE);

    let calls = device.calls();
    assert!(matches!(calls[0], DeviceCall::CreateProgram { .. }));
    let buffers = calls
        .iter()
        .filter(|c| matches!(c, DeviceCall::CreateVertexBuffer { .. }))
        .count();
    assert_eq!(buffers, 5);
    assert!(calls.iter().any(|c| matches!(c, DeviceCall::CreateIndexBuffer { len: 3, .. })));
    assert_eq!(resources.mesh().index_count, 3);
    assert_eq!(resources.texture_status(), TextureStatus::Unrequested);
}

#[test]
fn shader_syntax_error_creates_no_buffers() {
    let mut device = device();
    let sources = ShaderSources {
        vertex: LitTextureProgram::VERTEX_SOURCE,
        fragment: "@fragment fn fs_main( -> @location(0) vec4<f32> {",
    };
    let mesh = Mesh::from_obj(TRIANGLE, MeshLoadOptions::default()).unwrap();

    let err = FrameResources::new(&mut device, sources, &mesh).unwrap_err();

    assert!(matches!(
        err,
        StartupError::Compile {
            stage: ShaderStage::Fragment,
            ..
        }
    ));
    assert!(device.calls().is_empty());
}

#[test]
fn device_link_failure_is_reported() {
    let mut device = device();
    device.fail_next_program("pipeline rejected");

    let err = FrameResources::from_obj(&mut device, LitTextureProgram::sources(), TRIANGLE)
        .unwrap_err();

    assert!(matches!(err, StartupError::Link(_)));
    assert!(device.calls().is_empty());
}

#[test]
fn out_of_range_face_index_is_a_parse_error() {
    let mut device = device();
    let obj = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 9\n";

    let err = FrameResources::from_obj(&mut device, LitTextureProgram::sources(), obj)
        .unwrap_err();

    assert!(matches!(err, StartupError::Parse(_)));
    assert!(device.calls().is_empty());
}

#[test]
fn stale_texture_events_are_ignored() {
    let mut device = device();
    let mut resources = resources(&mut device, TRIANGLE);
    resources.set_pending_texture(Handle::new());

    let accepted = resources.handle_event(
        &mut device,
        AssetEvent::TextureLoaded {
            handle: Handle::new(),
            data: TextureData::solid("other", [0; 4]),
        },
    );

    assert!(!accepted);
    assert_eq!(resources.texture_status(), TextureStatus::Pending);
}

#[tokio::test]
async fn first_frame_renders_when_the_texture_loads() {
    let (server, mut events) = AssetServer::new(IoTaskPool(tokio::runtime::Handle::current()));
    let mut device = device();
    let mut resources = resources(&mut device, SPHERE_OBJ);
    let mut renderer = FrameRenderer::new(SceneSetup::default());

    resources.begin_texture_load(
        &server,
        TextureSource::Embedded {
            name: "orange.png",
            bytes: ORANGE_TEXTURE,
        },
    );
    assert_eq!(renderer.render(&mut device, &resources), FrameOutcome::TextureNotReady);

    let mut outcome = None;
    for _ in 0..200 {
        let status = resources.poll_texture(&mut device, &mut events, |device, resources| {
            outcome = Some(renderer.render(device, resources));
        });
        if status != TextureStatus::Pending {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert_eq!(resources.texture_status(), TextureStatus::Ready);
    let index_count = resources.mesh().index_count;
    assert_eq!(outcome, Some(FrameOutcome::Drawn { index_count }));
    assert_eq!(device.draw_calls().count(), 1);
}

#[tokio::test]
async fn failed_texture_load_never_draws() {
    let (server, mut events) = AssetServer::new(IoTaskPool(tokio::runtime::Handle::current()));
    let mut device = device();
    let mut resources = resources(&mut device, TRIANGLE);
    let mut renderer = FrameRenderer::new(SceneSetup::default());

    resources.begin_texture_load(&server, TextureSource::File("does/not/exist.png".into()));

    let event = events.next().await.unwrap();
    assert!(!resources.handle_event(&mut device, event));

    assert_eq!(resources.texture_status(), TextureStatus::Failed);
    assert!(resources.texture_error().is_some());
    assert_eq!(renderer.render(&mut device, &resources), FrameOutcome::TextureNotReady);
    assert_eq!(device.draw_calls().count(), 0);
}
