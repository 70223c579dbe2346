//! World to camera-view projection.
//!
//! `world_to_camera_view` returns normalized view coordinates: x and y in
//! [0, 1] across the camera frame (origin bottom-left), z the distance in
//! front of the camera. `screen_coords` turns those into integer pixel
//! coordinates with the origin at the top-left of the render.

use nalgebra::{Isometry3, Point3, Rotation3, Translation3, UnitQuaternion, Vector3};

use bonesketch_api_core::OFFSCREEN;

use crate::scene::{CameraKind, CameraObject, RenderSettings, SensorFit};

/// Camera world transform: translation followed by XYZ Euler rotation.
pub fn camera_isometry(camera: &CameraObject) -> Isometry3<f64> {
    let [rx, ry, rz] = camera.rotation_euler;
    let rotation = Rotation3::from_euler_angles(rx, ry, rz);
    let [x, y, z] = camera.location;
    Isometry3::from_parts(
        Translation3::new(x, y, z),
        UnitQuaternion::from_rotation_matrix(&rotation),
    )
}

/// Camera frame corners at unit draw size, in camera space:
/// top-right, bottom-right, bottom-left, top-left.
fn view_frame(render: &RenderSettings, camera: &CameraObject) -> Option<[Vector3<f64>; 4]> {
    let aspx = render.scaled_width();
    let aspy = render.scaled_height();
    if aspx <= 0.0 || aspy <= 0.0 {
        return None;
    }

    let fit = match camera.sensor_fit {
        SensorFit::Auto if aspx >= aspy => SensorFit::Horizontal,
        SensorFit::Auto => SensorFit::Vertical,
        fit => fit,
    };
    let (asp_x, asp_y) = match fit {
        SensorFit::Vertical => (aspx / aspy, 1.0),
        _ => (1.0, aspy / aspx),
    };

    let (facx, facy, shift_x, shift_y, depth) = match camera.kind {
        CameraKind::Ortho => (
            0.5 * camera.ortho_scale * asp_x,
            0.5 * camera.ortho_scale * asp_y,
            camera.shift_x * camera.ortho_scale,
            camera.shift_y * camera.ortho_scale,
            -1.0,
        ),
        _ => {
            // explicit vertical fit is the only case that reads the sensor height
            let sensor = match camera.sensor_fit {
                SensorFit::Vertical => camera.sensor_height,
                _ => camera.sensor_width,
            };
            let half_sensor = 0.5 * sensor;
            if half_sensor <= 0.0 {
                return None;
            }
            (
                asp_x,
                asp_y,
                camera.shift_x * 2.0,
                camera.shift_y * 2.0,
                -camera.lens / half_sensor,
            )
        }
    };

    Some([
        Vector3::new(facx + shift_x, facy + shift_y, depth),
        Vector3::new(facx + shift_x, -facy + shift_y, depth),
        Vector3::new(-facx + shift_x, -facy + shift_y, depth),
        Vector3::new(-facx + shift_x, facy + shift_y, depth),
    ])
}

/// Normalized camera-view coordinates of `world`. `None` for camera types
/// without a projection model or a degenerate render size.
pub fn world_to_camera_view(
    render: &RenderSettings,
    camera: &CameraObject,
    world: &Vector3<f64>,
) -> Option<Vector3<f64>> {
    if let CameraKind::Other(_) = camera.kind {
        return None;
    }
    let local = camera_isometry(camera)
        .inverse_transform_point(&Point3::from(*world))
        .coords;
    let z = -local.z;

    let mut frame = view_frame(render, camera)?;
    if camera.kind == CameraKind::Persp {
        if z == 0.0 {
            return Some(Vector3::new(0.5, 0.5, 0.0));
        }
        for corner in frame.iter_mut() {
            *corner = -(*corner / (corner.z / z));
        }
    }

    let (min_x, max_x) = (frame[2].x, frame[1].x);
    let (min_y, max_y) = (frame[1].y, frame[0].y);
    let x = (local.x - min_x) / (max_x - min_x);
    let y = (local.y - min_y) / (max_y - min_y);
    Some(Vector3::new(x, y, z))
}

/// Pixel coordinates of `world` in the rendered image, or `[-1, -1]` when the
/// point is behind a perspective camera or the camera cannot project.
pub fn screen_coords(
    render: &RenderSettings,
    camera: &CameraObject,
    world: &Vector3<f64>,
) -> [i64; 2] {
    let Some(view) = world_to_camera_view(render, camera, world) else {
        return OFFSCREEN;
    };
    if camera.kind == CameraKind::Persp && view.z <= 0.0 {
        return OFFSCREEN;
    }
    let width = render.scaled_width();
    let height = render.scaled_height();
    [
        (view.x * width).round_ties_even() as i64,
        (height - view.y * height).round_ties_even() as i64,
    ]
}
