#![allow(clippy::unwrap_used)]

use approx::assert_relative_eq;
use marionette::artwork::Marker;
use marionette::math::{Point2, Vector2};
use marionette::{
    ArtworkGroup, ArtworkItem, FaceObservation, Keypoint, PoseClip, PoseFrame, PoseKeypoint,
    PoseObservation, Puppet, RestPose, RigConfig, SourceCurve, SourceSegment,
};

const MESH_LEN: usize = 468;

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

fn body(kp: Keypoint) -> Option<Point2> {
    let (x, y) = match kp {
        Keypoint::LeftShoulder => (140.0, 200.0),
        Keypoint::RightShoulder => (60.0, 200.0),
        Keypoint::LeftElbow => (170.0, 260.0),
        Keypoint::LeftWrist => (185.0, 320.0),
        Keypoint::RightElbow => (30.0, 260.0),
        Keypoint::RightWrist => (15.0, 320.0),
        Keypoint::LeftHip => (130.0, 330.0),
        Keypoint::RightHip => (70.0, 330.0),
        Keypoint::LeftKnee => (135.0, 410.0),
        Keypoint::LeftAnkle => (135.0, 490.0),
        Keypoint::RightKnee => (65.0, 410.0),
        Keypoint::RightAnkle => (65.0, 490.0),
        Keypoint::LeftEar => (125.0, 140.0),
        Keypoint::RightEar => (75.0, 140.0),
        _ => return None,
    };
    Some(Point2::new(x, y))
}

fn head() -> Point2 {
    Point2::new(100.0, 140.0)
}

fn face(kp: Keypoint) -> Option<Point2> {
    let i = f64::from(u32::try_from(kp.face_index()?).ok()?);
    let angle = i * 0.9;
    Some(head() + Vector2::new(angle.cos(), angle.sin()) * (3.0 + i * 0.3))
}

fn rest_pose() -> RestPose {
    Keypoint::ALL
        .iter()
        .filter_map(|&kp| body(kp).or_else(|| face(kp)).map(|p| (kp, p)))
        .collect()
}

fn frame(score: f64, f: impl Fn(Point2) -> Point2, face_confidence: Option<f64>) -> PoseFrame {
    let keypoints = Keypoint::POSE
        .iter()
        .filter_map(|&kp| body(kp).map(|p| PoseKeypoint::new(kp, f(p), score)))
        .collect();
    let landmarks = face_confidence.map(|confidence| {
        let mut mesh = vec![f(head()); MESH_LEN];
        for &kp in Keypoint::FACE {
            if let (Some(i), Some(p)) = (kp.mesh_index(), face(kp)) {
                mesh[i] = f(p);
            }
        }
        FaceObservation::from_mesh(confidence, &mesh).unwrap()
    });
    PoseFrame {
        pose: PoseObservation::new(score, keypoints),
        face: landmarks,
    }
}

fn artwork() -> Vec<ArtworkItem> {
    let rest = rest_pose();
    let lift = Vector2::new(0.0, -1.5);
    let mut glasses = ArtworkGroup::new("glasses");
    for kp in [Keypoint::LeftEye0, Keypoint::LeftEye1, Keypoint::RightEye0, Keypoint::RightEye1] {
        glasses.markers.push(Marker {
            keypoint: kp,
            position: rest.get(kp).unwrap() + lift,
        });
    }
    let glasses = glasses.with_curve(SourceCurve::polyline(
        "bridge",
        &[rest.get(Keypoint::LeftEye0).unwrap(), rest.get(Keypoint::RightEye0).unwrap()],
    ));

    vec![
        SourceCurve::new(
            "shirt",
            vec![
                SourceSegment::smooth(
                    Point2::new(60.0, 205.0),
                    Vector2::new(0.0, -10.0),
                    Vector2::new(0.0, 10.0),
                ),
                SourceSegment::corner(Point2::new(70.0, 325.0)),
                SourceSegment::corner(Point2::new(130.0, 325.0)),
                SourceSegment::smooth(
                    Point2::new(140.0, 205.0),
                    Vector2::new(0.0, 10.0),
                    Vector2::new(-5.0, -5.0),
                ),
            ],
        )
        .closed()
        .into(),
        SourceCurve::polyline("left boot", &[Point2::new(130.0, 480.0), Point2::new(145.0, 495.0)]).into(),
        glasses.into(),
    ]
}

fn puppet() -> Puppet {
    let mut puppet = Puppet::new(&rest_pose(), RigConfig::default()).unwrap();
    puppet.bind(&artwork()).unwrap();
    puppet
}

#[test]
fn rest_frame_reproduces_artwork() {
    init_tracing();
    let mut puppet = puppet();
    assert!(puppet.update_frame(&frame(0.9, |p| p, Some(0.95))));
    assert_eq!(puppet.skeleton().body_scale(), 1.0);
    assert_eq!(puppet.skeleton().face_scale(), 1.0);

    let curves = puppet.evaluate();
    assert_eq!(curves.len(), 3);
    assert!(curves.iter().all(|c| !c.suppressed));
    let shirt = &curves[0];
    assert!(shirt.closed);
    assert_relative_eq!(shirt.points[1].position, Point2::new(70.0, 325.0), epsilon = 1e-9);
    assert_relative_eq!(
        shirt.points[0].handle_out_position.unwrap(),
        Point2::new(60.0, 215.0),
        epsilon = 1e-9
    );
}

#[test]
fn translated_clip_moves_everything() {
    init_tracing();
    let mut clip = PoseClip {
        frames: vec![frame(0.9, |p| p, Some(0.95)), frame(0.9, |p| p, Some(0.95))],
    };
    let json = serde_json::to_string(&clip).unwrap();
    clip = serde_json::from_str(&json).unwrap();
    clip.translate(&Vector2::new(25.0, -10.0));

    let mut puppet = puppet();
    for f in &clip.frames {
        assert!(puppet.update_frame(f));
    }
    let moved = puppet.evaluate();

    let mut reference = self::puppet();
    reference.update_frame(&frame(0.9, |p| p, Some(0.95)));
    for (a, b) in moved.iter().zip(reference.evaluate()) {
        for (pa, pb) in a.points.iter().zip(&b.points) {
            assert_relative_eq!(pa.position, pb.position + Vector2::new(25.0, -10.0), epsilon = 1e-6);
        }
    }
}

#[test]
fn lost_face_keeps_glasses_on_the_head() {
    init_tracing();
    let mut puppet = puppet();
    assert!(puppet.update_frame(&frame(0.9, |p| p, Some(0.95))));
    let shift = Vector2::new(0.0, 12.0);
    for _ in 0..40 {
        assert!(puppet.update_frame(&frame(0.9, |p| p + shift, Some(0.4))));
    }
    let bridge = &puppet.evaluate()[2];
    let rest = rest_pose();
    let start = rest.get(Keypoint::LeftEye0).unwrap();
    // Fusion converges towards the shifted ears, and the face follows them.
    assert_relative_eq!(bridge.points[0].position, start + shift, epsilon = 1e-3);
    assert_eq!(puppet.skeleton().face_scale(), puppet.skeleton().body_scale());
}

#[test]
fn invalid_frames_are_skipped() {
    init_tracing();
    let mut puppet = puppet();
    assert!(puppet.update_frame(&frame(0.9, |p| p, None)));
    let before = puppet.evaluate();

    let mut no_ears = frame(0.9, |p| p + Vector2::new(5.0, 5.0), None);
    no_ears
        .pose
        .keypoints
        .retain(|kp| !matches!(kp.part, Keypoint::LeftEar | Keypoint::RightEar));
    let mut fresh = self::puppet();
    assert!(!fresh.update_frame(&no_ears));
    assert!(!fresh.skeleton().is_valid());

    assert!(!puppet.update_frame(&frame(0.05, |p| p, None)));
    assert_eq!(puppet.evaluate(), before);
}

#[test]
fn flipped_frame_mirrors_sides() {
    init_tracing();
    let mut f = frame(0.9, |p| p, Some(0.95));
    f.pose.flip();
    if let Some(face) = &mut f.face {
        face.flip();
    }
    let left = f.pose.get(Keypoint::LeftWrist).unwrap().position;
    assert_eq!(left, body(Keypoint::RightWrist).unwrap());
}

#[test]
fn config_loads_from_json() {
    let config: RigConfig = serde_json::from_str(r#"{ "min_face_score": 0.6 }"#).unwrap();
    let puppet = Puppet::new(&rest_pose(), config).unwrap();
    assert!((puppet.config().min_face_score - 0.6).abs() < f64::EPSILON);
}
