//! Geometry fixtures shared by the integration tests.

#![allow(dead_code)]

use orange::id::TrackSlotId;
use orange::{GeoTrackInitializer, OrangeParams, OrangeStateData, OrangeTrackView};
use orange_geom::{PlaneAligned, Sphere, SphereCentered};
use orange_ir::{DaughterInput, OrangeInput, RectArrayInput, UnitInput, VolumeInput, ZOrder};
use orange_math::{Axis, BoundingBox, Real3, VariantTransform};

pub fn build(universes: Vec<orange_ir::VariantUniverseInput>) -> OrangeParams {
    OrangeParams::from_input(OrangeInput {
        universes,
        ..Default::default()
    })
    .unwrap()
}

pub fn exterior(faces: Vec<u32>, logic: &str) -> VolumeInput {
    VolumeInput::new("[EXTERIOR]", faces, logic)
        .unwrap()
        .with_zorder(ZOrder::Exterior)
}

/// A single volume filling all space.
pub fn one_volume() -> OrangeParams {
    build(vec![UnitInput {
        label: "one-volume".into(),
        volumes: vec![VolumeInput::new("infinite", vec![], "*").unwrap()],
        ..Default::default()
    }
    .into()])
}

/// Sphere of radius 1.5 inside an infinite exterior.
pub fn two_volume() -> OrangeParams {
    build(vec![UnitInput {
        label: "two-volume".into(),
        surfaces: vec![SphereCentered::new(1.5).into()],
        volumes: vec![
            exterior(vec![0], "0"),
            VolumeInput::new("inside", vec![0], "0 ~").unwrap(),
        ],
        ..Default::default()
    }
    .into()])
}

/// Unit ball offset inside a daughter rotated a quarter turn about z and
/// placed at y=5 in a world sphere of radius 20.
pub fn rotated_daughter() -> OrangeParams {
    let world = UnitInput {
        label: "world".into(),
        surfaces: vec![SphereCentered::new(20.0).into()],
        volumes: vec![
            exterior(vec![0], "0"),
            VolumeInput::new("world", vec![0], "0 ~").unwrap(),
        ],
        daughter_map: [(
            1,
            DaughterInput::new(
                1,
                VariantTransform::rotation(
                    Axis::Z,
                    std::f64::consts::FRAC_PI_2,
                    Real3::new(0.0, 5.0, 0.0),
                ),
            ),
        )]
        .into_iter()
        .collect(),
        ..Default::default()
    };
    let inner = UnitInput {
        label: "inner".into(),
        surfaces: vec![Sphere::new(Real3::new(2.0, 0.0, 0.0), 1.0).into()],
        volumes: vec![
            VolumeInput::new("fill", vec![0], "0").unwrap(),
            VolumeInput {
                instance_id: Some(42),
                ..VolumeInput::new("ball", vec![0], "0 ~")
                    .unwrap()
                    .with_bbox(BoundingBox::new(Real3::new(1.0, -1.0, -1.0), Real3::new(3.0, 1.0, 1.0)))
            },
        ],
        ..Default::default()
    };
    build(vec![world.into(), inner.into()])
}

/// World sphere of radius 20 split at x=0 into "left" and "right", each
/// holding a unit ball universe placed at x=-5 and x=5.
pub fn split_balls() -> OrangeParams {
    let world = UnitInput {
        label: "world".into(),
        surfaces: vec![
            SphereCentered::new(20.0).into(),
            PlaneAligned::new(Axis::X, 0.0).into(),
        ],
        volumes: vec![
            exterior(vec![0], "0"),
            VolumeInput::new("left", vec![0, 1], "0 ~ 1 ~ &").unwrap(),
            VolumeInput::new("right", vec![0, 1], "0 ~ 1 &").unwrap(),
        ],
        daughter_map: [
            (1, DaughterInput::new(1, VariantTransform::translation(-5.0, 0.0, 0.0))),
            (2, DaughterInput::new(1, VariantTransform::translation(5.0, 0.0, 0.0))),
        ]
        .into_iter()
        .collect(),
        ..Default::default()
    };
    let ball = UnitInput {
        label: "ball".into(),
        surfaces: vec![SphereCentered::new(1.0).into()],
        volumes: vec![
            VolumeInput::new("fill", vec![0], "0").unwrap(),
            VolumeInput {
                instance_id: Some(3),
                ..VolumeInput::new("ball", vec![0], "0 ~").unwrap()
            },
        ],
        ..Default::default()
    };
    build(vec![world.into(), ball.into()])
}

/// A 3x1x1 rect array of space-filling units inside a world sphere.
pub fn rect_array() -> OrangeParams {
    let world = UnitInput {
        label: "world".into(),
        surfaces: vec![SphereCentered::new(100.0).into()],
        volumes: vec![
            exterior(vec![0], "0"),
            VolumeInput::new("world", vec![0], "0 ~").unwrap(),
        ],
        daughter_map: [(1, DaughterInput::new(1, VariantTransform::identity()))]
            .into_iter()
            .collect(),
        ..Default::default()
    };
    let array = RectArrayInput {
        label: "arr".into(),
        grid: [vec![0.0, 1.0, 2.0, 3.0], vec![0.0, 1.0], vec![0.0, 1.0]],
        daughters: vec![DaughterInput::new(2, VariantTransform::identity()); 3],
    };
    let fill = UnitInput {
        label: "fill".into(),
        volumes: vec![VolumeInput::new("fill", vec![], "*").unwrap()],
        ..Default::default()
    };
    build(vec![world.into(), array.into(), fill.into()])
}

pub fn slot(i: u32) -> TrackSlotId {
    TrackSlotId::new(i)
}

/// View of a freshly initialized track.
pub fn init<'a>(
    params: &'a OrangeParams,
    states: &'a mut OrangeStateData,
    pos: [f64; 3],
    dir: [f64; 3],
) -> OrangeTrackView<'a> {
    let mut geo = OrangeTrackView::new(params, states, slot(0));
    geo.assign(&GeoTrackInitializer::new(
        Real3::from(pos),
        Real3::from(dir).normalize(),
    ));
    geo
}
