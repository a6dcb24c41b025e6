//! Integration tests for pipeline wiring
//!
//! Tests cover:
//! - Which source calls a wire makes, and in which order
//! - Re-wiring with the same, swapped and replaced inputs
//! - Switching from a blend filter to a transform filter
//! - Group descriptors and runtime plugins
//! - Failed wires leaving the sink untouched

mod common;

use common::builders::{BaselineBuilder, CatalogBuilder};
use common::{assert_frames_differ, gradient, scenario_catalog, solid};
use image::Rgba;
use mockall::{mock, Sequence};
use photofx::filters::{OpPlugin, ParamSpec, ParamValue, ParameterSchema};
use photofx::pipeline::Target;
use photofx::{
    DescriptorHandle, FilterArity, FilterDescriptor, FilterError, FilterRegistry, Frame,
    FrameSink, ImageSource, PictureSource, PipelineWirer,
};
use std::rc::Rc;

mock! {
    pub Source {}

    impl ImageSource for Source {
        fn load_static(&mut self, frame: Frame);
        fn has_frame(&self) -> bool;
        fn add_target(&mut self, target: Target);
        fn disconnect_all(&mut self);
        fn process_synchronously(&mut self) -> usize;
    }
}

fn registry_descriptor(registry: &FilterRegistry, key: &str) -> DescriptorHandle {
    Rc::new(FilterDescriptor::detached(registry.recipe(key).unwrap()))
}

// ==================== Source Calls ====================

#[test]
fn test_transform_detaches_but_ignores_secondary() {
    let catalog = scenario_catalog();
    let sepia = catalog.descriptor_for("sepia").unwrap();

    let mut secondary = MockSource::new();
    secondary.expect_disconnect_all().times(1).return_const(());
    secondary.expect_add_target().never();
    secondary.expect_process_synchronously().never();
    secondary.expect_has_frame().never();

    let mut primary = PictureSource::from_frame(gradient(4, 4));
    let (frames, sink) = FrameSink::shared();
    let mut wirer = PipelineWirer::default();

    let conn = wirer
        .wire(&sepia, &mut primary, Some(&mut secondary), &sink)
        .unwrap();
    assert_eq!(conn.arity, FilterArity::Transform);
    assert!(!conn.uses_adjunct);
    assert_eq!(frames.borrow().frames_received(), 1);
}

#[test]
fn test_blend_processes_secondary_first() {
    let catalog = scenario_catalog();
    let blend = catalog.descriptor_for("normalBlend").unwrap();
    let mut seq = Sequence::new();

    let mut primary = MockSource::new();
    let mut secondary = MockSource::new();
    primary.expect_disconnect_all().times(1).return_const(());
    secondary.expect_disconnect_all().times(1).return_const(());
    primary.expect_has_frame().return_const(true);
    secondary.expect_has_frame().return_const(true);
    primary.expect_add_target().times(1).return_const(());
    secondary.expect_add_target().times(1).return_const(());
    secondary
        .expect_process_synchronously()
        .times(1)
        .in_sequence(&mut seq)
        .return_const(0usize);
    primary
        .expect_process_synchronously()
        .times(1)
        .in_sequence(&mut seq)
        .return_const(1usize);

    let (_, sink) = FrameSink::shared();
    let mut wirer = PipelineWirer::default();
    let conn = wirer
        .wire(&blend, &mut primary, Some(&mut secondary), &sink)
        .unwrap();
    assert!(conn.uses_adjunct);
    assert_eq!(conn.frames_delivered, 1);
}

#[test]
fn test_blend_with_empty_secondary_is_not_processed() {
    let catalog = scenario_catalog();
    let blend = catalog.descriptor_for("normalBlend").unwrap();

    let mut secondary = MockSource::new();
    secondary.expect_disconnect_all().return_const(());
    secondary.expect_has_frame().return_const(false);
    secondary.expect_add_target().never();
    secondary.expect_process_synchronously().never();

    let mut primary = PictureSource::from_frame(gradient(2, 2));
    let (frames, sink) = FrameSink::shared();
    let mut wirer = PipelineWirer::default();

    let err = wirer
        .wire(&blend, &mut primary, Some(&mut secondary), &sink)
        .unwrap_err();
    assert!(matches!(err, FilterError::MissingFrame));
    assert!(frames.borrow().last_frame().is_none());
    assert!(primary.targets().is_empty());
}

// ==================== Re-wiring ====================

#[test]
fn test_rewiring_same_inputs_is_stable() {
    let catalog = scenario_catalog();
    let blend = catalog.descriptor_for("normalBlend").unwrap();
    let mut a = PictureSource::from_frame(gradient(8, 6));
    let mut b = PictureSource::from_frame(solid(8, 6, [10, 200, 40, 255]));
    let (frames, sink) = FrameSink::shared();
    let mut wirer = PipelineWirer::default();

    wirer.wire(&blend, &mut a, Some(&mut b), &sink).unwrap();
    let first = frames.borrow().last_frame().unwrap().clone();
    wirer.wire(&blend, &mut a, Some(&mut b), &sink).unwrap();
    let second = frames.borrow().last_frame().unwrap().clone();

    assert_eq!(first, second);
    assert_eq!(frames.borrow().frames_received(), 2);
    assert_eq!(a.targets().len(), 1);
    assert_eq!(b.targets().len(), 1);
}

#[test]
fn test_swapping_blend_inputs_changes_output() {
    let catalog = scenario_catalog();
    let blend = catalog.descriptor_for("normalBlend").unwrap();
    let mut red = PictureSource::from_frame(solid(2, 2, [255, 0, 0, 255]));
    let mut blue = PictureSource::from_frame(solid(2, 2, [0, 0, 255, 255]));
    let (frames, sink) = FrameSink::shared();
    let mut wirer = PipelineWirer::new(0.8);

    wirer.wire(&blend, &mut red, Some(&mut blue), &sink).unwrap();
    let red_base = frames.borrow().last_frame().unwrap().clone();
    wirer.wire(&blend, &mut blue, Some(&mut red), &sink).unwrap();
    let blue_base = frames.borrow().last_frame().unwrap().clone();

    assert_frames_differ(&red_base, &blue_base);
    assert_eq!(red_base.get_pixel(0, 0), &Rgba([51, 0, 204, 255]));
    assert_eq!(blue_base.get_pixel(0, 0), &Rgba([204, 0, 51, 255]));
}

#[test]
fn test_replaced_primary_no_longer_reaches_sink() {
    let registry = FilterRegistry::with_builtins();
    let invert = registry_descriptor(&registry, "colorInversion");
    let gray = registry_descriptor(&registry, "grayscale");

    let mut a = PictureSource::from_frame(solid(2, 2, [255, 0, 0, 255]));
    let mut c = PictureSource::from_frame(solid(2, 2, [0, 0, 255, 255]));
    let (frames, sink) = FrameSink::shared();
    let mut wirer = PipelineWirer::default();

    wirer.wire(&invert, &mut a, None, &sink).unwrap();
    wirer.wire(&gray, &mut c, None, &sink).unwrap();
    wirer.wire(&invert, &mut c, None, &sink).unwrap();
    assert_eq!(frames.borrow().frames_received(), 3);
    assert_eq!(
        frames.borrow().last_frame().unwrap().get_pixel(0, 0),
        &Rgba([255, 255, 0, 255])
    );

    // A was wired to the same descriptor earlier but not in the last call
    assert_eq!(a.process_synchronously(), 0);
    assert_eq!(frames.borrow().frames_received(), 3);
    assert_eq!(
        frames.borrow().last_frame().unwrap().get_pixel(0, 0),
        &Rgba([255, 255, 0, 255])
    );
}

#[test]
fn test_replaced_secondary_no_longer_feeds_side_input() {
    let registry = FilterRegistry::with_builtins();
    let normal = registry_descriptor(&registry, "normalBlend");
    let screen = registry_descriptor(&registry, "screenBlend");

    let mut a = PictureSource::from_frame(solid(2, 2, [255, 0, 0, 255]));
    let mut b = PictureSource::from_frame(solid(2, 2, [0, 0, 255, 255]));
    let mut c = PictureSource::from_frame(solid(2, 2, [0, 255, 0, 255]));
    let (frames, sink) = FrameSink::shared();
    let mut wirer = PipelineWirer::new(0.8);

    wirer.wire(&normal, &mut a, Some(&mut b), &sink).unwrap();
    wirer.wire(&screen, &mut a, Some(&mut c), &sink).unwrap();
    let expected = frames.borrow().last_frame().unwrap().clone();
    assert_eq!(expected.get_pixel(0, 0), &Rgba([255, 204, 0, 255]));

    assert_eq!(b.process_synchronously(), 0);
    assert_eq!(a.process_synchronously(), 1);
    assert_eq!(frames.borrow().last_frame().unwrap(), &expected);
    assert_eq!(frames.borrow().frames_received(), 3);
}

#[test]
fn test_blend_then_transform_leaves_no_stale_edges() {
    let catalog = scenario_catalog();
    let blend = catalog.descriptor_for("normalBlend").unwrap();
    let grayscale_like = catalog.descriptor_for("noir").unwrap();

    let mut a = PictureSource::from_frame(gradient(6, 6));
    let mut b = PictureSource::from_frame(solid(6, 6, [0, 0, 255, 255]));
    let (frames, sink) = FrameSink::shared();
    let mut wirer = PipelineWirer::default();

    wirer.wire(&blend, &mut a, Some(&mut b), &sink).unwrap();
    let conn = wirer.wire(&grayscale_like, &mut a, None, &sink).unwrap();
    assert_eq!(conn.key(), "noir");
    assert_eq!(frames.borrow().frames_received(), 2);

    // The blend's node no longer feeds the sink
    let exit = blend.variant().unwrap().exit();
    assert!(exit.borrow().targets().is_empty());

    // Pushing the old side input reaches nothing
    assert_eq!(b.process_synchronously(), 0);
    assert_eq!(frames.borrow().frames_received(), 2);

    // The sink shows the transform's output only
    let out = frames.borrow().last_frame().unwrap().clone();
    assert!(out.pixels().all(|p| p[0] == p[1] && p[1] == p[2]));

    // A fresh process of A renders through the transform again
    assert_eq!(a.process_synchronously(), 1);
    assert_eq!(frames.borrow().last_frame().unwrap(), &out);
}

#[test]
fn test_sink_invalidated_per_wire() {
    let catalog = scenario_catalog();
    let mut a = PictureSource::from_frame(gradient(3, 3));
    let (frames, sink) = FrameSink::shared();
    let mut wirer = PipelineWirer::default();

    for key in ["sepia", "vintage", "warmGlow"] {
        let d = catalog.descriptor_for(key).unwrap();
        wirer.wire(&d, &mut a, None, &sink).unwrap();
    }
    assert_eq!(frames.borrow().invalidations(), 3);
    assert_eq!(wirer.active().unwrap().key(), "warmGlow");
}

// ==================== Groups & Plugins ====================

#[test]
fn test_group_descriptor_renders_through_chain() {
    let catalog = scenario_catalog();
    let sunset = catalog.descriptor_for("sunset").unwrap();
    assert_eq!(sunset.variant().unwrap().nodes().len(), 2);

    let input = solid(4, 4, [100, 100, 100, 255]);
    let mut a = PictureSource::from_frame(input.clone());
    let (frames, sink) = FrameSink::shared();
    let mut wirer = PipelineWirer::default();

    let conn = wirer.wire(&sunset, &mut a, None, &sink).unwrap();
    assert_eq!(conn.frames_delivered, 1);
    let out = frames.borrow().last_frame().unwrap().clone();
    assert_frames_differ(&input, &out);
    // Warmth pushes red up and blue down
    let p = out.get_pixel(0, 0);
    assert!(p[0] > p[2]);
}

#[test]
fn test_blend_group_uses_side_input() {
    let catalog = scenario_catalog();
    let duotone = catalog.descriptor_for("duotoneBlend").unwrap();
    assert_eq!(duotone.arity(), FilterArity::Blend);

    let mut a = PictureSource::from_frame(solid(2, 2, [200, 200, 200, 255]));
    let mut b = PictureSource::from_frame(solid(2, 2, [255, 0, 0, 255]));
    let (frames, sink) = FrameSink::shared();
    let mut wirer = PipelineWirer::default();

    let conn = wirer.wire(&duotone, &mut a, Some(&mut b), &sink).unwrap();
    assert!(conn.uses_adjunct);
    let p = *frames.borrow().last_frame().unwrap().get_pixel(0, 0);
    // Multiplying by red keeps red and darkens green/blue
    assert!(p[0] > p[1]);
    assert_eq!(p[1], p[2]);
}

#[test]
fn test_group_with_inner_blend_needs_secondary() {
    let mut registry = FilterRegistry::with_builtins();
    registry.register_group(
        "tintMix",
        "Tint Mix",
        vec!["contrast".into(), "multiplyBlend".into()],
    );
    let tint = registry_descriptor(&registry, "tintMix");
    let sepia = registry_descriptor(&registry, "sepia");
    assert_eq!(tint.arity(), FilterArity::Blend);

    let mut a = PictureSource::from_frame(solid(2, 2, [200, 200, 200, 255]));
    let mut b = PictureSource::from_frame(solid(2, 2, [255, 0, 0, 255]));
    let (frames, sink) = FrameSink::shared();
    let mut wirer = PipelineWirer::new(1.0);

    wirer.wire(&sepia, &mut a, None, &sink).unwrap();
    let before = frames.borrow().last_frame().unwrap().clone();

    let err = wirer.wire(&tint, &mut a, None, &sink).unwrap_err();
    assert!(err.is_degenerate());
    assert_eq!(frames.borrow().last_frame().unwrap(), &before);
    assert_eq!(frames.borrow().invalidations(), 1);

    let conn = wirer.wire(&tint, &mut a, Some(&mut b), &sink).unwrap();
    assert!(conn.uses_adjunct);
    assert_eq!(conn.frames_delivered, 1);
    assert_eq!(
        frames.borrow().last_frame().unwrap().get_pixel(1, 1),
        &Rgba([200, 0, 0, 255])
    );
}

struct Fill {
    level: u8,
}

impl OpPlugin for Fill {
    fn name(&self) -> &str {
        "Fill"
    }

    fn arity(&self) -> FilterArity {
        FilterArity::Transform
    }

    fn apply(&mut self, primary: &Frame, _secondary: Option<&Frame>) -> Option<Frame> {
        let (w, h) = primary.dimensions();
        Some(solid(w, h, [self.level, self.level, self.level, 255]))
    }

    fn set_parameter(&mut self, name: &str, value: &ParamValue) {
        if name == "level" {
            if let Some(v) = value.as_int() {
                self.level = v.clamp(0, 255) as u8;
            }
        }
    }
}

#[test]
fn test_plugin_filter_wires_like_builtin() {
    let mut registry = FilterRegistry::with_builtins();
    registry.register_plugin(
        "fill",
        "Fill",
        ParameterSchema::new(vec![ParamSpec::int("level", 0, 255, 10)]),
        || Fill { level: 0 },
    );
    let baseline = BaselineBuilder::new()
        .category("custom", "Custom")
        .filter("fill")
        .assign("custom", &["fill"])
        .build();
    let catalog = CatalogBuilder::new()
        .baseline(baseline)
        .registry(registry)
        .build();

    let fill = catalog.current_descriptor().unwrap();
    assert_eq!(fill.key(), "fill");

    let mut a = PictureSource::from_frame(gradient(3, 2));
    let (frames, sink) = FrameSink::shared();
    let mut wirer = PipelineWirer::default();

    // Schema default is applied when the node is built
    wirer.wire(&fill, &mut a, None, &sink).unwrap();
    assert_eq!(frames.borrow().last_frame().unwrap().get_pixel(1, 1)[0], 10);

    assert_eq!(
        fill.set_parameter("level", ParamValue::Int(999)),
        Some(ParamValue::Int(255))
    );
    wirer.wire(&fill, &mut a, None, &sink).unwrap();
    assert_eq!(frames.borrow().last_frame().unwrap().get_pixel(1, 1)[0], 255);
}

// ==================== Failed Wires ====================

#[test]
fn test_degenerate_group_keeps_previous_frame() {
    let mut registry = FilterRegistry::with_builtins();
    registry.register_group("broken", "Broken", vec!["nope".into(), "alsoNope".into()]);
    let broken = registry_descriptor(&registry, "broken");
    let sepia = registry_descriptor(&registry, "sepia");

    let mut a = PictureSource::from_frame(gradient(4, 4));
    let (frames, sink) = FrameSink::shared();
    let mut wirer = PipelineWirer::default();

    wirer.wire(&sepia, &mut a, None, &sink).unwrap();
    let before = frames.borrow().last_frame().unwrap().clone();

    let err = wirer.wire(&broken, &mut a, None, &sink).unwrap_err();
    assert!(err.is_degenerate());
    assert_eq!(frames.borrow().last_frame().unwrap(), &before);
    assert_eq!(frames.borrow().frames_received(), 1);
    assert_eq!(frames.borrow().invalidations(), 1);
    assert!(wirer.active().is_none());
    assert!(a.targets().is_empty());
}

#[test]
fn test_missing_primary_frame_keeps_previous_frame() {
    let catalog = scenario_catalog();
    let sepia = catalog.descriptor_for("sepia").unwrap();
    let mut loaded = PictureSource::from_frame(gradient(2, 2));
    let mut empty = PictureSource::new();
    let (frames, sink) = FrameSink::shared();
    let mut wirer = PipelineWirer::default();

    wirer.wire(&sepia, &mut loaded, None, &sink).unwrap();
    let err = wirer.wire(&sepia, &mut empty, None, &sink).unwrap_err();
    assert!(matches!(err, FilterError::MissingFrame));
    assert_eq!(frames.borrow().frames_received(), 1);

    // Loading a frame makes the same source wireable
    empty.load_static(solid(2, 2, [1, 2, 3, 255]));
    assert!(wirer.wire(&sepia, &mut empty, None, &sink).is_ok());
    assert_eq!(frames.borrow().frames_received(), 2);
}
