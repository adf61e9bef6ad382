use kinema_core::{
    Config, CoreEvent, Engine, Inputs, InteractionSpec, PointerEvent, PropertyWrite, Rect,
    SectionId, TargetId, TweenSpec,
};
use kinema_test_fixtures::{RecordingProbe, RecordingSurface};

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

fn mk_engine() -> Engine {
    Engine::new(Config::default())
}

// 400x300 card at the origin; center is (200, 150).
fn mk_card(engine: &mut Engine, section: SectionId) -> (TargetId, RecordingProbe) {
    let surface = RecordingSurface::new(Rect::new(0.0, 0.0, 400.0, 300.0))
        .with_props(&[("rotateX", 0.0), ("rotateY", 0.0)]);
    let probe = surface.probe();
    let id = engine.register_target(section, Box::new(surface));
    (id, probe)
}

fn tilt_spec(target: TargetId) -> InteractionSpec {
    InteractionSpec::new(target, vec!["rotateX", "rotateY"], |dx, dy| {
        vec![
            PropertyWrite::new("rotateX", dy / 20.0),
            PropertyWrite::new("rotateY", -dx / 20.0),
        ]
    })
}

fn pointer(engine: &mut Engine, dt: f32, event: PointerEvent) -> Vec<CoreEvent> {
    let inputs = Inputs {
        viewport: None,
        pointer: vec![event],
    };
    engine.update(dt, &inputs).events.clone()
}

fn settle(engine: &mut Engine, seconds: f32) {
    let mut left = seconds;
    while left > 0.0 {
        engine.update(0.016, &Inputs::default());
        left -= 0.016;
    }
}

#[test]
fn move_tweens_toward_the_response_deltas() {
    let mut engine = mk_engine();
    let section = engine.create_section();
    let (card, probe) = mk_card(&mut engine, section);
    let binding = engine.bind_interaction(section, tilt_spec(card)).unwrap();

    // Pointer at (200, 250): dy = +100 from center, so rotateX heads to 5.0.
    pointer(&mut engine, 0.016, PointerEvent::moved(card, 200.0, 250.0));
    settle(&mut engine, 0.5);

    assert_eq!(engine.binding_offset(binding, "rotateX"), Some(5.0));
    assert_eq!(engine.binding_offset(binding, "rotateY"), Some(0.0));
    approx(probe.value("rotateX").unwrap(), 5.0, 1e-6);
}

#[test]
fn a_newer_move_supersedes_the_inflight_one() {
    let mut engine = mk_engine();
    let section = engine.create_section();
    let (card, _probe) = mk_card(&mut engine, section);
    let binding = engine.bind_interaction(section, tilt_spec(card)).unwrap();

    pointer(&mut engine, 0.016, PointerEvent::moved(card, 200.0, 250.0));
    // Partway there, the pointer moves somewhere else entirely.
    settle(&mut engine, 0.1);
    let partial = engine.binding_offset(binding, "rotateX").unwrap();
    assert!(partial > 0.0 && partial < 5.0);

    pointer(&mut engine, 0.016, PointerEvent::moved(card, 200.0, 50.0));
    settle(&mut engine, 0.5);
    // dy = -100: the binding converged on the newest deltas only.
    assert_eq!(engine.binding_offset(binding, "rotateX"), Some(-5.0));
}

#[test]
fn leave_converges_back_to_rest_exactly() {
    let mut engine = mk_engine();
    let section = engine.create_section();
    let (card, probe) = mk_card(&mut engine, section);
    let binding = engine.bind_interaction(section, tilt_spec(card)).unwrap();

    pointer(&mut engine, 0.016, PointerEvent::moved(card, 300.0, 250.0));
    settle(&mut engine, 0.5);
    assert!(engine.binding_offset(binding, "rotateY").unwrap() != 0.0);

    pointer(&mut engine, 0.016, PointerEvent::left(card));
    settle(&mut engine, 0.8);

    assert_eq!(engine.binding_offset(binding, "rotateX"), Some(0.0));
    assert_eq!(engine.binding_offset(binding, "rotateY"), Some(0.0));
    assert_eq!(probe.value("rotateX").unwrap(), 0.0);
}

#[test]
fn settle_completion_writes_the_exact_rest_frame() {
    let mut engine = mk_engine();
    let section = engine.create_section();
    let (card, probe) = mk_card(&mut engine, section);
    engine.bind_interaction(section, tilt_spec(card)).unwrap();

    pointer(&mut engine, 0.016, PointerEvent::moved(card, 200.0, 250.0));
    settle(&mut engine, 0.5);
    pointer(&mut engine, 0.016, PointerEvent::left(card));

    // Run well past the rest duration. The completion frame must land the
    // target on exact rest, not keep the last pre-completion sample.
    settle(&mut engine, 2.0);
    assert_eq!(probe.value("rotateX").unwrap(), 0.0);
    assert_eq!(probe.value("rotateY").unwrap(), 0.0);
}

#[test]
fn reenter_during_settle_takes_over() {
    let mut engine = mk_engine();
    let section = engine.create_section();
    let (card, _probe) = mk_card(&mut engine, section);
    let binding = engine.bind_interaction(section, tilt_spec(card)).unwrap();

    pointer(&mut engine, 0.016, PointerEvent::moved(card, 200.0, 250.0));
    settle(&mut engine, 0.5);
    pointer(&mut engine, 0.016, PointerEvent::left(card));
    settle(&mut engine, 0.1);

    // Back over the card before the settle finishes.
    pointer(&mut engine, 0.016, PointerEvent::moved(card, 200.0, 250.0));
    settle(&mut engine, 0.5);
    assert_eq!(engine.binding_offset(binding, "rotateX"), Some(5.0));
}

#[test]
fn offsets_ride_on_top_of_the_base_value() {
    let mut engine = mk_engine();
    let section = engine.create_section();
    let surface = RecordingSurface::new(Rect::new(0.0, 0.0, 400.0, 300.0))
        .with_props(&[("y", 0.0)]);
    let probe = surface.probe();
    let card = engine.register_target(section, Box::new(surface));

    // An entrance tween owns the base lane of `y`.
    engine
        .start_tween(section, TweenSpec::new(card, "y", 80.0, 10.0, 0.5))
        .unwrap();
    engine
        .bind_interaction(
            section,
            InteractionSpec::new(card, vec!["y"], |_dx, dy| {
                vec![PropertyWrite::new("y", dy / 10.0)]
            }),
        )
        .unwrap();

    // Finish the entrance, then hover: dy = +100 from center -> offset 10.
    settle(&mut engine, 0.6);
    assert_eq!(probe.value("y").unwrap(), 10.0);
    pointer(&mut engine, 0.016, PointerEvent::moved(card, 200.0, 250.0));
    settle(&mut engine, 0.5);
    approx(probe.value("y").unwrap(), 20.0, 1e-4);

    // After the pointer leaves, only the committed base remains.
    pointer(&mut engine, 0.016, PointerEvent::left(card));
    settle(&mut engine, 0.8);
    assert_eq!(probe.value("y").unwrap(), 10.0);
}

#[test]
fn offsets_anchor_to_an_untweened_resting_value() {
    let mut engine = mk_engine();
    let section = engine.create_section();
    let surface = RecordingSurface::new(Rect::new(0.0, 0.0, 400.0, 300.0))
        .with_props(&[("scale", 1.0)]);
    let probe = surface.probe();
    let card = engine.register_target(section, Box::new(surface));

    // No base tween ever touches `scale`; the binding anchors to the 1.0
    // the target already holds, not to zero.
    engine
        .bind_interaction(
            section,
            InteractionSpec::new(card, vec!["scale"], |_dx, dy| {
                vec![PropertyWrite::new("scale", dy / 2000.0)]
            }),
        )
        .unwrap();

    // dy = +100 from center -> offset 0.05 on top of the resting 1.0.
    pointer(&mut engine, 0.016, PointerEvent::moved(card, 200.0, 250.0));
    settle(&mut engine, 0.5);
    approx(probe.value("scale").unwrap(), 1.05, 1e-4);

    pointer(&mut engine, 0.016, PointerEvent::left(card));
    settle(&mut engine, 0.8);
    assert_eq!(probe.value("scale").unwrap(), 1.0);
}

#[test]
fn panicking_response_disables_the_binding() {
    let mut engine = mk_engine();
    let section = engine.create_section();
    let (card, _probe) = mk_card(&mut engine, section);
    let binding = engine
        .bind_interaction(
            section,
            InteractionSpec::new(card, vec!["rotateX"], |_dx, _dy| -> Vec<PropertyWrite> {
                panic!("bad response")
            }),
        )
        .unwrap();

    let events = pointer(&mut engine, 0.016, PointerEvent::moved(card, 200.0, 250.0));
    assert!(events
        .iter()
        .any(|e| matches!(e, CoreEvent::CallbackPanicked { .. })));

    // Disabled for good: further moves change nothing.
    pointer(&mut engine, 0.016, PointerEvent::moved(card, 200.0, 250.0));
    settle(&mut engine, 0.5);
    assert_eq!(engine.binding_offset(binding, "rotateX"), Some(0.0));
}

#[test]
fn binding_validation_rejects_empty_props() {
    let mut engine = mk_engine();
    let section = engine.create_section();
    let (card, _probe) = mk_card(&mut engine, section);
    let props: Vec<String> = vec![];
    assert!(engine
        .bind_interaction(
            section,
            InteractionSpec::new(card, props, |_dx, _dy| Vec::new()),
        )
        .is_err());
}
