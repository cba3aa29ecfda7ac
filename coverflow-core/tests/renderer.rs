mod common;

use coverflow_core::CarouselEvent;
use coverflow_core::config::Orientation;
use coverflow_core::testing::{RecordingBackend, StubProvider};

use common::{Harness, settings};

#[test]
fn first_frame_draws_placeholders_back_to_front() {
    let mut h = Harness::new(StubProvider::gated(100), settings());
    h.renderer.handle().set_scroll_offset(50.0, false);
    h.attach();
    h.frame();

    let drawn = h.backend.last_drawn_indices();
    assert_eq!(drawn.len(), 11);
    assert_eq!(drawn.first(), Some(&45));
    assert_eq!(drawn.last(), Some(&50));
    assert_eq!(&drawn[drawn.len() - 3..], &[49, 51, 50]);

    let frame = h.backend.last_frame();
    assert_eq!(frame.len(), 22, "each tile has a reflection");
    assert!(frame.iter().all(|draw| draw.placeholder));
    assert_eq!(h.renderer.stats().visible_range, Some(45..=55));

    h.provider.open_gate();
}

#[test]
fn decoded_tiles_become_resident_and_replace_placeholders() {
    let mut h = Harness::new(StubProvider::new(100), settings());
    h.renderer.handle().set_scroll_offset(50.0, false);
    h.attach();

    assert!(h.pump_until(|r| {
        r.stats().resident_textures == 15 && r.stats().in_flight == 0
    }));
    h.frame();
    assert!(h.backend.last_frame().iter().all(|draw| !draw.placeholder));
    let mut loaded = h.provider.load_calls();
    loaded.sort_unstable();
    assert_eq!(loaded, (43..=57).collect::<Vec<_>>());
}

#[test]
fn context_loss_resets_residency_and_prefetches_again() {
    let mut h = Harness::new(StubProvider::gated(100), settings());
    h.provider.open_gate();
    h.renderer.handle().set_scroll_offset(50.0, false);
    h.attach();
    assert!(h.pump_until(|r| {
        r.stats().resident_textures == 15 && r.stats().in_flight == 0
    }));
    assert!(h.resident() >= 10);
    let old_generation = h.renderer.generation().unwrap();

    h.provider.close_gate();
    let old_backend = h.backend.clone();
    h.backend = RecordingBackend::new();
    h.renderer
        .on_context_created(h.backend.clone())
        .expect("context");

    let generation = h.renderer.generation().unwrap();
    assert_eq!(generation, old_generation + 1);
    assert_eq!(h.resident(), 0);
    // Stale handles are forgotten, not destroyed.
    assert_eq!(old_backend.destroyed(), 0);
    // Every claim now belongs to the new generation's prefetch.
    assert_eq!(h.renderer.in_flight().len(), 15);
    assert!((43..=57).all(|i| h.renderer.in_flight().contains(i, generation)));

    h.provider.open_gate();
    assert!(h.pump_until(|r| {
        r.stats().resident_textures == 15 && r.stats().in_flight == 0
    }));
    let reloads = h
        .provider
        .load_calls()
        .into_iter()
        .filter(|&index| index == 50)
        .count();
    assert_eq!(reloads, 2);
}

#[test]
fn snap_episode_emits_one_start_and_one_finish() {
    let mut h = Harness::new(StubProvider::new(100), settings());
    h.attach();
    let handle = h.renderer.handle();
    handle.set_scroll_offset(20.0, false);
    h.frame();
    h.drain_events();

    handle.scroll_by(0.4);
    handle.snap_to_nearest();
    assert!(h.pump_until(|r| {
        r.handle().scroll_offset() == 20.0 && r.stats().frame_count > 3
    }));
    h.frame();

    let snaps: Vec<_> = h
        .drain_events()
        .into_iter()
        .filter(|event| {
            matches!(
                event,
                CarouselEvent::SnapStarted(_) | CarouselEvent::SnapFinished(_)
            )
        })
        .collect();
    assert_eq!(
        snaps,
        vec![CarouselEvent::SnapStarted(20), CarouselEvent::SnapFinished(20)]
    );
}

#[test]
fn immediate_offset_change_notifies_offset_then_index() {
    let mut h = Harness::new(StubProvider::new(100), settings());
    h.attach();
    h.frame();
    h.drain_events();

    h.renderer.handle().set_scroll_offset(7.0, false);
    h.frame();
    assert_eq!(
        h.drain_events(),
        vec![
            CarouselEvent::OffsetChanged(7.0),
            CarouselEvent::CenteredIndexChanged(7),
        ]
    );

    // Same offset again still forces an offset notification.
    h.renderer.handle().set_scroll_offset(7.0, false);
    h.frame();
    assert_eq!(h.drain_events(), vec![CarouselEvent::OffsetChanged(7.0)]);

    h.frame();
    assert!(h.drain_events().is_empty());
}

#[test]
fn overscroll_past_the_end_is_resisted() {
    let mut h = Harness::new(StubProvider::new(100), settings());
    h.attach();
    let handle = h.renderer.handle();
    handle.set_scroll_offset(99.0, false);
    handle.scroll_by(0.3);
    assert!((handle.overscroll() - 0.3).abs() < 1e-4);
    handle.scroll_by(0.3);
    assert!((handle.overscroll() - 0.458).abs() < 1e-3);
    assert_eq!(handle.scroll_offset(), 99.0);

    handle.end_scroll();
    assert!(h.pump_until(|r| r.handle().overscroll() == 0.0));
    assert_eq!(handle.centered_index(), Some(99));
}

#[test]
fn picking_resolves_the_centered_tile() {
    let mut h = Harness::new(StubProvider::new(100), settings());
    let handle = h.renderer.handle();
    assert_eq!(handle.pick_index_at_screen_x(400.0), None);

    h.attach();
    handle.set_scroll_offset(50.0, false);
    h.frame();
    assert_eq!(handle.pick_index_at_screen_x(400.0), Some(50));
    assert_eq!(handle.item_id_at(50).map(|id| id.0), Some("item-50".into()));

    // Shrinking the dataset hides stale records immediately.
    h.provider.set_item_count(40);
    assert_eq!(handle.pick_index_at_screen_x(400.0), None);
    assert_eq!(handle.item_id_at(50), None);
    assert_eq!(h.provider.id_calls(), vec![50]);
}

#[test]
fn cache_never_exceeds_the_keep_window() {
    let mut h = Harness::new(StubProvider::new(300), settings());
    h.attach();
    let handle = h.renderer.handle();
    let keep = settings().radii.eviction_distance();

    for step in 0..120 {
        handle.set_scroll_offset(step as f32 * 1.7, false);
        h.frame();
        let center = handle.scroll_offset();
        let bound = (0..300)
            .filter(|&i| (i as f32 - center).abs() <= keep)
            .count();
        assert!(h.resident() <= bound);
        if let Some(gpu) = h.renderer.gpu() {
            assert!(
                gpu.textures()
                    .indices()
                    .all(|i| (i as f32 - center).abs() <= keep)
            );
        }
        std::thread::sleep(std::time::Duration::from_millis(1));
    }
    assert_eq!(h.backend.live_textures(), h.resident() + 1);
}

#[test]
fn upload_budget_spreads_work_across_frames() {
    let mut config = settings();
    config.decode.max_uploads_per_frame = 2;
    let mut h = Harness::new(StubProvider::gated(100), config);
    h.renderer.handle().set_scroll_offset(50.0, false);
    h.attach();
    h.provider.open_gate();

    let mut frames = 0;
    let mut busiest = 0;
    assert!(h.pump_until(|r| {
        frames += 1;
        busiest = busiest.max(r.stats().uploads_last_frame);
        r.stats().resident_textures == 15
    }));
    assert_eq!(busiest, 2);
    assert!(frames >= 8, "15 uploads at 2 per frame took {frames} frames");
}

#[test]
fn empty_dataset_only_clears() {
    let mut h = Harness::new(StubProvider::new(0), settings());
    h.attach();
    let handle = h.renderer.handle();
    handle.scroll_by(3.0);
    handle.snap_to_nearest();
    h.frame();

    assert!(h.backend.last_frame().is_empty());
    assert!(h.backend.last_clear().is_some());
    assert_eq!(handle.centered_index(), None);
    assert_eq!(handle.pick_index_at_screen_x(400.0), None);
    assert!(h.provider.load_calls().is_empty());
    assert!(h.drain_events().is_empty());
}

#[test]
fn vertical_orientation_drops_reflections() {
    let mut h = Harness::new(StubProvider::gated(30), settings());
    h.attach();
    let handle = h.renderer.handle();
    handle.set_orientation(Orientation::Vertical);
    handle.set_scroll_offset(10.0, false);
    h.frame();

    let frame = h.backend.last_frame();
    assert_eq!(frame.len(), 11);
    assert!(frame.iter().all(|draw| !draw.reflection));
    assert_eq!(handle.pick_index_at_screen_y(300.0), Some(10));
    h.provider.open_gate();
}

#[test]
fn radius_setters_keep_ordering() {
    let h = Harness::new(StubProvider::new(10), settings());
    let handle = h.renderer.handle();
    handle.set_visible_radius(9);
    let radii = handle.settings().radii;
    assert!(radii.visible <= radii.prefetch && radii.prefetch <= radii.keep);
    assert_eq!(radii.visible, 9);

    handle.set_keep_radius(3);
    let radii = handle.settings().radii;
    assert_eq!((radii.visible, radii.prefetch, radii.keep), (3, 3, 3));
}

#[test]
fn release_destroys_gpu_state_and_stops_decoding() {
    let mut h = Harness::new(StubProvider::new(100), settings());
    let handle = h.renderer.handle();
    handle.set_scroll_offset(50.0, false);
    h.attach();
    assert!(h.pump_until(|r| r.stats().resident_textures == 15));

    handle.release();
    h.frame();
    assert!(h.renderer.gpu().is_none());
    assert_eq!(h.backend.live_textures(), 0);
    assert_eq!(handle.pick_index_at_screen_x(400.0), None);

    let calls = h.provider.load_calls().len();
    handle.set_scroll_offset(10.0, false);
    h.frame();
    assert_eq!(h.provider.load_calls().len(), calls);
    assert_eq!(handle.scroll_offset(), 50.0);
}

fn loads_of(provider: &StubProvider, index: usize) -> usize {
    provider
        .load_calls()
        .into_iter()
        .filter(|&loaded| loaded == index)
        .count()
}

#[test]
fn failing_artwork_is_attempted_once_per_window_entry() {
    let mut h = Harness::new(StubProvider::new(100), settings());
    h.provider.fail_index(50);
    h.renderer.handle().set_scroll_offset(50.0, false);
    h.attach();

    assert!(h.pump_until(|r| {
        r.stats().resident_textures == 14 && r.stats().in_flight == 0
    }));
    for _ in 0..120 {
        h.frame();
    }
    assert_eq!(loads_of(&h.provider, 50), 1);
    assert!(h.renderer.gpu().is_some_and(|gpu| !gpu.is_resident(50)));

    // Leaving the prefetch window and coming back retries.
    h.provider.heal_index(50);
    let handle = h.renderer.handle();
    handle.set_scroll_offset(80.0, false);
    h.frame();
    handle.set_scroll_offset(50.0, false);
    assert!(h.pump_until(|r| {
        r.gpu().is_some_and(|gpu| gpu.is_resident(50))
    }));
    assert_eq!(loads_of(&h.provider, 50), 2);
}

#[test]
fn failed_texture_creation_waits_for_the_window_to_be_reentered() {
    let mut h = Harness::new(StubProvider::new(100), settings());
    h.renderer.handle().set_scroll_offset(50.0, false);
    h.attach();
    h.backend.set_fail_creates(true);

    assert!(h.pump_until(|r| {
        r.stats().frame_count >= 30 && r.stats().in_flight == 0
    }));
    h.backend.set_fail_creates(false);
    for _ in 0..30 {
        h.frame();
    }
    assert_eq!(h.resident(), 0);
    assert!(h.backend.last_frame().iter().all(|draw| draw.placeholder));
    assert_eq!(h.provider.load_calls().len(), 15);

    let handle = h.renderer.handle();
    handle.set_scroll_offset(80.0, false);
    h.frame();
    handle.set_scroll_offset(50.0, false);
    assert!(h.pump_until(|r| {
        (43..=57).all(|i| r.gpu().is_some_and(|gpu| gpu.is_resident(i)))
    }));
    h.frame();
    assert!(h.backend.last_frame().iter().all(|draw| !draw.placeholder));
    assert_eq!(loads_of(&h.provider, 50), 2);
}
