use otogame_charter::ChartEvent;
use otogame_player::game::JudgementCounts;
use otogame_player::{InputEvent, Judgement, JudgeWindow, PlayRuntime};

fn window() -> JudgeWindow {
    JudgeWindow {
        perfect: 0.040,
        great: 0.080,
        good: 0.120,
    }
}

fn single_tap() -> PlayRuntime {
    PlayRuntime::new(vec![ChartEvent::tap(2.0, 0)], window(), 6)
}

#[test]
fn press_inside_perfect_window() {
    let mut rt = single_tap();
    assert_eq!(rt.on_lane_press(0, 2.010), Some(Judgement::Perfect));
    assert_eq!(rt.score, 1000);
    assert_eq!(rt.combo, 1);
    assert_eq!(rt.counts.perfect, 1);
    assert_eq!(rt.hit_errors.len(), 1);
    assert!((rt.hit_errors[0] - 0.010).abs() < 1e-5);
}

#[test]
fn unplayed_note_is_swept_as_miss() {
    let mut rt = single_tap();
    rt.sweep(2.100);
    assert_eq!(rt.counts.miss, 0);

    rt.sweep(2.121);
    assert_eq!(rt.combo, 0);
    assert_eq!(rt.counts.miss, 1);
    assert_eq!(rt.score, 0);
    assert!(rt.is_finished());
    assert_eq!(rt.hit_log[0].error, None);

    // the late press finds nothing left to judge
    assert_eq!(rt.on_lane_press(0, 2.300), None);
    assert_eq!(rt.counts.miss, 1);
}

#[test]
fn hold_released_inside_tail_window_completes() {
    let mut rt = PlayRuntime::new(vec![ChartEvent::hold(1.0, 2.0, 2)], window(), 6);
    assert_eq!(rt.on_lane_press(2, 1.02), Some(Judgement::Perfect));
    rt.sweep(1.5);
    rt.on_lane_release(2, 1.95);

    assert_eq!(rt.score, 1500);
    assert_eq!(rt.score, rt.max_score());
    assert_eq!(rt.combo, 1);
    assert!(rt.is_finished());
}

#[test]
fn closer_press_never_judges_worse() {
    let w = window();
    let mut deltas: Vec<f32> = (0..=120).map(|ms| ms as f32 / 1000.0).collect();
    deltas.extend(deltas.clone().iter().map(|d| -d));

    for &d1 in &deltas {
        for &d2 in &deltas {
            if d1.abs() < d2.abs() {
                assert!(
                    w.judge(d1).points() >= w.judge(d2).points(),
                    "{} judged worse than {}",
                    d1,
                    d2
                );
            }
        }
    }
}

#[test]
fn score_never_exceeds_max() {
    let chart = vec![
        ChartEvent::tap(1.0, 0),
        ChartEvent::tap(1.0, 3),
        ChartEvent::hold(1.5, 2.5, 1),
        ChartEvent::tap(2.0, 0),
        ChartEvent::tap(2.25, 4),
        ChartEvent::hold(3.0, 3.6, 5),
    ];
    let max = PlayRuntime::new(chart.clone(), window(), 6).max_score();

    // mash every lane on a fine grid
    let mut rt = PlayRuntime::new(chart.clone(), window(), 6);
    let mut t = 0.5;
    while t < 4.5 {
        for lane in 0..6 {
            rt.sweep(t);
            rt.apply(&InputEvent::press(lane, t));
            rt.apply(&InputEvent::release(lane, t + 0.01));
        }
        t += 0.05;
    }
    rt.sweep(10.0);
    assert!(rt.score <= max);
    assert!(rt.is_finished());

    let mut auto = PlayRuntime::new(chart, window(), 6);
    auto.autoplay(10.0);
    assert_eq!(auto.score, max);
}

#[test]
fn ghost_tap_changes_nothing() {
    let mut rt = PlayRuntime::new(vec![ChartEvent::tap(1.0, 0)], window(), 6);
    rt.on_lane_press(0, 1.0);
    let before = (rt.score, rt.combo, rt.counts);

    // lane 0 is exhausted, lane 4 never had notes
    assert_eq!(rt.on_lane_press(0, 1.5), None);
    assert_eq!(rt.on_lane_press(4, 1.0), None);
    rt.on_lane_release(4, 1.1);

    assert_eq!((rt.score, rt.combo, rt.counts), before);
    assert_ne!(rt.counts, JudgementCounts::default());
}
