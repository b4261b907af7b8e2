use plain_composer::scheduler::{Debounce, Interval, Throttle};

#[test]
fn debounce_burst_collapses_to_last_payload() {
    let mut d = Debounce::new(250);
    for (i, t) in [0u64, 40, 90, 200, 430].iter().enumerate() {
        d.call(*t, i);
        assert_eq!(d.poll(*t), None);
    }
    assert_eq!(d.poll(679), None);
    assert_eq!(d.poll(680), Some(4));
    assert_eq!(d.poll(2000), None);
}

#[test]
fn debounce_cancel_drops_payload() {
    let mut d = Debounce::new(100);
    d.call(0, "draft");
    d.cancel();
    assert!(!d.is_pending());
    assert_eq!(d.poll(500), None);
}

#[test]
fn throttle_bounds_runs_over_a_burst() {
    let interval = 350;
    let burst = 2000;
    let mut t = Throttle::new(interval);
    let mut runs = 0;
    let mut now = 0;
    while now <= burst {
        if t.call(now, ()).is_some() {
            runs += 1;
        }
        if t.poll(now).is_some() {
            runs += 1;
        }
        now += 10;
    }
    while t.is_pending() {
        now += 10;
        if t.poll(now).is_some() {
            runs += 1;
        }
    }
    let bound = (burst + interval - 1) / interval + 1;
    assert!(runs >= 2);
    assert!(runs <= bound, "{runs} runs exceeds {bound}");
}

#[test]
fn throttle_trailing_run_carries_latest_payload() {
    let mut t = Throttle::new(100);
    assert_eq!(t.call(0, 1), Some(1));
    assert_eq!(t.call(10, 2), None);
    assert_eq!(t.call(20, 3), None);
    assert_eq!(t.poll(99), None);
    assert_eq!(t.poll(100), Some(3));
    assert!(!t.is_pending());
}

#[test]
fn interval_period_switch_takes_effect_from_now() {
    let mut i = Interval::new(80);
    i.start(0);
    assert!(!i.poll(79));
    assert!(i.poll(80));
    i.set_period(100, 350);
    assert!(!i.poll(180));
    assert!(i.poll(450));
    i.cancel();
    assert!(!i.is_running());
    assert!(!i.poll(10_000));
}
