use super::*;

#[test]
fn generations_order_by_value() {
    assert!(Generation::from_raw(3) > Generation::from_raw(2));
    assert_eq!(Generation::default(), Generation::INITIAL);
    assert_eq!(Generation::from_raw(7).raw(), 7);
}

#[test]
fn advance_moves_global_and_local_view() {
    let before = global_generation();
    let advanced = advance_generation();

    assert!(advanced > before);
    assert!(global_generation() >= advanced);
    assert!(current_generation() >= advanced);
}

#[test]
fn refresh_observes_advances_from_other_threads() {
    let advanced = std::thread::spawn(advance_generation)
        .join()
        .unwrap_or_else(|_| panic!("driver thread panicked"));

    assert!(refresh_generation() >= advanced);
    assert!(current_generation() >= advanced);
}

#[test]
fn reconcile_takes_maximum() {
    let view = refresh_generation();
    let ahead = Generation::from_raw(view.raw() + 1000);

    assert_eq!(reconcile_generation(ahead), ahead);
    assert_eq!(reconcile_generation(view), ahead);
    assert_eq!(current_generation(), ahead);
}

#[test]
fn thread_views_are_independent() {
    let view_here = refresh_generation();
    let ahead = Generation::from_raw(view_here.raw() + 5000);
    reconcile_generation(ahead);

    let other_view = std::thread::spawn(current_generation)
        .join()
        .unwrap_or_else(|_| panic!("worker thread panicked"));

    assert!(other_view < ahead);
}
