use super::*;

#[test]
fn flags_size() {
    assert_eq!(std::mem::size_of::<TypeFlags>(), 1);
}

#[test]
fn masks_partition_flags() {
    assert_eq!(TypeFlags::LATTICE_MASK | TypeFlags::USAGE_MASK, TypeFlags::all());
    assert!(!TypeFlags::LATTICE_MASK.intersects(TypeFlags::USAGE_MASK));
}

#[test]
fn lattice_drops_usage_flags() {
    let flags = TypeFlags::WRITE | TypeFlags::READ | TypeFlags::ERROR;
    assert_eq!(flags.lattice(), TypeFlags::ERROR);
}

#[test]
fn cleared_by_reports_dropped_flags() {
    let old = TypeFlags::NULLABLE | TypeFlags::WRITE;
    assert_eq!(old.cleared_by(old | TypeFlags::ERROR), TypeFlags::empty());
    assert_eq!(old.cleared_by(TypeFlags::WRITE), TypeFlags::NULLABLE);
}
