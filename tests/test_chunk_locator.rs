use fcitools::core::{chunk_for_point, chunks_for_bbox, FdssGrid, N_CHUNKS};
use fcitools::BoundingBox;

#[test]
fn test_full_disc_covers_all_forty_chunks() {
    let grid = FdssGrid::fdss_1km();
    let chunks = chunks_for_bbox(&grid, None).unwrap();
    assert_eq!(chunks, (1..=N_CHUNKS).collect::<Vec<_>>());
}

#[test]
fn test_north_germany_reference_case() {
    // The bbox used by the animation default ("chunks 003[7-8]")
    let grid = FdssGrid::fdss_1km();
    let bbox = BoundingBox::new(6.0, 50.0, 12.0, 55.0);
    let chunks = chunks_for_bbox(&grid, Some(&bbox)).unwrap();
    assert_eq!(chunks, vec![37, 38]);
}

#[test]
fn test_bbox_chunks_are_ascending_gap_free_and_in_range() {
    let grid = FdssGrid::fdss_1km();
    let cases = [
        BoundingBox::new(6.0, 50.0, 12.0, 55.0),
        BoundingBox::new(26.5, 41.7, 27.3, 42.3),
        BoundingBox::new(-15.0, -30.0, 30.0, 30.0),
        BoundingBox::new(0.0, -60.0, 5.0, 60.0),
    ];
    for bbox in cases {
        let chunks = chunks_for_bbox(&grid, Some(&bbox)).unwrap();
        assert!(!chunks.is_empty());
        assert!(chunks.windows(2).all(|w| w[1] == w[0] + 1), "gap in {:?}", chunks);
        assert!(chunks.iter().all(|&c| (1..=N_CHUNKS).contains(&c)));
    }
}

#[test]
fn test_point_chunks_increase_with_latitude() {
    // chunk 1 is the southern edge of the disc, chunk 40 the northern one
    let grid = FdssGrid::fdss_1km();
    let mut last = 0;
    for lat in [-75.0, -45.0, -15.0, 0.0, 15.0, 45.0, 75.0] {
        let chunk = chunk_for_point(&grid, 0.0, lat).unwrap();
        assert!(chunk >= last, "chunk {} at lat {} below {}", chunk, lat, last);
        last = chunk;
    }
    assert_eq!(chunk_for_point(&grid, 0.0, -75.0).unwrap(), 1);
    assert_eq!(chunk_for_point(&grid, 0.0, 0.0).unwrap(), 20);
    assert_eq!(chunk_for_point(&grid, 0.0, 75.0).unwrap(), 40);
}

#[test]
fn test_flipped_bbox_still_yields_a_range() {
    // west > east is not validated; the corner min/max keeps working
    let grid = FdssGrid::fdss_1km();
    let proper = BoundingBox::new(6.0, 50.0, 12.0, 55.0);
    let flipped = BoundingBox::new(12.0, 50.0, 6.0, 55.0);
    assert_eq!(
        chunks_for_bbox(&grid, Some(&proper)).unwrap(),
        chunks_for_bbox(&grid, Some(&flipped)).unwrap()
    );
}

#[test]
fn test_off_disc_bbox_is_an_error() {
    let grid = FdssGrid::fdss_1km();
    let bbox = BoundingBox::new(150.0, 0.0, 160.0, 5.0);
    assert!(chunks_for_bbox(&grid, Some(&bbox)).is_err());
}
