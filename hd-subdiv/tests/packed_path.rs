//! Tests for packed corner paths.

use hd_subdiv::hd::PackedPath;
use hd_subdiv::Error;

/// All corner sequences of length `len`.
fn sequences(len: usize) -> impl Iterator<Item = Vec<u8>> {
    (0..4usize.pow(len as u32)).map(move |code| {
        (0..len)
            .map(|position| ((code >> (2 * position)) & 3) as u8)
            .collect()
    })
}

#[test]
fn test_unpacking_recovers_every_short_path() {
    for len in 1..=6 {
        for elements in sequences(len) {
            let path = PackedPath::new(&elements).unwrap();
            assert_eq!(path.len(), len);
            assert_eq!(path.to_vec(), elements);
            assert_eq!(path.first(), Some(elements[0]));
            assert_eq!(path.last(), elements.last().copied());
            assert_eq!(PackedPath::from_bits(path.bits()), path);
        }
    }
}

#[test]
fn test_short_paths_fit_the_high_half() {
    for len in 1..=4 {
        for elements in sequences(len) {
            assert_eq!(PackedPath::new(&elements).unwrap().bits() & 0xffff, 0);
        }
    }
}

#[test]
fn test_try_from_slice() {
    let elements: &[u8] = &[3, 0, 2];
    let path = PackedPath::try_from(elements).unwrap();
    assert_eq!(path.to_string(), "[3,0,2]");

    let invalid: &[u8] = &[0, 1, 7];
    assert!(matches!(
        PackedPath::try_from(invalid),
        Err(Error::InvalidPathElement {
            position: 2,
            element: 7
        })
    ));
}

#[test]
fn test_raw_length_beyond_max_is_clamped_when_iterating() {
    let path = PackedPath::from_bits(15 << 28);
    assert_eq!(path.len(), 15);
    assert_eq!(path.iter().len(), PackedPath::MAX_LEN);
}
