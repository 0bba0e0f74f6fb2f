mod common;

use common::{k, u32_attr};
use map::{Error, Map, UpdateFlag};

const ANY: u64 = UpdateFlag::Any as u64;
const NOEXIST: u64 = UpdateFlag::NoExist as u64;
const EXIST: u64 = UpdateFlag::Exist as u64;

fn setup() -> Map {
    Map::init(&u32_attr(100)).expect("hashtable map init")
}

#[test]
fn test_correct_update() {
    let map = setup();
    assert_eq!(map.update_elem(&k(50), &k(100), ANY), Ok(()));
    map.deinit();
}

#[test]
fn test_correct_update_more_than_max_entries() {
    let map = setup();
    map.update_elem(&k(50), &k(100), ANY).unwrap();
    // Fill every slot, overwriting key 50 on the way
    for i in 0..100 {
        map.update_elem(&k(i), &k(i), ANY).expect("within capacity");
    }
    assert_eq!(map.len(), 100);
    // Test one more key is refused with EBUSY
    assert_eq!(map.update_elem(&k(100), &k(100), ANY), Err(Error::OutOfCapacity));
    assert_eq!(Error::OutOfCapacity.errno(), 16);
    assert_eq!(map.len(), 100);
    map.deinit();
}

#[test]
fn test_update_existing_element_with_noexist_flag() {
    let map = setup();
    map.update_elem(&k(50), &k(100), ANY).unwrap();
    assert_eq!(map.update_elem(&k(50), &k(100), NOEXIST), Err(Error::AlreadyExists));
    map.deinit();
}

#[test]
fn test_update_non_existing_element_with_noexist_flag() {
    let map = setup();
    assert_eq!(map.update_elem(&k(50), &k(100), NOEXIST), Ok(()));
    map.deinit();
}

#[test]
fn test_update_non_existing_element_with_exist_flag() {
    let map = setup();
    assert_eq!(map.update_elem(&k(50), &k(100), EXIST), Err(Error::NotFound));
    assert!(map.is_empty());
    map.deinit();
}

#[test]
fn test_update_existing_element_with_exist_flag() {
    let map = setup();
    map.update_elem(&k(50), &k(100), ANY).unwrap();
    assert_eq!(map.update_elem(&k(50), &k(101), EXIST), Ok(()));

    // Test the overwrite is visible

    let mut value = [0u8; 4];
    map.lookup_elem(&k(50), &mut value).unwrap();
    assert_eq!(u32::from_ne_bytes(value), 101);
    assert_eq!(map.len(), 1);
    map.deinit();
}

#[test]
fn test_exist_overwrite_ignores_capacity() {
    let map = Map::init(&u32_attr(1)).unwrap();
    map.update_elem(&k(1), &k(1), ANY).unwrap();
    assert_eq!(map.update_elem(&k(1), &k(2), EXIST), Ok(()));
    assert_eq!(map.update_elem(&k(1), &k(3), ANY), Ok(()));
    assert_eq!(map.update_elem(&k(2), &k(3), NOEXIST), Err(Error::OutOfCapacity));
}

#[test]
fn test_unknown_update_flag_is_invalid() {
    let map = setup();
    assert_eq!(map.update_elem(&k(1), &k(1), 3), Err(Error::InvalidArgument));
    assert!(map.is_empty());
}

#[test]
fn test_wrong_sized_buffers_are_invalid() {
    let map = setup();
    assert_eq!(map.update_elem(&[1, 2, 3], &k(1), ANY), Err(Error::InvalidArgument));
    assert_eq!(map.update_elem(&k(1), &[0u8; 8], ANY), Err(Error::InvalidArgument));
    let mut small = [0u8; 2];
    assert_eq!(map.lookup_elem(&k(1), &mut small), Err(Error::InvalidArgument));
    assert!(map.is_empty());
}
