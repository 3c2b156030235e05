use pretty_assertions::assert_eq;
use two_four_tree::{Error, TwoFourTree, ValueList};

#[test]
fn values_of_a_key_support_list_queries() {
    let mut tree = TwoFourTree::new();
    for value in [40, 10, 30, 20, 10] {
        tree.insert("scores", value);
    }

    let values = tree.values("scores").unwrap();
    assert_eq!(values.len(), 5);
    assert_eq!(values.front(), Some(&40));
    assert_eq!(values.back(), Some(&10));
    assert_eq!(values.linear_search(&30), Some(2));
    assert_eq!(values.linear_search(&99), None);

    let mut copy: ValueList<i32> = values.iter().copied().collect();
    assert_eq!(copy.select_nth(2), Ok(&10));
    assert_eq!(copy.select_nth(5), Ok(&40));
    assert_eq!(copy.select_nth(6), Err(Error::IndexOutOfRange { index: 6, len: 5 }));

    copy.sort();
    assert_eq!(copy.iter().copied().collect::<Vec<_>>(), [10, 10, 20, 30, 40]);
    assert_eq!(copy.binary_search(&30), Some(3));
    assert_eq!(copy.binary_search(&25), None);
}

#[test]
fn removal_consumes_values_front_first() {
    let mut tree = TwoFourTree::new();
    tree.extend((0..6).map(|v| ('k', v)));

    for expected in 0..6 {
        assert_eq!(tree.values(&'k').and_then(ValueList::front), Some(&expected));
        assert!(tree.remove(&'k'));
    }
    assert!(tree.values(&'k').is_none());
}

#[test]
fn ring_buffer_grows_and_shrinks_around_wraparound() {
    let mut list = ValueList::new();
    for value in 0..5 {
        list.push_front(value);
    }
    list.push_back(100);
    assert_eq!(list.iter().copied().collect::<Vec<_>>(), [4, 3, 2, 1, 0, 100]);
    assert_eq!(list.capacity(), 8);

    while list.len() > 2 {
        list.pop_front();
    }
    assert_eq!(list.iter().copied().collect::<Vec<_>>(), [0, 100]);
    assert_eq!(list.capacity(), 4);
    assert_eq!(list[1], 100);
    assert_eq!(list.try_get(2), Err(Error::IndexOutOfRange { index: 2, len: 2 }));
}

#[test]
#[should_panic(expected = "out of range")]
fn indexing_past_the_end_panics() {
    let list: ValueList<u8> = [1, 2].into_iter().collect();
    let _value = list[2];
}
