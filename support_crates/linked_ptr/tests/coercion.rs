use linked_ptr::{linked_coerce, LinkedPtr};
use std::cell::Cell;
use std::rc::Rc;

trait Shape {
    fn area(&self) -> u32;
}

struct Square {
    side: u32,
    drops: Rc<Cell<usize>>,
}

impl Shape for Square {
    fn area(&self) -> u32 {
        self.side * self.side
    }
}

impl Drop for Square {
    fn drop(&mut self) {
        self.drops.set(self.drops.get() + 1);
    }
}

fn square(side: u32) -> (Rc<Cell<usize>>, LinkedPtr<Square>) {
    let drops = Rc::new(Cell::new(0));
    let ptr = LinkedPtr::new(Square {
        side,
        drops: drops.clone(),
    });
    (drops, ptr)
}

#[test]
fn coerced_pointer_shares_ring() {
    let (_drops, square) = square(3);

    let shape = linked_coerce!(square => dyn Shape);

    assert_eq!(shape.area(), 9);
    assert_eq!(square.ring_len(), 2);
    assert_eq!(shape.ring_len(), 2);
    assert!(shape == square);
}

#[test]
fn trait_object_drops_concrete_value_once() {
    // arrange
    let (drops, square) = square(2);
    let shape = linked_coerce!(square => dyn Shape);
    let other_shape = shape.clone();

    // act & assert
    drop(square);
    assert_eq!(drops.get(), 0);
    drop(shape);
    assert_eq!(drops.get(), 0);
    assert!(other_shape.is_unique());
    drop(other_shape);
    assert_eq!(drops.get(), 1);
}

#[test]
fn concrete_pointer_outliving_trait_objects() {
    let (drops, square) = square(2);
    let shapes: Vec<LinkedPtr<dyn Shape>> = (0..3).map(|_| linked_coerce!(square => dyn Shape)).collect();
    assert_eq!(square.ring_len(), 4);

    drop(shapes);

    assert!(square.is_unique());
    assert_eq!(drops.get(), 0);
    drop(square);
    assert_eq!(drops.get(), 1);
}

#[test]
fn coercing_null_pointer_stays_solitary() {
    let null = LinkedPtr::<Square>::null();

    let shape = linked_coerce!(null => dyn Shape);

    assert!(shape.is_null());
    assert!(shape.is_unique());
    assert!(null.is_unique());
}

#[test]
fn assign_cast_replaces_value() {
    // arrange
    let (old_drops, old_square) = square(1);
    let (new_drops, new_square) = square(4);
    let mut shape: LinkedPtr<dyn Shape> = linked_coerce!(old_square => dyn Shape);
    drop(old_square);

    // act
    unsafe { shape.assign_cast(&new_square, |raw| raw as *mut dyn Shape) };

    // assert
    assert_eq!(old_drops.get(), 1);
    assert_eq!(shape.area(), 16);
    assert_eq!(new_square.ring_len(), 2);
    assert_eq!(new_drops.get(), 0);
}

/// A zero-sized shape which counts its drops in [`POINT_DROPS`]
struct Point;

thread_local! {
    static POINT_DROPS: Cell<usize> = Cell::new(0);
}

impl Shape for Point {
    fn area(&self) -> u32 {
        0
    }
}

impl Drop for Point {
    fn drop(&mut self) {
        POINT_DROPS.with(|drops| drops.set(drops.get() + 1));
    }
}

#[test]
fn assign_cast_between_zero_sized_rings() {
    // arrange
    let old_point = LinkedPtr::new(Point);
    let new_point = LinkedPtr::new(Point);
    let mut shape: LinkedPtr<dyn Shape> = linked_coerce!(old_point => dyn Shape);
    drop(old_point);

    // act
    unsafe { shape.assign_cast(&new_point, |raw| raw as *mut dyn Shape) };

    // assert
    assert_eq!(POINT_DROPS.with(Cell::get), 1);
    assert_eq!(new_point.ring_len(), 2);
    assert_eq!(shape.area(), 0);
}

#[test]
fn boxed_trait_objects_can_be_adopted() {
    let (drops, square) = square(5);
    let boxed: Box<dyn Shape> = LinkedPtr::try_unwrap(square).ok().unwrap();

    let shape: LinkedPtr<dyn Shape> = boxed.into();
    assert_eq!(shape.area(), 25);
    drop(shape);

    assert_eq!(drops.get(), 1);
}
