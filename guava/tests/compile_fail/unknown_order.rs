#![allow(dead_code)]

use guava_derive::Entity;

#[derive(Entity)]
struct Score {
    _id: u32,
    #[single_field_index(order = "sideways")]
    points: i64,
}

fn main() {}
