#![allow(dead_code)]

use guava_derive::Entity;

#[derive(Entity)]
struct Shop {
    _id: u32,
    #[compound_index(order = "descending")]
    city: String,
}

fn main() {}
